use super::state::{Phase, StackShape};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Action {
    SetPhase(Phase),
    SetShape {
        tid: String,
        shape: StackShape,
    },
    IncStack {
        hash: String,
        by: usize,
    },
    IncStatus {
        status: String,
        by: usize,
    },
    SetLockOwner {
        lock: String,
        tid: String,
    },
    AddProblems(Vec<String>),
}
