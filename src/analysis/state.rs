use crate::model::ThreadDump;
use im::OrdMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisState {
    pub phase: Phase,

    // per-thread derived view (key = tid)
    pub shapes: OrdMap<String, StackShape>,

    // dump-level rollups
    pub by_stack: OrdMap<String, usize>,
    pub by_status: OrdMap<String, usize>,
    pub lock_owners: OrdMap<String, String>, // lock id -> tid

    pub problems: Vec<String>,
}

/// Fingerprint and frame count of one thread's stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackShape {
    pub hash: String,
    pub depth: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Init,
    ShapesBuilt,
    TotalsBuilt,
    ChecksRun,
    Done,
}

impl AnalysisState {
    /// Writes every computed shape onto its thread.
    pub fn commit_shapes(&self, dump: &mut ThreadDump) {
        for (tid, shape) in self.shapes.iter() {
            if let Some(t) = dump.threads.get_mut(tid) {
                t.stack_hash = Some(shape.hash.clone());
                t.stack_depth = Some(shape.depth);
            }
        }
    }

    /// Replaces the dump's aggregates and problems with this state's.
    /// Returns the number of problems.
    pub fn commit_totals(self, dump: &mut ThreadDump) -> usize {
        dump.by_stack = self.by_stack.into_iter().collect();
        dump.by_status = self.by_status.into_iter().collect();
        dump.lock_owners = self.lock_owners.into_iter().collect();
        dump.total_threads = dump.threads.len();

        let mut problems = self.problems;
        problems.sort();
        dump.problems = problems;
        dump.problems.len()
    }
}
