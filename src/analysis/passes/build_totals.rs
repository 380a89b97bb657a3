use crate::analysis::{
    action::Action,
    passes::Pass,
    state::{AnalysisState, Phase},
};
use crate::model::ThreadDump;

/// Counts by fingerprint and by status, and indexes lock ownership.
pub struct BuildTotals;

impl Pass for BuildTotals {
    fn id(&self) -> &'static str {
        "build_totals"
    }

    fn actions(&self, dump: &ThreadDump, _st: &AnalysisState) -> Vec<Action> {
        let mut out = Vec::new();

        for (tid, t) in &dump.threads {
            if let Some(hash) = &t.stack_hash {
                out.push(Action::IncStack {
                    hash: hash.clone(),
                    by: 1,
                });
            }
            out.push(Action::IncStatus {
                status: t.status.clone(),
                by: 1,
            });
            for lock in &t.locks_owned {
                out.push(Action::SetLockOwner {
                    lock: lock.clone(),
                    tid: tid.clone(),
                });
            }
        }

        out.push(Action::SetPhase(Phase::TotalsBuilt));
        out
    }
}
