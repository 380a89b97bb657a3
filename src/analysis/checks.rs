use super::{
    action::Action,
    state::{AnalysisState, Phase},
};
use crate::model::ThreadDump;

pub const BLOCKED: &str = "BLOCKED";
pub const RUNNABLE: &str = "RUNNABLE";

pub trait Rule: Send + Sync {
    fn id(&self) -> &'static str;
    fn problems(&self, dump: &ThreadDump, st: &AnalysisState) -> Vec<String>;
}

pub fn run_rules(dump: &ThreadDump, st: &AnalysisState, rules: &[Box<dyn Rule>]) -> Vec<Action> {
    let mut out = Vec::new();
    for r in rules {
        let ps = r.problems(dump, st);
        if !ps.is_empty() {
            log::debug!("rule {} flagged {} problem(s)", r.id(), ps.len());
            out.push(Action::AddProblems(ps));
        }
    }
    out.push(Action::SetPhase(Phase::ChecksRun));
    out
}

/// A BLOCKED thread waiting on a lock some other thread is recorded as
/// holding. Reports direct pairs only; cycles are not reconstructed.
pub struct BlockedOnOwnedLock;

impl Rule for BlockedOnOwnedLock {
    fn id(&self) -> &'static str {
        "blocked_on_owned_lock"
    }

    fn problems(&self, dump: &ThreadDump, st: &AnalysisState) -> Vec<String> {
        let mut out = Vec::new();
        for (tid, t) in &dump.threads {
            if t.status != BLOCKED {
                continue;
            }
            for lock in &t.locks_waiting {
                if let Some(owner) = st.lock_owners.get(lock) {
                    out.push(format!(
                        "{}[{}] blocked for {}[{}]. lock {}",
                        t.name,
                        tid,
                        owner,
                        dump.thread_name(owner),
                        lock
                    ));
                }
            }
        }
        out
    }
}

/// A thread that is not RUNNABLE yet sits more than `max_depth` frames deep.
pub struct ExcessiveDepth {
    pub max_depth: usize,
}

impl Rule for ExcessiveDepth {
    fn id(&self) -> &'static str {
        "excessive_depth"
    }

    fn problems(&self, dump: &ThreadDump, _st: &AnalysisState) -> Vec<String> {
        dump.threads
            .iter()
            .filter(|(_, t)| t.status != RUNNABLE)
            .filter_map(|(tid, t)| {
                let depth = t.stack_depth?;
                (depth > self.max_depth)
                    .then(|| format!("{}[{}] waiting with stack depth {}.", t.name, tid, depth))
            })
            .collect()
    }
}
