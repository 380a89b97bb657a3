//! Two-step analysis of a parsed dump.
//!
//! [`analyze_threads`] fingerprints every stack. [`analyze_dump`] then
//! rebuilds the dump-level counts, the lock owner index and the problem
//! list. [`run`] does both.

use crate::error::{DumpError, Result};
use crate::model::ThreadDump;
use serde::{Deserialize, Serialize};

pub mod action;
pub mod checks;
pub mod passes;
pub mod reducer;
pub mod state;
pub mod store;

use checks::{BlockedOnOwnedLock, ExcessiveDepth, Rule};
use passes::{BuildTotals, Pass, ShapeStacks};
use store::Store;

pub const MAX_STACK_DEPTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Non-runnable threads deeper than this are reported.
    pub max_stack_depth: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: MAX_STACK_DEPTH,
        }
    }
}

/// Computes `stack_hash` and `stack_depth` for every thread.
pub fn analyze_threads(dump: &mut ThreadDump) {
    let mut store = Store::new();
    let pass = ShapeStacks;
    log::debug!("running pass {}", pass.id());
    let actions = pass.actions(dump, store.state());
    store.dispatch_many(actions);
    store.state().commit_shapes(dump);
}

/// Rebuilds `by_stack`, `by_status`, `lock_owners` and `problems`. Returns
/// the number of problems found.
///
/// Fails with [`DumpError::Unanalyzed`] if any thread has not been through
/// [`analyze_threads`].
pub fn analyze_dump(dump: &mut ThreadDump, cfg: &AnalyzerConfig) -> Result<usize> {
    if let Some(t) = dump.threads.values().find(|t| !t.is_analyzed()) {
        return Err(DumpError::Unanalyzed { tid: t.tid.clone() });
    }
    Ok(rebuild_totals(dump, cfg))
}

/// Both analysis steps, in order.
pub fn run(dump: &mut ThreadDump, cfg: &AnalyzerConfig) -> usize {
    analyze_threads(dump);
    rebuild_totals(dump, cfg)
}

fn rebuild_totals(dump: &mut ThreadDump, cfg: &AnalyzerConfig) -> usize {
    let mut store = Store::new();

    let passes: Vec<Box<dyn Pass>> = vec![Box::new(BuildTotals)];
    for p in passes {
        log::debug!("running pass {}", p.id());
        let actions = p.actions(dump, store.state());
        store.dispatch_many(actions);
    }

    let rules: Vec<Box<dyn Rule>> = vec![
        Box::new(BlockedOnOwnedLock),
        Box::new(ExcessiveDepth {
            max_depth: cfg.max_stack_depth,
        }),
    ];
    let check_actions = checks::run_rules(dump, store.state(), &rules);
    store.dispatch_many(check_actions);

    store.dispatch(action::Action::SetPhase(state::Phase::Done));
    store.into_state().commit_totals(dump)
}
