use super::{action::Action, state::AnalysisState};
use crate::model::ThreadDump;

pub trait Pass: Send + Sync {
    fn id(&self) -> &'static str;
    fn actions(&self, dump: &ThreadDump, st: &AnalysisState) -> Vec<Action>;
}

pub mod shape_stacks;
pub use shape_stacks::ShapeStacks;

pub mod build_totals;
pub use build_totals::BuildTotals;
