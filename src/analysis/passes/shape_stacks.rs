use crate::analysis::{
    action::Action,
    passes::Pass,
    state::{AnalysisState, Phase, StackShape},
};
use crate::model::{JavaThread, ThreadDump};
use sha2::{Digest, Sha256};

/// Only lines with this exact prefix count as call frames.
pub const FRAME_PREFIX: &str = "\tat ";

pub struct ShapeStacks;

impl Pass for ShapeStacks {
    fn id(&self) -> &'static str {
        "shape_stacks"
    }

    fn actions(&self, dump: &ThreadDump, _st: &AnalysisState) -> Vec<Action> {
        let mut out = Vec::with_capacity(dump.threads.len() + 1);
        for (tid, t) in &dump.threads {
            out.push(Action::SetShape {
                tid: tid.clone(),
                shape: stack_shape(&t.stack),
            });
        }
        out.push(Action::SetPhase(Phase::ShapesBuilt));
        out
    }
}

/// SHA-256 over the frame lines in order, plus their count. Lock annotations
/// and blank lines contribute nothing.
pub fn stack_shape(stack: &[String]) -> StackShape {
    let mut h = Sha256::new();
    let mut depth = 0usize;
    for line in stack.iter().filter(|l| l.starts_with(FRAME_PREFIX)) {
        h.update(line.as_bytes());
        depth += 1;
    }
    StackShape {
        hash: hex::encode(h.finalize()),
        depth,
    }
}

pub fn apply_shape(t: &mut JavaThread) {
    let shape = stack_shape(&t.stack);
    t.stack_hash = Some(shape.hash);
    t.stack_depth = Some(shape.depth);
}
