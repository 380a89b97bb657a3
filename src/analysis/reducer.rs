use super::{action::Action, state::AnalysisState};

pub fn reduce_in_place(st: &mut AnalysisState, a: Action) {
    match a {
        Action::SetPhase(p) => st.phase = p,

        Action::SetShape { tid, shape } => {
            st.shapes.insert(tid, shape);
        }

        Action::IncStack { hash, by } => {
            let cur = st.by_stack.get(&hash).copied().unwrap_or(0);
            st.by_stack.insert(hash, cur + by);
        }

        Action::IncStatus { status, by } => {
            let cur = st.by_status.get(&status).copied().unwrap_or(0);
            st.by_status.insert(status, cur + by);
        }

        // last writer wins when two threads claim the same lock
        Action::SetLockOwner { lock, tid } => {
            st.lock_owners.insert(lock, tid);
        }

        Action::AddProblems(mut ps) => st.problems.append(&mut ps),
    }
}
