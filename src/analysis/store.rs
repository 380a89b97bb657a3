use super::{action::Action, reducer::reduce_in_place, state::AnalysisState};

/// Applies `f` to a copy of `base`. Cheap because the state's maps are
/// persistent.
fn produce<S: Clone>(base: &S, f: impl FnOnce(&mut S)) -> S {
    let mut draft = base.clone();
    f(&mut draft);
    draft
}

#[derive(Debug, Default, Clone)]
pub struct Store {
    st: AnalysisState,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn state(&self) -> &AnalysisState {
        &self.st
    }
    pub fn into_state(self) -> AnalysisState {
        self.st
    }

    pub fn dispatch(&mut self, a: Action) {
        self.dispatch_many(std::iter::once(a));
    }

    pub fn dispatch_many<I: IntoIterator<Item = Action>>(&mut self, actions: I) {
        self.st = produce(&self.st, |draft| {
            for a in actions {
                reduce_in_place(draft, a);
            }
        });
    }
}
