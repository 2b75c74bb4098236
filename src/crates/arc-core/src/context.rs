use std::collections::HashSet;

use arc_ir::{Edge, EdgeKind};
use arc_telem::TimeSpan;

use crate::error::Error;

/// What a node hands back to the scheduler during `next`, instead of
/// mutating global state directly: which output params changed, and whether
/// the node asked to activate its stage. Kept as a plain struct so the
/// scheduler can apply the side effects after the node call returns, once
/// the node's own `&mut` borrow has ended — see the scheduler module doc
/// for why that ordering matters.
#[derive(Default)]
pub struct Effects {
    pub changed_params: Vec<String>,
    pub errors: Vec<Error>,
    pub activate_stage: bool,
}

/// What a node sees during `next`: elapsed time since runtime start, and the
/// three callbacks the source exposes as closures. Rust can't cheaply hand a
/// node a live `&mut Scheduler` without aliasing its own entry in the node
/// map, so `mark_changed`/`activate_stage` are recorded into `Effects` and
/// applied by the scheduler immediately after the node's `next` returns.
pub struct Context<'a> {
    pub elapsed: TimeSpan,
    node_key: &'a str,
    effects: Effects,
}

impl<'a> Context<'a> {
    pub fn new(elapsed: TimeSpan, node_key: &'a str) -> Self {
        Self { elapsed, node_key, effects: Effects::default() }
    }

    pub fn mark_changed(&mut self, param: &str) {
        self.effects.changed_params.push(param.to_string());
    }

    pub fn report_error(&mut self, err: impl Into<Error>) {
        let err = err.into();
        tracing::error!(node = self.node_key, error = %err, "node reported an error");
        self.effects.errors.push(err);
    }

    pub fn activate_stage(&mut self) {
        self.effects.activate_stage = true;
    }

    pub fn into_effects(self) -> Effects {
        self.effects
    }
}

/// Resolves the propagation rule for one outgoing edge: does `target.node`
/// belong in the changed set for the next stratum?
pub fn should_propagate(edge: &Edge, source_truthy: impl FnOnce() -> bool, fired_one_shots: &mut HashSet<Edge>) -> bool {
    match edge.kind {
        EdgeKind::Continuous => true,
        EdgeKind::OneShot => {
            if !source_truthy() {
                false
            } else {
                fired_one_shots.insert(edge.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arc_ir::Handle;

    #[test]
    fn continuous_always_propagates() {
        let edge = Edge::continuous(Handle::new("a", "out"), Handle::new("b", "in"));
        let mut fired = HashSet::new();
        assert!(should_propagate(&edge, || false, &mut fired));
    }

    #[test]
    fn one_shot_fires_once_when_truthy() {
        let edge = Edge::one_shot(Handle::new("a", "out"), Handle::new("b", "in"));
        let mut fired = HashSet::new();
        assert!(should_propagate(&edge, || true, &mut fired));
        assert!(!should_propagate(&edge, || true, &mut fired));
    }

    #[test]
    fn one_shot_skips_when_not_truthy() {
        let edge = Edge::one_shot(Handle::new("a", "out"), Handle::new("b", "in"));
        let mut fired = HashSet::new();
        assert!(!should_propagate(&edge, || false, &mut fired));
    }
}
