use std::collections::{HashMap, HashSet};

use arc_ir::{Edge, Handle, Strata, IR};
use arc_telem::{SampleValue, TimeSpan};

use crate::context::{should_propagate, Context};
use crate::node::{FactoryChain, Node};
use crate::state::State;

struct NodeEntry {
    /// Outgoing edges keyed by output parameter name.
    output_edges: HashMap<String, Vec<Edge>>,
    /// output parameter name -> channel key this output is bound to write.
    channels_write: HashMap<String, u32>,
    node: Box<dyn Node>,
}

struct StageState {
    strata: Strata,
    /// One-shot edges that have already fired in this stage's current activation.
    fired_one_shots: HashSet<Edge>,
}

struct SequenceState {
    stages: Vec<StageState>,
    active_stage_idx: Option<usize>,
}

/// Reactive scheduler that drives every node once per tick in dependency
/// order: a flat pass over the global strata, then a bounded convergence
/// loop over whichever sequence stages are currently active. Mirrors the
/// reference runtime's superstep structure one-for-one, adapted to Rust by
/// having nodes record their side effects onto a [`Context`] instead of
/// reaching back into the scheduler through a reentrant callback — the
/// effects are applied here, immediately after the node call returns, once
/// its `&mut` borrow of `state` has ended.
pub struct Scheduler {
    nodes: HashMap<String, NodeEntry>,
    global_strata: Strata,
    sequences: Vec<SequenceState>,
    /// entry node key -> (sequence index, stage index) it activates.
    transitions: HashMap<String, (usize, usize)>,
    max_convergence_iterations: usize,

    changed: HashSet<String>,
    /// One-shot edges fired during global strata execution. Never cleared;
    /// global strata have no stage boundary to reset them at.
    global_fired_one_shots: HashSet<Edge>,
    curr_node_key: String,
    curr_seq_idx: Option<usize>,
    curr_stage_idx: Option<usize>,

    state: State,
}

impl Scheduler {
    /// Builds a scheduler from a validated IR program: registers every
    /// node's output storage and incoming edges in a fresh [`State`], then
    /// asks `factories` to construct an implementation for each node. A
    /// node type no factory in the chain recognizes is skipped with a
    /// warning rather than failing the whole build, for forward
    /// compatibility with newer compilers.
    pub fn build(ir: &IR, factories: &FactoryChain) -> Self {
        let mut state = State::new();
        for node in &ir.nodes {
            state.register_node(node);
        }
        for edge in &ir.edges {
            state.add_edge(edge.clone());
        }

        let mut nodes = HashMap::new();
        for node in &ir.nodes {
            match factories.create(node, &mut state) {
                Some(impl_) => {
                    nodes.insert(
                        node.key.clone(),
                        NodeEntry {
                            output_edges: ir.edges_from(&node.key),
                            channels_write: node.channels_write.clone(),
                            node: impl_,
                        },
                    );
                }
                None => {
                    tracing::warn!(node = %node.key, node_type = %node.node_type, "no factory claimed node type, skipping");
                }
            }
        }

        let mut sequences = Vec::with_capacity(ir.sequences.len());
        let mut transitions = HashMap::new();
        let mut max_convergence_iterations = 0;
        for (seq_idx, seq_ir) in ir.sequences.iter().enumerate() {
            max_convergence_iterations += seq_ir.stages.len();
            let mut stages = Vec::with_capacity(seq_ir.stages.len());
            for (stage_idx, stage_ir) in seq_ir.stages.iter().enumerate() {
                let entry_key = seq_ir.entry_key(stage_ir);
                transitions.insert(entry_key, (seq_idx, stage_idx));
                stages.push(StageState { strata: stage_ir.strata.clone(), fired_one_shots: HashSet::new() });
            }
            sequences.push(SequenceState { stages, active_stage_idx: None });
        }

        Self {
            nodes,
            global_strata: ir.strata.clone(),
            sequences,
            transitions,
            max_convergence_iterations,
            changed: HashSet::new(),
            global_fired_one_shots: HashSet::new(),
            curr_node_key: String::new(),
            curr_seq_idx: None,
            curr_stage_idx: None,
            state,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// Advances by one tick: runs the global strata, then drives active
    /// stages to convergence.
    pub fn next(&mut self, elapsed: TimeSpan) {
        self.curr_seq_idx = None;
        self.curr_stage_idx = None;
        self.execute_strata(elapsed, &self.global_strata.clone());
        self.exec_stages(elapsed);
    }

    /// Clears every stage's fired-one-shot set, deactivates every sequence,
    /// and resets every node's internal state.
    pub fn reset(&mut self) {
        self.global_fired_one_shots.clear();
        for seq in &mut self.sequences {
            seq.active_stage_idx = None;
            for stage in &mut seq.stages {
                stage.fired_one_shots.clear();
            }
        }
        for entry in self.nodes.values_mut() {
            entry.node.reset();
        }
    }

    /// Runs one stratified pass: stratum 0 always executes, later strata
    /// execute only nodes this pass has already marked changed.
    fn execute_strata(&mut self, elapsed: TimeSpan, strata: &Strata) {
        self.changed.clear();
        for (i, stratum) in strata.iter().enumerate() {
            for key in stratum {
                if i != 0 && !self.changed.contains(key) {
                    continue;
                }
                self.run_node(elapsed, key);
            }
        }
    }

    /// Calls one node's `next`, then applies the `Effects` it recorded.
    fn run_node(&mut self, elapsed: TimeSpan, key: &str) {
        let Some(entry) = self.nodes.get_mut(key) else { return };
        self.curr_node_key = key.to_string();
        let mut ctx = Context::new(elapsed, key);
        if let Err(err) = entry.node.next(&mut self.state, &mut ctx) {
            tracing::error!(node = key, error = %err, "node returned an error");
        }
        let effects = ctx.into_effects();

        for err in &effects.errors {
            tracing::error!(node = key, error = %err, "node reported an error");
        }
        for param in &effects.changed_params {
            self.mark_changed(param);
        }
        if effects.activate_stage {
            self.transition_stage();
        }
    }

    /// Drives every active sequence stage to convergence: re-executing an
    /// active stage's strata whenever it is still active once the pass
    /// finishes, stopping early once no sequence transitioned this round.
    fn exec_stages(&mut self, elapsed: TimeSpan) {
        for _ in 0..self.max_convergence_iterations {
            let mut stable = true;
            for seq_idx in 0..self.sequences.len() {
                let Some(stage_idx) = self.sequences[seq_idx].active_stage_idx else { continue };
                self.curr_seq_idx = Some(seq_idx);
                self.curr_stage_idx = Some(stage_idx);
                let strata = self.sequences[seq_idx].stages[stage_idx].strata.clone();
                self.execute_strata(elapsed, &strata);
                if self.sequences[seq_idx].active_stage_idx != Some(stage_idx) {
                    stable = false;
                }
            }
            if stable {
                break;
            }
        }
    }

    /// Resolves which downstream nodes `param`'s edges mark changed, and
    /// forwards the value to whatever channel `param` is bound to write, if
    /// any. Continuous edges always propagate; one-shot edges propagate at
    /// most once per activation scope (global, or the current stage) and
    /// only while the source output is truthy.
    fn mark_changed(&mut self, param: &str) {
        let Some(entry) = self.nodes.get(&self.curr_node_key) else { return };

        if let Some(&channel_key) = entry.channels_write.get(param) {
            let handle = Handle::new(self.curr_node_key.clone(), param.to_string());
            let vp = self.state.value_pair(&handle);
            if let (Some(value), Some(SampleValue::Timestamp(ts))) = (vp.data.last(), vp.time.last()) {
                self.state.write_channel(channel_key, value, ts);
            }
        }

        let (edges, truthy) = {
            let Some(entry) = self.nodes.get(&self.curr_node_key) else { return };
            let Some(edges) = entry.output_edges.get(param) else { return };
            (edges.clone(), entry.node.is_output_truthy(&self.state, param))
        };

        for edge in edges {
            let fired_set = match self.curr_stage_idx {
                None => &mut self.global_fired_one_shots,
                Some(stage_idx) => {
                    &mut self.sequences[self.curr_seq_idx.expect("stage implies sequence")].stages[stage_idx]
                        .fired_one_shots
                }
            };
            if should_propagate(&edge, || truthy, fired_set) {
                self.changed.insert(edge.target.node.clone());
            }
        }
    }

    /// Resets the strata belonging to one stage, used when entering it.
    fn reset_strata(&mut self, strata: &Strata) {
        for stratum in strata {
            for key in stratum {
                if let Some(entry) = self.nodes.get_mut(key) {
                    entry.node.reset();
                }
            }
        }
    }

    /// Deactivates the currently executing stage (if any) and activates the
    /// stage this tick's entry node targets, clearing its one-shot history
    /// and resetting every node in it first.
    fn transition_stage(&mut self) {
        if let Some(seq_idx) = self.curr_seq_idx {
            self.sequences[seq_idx].active_stage_idx = None;
        }
        let Some(&(target_seq_idx, target_stage_idx)) = self.transitions.get(&self.curr_node_key) else {
            tracing::warn!(node = %self.curr_node_key, "node requested a stage transition with no matching entry point");
            return;
        };
        let strata = self.sequences[target_seq_idx].stages[target_stage_idx].strata.clone();
        self.sequences[target_seq_idx].stages[target_stage_idx].fired_one_shots.clear();
        self.reset_strata(&strata);
        self.sequences[target_seq_idx].active_stage_idx = Some(target_stage_idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arc_ir::{EdgeKind, Handle, Node as IrNode, Param, Sequence, Stage};
    use arc_telem::DataType;

    fn node(key: &str, node_type: &str, inputs: &[&str], outputs: &[&str]) -> IrNode {
        IrNode {
            key: key.to_string(),
            node_type: node_type.to_string(),
            inputs: inputs.iter().map(|n| Param::new(*n, DataType::F64)).collect(),
            outputs: outputs.iter().map(|n| Param::new(*n, DataType::F64)).collect(),
            config: vec![],
            channels_read: Default::default(),
            channels_write: Default::default(),
            config_values: Default::default(),
        }
    }

    #[test]
    fn global_strata_propagates_across_two_levels() {
        let ir = IR {
            nodes: vec![node("src", "interval", &[], &["output"]), node("sink", "io", &["in"], &["output"])],
            edges: vec![Edge::continuous(Handle::new("src", "output"), Handle::new("sink", "in"))],
            strata: vec![vec!["src".to_string()], vec!["sink".to_string()]],
            sequences: vec![],
            functions: Default::default(),
        };
        let mut sched = Scheduler::build(&ir, &FactoryChain::builtins());
        sched.next(TimeSpan::nanoseconds(1));
        let handle = Handle::new("sink", "output");
        assert_eq!(sched.state().value_pair(&handle).data.len(), 1);
    }

    #[test]
    fn stage_transition_activates_target_and_resets_its_nodes() {
        let entry = node("entry_seq_a", "interval", &[], &["output"]);
        let counter = node("counter", "interval", &[], &["output"]);
        let ir = IR {
            nodes: vec![entry, counter],
            edges: vec![],
            strata: vec![vec!["entry_seq_a".to_string()]],
            sequences: vec![Sequence {
                key: "seq".to_string(),
                stages: vec![Stage { key: "a".to_string(), strata: vec![vec!["counter".to_string()]] }],
            }],
            functions: Default::default(),
        };
        let mut sched = Scheduler::build(&ir, &FactoryChain::builtins());
        assert!(sched.sequences[0].active_stage_idx.is_none());

        sched.curr_node_key = "entry_seq_a".to_string();
        sched.curr_seq_idx = None;
        sched.transition_stage();
        assert_eq!(sched.sequences[0].active_stage_idx, Some(0));
    }

    #[test]
    fn reset_clears_global_one_shots_and_active_stages() {
        let ir = IR {
            nodes: vec![node("a", "interval", &[], &["output"])],
            edges: vec![],
            strata: vec![vec!["a".to_string()]],
            sequences: vec![],
            functions: Default::default(),
        };
        let mut sched = Scheduler::build(&ir, &FactoryChain::builtins());
        sched.global_fired_one_shots.insert(Edge::one_shot(Handle::new("a", "output"), Handle::new("b", "in")));
        sched.reset();
        assert!(sched.global_fired_one_shots.is_empty());
    }
}
