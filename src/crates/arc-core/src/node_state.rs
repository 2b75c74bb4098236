use arc_ir::{Edge, Handle};
use arc_telem::{SampleValue, Series, TimeStamp};

use crate::error::Result;
use crate::state::{State, StateKey};

/// Queued per-input data awaiting alignment, plus the watermark past which
/// this input has already been consumed.
#[derive(Debug, Default)]
struct InputEntry {
    data: Vec<Series>,
    time: Vec<Series>,
    watermark: TimeStamp,
}

impl InputEntry {
    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn last_timestamp(series: &Series) -> Option<TimeStamp> {
    match series.last()? {
        SampleValue::Timestamp(ts) => Some(ts),
        _ => None,
    }
}

/// One node's view of [`State`]: accumulates its inputs by edge, performs
/// watermark-based temporal alignment, and lazily exposes its own outputs.
/// Pre-allocated at module load and owned for the lifetime of its node.
pub struct NodeState {
    node_id: String,
    func_id: u32,
    inputs: Vec<Edge>,
    outputs: Vec<Handle>,
    accumulated: Vec<InputEntry>,
    aligned_data: Vec<Series>,
    aligned_time: Vec<Series>,
    /// Sourceless nodes are "ready" exactly once per activation (cleared by
    /// `reset`), rather than being driven by edge-based alignment.
    ready_once: bool,
}

impl NodeState {
    pub fn new(node_id: impl Into<String>, inputs: Vec<Edge>, outputs: Vec<Handle>) -> Self {
        let node_id = node_id.into();
        let func_id = function_id(&node_id);
        let n = inputs.len();
        Self {
            node_id,
            func_id,
            inputs,
            outputs,
            accumulated: (0..n).map(|_| InputEntry::default()).collect(),
            aligned_data: (0..n).map(|_| Series::empty(arc_telem::DataType::F64)).collect(),
            aligned_time: (0..n).map(|_| Series::empty(arc_telem::DataType::Timestamp)).collect(),
            ready_once: false,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn reset(&mut self) {
        self.ready_once = false;
        for entry in &mut self.accumulated {
            *entry = InputEntry::default();
        }
    }

    /// Implements the watermark-based temporal alignment algorithm:
    /// accumulate new data beyond each input's watermark, check readiness,
    /// pick the earliest new timestamp as the trigger, align every other
    /// input to the most recent value it has seen (hold-last), then prune
    /// fully-consumed queue entries.
    pub fn refresh_inputs(&mut self, state: &State) -> bool {
        if self.inputs.is_empty() {
            if self.ready_once {
                return false;
            }
            self.ready_once = true;
            return true;
        }

        for (i, edge) in self.inputs.iter().enumerate() {
            let source = state.value_pair(&edge.source);
            if source.data.is_empty() || source.time.is_empty() {
                continue;
            }
            let last_ts = match last_timestamp(&source.time) {
                Some(ts) => ts,
                None => continue,
            };
            if last_ts <= self.accumulated[i].watermark {
                continue;
            }
            self.accumulated[i].data.push(source.data.clone());
            self.accumulated[i].time.push(source.time.clone());
        }

        if self.accumulated.iter().any(InputEntry::is_empty) {
            return false;
        }

        let mut trigger: Option<(usize, TimeStamp)> = None;
        for (i, entry) in self.accumulated.iter().enumerate() {
            let Some(time_series) = entry.time.first() else { continue };
            if time_series.is_empty() {
                continue;
            }
            let Some(ts) = last_timestamp(time_series) else { continue };
            if ts > entry.watermark && trigger.map(|(_, t)| ts < t).unwrap_or(true) {
                trigger = Some((i, ts));
            }
        }
        let (trigger_idx, trigger_ts) = match trigger {
            Some(v) => v,
            None => return false,
        };

        for i in 0..self.inputs.len() {
            let idx = if i == trigger_idx { 0 } else { self.accumulated[i].data.len() - 1 };
            self.aligned_data[i] = self.accumulated[i].data[idx].clone();
            self.aligned_time[i] = self.accumulated[i].time[idx].clone();
            self.accumulated[i].watermark = trigger_ts;
        }

        for entry in &mut self.accumulated {
            let mut keep_idx = 0;
            for (j, t) in entry.time.iter().enumerate() {
                if t.is_empty() {
                    continue;
                }
                if let Some(ts) = last_timestamp(t) {
                    if ts > entry.watermark {
                        keep_idx = j;
                        break;
                    }
                }
            }
            if keep_idx > 0 {
                entry.data.drain(0..keep_idx);
                entry.time.drain(0..keep_idx);
            }
        }

        true
    }

    pub fn input(&self, param_index: usize) -> &Series {
        &self.aligned_data[param_index]
    }

    pub fn input_time(&self, param_index: usize) -> &Series {
        &self.aligned_time[param_index]
    }

    pub fn output<'s>(&self, state: &'s mut State, param_index: usize) -> &'s mut Series {
        let handle = &self.outputs[param_index];
        &mut state.value_pair_mut(handle).expect("output handle registered at load time").data
    }

    pub fn output_time<'s>(&self, state: &'s mut State, param_index: usize) -> &'s mut Series {
        let handle = &self.outputs[param_index];
        &mut state.value_pair_mut(handle).expect("output handle registered at load time").time
    }

    pub fn output_handle(&self, param_index: usize) -> &Handle {
        &self.outputs[param_index]
    }

    /// True iff the node's named output is non-empty and its last sample is
    /// truthy (numeric non-zero, or non-empty string).
    pub fn is_output_truthy(&self, state: &State, param: &str) -> bool {
        let Some(idx) = self.outputs.iter().position(|h| h.param == param) else { return false };
        let series = &state.value_pair(&self.outputs[idx]).data;
        series.last().map(|v| v.is_truthy()).unwrap_or(false)
    }

    pub fn read_channel(&self, state: &State, key: u32) -> Result<SampleValue> {
        Ok(state.read_channel(key)?)
    }

    pub fn write_channel(&self, state: &mut State, key: u32, value: SampleValue, timestamp: TimeStamp) {
        state.write_channel(key, value, timestamp);
    }

    pub fn load_var(&self, state: &State, var_id: u32, init: SampleValue) -> SampleValue {
        state.load_state(StateKey::new(self.func_id, var_id), init)
    }

    pub fn store_var(&self, state: &mut State, var_id: u32, value: SampleValue) -> Result<()> {
        Ok(state.store_state(StateKey::new(self.func_id, var_id), value)?)
    }
}

/// Derives a node's function id from its key. The compiler does not yet
/// hand the runtime a stable numeric function id, so — matching the
/// reference implementation's own stopgap — a hash of the node key stands
/// in until that metadata is wired through.
fn function_id(node_id: &str) -> u32 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    node_id.hash(&mut hasher);
    hasher.finish() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use arc_ir::EdgeKind;
    use arc_telem::DataType;

    fn push_sample(state: &mut State, handle: &Handle, value: f64, ts: i64) {
        let vp = state.value_pair_mut(handle).unwrap();
        vp.data.push(SampleValue::F64(value)).unwrap();
        vp.time.push(SampleValue::Timestamp(TimeStamp(ts))).unwrap();
    }

    fn make_node(state: &mut State, key: &str, outputs: &[&str]) {
        let node = arc_ir::Node {
            key: key.to_string(),
            node_type: "constant".into(),
            inputs: vec![],
            outputs: outputs.iter().map(|p| arc_ir::Param::new(*p, DataType::F64)).collect(),
            config: vec![],
            channels_read: Default::default(),
            channels_write: Default::default(),
            config_values: Default::default(),
        };
        state.register_node(&node);
    }

    #[test]
    fn single_input_aligns_immediately() {
        let mut state = State::new();
        make_node(&mut state, "a", &["out"]);
        let src = Handle::new("a", "out");
        push_sample(&mut state, &src, 1.0, 10);

        let mut ns = NodeState::new("b", vec![Edge::continuous(src.clone(), Handle::new("b", "in"))], vec![]);
        assert!(ns.refresh_inputs(&state));
        assert_eq!(ns.input(0), &Series::F64(vec![1.0]));
    }

    #[test]
    fn not_ready_until_source_has_data() {
        let mut state = State::new();
        make_node(&mut state, "a", &["out"]);
        let src = Handle::new("a", "out");
        let mut ns = NodeState::new("b", vec![Edge::continuous(src, Handle::new("b", "in"))], vec![]);
        assert!(!ns.refresh_inputs(&state));
    }

    #[test]
    fn multi_rate_hold_last_catches_up_slow_input() {
        let mut state = State::new();
        make_node(&mut state, "fast", &["out"]);
        make_node(&mut state, "slow", &["out"]);
        let fast = Handle::new("fast", "out");
        let slow = Handle::new("slow", "out");
        push_sample(&mut state, &slow, 100.0, 0);
        push_sample(&mut state, &fast, 1.0, 1);

        let mut ns = NodeState::new(
            "sum",
            vec![
                Edge::continuous(fast.clone(), Handle::new("sum", "a")),
                Edge::continuous(slow.clone(), Handle::new("sum", "b")),
            ],
            vec![],
        );
        assert!(ns.refresh_inputs(&state));
        assert_eq!(ns.input(0), &Series::F64(vec![1.0]));
        assert_eq!(ns.input(1), &Series::F64(vec![100.0]));
    }

    #[test]
    fn zero_input_node_ready_once_per_activation() {
        let state = State::new();
        let mut ns = NodeState::new("source", vec![], vec![]);
        assert!(ns.refresh_inputs(&state));
        assert!(!ns.refresh_inputs(&state));
        ns.reset();
        assert!(ns.refresh_inputs(&state));
    }
}
