use std::collections::HashMap;
use std::fmt;

use arc_ir::{ChannelOutput, Edge, Handle, Node as IrNode};
use arc_telem::{DataType, SampleValue, Series, TimeStamp};

use crate::error::{Error, Result};

/// A node's canonical output: a data series and its parallel timestamp
/// series. Shared by reference to downstream consumers within a tick;
/// mutation is confined to the owning node's `next`.
#[derive(Clone)]
pub struct ValuePair {
    pub data: Series,
    pub time: Series,
}

impl ValuePair {
    fn empty(data_type: DataType) -> Self {
        Self { data: Series::empty(data_type), time: Series::empty(DataType::Timestamp) }
    }
}

impl Default for ValuePair {
    fn default() -> Self {
        Self::empty(DataType::F64)
    }
}

/// `(func-id, var-id)` packed into a 64-bit integer, uniquely identifying a
/// WASM-scoped state variable. `func-id` is stable across ticks for a given
/// node; `var-id` is assigned by the compiler within that function's scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateKey(pub u64);

impl StateKey {
    pub fn new(func_id: u32, var_id: u32) -> Self {
        StateKey(((func_id as u64) << 32) | var_id as u64)
    }

    pub fn func_id(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn var_id(self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }
}

impl fmt::Debug for ValuePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValuePair").field("len", &self.data.len()).finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChannelMeta {
    pub data_type: DataType,
    pub index_key: Option<u32>,
}

/// The process-wide dataflow store: every node's output `ValuePair`s, the
/// typed state-variable map, the channel registry, and the pending outbound
/// write buffer. Logically single-threaded — only the runtime thread ever
/// mutates it.
pub struct State {
    slots: Vec<ValuePair>,
    handle_to_slot: HashMap<Handle, usize>,
    node_outputs: HashMap<String, Vec<Handle>>,
    node_input_order: HashMap<String, Vec<String>>,
    incoming_edges: HashMap<String, Vec<Edge>>,
    channels: HashMap<u32, ChannelMeta>,
    channel_values: HashMap<u32, (SampleValue, TimeStamp)>,
    channel_read_target: HashMap<u32, Handle>,
    pending_writes: Vec<ChannelOutput>,
    state_vars: HashMap<StateKey, SampleValue>,
}

impl State {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            handle_to_slot: HashMap::new(),
            node_outputs: HashMap::new(),
            node_input_order: HashMap::new(),
            incoming_edges: HashMap::new(),
            channels: HashMap::new(),
            channel_values: HashMap::new(),
            channel_read_target: HashMap::new(),
            pending_writes: Vec::new(),
            state_vars: HashMap::new(),
        }
    }

    /// Idempotent: registering the same channel key twice with the same
    /// metadata is a no-op.
    pub fn register_channel(&mut self, key: u32, data_type: DataType, index_key: Option<u32>) {
        self.channels.entry(key).or_insert(ChannelMeta { data_type, index_key });
    }

    /// Reserves a `ValuePair` slot for each of the node's declared outputs
    /// and records its input param order, so `node()` can later assemble a
    /// correctly-ordered `NodeState`.
    pub fn register_node(&mut self, node: &IrNode) {
        let mut handles = Vec::with_capacity(node.outputs.len());
        for param in &node.outputs {
            let handle = Handle::new(node.key.clone(), param.name.clone());
            let slot = self.slots.len();
            self.slots.push(ValuePair::empty(param.data_type));
            self.handle_to_slot.insert(handle.clone(), slot);
            handles.push(handle);
        }
        self.node_outputs.insert(node.key.clone(), handles);
        self.node_input_order
            .insert(node.key.clone(), node.inputs.iter().map(|p| p.name.clone()).collect());
        for (&channel_key, param) in &node.channels_read {
            self.channel_read_target.insert(channel_key, Handle::new(node.key.clone(), param.clone()));
        }
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.incoming_edges.entry(edge.target.node.clone()).or_default().push(edge);
    }

    /// Assembles the ordered incoming-edge list and output handle list this
    /// node needs to construct a [`crate::node_state::NodeState`]. Returns
    /// `None` if the node was never registered.
    pub fn node_ports(&self, key: &str) -> Option<(Vec<Edge>, Vec<Handle>)> {
        let order = self.node_input_order.get(key)?;
        let incoming = self.incoming_edges.get(key).cloned().unwrap_or_default();
        let inputs = order
            .iter()
            .filter_map(|param| incoming.iter().find(|e| e.target.param == *param).cloned())
            .collect();
        let outputs = self.node_outputs.get(key).cloned().unwrap_or_default();
        Some((inputs, outputs))
    }

    pub fn value_pair(&self, handle: &Handle) -> &ValuePair {
        static EMPTY_ONCE: std::sync::OnceLock<ValuePair> = std::sync::OnceLock::new();
        match self.handle_to_slot.get(handle) {
            Some(&slot) => &self.slots[slot],
            None => EMPTY_ONCE.get_or_init(ValuePair::default),
        }
    }

    pub fn value_pair_mut(&mut self, handle: &Handle) -> Option<&mut ValuePair> {
        self.handle_to_slot.get(handle).map(|&slot| &mut self.slots[slot])
    }

    /// Folds each channel in `frame` into the `ValuePair` of whichever node
    /// input is bound to read it, treating the update exactly as if a
    /// source node had just produced that series.
    pub fn ingest(&mut self, frame: &arc_telem::Frame, now: TimeStamp) {
        for (channel_key, series) in frame.iter() {
            if series.is_empty() {
                continue;
            }
            let last = series.last().unwrap();
            let ts = self
                .channels
                .get(&channel_key)
                .and_then(|m| m.index_key)
                .and_then(|idx_key| frame.get(idx_key))
                .and_then(|t| t.last())
                .map(|v| if let SampleValue::Timestamp(t) = v { t } else { now })
                .unwrap_or(now);
            self.channel_values.insert(channel_key, (last, ts));

            if let Some(handle) = self.channel_read_target.get(&channel_key).cloned() {
                if let Some(vp) = self.value_pair_mut(&handle) {
                    let mut time_series = Series::empty(DataType::Timestamp);
                    time_series.resize(series.len());
                    for i in 0..series.len() {
                        let _ = time_series.set(i, SampleValue::Timestamp(ts));
                    }
                    for i in 0..series.len() {
                        let _ = vp.data.push(series.at(i as i64).unwrap());
                    }
                    for i in 0..time_series.len() {
                        let _ = vp.time.push(time_series.at(i as i64).unwrap());
                    }
                }
            }
        }
    }

    pub fn read_channel(&self, key: u32) -> Result<SampleValue> {
        self.channel_values
            .get(&key)
            .map(|(v, _)| v.clone())
            .ok_or(Error::UnknownChannel(key))
    }

    /// Snapshots the latest known value of every channel, dropping
    /// timestamps. Used to seed a WASM guest's channel-read view before a
    /// node's activation, since the guest ABI only exchanges values.
    pub fn channel_snapshot(&self) -> HashMap<u32, SampleValue> {
        self.channel_values.iter().map(|(&key, (value, _))| (key, value.clone())).collect()
    }

    pub fn write_channel(&mut self, key: u32, value: SampleValue, timestamp: TimeStamp) {
        self.channel_values.insert(key, (value.clone(), timestamp));
        self.pending_writes.push(ChannelOutput { channel_key: key, value, timestamp });
    }

    /// Drains the accumulated outbound writes produced by this tick's
    /// `write_channel` calls.
    pub fn flush(&mut self) -> Vec<ChannelOutput> {
        std::mem::take(&mut self.pending_writes)
    }

    pub fn load_state(&self, key: StateKey, init: SampleValue) -> SampleValue {
        match self.state_vars.get(&key) {
            Some(v) if v.data_type() == init.data_type() => v.clone(),
            Some(_) => init,
            None => init,
        }
    }

    /// Rejects the write (leaving any prior value untouched) if `value`'s
    /// type does not match what is already stored under `key`.
    pub fn store_state(&mut self, key: StateKey, value: SampleValue) -> Result<()> {
        if let Some(existing) = self.state_vars.get(&key) {
            if existing.data_type() != value.data_type() {
                return Err(Error::StateTypeMismatch(key));
            }
        }
        self.state_vars.insert(key, value);
        Ok(())
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(key: &str, input: &str, output: &str) -> IrNode {
        IrNode {
            key: key.to_string(),
            node_type: "constant".into(),
            inputs: if input.is_empty() { vec![] } else { vec![arc_ir::Param::new(input, DataType::F64)] },
            outputs: if output.is_empty() { vec![] } else { vec![arc_ir::Param::new(output, DataType::F64)] },
            config: vec![],
            channels_read: if input.is_empty() {
                Default::default()
            } else {
                [(1u32, input.to_string())].into_iter().collect()
            },
            channels_write: Default::default(),
            config_values: Default::default(),
        }
    }

    #[test]
    fn ingest_feeds_a_channel_into_the_node_registered_to_read_it() {
        let mut state = State::new();
        state.register_channel(1, DataType::F64, None);
        state.register_node(&node("sink", "in", ""));

        let mut frame = arc_telem::Frame::new();
        frame.insert(1, Series::F64(vec![2.5]));
        state.ingest(&frame, TimeStamp(100));

        let handle = Handle::new("sink", "in");
        let vp = state.value_pair(&handle);
        assert_eq!(vp.data, Series::F64(vec![2.5]));
        assert_eq!(state.read_channel(1).unwrap(), SampleValue::F64(2.5));
    }

    #[test]
    fn value_pair_on_an_unregistered_handle_reads_as_empty() {
        let state = State::new();
        let vp = state.value_pair(&Handle::new("nope", "out"));
        assert!(vp.data.is_empty());
    }

    #[test]
    fn write_channel_updates_the_readable_value_and_queues_an_output() {
        let mut state = State::new();
        state.write_channel(5, SampleValue::F64(9.0), TimeStamp(1));
        assert_eq!(state.read_channel(5).unwrap(), SampleValue::F64(9.0));

        let flushed = state.flush();
        assert_eq!(flushed.len(), 1);
        assert_eq!(flushed[0].channel_key, 5);
        assert!(state.flush().is_empty());
    }

    #[test]
    fn channel_snapshot_copies_every_known_value_without_timestamps() {
        let mut state = State::new();
        state.write_channel(5, SampleValue::F64(9.0), TimeStamp(1));
        state.write_channel(6, SampleValue::I64(2), TimeStamp(2));
        let snapshot = state.channel_snapshot();
        assert_eq!(snapshot.get(&5), Some(&SampleValue::F64(9.0)));
        assert_eq!(snapshot.get(&6), Some(&SampleValue::I64(2)));
    }

    #[test]
    fn read_channel_on_an_unknown_key_is_an_error() {
        let state = State::new();
        assert!(matches!(state.read_channel(42), Err(Error::UnknownChannel(42))));
    }

    #[test]
    fn store_state_rejects_a_type_change_for_an_existing_key() {
        let mut state = State::new();
        let key = StateKey::new(1, 0);
        state.store_state(key, SampleValue::I64(1)).unwrap();
        assert!(matches!(state.store_state(key, SampleValue::F64(1.0)), Err(Error::StateTypeMismatch(_))));
        assert_eq!(state.load_state(key, SampleValue::I64(0)), SampleValue::I64(1));
    }

    #[test]
    fn load_state_falls_back_to_init_on_a_type_mismatch_or_miss() {
        let state = State::new();
        assert_eq!(state.load_state(StateKey::new(0, 0), SampleValue::F64(7.0)), SampleValue::F64(7.0));
    }
}
