use std::collections::HashMap;

use arc_telem::DataType;

/// A single typed input, output, or config parameter declared on an IR node.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Param {
    pub name: String,
    pub data_type: DataType,
}

impl Param {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self { name: name.into(), data_type }
    }
}

/// One node in the declarative program: its identity, type tag, typed ports,
/// and the channel bindings that connect its ports to external channels.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub key: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    pub config: Vec<Param>,
    /// channel key -> input param name this channel feeds.
    #[serde(default)]
    pub channels_read: HashMap<u32, String>,
    /// output param name -> channel key this output writes to.
    #[serde(default)]
    pub channels_write: HashMap<String, u32>,
    /// literal configuration values keyed by config param name.
    #[serde(default)]
    pub config_values: HashMap<String, serde_json::Value>,
}

impl Node {
    pub fn output_index(&self, param: &str) -> Option<usize> {
        self.outputs.iter().position(|p| p.name == param)
    }

    pub fn input_index(&self, param: &str) -> Option<usize> {
        self.inputs.iter().position(|p| p.name == param)
    }

    pub fn is_expression(&self) -> bool {
        self.key.starts_with("expression_")
    }

    pub fn is_entry(&self) -> bool {
        self.key.starts_with("entry_")
    }
}

/// A reduced view of a node used when reserving output storage: just enough
/// to size a [`crate::Handle`]-indexed arena, without pulling in the node's
/// full channel bindings or config.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeMetadata {
    pub key: String,
    pub outputs: Vec<Param>,
}

impl From<&Node> for NodeMetadata {
    fn from(n: &Node) -> Self {
        Self { key: n.key.clone(), outputs: n.outputs.clone() }
    }
}
