use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::edge::{Edge, Strata};
use crate::error::{Error, Result};
use crate::node::{Node, Param};
use crate::stage::Sequence;

/// The typed signature of one compiled guest function: parameter list in
/// and out, matching the function name a `WASMNode` looks up in the wasm
/// module by.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Param>,
    pub returns: Vec<Param>,
}

/// The declarative program: every node, every edge between them, the global
/// execution strata, the sequence/stage table, and the typed signatures of
/// every compiled guest function the nodes may call into.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IR {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub strata: Strata,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
    #[serde(default)]
    pub functions: HashMap<String, FunctionSignature>,
}

impl IR {
    pub fn node(&self, key: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.key == key)
    }

    /// All outgoing edges from `node_key`, grouped by the source output
    /// param name — the shape the scheduler needs for `mark_changed`.
    pub fn edges_from(&self, node_key: &str) -> HashMap<String, Vec<Edge>> {
        let mut out: HashMap<String, Vec<Edge>> = HashMap::new();
        for edge in &self.edges {
            if edge.source.node == node_key {
                out.entry(edge.source.param.clone()).or_default().push(edge.clone());
            }
        }
        out
    }

    /// Checks the structural invariants from the data model: edges reference
    /// real nodes and params, and no node key appears twice in one strata
    /// list. Run once at load time; a failure means the runtime is never
    /// constructed.
    pub fn validate(&self) -> Result<()> {
        let mut seen_keys = HashSet::new();
        for node in &self.nodes {
            if !seen_keys.insert(node.key.as_str()) {
                return Err(Error::DuplicateNode(node.key.clone()));
            }
        }

        for edge in &self.edges {
            let source = self.node(&edge.source.node).ok_or_else(|| Error::UnknownNode(edge.source.node.clone()))?;
            if source.output_index(&edge.source.param).is_none() {
                return Err(Error::UnknownParam {
                    node: source.key.clone(),
                    param: edge.source.param.clone(),
                });
            }
            let target = self.node(&edge.target.node).ok_or_else(|| Error::UnknownNode(edge.target.node.clone()))?;
            if target.input_index(&edge.target.param).is_none() {
                return Err(Error::UnknownParam {
                    node: target.key.clone(),
                    param: edge.target.param.clone(),
                });
            }
        }

        validate_strata(&self.strata)?;
        for seq in &self.sequences {
            for stage in &seq.stages {
                validate_strata(&stage.strata)?;
            }
        }

        Ok(())
    }
}

fn validate_strata(strata: &Strata) -> Result<()> {
    let mut seen = HashSet::new();
    for stratum in strata {
        for key in stratum {
            if !seen.insert(key.as_str()) {
                return Err(Error::InvalidStrata(key.clone()));
            }
        }
    }
    Ok(())
}

/// The compiled, deployable artifact: the IR plus the wasm bytecode it
/// references plus the per-function memory layout the host needs to read
/// dirty bits and output values back out of linear memory.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Module {
    pub ir: IR,
    pub wasm: Vec<u8>,
    /// compiled function name -> base offset of its dirty-bitmap + output
    /// region in guest linear memory.
    pub output_memory_bases: HashMap<String, u32>,
}

impl Module {
    pub fn from_json(ir_json: &str, wasm: Vec<u8>, output_memory_bases: HashMap<String, u32>) -> Result<Self> {
        let ir: IR = serde_json::from_str(ir_json).map_err(|e| Error::Malformed(e.to_string()))?;
        ir.validate()?;
        Ok(Self { ir, wasm, output_memory_bases })
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage_count: usize = self.ir.sequences.iter().map(|s| s.stages.len()).sum();
        write!(
            f,
            "Module(nodes={}, edges={}, sequences={}, stages={}, wasm_bytes={})",
            self.ir.nodes.len(),
            self.ir.edges.len(),
            self.ir.sequences.len(),
            stage_count,
            self.wasm.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeKind;
    use crate::handle::Handle;
    use arc_telem::DataType;

    fn node(key: &str, outputs: &[&str], inputs: &[&str]) -> Node {
        Node {
            key: key.to_string(),
            node_type: "constant".to_string(),
            inputs: inputs.iter().map(|n| Param::new(*n, DataType::F64)).collect(),
            outputs: outputs.iter().map(|n| Param::new(*n, DataType::F64)).collect(),
            config: vec![],
            channels_read: Default::default(),
            channels_write: Default::default(),
            config_values: Default::default(),
        }
    }

    #[test]
    fn validate_rejects_unknown_edge_target() {
        let ir = IR {
            nodes: vec![node("a", &["out"], &[])],
            edges: vec![Edge {
                source: Handle::new("a", "out"),
                target: Handle::new("missing", "in"),
                kind: EdgeKind::Continuous,
            }],
            strata: vec![vec!["a".to_string()]],
            sequences: vec![],
            functions: Default::default(),
        };
        assert!(matches!(ir.validate(), Err(Error::UnknownNode(_))));
    }

    #[test]
    fn validate_rejects_duplicate_stratum_entry() {
        let ir = IR {
            nodes: vec![node("a", &["out"], &[])],
            edges: vec![],
            strata: vec![vec!["a".to_string(), "a".to_string()]],
            sequences: vec![],
            functions: Default::default(),
        };
        assert!(matches!(ir.validate(), Err(Error::InvalidStrata(_))));
    }

    #[test]
    fn validate_accepts_well_formed_ir() {
        let ir = IR {
            nodes: vec![node("a", &["out"], &[]), node("b", &[], &["in"])],
            edges: vec![Edge::continuous(Handle::new("a", "out"), Handle::new("b", "in"))],
            strata: vec![vec!["a".to_string()], vec!["b".to_string()]],
            sequences: vec![],
            functions: Default::default(),
        };
        assert!(ir.validate().is_ok());
    }
}
