use std::fmt;

/// Identifies an input or output port of a node: the pair (node key,
/// parameter name). Two handles are equal iff both components match, which
/// is what lets `State` key its output arena directly off IR-declared
/// handles instead of a separate synthetic id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Handle {
    pub node: String,
    pub param: String,
}

impl Handle {
    pub fn new(node: impl Into<String>, param: impl Into<String>) -> Self {
        Self { node: node.into(), param: param.into() }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.param)
    }
}
