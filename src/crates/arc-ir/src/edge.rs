use crate::Handle;

/// Whether an edge propagates on every change of its source, or at most
/// once per activation scope and only when the source is truthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EdgeKind {
    Continuous,
    OneShot,
}

/// Declares that `target`'s input changes when `source`'s output changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    pub source: Handle,
    pub target: Handle,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn continuous(source: Handle, target: Handle) -> Self {
        Self { source, target, kind: EdgeKind::Continuous }
    }

    pub fn one_shot(source: Handle, target: Handle) -> Self {
        Self { source, target, kind: EdgeKind::OneShot }
    }
}

/// Stratified node keys defining execution order: stratum 0 is always
/// eligible, later strata execute only for nodes marked changed by an
/// earlier one. Order within a stratum carries no meaning.
pub type Strata = Vec<Vec<String>>;
