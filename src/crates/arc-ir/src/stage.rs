use crate::edge::Strata;

/// A named group of strata, entered and exited as a unit. Entering a stage
/// clears its fired-one-shots set and resets every node in its strata.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stage {
    pub key: String,
    pub strata: Strata,
}

/// An ordered list of stages, at most one of which is active at a time. The
/// active index itself is scheduler execution state, not IR, so it is not
/// stored here — see `arc_core::scheduler::Scheduler`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Sequence {
    pub key: String,
    pub stages: Vec<Stage>,
}

impl Sequence {
    /// Synthesizes the conventional entry-node key for one of this
    /// sequence's stages, e.g. `entry_seq_A`.
    pub fn entry_key(&self, stage: &Stage) -> String {
        format!("entry_{}_{}", self.key, stage.key)
    }
}
