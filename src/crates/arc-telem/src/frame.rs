use std::collections::BTreeMap;

use crate::Series;

/// An ordered collection of channel-keyed series, the unit of data the
/// runtime's input and output queues carry across the host boundary.
///
/// `BTreeMap` keeps iteration order deterministic (by channel key), which
/// matters for anything that hashes or logs a frame's contents.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Frame {
    channels: BTreeMap<u32, Series>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, channel_key: u32, series: Series) {
        self.channels.insert(channel_key, series);
    }

    pub fn get(&self, channel_key: u32) -> Option<&Series> {
        self.channels.get(&channel_key)
    }

    pub fn get_mut(&mut self, channel_key: u32) -> Option<&mut Series> {
        self.channels.get_mut(&channel_key)
    }

    pub fn contains(&self, channel_key: u32) -> bool {
        self.channels.contains_key(&channel_key)
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.channels.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Series)> {
        self.channels.iter().map(|(k, v)| (*k, v))
    }

    /// Merges `other` into `self`, with `other`'s series winning on key
    /// collision. Used by the runtime to fold an embedder-supplied write
    /// frame into the set of channel outputs collected during a tick.
    pub fn merge(&mut self, other: Frame) {
        for (k, v) in other.channels {
            self.channels.insert(k, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_incoming() {
        let mut a = Frame::new();
        a.insert(1, Series::U8(vec![1]));
        let mut b = Frame::new();
        b.insert(1, Series::U8(vec![2]));
        b.insert(2, Series::U8(vec![3]));
        a.merge(b);
        assert_eq!(a.get(1), Some(&Series::U8(vec![2])));
        assert_eq!(a.get(2), Some(&Series::U8(vec![3])));
    }
}
