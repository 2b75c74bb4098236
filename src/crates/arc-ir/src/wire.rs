use arc_telem::{SampleValue, Series, TimeStamp};

/// An inbound real-time message: new samples for one channel, to be folded
/// into the source node that reads it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChannelUpdate {
    pub channel_key: u32,
    pub data: Series,
    pub time: Series,
}

/// An outbound real-time message: a single written sample and the timestamp
/// it was produced at.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChannelOutput {
    pub channel_key: u32,
    pub value: SampleValue,
    pub timestamp: TimeStamp,
}
