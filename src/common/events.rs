use super::types::{ChannelStatus, Message};

/// Events the backend task reports up to the UI.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    /// Initial fetch finished, rows in `timestamp` ascending order.
    HistoryLoaded(Vec<Message>),
    HistoryFailed(String),
    /// A row arrived on the live channel.
    MessageInserted(Message),
    SendSucceeded,
    SendFailed(String),
    ChannelStatus(ChannelStatus),
}
