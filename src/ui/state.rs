use std::collections::HashSet;

use crate::common::{ChannelStatus, Message, MessageId, NetworkEvent, NewMessage};

/// Local state of the chat window.
///
/// Messages arrive from two independent sources, the one-time history fetch
/// and the live insert channel, in no guaranteed relative order. Every
/// mutation goes through `known_ids` so an id is held at most once.
pub struct ChatState {
    messages: Vec<Message>,
    known_ids: HashSet<MessageId>,
    pub draft: String,
    is_loading: bool,
    channel_status: ChannelStatus,
    scroll_pending: bool,
    torn_down: bool,
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            known_ids: HashSet::new(),
            draft: String::new(),
            is_loading: true,
            channel_status: ChannelStatus::Connecting,
            scroll_pending: false,
            torn_down: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn channel_status(&self) -> ChannelStatus {
        self.channel_status
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Whether the Send control should be enabled.
    pub fn can_send(&self) -> bool {
        !self.is_loading && !self.draft.trim().is_empty()
    }

    pub fn apply(&mut self, event: NetworkEvent) {
        if self.torn_down {
            log::debug!("Ignoring {event:?} after teardown");
            return;
        }

        match event {
            NetworkEvent::HistoryLoaded(history) => self.load_history(history),
            NetworkEvent::HistoryFailed(err) => self.fail_history(&err),
            NetworkEvent::MessageInserted(message) => {
                self.insert_live(message);
            }
            NetworkEvent::SendSucceeded => self.send_succeeded(),
            NetworkEvent::SendFailed(err) => self.send_failed(&err),
            NetworkEvent::ChannelStatus(status) => self.channel_status = status,
        }
    }

    /// Replace the list with the fetched history.
    ///
    /// Live rows that landed before the fetch resolved and are missing from
    /// it are kept after the history, in arrival order.
    pub fn load_history(&mut self, history: Vec<Message>) {
        let early_live = std::mem::take(&mut self.messages);
        self.known_ids.clear();

        for message in history.into_iter().chain(early_live) {
            if self.known_ids.insert(message.id.clone()) {
                self.messages.push(message);
            }
        }

        log::info!("Loaded {} messages", self.messages.len());
        self.is_loading = false;
        self.scroll_pending = true;
    }

    pub fn fail_history(&mut self, err: &str) {
        log::error!("Error fetching messages: {err}");
        self.is_loading = false;
    }

    /// Append a live row unless its id is already held. Returns whether it was added.
    pub fn insert_live(&mut self, message: Message) -> bool {
        if !self.known_ids.insert(message.id.clone()) {
            log::debug!("Dropping duplicate message {}", message.id);
            return false;
        }

        self.messages.push(message);
        self.scroll_pending = true;
        true
    }

    /// Build the outgoing message for the current draft.
    ///
    /// `None` while loading or when the draft is blank; the draft itself is
    /// left alone until the insert is confirmed.
    pub fn begin_send(&self) -> Option<NewMessage> {
        if self.is_loading {
            return None;
        }
        NewMessage::from_user(&self.draft)
    }

    pub fn send_succeeded(&mut self) {
        self.draft.clear();
    }

    pub fn send_failed(&mut self, err: &str) {
        log::error!("Error sending message: {err}");
    }

    /// True once after each change to the message list.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_pending)
    }

    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.channel_status = ChannelStatus::Closed;
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
