use std::collections::HashSet;

use tokio::sync::mpsc;

use crate::common::{Message, MessageId, NetworkCommand, NewMessage};
use crate::config::ChannelSettings;
use crate::network::{BackendError, BackendHandle, ChatClient};
use crate::ui::ChatState;
use crate::ui::components::message_bubble;

const LINE_WIDTH: usize = 72;

#[derive(Debug, thiserror::Error)]
pub enum HeadlessError {
    #[error("message is empty")]
    EmptyMessage,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Follow the chat in the terminal until Ctrl-C.
pub async fn tail(handle: BackendHandle, settings: ChannelSettings) {
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    let (event_tx, mut event_rx) = mpsc::channel(100);
    let network = tokio::spawn(ChatClient::new(handle, settings, event_tx, cmd_rx).run());

    let mut state = ChatState::new();
    let mut printed = HashSet::new();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                state.apply(event);
                for message in unprinted(&state, &mut printed) {
                    println!("{}", message_bubble::plain_line(message, LINE_WIDTH));
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    state.teardown();
    if let Err(err) = cmd_tx.send(NetworkCommand::Shutdown).await {
        log::debug!("Network task already stopped: {err}");
    }
    if let Err(err) = network.await {
        log::error!("Network task failed: {err}");
    }
}

/// Insert one message and return once the backend has accepted it.
pub async fn send_once(
    handle: &BackendHandle,
    settings: &ChannelSettings,
    text: &str,
) -> Result<(), HeadlessError> {
    let message = NewMessage::from_user(text).ok_or(HeadlessError::EmptyMessage)?;
    handle.insert_message(&settings.table, &message).await?;
    log::info!("Message sent to {}", settings.table);
    Ok(())
}

/// Messages in list order whose ids have not been printed yet.
///
/// Tracks ids rather than a position because the history fetch can reorder
/// rows that arrived live before it.
fn unprinted<'a>(state: &'a ChatState, printed: &mut HashSet<MessageId>) -> Vec<&'a Message> {
    state
        .messages()
        .iter()
        .filter(|message| printed.insert(message.id.clone()))
        .collect()
}
