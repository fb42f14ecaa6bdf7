use std::future;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use crate::common::{ChannelStatus, NetworkCommand, NetworkEvent, NewMessage};
use crate::config::ChannelSettings;

use super::error::BackendError;
use super::handle::BackendHandle;
use super::protocol::ChannelEvent;
use super::realtime::RealtimeChannel;

/// Background task bridging the UI and the backend.
///
/// Starts the history fetch and the realtime subscription together, forwards
/// their results as [`NetworkEvent`]s and executes [`NetworkCommand`]s until
/// shut down.
pub struct ChatClient {
    handle: BackendHandle,
    settings: ChannelSettings,
    event_sender: mpsc::Sender<NetworkEvent>,
    command_receiver: mpsc::Receiver<NetworkCommand>,
}

impl ChatClient {
    pub fn new(
        handle: BackendHandle,
        settings: ChannelSettings,
        event_sender: mpsc::Sender<NetworkEvent>,
        command_receiver: mpsc::Receiver<NetworkCommand>,
    ) -> Self {
        Self {
            handle,
            settings,
            event_sender,
            command_receiver,
        }
    }

    pub async fn run(self) {
        let Self {
            handle,
            settings,
            event_sender,
            mut command_receiver,
        } = self;

        tokio::spawn(load_history(
            handle.clone(),
            settings.table.clone(),
            event_sender.clone(),
        ));

        notify(
            &event_sender,
            NetworkEvent::ChannelStatus(ChannelStatus::Connecting),
        )
        .await;
        // Polled inside the loop so commands are served while the handshake runs.
        let joining = join_channel(handle.clone(), settings.clone());
        tokio::pin!(joining);
        let mut join_pending = true;
        let mut channel: Option<RealtimeChannel> = None;

        let mut heartbeat =
            time::interval_at(Instant::now() + settings.heartbeat, settings.heartbeat);
        log::info!("Chat event loop started");

        loop {
            tokio::select! {
                joined = &mut joining, if join_pending => {
                    join_pending = false;
                    match joined {
                        Ok(joined) => channel = Some(joined),
                        Err(err) => {
                            log::error!("Realtime connection failed: {err}");
                            notify(
                                &event_sender,
                                NetworkEvent::ChannelStatus(ChannelStatus::Closed),
                            )
                            .await;
                        }
                    }
                }
                command = command_receiver.recv() => {
                    match command {
                        Some(NetworkCommand::SendMessage(message)) => {
                            tokio::spawn(send_message(
                                handle.clone(),
                                settings.table.clone(),
                                message,
                                event_sender.clone(),
                            ));
                        }
                        Some(NetworkCommand::Shutdown) | None => break,
                    }
                }
                event = next_channel_event(&mut channel) => {
                    if !handle_channel_event(event, &event_sender).await {
                        channel = None;
                        notify(
                            &event_sender,
                            NetworkEvent::ChannelStatus(ChannelStatus::Closed),
                        )
                        .await;
                    }
                }
                _ = heartbeat.tick(), if channel.is_some() => {
                    if let Some(channel) = channel.as_mut() {
                        if let Err(err) = channel.heartbeat().await {
                            log::warn!("Heartbeat failed: {err}");
                        }
                    }
                }
            }
        }

        if let Some(channel) = channel.take() {
            let topic = channel.settings().topic();
            match channel.leave().await {
                Ok(()) => log::info!("Left {topic}"),
                Err(err) => log::warn!("Failed to leave {topic}: {err}"),
            }
        }
        log::info!("Chat event loop stopped");
    }
}

async fn join_channel(
    handle: BackendHandle,
    settings: ChannelSettings,
) -> Result<RealtimeChannel, BackendError> {
    let limit = settings.join_timeout;
    time::timeout(limit, RealtimeChannel::join(&handle, settings))
        .await
        .map_err(|_| BackendError::JoinTimeout(limit))?
}

async fn next_channel_event(
    channel: &mut Option<RealtimeChannel>,
) -> Option<Result<ChannelEvent, BackendError>> {
    match channel {
        Some(channel) => channel.next_event().await,
        None => future::pending().await,
    }
}

/// Forward one channel event. Returns `false` once the channel is unusable.
async fn handle_channel_event(
    event: Option<Result<ChannelEvent, BackendError>>,
    event_sender: &mpsc::Sender<NetworkEvent>,
) -> bool {
    let event = match event {
        None => {
            log::warn!("Realtime socket closed");
            return false;
        }
        Some(Err(BackendError::Json(err))) => {
            log::warn!("Undecodable realtime frame: {err}");
            return true;
        }
        Some(Err(err)) => {
            log::error!("Realtime socket failed: {err}");
            return false;
        }
        Some(Ok(event)) => event,
    };

    match event {
        ChannelEvent::Joined { reference } => {
            log::info!("Realtime subscribed (ref {})", reference.unwrap_or_default());
            notify(
                event_sender,
                NetworkEvent::ChannelStatus(ChannelStatus::Subscribed),
            )
            .await;
        }
        ChannelEvent::JoinRejected { reason } => {
            log::error!("{}", BackendError::JoinRejected(reason));
            return false;
        }
        ChannelEvent::Insert(message) => {
            notify(event_sender, NetworkEvent::MessageInserted(message)).await;
        }
        ChannelEvent::System { ok: true, message } => log::info!("Realtime: {message}"),
        ChannelEvent::System { ok: false, message } => log::warn!("Realtime: {message}"),
        ChannelEvent::Closed { reason } => {
            log::warn!("Realtime channel closed: {reason}");
            return false;
        }
        ChannelEvent::HeartbeatAck => log::trace!("Heartbeat acknowledged"),
        ChannelEvent::Other(event) => log::debug!("Ignoring realtime event {event}"),
    }
    true
}

async fn load_history(
    handle: BackendHandle,
    table: String,
    event_sender: mpsc::Sender<NetworkEvent>,
) {
    let event = match handle.fetch_messages(&table).await {
        Ok(messages) => NetworkEvent::HistoryLoaded(messages),
        Err(err) => NetworkEvent::HistoryFailed(err.to_string()),
    };
    notify(&event_sender, event).await;
}

async fn send_message(
    handle: BackendHandle,
    table: String,
    message: NewMessage,
    event_sender: mpsc::Sender<NetworkEvent>,
) {
    let event = match handle.insert_message(&table, &message).await {
        Ok(()) => NetworkEvent::SendSucceeded,
        Err(err) => NetworkEvent::SendFailed(err.to_string()),
    };
    notify(&event_sender, event).await;
}

async fn notify(sender: &mpsc::Sender<NetworkEvent>, event: NetworkEvent) {
    if let Err(err) = sender.send(event).await {
        log::warn!("Failed to notify UI: {err}");
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
