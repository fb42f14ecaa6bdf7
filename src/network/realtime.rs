use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

use crate::config::ChannelSettings;

use super::error::BackendError;
use super::handle::BackendHandle;
use super::protocol::{self, ChannelEvent, Frame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One joined realtime channel on its own websocket.
pub struct RealtimeChannel {
    stream: WsStream,
    settings: ChannelSettings,
    join_ref: String,
    next_ref: u64,
}

impl RealtimeChannel {
    /// Open the socket and send `phx_join`.
    ///
    /// The join reply arrives later through [`RealtimeChannel::next_event`].
    pub async fn join(
        handle: &BackendHandle,
        settings: ChannelSettings,
    ) -> Result<Self, BackendError> {
        let url = handle.config().realtime_url()?;
        let (stream, _) = connect_async(url.as_str()).await?;

        let mut channel = Self {
            stream,
            settings,
            join_ref: Uuid::new_v4().to_string(),
            next_ref: 0,
        };
        let frame = Frame::join(&channel.settings, handle.config().anon_key(), &channel.join_ref);
        channel.send(&frame).await?;
        log::debug!("Sent join for {}", channel.settings.topic());

        Ok(channel)
    }

    pub fn settings(&self) -> &ChannelSettings {
        &self.settings
    }

    /// Next interpreted frame, or `None` once the socket is closed.
    pub async fn next_event(&mut self) -> Option<Result<ChannelEvent, BackendError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(err) => return Some(Err(err.into())),
            };

            match message {
                WsMessage::Text(text) => {
                    return Some(
                        protocol::decode(text.as_str(), &self.settings).map_err(Into::into),
                    );
                }
                WsMessage::Close(frame) => {
                    log::debug!("Realtime socket closed by server: {frame:?}");
                    return None;
                }
                // Pings are answered by tungstenite itself.
                _ => continue,
            }
        }
    }

    pub async fn heartbeat(&mut self) -> Result<(), BackendError> {
        let reference = self.next_reference();
        self.send(&Frame::heartbeat(&reference)).await
    }

    /// Send `phx_leave` and close the socket.
    pub async fn leave(mut self) -> Result<(), BackendError> {
        let reference = self.next_reference();
        let frame = Frame::leave(&self.settings, &reference, &self.join_ref);
        self.send(&frame).await?;
        self.stream.close(None).await?;
        Ok(())
    }

    fn next_reference(&mut self) -> String {
        self.next_ref += 1;
        self.next_ref.to_string()
    }

    async fn send(&mut self, frame: &Frame) -> Result<(), BackendError> {
        let text = frame.encode()?;
        self.stream.send(WsMessage::Text(text.into())).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "realtime_test.rs"]
mod tests;
