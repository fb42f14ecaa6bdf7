use super::types::NewMessage;

/// Commands the UI sends down to the backend task.
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Insert a row; the result comes back as `SendSucceeded`/`SendFailed`.
    SendMessage(NewMessage),
    /// Leave the realtime channel and stop the task.
    Shutdown,
}
