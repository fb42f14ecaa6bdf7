pub mod client;
pub mod error;
pub mod handle;
pub mod protocol;
pub mod realtime;

pub use client::ChatClient;
pub use error::BackendError;
pub use handle::BackendHandle;
