use std::time::Duration;
use thiserror::Error;

use crate::client::credential::CredentialError;

/// Everything that can go wrong during one chat turn, as the user will see it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// The server could not be reached, or refused the connection before replying.
    #[error("Could not reach the chat server: {0}")]
    Transport(String),
    /// Non-success status with the server's `detail` message.
    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("Reply stream interrupted: {0}")]
    Stream(String),
    #[error("Reply was not valid UTF-8: {0}")]
    Decode(String),
    #[error("No reply data received within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("A reply is still streaming")]
    Busy,
    #[error("{0}")]
    Io(String),
    /// A command this client cannot run.
    #[error("{0}")]
    Usage(String),
}

impl ChatError {
    /// Text of the synthetic transcript entry that reports this error.
    pub fn to_entry_text(&self) -> String {
        format!("Error: {self}")
    }
}
