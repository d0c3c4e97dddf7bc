use nigori_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection-level failure: the request never got a response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote store answered with a non-success status. Replayed
    /// tokens are reported this way.
    #[error("HTTP error: {status} {reason}")]
    Protocol { status: u16, reason: String },

    #[error("Invalid split topology: {0}")]
    Topology(String),

    #[error("Malformed field encoding: {0}")]
    Codec(String),

    #[error("No records stored under the requested name")]
    NoRecords,

    #[error("Recovery needs {needed} shares, collected {got}")]
    InsufficientShares { needed: usize, got: usize },

    #[error("System clock error: {0}")]
    Clock(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}
