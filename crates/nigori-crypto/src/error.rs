use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Malformed or undersized encrypted blob.
    #[error("Malformed encrypted value: {0}")]
    Format(String),

    /// Tag mismatch: the value was tampered with or the key is wrong.
    #[error("MAC doesn't match")]
    Authentication,

    /// Decrypted padding bytes are inconsistent.
    #[error("Padding error: {0}")]
    Padding(String),

    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Signing seed does not map to a valid private scalar")]
    InvalidSeed,

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Secret sharing failed: {0}")]
    Sharing(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
