//! Client-side cryptography for the Nigori store: password key derivation,
//! encrypt-then-MAC for values and names, request signing, and threshold
//! sharing of secrets across servers.

pub mod base64url;
pub mod cipher;
pub mod error;
pub mod keys;
pub mod padding;
pub mod sharing;
pub mod signing;
pub mod types;

pub use base64url::{base64url_decode, base64url_encode};
pub use cipher::{decrypt, decrypt_base64url, decrypt_bytes, encrypt, permute, EncryptedBlob};
pub use error::CryptoError;
pub use keys::{PasswordKeys, SigningSeed};
pub use sharing::{ShamirSharer, Share, ThresholdSharer};
pub use signing::{EcdsaSigner, SchnorrSigner, SignaturePair, Signer};
pub use types::{BlockCipher, DERIVED_KEY_LENGTH, TAG_LENGTH};
