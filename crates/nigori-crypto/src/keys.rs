//! Password-derived key material.
//!
//! cipher = SHA-256(password), mac = SHA-256(cipher), auth = SHA-256(mac).
//! Each secret is one hash step away from the previous one, so none can be
//! walked back to the one before it.

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::types::{BlockCipher, DERIVED_KEY_LENGTH};

/// The three independent secrets derived from a password.
///
/// Recomputed for every client operation and never persisted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PasswordKeys {
    cipher_key: [u8; DERIVED_KEY_LENGTH],
    mac_key: [u8; DERIVED_KEY_LENGTH],
    auth_key: [u8; DERIVED_KEY_LENGTH],
    #[zeroize(skip)]
    cipher: BlockCipher,
}

/// Signing handle: exposes the authentication key and nothing else.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningSeed([u8; DERIVED_KEY_LENGTH]);

impl SigningSeed {
    /// Wrap raw seed bytes, e.g. for a signer test vector.
    pub fn from_bytes(bytes: [u8; DERIVED_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_LENGTH] {
        &self.0
    }
}

fn sha256(data: &[u8]) -> [u8; DERIVED_KEY_LENGTH] {
    Sha256::digest(data).into()
}

impl PasswordKeys {
    /// Derive keys from a password for the given block cipher.
    pub fn derive(password: &[u8], cipher: BlockCipher) -> Self {
        let cipher_key = sha256(password);
        let mac_key = sha256(&cipher_key);
        let auth_key = sha256(&mac_key);
        Self {
            cipher_key,
            mac_key,
            auth_key,
            cipher,
        }
    }

    /// Block cipher these keys encrypt with.
    pub fn cipher(&self) -> BlockCipher {
        self.cipher
    }

    /// Handle for the external signature primitive.
    pub fn signer(&self) -> SigningSeed {
        SigningSeed(self.auth_key)
    }

    /// Cipher key truncated to the selected cipher's key size.
    pub(crate) fn cipher_key(&self) -> &[u8] {
        &self.cipher_key[..self.cipher.key_size()]
    }

    pub(crate) fn mac_key(&self) -> &[u8] {
        &self.mac_key
    }
}

impl std::fmt::Debug for PasswordKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordKeys")
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for SigningSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSeed(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = PasswordKeys::derive(b"password", BlockCipher::Aes256);
        let b = PasswordKeys::derive(b"password", BlockCipher::Aes256);
        assert_eq!(a.cipher_key, b.cipher_key);
        assert_eq!(a.mac_key, b.mac_key);
        assert_eq!(a.auth_key, b.auth_key);
    }

    #[test]
    fn cascade_matches_sha256_chain() {
        let keys = PasswordKeys::derive(b"abc", BlockCipher::Aes256);
        // SHA-256("abc")
        let expected =
            hex::decode("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
                .unwrap();
        assert_eq!(keys.cipher_key.to_vec(), expected);
        assert_eq!(keys.mac_key, sha256(&keys.cipher_key));
        assert_eq!(keys.auth_key, sha256(&keys.mac_key));
    }

    #[test]
    fn three_secrets_differ() {
        let keys = PasswordKeys::derive(b"password", BlockCipher::Aes256);
        assert_ne!(keys.cipher_key, keys.mac_key);
        assert_ne!(keys.mac_key, keys.auth_key);
        assert_ne!(keys.cipher_key, keys.auth_key);
    }

    #[test]
    fn different_passwords_different_keys() {
        let a = PasswordKeys::derive(b"password-a", BlockCipher::Aes256);
        let b = PasswordKeys::derive(b"password-b", BlockCipher::Aes256);
        assert_ne!(a.cipher_key, b.cipher_key);
    }

    #[test]
    fn signer_exposes_auth_key_only() {
        let keys = PasswordKeys::derive(b"password", BlockCipher::Aes256);
        let seed = keys.signer();
        assert_eq!(seed.as_bytes(), &keys.auth_key);
        assert_ne!(seed.as_bytes(), &keys.cipher_key);
        assert_ne!(seed.as_bytes(), &keys.mac_key);
    }

    #[test]
    fn des_uses_key_prefix() {
        let keys = PasswordKeys::derive(b"password", BlockCipher::Des);
        assert_eq!(keys.cipher_key().len(), 8);
        assert_eq!(keys.cipher_key(), &keys.cipher_key[..8]);
    }

    #[test]
    fn debug_hides_secrets() {
        let keys = PasswordKeys::derive(b"password", BlockCipher::Aes256);
        assert_eq!(format!("{:?}", keys.signer()), "SigningSeed(..)");
        assert_eq!(
            format!("{keys:?}"),
            "PasswordKeys { cipher: Aes256, .. }"
        );
    }
}
