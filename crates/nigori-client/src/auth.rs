//! Per-request authentication tokens.
//!
//! `t = "<unix seconds>:<nonce>"` is signed with the password-derived
//! authentication key. The server rejects any `t` it has already seen for
//! the user, so every request must build its own token.

use std::time::{SystemTime, UNIX_EPOCH};

use nigori_crypto::{base64url_encode, PasswordKeys, SignaturePair, Signer};

use crate::error::ClientError;

/// Signed, single-use authentication parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub user: String,
    pub t: String,
    pub signature: SignaturePair,
}

fn unix_time() -> Result<u64, ClientError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| ClientError::Clock(e.to_string()))
}

fn random_nonce() -> Result<u32, ClientError> {
    let mut bytes = [0u8; 4];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| ClientError::Crypto(nigori_crypto::CryptoError::RngFailed(e.to_string())))?;
    Ok(u32::from_be_bytes(bytes))
}

impl AuthToken {
    /// Build a fresh token for `user` from the current time and a random
    /// 32-bit nonce.
    pub fn build<S: Signer + ?Sized>(
        user: &str,
        keys: &PasswordKeys,
        signer: &S,
    ) -> Result<Self, ClientError> {
        Self::build_at(user, keys, signer, unix_time()?, random_nonce()?)
    }

    /// Build a token for an explicit time and nonce.
    pub fn build_at<S: Signer + ?Sized>(
        user: &str,
        keys: &PasswordKeys,
        signer: &S,
        unix_time: u64,
        nonce: u32,
    ) -> Result<Self, ClientError> {
        let t = format!("{unix_time}:{nonce}");
        let signature = signer.sign(&keys.signer(), t.as_bytes())?;
        Ok(Self {
            user: user.to_string(),
            t,
            signature,
        })
    }

    /// Request parameters `user`, `t`, `e`, `s`.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("user", self.user.clone()),
            ("t", self.t.clone()),
            ("e", base64url_encode(&self.signature.e)),
            ("s", base64url_encode(&self.signature.s)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nigori_crypto::{BlockCipher, SchnorrSigner};

    fn keys() -> PasswordKeys {
        PasswordKeys::derive(b"password", BlockCipher::Aes256)
    }

    #[test]
    fn t_is_time_and_nonce() {
        let token = AuthToken::build_at("alice", &keys(), &SchnorrSigner, 1300000000, 42).unwrap();
        assert_eq!(token.t, "1300000000:42");
        assert_eq!(token.user, "alice");
    }

    #[test]
    fn signature_verifies_over_t() {
        let keys = keys();
        let token = AuthToken::build("alice", &keys, &SchnorrSigner).unwrap();
        let public_key = SchnorrSigner.public_key(&keys.signer()).unwrap();
        assert!(SchnorrSigner.verify(&public_key, token.t.as_bytes(), &token.signature));
    }

    #[test]
    fn tokens_in_same_second_differ() {
        let keys = keys();
        let a = AuthToken::build("alice", &keys, &SchnorrSigner).unwrap();
        let b = AuthToken::build("alice", &keys, &SchnorrSigner).unwrap();
        assert_ne!(a.t, b.t);
    }

    #[test]
    fn params_are_ordered_and_encoded() {
        let token = AuthToken::build_at("alice", &keys(), &SchnorrSigner, 1, 2).unwrap();
        let params = token.params();
        let names: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(names, vec!["user", "t", "e", "s"]);
        assert_eq!(params[2].1, base64url_encode(&token.signature.e));
        assert!(!params[3].1.contains('='));
    }
}
