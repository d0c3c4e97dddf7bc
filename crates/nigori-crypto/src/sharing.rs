//! Threshold secret sharing.
//!
//! A secret is split into `n` shares such that any `k` of them recombine to
//! the secret and fewer reveal nothing about it.

use sharks::Sharks;

use crate::error::CryptoError;

/// One share: its index in `1..=n` and the share value (big-endian bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    pub index: u8,
    pub value: Vec<u8>,
}

/// Threshold sharing primitive.
pub trait ThresholdSharer {
    /// Split `secret` into `n` shares, any `k` of which reconstruct it.
    fn split(&self, secret: &[u8], k: u8, n: u8) -> Result<Vec<Share>, CryptoError>;

    /// Reconstruct a secret from at least `k` shares with distinct indices.
    fn recover(&self, k: u8, shares: &[Share]) -> Result<Vec<u8>, CryptoError>;
}

/// Shamir sharing over GF(256), byte-wise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShamirSharer;

fn check_threshold(k: u8, n: u8) -> Result<(), CryptoError> {
    if k == 0 || k > n {
        return Err(CryptoError::Sharing(format!(
            "threshold must satisfy 1 <= k <= n, got k={k} n={n}"
        )));
    }
    Ok(())
}

impl ThresholdSharer for ShamirSharer {
    fn split(&self, secret: &[u8], k: u8, n: u8) -> Result<Vec<Share>, CryptoError> {
        check_threshold(k, n)?;
        if secret.is_empty() {
            return Err(CryptoError::Sharing("cannot split an empty secret".into()));
        }

        let shares: Vec<Share> = Sharks(k)
            .dealer(secret)
            .take(n as usize)
            .map(|share| {
                let bytes: Vec<u8> = (&share).into();
                Share {
                    index: bytes[0],
                    value: bytes[1..].to_vec(),
                }
            })
            .collect();

        if shares.len() != n as usize {
            return Err(CryptoError::Sharing(format!(
                "expected {n} shares, got {}",
                shares.len()
            )));
        }
        Ok(shares)
    }

    fn recover(&self, k: u8, shares: &[Share]) -> Result<Vec<u8>, CryptoError> {
        if k == 0 {
            return Err(CryptoError::Sharing("threshold must be at least 1".into()));
        }

        let mut seen = std::collections::BTreeSet::new();
        let mut shark_shares = Vec::with_capacity(shares.len());
        for share in shares {
            if share.index == 0 {
                return Err(CryptoError::Sharing("share index 0 is invalid".into()));
            }
            if !seen.insert(share.index) {
                continue;
            }
            let mut bytes = Vec::with_capacity(1 + share.value.len());
            bytes.push(share.index);
            bytes.extend_from_slice(&share.value);
            let parsed = sharks::Share::try_from(bytes.as_slice())
                .map_err(|e| CryptoError::Sharing(format!("share {}: {e}", share.index)))?;
            shark_shares.push(parsed);
        }

        if shark_shares.len() < k as usize {
            return Err(CryptoError::Sharing(format!(
                "need at least {k} distinct shares, got {}",
                shark_shares.len()
            )));
        }

        Sharks(k)
            .recover(&shark_shares)
            .map_err(|e| CryptoError::Sharing(format!("share recovery failed: {e}")))
    }
}
