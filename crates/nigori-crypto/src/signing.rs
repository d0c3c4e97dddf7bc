//! Signature capability over P-256.
//!
//! Both schemes take the private scalar from the password-derived
//! authentication key and produce an `(e, s)` pair of 32-byte values.
//! Public keys are SEC1 compressed points (33 bytes).

use ecdsa::signature::{Signer as _, Verifier as _};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::ops::Reduce;
use p256::elliptic_curve::rand_core::OsRng;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::elliptic_curve::{Field, PrimeField};
use p256::{FieldBytes, ProjectivePoint, PublicKey, Scalar, U256};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;
use crate::keys::SigningSeed;

/// Length of each half of a signature pair.
pub const SIGNATURE_HALF_LENGTH: usize = 32;

/// A signature as the two values the server expects, `e` and `s`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePair {
    pub e: Vec<u8>,
    pub s: Vec<u8>,
}

/// Signature primitive seeded from the authentication key.
pub trait Signer {
    /// Public verification key for `seed`, as sent on registration.
    fn public_key(&self, seed: &SigningSeed) -> Result<Vec<u8>, CryptoError>;

    /// Sign `message` with the private key derived from `seed`.
    fn sign(&self, seed: &SigningSeed, message: &[u8]) -> Result<SignaturePair, CryptoError>;

    /// Verify a signature. Never errors: malformed input is `false`.
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &SignaturePair) -> bool;
}

fn scalar_from_seed(seed: &SigningSeed) -> Result<Scalar, CryptoError> {
    let bytes = FieldBytes::from(*seed.as_bytes());
    let x = <Scalar as Reduce<U256>>::reduce_bytes(&bytes);
    if bool::from(x.is_zero()) {
        return Err(CryptoError::InvalidSeed);
    }
    Ok(x)
}

fn scalar_from_slice(bytes: &[u8]) -> Option<Scalar> {
    if bytes.len() != SIGNATURE_HALF_LENGTH {
        return None;
    }
    Option::from(Scalar::from_repr(FieldBytes::clone_from_slice(bytes)))
}

fn compressed(point: &ProjectivePoint) -> Vec<u8> {
    point.to_affine().to_encoded_point(true).as_bytes().to_vec()
}

/// Schnorr signatures over P-256 with SHA-256.
///
/// `e = H(R || P || m) mod n`, `s = k + e*x mod n`. Verification recomputes
/// `R = s*G - e*P` and checks the challenge.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchnorrSigner;

impl SchnorrSigner {
    fn challenge(r: &[u8], public_key: &[u8], message: &[u8]) -> Scalar {
        let digest = Sha256::new()
            .chain_update(r)
            .chain_update(public_key)
            .chain_update(message)
            .finalize();
        <Scalar as Reduce<U256>>::reduce_bytes(&digest)
    }
}

impl Signer for SchnorrSigner {
    fn public_key(&self, seed: &SigningSeed) -> Result<Vec<u8>, CryptoError> {
        let x = scalar_from_seed(seed)?;
        Ok(compressed(&(ProjectivePoint::GENERATOR * x)))
    }

    fn sign(&self, seed: &SigningSeed, message: &[u8]) -> Result<SignaturePair, CryptoError> {
        let x = scalar_from_seed(seed)?;
        let public_key = compressed(&(ProjectivePoint::GENERATOR * x));

        let k = Scalar::random(&mut OsRng);
        if bool::from(k.is_zero()) {
            return Err(CryptoError::SigningFailed("zero nonce".into()));
        }
        let r = compressed(&(ProjectivePoint::GENERATOR * k));
        let e = Self::challenge(&r, &public_key, message);
        let s = k + e * x;

        Ok(SignaturePair {
            e: e.to_bytes().to_vec(),
            s: s.to_bytes().to_vec(),
        })
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &SignaturePair) -> bool {
        let Ok(point) = PublicKey::from_sec1_bytes(public_key) else {
            return false;
        };
        let (Some(e), Some(s)) = (
            scalar_from_slice(&signature.e),
            scalar_from_slice(&signature.s),
        ) else {
            return false;
        };

        let r = ProjectivePoint::GENERATOR * s - point.to_projective() * e;
        if r == ProjectivePoint::IDENTITY {
            return false;
        }
        let normalized = compressed(&point.to_projective());
        Self::challenge(&compressed(&r), &normalized, message) == e
    }
}

/// ECDSA P-256 + SHA-256. `e` carries `r`, `s` carries `s`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcdsaSigner;

impl EcdsaSigner {
    fn signing_key(seed: &SigningSeed) -> Result<SigningKey, CryptoError> {
        let x = scalar_from_seed(seed)?;
        SigningKey::from_bytes(&x.to_bytes()).map_err(|_| CryptoError::InvalidSeed)
    }
}

impl Signer for EcdsaSigner {
    fn public_key(&self, seed: &SigningSeed) -> Result<Vec<u8>, CryptoError> {
        let key = Self::signing_key(seed)?;
        Ok(key.verifying_key().to_encoded_point(true).as_bytes().to_vec())
    }

    fn sign(&self, seed: &SigningSeed, message: &[u8]) -> Result<SignaturePair, CryptoError> {
        let key = Self::signing_key(seed)?;
        let signature: Signature = key
            .try_sign(message)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        let (r, s) = signature.split_bytes();
        Ok(SignaturePair {
            e: r.to_vec(),
            s: s.to_vec(),
        })
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &SignaturePair) -> bool {
        (|| -> Result<bool, CryptoError> {
            let verifying_key = VerifyingKey::from_sec1_bytes(public_key)
                .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
            let mut raw = Vec::with_capacity(2 * SIGNATURE_HALF_LENGTH);
            raw.extend_from_slice(&signature.e);
            raw.extend_from_slice(&signature.s);
            let signature = Signature::from_slice(&raw)
                .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
            Ok(verifying_key.verify(message, &signature).is_ok())
        })()
        .unwrap_or(false)
    }
}
