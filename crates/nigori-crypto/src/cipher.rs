//! CBC encrypt-then-MAC for stored values and resource names.
//!
//! Wire format: [IV:block][CBC ciphertext:n*block][HMAC-SHA256 tag:16]
//! The tag covers the ciphertext only and is checked before any decryption.

use aes::Aes256;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use des::Des;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::base64url::{base64url_decode, base64url_encode};
use crate::error::CryptoError;
use crate::keys::PasswordKeys;
use crate::padding::{pad, unpad};
use crate::types::{BlockCipher, TAG_LENGTH};

type HmacSha256 = Hmac<Sha256>;

/// IV, ciphertext and tag of one encrypted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
    tag: [u8; TAG_LENGTH],
}

impl EncryptedBlob {
    /// Split a decoded blob into its parts.
    ///
    /// Rejects blobs shorter than IV + one block + tag, and ciphertexts that
    /// are not a whole number of blocks.
    pub fn from_bytes(bytes: &[u8], cipher: BlockCipher) -> Result<Self, CryptoError> {
        let min_length = cipher.min_blob_length();
        if bytes.len() < min_length {
            return Err(CryptoError::Format(format!(
                "value too short: {} bytes, need at least {min_length}",
                bytes.len()
            )));
        }

        let iv_len = cipher.iv_length();
        let tag_start = bytes.len() - TAG_LENGTH;
        let ciphertext = &bytes[iv_len..tag_start];
        if ciphertext.len() % cipher.block_size() != 0 {
            return Err(CryptoError::Format(format!(
                "ciphertext length {} is not a multiple of {}",
                ciphertext.len(),
                cipher.block_size()
            )));
        }

        let mut tag = [0u8; TAG_LENGTH];
        tag.copy_from_slice(&bytes[tag_start..]);
        Ok(Self {
            iv: bytes[..iv_len].to_vec(),
            ciphertext: ciphertext.to_vec(),
            tag,
        })
    }

    /// Decode the base64url transport form.
    pub fn from_base64url(s: &str, cipher: BlockCipher) -> Result<Self, CryptoError> {
        Self::from_bytes(&base64url_decode(s)?, cipher)
    }

    /// Concatenate IV || ciphertext || tag.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.iv.len() + self.ciphertext.len() + TAG_LENGTH);
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.tag);
        out
    }

    /// Base64url transport form of [`EncryptedBlob::to_bytes`].
    pub fn to_base64url(&self) -> String {
        base64url_encode(&self.to_bytes())
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn tag(&self) -> &[u8; TAG_LENGTH] {
        &self.tag
    }
}

/// Generate a random IV for the given cipher.
pub fn generate_iv(cipher: BlockCipher) -> Result<Vec<u8>, CryptoError> {
    let mut iv = vec![0u8; cipher.iv_length()];
    getrandom::getrandom(&mut iv).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(iv)
}

fn invalid_key(cipher: BlockCipher, key: &[u8]) -> CryptoError {
    CryptoError::InvalidKeyLength {
        expected: cipher.key_size(),
        got: key.len(),
    }
}

fn cbc_encrypt(
    cipher: BlockCipher,
    key: &[u8],
    iv: &[u8],
    padded: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let ciphertext = match cipher {
        BlockCipher::Aes256 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|_| invalid_key(cipher, key))?
            .encrypt_padded_vec_mut::<NoPadding>(padded),
        BlockCipher::Des => cbc::Encryptor::<Des>::new_from_slices(key, iv)
            .map_err(|_| invalid_key(cipher, key))?
            .encrypt_padded_vec_mut::<NoPadding>(padded),
    };
    Ok(ciphertext)
}

fn cbc_decrypt(
    cipher: BlockCipher,
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let plaintext = match cipher {
        BlockCipher::Aes256 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|_| invalid_key(cipher, key))?
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext),
        BlockCipher::Des => cbc::Decryptor::<Des>::new_from_slices(key, iv)
            .map_err(|_| invalid_key(cipher, key))?
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext),
    };
    plaintext.map_err(|e| CryptoError::Format(format!("CBC decrypt: {e}")))
}

fn new_mac(mac_key: &[u8]) -> Result<HmacSha256, CryptoError> {
    <HmacSha256 as Mac>::new_from_slice(mac_key).map_err(|_| CryptoError::InvalidKeyLength {
        expected: crate::types::DERIVED_KEY_LENGTH,
        got: mac_key.len(),
    })
}

fn compute_tag(mac_key: &[u8], ciphertext: &[u8]) -> Result<[u8; TAG_LENGTH], CryptoError> {
    let mut mac = new_mac(mac_key)?;
    mac.update(ciphertext);
    let full = mac.finalize().into_bytes();
    let mut tag = [0u8; TAG_LENGTH];
    tag.copy_from_slice(&full[..TAG_LENGTH]);
    Ok(tag)
}

/// Pad, CBC-encrypt under `iv`, then MAC the ciphertext.
pub fn encrypt_with_iv(
    keys: &PasswordKeys,
    plaintext: &[u8],
    iv: &[u8],
) -> Result<EncryptedBlob, CryptoError> {
    let cipher = keys.cipher();
    if iv.len() != cipher.iv_length() {
        return Err(CryptoError::Format(format!(
            "IV must be {} bytes, got {}",
            cipher.iv_length(),
            iv.len()
        )));
    }

    let padded = pad(plaintext, cipher.block_size());
    let ciphertext = cbc_encrypt(cipher, keys.cipher_key(), iv, &padded)?;
    let tag = compute_tag(keys.mac_key(), &ciphertext)?;

    Ok(EncryptedBlob {
        iv: iv.to_vec(),
        ciphertext,
        tag,
    })
}

/// Encrypt a value under a fresh random IV.
pub fn encrypt(keys: &PasswordKeys, plaintext: &[u8]) -> Result<EncryptedBlob, CryptoError> {
    let iv = generate_iv(keys.cipher())?;
    encrypt_with_iv(keys, plaintext, &iv)
}

/// Deterministic encryption under an all-zero IV.
///
/// Identical plaintext and keys always give identical output, which lets
/// the server match obscured resource names. Only ever used for names:
/// equal values would be visible as equal ciphertexts.
pub fn permute(keys: &PasswordKeys, plaintext: &[u8]) -> Result<EncryptedBlob, CryptoError> {
    let iv = vec![0u8; keys.cipher().iv_length()];
    encrypt_with_iv(keys, plaintext, &iv)
}

/// Verify and decrypt a blob.
///
/// Order of checks: length (`Format`), tag in constant time
/// (`Authentication`), then padding (`Padding`).
pub fn decrypt(keys: &PasswordKeys, blob: &EncryptedBlob) -> Result<Vec<u8>, CryptoError> {
    let cipher = keys.cipher();
    let mut mac = new_mac(keys.mac_key())?;
    mac.update(&blob.ciphertext);
    mac.verify_truncated_left(&blob.tag)
        .map_err(|_| CryptoError::Authentication)?;

    let padded = cbc_decrypt(cipher, keys.cipher_key(), &blob.iv, &blob.ciphertext)?;
    unpad(&padded, cipher.block_size())
}

/// Decrypt raw IV || ciphertext || tag bytes.
pub fn decrypt_bytes(keys: &PasswordKeys, bytes: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let blob = EncryptedBlob::from_bytes(bytes, keys.cipher())?;
    decrypt(keys, &blob)
}

/// Decrypt the base64url transport form.
pub fn decrypt_base64url(keys: &PasswordKeys, encoded: &str) -> Result<Vec<u8>, CryptoError> {
    decrypt_bytes(keys, &base64url_decode(encoded)?)
}
