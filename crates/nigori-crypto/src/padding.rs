//! PKCS#7 block padding.
//!
//! Format: `[data][n bytes of value n]`, `1 <= n <= block_size`.
//! A full block of padding is appended when the data is already aligned.

use crate::error::CryptoError;

/// Pad data to a multiple of `block_size`.
pub fn pad(data: &[u8], block_size: usize) -> Vec<u8> {
    let pad_len = block_size - data.len() % block_size;
    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    padded.resize(data.len() + pad_len, pad_len as u8);
    padded
}

/// Strip padding added by [`pad`].
///
/// Fails with [`CryptoError::Padding`] when the declared pad length is out
/// of range or any padding byte differs from it.
pub fn unpad(data: &[u8], block_size: usize) -> Result<Vec<u8>, CryptoError> {
    let last = *data
        .last()
        .ok_or_else(|| CryptoError::Padding("empty plaintext".into()))?;
    let pad_len = last as usize;

    if pad_len == 0 || pad_len > block_size || pad_len > data.len() {
        return Err(CryptoError::Padding(format!(
            "invalid pad length {pad_len} for block size {block_size}"
        )));
    }

    let (body, padding) = data.split_at(data.len() - pad_len);
    if padding.iter().any(|&b| b != last) {
        return Err(CryptoError::Padding("inconsistent padding bytes".into()));
    }
    Ok(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_unpad_round_trip() {
        let data = b"hello world";
        let padded = pad(data, 16);
        assert_eq!(unpad(&padded, 16).unwrap(), data);
    }

    #[test]
    fn pads_to_block_multiple() {
        let padded = pad(&[0u8; 5], 16);
        assert_eq!(padded.len(), 16);
        assert!(padded[5..].iter().all(|&b| b == 11));
    }

    #[test]
    fn aligned_input_gets_full_block() {
        let padded = pad(&[0xAA; 16], 16);
        assert_eq!(padded.len(), 32);
        assert!(padded[16..].iter().all(|&b| b == 16));
    }

    #[test]
    fn empty_data() {
        let padded = pad(b"", 8);
        assert_eq!(padded, vec![8u8; 8]);
        assert!(unpad(&padded, 8).unwrap().is_empty());
    }

    #[test]
    fn rejects_zero_pad_byte() {
        let mut bad = pad(b"abc", 16);
        *bad.last_mut().unwrap() = 0;
        assert!(matches!(unpad(&bad, 16), Err(CryptoError::Padding(_))));
    }

    #[test]
    fn rejects_pad_longer_than_block() {
        let mut bad = vec![0u8; 32];
        bad[31] = 17;
        assert!(matches!(unpad(&bad, 16), Err(CryptoError::Padding(_))));
    }

    #[test]
    fn rejects_inconsistent_padding() {
        let mut bad = pad(b"abc", 16);
        bad[14] ^= 0x01;
        assert!(matches!(unpad(&bad, 16), Err(CryptoError::Padding(_))));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(unpad(&[], 16).is_err());
    }
}
