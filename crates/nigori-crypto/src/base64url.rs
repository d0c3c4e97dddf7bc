use base64ct::{Base64Url, Base64UrlUnpadded, Encoding};

use crate::error::CryptoError;

/// Base64url encode bytes without padding.
pub fn base64url_encode(data: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(data)
}

/// Base64url decode a string to bytes.
///
/// Accepts both unpadded input and input with trailing `=` padding, since
/// values written by other clients may carry it.
pub fn base64url_decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    let decoded = if s.ends_with('=') {
        Base64Url::decode_vec(s)
    } else {
        Base64UrlUnpadded::decode_vec(s)
    };
    decoded.map_err(|e| CryptoError::Format(format!("base64url: {e}")))
}
