//! Length-prefixed field framing.
//!
//! Format: repeated `[4 bytes: u32 BE length][bytes]`. Used for obscured
//! resource names, stored shares, and the split topology record.

use crate::error::ClientError;

const LENGTH_PREFIX_SIZE: usize = 4;

/// Concatenate fields, each prefixed with its length.
pub fn encode_fields<F: AsRef<[u8]>>(fields: &[F]) -> Vec<u8> {
    let total: usize = fields
        .iter()
        .map(|f| LENGTH_PREFIX_SIZE + f.as_ref().len())
        .sum();
    let mut out = Vec::with_capacity(total);
    for field in fields {
        let field = field.as_ref();
        out.extend_from_slice(&(field.len() as u32).to_be_bytes());
        out.extend_from_slice(field);
    }
    out
}

/// Split data produced by [`encode_fields`] back into its fields.
pub fn decode_fields(data: &[u8]) -> Result<Vec<Vec<u8>>, ClientError> {
    let mut fields = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        if rest.len() < LENGTH_PREFIX_SIZE {
            return Err(ClientError::Codec(format!(
                "truncated length prefix: {} bytes left",
                rest.len()
            )));
        }
        let (prefix, tail) = rest.split_at(LENGTH_PREFIX_SIZE);
        let len = decode_u32(prefix)? as usize;
        if len > tail.len() {
            return Err(ClientError::Codec(format!(
                "field claims {len} bytes, only {} available",
                tail.len()
            )));
        }
        let (field, tail) = tail.split_at(len);
        fields.push(field.to_vec());
        rest = tail;
    }
    Ok(fields)
}

/// Big-endian u32.
pub fn encode_u32(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Parse a big-endian u32 from exactly four bytes.
pub fn decode_u32(bytes: &[u8]) -> Result<u32, ClientError> {
    let array: [u8; 4] = bytes
        .try_into()
        .map_err(|_| ClientError::Codec(format!("expected 4-byte integer, got {}", bytes.len())))?;
    Ok(u32::from_be_bytes(array))
}

/// Plaintext of an obscured resource name: `[type][name]`.
pub fn resource_name(resource_type: u32, name: &[u8]) -> Vec<u8> {
    encode_fields(&[&encode_u32(resource_type)[..], name])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_length_prefixed() {
        let encoded = encode_fields(&[b"ab".as_slice(), b"".as_slice(), b"xyz".as_slice()]);
        assert_eq!(
            hex::encode(&encoded),
            "000000026162000000000000000378797a"
        );
    }

    #[test]
    fn decode_inverts_encode() {
        let fields = vec![b"2".to_vec(), b"host".to_vec(), b"8080".to_vec()];
        assert_eq!(decode_fields(&encode_fields(&fields)).unwrap(), fields);
    }

    #[test]
    fn empty_input_has_no_fields() {
        assert!(decode_fields(&[]).unwrap().is_empty());
    }

    #[test]
    fn rejects_truncated_prefix() {
        assert!(matches!(decode_fields(&[0, 0]), Err(ClientError::Codec(_))));
    }

    #[test]
    fn rejects_overlong_field() {
        let mut data = encode_fields(&[b"abcd".as_slice()]);
        data.truncate(6);
        assert!(matches!(decode_fields(&data), Err(ClientError::Codec(_))));
    }

    #[test]
    fn resource_name_prefixes_type() {
        let name = resource_name(2, b"split servers");
        let fields = decode_fields(&name).unwrap();
        assert_eq!(fields[0], vec![0, 0, 0, 2]);
        assert_eq!(fields[1], b"split servers");
    }

    #[test]
    fn decode_u32_requires_four_bytes() {
        assert_eq!(decode_u32(&[0, 0, 1, 0]).unwrap(), 256);
        assert!(decode_u32(&[1, 2, 3]).is_err());
    }
}
