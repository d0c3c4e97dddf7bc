use serde::{Deserialize, Serialize};

/// Resource type for arbitrary named values (and stored shares).
pub const TYPE_NAMED_VALUE: u32 = 1;

/// Resource type of the split topology record.
pub const TYPE_SPLIT_SERVERS: u32 = 2;

/// Reserved for an alternate signature-key type. Not used by any flow here.
pub const TYPE_SIGNATURE_KEY: u32 = 3;

/// Name of the split topology record.
pub const SPLIT_SERVERS_NAME: &[u8] = b"split servers";

/// One record as returned by `/list-resource`, value still encrypted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRecord {
    pub version: i64,
    /// Seconds since the Unix epoch.
    #[serde(rename = "creationTime")]
    pub creation_time: f64,
    /// Base64url of IV || ciphertext || tag.
    pub value: String,
}

/// A decrypted stored record.
///
/// Version and creation time are assigned by the server; several records
/// may exist under one name and the last one is the current value.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub version: i64,
    pub creation_time: f64,
    pub value: Vec<u8>,
}
