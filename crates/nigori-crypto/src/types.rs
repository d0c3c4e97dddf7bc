/// Length of every derived secret (SHA-256 output).
pub const DERIVED_KEY_LENGTH: usize = 32;

/// Length of the HMAC-SHA256 tag appended to every blob.
///
/// The full 32-byte HMAC is truncated to its leftmost 16 bytes on both
/// encrypt and verify.
pub const TAG_LENGTH: usize = 16;

/// Block ciphers supported for value and name encryption, all in CBC mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockCipher {
    /// AES-256: 16-byte blocks, 32-byte key.
    #[default]
    Aes256,
    /// Single DES: 8-byte blocks, 8-byte key (first 8 bytes of the cipher key).
    /// Kept for interoperability with legacy deployments only.
    Des,
}

impl BlockCipher {
    /// Cipher block size in bytes.
    pub const fn block_size(self) -> usize {
        match self {
            Self::Aes256 => 16,
            Self::Des => 8,
        }
    }

    /// Number of cipher key bytes taken from the derived cipher key.
    pub const fn key_size(self) -> usize {
        match self {
            Self::Aes256 => 32,
            Self::Des => 8,
        }
    }

    /// IV length in bytes. CBC uses one block.
    pub const fn iv_length(self) -> usize {
        self.block_size()
    }

    /// Shortest decodable blob: IV, one ciphertext block, and the tag.
    pub const fn min_blob_length(self) -> usize {
        self.iv_length() + self.block_size() + TAG_LENGTH
    }

    /// Lowercase identifier used in configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aes256 => "aes256",
            Self::Des => "des",
        }
    }
}

impl std::str::FromStr for BlockCipher {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aes256" | "aes" => Ok(Self::Aes256),
            "des" => Ok(Self::Des),
            other => Err(format!("unknown cipher: {other}")),
        }
    }
}

impl std::fmt::Display for BlockCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
