//! Pre-shared keys

use std::fmt;

use super::error::CodecError;

/// AES key size, selected by the length of the shared key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AesVariant {
    /// 16-byte key
    Aes128,
    /// 24-byte key
    Aes192,
    /// 32-byte key
    Aes256,
}

impl AesVariant {
    /// Key length in bytes
    pub fn key_len(&self) -> usize {
        match self {
            AesVariant::Aes128 => 16,
            AesVariant::Aes192 => 24,
            AesVariant::Aes256 => 32,
        }
    }

    fn from_key_len(len: usize) -> Option<Self> {
        match len {
            16 => Some(AesVariant::Aes128),
            24 => Some(AesVariant::Aes192),
            32 => Some(AesVariant::Aes256),
            _ => None,
        }
    }
}

/// Symmetric key shared out of band between publishers and subscribers
#[derive(Clone, PartialEq, Eq)]
pub struct SharedKey {
    bytes: Vec<u8>,
    variant: AesVariant,
}

impl SharedKey {
    /// Create a key from raw bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, CodecError> {
        let bytes = bytes.into();
        let variant =
            AesVariant::from_key_len(bytes.len()).ok_or(CodecError::InvalidKeyLength(bytes.len()))?;

        Ok(Self { bytes, variant })
    }

    /// Create a key from the UTF-8 bytes of a passphrase-like string
    ///
    /// The string is used as-is, not hashed, so it must itself be 16, 24 or 32
    /// bytes long.
    pub fn from_str_bytes(key: &str) -> Result<Self, CodecError> {
        Self::from_bytes(key.as_bytes().to_vec())
    }

    /// Generate a random key
    pub fn generate(variant: AesVariant) -> Self {
        use rand::RngCore;

        let mut bytes = vec![0u8; variant.key_len()];
        rand::rng().fill_bytes(&mut bytes);

        Self { bytes, variant }
    }

    /// AES variant selected by this key
    pub fn variant(&self) -> AesVariant {
        self.variant
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedKey")
            .field("variant", &self.variant)
            .field("bytes", &"<redacted>")
            .finish()
    }
}
