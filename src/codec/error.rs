//! Codec error types

/// Error type for sealing and opening payloads
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Shared key is not 16, 24 or 32 bytes
    #[error("Invalid key length: {0} bytes (expected 16, 24 or 32)")]
    InvalidKeyLength(usize),

    /// Sealed payload is too short to hold an IV and one block
    #[error("Sealed payload too short: {0} bytes")]
    TooShort(usize),

    /// Ciphertext is not a whole number of AES blocks
    #[error("Ciphertext length {0} is not a multiple of the block size")]
    Misaligned(usize),

    /// Padding did not validate after decryption (wrong key or corrupted data)
    #[error("Invalid padding")]
    BadPadding,
}
