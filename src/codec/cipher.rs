//! AES-CBC sealing
//!
//! PKCS7 padding is applied with a block width equal to the key length
//! rounded up to whole AES blocks (16 bytes for AES-128, 32 for AES-192 and
//! AES-256). Existing subscribers pad to the key length, so this keeps sealed
//! payloads readable on both sides. Opening accepts any pad length up to that
//! width.

use aes::{Aes128, Aes192, Aes256};
use bytes::Bytes;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};

use super::error::CodecError;
use super::key::{AesVariant, SharedKey};

/// Length of the random IV prepended to every sealed payload
pub const IV_LEN: usize = 16;

/// AES block size
const BLOCK_LEN: usize = 16;

/// Seals and opens raw payloads with a shared key
#[derive(Debug, Clone)]
pub struct TransportCodec {
    key: SharedKey,
}

impl TransportCodec {
    /// Create a codec for a shared key
    pub fn new(key: SharedKey) -> Self {
        Self { key }
    }

    /// The shared key in use
    pub fn key(&self) -> &SharedKey {
        &self.key
    }

    fn padding_width(&self) -> usize {
        self.key.as_bytes().len().div_ceil(BLOCK_LEN) * BLOCK_LEN
    }

    /// Encrypt a payload under a fresh random IV
    ///
    /// Returns `IV || ciphertext`.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Bytes, CodecError> {
        use rand::RngCore;

        let mut iv = [0u8; IV_LEN];
        rand::rng().fill_bytes(&mut iv);

        self.seal_with_iv(plaintext, &iv)
    }

    fn seal_with_iv(&self, plaintext: &[u8], iv: &[u8; IV_LEN]) -> Result<Bytes, CodecError> {
        let padded = pad(plaintext, self.padding_width());

        let ciphertext = match self.key.variant() {
            AesVariant::Aes128 => cbc_encrypt::<Aes128>(self.key.as_bytes(), iv, &padded)?,
            AesVariant::Aes192 => cbc_encrypt::<Aes192>(self.key.as_bytes(), iv, &padded)?,
            AesVariant::Aes256 => cbc_encrypt::<Aes256>(self.key.as_bytes(), iv, &padded)?,
        };

        let mut sealed = Vec::with_capacity(IV_LEN + ciphertext.len());
        sealed.extend_from_slice(iv);
        sealed.extend_from_slice(&ciphertext);
        Ok(Bytes::from(sealed))
    }

    /// Decrypt a payload produced by [`seal`](Self::seal)
    pub fn open(&self, sealed: &[u8]) -> Result<Bytes, CodecError> {
        if sealed.len() < IV_LEN + BLOCK_LEN {
            return Err(CodecError::TooShort(sealed.len()));
        }

        let (iv, ciphertext) = sealed.split_at(IV_LEN);
        if ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CodecError::Misaligned(ciphertext.len()));
        }

        let padded = match self.key.variant() {
            AesVariant::Aes128 => cbc_decrypt::<Aes128>(self.key.as_bytes(), iv, ciphertext)?,
            AesVariant::Aes192 => cbc_decrypt::<Aes192>(self.key.as_bytes(), iv, ciphertext)?,
            AesVariant::Aes256 => cbc_decrypt::<Aes256>(self.key.as_bytes(), iv, ciphertext)?,
        };

        unpad(padded, self.padding_width()).map(Bytes::from)
    }
}

fn cbc_encrypt<C>(key: &[u8], iv: &[u8], padded: &[u8]) -> Result<Vec<u8>, CodecError>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CodecError::InvalidKeyLength(key.len()))?;

    Ok(encryptor.encrypt_padded_vec_mut::<NoPadding>(padded))
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CodecError>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CodecError::InvalidKeyLength(key.len()))?;

    decryptor
        .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
        .map_err(|_| CodecError::Misaligned(ciphertext.len()))
}

/// PKCS7-pad to a multiple of `width`
fn pad(data: &[u8], width: usize) -> Vec<u8> {
    let n = width - data.len() % width;

    let mut padded = Vec::with_capacity(data.len() + n);
    padded.extend_from_slice(data);
    padded.resize(data.len() + n, n as u8);
    padded
}

/// Strip PKCS7 padding of at most `width` bytes
fn unpad(mut data: Vec<u8>, width: usize) -> Result<Vec<u8>, CodecError> {
    let n = *data.last().ok_or(CodecError::BadPadding)? as usize;
    if n == 0 || n > width || n > data.len() {
        return Err(CodecError::BadPadding);
    }

    let body_len = data.len() - n;
    if data[body_len..].iter().any(|&b| b as usize != n) {
        return Err(CodecError::BadPadding);
    }

    data.truncate(body_len);
    Ok(data)
}
