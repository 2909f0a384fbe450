//! Transport encryption for raw payloads
//!
//! Seals v3 payloads with AES-CBC under a pre-shared key before they are
//! published, and opens them on the subscriber side. The registry and the
//! server only ever see the sealed bytes.
//!
//! Sealed layout:
//!
//! ```text
//! +----------------+---------------------------------------+
//! | IV (16 bytes)  | AES-CBC(PKCS7(plaintext))             |
//! +----------------+---------------------------------------+
//! ```

pub mod cipher;
pub mod error;
pub mod key;

pub use cipher::{TransportCodec, IV_LEN};
pub use error::CodecError;
pub use key::{AesVariant, SharedKey};
