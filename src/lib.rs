//! filecrypt - passphrase-based, in-place file encryption
//!
//! A file is sealed with AES-256-GCM under a key derived from the passphrase
//! with PBKDF2-HMAC-SHA1. The on-disk layout is:
//!
//! ```text
//! [ ciphertext || 16-byte GCM tag ][ 12-byte random value ]
//! ```
//!
//! The trailing random value is both the GCM nonce and the PBKDF2 salt.

#![forbid(unsafe_code)]

pub mod aead;
pub mod codec;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod passphrase;

pub use error::{ErrorCategory, ErrorKind, FilecryptError, Result};
pub use file_ops::{decrypt_file, encrypt_file};

/// Length of the per-encryption random value (GCM nonce and PBKDF2 salt).
pub const RANDOM_LEN: usize = 12;

/// Length of a derived AES-256 key.
pub const KEY_LEN: usize = 32;

/// Length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// The 12-byte value stored at the end of every encrypted file.
pub type RandomValue = [u8; RANDOM_LEN];
