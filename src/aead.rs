//! AES-256-GCM sealing and opening
//!
//! Sealed payloads are `ciphertext || tag` exactly as produced by the
//! `aes-gcm` crate; no associated data is used.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use zeroize::Zeroizing;

use crate::error::{ErrorCategory, ErrorKind, FilecryptError, Result};
use crate::kdf::DerivedKey;
use crate::{RandomValue, TAG_LEN};

fn cipher(key: &DerivedKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()))
}

/// Seal `plaintext`, returning ciphertext followed by the 16-byte tag.
pub fn seal(key: &DerivedKey, nonce: &RandomValue, plaintext: &[u8]) -> Result<Vec<u8>> {
    cipher(key)
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| {
            FilecryptError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::CipherFailure,
                "AES-GCM encryption failed",
            )
        })
}

/// Open a sealed payload, verifying its tag before releasing any plaintext.
pub fn open(
    key: &DerivedKey,
    nonce: &RandomValue,
    sealed: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if sealed.len() < TAG_LEN {
        return Err(FilecryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::MalformedInput,
            format!(
                "sealed payload is {} bytes, shorter than the {}-byte authentication tag",
                sealed.len(),
                TAG_LEN
            ),
        ));
    }

    let plaintext = cipher(key)
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| {
            FilecryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::AuthenticationFailed,
                "corrupt input, tampered-with data, or bad passphrase",
            )
        })?;

    Ok(Zeroizing::new(plaintext))
}
