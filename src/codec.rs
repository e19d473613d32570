//! In-memory encryption/decryption of whole file contents
//!
//! The encrypted format is:
//! - sealed payload: variable length (AES-256-GCM ciphertext + 16-byte tag)
//! - random value: 12 bytes (GCM nonce, also the PBKDF2 salt)
//!
//! There is no header, magic marker or length field; the random value is
//! always the last 12 bytes.

use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::error::{ErrorCategory, ErrorKind, FilecryptError, Result};
use crate::{RANDOM_LEN, RandomValue, aead, kdf};

/// Shortest input `decrypt` will look at. Real output is never shorter than
/// `RANDOM_LEN + TAG_LEN`; the tag length is checked by the cipher.
pub const MIN_CIPHER_FILE_LEN: usize = RANDOM_LEN;

/// Encrypt plaintext with a passphrase using a fresh random value
///
/// Returns `sealed payload || random value`.
pub fn encrypt(passphrase: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut random = [0u8; RANDOM_LEN];
    OsRng.fill_bytes(&mut random);

    encrypt_deterministic(passphrase, plaintext, &random)
}

/// Encrypt plaintext with a passphrase using a provided random value
///
/// This function is ONLY for generating reproducible test vectors.
/// Reusing a random value across encryptions breaks GCM; production code
/// must go through `encrypt()`.
pub fn encrypt_deterministic(
    passphrase: &[u8],
    plaintext: &[u8],
    random: &RandomValue,
) -> Result<Vec<u8>> {
    let key = kdf::derive_key(passphrase, random);
    let sealed = aead::seal(&key, random, plaintext)?;

    let mut output = Vec::with_capacity(sealed.len() + RANDOM_LEN);
    output.extend_from_slice(&sealed);
    output.extend_from_slice(random);

    Ok(output)
}

/// Split encrypted content into its sealed payload and trailing random value.
pub fn split(cipher_file: &[u8]) -> Result<(&[u8], RandomValue)> {
    if cipher_file.len() < MIN_CIPHER_FILE_LEN {
        return Err(FilecryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::MalformedInput,
            format!(
                "input is {} bytes, too short to hold the {}-byte random value; likely truncated",
                cipher_file.len(),
                RANDOM_LEN
            ),
        ));
    }

    let (sealed, tail) = cipher_file.split_at(cipher_file.len() - RANDOM_LEN);
    let mut random = [0u8; RANDOM_LEN];
    random.copy_from_slice(tail);
    Ok((sealed, random))
}

/// Decrypt content produced by `encrypt` with a passphrase
pub fn decrypt(passphrase: &[u8], cipher_file: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let (sealed, random) = split(cipher_file)?;
    let key = kdf::derive_key(passphrase, &random);
    aead::open(&key, &random, sealed)
}
