//! Passphrase to key derivation (PBKDF2-HMAC-SHA1)

use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use zeroize::Zeroizing;

use crate::{KEY_LEN, RandomValue};

/// PBKDF2 iteration count. Changing it breaks every existing file.
pub const PBKDF2_ROUNDS: u32 = 4096;

/// A 256-bit AES key, wiped from memory on drop.
pub type DerivedKey = Zeroizing<[u8; KEY_LEN]>;

/// Derive a 32-byte key from a passphrase, salted with the file's random value.
///
/// Any passphrase is accepted, including the empty one.
pub fn derive_key(passphrase: &[u8], random: &RandomValue) -> DerivedKey {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha1>(passphrase, random, PBKDF2_ROUNDS, key.as_mut_slice());
    key
}
