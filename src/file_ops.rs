//! In-place file encryption/decryption
//!
//! Both operations read the whole file, transform it in memory, and then
//! atomically replace the file (tempfile + fsync + rename). Either the old
//! contents or the new contents exist at the path, never a partial file, and
//! a failed decryption leaves the ciphertext untouched.

use crate::codec;
use crate::error::{ErrorCategory, ErrorKind, FilecryptError, Result};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;
use zeroize::Zeroizing;

/// Encrypt the file at `path` in place with `passphrase`
///
/// The file's permission bits, owner and group are carried over to the
/// encrypted file.
pub fn encrypt_file(path: &Path, passphrase: &[u8]) -> Result<()> {
    let plaintext = Zeroizing::new(fs::read(path).map_err(|e| read_error(path, e))?);
    debug!(path = %path.display(), bytes = plaintext.len(), "read plaintext");

    let ciphertext =
        codec::encrypt(passphrase, &plaintext).map_err(|e| e.with_context("encryption failed"))?;
    replace_file(path, &ciphertext)
        .map_err(|e| e.with_context(format!("failed to write to {}", path.display())))?;
    debug!(path = %path.display(), bytes = ciphertext.len(), "wrote ciphertext");

    Ok(())
}

/// Decrypt the file at `path` in place with `passphrase`
///
/// Fails with `ErrorKind::AuthenticationFailed` on a wrong passphrase or
/// tampered file, and with `ErrorKind::MalformedInput` if the file is too
/// short to be filecrypt output. In both cases the file is left as it was.
pub fn decrypt_file(path: &Path, passphrase: &[u8]) -> Result<()> {
    let ciphertext = fs::read(path).map_err(|e| read_error(path, e))?;
    debug!(path = %path.display(), bytes = ciphertext.len(), "read ciphertext");

    let plaintext =
        codec::decrypt(passphrase, &ciphertext).map_err(|e| e.with_context("failed to decrypt"))?;
    replace_file(path, &plaintext)
        .map_err(|e| e.with_context(format!("failed to write to {}", path.display())))?;
    debug!(path = %path.display(), bytes = plaintext.len(), "wrote plaintext");

    Ok(())
}

/// Atomically replace the file at `path` with `contents`.
///
/// Symlinks are resolved first so that the link's target is replaced rather
/// than the link itself. Files with more than one hard link are refused: the
/// rename would only swap out one name and leave the others on the old inode.
fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    let target = fs::canonicalize(path).map_err(|e| {
        FilecryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to resolve {}", path.display()),
            e,
        )
    })?;
    let metadata = fs::metadata(&target).map_err(|e| {
        FilecryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to get metadata of {}", target.display()),
            e,
        )
    })?;
    #[cfg(unix)]
    ensure_single_link(&target, &metadata)?;
    let dir = target.parent().ok_or_else(|| {
        FilecryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("{} has no parent directory", target.display()),
        )
    })?;

    let mut temp_file = tempfile::Builder::new()
        .prefix(".filecrypt-")
        .tempfile_in(dir)
        .map_err(|e| {
            FilecryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to create tempfile",
                e,
            )
        })?;
    debug!(tempfile = %temp_file.path().display(), "staging replacement");

    temp_file.write_all(contents).map_err(|e| {
        FilecryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to write to tempfile",
            e,
        )
    })?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file.flush().map_err(|e| {
        FilecryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to flush tempfile",
            e,
        )
    })?;
    temp_file.as_file().sync_all().map_err(|e| {
        FilecryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;
    // Ownership first: chown may clear setuid/setgid bits.
    #[cfg(unix)]
    preserve_owner(temp_file.as_file(), &target, &metadata)?;
    temp_file
        .as_file()
        .set_permissions(metadata.permissions())
        .map_err(|e| {
            FilecryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to set tempfile permissions",
                e,
            )
        })?;

    temp_file.persist(&target).map_err(|e| {
        FilecryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", target.display()),
            e,
        )
    })?;
    Ok(())
}

#[cfg(unix)]
fn ensure_single_link(target: &Path, metadata: &fs::Metadata) -> Result<()> {
    use std::os::unix::fs::MetadataExt;

    let links = metadata.nlink();
    if links > 1 {
        return Err(FilecryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::Io,
            format!(
                "{} has {} hard links; replacing it would leave the other links unchanged",
                target.display(),
                links
            ),
        ));
    }
    Ok(())
}

/// Give the staging file the target's owner and group.
///
/// Fails instead of silently handing the file to the invoking user when the
/// ownership cannot be carried over.
#[cfg(unix)]
fn preserve_owner(staged: &fs::File, target: &Path, metadata: &fs::Metadata) -> Result<()> {
    use std::os::unix::fs::{MetadataExt, fchown};

    let staged_metadata = staged.metadata().map_err(|e| {
        FilecryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to get tempfile metadata",
            e,
        )
    })?;
    if staged_metadata.uid() == metadata.uid() && staged_metadata.gid() == metadata.gid() {
        return Ok(());
    }

    fchown(staged, Some(metadata.uid()), Some(metadata.gid())).map_err(|e| {
        FilecryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!(
                "cannot preserve owner {}:{} of {}",
                metadata.uid(),
                metadata.gid(),
                target.display()
            ),
            e,
        )
    })
}

fn read_error(path: &Path, err: io::Error) -> FilecryptError {
    if err.kind() == io::ErrorKind::NotFound {
        FilecryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::FileNotFound,
            format!("{} does not exist", path.display()),
            err,
        )
    } else {
        FilecryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to read from {}", path.display()),
            err,
        )
    }
}
