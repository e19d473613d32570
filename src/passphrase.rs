//! Passphrase reading functionality

use crate::error::{ErrorCategory, ErrorKind, FilecryptError, Result};
use std::io::{self, IsTerminal, Read, Write};
use tracing::debug;
use zeroize::Zeroizing;

/// How many times `ConfirmingPassphraseReader` asks before giving up.
pub const DEFAULT_CONFIRM_ATTEMPTS: u32 = 3;

/// Trait for reading passphrases from various sources
pub trait PassphraseReader {
    /// Read a passphrase as arbitrary bytes (not necessarily UTF-8)
    ///
    /// Returns the passphrase wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Returns a fixed passphrase (for testing)
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<Vec<u8>>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: Vec<u8>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new((*self.passphrase).clone()))
    }
}

/// Reads passphrase from any io::Read source, up to EOF
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            FilecryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("error reading passphrase: {}", e),
                e,
            )
        })?;
        Ok(data)
    }
}

/// Reads passphrase from terminal with no echo
pub struct TerminalPassphraseReader {
    prompt: String,
}

impl TerminalPassphraseReader {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl Default for TerminalPassphraseReader {
    fn default() -> Self {
        Self::new("Enter password: ")
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    /// Read passphrase from terminal.
    ///
    /// Note: Terminal input is limited to UTF-8 due to rpassword library constraints.
    /// For non-UTF-8 passphrases, use --passphrase-stdin instead.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(FilecryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read passphrase from terminal - stdin is not a terminal",
            ));
        }

        io::stderr()
            .write_all(self.prompt.as_bytes())
            .map_err(|e| {
                FilecryptError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;
        io::stderr().flush().map_err(|e| {
            FilecryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to flush prompt: {}", e),
                e,
            )
        })?;

        let passphrase = rpassword::read_password().map_err(|e| {
            FilecryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("failure reading passphrase: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(passphrase.into_bytes()))
    }
}

/// Asks for a passphrase twice and only accepts it when both entries match
///
/// Mismatches are retried in a loop, at most `max_attempts` times, after
/// which `ErrorKind::PassphraseMismatch` is returned. Errors from either
/// upstream reader end the loop immediately.
pub struct ConfirmingPassphraseReader {
    entry: Box<dyn PassphraseReader>,
    confirmation: Box<dyn PassphraseReader>,
    max_attempts: u32,
}

impl ConfirmingPassphraseReader {
    pub fn new(
        entry: Box<dyn PassphraseReader>,
        confirmation: Box<dyn PassphraseReader>,
        max_attempts: u32,
    ) -> Self {
        Self {
            entry,
            confirmation,
            max_attempts,
        }
    }

    /// Terminal prompts for a new passphrase and its confirmation.
    pub fn terminal() -> Self {
        Self::new(
            Box::new(TerminalPassphraseReader::new("Enter password: ")),
            Box::new(TerminalPassphraseReader::new("Confirm password: ")),
            DEFAULT_CONFIRM_ATTEMPTS,
        )
    }
}

impl PassphraseReader for ConfirmingPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        for attempt in 1..=self.max_attempts {
            let passphrase = self.entry.read_passphrase()?;
            let confirmation = self.confirmation.read_passphrase()?;
            if *passphrase == *confirmation {
                return Ok(passphrase);
            }

            debug!(attempt, max_attempts = self.max_attempts, "passphrase mismatch");
            eprintln!("Passwords do not match");
        }

        Err(FilecryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::PassphraseMismatch,
            format!(
                "passphrase confirmation did not match after {} attempts",
                self.max_attempts
            ),
        ))
    }
}
