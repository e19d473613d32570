//! filecrypt CLI - passphrase-based in-place file encryption
//!
//! Command-line interface for encrypting and decrypting a file in place
//! using AES-256-GCM with PBKDF2-HMAC-SHA1 key derivation.

use clap::{Parser, Subcommand};
use std::error::Error as StdError;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use filecrypt::error::{ErrorCategory, ErrorKind, FilecryptError, Result};
use filecrypt::passphrase::{
    ConfirmingPassphraseReader, PassphraseReader, ReaderPassphraseReader,
    TerminalPassphraseReader,
};

#[derive(Parser)]
#[command(name = "filecrypt")]
#[command(version)]
#[command(about = "Passphrase-based in-place file encryption.", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal (no confirmation)
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Log each step to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file in place
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Decrypt a file in place
    #[command(alias = "d")]
    Decrypt {
        /// Path to the file whose contents is to be decrypted
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            use clap::error::ErrorKind as ClapErrorKind;
            // Help and version requests succeed; everything else is a usage error.
            let code = match e.kind() {
                ClapErrorKind::DisplayHelp
                | ClapErrorKind::DisplayVersion
                | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
                _ => 1,
            };
            let _ = e.print();
            process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        tracing::debug!(category = ?e.category, kind = ?e.kind, "command failed");
        eprintln!("Error: {}", error_chain(&e));
        if e.is_authentication_failure() {
            eprintln!("The passphrase is wrong, or the file is corrupted. The file was not modified.");
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Encrypt { file } => {
            ensure_exists(&file)?;
            let mut reader: Box<dyn PassphraseReader> = if cli.passphrase_stdin {
                Box::new(ReaderPassphraseReader::new(Box::new(io::stdin())))
            } else {
                Box::new(ConfirmingPassphraseReader::terminal())
            };
            let passphrase = reader.read_passphrase()?;

            println!("Encrypting file...");
            filecrypt::encrypt_file(&file, &passphrase)?;
            println!("File encrypted successfully");
        }
        Commands::Decrypt { file } => {
            ensure_exists(&file)?;
            let mut reader: Box<dyn PassphraseReader> = if cli.passphrase_stdin {
                Box::new(ReaderPassphraseReader::new(Box::new(io::stdin())))
            } else {
                Box::new(TerminalPassphraseReader::default())
            };
            let passphrase = reader.read_passphrase()?;

            println!("Decrypting file...");
            filecrypt::decrypt_file(&file, &passphrase)?;
            println!("File decrypted successfully");
        }
    }
    Ok(())
}

/// Refuse to prompt for a passphrase when there is nothing to operate on.
fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(FilecryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::FileNotFound,
            format!("file not found: {}", path.display()),
        ))
    }
}

/// Renders an error and all of its sources as `outer: inner: root`.
fn error_chain(err: &FilecryptError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// Logs go to stderr so they never mix with command output.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}
