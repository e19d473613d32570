//! CLI integration tests
//!
//! Tests the command-line interface end-to-end.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn filecrypt_bin() -> &'static str {
    env!("CARGO_BIN_EXE_filecrypt")
}

/// Run filecrypt with passphrase from stdin
fn run_filecrypt_with_passphrase(args: &[&str], passphrase: &[u8]) -> Output {
    let mut child = Command::new(filecrypt_bin())
        .arg("--passphrase-stdin")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn filecrypt");

    {
        let mut stdin = child.stdin.take().expect("failed to open stdin");
        // Ignore BrokenPipe errors - the command may exit before reading stdin
        // if it encounters an error (e.g., file not found)
        let _ = stdin.write_all(passphrase);
    }

    child.wait_with_output().expect("failed to wait for filecrypt")
}

fn run_filecrypt(args: &[&str]) -> Output {
    Command::new(filecrypt_bin())
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("failed to run filecrypt")
}

/// Get path to testdata directory
fn testdata_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("testdata");
    path.push(filename);
    path
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{} failed: {}",
        what,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Decrypt known ciphertext.
#[test]
fn test_decrypt_known_ciphertext() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hello.txt.enc");
    fs::copy(testdata_path("hello.txt.enc"), &path).unwrap();

    let result = run_filecrypt_with_passphrase(&["decrypt", path_arg(&path)], b"test");
    assert_success(&result, "decrypt");
    assert!(String::from_utf8_lossy(&result.stdout).contains("File decrypted successfully"));

    let decrypted = fs::read(&path).unwrap();
    let expected = fs::read(testdata_path("hello.txt")).unwrap();
    assert_eq!(decrypted, expected);
}

#[test]
fn test_encrypt_decrypt_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hello.txt");
    fs::copy(testdata_path("hello.txt"), &path).unwrap();
    let original = fs::read(&path).unwrap();

    let result = run_filecrypt_with_passphrase(&["encrypt", path_arg(&path)], b"test");
    assert_success(&result, "encrypt");
    assert!(String::from_utf8_lossy(&result.stdout).contains("File encrypted successfully"));
    assert_ne!(fs::read(&path).unwrap(), original);

    let result = run_filecrypt_with_passphrase(&["decrypt", path_arg(&path)], b"test");
    assert_success(&result, "decrypt");
    assert_eq!(fs::read(&path).unwrap(), original);
}

#[test]
fn test_short_aliases() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("alias.txt");
    fs::write(&path, "via aliases").unwrap();

    let result = run_filecrypt_with_passphrase(&["e", path_arg(&path)], b"test");
    assert_success(&result, "encrypt");
    let result = run_filecrypt_with_passphrase(&["d", path_arg(&path)], b"test");
    assert_success(&result, "decrypt");

    assert_eq!(fs::read_to_string(&path).unwrap(), "via aliases");
}

#[test]
fn test_decrypt_with_wrong_passphrase_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("secret.txt");
    fs::write(&path, "Original").unwrap();

    let result = run_filecrypt_with_passphrase(&["encrypt", path_arg(&path)], b"correct_password");
    assert_success(&result, "encrypt");
    let encrypted = fs::read(&path).unwrap();

    let result = run_filecrypt_with_passphrase(&["decrypt", path_arg(&path)], b"wrong_password");

    assert!(!result.status.success());
    assert_eq!(result.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        stderr.contains("bad passphrase"),
        "Expected error message about the passphrase, got: {}",
        stderr
    );
    assert!(
        stderr.contains("The passphrase is wrong"),
        "Expected wrong-passphrase hint, got: {}",
        stderr
    );
    assert_eq!(fs::read(&path).unwrap(), encrypted);
}

#[test]
fn test_io_failure_has_no_passphrase_hint() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("not-a-file");
    fs::create_dir(&dir).unwrap();

    let result = run_filecrypt_with_passphrase(&["decrypt", path_arg(&dir)], b"test");

    assert_eq!(result.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("failed to read from"), "got: {}", stderr);
    assert!(
        !stderr.contains("The passphrase is wrong"),
        "I/O failure reported as a passphrase problem: {}",
        stderr
    );
}

#[test]
fn test_decrypt_nonexistent_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let nonexistent = temp_dir.path().join("nonexistent.enc");

    let result = run_filecrypt_with_passphrase(&["decrypt", path_arg(&nonexistent)], b"test");

    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("file not found"));
    assert!(!nonexistent.exists());
}

#[test]
fn test_encrypt_nonexistent_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let nonexistent = temp_dir.path().join("nonexistent.txt");

    let result = run_filecrypt_with_passphrase(&["encrypt", path_arg(&nonexistent)], b"test");

    assert!(!result.status.success());
    assert!(!nonexistent.exists());
}

#[test]
fn test_decrypt_truncated_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("truncated.enc");
    fs::write(&path, b"0123456789").unwrap();

    let result = run_filecrypt_with_passphrase(&["decrypt", path_arg(&path)], b"test");

    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("too short"));
    assert_eq!(fs::read(&path).unwrap(), b"0123456789");
}

#[test]
fn test_empty_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("empty.txt");
    fs::write(&path, b"").unwrap();

    let result = run_filecrypt_with_passphrase(&["encrypt", path_arg(&path)], b"test");
    assert_success(&result, "encrypt");
    assert_eq!(fs::read(&path).unwrap().len(), 28);

    let result = run_filecrypt_with_passphrase(&["decrypt", path_arg(&path)], b"test");
    assert_success(&result, "decrypt");
    assert_eq!(fs::read(&path).unwrap(), b"");
}

#[test]
fn test_large_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("large.bin");

    let large_content = vec![0x42u8; 1024 * 1024];
    fs::write(&path, &large_content).unwrap();

    let result = run_filecrypt_with_passphrase(&["encrypt", path_arg(&path)], b"test");
    assert_success(&result, "encrypt");

    let result = run_filecrypt_with_passphrase(&["decrypt", path_arg(&path)], b"test");
    assert_success(&result, "decrypt");
    assert_eq!(fs::read(&path).unwrap(), large_content);
}

#[test]
fn test_same_input_encrypts_differently() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("first.txt");
    let second = temp_dir.path().join("second.txt");
    fs::write(&first, "identical").unwrap();
    fs::write(&second, "identical").unwrap();

    assert_success(
        &run_filecrypt_with_passphrase(&["encrypt", path_arg(&first)], b"test"),
        "encrypt",
    );
    assert_success(
        &run_filecrypt_with_passphrase(&["encrypt", path_arg(&second)], b"test"),
        "encrypt",
    );

    let first = fs::read(&first).unwrap();
    let second = fs::read(&second).unwrap();
    assert_ne!(first[first.len() - 12..], second[second.len() - 12..]);
    assert_ne!(first, second);
}

#[test]
fn test_no_arguments_prints_usage() {
    let result = run_filecrypt(&[]);

    assert_eq!(result.status.code(), Some(0));
    let output = format!(
        "{}{}",
        String::from_utf8_lossy(&result.stdout),
        String::from_utf8_lossy(&result.stderr)
    );
    assert!(output.contains("Usage"), "got: {}", output);
}

#[test]
fn test_help_subcommand() {
    let result = run_filecrypt(&["help"]);

    assert_eq!(result.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("encrypt"));
    assert!(stdout.contains("decrypt"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let result = run_filecrypt(&["shred", "file.txt"]);

    assert_eq!(result.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("shred"), "got: {}", stderr);
    assert!(stderr.contains("Usage"), "got: {}", stderr);
}

#[test]
fn test_terminal_passphrase_requires_tty() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("plain.txt");
    fs::write(&path, "content").unwrap();

    // stdin is /dev/null, so the terminal reader must refuse rather than hang.
    let result = run_filecrypt(&["encrypt", path_arg(&path)]);

    assert_eq!(result.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&result.stderr).contains("not a terminal"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "content");
}
