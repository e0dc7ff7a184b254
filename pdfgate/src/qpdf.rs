//! Transform invoker: drives the external `qpdf` executable.
//!
//! Both operations spawn the configured binary directly with an argument
//! vector - never through a shell - and the literal `--` separator precedes
//! the file paths so that neither the paths nor anything derived from user
//! input can be parsed as an option flag.
//!
//! Exit code zero means the output path holds the transformed document. A
//! non-zero exit during protect is a tool failure (500); during unlock it is
//! the expected signal for a wrong credential (403). The subprocess wait is
//! bounded by `tool.timeout`; on expiry the child is killed.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

use crate::config::ToolConfig;
use crate::errors::{Error, Result};

/// Cipher key length selected for protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum KeyLength {
    Aes128,
    #[default]
    Aes256,
}

impl KeyLength {
    /// Coerce a `bits` form field. Unrecognized input falls back to the
    /// strongest supported length rather than failing the request.
    pub fn from_field(value: &str) -> Self {
        match value.trim() {
            "128" => KeyLength::Aes128,
            "256" => KeyLength::Aes256,
            _ => KeyLength::default(),
        }
    }

    /// The key-length argument as qpdf expects it.
    pub fn as_arg(self) -> &'static str {
        match self {
            KeyLength::Aes128 => "128",
            KeyLength::Aes256 => "256",
        }
    }
}

impl TryFrom<u16> for KeyLength {
    type Error = String;

    fn try_from(bits: u16) -> std::result::Result<Self, Self::Error> {
        match bits {
            128 => Ok(KeyLength::Aes128),
            256 => Ok(KeyLength::Aes256),
            other => Err(format!("unsupported key length: {other} (expected 128 or 256)")),
        }
    }
}

impl From<KeyLength> for u16 {
    fn from(value: KeyLength) -> Self {
        match value {
            KeyLength::Aes128 => 128,
            KeyLength::Aes256 => 256,
        }
    }
}

/// Encrypt `input` into `output`, gated by `password`.
///
/// The password is supplied as both the user password and the owner password,
/// so the single credential both opens and fully controls the document.
pub async fn protect(tool: &ToolConfig, input: &Path, output: &Path, password: &str, key_length: KeyLength) -> Result<()> {
    let mut cmd = Command::new(&tool.binary);
    cmd.arg("--encrypt")
        .arg(password)
        .arg(password)
        .arg(key_length.as_arg())
        .arg("--")
        .arg(input)
        .arg(output);

    let result = run(cmd, "Protect", tool.timeout).await?;
    if result.status.success() {
        return Ok(());
    }
    Err(Error::ToolFailure {
        operation: "Protect",
        detail: failure_detail(&result),
    })
}

/// Decrypt `input` into `output` using `password` as the unlocking credential.
///
/// A non-zero exit here is the tool reporting a wrong password or a document
/// it cannot decrypt, not a system fault.
pub async fn unlock(tool: &ToolConfig, input: &Path, output: &Path, password: &str) -> Result<()> {
    let mut cmd = Command::new(&tool.binary);
    cmd.arg(format!("--password={password}"))
        .arg("--decrypt")
        .arg("--")
        .arg(input)
        .arg(output);

    let result = run(cmd, "Unlock", tool.timeout).await?;
    if result.status.success() {
        return Ok(());
    }
    tracing::debug!(detail = %failure_detail(&result), "tool rejected unlock");
    Err(Error::IncorrectPassword)
}

/// Spawn the tool and wait for it, bounded by `timeout`.
///
/// Spawn failures and timeouts are tool failures regardless of operation; the
/// caller classifies non-zero exits.
async fn run(mut cmd: Command, operation: &'static str, timeout: Duration) -> Result<Output> {
    cmd.stdin(Stdio::null()).kill_on_drop(true);

    tracing::debug!(?operation, program = %cmd.as_std().get_program().to_string_lossy(), "invoking tool");

    let waited = tokio::time::timeout(timeout, cmd.output()).await.map_err(|_| Error::ToolFailure {
        operation,
        detail: format!("tool did not finish within {timeout:?}"),
    })?;

    waited.map_err(|e| Error::ToolFailure {
        operation,
        detail: format!("could not run tool: {e}"),
    })
}

/// Diagnostic text for a failed invocation: the tool's stderr, or the exit
/// status when stderr is empty.
fn failure_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("tool exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}
