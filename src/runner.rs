//! Invocation of the Datree executable.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use tracing::debug;

use crate::error::{InvocationError, SetupError};

/// Exit status `datree test` uses when policy violations were found.
pub const EXIT_VIOLATIONS: i32 = 2;

/// Per-invocation settings passed to the tool.
#[derive(Debug, Clone)]
pub struct TestOptions {
    pub policy: String,
    /// Pass `--skip-validation schema` so only policy rules are reported
    pub skip_schema_validation: bool,
}

/// Captured result of one tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Non-empty captured streams, stdout first.
    pub fn chunks(&self) -> impl Iterator<Item = &str> {
        [self.stdout.as_str(), self.stderr.as_str()]
            .into_iter()
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
    }

    pub fn violations_found(&self) -> bool {
        self.code == Some(EXIT_VIOLATIONS)
    }

    pub fn status_label(&self) -> String {
        match self.code {
            Some(code) => code.to_string(),
            None => "signal".to_string(),
        }
    }
}

/// Something that can run `datree test` against a manifest.
pub trait ToolRunner {
    fn run(&self, manifest: &Path, opts: &TestOptions) -> Result<ToolOutput, InvocationError>;
}

/// Runs the real executable as a blocking subprocess.
#[derive(Debug, Clone)]
pub struct DatreeCli {
    binary: PathBuf,
}

impl DatreeCli {
    /// Wrap `binary` after checking it exists and is executable.
    pub fn new(binary: impl Into<PathBuf>) -> Result<Self, SetupError> {
        let binary = binary.into();
        ensure_executable(&binary)?;
        Ok(Self { binary })
    }
}

impl ToolRunner for DatreeCli {
    fn run(&self, manifest: &Path, opts: &TestOptions) -> Result<ToolOutput, InvocationError> {
        let args = test_args(manifest, opts);
        debug!(binary = %self.binary.display(), ?args, "invoking datree");

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| InvocationError::Spawn {
                binary: self.binary.clone(),
                manifest: manifest.display().to_string(),
                source,
            })?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Argument list for `datree test` on one manifest.
pub fn test_args(manifest: &Path, opts: &TestOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "test".into(),
        manifest.as_os_str().to_os_string(),
        "-p".into(),
        opts.policy.clone().into(),
        "-o".into(),
        "json".into(),
        "--verbose".into(),
    ];
    if opts.skip_schema_validation {
        args.push("--skip-validation".into());
        args.push("schema".into());
    }
    args
}

/// Fail unless `path` is a regular file that can be executed.
pub fn ensure_executable(path: &Path) -> Result<(), SetupError> {
    let metadata = match fs::metadata(path) {
        Ok(m) if m.is_file() => m,
        _ => return Err(SetupError::BinaryMissing(path.to_path_buf())),
    };

    if !is_executable(&metadata) {
        return Err(SetupError::BinaryNotExecutable(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}
