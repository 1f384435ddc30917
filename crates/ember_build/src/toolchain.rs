//! The external translation tool.
//!
//! The engine never spawns processes directly; it goes through [`Toolchain`]
//! so that the two invocation shapes (dependency report and build) can be
//! driven by a real compiler or by a scripted stand-in.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Captured result of one tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    /// Everything written to standard output.
    pub stdout: Vec<u8>,
    /// Everything written to standard error.
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    /// Returns `true` if the tool exited with code 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Human-readable exit status.
    pub fn status(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }

    /// The tool's diagnostics: standard error, or standard output when
    /// nothing was written to standard error.
    pub fn diagnostics(&self) -> String {
        if self.stderr.is_empty() {
            String::from_utf8_lossy(&self.stdout).into_owned()
        } else {
            String::from_utf8_lossy(&self.stderr).into_owned()
        }
    }
}

/// Something that can run the translation tool.
///
/// Shared by every in-flight unit of a batch, hence `Sync`.
pub trait Toolchain: Send + Sync {
    /// Runs the tool with `args` in the working directory `cwd` and waits for
    /// it to exit. An `Err` means the tool could not be started at all.
    fn run(&self, cwd: &Path, args: &[String]) -> std::io::Result<ToolOutput>;
}

/// Runs an `emcc`-compatible compiler as a child process.
#[derive(Debug, Clone)]
pub struct EmccToolchain {
    program: PathBuf,
}

impl EmccToolchain {
    /// Creates a toolchain invoking `program` (a name looked up on `PATH`,
    /// or a path).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the program this toolchain invokes.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for EmccToolchain {
    fn default() -> Self {
        Self::new("emcc")
    }
}

impl Toolchain for EmccToolchain {
    fn run(&self, cwd: &Path, args: &[String]) -> std::io::Result<ToolOutput> {
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;
        Ok(ToolOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
