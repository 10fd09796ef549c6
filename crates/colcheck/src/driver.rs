//! External tool invocation and the multi-pass compilation driver.

use crate::config::ToolConfig;
use crate::{Error, Result};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// One fully-resolved external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
}

impl Invocation {
    /// `<program> <configured args...> <target>`, run from `cwd`.
    ///
    /// The target is passed through untouched, so non-UTF-8 file names reach the tool intact.
    pub fn new(tool: &ToolConfig, target: impl AsRef<OsStr>, cwd: &Path) -> Self {
        let mut args: Vec<OsString> = tool.args.iter().map(OsString::from).collect();
        args.push(target.as_ref().to_os_string());
        Self {
            program: tool.program.clone(),
            args,
            cwd: cwd.to_path_buf(),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Runs external commands to completion.
///
/// A non-zero exit is an error; there are no retries.
pub trait ToolRunner {
    fn run(&self, invocation: &Invocation) -> Result<()>;
}

/// Spawns real processes with stdout/stderr discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| Error::Spawn {
                tool: invocation.to_string(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::ToolFailed {
                tool: invocation.to_string(),
                status,
            })
        }
    }
}

/// Recompiles a document a fixed number of times so aux-carried state reaches its fixpoint.
///
/// Pass `n` reads the state file written by pass `n - 1`.
#[derive(Debug, Clone)]
pub struct CompilationDriver<'a> {
    engine: &'a ToolConfig,
    passes: u32,
}

impl<'a> CompilationDriver<'a> {
    pub fn new(engine: &'a ToolConfig, passes: u32) -> Self {
        Self { engine, passes }
    }

    pub fn converge(&self, runner: &dyn ToolRunner, document: &Path, root: &Path) -> Result<()> {
        let invocation = Invocation::new(self.engine, document, root);
        for pass in 1..=self.passes {
            tracing::debug!(pass, passes = self.passes, command = %invocation, "compiling");
            runner.run(&invocation)?;
        }
        Ok(())
    }
}
