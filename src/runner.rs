// External process execution
//
// Every external tool is launched from an explicit argument list; nothing is
// passed through a shell. Exit codes are logged and otherwise ignored: a
// failed run shows up later as a missing or unparseable result file.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

pub mod testing;

/// One command line: program plus arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for a in &self.args {
            write!(f, " {}", a.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Executes invocations; swapped for a recording double in tests.
pub trait ProcessRunner {
    /// Run to completion. Returns the exit code when the process ran and
    /// reported one, `Ok(None)` when it was terminated by a signal.
    fn run(&mut self, invocation: &Invocation) -> io::Result<Option<i32>>;
}

/// Runs invocations as child processes inheriting stdio
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> io::Result<Option<i32>> {
        log::debug!("Running: {}", invocation);
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()?;
        Ok(status.code())
    }
}

/// Run `invocation`, logging but never propagating failure.
pub fn run_logged(runner: &mut dyn ProcessRunner, invocation: &Invocation) {
    match runner.run(invocation) {
        Ok(Some(0)) => log::debug!("{} finished", invocation.program.display()),
        Ok(Some(code)) => log::warn!(
            "{} exited with status {}",
            invocation.program.display(),
            code
        ),
        Ok(None) => log::warn!("{} terminated by signal", invocation.program.display()),
        Err(e) => log::error!("Failed to launch {}: {}", invocation.program.display(), e),
    }
}

/// Prefix as a plain string argument; raxml-ng and pythia take prefixes verbatim
pub(crate) fn path_arg(path: &Path) -> OsString {
    path.as_os_str().to_os_string()
}
