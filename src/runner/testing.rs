//! Test doubles for [`ProcessRunner`].
//!
//! Nothing here launches a process. Integration tests drive whole batches
//! through [`RecordingRunner`] and fake tool output from its hook.

use super::{Invocation, ProcessRunner};
use std::io;

impl Invocation {
    /// Arguments as lossy UTF-8
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// True if `flag` appears among the arguments
    pub fn has_arg(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }

    /// Value following `flag`, if any
    pub fn value_of(&self, flag: &str) -> Option<String> {
        let pos = self.args.iter().position(|a| a == flag)?;
        self.args
            .get(pos + 1)
            .map(|v| v.to_string_lossy().into_owned())
    }
}

/// Records invocations without executing them.
///
/// An optional hook runs for each invocation so tests can write the files a
/// tool would have produced.
#[derive(Default)]
pub struct RecordingRunner {
    pub invocations: Vec<Invocation>,
    hook: Option<Box<dyn FnMut(&Invocation)>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook(hook: impl FnMut(&Invocation) + 'static) -> Self {
        RecordingRunner {
            invocations: Vec::new(),
            hook: Some(Box::new(hook)),
        }
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&mut self, invocation: &Invocation) -> io::Result<Option<i32>> {
        if let Some(hook) = self.hook.as_mut() {
            hook(invocation);
        }
        self.invocations.push(invocation.clone());
        Ok(Some(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::run_logged;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_argument_lookup() {
        let inv = Invocation::new("raxml-ng")
            .arg("--msa")
            .arg("a b.phy")
            .args(["--threads", "auto"]);
        assert_eq!(inv.args_lossy(), vec!["--msa", "a b.phy", "--threads", "auto"]);
        assert!(inv.has_arg("--threads"));
        assert!(!inv.has_arg("--redo"));
        assert_eq!(inv.value_of("--msa").as_deref(), Some("a b.phy"));
        assert_eq!(inv.value_of("--auto"), None);
        assert_eq!(inv.value_of("auto"), None);
    }

    #[test]
    fn test_recording_runner_calls_hook() {
        let seen = Rc::new(RefCell::new(0usize));
        let counter = Rc::clone(&seen);
        let mut runner = RecordingRunner::with_hook(move |_| *counter.borrow_mut() += 1);
        let inv = Invocation::new("tool").arg("-v");

        run_logged(&mut runner, &inv);
        run_logged(&mut runner, &inv);
        assert_eq!(runner.invocations.len(), 2);
        assert_eq!(*seen.borrow(), 2);
    }
}
