//! Helper process execution for desktop theme queries.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use theme_detector_core::SampleError;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A fixed helper command such as `gsettings get ...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeCommand {
    program: &'static str,
    args: &'static [&'static str],
}

impl ThemeCommand {
    /// Create a command from a program name and its arguments.
    pub const fn new(program: &'static str, args: &'static [&'static str]) -> Self {
        Self { program, args }
    }

    /// The program name.
    pub fn program(&self) -> &'static str {
        self.program
    }

    /// The full command line, for diagnostics.
    pub fn command_line(&self) -> String {
        let mut line = self.program.to_string();
        for arg in self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Spawn the command with stdout piped and everything else discarded.
    pub fn spawn(&self) -> Result<Child, SampleError> {
        Command::new(self.program)
            .args(self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SampleError::spawn(self.command_line(), source))
    }

    /// Run the command to completion and return the first line of its output.
    ///
    /// Returns `Ok(None)` if the command printed nothing. A command still
    /// running after `timeout` is killed.
    pub fn first_line(&self, timeout: Duration) -> Result<Option<String>, SampleError> {
        let mut child = self.spawn()?;
        let status = reap_within(&mut child, timeout, Child::try_wait)
            .map_err(|source| SampleError::io(self.command_line(), source))?;

        let Some(status) = status else {
            return Err(SampleError::timeout(self.command_line(), timeout));
        };

        let mut output = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout
                .read_to_string(&mut output)
                .map_err(|source| SampleError::io(self.command_line(), source))?;
        }

        let line = output.lines().next().map(str::trim).filter(|line| !line.is_empty());
        match line {
            Some(line) => Ok(Some(line.to_string())),
            None if !status.success() => Err(SampleError::CommandFailed {
                command: self.command_line(),
                status: status.to_string(),
            }),
            None => Ok(None),
        }
    }
}

type ExitPoll = fn(&mut Child) -> io::Result<Option<ExitStatus>>;

/// Wait up to `timeout` for the child to exit, killing it unless it did.
///
/// `Ok(None)` means the timeout elapsed.
fn reap_within(child: &mut Child, timeout: Duration, poll: ExitPoll) -> io::Result<Option<ExitStatus>> {
    let result = wait_with_deadline(child, timeout, poll);
    if !matches!(result, Ok(Some(_))) {
        kill(child);
    }
    result
}

fn wait_with_deadline(child: &mut Child, timeout: Duration, poll: ExitPoll) -> io::Result<Option<ExitStatus>> {
    // No deadline if the timeout overflows `Instant`.
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if let Some(status) = poll(child)? {
            return Ok(Some(status));
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Ok(None);
        }
        thread::sleep(EXIT_POLL_INTERVAL);
    }
}

/// Kill a helper process and reap it.
pub fn kill(child: &mut Child) {
    if let Err(err) = child.kill() {
        tracing::debug!(target: "theme_detector::command", error = %err, "helper process already exited");
    }
    if let Err(err) = child.wait() {
        tracing::debug!(target: "theme_detector::command", error = %err, "couldn't reap helper process");
    }
}

/// Owns a long-running helper process and kills it when dropped.
#[derive(Debug)]
pub struct ChildGuard {
    child: Child,
}

impl ChildGuard {
    /// Take ownership of a spawned process.
    pub fn new(child: Child) -> Self {
        Self { child }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        kill(&mut self.child);
        tracing::debug!(target: "theme_detector::command", pid = self.child.id(), "monitoring process has been destroyed");
    }
}
