use crate::command::{ExitCode, Invocation, OutputMode};
use crate::reaper::ChildSignalBlock;
use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, execvp, fork};
use std::ffi::{CString, NulError};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use thiserror::Error;

/// Permission bits for files created by output redirection, before the umask.
const CREATE_MODE: libc::mode_t = 0o644;

/// Child status when a redirection file cannot be opened.
const REDIRECT_FAILURE: libc::c_int = 1;

/// Child status when the program cannot be executed.
const EXEC_FAILURE: libc::c_int = 127;

/// What the launcher knows about a spawned child when it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildState {
    /// The foreground child terminated with this code (`128 + signal` if killed).
    Exited(ExitCode),
    /// The foreground child terminated and was collected by the reaper first.
    Collected,
    /// The child runs in the background and is not waited for.
    Background(Pid),
}

/// Failures of the shell process while launching a program.
///
/// Problems inside the child (unreadable redirection file, program not found)
/// are reported by the child itself and only show up as its exit status.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no command to run")]
    EmptyCommand,
    #[error("argument contains a NUL byte: {0}")]
    InvalidArgument(#[from] NulError),
    #[error("cannot block SIGCHLD: {0}")]
    SignalMask(Errno),
    #[error("cannot create process: {0}")]
    Fork(Errno),
    #[error("cannot wait for process {pid}: {errno}")]
    Wait { pid: Pid, errno: Errno },
}

/// A file to open in the child and install on one of its standard descriptors.
struct Redirect {
    path: CString,
    flags: libc::c_int,
    target: libc::c_int,
}

impl Redirect {
    fn input(path: &Path) -> Result<Self, NulError> {
        Ok(Self {
            path: c_path(path)?,
            flags: libc::O_RDONLY,
            target: libc::STDIN_FILENO,
        })
    }

    fn output(path: &Path, mode: OutputMode) -> Result<Self, NulError> {
        let mode_flag = match mode {
            OutputMode::Truncate => libc::O_TRUNC,
            OutputMode::Append => libc::O_APPEND,
        };
        Ok(Self {
            path: c_path(path)?,
            flags: libc::O_WRONLY | libc::O_CREAT | mode_flag,
            target: libc::STDOUT_FILENO,
        })
    }

    /// Opens the file and moves it onto the target descriptor.
    ///
    /// Only async-signal-safe calls: this runs between `fork` and `exec`.
    fn apply(&self) -> Result<(), Errno> {
        // SAFETY: `path` is a valid NUL-terminated string.
        let fd = Errno::result(unsafe {
            libc::open(self.path.as_ptr(), self.flags, CREATE_MODE as libc::c_uint)
        })?;
        if fd == self.target {
            return Ok(());
        }
        // SAFETY: both descriptors are plain integers owned by this process.
        let duplicated = Errno::result(unsafe { libc::dup2(fd, self.target) });
        // SAFETY: `fd` was opened above and nothing else refers to it.
        unsafe { libc::close(fd) };
        duplicated.map(drop)
    }
}

fn c_path(path: &Path) -> Result<CString, NulError> {
    CString::new(path.as_os_str().as_bytes())
}

/// An [`Invocation`] converted to the C strings `exec` needs.
///
/// Everything is allocated before `fork`, so the child never allocates.
struct PreparedCommand {
    argv: Vec<CString>,
    input: Option<Redirect>,
    output: Option<Redirect>,
    background: bool,
}

impl PreparedCommand {
    fn new(invocation: Invocation) -> Result<Self, LaunchError> {
        if invocation.arguments.first().is_none_or(|program| program.is_empty()) {
            return Err(LaunchError::EmptyCommand);
        }
        let argv = invocation
            .arguments
            .into_iter()
            .map(CString::new)
            .collect::<Result<Vec<_>, _>>()?;
        let input = invocation
            .input_source
            .as_deref()
            .map(Redirect::input)
            .transpose()?;
        let output = invocation
            .output_target
            .map(|target| Redirect::output(&target.path, target.mode))
            .transpose()?;
        Ok(Self {
            argv,
            input,
            output,
            background: invocation.background,
        })
    }

    /// Runs in the forked child: redirect, then replace the process image.
    fn exec(&self, signals: &ChildSignalBlock) -> ! {
        let _ = signals.restore();

        for redirect in [&self.input, &self.output].into_iter().flatten() {
            if let Err(errno) = redirect.apply() {
                report(redirect.path.as_bytes(), errno);
                // SAFETY: terminating the child without running parent-owned destructors.
                unsafe { libc::_exit(REDIRECT_FAILURE) }
            }
        }

        let program = &self.argv[0];
        let errno = match execvp(program, &self.argv) {
            Ok(never) => match never {},
            Err(errno) => errno,
        };
        report(program.as_bytes(), errno);
        // SAFETY: as above.
        unsafe { libc::_exit(EXEC_FAILURE) }
    }
}

/// Writes `bsh: <subject>: <reason>` to standard error without allocating.
fn report(subject: &[u8], errno: Errno) {
    let parts: [&[u8]; 5] = [b"bsh: ", subject, b": ", errno.desc().as_bytes(), b"\n"];
    for part in parts {
        // SAFETY: writing a valid buffer to a raw descriptor.
        unsafe { libc::write(libc::STDERR_FILENO, part.as_ptr().cast(), part.len()) };
    }
}

/// Starts an external program as described by `invocation`.
///
/// The program is looked up on `PATH` by `execvp`. A foreground child is
/// waited for before returning; a background child is left to the reaper.
pub fn spawn(invocation: Invocation) -> Result<ChildState, LaunchError> {
    let command = PreparedCommand::new(invocation)?;
    let signals = ChildSignalBlock::new().map_err(LaunchError::SignalMask)?;

    // SAFETY: the child only performs async-signal-safe work before `exec`.
    match unsafe { fork() }.map_err(LaunchError::Fork)? {
        ForkResult::Child => command.exec(&signals),
        ForkResult::Parent { child } => {
            tracing::debug!(pid = %child, background = command.background, "spawned child");
            if command.background {
                return Ok(ChildState::Background(child));
            }
            let state = wait_for(child);
            drop(signals);
            state
        }
    }
}

/// Blocks until `child` exits or is killed.
fn wait_for(child: Pid) -> Result<ChildState, LaunchError> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ChildState::Exited(code)),
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                return Ok(ChildState::Exited(128 + signal as i32));
            }
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => return Ok(ChildState::Collected),
            Err(errno) => return Err(LaunchError::Wait { pid: child, errno }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::OutputTarget;
    use std::path::PathBuf;

    fn invocation(arguments: &[&str]) -> Invocation {
        Invocation {
            arguments: arguments.iter().map(|s| s.to_string()).collect(),
            input_source: None,
            output_target: None,
            background: false,
        }
    }

    fn assert_exit_code(state: ChildState, expected: ExitCode) {
        // The reaper may win the race when another test thread installed it.
        assert!(
            state == ChildState::Exited(expected) || state == ChildState::Collected,
            "expected exit code {expected}, got {state:?}"
        );
    }

    #[test]
    fn test_foreground_exit_code() {
        assert_exit_code(spawn(invocation(&["true"])).unwrap(), 0);
        assert_exit_code(spawn(invocation(&["false"])).unwrap(), 1);
    }

    #[test]
    fn test_unknown_program_exits_127() {
        let state = spawn(invocation(&["bsh-no-such-program-4242"])).unwrap();
        assert_exit_code(state, 127);
    }

    #[test]
    fn test_killed_child_reports_signal() {
        let state = spawn(invocation(&["sh", "-c", "kill -9 $$"])).unwrap();
        assert_exit_code(state, 128 + 9);
    }

    #[test]
    fn test_output_truncate_and_append() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        std::fs::write(&out, "previous content\n").unwrap();

        let mut echo = invocation(&["echo", "hi"]);
        echo.output_target = Some(OutputTarget {
            path: out.clone(),
            mode: OutputMode::Truncate,
        });
        assert_exit_code(spawn(echo.clone()).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "hi\n");

        echo.output_target = Some(OutputTarget {
            path: out.clone(),
            mode: OutputMode::Append,
        });
        assert_exit_code(spawn(echo).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "hi\nhi\n");
    }

    #[test]
    fn test_created_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("fresh.txt");
        let mut echo = invocation(&["echo", "x"]);
        echo.output_target = Some(OutputTarget {
            path: out.clone(),
            mode: OutputMode::Truncate,
        });
        assert_exit_code(spawn(echo).unwrap(), 0);

        let mode = std::fs::metadata(&out).unwrap().permissions().mode() & 0o777;
        // Never more permissive than 0644; the umask may only remove bits.
        assert_eq!(mode & !0o644, 0);
        assert_ne!(mode & 0o200, 0);
    }

    #[test]
    fn test_input_redirection() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let out = dir.path().join("out.txt");
        std::fs::write(&input, "b\na\n").unwrap();

        let mut sort = invocation(&["sort"]);
        sort.input_source = Some(input);
        sort.output_target = Some(OutputTarget {
            path: out.clone(),
            mode: OutputMode::Truncate,
        });
        assert_exit_code(spawn(sort).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_missing_input_fails_child_only() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");

        let mut cat = invocation(&["cat"]);
        cat.input_source = Some(PathBuf::from("/nonexistent-dir/missing.txt"));
        cat.output_target = Some(OutputTarget {
            path: out.clone(),
            mode: OutputMode::Truncate,
        });
        assert_exit_code(spawn(cat).unwrap(), 1);
        assert!(!out.exists(), "output must not be opened after input failed");
    }

    #[test]
    fn test_empty_program_is_never_executed() {
        assert!(matches!(spawn(invocation(&[])), Err(LaunchError::EmptyCommand)));
        assert!(matches!(spawn(invocation(&["", "x"])), Err(LaunchError::EmptyCommand)));
    }

    #[test]
    fn test_nul_byte_is_rejected_before_fork() {
        let result = spawn(invocation(&["echo", "a\0b"]));
        assert!(matches!(result, Err(LaunchError::InvalidArgument(_))));
    }

    #[test]
    fn test_background_returns_immediately() {
        let started = std::time::Instant::now();
        let mut sleep = invocation(&["sleep", "5"]);
        sleep.background = true;

        let state = spawn(sleep).unwrap();

        assert!(started.elapsed() < std::time::Duration::from_secs(2));
        let ChildState::Background(pid) = state else {
            panic!("expected a background child, got {state:?}");
        };
        nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGKILL).unwrap();
        // Collect it here so it does not outlive the test.
        let _ = waitpid(pid, None);
    }
}
