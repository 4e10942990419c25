//! Asynchronous collection of terminated child processes.
//!
//! The shell keeps no job table, so nothing ever waits for a background child.
//! A `SIGCHLD` handler installed once at startup releases every terminated
//! child instead. The handler only calls `waitpid` with `WNOHANG`, so it never
//! blocks and never touches state the rest of the shell relies on.

use nix::errno::Errno;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

/// Collects every child that has already terminated, without blocking.
///
/// Returns the number of children collected.
pub fn reap() -> usize {
    let mut collected = 0;
    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) | Err(_) => return collected,
            Ok(_) => collected += 1,
        }
    }
}

extern "C" fn on_child_state_change(_signal: libc::c_int) {
    let saved = Errno::last();
    reap();
    saved.set();
}

/// Installs the `SIGCHLD` handler that runs [`reap`].
///
/// Calling this more than once is harmless.
pub fn install() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_child_state_change),
        SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP,
        SigSet::empty(),
    );
    // SAFETY: the handler only calls async-signal-safe functions.
    unsafe { signal::sigaction(Signal::SIGCHLD, &action) }?;
    Ok(())
}

/// Keeps `SIGCHLD` blocked in the calling thread until dropped.
///
/// The launcher holds one between `fork` and its targeted `waitpid`, so the
/// handler cannot collect the foreground child first. A pending `SIGCHLD` is
/// delivered as soon as the previous mask comes back.
pub(crate) struct ChildSignalBlock {
    previous: SigSet,
}

impl ChildSignalBlock {
    pub(crate) fn new() -> nix::Result<Self> {
        let mut blocked = SigSet::empty();
        blocked.add(Signal::SIGCHLD);
        let mut previous = SigSet::empty();
        signal::pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&blocked), Some(&mut previous))?;
        Ok(Self { previous })
    }

    /// Puts the previous mask back without consuming the guard.
    ///
    /// Used in a forked child, which never runs destructors.
    pub(crate) fn restore(&self) -> nix::Result<()> {
        signal::pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(&self.previous), None)
    }
}

impl Drop for ChildSignalBlock {
    fn drop(&mut self) {
        if let Err(errno) = self.restore() {
            tracing::warn!(%errno, "cannot restore signal mask");
        }
    }
}
