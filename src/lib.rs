//! A small interactive shell.
//!
//! Each input line names one program, optionally followed by `< file`,
//! `> file`, `>> file` and a final `&`. The line is parsed into an
//! [`Invocation`](command::Invocation) and launched: `cd` and `exit` run inside
//! the shell, anything else is forked and executed with its redirections
//! applied. Foreground programs are waited for; background programs are left
//! to a `SIGCHLD` handler that reaps them once they terminate.
//!
//! The main entry point is [`Interpreter`]. [`parse`] turns a line into an
//! invocation on its own, and [`reaper::install`] must be called once at
//! startup so that background children do not accumulate.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
mod external;
mod interpreter;
pub mod io_adapters;
mod lexer;
pub mod logging;
pub mod parser;
pub mod prompt;
pub mod reaper;

pub use config::ShellConfig;
pub use external::{ChildState, LaunchError};
pub use interpreter::{ExitOutcome, Interpreter};
pub use parser::{ParseError, Parser, parse};

/// Serializes tests that change the process working directory.
#[cfg(test)]
pub(crate) fn lock_current_dir() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
