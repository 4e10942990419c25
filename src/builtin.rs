use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::{Context, Result};
use std::env;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins run directly in-process without spawning a child process. They
/// receive their arguments exactly as typed; no option parsing takes place.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "exit" or "cd".
    fn name() -> &'static str;

    /// Builds the command from the words that followed its name.
    fn from_args(args: &[&str]) -> Self;

    /// Executes the command against the shell's own environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, stderr: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        match <T as BuiltinCommand>::execute(*self, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                let message = format!("{e:#}");
                tracing::debug!(builtin = T::name(), error = %message, "builtin failed");
                writeln!(stderr, "bsh: {message}")?;
                Ok(1)
            }
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        (name == T::name()).then(|| Box::new(T::from_args(args)) as Box<dyn ExecutableCommand>)
    }
}

/// Change the current working directory.
///
/// The first argument is the target, used verbatim: it is never treated as an
/// option, so `cd -x` enters a directory named `-x`. Further arguments are
/// ignored. Without an argument, changes to `$HOME`.
pub struct Cd {
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn from_args(args: &[&str]) -> Self {
        Cd {
            target: args.first().map(|arg| arg.to_string()),
        }
    }

    fn execute(self, env: &mut Environment) -> Result<ExitCode> {
        let target = match self.target {
            Some(t) => PathBuf::from(t),
            None => env
                .home()
                .ok_or_else(|| anyhow::anyhow!("cd: HOME not set"))?,
        };

        env::set_current_dir(&target).with_context(|| format!("cd: {}", target.display()))?;
        env.current_dir = env::current_dir().unwrap_or_else(|_| env.current_dir.join(&target));
        tracing::debug!(dir = %env.current_dir.display(), "changed directory");
        Ok(0)
    }
}

/// Exit the shell. Arguments are ignored.
pub struct Exit;

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn from_args(_args: &[&str]) -> Self {
        Exit
    }

    fn execute(self, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}
