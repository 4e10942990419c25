use crate::env::Environment;
use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// How an output redirection treats an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// `>`: discard previous contents.
    Truncate,
    /// `>>`: write after previous contents.
    Append,
}

/// Destination of a redirected standard output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub mode: OutputMode,
}

/// The parsed form of one input line, ready to be launched.
///
/// An `Invocation` owns every string it refers to and is consumed by value by
/// [`Interpreter::launch`](crate::Interpreter::launch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name followed by its arguments. Never empty when produced by the parser.
    pub arguments: Vec<String>,
    /// File replacing the child's standard input (`< path`).
    pub input_source: Option<PathBuf>,
    /// File replacing the child's standard output (`> path` or `>> path`).
    pub output_target: Option<OutputTarget>,
    /// Whether the shell returns without waiting for the child (`&`).
    pub background: bool,
}

impl Invocation {
    /// Program name, i.e. `arguments[0]`, or `None` if `arguments` is empty.
    pub fn program(&self) -> Option<&str> {
        self.arguments.first().map(String::as_str)
    }
}

/// Object-safe trait for a built-in command ready to run in the shell's own process.
pub trait ExecutableCommand {
    /// Executes the command.
    ///
    /// Diagnostics go to `stderr`; the returned code follows shell conventions.
    fn execute(self: Box<Self>, stderr: &mut dyn Write, env: &mut Environment)
    -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}
