use crate::command::{CommandFactory, ExitCode, Invocation};
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::external::{self, ChildState, LaunchError};
use crate::io_adapters::LineSource;
use crate::parser::Parser;
use crate::prompt;
use std::io::Write;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the builtins defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Result of launching one [`Invocation`].
#[derive(Debug)]
pub enum ExitOutcome {
    /// A builtin ran in the shell's own process.
    BuiltinHandled(ExitCode),
    /// An external program was started.
    Spawned(ChildState),
    /// Nothing could be started; the shell carries on with the next line.
    LaunchFailed(LaunchError),
}

/// A minimal interactive shell.
///
/// The interpreter maintains an [`Environment`] and a list of builtin
/// [`CommandFactory`] objects. Names no factory recognizes are launched as
/// external programs.
///
/// Example
/// ```
/// use bsh::{ExitOutcome, Interpreter};
/// let mut sh = Interpreter::default();
/// let outcome = sh.run_line("exit");
/// assert!(matches!(outcome, Some(ExitOutcome::BuiltinHandled(0))));
/// assert!(sh.should_exit());
/// ```
pub struct Interpreter {
    env: Environment,
    builtins: Vec<Box<dyn CommandFactory>>,
    parser: Parser,
    diagnostics: Box<dyn Write>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of builtin factories.
    pub fn new(builtins: Vec<Box<dyn CommandFactory>>, parser: Parser) -> Self {
        Self {
            env: Environment::new(),
            builtins,
            parser,
            diagnostics: Box::new(std::io::stderr()),
        }
    }

    /// Create an interpreter with the default builtins, configured from the command line.
    pub fn with_config(config: &ShellConfig) -> Self {
        Self::new(default_builtins(), Parser::new(config.max_tokens))
    }

    /// Send error messages to `writer` instead of standard error.
    pub fn with_diagnostics(mut self, writer: Box<dyn Write>) -> Self {
        self.diagnostics = writer;
        self
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Whether the `exit` builtin has run.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Run a parsed invocation: a builtin in-process, anything else as a child process.
    ///
    /// Foreground children are waited for; background children are not.
    pub fn launch(&mut self, invocation: Invocation) -> ExitOutcome {
        tracing::debug!(?invocation, "launching");
        {
            let Some(program) = invocation.program() else {
                return ExitOutcome::LaunchFailed(LaunchError::EmptyCommand);
            };
            let args: Vec<&str> = invocation.arguments[1..]
                .iter()
                .map(String::as_str)
                .collect();
            for factory in &self.builtins {
                if let Some(cmd) = factory.try_create(program, &args) {
                    let code = match cmd.execute(&mut self.diagnostics, &mut self.env) {
                        Ok(code) => code,
                        Err(e) => {
                            tracing::warn!(error = %e, "cannot report builtin result");
                            1
                        }
                    };
                    return ExitOutcome::BuiltinHandled(code);
                }
            }
        }

        match external::spawn(invocation) {
            Ok(state) => ExitOutcome::Spawned(state),
            Err(e) => {
                tracing::debug!(error = %e, "launch failed");
                ExitOutcome::LaunchFailed(e)
            }
        }
    }

    /// Parse and run one line, reporting problems on the diagnostics writer.
    ///
    /// Returns `None` when nothing was launched: the line was blank, only held
    /// redirections, or did not parse.
    pub fn run_line(&mut self, line: &str) -> Option<ExitOutcome> {
        let invocation = match self.parser.parse(line) {
            Ok(Some(invocation)) => invocation,
            Ok(None) => return None,
            Err(e) => {
                self.report(&e);
                return None;
            }
        };

        let outcome = self.launch(invocation);
        if let ExitOutcome::LaunchFailed(e) = &outcome {
            self.report(e);
        }
        Some(outcome)
    }

    /// Read-eval loop: runs lines from `source` until end of input or `exit`.
    pub fn repl(&mut self, source: &mut dyn LineSource) -> anyhow::Result<()> {
        while !self.env.should_exit {
            let home = self.env.home();
            let prompt = prompt::render(&self.env.current_dir, home.as_deref());
            match source.read_line(&prompt)? {
                Some(line) => {
                    self.run_line(&line);
                }
                None => {
                    println!();
                    break;
                }
            }
        }
        Ok(())
    }

    fn report(&mut self, error: &dyn std::fmt::Display) {
        if let Err(e) = writeln!(self.diagnostics, "bsh: {error}") {
            tracing::warn!(error = %e, "cannot write diagnostics");
        }
    }
}

fn default_builtins() -> Vec<Box<dyn CommandFactory>> {
    use crate::builtin::*;
    vec![
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<Exit>::default()),
    ]
}

impl Default for Interpreter {
    /// Create an interpreter with the default builtins (`cd`, `exit`) and no token limit.
    fn default() -> Self {
        Self::new(default_builtins(), Parser::default())
    }
}
