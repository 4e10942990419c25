use anyhow::Context;
use bsh::io_adapters::Terminal;
use bsh::{Interpreter, ShellConfig, logging, reaper};

fn main() -> anyhow::Result<()> {
    let config: ShellConfig = argh::from_env();
    logging::init(config.log_file.as_deref())?;
    reaper::install().context("cannot install SIGCHLD handler")?;

    let mut terminal = Terminal::new(config.history())?;
    let mut interpreter = Interpreter::with_config(&config);
    interpreter.repl(&mut terminal)?;
    tracing::debug!(exit = interpreter.should_exit(), "shell finished");
    Ok(())
}
