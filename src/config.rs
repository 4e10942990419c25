use argh::FromArgs;
use std::path::PathBuf;

#[derive(FromArgs, Debug, Default, PartialEq, Eq)]
/// A small interactive shell: runs one program per line, with `<`, `>`, `>>` and `&`.
pub struct ShellConfig {
    #[argh(option, from_str_fn(parse_limit))]
    /// reject lines with more than this many tokens (unlimited by default)
    pub max_tokens: Option<usize>,

    #[argh(switch)]
    /// do not record entered lines in the line editor history
    pub no_history: bool,

    #[argh(option)]
    /// append logs to this file instead of standard error
    pub log_file: Option<PathBuf>,
}

impl ShellConfig {
    /// Whether entered lines go to the line editor history.
    pub fn history(&self) -> bool {
        !self.no_history
    }
}

fn parse_limit(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("token limit must be at least 1".to_string()),
        Ok(limit) => Ok(limit),
        Err(e) => Err(format!("invalid token limit {value:?}: {e}")),
    }
}
