use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// State the shell keeps about itself between input lines.
///
/// The environment contains:
/// - `vars`: a snapshot of the process environment variables taken at startup.
/// - `current_dir`: the working directory, kept in sync by `cd`.
/// - `should_exit`: set by the `exit` built-in; the read-eval loop stops once it is true.
///
/// Spawned programs inherit the real process environment; `vars` only feeds
/// the shell's own lookups such as `HOME`.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory of the shell process.
    pub current_dir: PathBuf,
    /// When set to true, the read-eval loop terminates before reading more input.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn new() -> Self {
        let vars = stdenv::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// Get the value of a variable from the snapshot.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override a variable in the snapshot.
    #[cfg(test)]
    pub(crate) fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Remove a variable from the snapshot.
    #[cfg(test)]
    pub(crate) fn remove_var(&mut self, key: &str) {
        self.vars.remove(key);
    }

    /// The `HOME` directory, if set and non-empty.
    pub fn home(&self) -> Option<PathBuf> {
        self.get_var("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::env::Environment;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn empty_env() -> Environment {
        Environment {
            vars: HashMap::new(),
            current_dir: PathBuf::from("/"),
            should_exit: false,
        }
    }

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = empty_env();

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");
        assert_eq!(env.get_var("KEY"), Some("VALUE"));

        env.remove_var("KEY");
        assert_eq!(env.get_var("KEY"), None);
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn test_home_ignores_empty_value() {
        let mut env = empty_env();
        assert_eq!(env.home(), None);

        env.set_var("HOME", "");
        assert_eq!(env.home(), None);

        env.set_var("HOME", "/tmp");
        assert_eq!(env.home(), Some(PathBuf::from("/tmp")));
    }
}
