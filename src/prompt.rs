use std::path::Path;

/// Builds the prompt shown before each line: the working directory followed by `> `.
///
/// A directory inside `home` is shown relative to `~`. Only whole path
/// components match, so `/home/al` does not shorten `/home/alice`.
pub fn render(cwd: &Path, home: Option<&Path>) -> String {
    match home.and_then(|home| cwd.strip_prefix(home).ok()) {
        Some(rest) if rest.as_os_str().is_empty() => "~> ".to_string(),
        Some(rest) => format!("~/{}> ", rest.display()),
        None => format!("{}> ", cwd.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_itself() {
        assert_eq!(render(Path::new("/home/al"), Some(Path::new("/home/al"))), "~> ");
    }

    #[test]
    fn test_below_home() {
        assert_eq!(
            render(Path::new("/home/al/src/bsh"), Some(Path::new("/home/al"))),
            "~/src/bsh> "
        );
    }

    #[test]
    fn test_outside_home() {
        assert_eq!(render(Path::new("/tmp"), Some(Path::new("/home/al"))), "/tmp> ");
        assert_eq!(render(Path::new("/tmp"), None), "/tmp> ");
    }

    #[test]
    fn test_prefix_must_end_on_component_boundary() {
        assert_eq!(
            render(Path::new("/home/alice"), Some(Path::new("/home/al"))),
            "/home/alice> "
        );
    }
}
