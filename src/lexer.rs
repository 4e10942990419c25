//! A module implementing lexical analysis (tokenization) of a command line.
//!
//! Words are separated by runs of spaces and tabs. There is no quoting, escaping
//! or expansion: `"foo bar"` is two words, `"foo` and `bar"`.

/// Represents a token resulting from lexical analysis.
///
/// Tokens borrow from the input line; the parser copies what it keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Any whitespace-delimited text that is not an operator.
    Word(&'a str),
    /// Input redirection symbol, `<`.
    RedirectLeft,
    /// Output redirection symbol, `>`.
    RedirectRight,
    /// Appending output redirection symbol, `>>`.
    RedirectAppend,
    /// Background execution marker, `&`.
    Background,
}

impl<'a> Token<'a> {
    fn classify(text: &'a str) -> Self {
        match text {
            "<" => Token::RedirectLeft,
            ">" => Token::RedirectRight,
            ">>" => Token::RedirectAppend,
            "&" => Token::Background,
            _ => Token::Word(text),
        }
    }

    /// The text this token was read from.
    pub fn as_str(&self) -> &'a str {
        match self {
            Token::Word(text) => text,
            Token::RedirectLeft => "<",
            Token::RedirectRight => ">",
            Token::RedirectAppend => ">>",
            Token::Background => "&",
        }
    }
}

fn is_separator(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

/// Splits a line into classified tokens, left to right.
///
/// A single trailing newline is removed first. Operators are only recognized
/// as whole words, so `>out` is a plain word.
pub fn split_into_tokens(line: &str) -> impl Iterator<Item = Token<'_>> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.split(is_separator)
        .filter(|word| !word.is_empty())
        .map(Token::classify)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(line: &str) -> Vec<Token<'_>> {
        split_into_tokens(line).collect()
    }

    #[test]
    fn test_splits_on_spaces_and_tabs() {
        assert_eq!(
            tokens("ls \t -l\t\t/tmp"),
            vec![Token::Word("ls"), Token::Word("-l"), Token::Word("/tmp")]
        );
    }

    #[test]
    fn test_strips_one_trailing_newline() {
        assert_eq!(tokens("pwd\n"), vec![Token::Word("pwd")]);
        assert!(tokens("\n").is_empty());
    }

    #[test]
    fn test_whitespace_only_line_has_no_tokens() {
        assert!(tokens("").is_empty());
        assert!(tokens("   \t  ").is_empty());
    }

    #[test]
    fn test_classifies_operators() {
        assert_eq!(
            tokens("cat < in >> out > out2 &"),
            vec![
                Token::Word("cat"),
                Token::RedirectLeft,
                Token::Word("in"),
                Token::RedirectAppend,
                Token::Word("out"),
                Token::RedirectRight,
                Token::Word("out2"),
                Token::Background,
            ]
        );
    }

    #[test]
    fn test_operators_glued_to_words_are_words() {
        assert_eq!(
            tokens("echo >out a&"),
            vec![Token::Word("echo"), Token::Word(">out"), Token::Word("a&")]
        );
    }

    #[test]
    fn test_quotes_are_not_special() {
        assert_eq!(
            tokens("echo \"foo bar\""),
            vec![Token::Word("echo"), Token::Word("\"foo"), Token::Word("bar\"")]
        );
    }
}
