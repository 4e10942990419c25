use crate::command::{Invocation, OutputMode, OutputTarget};
use crate::lexer::{self, Token};
use std::collections::TryReserveError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while turning a line into an [`Invocation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A redirection operator was the last token, so it has no file name.
    #[error("syntax error: {0} cannot be the last token")]
    MissingOperand(&'static str),
    /// `&` appeared somewhere other than the end of the line.
    #[error("syntax error: & must be the last token")]
    MisplacedBackground,
    /// The line has more tokens than the configured limit.
    #[error("too many tokens (max {limit})")]
    TooManyTokens { limit: usize },
    /// Memory for the result could not be allocated.
    #[error("cannot allocate memory for command: {0}")]
    Resource(#[from] TryReserveError),
}

impl ParseError {
    /// Whether this error describes malformed input rather than a resource problem.
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, ParseError::MissingOperand(_) | ParseError::MisplacedBackground)
    }
}

/// Line parser with an optional limit on the number of tokens per line.
///
/// The default parser has no limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    pub max_tokens: Option<usize>,
}

impl Parser {
    pub fn new(max_tokens: Option<usize>) -> Self {
        Self { max_tokens }
    }

    /// Parses one input line.
    ///
    /// Returns `Ok(None)` when there is nothing to run: the line is blank, or it
    /// only holds redirections and `&`. Referenced files are not checked here.
    pub fn parse(&self, line: &str) -> Result<Option<Invocation>, ParseError> {
        let tokens: Vec<Token<'_>> = lexer::split_into_tokens(line).collect();
        if let Some(limit) = self.max_tokens {
            if tokens.len() > limit {
                return Err(ParseError::TooManyTokens { limit });
            }
        }
        InvocationBuilder::from(tokens).build()
    }
}

/// Parses one input line with the default [`Parser`].
pub fn parse(line: &str) -> Result<Option<Invocation>, ParseError> {
    Parser::default().parse(line)
}

struct InvocationBuilder<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    arguments: Vec<String>,
    input_source: Option<PathBuf>,
    output_target: Option<OutputTarget>,
    background: bool,
}

impl<'a> InvocationBuilder<'a> {
    fn from(tokens: Vec<Token<'a>>) -> Self {
        InvocationBuilder {
            tokens,
            pos: 0,
            arguments: Vec::new(),
            input_source: None,
            output_target: None,
            background: false,
        }
    }

    fn build(mut self) -> Result<Option<Invocation>, ParseError> {
        while let Some(token) = self.consume() {
            match token {
                Token::RedirectLeft => {
                    let path = self.operand("<")?;
                    self.input_source = Some(path);
                }
                Token::RedirectRight => {
                    let path = self.operand(">")?;
                    self.output_target = Some(OutputTarget {
                        path,
                        mode: OutputMode::Truncate,
                    });
                }
                Token::RedirectAppend => {
                    let path = self.operand(">>")?;
                    self.output_target = Some(OutputTarget {
                        path,
                        mode: OutputMode::Append,
                    });
                }
                Token::Background => {
                    if self.peek().is_some() {
                        return Err(ParseError::MisplacedBackground);
                    }
                    self.background = true;
                }
                Token::Word(word) => {
                    self.arguments.try_reserve(1)?;
                    self.arguments.push(owned(word)?);
                }
            }
        }

        if self.arguments.is_empty() {
            return Ok(None);
        }
        Ok(Some(Invocation {
            arguments: self.arguments,
            input_source: self.input_source,
            output_target: self.output_target,
            background: self.background,
        }))
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn consume(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Takes the file name following a redirection operator, whatever it is.
    fn operand(&mut self, operator: &'static str) -> Result<PathBuf, ParseError> {
        match self.consume() {
            Some(target) => Ok(PathBuf::from(owned(target.as_str())?)),
            None => Err(ParseError::MissingOperand(operator)),
        }
    }
}

fn owned(text: &str) -> Result<String, TryReserveError> {
    let mut s = String::new();
    s.try_reserve_exact(text.len())?;
    s.push_str(text);
    Ok(s)
}
