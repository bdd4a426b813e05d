use crate::process::Process;
use pest::Parser;
use pest_derive::Parser;
use std::mem;
use thiserror::Error;
use tracing::debug;

#[derive(Parser)]
#[grammar = "yash.pest"]
pub struct CommandParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    InputRedirect,
    OutputRedirect,
    ErrorRedirect,
    Pipe,
    Background,
    Word(&'a str),
}

impl Token<'_> {
    pub fn symbol(&self) -> &'static str {
        match self {
            Token::InputRedirect => "<",
            Token::OutputRedirect => ">",
            Token::ErrorRedirect => "2>",
            Token::Pipe => "|",
            Token::Background => "&",
            Token::Word(_) => "word",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("`{0}` needs to be placed between two command tokens")]
    MisplacedOperator(&'static str),

    #[error("`&` can only be placed at the end of a command")]
    MisplacedBackground,

    #[error("`{0}` needs a file name")]
    MissingFilename(&'static str),

    #[error("missing command")]
    EmptyCommand,

    #[error("only two commands can be piped together")]
    TooManyStages,

    #[error("{0}")]
    Grammar(String),
}

/// Result of parsing one command line: one process, or two joined by a pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub first: Process,
    pub second: Option<Process>,
    pub background: bool,
}

pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let pairs = CommandParser::parse(Rule::line, input)
        .map_err(|err| ParseError::Grammar(err.to_string()))?;

    let mut tokens = Vec::new();
    for pair in pairs.flat_map(|pair| pair.into_inner()) {
        let token = match pair.as_rule() {
            Rule::redirect_in => Token::InputRedirect,
            Rule::redirect_out => Token::OutputRedirect,
            Rule::redirect_err => Token::ErrorRedirect,
            Rule::pipe => Token::Pipe,
            Rule::background => Token::Background,
            Rule::word => Token::Word(pair.as_str()),
            _ => continue,
        };
        tokens.push(token);
    }
    Ok(tokens)
}

/// Parse a raw line. Returns `Ok(None)` for a blank line.
pub fn parse_command(input: &str) -> Result<Option<CommandLine>, ParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok(None);
    }
    let line = parse_tokens(&tokens)?;
    debug!("parsed {:?} -> {:?}", input, line);
    Ok(Some(line))
}

pub fn parse_tokens(tokens: &[Token<'_>]) -> Result<CommandLine, ParseError> {
    let mut current = Process::default();
    let mut first: Option<Process> = None;
    let mut background = false;
    // tokens consumed by the process currently being built
    let mut segment_len = 0;

    let mut iter = tokens.iter().enumerate();
    while let Some((idx, token)) = iter.next() {
        let is_last = idx + 1 == tokens.len();
        match *token {
            Token::Word(word) => {
                current.argv.push(word.to_string());
                segment_len += 1;
            }
            Token::Background => {
                if !is_last {
                    return Err(ParseError::MisplacedBackground);
                }
                background = true;
            }
            Token::Pipe => {
                if segment_len == 0 || is_last {
                    return Err(ParseError::MisplacedOperator(token.symbol()));
                }
                if first.is_some() {
                    return Err(ParseError::TooManyStages);
                }
                if current.argv.is_empty() {
                    return Err(ParseError::EmptyCommand);
                }
                first = Some(mem::take(&mut current));
                segment_len = 0;
            }
            Token::InputRedirect | Token::OutputRedirect | Token::ErrorRedirect => {
                if segment_len == 0 || is_last {
                    return Err(ParseError::MisplacedOperator(token.symbol()));
                }
                let path = match iter.next() {
                    Some((_, Token::Word(path))) => path.to_string(),
                    _ => return Err(ParseError::MissingFilename(token.symbol())),
                };
                match token {
                    Token::InputRedirect => current.stdin_file = Some(path),
                    Token::OutputRedirect => current.stdout_file = Some(path),
                    _ => current.stderr_file = Some(path),
                }
                segment_len += 2;
            }
        }
    }

    if current.argv.is_empty() {
        return Err(ParseError::EmptyCommand);
    }

    let line = match first {
        Some(first) => CommandLine {
            first,
            second: Some(current),
            background,
        },
        None => CommandLine {
            first: current,
            second: None,
            background,
        },
    };
    Ok(line)
}
