use std::fmt;
use std::io::BufRead;

use lazy_static::lazy_static;
use regex::Regex;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Eof,
    Def,
    Extern,
    Ident(String),
    Number(f64),
    /// Any other single character: punctuation and operators.
    Char(char),
}

impl Token {
    pub fn is_char(&self, c: char) -> bool {
        *self == Token::Char(c)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => write!(f, "end of input"),
            Token::Def => write!(f, "'def'"),
            Token::Extern => write!(f, "'extern'"),
            Token::Ident(name) => write!(f, "identifier `{}`", name),
            Token::Number(num) => write!(f, "number {}", num),
            Token::Char(c) => write!(f, "'{}'", c),
        }
    }
}

/// Line and column (both 1-based) of a character in the input.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

lazy_static! {
    static ref NUMBER_PREFIX_RE: Regex = Regex::new(r"^[0-9]*(\.[0-9]*)?").unwrap();
}

/// Convert the longest numeric prefix of `text`, the way `strtod` does.
///
/// Returns the value and whether anything after the prefix was dropped.
fn parse_number_prefix(text: &str) -> (f64, bool) {
    let prefix = NUMBER_PREFIX_RE
        .find(text)
        .map(|m| m.as_str())
        .unwrap_or("");
    let value = prefix.parse().unwrap_or(0.0);
    (value, prefix.len() < text.len())
}

/// Pull-based tokenizer over a character stream.
///
/// Holds exactly one character of lookahead between calls to
/// [`Lexer::next_token`]. `None` in the lookahead means the input is exhausted,
/// after which the underlying iterator is never polled again.
pub struct Lexer<I> {
    chars: I,
    last_char: Option<char>,
    ident_buf: String,
    number_buf: String,
    cursor: Position,
    token_start: Position,
}

impl<I: Iterator<Item = char>> Lexer<I> {
    pub fn new(chars: I) -> Self {
        Self {
            chars,
            // primed with whitespace so the first call reads the first real character
            last_char: Some(' '),
            ident_buf: String::new(),
            number_buf: String::new(),
            cursor: Position { line: 1, column: 0 },
            token_start: Position { line: 1, column: 0 },
        }
    }

    /// Where the most recently produced token started.
    pub fn position(&self) -> Position {
        self.token_start
    }

    fn bump(&mut self) {
        if self.last_char.is_none() {
            return;
        }
        let prev = self.last_char;
        self.last_char = self.chars.next();

        // `\n`, `\r\n` and a lone `\r` each end one line
        let newline = prev == Some('\n') || (prev == Some('\r') && self.last_char != Some('\n'));
        if newline {
            self.cursor.line += 1;
            self.cursor.column = 1;
        } else {
            self.cursor.column += 1;
        }
    }

    pub fn next_token(&mut self) -> Token {
        let token = self.scan();
        log::trace!("{} at {}", token, self.token_start);
        token
    }

    fn scan(&mut self) -> Token {
        loop {
            while matches!(self.last_char, Some(c) if c.is_whitespace()) {
                self.bump();
            }
            self.token_start = self.cursor;

            let c = match self.last_char {
                Some(c) => c,
                None => return Token::Eof,
            };

            if c.is_alphabetic() {
                self.ident_buf.clear();
                while let Some(c) = self.last_char.filter(|c| c.is_alphanumeric()) {
                    self.ident_buf.push(c);
                    self.bump();
                }
                return match self.ident_buf.as_str() {
                    "def" => Token::Def,
                    "extern" => Token::Extern,
                    ident => Token::Ident(ident.to_string()),
                };
            }

            if c.is_ascii_digit() || c == '.' {
                self.number_buf.clear();
                while let Some(c) = self.last_char.filter(|c| c.is_ascii_digit() || *c == '.') {
                    self.number_buf.push(c);
                    self.bump();
                }
                let (value, truncated) = parse_number_prefix(&self.number_buf);
                if truncated {
                    log::warn!(
                        "{}: malformed number `{}` read as {}",
                        self.token_start,
                        self.number_buf,
                        value
                    );
                }
                return Token::Number(value);
            }

            if c == '#' {
                while !matches!(self.last_char, None | Some('\n') | Some('\r')) {
                    self.bump();
                }
                continue;
            }

            self.bump();
            return Token::Char(c);
        }
    }
}

impl<I: Iterator<Item = char>> Iterator for Lexer<I> {
    type Item = Token;

    /// Yields tokens up to, but not including, end of input.
    fn next(&mut self) -> Option<Token> {
        match self.next_token() {
            Token::Eof => None,
            token => Some(token),
        }
    }
}

/// lex the whole input - the last token is always `Token::Eof`
pub fn lex(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input.chars());
    let mut tokens: Vec<Token> = lexer.by_ref().collect();
    tokens.push(Token::Eof);
    tokens
}

/// Lazily reads a `BufRead` one line at a time and yields its characters.
///
/// Nothing is read until a character is asked for, so an interactive prompt can
/// be shown before the read blocks. A read failure ends the stream.
pub struct ReadChars<R> {
    reader: R,
    line: Vec<char>,
    next: usize,
    done: bool,
}

impl<R: BufRead> ReadChars<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            next: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for ReadChars<R> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        while self.next >= self.line.len() {
            if self.done {
                return None;
            }
            let mut buf = String::new();
            match self.reader.read_line(&mut buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line = buf.chars().collect();
                    self.next = 0;
                }
                Err(e) => {
                    log::error!("failed to read input: {}", e);
                    self.done = true;
                }
            }
        }
        let c = self.line[self.next];
        self.next += 1;
        Some(c)
    }
}
