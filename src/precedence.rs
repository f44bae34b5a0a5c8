use std::collections::HashMap;
use std::str::FromStr;

/// Characters the lexer never hands out as `Token::Char`, or that the grammar
/// already gives a meaning to.
const RESERVED: &[char] = &['(', ')', ',', ';', '#', '.'];

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum PrecedenceError {
    #[error("expected OP=PREC, found `{0}`")]
    MissingEquals(String),
    #[error("operator must be a single character, found `{0}`")]
    NotOneChar(String),
    #[error("`{0}` cannot be used as a binary operator")]
    Reserved(char),
    #[error("invalid precedence `{0}`")]
    InvalidPrecedence(String),
}

/// Binding strength of each binary operator. Higher binds tighter; absent or
/// non-positive entries are not operators.
#[derive(Debug, PartialEq, Clone)]
pub struct Precedence {
    table: HashMap<char, i32>,
}

impl Default for Precedence {
    fn default() -> Self {
        Self::empty()
            .with('<', 10)
            .with('+', 20)
            .with('-', 20)
            .with('*', 40)
    }
}

impl Precedence {
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn with(mut self, op: char, precedence: i32) -> Self {
        self.insert(op, precedence);
        self
    }

    pub fn insert(&mut self, op: char, precedence: i32) {
        self.table.insert(op, precedence);
    }

    pub fn get(&self, op: char) -> Option<i32> {
        self.table.get(&op).copied().filter(|p| *p > 0)
    }
}

impl FromIterator<(char, i32)> for Precedence {
    fn from_iter<T: IntoIterator<Item = (char, i32)>>(iter: T) -> Self {
        Self {
            table: iter.into_iter().collect(),
        }
    }
}

impl Extend<(char, i32)> for Precedence {
    fn extend<T: IntoIterator<Item = (char, i32)>>(&mut self, iter: T) {
        self.table.extend(iter);
    }
}

/// One `OP=PREC` entry, as given on the command line.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct OperatorSpec {
    pub op: char,
    pub precedence: i32,
}

impl FromStr for OperatorSpec {
    type Err = PrecedenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (op, precedence) = s
            .rsplit_once('=')
            .ok_or_else(|| PrecedenceError::MissingEquals(s.to_string()))?;

        let mut chars = op.chars();
        let op = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return Err(PrecedenceError::NotOneChar(op.to_string())),
        };
        if op.is_alphanumeric() || op.is_whitespace() || RESERVED.contains(&op) {
            return Err(PrecedenceError::Reserved(op));
        }

        let precedence = precedence
            .trim()
            .parse()
            .map_err(|_| PrecedenceError::InvalidPrecedence(precedence.to_string()))?;

        Ok(Self { op, precedence })
    }
}

impl From<OperatorSpec> for (char, i32) {
    fn from(spec: OperatorSpec) -> Self {
        (spec.op, spec.precedence)
    }
}
