//! Front end for a small expression language: a pull-based tokenizer, a
//! precedence-climbing parser and the AST they build.

pub mod ast;
pub mod diagnostics;
pub mod driver;
pub mod lexer;
pub mod parser;
pub mod precedence;

pub use ast::{ASTNode, Expression, Function, Prototype};
pub use diagnostics::{DiagnosticSink, LogSink};
pub use driver::{Driver, Options, Summary};
pub use lexer::{lex, Lexer, Position, ReadChars, Token};
pub use parser::{ParseResult, Parser, ParserError};
pub use precedence::{OperatorSpec, Precedence, PrecedenceError};
