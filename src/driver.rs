use std::io::{self, Write};

use crate::ast::ASTNode;
use crate::diagnostics::DiagnosticSink;
use crate::parser::Parser;
use crate::precedence::Precedence;

const PROMPT: &str = "ready> ";

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Summary {
    pub definitions: usize,
    pub externs: usize,
    pub expressions: usize,
    pub errors: usize,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Options {
    /// Print a prompt before each top-level form.
    pub interactive: bool,
    /// Print each parsed form after its status line.
    pub dump_ast: bool,
}

/// Top-level loop: parses forms until end of input, writing one status line
/// per form to `out`. A failed form costs one extra token and the loop goes on.
pub struct Driver<I, S, W> {
    parser: Parser<I, S>,
    out: W,
    options: Options,
}

impl<I, S, W> Driver<I, S, W>
where
    I: Iterator<Item = char>,
    S: DiagnosticSink,
    W: Write,
{
    /// The prompt goes out before the first token is read.
    pub fn new(
        input: I,
        precedence: Precedence,
        sink: S,
        mut out: W,
        options: Options,
    ) -> io::Result<Self> {
        if options.interactive {
            write!(out, "{}", PROMPT)?;
            out.flush()?;
        }
        Ok(Self {
            parser: Parser::new(input, precedence, sink),
            out,
            options,
        })
    }

    pub fn run(&mut self) -> io::Result<Summary> {
        let mut summary = Summary::default();

        while let Some(item) = self.parser.next_item() {
            match item {
                Ok(node) => self.handle(&node, &mut summary)?,
                Err(_) => {
                    summary.errors += 1;
                    self.parser.recover();
                }
            }

            if self.options.interactive {
                write!(self.out, "{}", PROMPT)?;
                self.out.flush()?;
            }
        }

        if self.options.interactive {
            writeln!(self.out)?;
        }
        Ok(summary)
    }

    fn handle(&mut self, node: &ASTNode, summary: &mut Summary) -> io::Result<()> {
        let status = match node {
            ASTNode::Extern(_) => {
                summary.externs += 1;
                "Parsed an extern."
            }
            ASTNode::Function(func) if func.is_anonymous() => {
                summary.expressions += 1;
                "Parsed a top-level expression."
            }
            ASTNode::Function(_) => {
                summary.definitions += 1;
                "Parsed a function definition."
            }
        };
        writeln!(self.out, "{}", status)?;

        if self.options.dump_ast {
            writeln!(self.out, "{}", node)?;
        }
        Ok(())
    }

    pub fn into_parts(self) -> (Parser<I, S>, W) {
        (self.parser, self.out)
    }
}
