//! Tree-walking interpreter for the Lox language.
//!
//! The pipeline runs in four stages — scanning, parsing, static resolution
//! and evaluation — sharing one [`error::ErrorReporter`] sink. Errors from an
//! earlier stage suppress the later ones; runtime errors abort the current
//! program but not the session.
//!
//! [`Lox`] is the embedding surface used by both the CLI driver and the
//! integration tests:
//!
//! ```
//! use rox::{Lox, Mode};
//!
//! let mut output: Vec<u8> = Vec::new();
//! let mut lox = Lox::new(&mut output);
//! lox.run(b"print 1 + 2;", Mode::File);
//!
//! assert_eq!(output, b"3\n");
//! ```

pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use std::io::Write;

use crate::error::ErrorReporter;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// How a source fragment is being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// A whole script: statements only, errors are fatal to the run.
    File,

    /// One interactive line: a trailing expression may omit its `;` and its
    /// value is echoed.
    Repl,
}

/// One interpreter session: globals and the resolution side-table persist
/// across `run` calls, so REPL lines build on each other.
pub struct Lox<'o, W: Write> {
    reporter: ErrorReporter,
    interpreter: Interpreter<'o, W>,
}

impl<'o, W: Write> Lox<'o, W> {
    pub fn new(output: &'o mut W) -> Self {
        Lox {
            reporter: ErrorReporter::new(),
            interpreter: Interpreter::new(output),
        }
    }

    /// Run one source fragment through the full pipeline.
    pub fn run(&mut self, source: &[u8], mode: Mode) {
        let mut tokens: Vec<Token> = Vec::new();

        for item in Scanner::new(source) {
            match item {
                Ok(token) => tokens.push(token),

                Err(err) => self.reporter.static_error(&err),
            }
        }

        let mut parser = Parser::new(tokens, &self.reporter, mode == Mode::Repl);
        let statements = parser.parse();

        if self.reporter.had_error() {
            return;
        }

        let mut resolver = Resolver::new(&mut self.interpreter, &self.reporter);
        resolver.resolve(&statements);

        if self.reporter.had_error() {
            return;
        }

        self.interpreter
            .interpret(&self.reporter, &statements, mode == Mode::Repl);
    }

    #[inline]
    pub fn had_error(&self) -> bool {
        self.reporter.had_error()
    }

    #[inline]
    pub fn had_runtime_error(&self) -> bool {
        self.reporter.had_runtime_error()
    }

    /// Clear the static error flag so the next REPL line can execute.
    pub fn reset_error(&mut self) {
        self.reporter.reset();
    }
}
