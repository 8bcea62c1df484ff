//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) must convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! Diagnostics reach the user through [`ErrorReporter`], the per-session error
//! sink consulted by the driver at phase boundaries.

use std::cell::Cell;
use std::io;

use log::info;
use thiserror::Error;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("[line {line}] Error: {message}")]
    Resolve { message: String, line: usize },

    /// Runtime evaluation error, reported with the originating token's line.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        LoxError::Parse { message, line }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", line, message);

        LoxError::Resolve { message, line }
    }

    /// Helper constructor for the **evaluator**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", line, message);

        LoxError::Runtime { message, line }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Shared error sink for one interpreter session.
///
/// Tracks the two flags the driver maps to exit codes and writes diagnostics
/// to standard error.  The REPL clears `had_error` between prompts so later
/// lines can still execute.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    had_error: Cell<bool>,
    had_runtime_error: Cell<bool>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a diagnostic anchored at a token (parser and resolver errors).
    pub fn error_token(&self, token: &Token, message: &str) {
        if token.token_type == TokenType::EOF {
            self.report(token.line, " at end", message);
        } else {
            self.report(token.line, &format!(" at '{}'", token.lexeme), message);
        }
    }

    /// Report an already-formatted static error (e.g. from the scanner
    /// iterator) and set the static error flag.
    pub fn static_error(&self, err: &LoxError) {
        self.had_error.set(true);

        eprintln!("{}", err);
    }

    /// Report a runtime error and set the runtime error flag.
    pub fn runtime_error(&self, err: &LoxError) {
        self.had_runtime_error.set(true);

        eprintln!("{}", err);
    }

    fn report(&self, line: usize, origin: &str, message: &str) {
        self.had_error.set(true);

        eprintln!("[line {}] Error{}: {}", line, origin, message);
    }

    #[inline]
    pub fn had_error(&self) -> bool {
        self.had_error.get()
    }

    #[inline]
    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error.get()
    }

    /// Clear the static error flag between REPL prompts.
    pub fn reset(&self) {
        self.had_error.set(false);
    }
}
