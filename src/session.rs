//! Driver facade: one [`Session`] owns one interpreter and runs source
//! strings through the whole pipeline (scan → parse → resolve → interpret).
//!
//! Contract for incremental (REPL-style) use:
//! - the **global environment persists** across `run` calls by design, so
//!   later lines see earlier definitions;
//! - per-run **diagnostics reset** at the start of every `run`;
//! - the expression-id counter is threaded from run to run so hop counts
//!   recorded for functions defined earlier stay valid.
//!
//! Any scan, parse, or resolve error blocks the later stages for that run.
//! A runtime error halts only the current run; the next `run` starts clean.

use std::io::Write;

use log::info;

use crate::ast::{ExprId, Stmt};
use crate::error::LoxError;
use crate::interpreter::{InterpretError, Interpreter};
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// How a single `run` ended.  The driver maps these to process exit codes
/// (65 for static errors, 70 for runtime errors).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Ran to completion.
    Ok,

    /// Lexical, syntax, or resolution error; evaluation never started.
    StaticError,

    /// Evaluation started and was halted by a runtime error.
    RuntimeError,
}

pub struct Session {
    interpreter: Interpreter,
    next_expr_id: ExprId,
    diagnostics: Vec<LoxError>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Session printing program output to standard output.
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
            next_expr_id: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Session with a custom `print` sink.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(output),
            next_expr_id: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics reported by the most recent [`Self::run`].
    pub fn diagnostics(&self) -> &[LoxError] {
        &self.diagnostics
    }

    fn report(&mut self, error: LoxError) {
        eprintln!("{}", error);

        self.diagnostics.push(error);
    }

    /// Execute one source string front to back.
    pub fn run(&mut self, source: &str) -> Outcome {
        info!("Session run over {} bytes of source", source.len());

        self.diagnostics.clear();

        // 1. Scan.  Lexical errors are collected, scanning continues.
        let mut tokens: Vec<Token> = Vec::new();
        let mut had_lex_error = false;

        for item in Scanner::new(source.as_bytes()) {
            match item {
                Ok(token) => tokens.push(token),

                Err(e) => {
                    had_lex_error = true;
                    self.report(e);
                }
            }
        }

        // 2. Parse.  All syntax errors surface in one pass.
        let mut parser = Parser::with_start_id(&tokens, self.next_expr_id);
        let parsed = parser.parse();
        self.next_expr_id = parser.next_id();

        let statements: Vec<Stmt> = match parsed {
            Ok(statements) => statements,

            Err(errors) => {
                for e in errors {
                    self.report(e);
                }

                return Outcome::StaticError;
            }
        };

        if had_lex_error {
            return Outcome::StaticError;
        }

        // 3. Resolve.  Any static error blocks evaluation.
        let locals = match Resolver::new().resolve(&statements) {
            Ok(locals) => locals,

            Err(errors) => {
                for e in errors {
                    self.report(e);
                }

                return Outcome::StaticError;
            }
        };

        self.interpreter.resolve(locals);

        // 4. Interpret.
        match self.interpreter.interpret(&statements) {
            Ok(()) => Outcome::Ok,

            Err(InterpretError::Runtime { message, line }) => {
                self.report(LoxError::runtime(line, message));

                Outcome::RuntimeError
            }

            Err(InterpretError::Io(e)) => {
                self.report(LoxError::Io(e));

                Outcome::RuntimeError
            }

            // A return signal escaping to the top level would be a resolver
            // bug; treat it as a runtime error rather than panic.
            Err(InterpretError::Return(_)) => {
                self.report(LoxError::runtime(0, "Unexpected 'return' at top level."));

                Outcome::RuntimeError
            }
        }
    }
}
