//! # tokline
//!
//! tokline is an interpreter for a small, statically typed imperative
//! scripting language. Instead of building a syntax tree it keeps every
//! statement as a line of prioritized tokens and repeatedly reduces the
//! token with the highest priority in place until the line collapses to a
//! single value. Control flow (`if`, `while`, `for`, `goto`, function calls)
//! works by moving an explicit execution position between lines.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
    //missing_docs,
)]
#![allow(clippy::missing_errors_doc)]

use std::io::Write;

use crate::{
    error::Error,
    interpreter::{
        evaluator::core::{Config, Context},
        program::Program,
    },
};

/// Provides unified error types for loading and execution.
///
/// This module defines all errors that can be raised while lexing source
/// text, splitting it into statements, or executing the resulting program. It
/// carries the source line of every failure and maps each error onto a
/// stable [`ErrorKind`](error::ErrorKind).
///
/// # Responsibilities
/// - Defines error enums for both phases (loading and execution).
/// - Attaches line numbers and detailed messages for context.
/// - Supports integration with standard error handling traits.
pub mod error;
/// Orchestrates the entire process of code execution.
///
/// This module ties together the lexer, the statement loader, the token line
/// structure, the symbol and function tables, and the reduction engine.
///
/// # Responsibilities
/// - Turns source text into a [`Program`] of token lines and labels.
/// - Executes programs one reduction step at a time.
/// - Manages the flow of data and errors between phases.
pub mod interpreter;
/// General utilities for safe numeric conversion and helpers.
///
/// # Responsibilities
/// - Safely convert between `i64`, `u32`, `usize`, and `f64` without silent
///   data loss.
/// - Provide general utility functions used in multiple modules.
pub mod util;

/// Loads and runs `source`, printing to standard output.
///
/// # Errors
/// Returns an error if loading fails or if any runtime error occurs.
///
/// # Examples
/// ```
/// use tokline::run;
///
/// assert!(run("int x = 2 + 2").is_ok());
///
/// // `y` is not declared.
/// assert!(run("int x = y + 1").is_err());
/// ```
pub fn run(source: &str) -> Result<(), Error> {
    run_with(source, Config::default(), Box::new(std::io::stdout())).map(|_| ())
}

/// Loads and runs `source` with explicit settings and output sink, and
/// returns the final context for inspection.
///
/// # Errors
/// Returns an error if loading fails or if any runtime error occurs.
///
/// # Examples
/// ```
/// use tokline::{interpreter::{evaluator::core::Config, value::core::Value}, run_with};
///
/// let context = run_with("int x = (2 + 3) * 4", Config::default(), Box::new(std::io::sink())).unwrap();
/// assert_eq!(context.variable("x"), Some(&Value::Int(20)));
/// ```
pub fn run_with(source: &str, config: Config, output: Box<dyn Write>) -> Result<Context, Error> {
    let program = Program::from_source(source)?;
    let mut context = Context::with_config(program, config, output);
    context.run()?;
    Ok(context)
}

/// Helpers for tests that want to see the interpreter's log output.
pub mod test_utils {
    /// Installs a `tracing` subscriber that writes through the test harness.
    ///
    /// The level comes from `RUST_LOG` and defaults to `debug`. Calling it
    /// more than once is harmless.
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        let _ = fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
                     .with_test_writer()
                     .try_init();
    }
}
