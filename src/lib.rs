//! A small Unix shell that picks its execution strategy from operators in the line.
//!
//! Each input line is classified by the operator it contains and run by one
//! of five strategies:
//!
//! - no operator: a single command;
//! - `a && b`: all commands started at once, then all reaped;
//! - `a ## b`: commands run one after another;
//! - `cmd > file`: standard output written to `file`;
//! - `a | b | c`: a pipeline of at most ten stages by default.
//!
//! `cd` is handled in the shell process and `exit` ends the session. There is
//! no quoting, globbing or variable expansion: words are separated by
//! whitespace and operators are matched as plain substrings.
//!
//! The main entry point is [`Interpreter`]. The lower layers ([`parser`],
//! [`lexer`], [`external`], [`dispatch`]) are public so they can be driven
//! directly.

mod builtin;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod external;
pub mod io_adapters;
mod interpreter;
pub mod lexer;
pub mod parser;
pub mod signals;

#[cfg(test)]
mod test_support;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::{Flow, Interpreter};
pub use config::ShellConfig;
pub use error::{Result, ShellError};
