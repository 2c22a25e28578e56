//! Whitespace tokenizer turning one sub-command into an exec-ready argument vector.

use crate::command::ArgumentVector;
use crate::error::Result;

/// Name of the only built-in intercepted before any process is spawned.
pub const CHANGE_DIR: &str = "cd";

/// Result of tokenizing a single sub-command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tokenized {
    /// The command was empty or whitespace only. Nothing to run.
    Empty,
    /// The first word was `cd`. Holds the words that followed it.
    ///
    /// The directory change must happen in the shell process itself, so this
    /// never becomes a child.
    ChangeDir(Vec<String>),
    /// An external program to spawn.
    Command(ArgumentVector),
}

/// Splits `cmd` on whitespace.
///
/// The input is not modified and the function keeps no state between calls,
/// so any slice of a line can be tokenized in any order. There is no quoting:
/// every run of non-whitespace characters is one word.
pub fn tokenize(cmd: &str) -> Result<Tokenized> {
    let mut words = cmd.split_whitespace();
    let first = match words.next() {
        Some(first) => first,
        None => return Ok(Tokenized::Empty),
    };

    if first == CHANGE_DIR {
        return Ok(Tokenized::ChangeDir(words.map(str::to_owned).collect()));
    }

    match ArgumentVector::new(std::iter::once(first).chain(words))? {
        Some(argv) => Ok(Tokenized::Command(argv)),
        None => Ok(Tokenized::Empty),
    }
}
