//! Classification of a raw input line into an execution mode.
//!
//! Operators are plain substrings. There is no escaping, so an operator
//! character inside what the user meant as an argument is still an operator.

/// Separator of commands started together and reaped together.
pub const PARALLEL_OP: &str = "&&";
/// Separator of commands run one after another.
pub const SEQUENTIAL_OP: &str = "##";
/// Splits a command from the file receiving its standard output.
pub const REDIRECT_OP: &str = ">";
/// Separator of pipeline stages.
pub const PIPE_OP: &str = "|";

/// Directive terminating the shell. Only recognized as the whole line.
pub const EXIT_DIRECTIVE: &str = "exit";

/// How a line is going to be executed.
///
/// Exactly one mode applies to a line and it is never changed once dispatch
/// has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Exit,
    /// One command, no operator.
    Single,
    /// `a && b`: start everything, then reap everything.
    Parallel,
    /// `a ## b`: run and reap one at a time.
    Sequential,
    /// `a > file`: one command with stdout sent to a file.
    Redirected,
    /// `a | b | c`: stages chained through pipes.
    Pipeline,
}

impl ExecutionMode {
    /// The operator that separates sub-commands in this mode.
    pub fn operator(&self) -> Option<&'static str> {
        match self {
            ExecutionMode::Parallel => Some(PARALLEL_OP),
            ExecutionMode::Sequential => Some(SEQUENTIAL_OP),
            ExecutionMode::Redirected => Some(REDIRECT_OP),
            ExecutionMode::Pipeline => Some(PIPE_OP),
            ExecutionMode::Exit | ExecutionMode::Single => None,
        }
    }
}

/// Checked in order; the first operator found decides the mode.
const PRECEDENCE: [ExecutionMode; 4] = [
    ExecutionMode::Parallel,
    ExecutionMode::Sequential,
    ExecutionMode::Redirected,
    ExecutionMode::Pipeline,
];

/// Removes a single trailing newline, the way a line read from a stream ends.
pub fn strip_newline(line: &str) -> &str {
    line.strip_suffix('\n').unwrap_or(line)
}

/// Decide the execution mode of a raw input line.
pub fn classify(line: &str) -> ExecutionMode {
    let line = strip_newline(line);
    if line == EXIT_DIRECTIVE {
        return ExecutionMode::Exit;
    }

    PRECEDENCE
        .into_iter()
        .find(|mode| mode.operator().is_some_and(|op| line.contains(op)))
        .unwrap_or(ExecutionMode::Single)
}

/// Split a line on `operator` into trimmed sub-commands, dropping empty ones.
pub fn split_subcommands<'a>(line: &'a str, operator: &str) -> Vec<&'a str> {
    strip_newline(line)
        .split(operator)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Split a redirection line on its first `>` into the command part and the
/// trimmed file name. A line without `>` yields an empty file name.
pub fn split_redirect(line: &str) -> (&str, &str) {
    match strip_newline(line).split_once(REDIRECT_OP) {
        Some((command, target)) => (command.trim(), target.trim()),
        None => (strip_newline(line).trim(), ""),
    }
}
