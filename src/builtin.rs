use crate::command::ExitCode;
use crate::env::Environment;
use crate::error::Result;
use argh::{EarlyExit, FromArgs};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Built-in commands run inside the shell process.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// without spawning a child process. They exist because their effect has to
/// outlive the command: a child changing its own directory changes nothing
/// for the shell.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd".
    fn name() -> &'static str;

    /// Executes the command against the shell's own state.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

/// Parse `args` (without the command name) as `T` and execute it.
///
/// `--help` output goes to `stdout`; a usage error goes to `stderr` and
/// yields exit code 1, like any other failing command.
pub(crate) fn run_builtin<T: BuiltinCommand>(
    args: &[String],
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
    env: &mut Environment,
) -> Result<ExitCode> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match T::from_args(&[T::name()], &args) {
        Ok(cmd) => cmd.execute(stdout, env),
        Err(EarlyExit { output, status }) => match status {
            Ok(()) => {
                let _ = writeln!(stdout, "{}", output.trim_end());
                Ok(0)
            }
            Err(()) => {
                let _ = writeln!(stderr, "{}", output.trim_end());
                Ok(1)
            }
        },
    }
}

#[derive(FromArgs)]
/// Change the working directory of the shell.
/// Without a target the directory is left unchanged.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    /// Operands after the first are ignored.
    pub operands: Vec<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let Some(target) = self.operands.into_iter().next().filter(|t| !t.is_empty()) else {
            return Ok(0);
        };
        env.change_dir(Path::new(&target))?;
        debug!(dir = %env.current_dir.display(), "changed directory");
        Ok(0)
    }
}
