use crate::config::ShellConfig;
use crate::dispatch::{Dispatcher, report_error};
use crate::env::Environment;
use crate::error::Result;
use crate::parser::classify;
use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, IsTerminal, Write};
use tracing::debug;

/// What the read loop does after a line has been executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// A minimal shell: classify each line by its operators and run it.
///
/// The interpreter owns the shell's [`Environment`] and its [`ShellConfig`].
/// Lines can be fed one at a time with [`Interpreter::execute_line`], or read
/// interactively with [`Interpreter::repl`].
///
/// Example
/// ```no_run
/// use dispatch_shell::{Flow, Interpreter};
/// let mut sh = Interpreter::default();
/// assert_eq!(sh.execute_line("echo hello ## echo world").unwrap(), Flow::Continue);
/// assert_eq!(sh.execute_line("exit").unwrap(), Flow::Exit);
/// ```
pub struct Interpreter {
    env: Environment,
    config: ShellConfig,
}

impl Interpreter {
    /// Create an interpreter rooted at the current working directory.
    pub fn new(config: ShellConfig) -> Self {
        Self {
            env: Environment::new(),
            config,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// `<absolute-cwd>$`
    pub fn prompt(&self) -> String {
        self.env.prompt(&self.config.prompt_suffix)
    }

    /// Classify and run one input line.
    ///
    /// Errors local to the line are reported on stderr and the result is
    /// [`Flow::Continue`]. Only fatal errors (the shell can no longer create
    /// or reap processes) are returned.
    pub fn execute_line(&mut self, line: &str) -> Result<Flow> {
        let mode = classify(line);
        let outcome = Dispatcher::new(&mut self.env, &self.config).dispatch(mode, line);
        match outcome {
            Ok(statuses) => debug!(?mode, ?statuses, "line finished"),
            Err(err) if err.is_fatal() => {
                debug!(error = %err, "fatal error");
                return Err(err);
            }
            Err(err) => report_error(&err),
        }

        if self.env.should_exit {
            println!("{}", self.config.farewell);
            return Ok(Flow::Exit);
        }
        self.env.refresh();
        Ok(Flow::Continue)
    }

    /// Read-eval loop: print the prompt, read a line, run it, until `exit`
    /// or end of input.
    ///
    /// A terminal gets the line editor; any other stdin is read line by line
    /// through [`Interpreter::run_script`].
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return self.run_script(stdin.lock(), &mut io::stdout());
        }

        let mut rl = DefaultEditor::new().context("failed to set up the line editor")?;

        loop {
            match rl.readline(&self.prompt()) {
                Ok(line) => {
                    if self.config.history && !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    let flow = self
                        .execute_line(&line)
                        .context("cannot continue running commands")?;
                    if flow == Flow::Exit {
                        break;
                    }
                }
                // Ctrl-C at the prompt drops the line, not the shell.
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    println!("{}", self.config.farewell);
                    break;
                }
                Err(err) => return Err(err).context("failed to read input"),
            }
        }

        Ok(())
    }

    /// Run every line of `input`, writing the prompt to `out` before each read.
    /// End of input ends the loop like `exit`.
    pub fn run_script<R: BufRead>(
        &mut self,
        mut input: R,
        out: &mut dyn Write,
    ) -> anyhow::Result<()> {
        let mut line = String::new();
        loop {
            write!(out, "{}", self.prompt()).context("failed to write the prompt")?;
            out.flush().context("failed to write the prompt")?;

            line.clear();
            if input.read_line(&mut line).context("failed to read input")? == 0 {
                println!("{}", self.config.farewell);
                return Ok(());
            }
            let flow = self
                .execute_line(&line)
                .context("cannot continue running commands")?;
            if flow == Flow::Exit {
                return Ok(());
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(ShellConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CwdGuard, process_lock};
    use std::fs;

    #[test]
    fn test_exit_stops_the_loop() {
        let mut sh = Interpreter::default();
        assert_eq!(sh.execute_line("exit").unwrap(), Flow::Exit);
        assert!(sh.env().should_exit);
    }

    #[test]
    fn test_exit_with_newline_stops_the_loop() {
        let mut sh = Interpreter::default();
        assert_eq!(sh.execute_line("exit\n").unwrap(), Flow::Exit);
    }

    #[test]
    fn test_prompt_is_cwd_and_dollar() {
        let _lock = process_lock();
        let sh = Interpreter::default();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(sh.prompt(), format!("{}$", cwd.display()));
    }

    #[test]
    fn test_cd_changes_next_prompt() {
        let _lock = process_lock();
        let _cwd = CwdGuard::new();
        let tmp = std::path::Path::new("/tmp").canonicalize().unwrap();

        let mut sh = Interpreter::default();
        assert_eq!(sh.execute_line("cd /tmp").unwrap(), Flow::Continue);
        assert_eq!(sh.prompt(), format!("{}$", tmp.display()));
    }

    #[test]
    fn test_script_prints_prompt_before_each_read() {
        let _lock = process_lock();
        let _cwd = CwdGuard::new();
        let start = std::env::current_dir().unwrap();
        let tmp = std::path::Path::new("/tmp").canonicalize().unwrap();

        let mut sh = Interpreter::default();
        let mut out = Vec::new();
        sh.run_script("cd /tmp\nexit\n".as_bytes(), &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, format!("{}${}$", start.display(), tmp.display()));
    }

    #[test]
    fn test_script_ends_at_end_of_input() {
        let _lock = process_lock();
        let mut sh = Interpreter::default();
        let mut out = Vec::new();
        sh.run_script("true\n\n".as_bytes(), &mut out).unwrap();

        let prompt = sh.prompt();
        assert_eq!(String::from_utf8(out).unwrap(), prompt.repeat(3));
    }

    #[test]
    fn test_local_errors_do_not_stop_the_shell() {
        let _lock = process_lock();
        let mut sh = Interpreter::default();
        assert_eq!(sh.execute_line("echo >").unwrap(), Flow::Continue);
        assert_eq!(sh.execute_line("> nowhere").unwrap(), Flow::Continue);
        assert_eq!(
            sh.execute_line(&vec!["true"; 11].join("|")).unwrap(),
            Flow::Continue
        );
        assert_eq!(
            sh.execute_line("no-such-command-here-4711").unwrap(),
            Flow::Continue
        );
        assert_eq!(
            sh.execute_line("cd /definitely/not/here/4711").unwrap(),
            Flow::Continue
        );
    }

    #[test]
    fn test_lines_run_against_shared_state() {
        let _lock = process_lock();
        let _cwd = CwdGuard::new();
        let tmp = tempfile::tempdir().unwrap();

        let mut sh = Interpreter::default();
        sh.execute_line(&format!("cd {}", tmp.path().display()))
            .unwrap();
        sh.execute_line("echo first > out.txt").unwrap();
        sh.execute_line("cat out.txt | tr a-z A-Z | dd of=upper.txt status=none")
            .unwrap();

        assert_eq!(
            fs::read_to_string(tmp.path().join("upper.txt")).unwrap(),
            "FIRST\n"
        );
    }

    #[test]
    fn test_custom_config_is_used() {
        let _lock = process_lock();
        let config = ShellConfig::default()
            .with_prompt_suffix("%")
            .with_max_pipeline_stages(1);
        let mut sh = Interpreter::new(config);
        assert!(sh.prompt().ends_with('%'));
        assert_eq!(sh.config().max_pipeline_stages, 1);
        assert_eq!(sh.execute_line("true | true").unwrap(), Flow::Continue);
    }
}
