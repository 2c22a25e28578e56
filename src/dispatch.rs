//! Execution strategies, one per [`ExecutionMode`].
//!
//! Every strategy follows the same outline: split the line on the mode's
//! operator, trim the pieces, skip empty ones, tokenize each piece, run `cd`
//! in the shell process and fork everything else. They differ in how
//! descriptors are wired and in when children are reaped.
//!
//! Each strategy returns the statuses of the children it reaped, in spawn
//! order. Only [`Dispatcher::run_redirected`] shows them to the user.

use crate::builtin::{Cd, run_builtin};
use crate::command::{ArgumentVector, ChildStatus};
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::error::{Result, ShellError};
use crate::external::{spawn, wait, wait_all};
use crate::io_adapters::{PipeEndpoint, StdioPlan};
use crate::lexer::{Tokenized, tokenize};
use crate::parser::{
    ExecutionMode, PARALLEL_OP, PIPE_OP, SEQUENTIAL_OP, split_redirect, split_subcommands,
    strip_newline,
};
use nix::unistd::Pid;
use std::io;
use std::os::fd::OwnedFd;
use tracing::debug;

/// Report a non-fatal error to the user and keep going.
pub(crate) fn report_error(err: &ShellError) {
    debug!(error = %err, "command failed");
    eprintln!("shell: {err}");
}

/// Runs classified lines against the shell state.
pub struct Dispatcher<'a> {
    env: &'a mut Environment,
    config: &'a ShellConfig,
}

impl<'a> Dispatcher<'a> {
    pub fn new(env: &'a mut Environment, config: &'a ShellConfig) -> Self {
        Self { env, config }
    }

    /// Run `line` with the strategy selected for `mode`.
    ///
    /// [`ExecutionMode::Exit`] spawns nothing and only raises the exit flag.
    pub fn dispatch(&mut self, mode: ExecutionMode, line: &str) -> Result<Vec<ChildStatus>> {
        debug!(?mode, line, "dispatching");
        match mode {
            ExecutionMode::Exit => {
                self.env.should_exit = true;
                Ok(Vec::new())
            }
            ExecutionMode::Single => self.run_single(line),
            ExecutionMode::Parallel => self.run_parallel(line),
            ExecutionMode::Sequential => self.run_sequential(line),
            ExecutionMode::Redirected => self.run_redirected(line),
            ExecutionMode::Pipeline => self.run_pipeline(line),
        }
    }

    /// The whole line is one command: spawn it and wait for it.
    pub fn run_single(&mut self, line: &str) -> Result<Vec<ChildStatus>> {
        match self.prepare(strip_newline(line))? {
            Some(argv) => {
                let pid = spawn(&argv, &StdioPlan::inherit())?;
                Ok(vec![wait(pid)?])
            }
            None => Ok(Vec::new()),
        }
    }

    /// `a && b && c`: fork every command without waiting in between, then
    /// reap all of them.
    pub fn run_parallel(&mut self, line: &str) -> Result<Vec<ChildStatus>> {
        let mut children = Vec::new();
        let mut failure = None;

        for token in split_subcommands(line, PARALLEL_OP) {
            let spawned = self
                .prepare(token)
                .and_then(|argv| argv.map(|argv| spawn(&argv, &StdioPlan::inherit())).transpose());
            match spawned {
                Ok(Some(pid)) => children.push(pid),
                Ok(None) => {}
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        debug!(children = children.len(), "parallel commands started");
        reap(&children, failure)
    }

    /// `a ## b ## c`: each command starts only after the previous one ended.
    /// A failing command does not stop the ones after it.
    pub fn run_sequential(&mut self, line: &str) -> Result<Vec<ChildStatus>> {
        let mut statuses = Vec::new();
        for token in split_subcommands(line, SEQUENTIAL_OP) {
            if let Some(argv) = self.prepare(token)? {
                let pid = spawn(&argv, &StdioPlan::inherit())?;
                statuses.push(wait(pid)?);
            }
        }
        Ok(statuses)
    }

    /// `cmd > file`: run `cmd` with its standard output replaced by `file`,
    /// created or truncated. An unsuccessful termination is reported.
    pub fn run_redirected(&mut self, line: &str) -> Result<Vec<ChildStatus>> {
        let (command, target) = split_redirect(line);
        let tokenized = tokenize(command)?;
        if tokenized == Tokenized::Empty {
            return Err(ShellError::MissingRedirectCommand);
        }
        if target.is_empty() {
            return Err(ShellError::MissingRedirectTarget);
        }

        let Some(argv) = self.resolve(tokenized) else {
            return Ok(Vec::new());
        };
        let pid = spawn(&argv, &StdioPlan::to_file(target)?)?;
        let status = wait(pid)?;
        if !status.success() {
            debug!(%status, file = target, "redirected command failed");
            eprintln!("Shell: {status}");
        }
        Ok(vec![status])
    }

    /// `a | b | c`: stage *i* reads what stage *i-1* writes.
    ///
    /// Every stage is started before any is reaped; a producer writing more
    /// than a pipe holds needs its consumer running. The parent keeps at most
    /// the read end feeding the next stage, so no stage sees a descriptor of
    /// a non-adjacent pipe.
    pub fn run_pipeline(&mut self, line: &str) -> Result<Vec<ChildStatus>> {
        let tokens = split_subcommands(line, PIPE_OP);
        let max = self.config.max_pipeline_stages;
        if tokens.len() > max {
            return Err(ShellError::TooManyStages {
                stages: tokens.len(),
                max,
            });
        }

        let mut stages = Vec::with_capacity(tokens.len());
        for token in tokens {
            if let Some(argv) = self.prepare(token)? {
                stages.push(argv);
            }
        }

        let mut children = Vec::with_capacity(stages.len());
        let mut failure = None;
        let mut upstream: Option<OwnedFd> = None;

        for (i, argv) in stages.iter().enumerate() {
            let downstream = if i + 1 < stages.len() {
                match PipeEndpoint::open() {
                    Ok(pipe) => Some(pipe),
                    Err(err) => {
                        failure = Some(err);
                        break;
                    }
                }
            } else {
                None
            };

            let plan = StdioPlan::pipeline_stage(upstream.as_ref(), downstream.as_ref());
            let spawned = spawn(argv, &plan);
            // The child holds its own copy of the previous read end now.
            drop(upstream.take());
            match spawned {
                Ok(pid) => children.push(pid),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
            // The shell never writes into a pipe: keep only the read end.
            upstream = downstream.map(|pipe| pipe.read);
        }
        drop(upstream);

        debug!(stages = children.len(), "pipeline started");
        reap(&children, failure)
    }

    /// Tokenize one sub-command and run `cd` if that is what it is.
    ///
    /// Returns the argument vector to spawn, or `None` when there is nothing
    /// to spawn.
    fn prepare(&mut self, cmd: &str) -> Result<Option<ArgumentVector>> {
        Ok(self.resolve(tokenize(cmd)?))
    }

    fn resolve(&mut self, tokenized: Tokenized) -> Option<ArgumentVector> {
        match tokenized {
            Tokenized::Empty => None,
            Tokenized::ChangeDir(args) => {
                let result = run_builtin::<Cd>(
                    &args,
                    &mut io::stdout(),
                    &mut io::stderr(),
                    self.env,
                );
                if let Err(err) = result {
                    report_error(&err);
                }
                None
            }
            Tokenized::Command(argv) => Some(argv),
        }
    }
}

/// Reap every spawned child, then surface the error that stopped spawning,
/// if any. A wait failure takes precedence since it is fatal.
fn reap(children: &[Pid], failure: Option<ShellError>) -> Result<Vec<ChildStatus>> {
    let statuses = wait_all(children)?;
    match failure {
        Some(err) => Err(err),
        None => Ok(statuses),
    }
}
