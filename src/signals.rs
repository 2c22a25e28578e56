//! Signal disposition for the shell and its children.
//!
//! The shell ignores interrupt and terminal-stop so Ctrl-C and Ctrl-Z at the
//! terminal do not kill it. Ignored dispositions survive exec, so every child
//! puts the defaults back before replacing its image.

use nix::sys::signal::{SigHandler, Signal, signal};

/// Signals the shell must survive while children react to them normally.
pub const INTERACTIVE_SIGNALS: [Signal; 2] = [Signal::SIGINT, Signal::SIGTSTP];

/// Ignore the interactive signals in the calling process. Called once at
/// start-up by the binary.
pub fn ignore_interactive_signals() -> nix::Result<()> {
    for sig in INTERACTIVE_SIGNALS {
        // SAFETY: SigIgn installs no handler code.
        unsafe { signal(sig, SigHandler::SigIgn) }?;
    }
    Ok(())
}

/// Put back the default disposition of the interactive signals.
///
/// Runs in a freshly forked child; `signal` is async-signal-safe.
pub fn restore_default_signals() -> nix::Result<()> {
    for sig in INTERACTIVE_SIGNALS {
        // SAFETY: SigDfl installs no handler code.
        unsafe { signal(sig, SigHandler::SigDfl) }?;
    }
    Ok(())
}
