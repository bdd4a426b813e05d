use anyhow::{Context as _, Result};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, killpg, sigaction};
use nix::unistd::Pid;
use tracing::{debug, error};

fn set_handler(signal: Signal, handler: SigHandler) -> Result<()> {
    let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
    unsafe {
        sigaction(signal, &action)
            .with_context(|| format!("failed to set {:?} handler", signal))?;
    }
    Ok(())
}

const JOB_CONTROL_SIGNALS: [Signal; 4] = [
    Signal::SIGINT,
    Signal::SIGTSTP,
    Signal::SIGTTOU,
    Signal::SIGTTIN,
];

/// The shell itself must survive the interactive signals meant for the job
/// that currently owns the terminal.
pub(crate) fn ignore_job_control_signals() -> Result<()> {
    for signal in JOB_CONTROL_SIGNALS {
        set_handler(signal, SigHandler::SigIgn)?;
    }
    debug!("SIGNAL: job control signals ignored by the shell");
    Ok(())
}

/// Undo `ignore_job_control_signals` when the shell gives up on job control.
pub(crate) fn restore_job_control_signals() -> Result<()> {
    for signal in JOB_CONTROL_SIGNALS {
        set_handler(signal, SigHandler::SigDfl)?;
    }
    debug!("SIGNAL: job control signals back to default");
    Ok(())
}

/// Dispositions for a freshly forked job process.
/// SIGTTOU stays ignored so that a child may call `tcsetpgrp`.
pub(crate) fn set_child_signals() -> Result<()> {
    set_handler(Signal::SIGINT, SigHandler::SigDfl)?;
    set_handler(Signal::SIGTSTP, SigHandler::SigDfl)?;
    set_handler(Signal::SIGTTOU, SigHandler::SigIgn)?;
    Ok(())
}

/// Dispositions for the leader of a two-stage pipeline.
pub(crate) fn set_pipeline_leader_signals() -> Result<()> {
    set_handler(Signal::SIGTTIN, SigHandler::SigIgn)?;
    set_child_signals()
}

/// Deliver `signal` to every process in the group `pgid`.
pub(crate) fn send_signal(pgid: Pid, signal: Signal) -> Result<()> {
    debug!("📡 SIGNAL: Sending signal {:?} to process group {}", signal, pgid);
    match killpg(pgid, signal) {
        Ok(_) => Ok(()),
        Err(e) => {
            error!(
                "📡 SIGNAL: Failed to send signal {:?} to process group {}: {}",
                signal, pgid, e
            );
            Err(e.into())
        }
    }
}
