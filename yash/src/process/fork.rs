use anyhow::{Context as _, Result};
use libc::{STDIN_FILENO, STDOUT_FILENO};
use nix::errno::Errno;
use nix::sys::wait::waitpid;
use nix::unistd::{ForkResult, Pid, close, dup2, fork, getpid, pipe, setpgid, tcsetpgrp};
use std::io::Write;
use tracing::{debug, error};
use yash_types::{Context, YashError};

use super::job::Job;
use super::process::Process;
use super::signal;
use crate::errors::display_child_error;
use crate::shell::SHELL_TERMINAL;

/// Fork the processes of `job` and return the pid that identifies its
/// process group.
pub(crate) fn fork_job(ctx: &Context, job: &Job) -> Result<Pid> {
    let foreground = !job.background;
    // buffered shell output must not be duplicated into the children
    std::io::stdout().flush().ok();
    std::io::stderr().flush().ok();

    match &job.second {
        None => fork_process(ctx, &job.first, foreground),
        Some(second) => fork_pipeline(ctx, &job.first, second, foreground),
    }
}

fn fork_process(ctx: &Context, process: &Process, foreground: bool) -> Result<Pid> {
    debug!(
        "🍴 FORK: {:?} foreground:{} interactive:{}",
        process.argv, foreground, ctx.interactive
    );
    let pid = unsafe { fork().map_err(YashError::Fork)? };

    match pid {
        ForkResult::Parent { child } => {
            join_own_group(child);
            debug!("🍴 FORK: child pid: {}", child);
            Ok(child)
        }
        ForkResult::Child => {
            if let Err(err) = signal::set_child_signals() {
                error!("🍴 FORK: {}", err);
            }
            enter_job_group(ctx, foreground);
            exec_or_exit(process)
        }
    }
}

/// Two-stage pipelines run under a leader process that owns the group,
/// forks both stages, and exits once both are gone. The shell only ever
/// waits on the leader.
fn fork_pipeline(
    ctx: &Context,
    first: &Process,
    second: &Process,
    foreground: bool,
) -> Result<Pid> {
    debug!(
        "🍴 FORK: pipeline {:?} | {:?} foreground:{}",
        first.argv, second.argv, foreground
    );
    let pid = unsafe { fork().map_err(YashError::Fork)? };

    match pid {
        ForkResult::Parent { child } => {
            join_own_group(child);
            debug!("🍴 FORK: pipeline leader pid: {}", child);
            Ok(child)
        }
        ForkResult::Child => {
            if let Err(err) = signal::set_pipeline_leader_signals() {
                error!("🍴 FORK: {}", err);
            }
            enter_job_group(ctx, foreground);
            let code = match run_pipeline(first, second) {
                Ok(()) => 0,
                Err(err) => {
                    error!("🍴 FORK: pipeline leader failed: {:?}", err);
                    1
                }
            };
            std::process::exit(code)
        }
    }
}

/// Body of the pipeline leader.
fn run_pipeline(first: &Process, second: &Process) -> Result<()> {
    let (read_end, write_end) = pipe().context("failed pipe")?;

    let producer = spawn_stage(first, || {
        dup2(write_end, STDOUT_FILENO)?;
        close(read_end)?;
        close(write_end)?;
        Ok(())
    })?;
    let consumer = spawn_stage(second, || {
        dup2(read_end, STDIN_FILENO)?;
        close(read_end)?;
        close(write_end)?;
        Ok(())
    })?;

    close(read_end).context("failed close")?;
    close(write_end).context("failed close")?;

    for stage in [producer, consumer] {
        loop {
            match waitpid(stage, None) {
                Err(Errno::EINTR) => continue,
                Ok(status) => {
                    debug!("pipeline stage {} finished: {:?}", stage, status);
                    break;
                }
                Err(err) => {
                    debug!("pipeline stage {} wait failed: {}", stage, err);
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Fork one pipeline stage; it inherits the leader's process group.
fn spawn_stage<F>(process: &Process, wire: F) -> Result<Pid>
where
    F: FnOnce() -> nix::Result<()>,
{
    match unsafe { fork().map_err(YashError::Fork)? } {
        ForkResult::Parent { child } => Ok(child),
        ForkResult::Child => {
            if let Err(err) = wire() {
                display_child_error(&YashError::System(err));
                std::process::exit(1);
            }
            exec_or_exit(process)
        }
    }
}

/// Parent side: also place the child in its own group so the group exists
/// before the shell signals or waits on it. Losing the race to exec is fine.
fn join_own_group(child: Pid) {
    if let Err(err) = setpgid(child, child) {
        debug!("🔧 PGID: parent setpgid {} failed: {}", child, err);
    }
}

/// Child side: become a group leader and, for a foreground job, take the
/// terminal right away. The parent has not recorded the pgid yet, so the
/// child uses its own pid.
fn enter_job_group(ctx: &Context, foreground: bool) {
    let pid = getpid();
    if let Err(err) = setpgid(pid, pid) {
        error!("🔧 PGID: setpgid {} failed: {}", pid, err);
    }
    if foreground && ctx.interactive {
        if let Err(err) = tcsetpgrp(SHELL_TERMINAL, pid) {
            error!("🔧 PGID: tcsetpgrp {} failed: {}", pid, err);
        }
    }
}

fn exec_or_exit(process: &Process) -> ! {
    let err = process.exec();
    display_child_error(&err);
    std::process::exit(err.child_exit_code())
}
