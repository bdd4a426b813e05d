use anyhow::Result;
use nix::unistd::Pid;
use tracing::{debug, warn};
use yash_types::Context;

use super::Shell;
use super::terminal::{give_terminal_to, reclaim_terminal};
use crate::builtin;
use crate::errors::display_user_error;
use crate::parser::parse_command;
use crate::process::{Job, JobState, wait_any};

/// Evaluate one input line. Errors returned from here are fatal to the
/// shell; syntax errors and failures inside launched jobs are not.
pub fn eval_str(shell: &mut Shell, ctx: &Context, input: &str) -> Result<()> {
    let input = input.trim();
    if input.is_empty() {
        return shell.sweep(ctx);
    }

    if let Some(command) = builtin::get_command(input) {
        debug!("builtin: {}", input);
        return command(ctx, shell);
    }

    let line = match parse_command(input) {
        Ok(Some(line)) => line,
        Ok(None) => return shell.sweep(ctx),
        Err(err) => {
            display_user_error(ctx, &anyhow::Error::from(err));
            return shell.sweep(ctx);
        }
    };

    let job = Job::new(input, line);
    launch_job(shell, ctx, job)?;
    shell.sweep(ctx)
}

/// Fork the job, register it, and block on it unless it runs in the
/// background.
pub fn launch_job(shell: &mut Shell, ctx: &Context, mut job: Job) -> Result<Pid> {
    let pgid = job.launch(ctx)?;
    let background = job.background;
    if background {
        job.job_id = Some(shell.wait_jobs.next_job_id());
        debug!("JOB_LAUNCH_BACKGROUND: '{}' as job {:?}", job.cmd, job.job_id);
    }
    shell.wait_jobs.add(pgid, job);

    if !background {
        put_in_foreground(shell, ctx, pgid)?;
    }
    Ok(pgid)
}

/// Hand the terminal to `pgid` and block until that job stops or completes.
/// The terminal always comes back to the shell afterwards.
pub fn put_in_foreground(shell: &mut Shell, ctx: &Context, pgid: Pid) -> Result<()> {
    debug!("put_in_foreground: pgid {}", pgid);
    give_terminal_to(ctx, pgid);
    let waited = wait_for_job(shell, ctx, pgid);
    reclaim_terminal(ctx);
    waited?;

    // a job that finished in the foreground is reclaimed without a report
    let finished = shell
        .wait_jobs
        .get(pgid)
        .map(|job| job.state.is_completed() && !job.background)
        .unwrap_or(false);
    if finished {
        if let Some(job) = shell.wait_jobs.remove(pgid) {
            debug!("JOB_FOREGROUND_DONE: '{}' {:?}", job.cmd, job.state);
        }
    }
    Ok(())
}

/// Block on any child until the job `pgid` leaves RUNNING. Status changes of
/// other jobs seen on the way are applied, not dropped.
fn wait_for_job(shell: &mut Shell, ctx: &Context, pgid: Pid) -> Result<()> {
    loop {
        match shell.wait_jobs.get(pgid).map(|job| job.state) {
            Some(JobState::Running) => {}
            state => {
                debug!("wait_for_job: {} left running: {:?}", pgid, state);
                return Ok(());
            }
        }

        match wait_any(false) {
            Some((pid, event)) => shell.handle_event(ctx, pid, event)?,
            None => {
                warn!("wait_for_job: no children left while waiting on {}", pgid);
                if let Some(job) = shell.wait_jobs.get_mut(pgid) {
                    job.state = JobState::Completed(1, None);
                }
                return Ok(());
            }
        }
    }
}
