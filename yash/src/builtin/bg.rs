use anyhow::Result;
use nix::sys::signal::Signal;
use tracing::debug;
use yash_types::Context;

use crate::process::JobState;
use crate::process::signal::send_signal;
use crate::shell::Shell;

/// Resume the most recently stopped background job without waiting on it.
pub fn command(ctx: &Context, shell: &mut Shell) -> Result<()> {
    shell.sweep(ctx)?;

    let Some(pgid) = shell.wait_jobs.next_job_to_background() else {
        debug!("bg: no stopped job");
        return Ok(());
    };
    let most_recent = shell.wait_jobs.most_recent_job_id();
    let Some(job) = shell.wait_jobs.get_mut(pgid) else {
        return Ok(());
    };

    let marked = job.marked;
    job.marked = true;
    job.state = JobState::Running;
    ctx.write_stdout(&job.notification_line(most_recent))?;
    job.background = true;

    if send_signal(pgid, Signal::SIGCONT).is_err() {
        job.marked = marked;
        job.state = JobState::Stopped;
    }
    Ok(())
}
