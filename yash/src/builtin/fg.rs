use anyhow::Result;
use nix::sys::signal::Signal;
use tracing::debug;
use yash_types::Context;

use crate::process::JobState;
use crate::process::signal::send_signal;
use crate::shell::Shell;
use crate::shell::eval::put_in_foreground;

/// Resume the most recent unfinished job in the foreground and wait on it.
pub fn command(ctx: &Context, shell: &mut Shell) -> Result<()> {
    shell.sweep(ctx)?;

    let Some(pgid) = shell.wait_jobs.next_job_to_foreground() else {
        debug!("fg: no current job");
        return Ok(());
    };
    let Some(job) = shell.wait_jobs.get_mut(pgid) else {
        return Ok(());
    };

    let (marked, background) = (job.marked, job.background);
    job.marked = false;
    job.state = JobState::Running;
    ctx.write_stdout(&job.display_cmd())?;
    job.background = false;

    if send_signal(pgid, Signal::SIGCONT).is_err() {
        // the group is gone; leave the job where it was
        job.marked = marked;
        job.background = background;
        job.state = JobState::Stopped;
        return Ok(());
    }
    put_in_foreground(shell, ctx, pgid)
}
