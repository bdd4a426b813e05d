use anyhow::Result;
use yash_types::Context;

use crate::shell::Shell;

/// List completed jobs (once), then every running or stopped background job.
pub fn command(ctx: &Context, shell: &mut Shell) -> Result<()> {
    shell.sweep(ctx)?;

    let most_recent = shell.wait_jobs.most_recent_job_id();
    for job in shell.wait_jobs.iter().filter(|job| job.background) {
        ctx.write_stdout(&job.status_line(most_recent))?;
    }
    Ok(())
}
