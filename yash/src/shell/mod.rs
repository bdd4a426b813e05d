pub mod eval;
pub mod job;
pub mod terminal;

use anyhow::{Context as _, Result};
use libc::{STDIN_FILENO, c_int};
use nix::unistd::{Pid, getpgrp, getpid, setpgid, tcsetpgrp};
use tracing::{debug, warn};
use yash_types::Context;

use crate::process::signal::ignore_job_control_signals;
use crate::process::{WaitEvent, wait_any};
pub use job::{JobTable, Transition};

pub const APP_NAME: &str = "yash";
pub const SHELL_TERMINAL: c_int = STDIN_FILENO;

/// The shell session: its own process identity plus the job table.
pub struct Shell {
    pub pid: Pid,
    pub pgid: Pid,
    pub(crate) wait_jobs: JobTable,
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("pid", &self.pid)
            .field("pgid", &self.pgid)
            .field("jobs", &self.wait_jobs.len())
            .finish()
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    pub fn new() -> Self {
        Shell {
            pid: getpid(),
            pgid: getpgrp(),
            wait_jobs: JobTable::new(),
        }
    }

    pub fn jobs(&self) -> &JobTable {
        &self.wait_jobs
    }

    /// Interactive startup: ignore job-control signals, lead our own process
    /// group, and own the terminal.
    pub fn init_job_control(&mut self) -> Result<()> {
        ignore_job_control_signals()?;

        if let Err(err) = setpgid(self.pid, self.pid) {
            // a session leader already leads its group
            warn!("setpgid for the shell failed: {}", err);
        }
        self.pgid = getpgrp();
        tcsetpgrp(SHELL_TERMINAL, self.pgid).context("failed tcsetpgrp")?;
        debug!("shell pid:{} pgid:{} owns the terminal", self.pid, self.pgid);
        Ok(())
    }

    pub fn eval_str(&mut self, ctx: &Context, input: &str) -> Result<()> {
        eval::eval_str(self, ctx, input)
    }

    /// Reap every available status change without blocking.
    pub fn check_job_state(&mut self, ctx: &Context) -> Result<()> {
        if self.wait_jobs.is_empty() {
            return Ok(());
        }
        while let Some((pid, event)) = wait_any(true) {
            self.handle_event(ctx, pid, event)?;
        }
        Ok(())
    }

    /// Show each completed job once, then drop it from the table.
    pub fn report_done_jobs(&mut self, ctx: &Context) -> Result<()> {
        let most_recent = self.wait_jobs.most_recent_job_id();
        for job in self.wait_jobs.remove_all_done() {
            debug!("JOB_DONE: '{}' final state {:?}", job.cmd, job.state);
            if job.job_id.is_some() {
                ctx.write_stdout(&job.status_line(most_recent))?;
            }
        }
        Ok(())
    }

    /// The sweep run around every prompt and launch.
    pub fn sweep(&mut self, ctx: &Context) -> Result<()> {
        self.check_job_state(ctx)?;
        self.report_done_jobs(ctx)
    }

    pub(crate) fn handle_event(&mut self, ctx: &Context, pid: Pid, event: WaitEvent) -> Result<()> {
        match self.wait_jobs.apply_event(pid, event) {
            Some(Transition::Stopped) | Some(Transition::Suspended) => {
                let most_recent = self.wait_jobs.most_recent_job_id();
                if let Some(job) = self.wait_jobs.get(pid) {
                    if job.job_id.is_some() {
                        ctx.write_stdout(&job.notification_line(most_recent))?;
                    }
                }
            }
            Some(Transition::Completed) | None => {}
        }
        Ok(())
    }

    /// Drop every job at end of input.
    pub fn teardown(&mut self) {
        debug!("teardown: dropping {} jobs", self.wait_jobs.len());
        self.wait_jobs.clear();
    }
}
