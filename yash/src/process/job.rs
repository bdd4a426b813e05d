use anyhow::Result;
use nix::unistd::Pid;
use tracing::debug;
use yash_types::Context;

use super::fork::fork_job;
use super::process::Process;
use super::state::JobState;
use crate::parser::CommandLine;

/// One command line as typed by the user: a single process or a two-stage
/// pipeline, tracked through one process group.
#[derive(Debug)]
pub struct Job {
    /// Set once launched; identifies the job to the kernel and to `waitpid`
    pub pgid: Option<Pid>,
    /// Command text without any trailing ` &`
    pub cmd: String,
    /// `None` while the job runs in the foreground
    pub job_id: Option<usize>,
    pub background: bool,
    /// Display the command with a trailing ` &`
    pub marked: bool,
    pub state: JobState,
    pub(crate) first: Process,
    pub(crate) second: Option<Process>,
}

impl Job {
    /// Assemble a job from a parsed line. `text` is the line as typed.
    pub fn new(text: &str, line: CommandLine) -> Self {
        let mut cmd = text.trim();
        if line.background {
            cmd = cmd.strip_suffix('&').unwrap_or(cmd).trim_end();
        }
        Job {
            pgid: None,
            cmd: cmd.to_string(),
            job_id: None,
            background: line.background,
            marked: line.background,
            state: JobState::Running,
            first: line.first,
            second: line.second,
        }
    }

    pub fn is_pipeline(&self) -> bool {
        self.second.is_some()
    }

    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        std::iter::once(&self.first).chain(self.second.as_ref())
    }

    /// Command text as shown to the user.
    pub fn display_cmd(&self) -> String {
        if self.marked {
            format!("{} &", self.cmd)
        } else {
            self.cmd.clone()
        }
    }

    fn recency_mark(&self, most_recent: usize) -> char {
        if self.job_id == Some(most_recent) {
            '+'
        } else {
            '-'
        }
    }

    /// `[<n>]<+|->\t<command>`
    pub fn notification_line(&self, most_recent: usize) -> String {
        format!(
            "[{}]{}\t{}",
            self.job_id.unwrap_or_default(),
            self.recency_mark(most_recent),
            self.display_cmd()
        )
    }

    /// `[<n>]<+|->\t<status>\t<command>`
    pub fn status_line(&self, most_recent: usize) -> String {
        format!(
            "[{}]{}\t{}\t{}",
            self.job_id.unwrap_or_default(),
            self.recency_mark(most_recent),
            self.state,
            self.display_cmd()
        )
    }

    /// Fork the job's processes. Returns the process group id.
    pub fn launch(&mut self, ctx: &Context) -> Result<Pid> {
        let programs: Vec<&str> = self.processes().map(|p| p.program()).collect();
        debug!(
            "JOB_LAUNCH_START: '{}' background: {} pipeline: {} programs: {:?}",
            self.cmd,
            self.background,
            self.is_pipeline(),
            programs
        );
        let pgid = fork_job(ctx, self)?;
        self.pgid = Some(pgid);
        self.state = JobState::Running;
        debug!("set job '{}' pgid: {}", self.cmd, pgid);
        Ok(pgid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_command;

    fn init() {
        let _ = tracing_subscriber::fmt::try_init();
    }

    fn job(text: &str) -> Job {
        let line = parse_command(text).unwrap().unwrap();
        Job::new(text, line)
    }

    #[test]
    fn foreground_job_has_no_marker() {
        init();
        let job = job("sleep 30");
        assert_eq!(job.cmd, "sleep 30");
        assert!(!job.background);
        assert!(!job.marked);
        assert_eq!(job.job_id, None);
        assert_eq!(job.state, JobState::Running);
        assert_eq!(job.display_cmd(), "sleep 30");
    }

    #[test]
    fn background_job_keeps_base_text_and_marker() {
        init();
        let job = job("  sleep 30 &  ");
        assert_eq!(job.cmd, "sleep 30");
        assert!(job.background);
        assert_eq!(job.display_cmd(), "sleep 30 &");
    }

    #[test]
    fn pipeline_shape() {
        init();
        let job = job("cat file | wc -l");
        assert!(job.is_pipeline());
        let programs: Vec<&str> = job.processes().map(|p| p.program()).collect();
        assert_eq!(programs, vec!["cat", "wc"]);
        assert!(!self::job("ls").is_pipeline());
    }

    #[test]
    fn display_lines() {
        init();
        let mut job = job("sleep 30 &");
        job.job_id = Some(2);
        assert_eq!(job.notification_line(2), "[2]+\tsleep 30 &");
        assert_eq!(job.notification_line(3), "[2]-\tsleep 30 &");
        assert_eq!(job.status_line(2), "[2]+\tRunning\tsleep 30 &");

        job.state = JobState::Stopped;
        job.marked = false;
        assert_eq!(job.status_line(3), "[2]-\tStopped\tsleep 30");

        job.state = JobState::Completed(0, None);
        assert_eq!(job.status_line(2), "[2]+\tDone\tsleep 30");
    }
}
