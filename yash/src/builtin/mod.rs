use anyhow::Result;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use yash_types::Context;

use crate::shell::Shell;

pub mod bg;
pub mod fg;
pub mod jobs;

pub type BuiltinCommand = fn(ctx: &Context, shell: &mut Shell) -> Result<()>;

pub static BUILTIN_COMMAND: Lazy<HashMap<&'static str, BuiltinCommand>> = Lazy::new(|| {
    let mut builtin = HashMap::new();

    builtin.insert("jobs", jobs::command as BuiltinCommand);
    builtin.insert("fg", fg::command as BuiltinCommand);
    builtin.insert("bg", bg::command as BuiltinCommand);

    builtin
});

/// Look up a builtin by the whole trimmed input line.
pub fn get_command(line: &str) -> Option<BuiltinCommand> {
    BUILTIN_COMMAND.get(line).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_command;
    use crate::process::{Job, JobState};
    use nix::unistd::Pid;
    use std::fs::File;
    use std::os::unix::io::AsRawFd;
    use std::time::{Duration, Instant};
    use yash_types::TerminalState;

    fn init() {
        let _ = tracing_subscriber::fmt::try_init();
    }

    /// A Stopped background job whose process group no longer exists.
    fn vanished_job(shell: &mut Shell) -> Pid {
        // pid_max is far below this on every Linux configuration
        let pgid = Pid::from_raw(i32::MAX - 1);
        let text = "sleep 30 &";
        let mut job = Job::new(text, parse_command(text).unwrap().unwrap());
        job.pgid = Some(pgid);
        job.job_id = Some(1);
        job.state = JobState::Stopped;
        shell.wait_jobs.add(pgid, job);
        pgid
    }

    fn quiet_context(shell: &Shell, devnull: &File) -> Context {
        let mut ctx = Context::with_terminal(shell.pid, shell.pgid, TerminalState::non_terminal());
        ctx.outfile = devnull.as_raw_fd();
        ctx
    }

    #[test]
    fn failed_continue_leaves_job_stopped() {
        init();
        let devnull = File::options().write(true).open("/dev/null").unwrap();
        let mut shell = Shell::new();
        let ctx = quiet_context(&shell, &devnull);
        let pgid = vanished_job(&mut shell);

        for name in ["fg", "bg", "fg"] {
            let start = Instant::now();
            get_command(name).unwrap()(&ctx, &mut shell).unwrap();
            assert!(start.elapsed() < Duration::from_secs(1), "{name} blocked");

            assert_eq!(shell.jobs().len(), 1);
            let job = shell.jobs().get(pgid).unwrap();
            assert_eq!(job.state, JobState::Stopped, "after {name}");
            assert_eq!(job.job_id, Some(1));
            assert!(job.background);
            assert_eq!(job.display_cmd(), "sleep 30 &");
        }
    }

    #[test]
    fn exact_match_only() {
        assert!(get_command("jobs").is_some());
        assert!(get_command("fg").is_some());
        assert!(get_command("bg").is_some());
        assert!(get_command("fg 1").is_none());
        assert!(get_command("jobs -l").is_none());
        assert!(get_command("ls").is_none());
    }
}
