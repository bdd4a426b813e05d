use nix::sys::signal::Signal;

/// Lifecycle of a job. `Completed` is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum JobState {
    Running,
    Stopped,
    /// Exit code and, when killed, the terminating signal
    Completed(u8, Option<Signal>),
}

impl JobState {
    pub fn is_stopped(&self) -> bool {
        matches!(self, JobState::Stopped)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, JobState::Completed(_, _))
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            JobState::Running => formatter.write_str("Running"),
            JobState::Stopped => formatter.write_str("Stopped"),
            JobState::Completed(_, _) => formatter.write_str("Done"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_words() {
        assert_eq!(JobState::Running.to_string(), "Running");
        assert_eq!(JobState::Stopped.to_string(), "Stopped");
        assert_eq!(JobState::Completed(0, None).to_string(), "Done");
        assert_eq!(
            JobState::Completed(1, Some(Signal::SIGKILL)).to_string(),
            "Done"
        );
    }

    #[test]
    fn predicates() {
        assert!(!JobState::Running.is_stopped());
        assert!(JobState::Stopped.is_stopped());
        assert!(JobState::Completed(3, None).is_completed());
        assert!(!JobState::Stopped.is_completed());
    }
}
