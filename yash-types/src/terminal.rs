use nix::sys::termios::{Termios, tcgetattr};
use nix::unistd::isatty;
use std::os::unix::io::RawFd;
use tracing::{debug, warn};

/// What the shell learned about its input fd at startup.
#[derive(Debug, Clone)]
pub struct TerminalState {
    pub is_terminal: bool,
    /// Modes restored after every foreground job; `None` off a tty
    pub tmodes: Option<Termios>,
}

impl TerminalState {
    /// Probe `fd` with isatty and, on a tty, snapshot its modes.
    pub fn detect(fd: RawFd) -> Self {
        let is_terminal = isatty(fd).unwrap_or(false);
        let tmodes = if is_terminal {
            tcgetattr(fd)
                .map_err(|err| warn!("tcgetattr on fd {} failed: {}", fd, err))
                .ok()
        } else {
            None
        };
        debug!(
            "TERMINAL: fd {} tty:{} modes saved:{}",
            fd,
            is_terminal,
            tmodes.is_some()
        );

        TerminalState {
            is_terminal,
            tmodes,
        }
    }

    /// Piped or scripted input.
    pub fn non_terminal() -> Self {
        TerminalState {
            is_terminal: false,
            tmodes: None,
        }
    }

    pub fn get_tmodes(&self) -> Option<&Termios> {
        self.tmodes.as_ref()
    }

    pub fn can_control_jobs(&self) -> bool {
        self.is_terminal && self.tmodes.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_terminal_has_no_job_control() {
        let state = TerminalState::non_terminal();
        assert!(!state.is_terminal);
        assert!(state.get_tmodes().is_none());
        assert!(!state.can_control_jobs());
    }

    #[test]
    fn detect_on_invalid_fd_is_not_a_terminal() {
        let state = TerminalState::detect(-1);
        assert!(!state.is_terminal);
        assert!(!state.can_control_jobs());
    }

    #[test]
    fn pipe_is_not_a_terminal() {
        let (read_end, write_end) = nix::unistd::pipe().unwrap();
        let state = TerminalState::detect(read_end);
        assert!(!state.is_terminal);
        assert!(state.get_tmodes().is_none());
        nix::unistd::close(read_end).unwrap();
        nix::unistd::close(write_end).unwrap();
    }
}
