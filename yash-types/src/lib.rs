use anyhow::Result;
use libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::errno::Errno;
use nix::sys::termios::Termios;
use nix::unistd::Pid;
use std::fmt::Debug;
use std::fs::File;
use std::io::Write;
use std::mem;
use std::os::unix::io::FromRawFd;
use std::os::unix::io::RawFd;
use thiserror::Error;

pub mod terminal;
pub use terminal::TerminalState;

/// yash specific error types
#[derive(Error, Debug)]
pub enum YashError {
    #[error("failed fork: {0}")]
    Fork(Errno),

    /// A redirect target could not be opened inside a child
    #[error("{path}: {}", .errno.desc())]
    Redirect { path: String, errno: Errno },

    #[error("{program}: command not found")]
    CommandNotFound { program: String },

    #[error("{program}: {}", .errno.desc())]
    Exec { program: String, errno: Errno },

    #[error("System call failed: {0}")]
    System(#[from] Errno),
}

impl YashError {
    /// Exit status used by a child that hits this error before exec
    pub fn child_exit_code(&self) -> i32 {
        match self {
            YashError::CommandNotFound { .. } => 127,
            YashError::Exec { .. } => 126,
            _ => 1,
        }
    }
}

pub type YashResult<T> = std::result::Result<T, YashError>;

#[derive(Clone)]
pub struct Context {
    pub shell_pid: Pid,
    pub shell_pgid: Pid,
    pub shell_tmode: Option<Termios>,
    pub terminal_state: TerminalState,
    /// stdin is a terminal and the shell arbitrates its ownership
    pub interactive: bool,
    /// Command lines are read from here
    pub infile: RawFd,
    pub outfile: RawFd,
    pub errfile: RawFd,
}

impl Context {
    pub fn with_terminal(shell_pid: Pid, shell_pgid: Pid, terminal_state: TerminalState) -> Self {
        Context {
            shell_pid,
            shell_pgid,
            shell_tmode: terminal_state.get_tmodes().cloned(),
            interactive: terminal_state.can_control_jobs(),
            terminal_state,
            infile: STDIN_FILENO,
            outfile: STDOUT_FILENO,
            errfile: STDERR_FILENO,
        }
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::result::Result<(), std::fmt::Error> {
        f.debug_struct("Context")
            .field("shell_pid", &self.shell_pid)
            .field("shell_pgid", &self.shell_pgid)
            .field("terminal_state", &self.terminal_state.is_terminal)
            .field("interactive", &self.interactive)
            .field("infile", &self.infile)
            .field("outfile", &self.outfile)
            .field("errfile", &self.errfile)
            .finish()
    }
}

impl Context {
    pub fn write_stdout(&self, msg: &str) -> Result<()> {
        let mut file = unsafe { File::from_raw_fd(self.outfile) };
        let res = writeln!(&mut file, "{msg}").and_then(|_| file.flush());
        mem::forget(file);
        res?;
        Ok(())
    }

    pub fn write_stderr(&self, msg: &str) -> Result<()> {
        let mut file = unsafe { File::from_raw_fd(self.errfile) };
        let res = writeln!(&mut file, "{msg}").and_then(|_| file.flush());
        mem::forget(file);
        res?;
        Ok(())
    }
}
