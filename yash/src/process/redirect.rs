use libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::fcntl::{OFlag, open};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2};
use std::os::unix::io::RawFd;
use tracing::debug;
use yash_types::{YashError, YashResult};

/// A plain-file redirect attached to one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    Input(String),
    Output(String),
    Error(String),
}

impl Redirect {
    pub fn path(&self) -> &str {
        match self {
            Redirect::Input(path) | Redirect::Output(path) | Redirect::Error(path) => path,
        }
    }

    pub fn target_fd(&self) -> RawFd {
        match self {
            Redirect::Input(_) => STDIN_FILENO,
            Redirect::Output(_) => STDOUT_FILENO,
            Redirect::Error(_) => STDERR_FILENO,
        }
    }

    fn oflag(&self) -> OFlag {
        match self {
            Redirect::Input(_) => OFlag::O_RDONLY,
            Redirect::Output(_) | Redirect::Error(_) => {
                OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC
            }
        }
    }

    pub(crate) fn open(&self) -> YashResult<RawFd> {
        open(self.path(), self.oflag(), Mode::from_bits_truncate(0o666)).map_err(|errno| {
            YashError::Redirect {
                path: self.path().to_string(),
                errno,
            }
        })
    }

    /// Open the file and install it over the target descriptor.
    /// Only called in a forked child, between pipe wiring and exec.
    pub(crate) fn apply(&self) -> YashResult<()> {
        let fd = self.open()?;
        let target = self.target_fd();
        debug!("redirect {:?} fd:{} -> {}", self, fd, target);
        if fd != target {
            dup2(fd, target)?;
            close(fd)?;
        }
        Ok(())
    }
}
