use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use tracing::{debug, error};

/// A status change reported for one child.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WaitEvent {
    Stopped(Signal),
    Exited(u8),
    Signaled(Signal),
}

/// Reap one status change from any child, stops included.
///
/// Returns `None` once nothing is left to report: with `no_hang` that means no
/// child changed state, otherwise that the shell has no children at all.
/// The sweep and the foreground wait both go through here so that an event
/// is consumed exactly once.
pub fn wait_any(no_hang: bool) -> Option<(Pid, WaitEvent)> {
    let options = if no_hang {
        WaitPidFlag::WUNTRACED | WaitPidFlag::WNOHANG
    } else {
        WaitPidFlag::WUNTRACED
    };

    // -1 selects any child, including members of other jobs' groups
    let any_child = Pid::from_raw(-1);
    loop {
        match waitpid(any_child, Some(options)) {
            Ok(WaitStatus::Exited(pid, status)) => {
                debug!("WAIT: {} exited with status {}", pid, status);
                return Some((pid, WaitEvent::Exited(status as u8)));
            }
            Ok(WaitStatus::Signaled(pid, signal, core_dumped)) => {
                debug!(
                    "WAIT: {} killed by {:?} (core dumped: {})",
                    pid, signal, core_dumped
                );
                return Some((pid, WaitEvent::Signaled(signal)));
            }
            Ok(WaitStatus::Stopped(pid, signal)) => {
                debug!("WAIT: {} stopped by {:?}", pid, signal);
                return Some((pid, WaitEvent::Stopped(signal)));
            }
            Ok(WaitStatus::StillAlive) => return None,
            Ok(status) => {
                debug!("WAIT: ignoring status {:?}", status);
                continue;
            }
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => {
                debug!("WAIT: no child processes");
                return None;
            }
            Err(err) => {
                error!("WAIT: waitpid failed: {}", err);
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_children_reports_nothing() {
        let _ = tracing_subscriber::fmt::try_init();
        // the unit test binary never forks
        assert_eq!(wait_any(true), None);
    }
}
