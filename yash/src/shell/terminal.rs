use nix::sys::termios::{SetArg, tcsetattr};
use nix::unistd::{Pid, tcsetpgrp};
use tracing::debug;
use yash_types::Context;

use super::SHELL_TERMINAL;

/// Make `pgid` the terminal's foreground process group.
/// A no-op when the shell does not control a terminal.
pub(crate) fn give_terminal_to(ctx: &Context, pgid: Pid) {
    if !ctx.interactive {
        return;
    }
    match tcsetpgrp(SHELL_TERMINAL, pgid) {
        Ok(_) => debug!("Set foreground process group to {}", pgid),
        Err(err) => debug!("tcsetpgrp {} failed: {}, continuing", pgid, err),
    }
}

/// Take the terminal back for the shell and restore the modes it was in
/// before the job ran.
pub(crate) fn reclaim_terminal(ctx: &Context) {
    if !ctx.interactive {
        return;
    }
    if let Err(err) = tcsetpgrp(SHELL_TERMINAL, ctx.shell_pgid) {
        debug!("tcsetpgrp shell_pgid failed: {}, continuing anyway", err);
    }
    if let Some(tmodes) = &ctx.shell_tmode {
        if let Err(err) = tcsetattr(SHELL_TERMINAL, SetArg::TCSADRAIN, tmodes) {
            debug!("failed to restore terminal modes: {}", err);
        }
    }
    debug!("Restored shell process group {}", ctx.shell_pgid);
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::getpid;
    use yash_types::TerminalState;

    #[test]
    fn non_interactive_context_never_touches_the_terminal() {
        let pid = getpid();
        let ctx = Context::with_terminal(pid, pid, TerminalState::non_terminal());
        // would fail with ENOTTY under a test runner if attempted
        give_terminal_to(&ctx, Pid::from_raw(1));
        reclaim_terminal(&ctx);
    }
}
