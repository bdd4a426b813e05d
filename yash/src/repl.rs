use anyhow::{Context as _, Result};
use nix::errno::Errno;
use nix::unistd::read;
use std::io::{self, Write};
use std::os::unix::io::RawFd;
use tracing::{debug, info};
use yash_types::Context;

use crate::errors::display_user_error;
use crate::shell::Shell;

/// The prompt loop: sweep, prompt, read one line, evaluate.
pub struct Repl<'a> {
    shell: &'a mut Shell,
    ctx: &'a Context,
    prompt: String,
}

impl<'a> Repl<'a> {
    pub fn new(shell: &'a mut Shell, ctx: &'a Context, prompt: String) -> Self {
        Repl { shell, ctx, prompt }
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            self.shell.sweep(self.ctx)?;

            if self.ctx.interactive {
                print!("{}", self.prompt);
                io::stdout().flush().context("failed flush")?;
            }

            let Some(bytes) = read_line(self.ctx.infile)? else {
                info!("end of input");
                if self.ctx.interactive {
                    println!();
                }
                self.shell.teardown();
                return Ok(());
            };
            let line = match String::from_utf8(bytes) {
                Ok(line) => line,
                Err(err) => {
                    display_user_error(
                        self.ctx,
                        &anyhow::Error::from(err).context("unreadable input"),
                    );
                    continue;
                }
            };

            debug!("input: {:?}", line.trim_end());
            self.shell.eval_str(self.ctx, &line)?;
        }
    }
}

/// Read one line from `fd`, newline included, one byte at a time.
/// Foreground jobs inherit the same fd, so nothing past the newline may be
/// consumed. Returns `None` at end of input.
pub(crate) fn read_line(fd: RawFd) -> Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match read(fd, &mut byte) {
            Ok(0) => return Ok((!line.is_empty()).then_some(line)),
            Ok(_) => {
                line.push(byte[0]);
                if byte[0] == b'\n' {
                    return Ok(Some(line));
                }
            }
            Err(Errno::EINTR) => continue,
            Err(err) => return Err(err).context("failed to read input"),
        }
    }
}
