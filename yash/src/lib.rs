use crate::config::Config;
use crate::errors::display_user_error;
use crate::process::signal::restore_job_control_signals;
use crate::repl::Repl;
use crate::shell::{SHELL_TERMINAL, Shell};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, warn};
use yash_types::{Context, TerminalState};

pub mod builtin;
pub mod config;
pub mod errors;
pub mod parser;
pub mod process;
pub mod repl;
pub mod shell;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Evaluate one command line, then exit
    #[arg(short, long)]
    pub command: Option<String>,

    /// Write the debug log here instead of the XDG data directory
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Prompt shown before each command line
    #[arg(long)]
    pub prompt: Option<String>,
}

/// Set up the session and run either one command or the prompt loop.
pub fn run_shell(cli: Cli, config: Config) -> ExitCode {
    let mut shell = Shell::new();
    let ctx = create_context(&mut shell);
    debug!("{:?} {:?}", shell, ctx);

    if let Some(command) = cli.command.as_deref() {
        execute_command(&mut shell, &ctx, command)
    } else {
        run_interactive(&mut shell, &ctx, config.prompt)
    }
}

/// Take over job control when stdin is a terminal; otherwise run without
/// touching terminal ownership.
fn create_context(shell: &mut Shell) -> Context {
    let terminal_state = TerminalState::detect(SHELL_TERMINAL);
    if terminal_state.can_control_jobs() {
        match shell.init_job_control() {
            Ok(()) => return Context::with_terminal(shell.pid, shell.pgid, terminal_state),
            Err(err) => {
                warn!("job control unavailable: {:?}", err);
                if let Err(err) = restore_job_control_signals() {
                    warn!("{:?}", err);
                }
            }
        }
    }
    Context::with_terminal(shell.pid, shell.pgid, TerminalState::non_terminal())
}

pub fn execute_command(shell: &mut Shell, ctx: &Context, command: &str) -> ExitCode {
    let result = shell.eval_str(ctx, command).and_then(|_| shell.sweep(ctx));
    shell.teardown();
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            display_user_error(ctx, &err);
            ExitCode::FAILURE
        }
    }
}

pub fn run_interactive(shell: &mut Shell, ctx: &Context, prompt: String) -> ExitCode {
    let mut repl = Repl::new(shell, ctx, prompt);
    match repl.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            display_user_error(ctx, &err);
            ExitCode::FAILURE
        }
    }
}
