use yash_types::{Context, YashError};

use crate::parser::ParseError;
use crate::shell::APP_NAME;

/// Format an error for the user, without backtraces.
pub fn user_error_message(err: &anyhow::Error) -> String {
    if let Some(parse_err) = err.downcast_ref::<ParseError>() {
        format!("{APP_NAME}: syntax error: {parse_err}")
    } else {
        format!("{APP_NAME}: {err:#}")
    }
}

/// Report an error on the shell's error fd.
pub fn display_user_error(ctx: &Context, err: &anyhow::Error) {
    if ctx.write_stderr(&user_error_message(err)).is_err() {
        eprintln!("{}", user_error_message(err));
    }
}

/// Diagnostic printed by a forked child that could not reach exec.
pub fn display_child_error(err: &YashError) {
    eprintln!("{APP_NAME}: {err}");
}
