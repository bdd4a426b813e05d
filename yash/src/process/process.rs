use nix::errno::Errno;
use nix::unistd::execvp;
use std::ffi::CString;
use tracing::debug;
use yash_types::YashError;

use super::redirect::Redirect;

/// One program invocation inside a job. Its pid is never retained: the job
/// is tracked through its process group only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Process {
    pub argv: Vec<String>,
    pub stdin_file: Option<String>,
    pub stdout_file: Option<String>,
    pub stderr_file: Option<String>,
}

impl Process {
    pub fn new(argv: Vec<String>) -> Self {
        Process {
            argv,
            ..Default::default()
        }
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    /// Redirects in application order: error, input, output.
    pub fn redirects(&self) -> Vec<Redirect> {
        let mut redirects = Vec::new();
        if let Some(path) = &self.stderr_file {
            redirects.push(Redirect::Error(path.clone()));
        }
        if let Some(path) = &self.stdin_file {
            redirects.push(Redirect::Input(path.clone()));
        }
        if let Some(path) = &self.stdout_file {
            redirects.push(Redirect::Output(path.clone()));
        }
        redirects
    }

    /// Apply redirects and replace the current image with the program.
    /// Runs in a forked child and only returns on failure.
    pub(crate) fn exec(&self) -> YashError {
        for redirect in self.redirects() {
            if let Err(err) = redirect.apply() {
                return err;
            }
        }

        let argv: Result<Vec<CString>, _> =
            self.argv.iter().map(|a| CString::new(a.as_str())).collect();
        let argv = match argv {
            Ok(argv) if !argv.is_empty() => argv,
            _ => {
                return YashError::Exec {
                    program: self.program().to_string(),
                    errno: Errno::EINVAL,
                };
            }
        };

        debug!("launch: execvp argv:{:?}", argv);
        match execvp(&argv[0], &argv) {
            Ok(never) => match never {},
            Err(Errno::ENOENT) => YashError::CommandNotFound {
                program: self.program().to_string(),
            },
            Err(errno) => YashError::Exec {
                program: self.program().to_string(),
                errno,
            },
        }
    }
}
