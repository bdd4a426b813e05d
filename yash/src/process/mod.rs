#![allow(clippy::module_inception)]

pub mod fork;
pub mod job;
pub mod process;
pub mod redirect;
pub mod signal;
pub mod state;
pub mod wait;

pub use job::Job;
pub use process::Process;
pub use redirect::Redirect;
pub use state::JobState;
pub use wait::{WaitEvent, wait_any};
