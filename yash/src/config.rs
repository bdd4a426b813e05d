use anyhow::{Context as _, Result};
use std::path::PathBuf;

use crate::shell::APP_NAME;

pub const DEFAULT_PROMPT: &str = "# ";
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const PROMPT_ENV: &str = "YASH_PROMPT";
pub const LOG_ENV: &str = "YASH_LOG";
const LOG_FILE_NAME: &str = "yash.log";

/// Startup settings. Command-line flags win over the environment, which
/// wins over the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prompt: String,
    pub log_file: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prompt: DEFAULT_PROMPT.to_string(),
            log_file: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn load(prompt: Option<String>, log_file: Option<PathBuf>) -> Self {
        let mut config = Self::resolve(prompt, log_file, |key| std::env::var(key).ok());
        if config.log_file.is_none() {
            config.log_file = default_log_file().ok();
        }
        config
    }

    /// Merge flags with an environment lookup.
    pub fn resolve<F>(prompt: Option<String>, log_file: Option<PathBuf>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        Config {
            prompt: prompt.or_else(|| env(PROMPT_ENV)).unwrap_or(defaults.prompt),
            log_file,
            log_filter: env(LOG_ENV)
                .filter(|filter| !filter.trim().is_empty())
                .unwrap_or(defaults.log_filter),
        }
    }
}

pub fn default_log_file() -> Result<PathBuf> {
    let xdg_dir =
        xdg::BaseDirectories::with_prefix(APP_NAME).context("failed get xdg directory")?;
    xdg_dir
        .place_data_file(LOG_FILE_NAME)
        .context("failed get path")
}
