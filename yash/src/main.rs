use anyhow::{Context as _, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use yash::Cli;
use yash::config::{Config, DEFAULT_LOG_FILTER};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::load(cli.prompt.clone(), cli.log_file.clone());

    if let Err(err) = init_tracing(&config) {
        eprintln!("yash: logging disabled: {err:#}");
    }
    setup_panic_handler(config.log_file.clone());

    yash::run_shell(cli, config)
}

fn init_tracing(config: &Config) -> Result<()> {
    let Some(path) = config.log_file.as_ref() else {
        return Ok(());
    };
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_writer(Arc::new(log_file))
        .init();
    Ok(())
}

fn setup_panic_handler(log_file: Option<PathBuf>) {
    std::panic::set_hook(Box::new(move |panic_info| {
        let payload = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic payload".to_string()
        };

        let location = match panic_info.location() {
            Some(location) => format!(
                "{}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            ),
            None => "Unknown location".to_string(),
        };

        let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC");
        if let Some(path) = log_file.as_ref() {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                use std::io::Write;
                let _ = writeln!(
                    file,
                    "\n=== PANIC OCCURRED ===\nTimestamp: {timestamp}\nLocation: {location}\nMessage: {payload}\n======================"
                );
            }
        }

        tracing::error!("PANIC OCCURRED: {} at {}", payload, location);
        eprintln!("\n=== yash PANIC ===");
        eprintln!("Message: {}", payload);
        eprintln!("Location: {}", location);
    }));
}
