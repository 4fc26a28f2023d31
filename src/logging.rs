use log::LevelFilter;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Initialize logging to an append-mode log file.
///
/// The severity threshold comes from the config document's `log_level`;
/// RUST_LOG wins when set. The destination is `--log-file` when given,
/// otherwise a system-specific log directory.
pub fn init_logging(config_level: &str, override_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let log_path = match override_path {
        Some(path) => path,
        None => default_log_file_path()?,
    };

    // Ensure the log directory exists
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| config_level.to_string())
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::Info);

    env_logger::Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)?
        )))
        .init();

    log::info!("Logging initialized to: {}", log_path.display());
    log::info!("Log level: {}", log_level);

    Ok(())
}

/// Get the system-specific log file path
pub fn default_log_file_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let log_dir = if cfg!(target_os = "macos") {
        // macOS: ~/Library/Logs/sweep/
        dirs::home_dir()
            .ok_or("Could not find home directory")?
            .join("Library")
            .join("Logs")
            .join("sweep")
    } else {
        // Linux and everything else: ~/.local/share/sweep/logs/
        dirs::data_local_dir()
            .ok_or("Could not find local data directory")?
            .join("sweep")
            .join("logs")
    };

    Ok(log_dir.join("sweep.log"))
}
