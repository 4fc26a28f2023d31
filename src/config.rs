use eyre::{Result, WrapErr};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_WORKERS: usize = 10;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Per-run tool settings, loaded once before the scan starts and shared
/// read-only with every dispatch task. Absence or malformation of the
/// document is a fatal startup error; the five tool sections are required.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Concurrent dispatch-task slots.
    #[serde(default = "default_workers")]
    pub workers: usize,

    pub nmap: ToolConfig,
    pub dirb: ToolConfig,
    pub nikto: ToolConfig,
    pub hydra: HydraConfig,
    pub enum4linux: ToolConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    /// Wall-clock limit in seconds; absent means unbounded.
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HydraConfig {
    #[serde(default)]
    pub timeout: Option<u64>,
    pub username: String,
    pub passlist: PathBuf,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl ToolConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

impl HydraConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        log::debug!("[config] load: path={}", path.display());

        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_json(&raw)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("[config] loaded: path={} workers={} log_level={}",
            path.display(), config.workers, config.log_level);
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).wrap_err("Invalid config document")?;
        if config.workers == 0 {
            eyre::bail!("Config 'workers' must be at least 1");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "log_level": "debug",
        "workers": 4,
        "nmap":       { "timeout": 3600 },
        "dirb":       { "timeout": 900 },
        "nikto":      { "timeout": 900 },
        "hydra":      { "timeout": 900, "username": "root", "passlist": "/usr/share/wordlists/rockyou.txt" },
        "enum4linux": { "timeout": 600 }
    }"#;

    #[test]
    fn test_parses_full_document() {
        let config = RunConfig::from_json(FULL).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.workers, 4);
        assert_eq!(config.nmap.timeout(), Some(Duration::from_secs(3600)));
        assert_eq!(config.hydra.username, "root");
        assert_eq!(config.hydra.passlist, PathBuf::from("/usr/share/wordlists/rockyou.txt"));
    }

    #[test]
    fn test_defaults_log_level_and_workers() {
        let raw = r#"{
            "nmap": {}, "dirb": {}, "nikto": {},
            "hydra": { "username": "admin", "passlist": "pw.txt" },
            "enum4linux": {}
        }"#;
        let config = RunConfig::from_json(raw).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.workers, 10);
        assert_eq!(config.nmap.timeout(), None);
    }

    #[test]
    fn test_rejects_missing_tool_section() {
        let raw = r#"{ "nmap": {}, "dirb": {}, "nikto": {}, "enum4linux": {} }"#;
        assert!(RunConfig::from_json(raw).is_err());
    }

    #[test]
    fn test_rejects_zero_workers() {
        let raw = r#"{
            "workers": 0,
            "nmap": {}, "dirb": {}, "nikto": {},
            "hydra": { "username": "admin", "passlist": "pw.txt" },
            "enum4linux": {}
        }"#;
        assert!(RunConfig::from_json(raw).is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(RunConfig::from_json("{ not json").is_err());
    }
}
