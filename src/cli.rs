use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sweep")]
#[command(about = "Service-driven recon pipeline: primary nmap sweep plus follow-up tools")]
pub struct Cli {
    /// Target host, a dotted-quad IPv4 literal
    pub target: String,

    /// Project name every output file path is derived from
    pub project: String,

    /// Log the commands that would run without executing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Log file path (defaults to a system-specific log directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Path to the JSON config document
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Capture and parse the primary scan report as XML instead of text
    #[arg(long)]
    pub xml: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}
