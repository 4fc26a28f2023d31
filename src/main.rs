use eyre::{Result, WrapErr};
use sweep::{CommandRunner, Coordinator, ReportFormat, RunConfig, ScanTarget};

#[tokio::main]
async fn main() -> Result<()> {
    let args = sweep::cli::parse();

    // Config carries the log threshold, so it loads before logging comes up;
    // a missing or malformed document is fatal before any scan starts.
    let config = RunConfig::load(&args.config)
        .wrap_err("Cannot start without a valid config document")?;

    if let Err(e) = sweep::init_logging(&config.log_level, args.log_file.clone()) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    log::info!("================================================================================");
    log::info!("NEW SWEEP SESSION: target={} project={} dry_run={}", args.target, args.project, args.dry_run);
    log::info!("================================================================================");

    let target = ScanTarget::parse(&args.target, &args.project)?;
    let format = if args.xml { ReportFormat::Xml } else { ReportFormat::Text };
    let runner = CommandRunner::new(args.dry_run);

    let mut coordinator = Coordinator::new(target, config, runner, format);
    coordinator.run().await?;

    Ok(())
}
