use crate::config::RunConfig;
use crate::dispatch::Dispatcher;
use crate::report;
use crate::runner::CommandRunner;
use crate::target::ScanTarget;
use crate::types::{DiscoveredService, ReportFormat, ToolInvocation};
use eyre::{Result, WrapErr};
use futures::{stream, StreamExt};

/// Tools the pipeline can invoke; all of them must resolve on PATH before
/// a live run starts.
const REQUIRED_TOOLS: &[&str] = &["nmap", "dirb", "nikto", "hydra", "enum4linux"];

/// Aggressive all-ports service/version-detection profile for the primary
/// sweep.
const NMAP_PROFILE: &str = "-T4 -sC -sV -p- --min-rate=1000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ValidatingInput,
    PrimaryScanRunning,
    Parsing,
    Dispatching,
    Draining,
    Done,
    Aborted,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "Idle",
            Stage::ValidatingInput => "ValidatingInput",
            Stage::PrimaryScanRunning => "PrimaryScanRunning",
            Stage::Parsing => "Parsing",
            Stage::Dispatching => "Dispatching",
            Stage::Draining => "Draining",
            Stage::Done => "Done",
            Stage::Aborted => "Aborted",
        }
    }
}

/// Counts logged at `Done`. The output files remain the durable record;
/// these totals exist for the completion log line only.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunStats {
    pub services_discovered: usize,
    pub invocations: usize,
    pub failures: usize,
}

/// Drives the pipeline end to end: preflight, primary scan, parse,
/// bounded-concurrency dispatch, drain. One coordinator per run; the
/// worker pool is sized from the config and lives only inside `run`.
pub struct Coordinator {
    target: ScanTarget,
    config: RunConfig,
    runner: CommandRunner,
    format: ReportFormat,
    stage: Stage,
    required_tools: &'static [&'static str],
    scanner: &'static str,
}

impl Coordinator {
    pub fn new(target: ScanTarget, config: RunConfig, runner: CommandRunner, format: ReportFormat) -> Self {
        Self {
            target,
            config,
            runner,
            format,
            stage: Stage::Idle,
            required_tools: REQUIRED_TOOLS,
            scanner: "nmap",
        }
    }

    #[cfg(test)]
    fn with_required_tools(mut self, tools: &'static [&'static str]) -> Self {
        self.required_tools = tools;
        self
    }

    #[cfg(test)]
    fn with_scanner(mut self, scanner: &'static str) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, stage: Stage) {
        log::info!("[coordinator] stage_transition: {} -> {}", self.stage.as_str(), stage.as_str());
        self.stage = stage;
    }

    pub async fn run(&mut self) -> Result<RunStats> {
        self.enter(Stage::ValidatingInput);
        if let Err(e) = self.preflight() {
            self.enter(Stage::Aborted);
            return Err(e);
        }

        self.enter(Stage::PrimaryScanRunning);
        let primary = self.primary_scan_invocation();
        log::info!("[coordinator] primary_scan: target={} command={}", self.target.addr, primary.command);
        let outcome = self.runner.run(&primary).await;
        if !outcome.is_success() {
            log::error!("[coordinator] primary_scan_failed: target={} report={}",
                self.target.addr, primary.output_file.display());
            self.enter(Stage::Aborted);
            eyre::bail!("Primary scan failed for {}", self.target.addr);
        }

        self.enter(Stage::Parsing);
        let services = dedupe_smb(self.read_report()?);
        log::info!("[coordinator] report_parsed: services={}", services.len());

        self.enter(Stage::Dispatching);
        let dispatcher = Dispatcher::new(self.target.clone(), self.config.clone());
        let runner = self.runner;
        let workers = self.config.workers;
        log::debug!("[coordinator] worker_pool: capacity={} tasks={}", workers, services.len());

        // One dispatch task per discovered service, at most `workers` in
        // flight. Submission follows parser order; completion order is
        // unconstrained and irrelevant since output files never collide.
        let dispatcher_ref = &dispatcher;
        let runner_ref = &runner;
        let pool = stream::iter(services.iter())
            .map(move |service| dispatcher_ref.dispatch(runner_ref, service))
            .buffer_unordered(workers);

        self.enter(Stage::Draining);
        let outcomes: Vec<_> = pool.collect().await;

        let stats = RunStats {
            services_discovered: services.len(),
            invocations: outcomes.iter().map(Vec::len).sum(),
            failures: outcomes
                .iter()
                .flatten()
                .filter(|outcome| !outcome.is_success())
                .count(),
        };

        self.enter(Stage::Done);
        log::info!("[coordinator] done: target={} services={} invocations={} failed={}",
            self.target.addr, stats.services_discovered, stats.invocations, stats.failures);
        Ok(stats)
    }

    /// Abort before any execution when a required binary cannot be located.
    /// Dry runs only warn, so intended commands can be reviewed on a
    /// machine without the toolchain installed.
    fn preflight(&self) -> Result<()> {
        let missing = missing_tools(self.required_tools);
        if missing.is_empty() {
            log::debug!("[coordinator] preflight_ok: tools={:?}", self.required_tools);
            return Ok(());
        }

        if self.runner.is_dry_run() {
            log::warn!("[coordinator] preflight_missing_tools_ignored: dry_run=true missing={:?}", missing);
            return Ok(());
        }

        for tool in &missing {
            log::error!("[coordinator] required_tool_missing: tool={}", tool);
        }
        eyre::bail!("Required tools not found on PATH: {}", missing.join(", "))
    }

    fn primary_scan_invocation(&self) -> ToolInvocation {
        // The address is a validated dotted quad, safe to embed verbatim.
        let command = match self.format {
            ReportFormat::Text => format!("{} {} {}", self.scanner, NMAP_PROFILE, self.target.addr),
            ReportFormat::Xml => format!("{} {} -oX - {}", self.scanner, NMAP_PROFILE, self.target.addr),
        };
        ToolInvocation {
            tool: self.scanner,
            command,
            output_file: self.target.report_file(self.format),
            timeout: self.config.nmap.timeout(),
        }
    }

    fn read_report(&self) -> Result<Vec<DiscoveredService>> {
        let path = self.target.report_file(self.format);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) if self.runner.is_dry_run() => {
                log::info!("[coordinator] report_missing_in_dry_run: path={}", path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).wrap_err_with(|| format!("Failed to read scan report: {}", path.display()));
            }
        };
        Ok(report::parse_report(self.format, &content))
    }
}

/// The SMB follow-up targets the bare address and writes a file that is not
/// port-qualified, so a host exposing both `smb` and `netbios-ssn` must
/// enumerate only once or two concurrent writers would share one path.
fn dedupe_smb(services: Vec<DiscoveredService>) -> Vec<DiscoveredService> {
    let mut seen_smb = false;
    services
        .into_iter()
        .filter(|service| {
            if crate::dispatch::ServiceKind::from_raw(&service.service) == crate::dispatch::ServiceKind::Smb {
                if seen_smb {
                    log::debug!("[coordinator] smb_duplicate_ignored: port={} service={}",
                        service.port, service.service);
                    return false;
                }
                seen_smb = true;
            }
            true
        })
        .collect()
}

fn missing_tools(required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|tool| !binary_on_path(tool))
        .collect()
}

fn binary_on_path(name: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(name).is_file())
}
