use std::path::PathBuf;
use std::time::Duration;

/// Format of the primary scan report on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Xml,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Xml => "xml",
        }
    }
}

/// One external command to run, fully assembled: the shell-quoted command
/// line, the file its combined stdout/stderr is captured into, and an
/// optional wall-clock limit. Built immediately before execution and
/// consumed exactly once by the runner.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub tool: &'static str,
    pub command: String,
    pub output_file: PathBuf,
    pub timeout: Option<Duration>,
}

/// An open TCP port and the service name the scanner reported on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredService {
    pub port: u16,
    pub service: String,
}

impl DiscoveredService {
    pub fn new(port: u16, service: impl Into<String>) -> Self {
        Self {
            port,
            service: service.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The process ran to completion with a non-zero status.
    Exit(Option<i32>),
    /// The configured limit elapsed and the process was killed.
    Timeout,
    /// The process could not be started at all.
    Launch,
}

/// What happened to one ToolInvocation. The output file is the durable
/// record either way; outcomes are logged, never aggregated.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    Success { output_file: PathBuf },
    Failure { kind: FailureKind, output_file: PathBuf },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }

    pub fn output_file(&self) -> &PathBuf {
        match self {
            ExecutionOutcome::Success { output_file } => output_file,
            ExecutionOutcome::Failure { output_file, .. } => output_file,
        }
    }
}
