pub mod cli;
pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod logging;
pub mod report;
pub mod runner;
pub mod target;
pub mod types;

// Re-export key types and functions at the crate root
pub use config::RunConfig;
pub use coordinator::{Coordinator, RunStats, Stage};
pub use dispatch::{Dispatcher, ServiceKind};
pub use logging::{default_log_file_path, init_logging};
pub use runner::CommandRunner;
pub use target::ScanTarget;
pub use types::{DiscoveredService, ExecutionOutcome, FailureKind, ReportFormat, ToolInvocation};
