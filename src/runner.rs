use crate::types::{ExecutionOutcome, FailureKind, ToolInvocation};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::timeout;

/// Executes one external command with combined stdout/stderr captured into
/// the invocation's output file, enforcing the optional wall-clock limit.
/// Failures never propagate past this boundary; they are logged and folded
/// into the returned outcome.
#[derive(Debug, Clone, Copy)]
pub struct CommandRunner {
    dry_run: bool,
}

impl CommandRunner {
    pub fn new(dry_run: bool) -> Self {
        log::debug!("[runner] new: dry_run={}", dry_run);
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub async fn run(&self, invocation: &ToolInvocation) -> ExecutionOutcome {
        if self.dry_run {
            log::info!("[runner] dry_run: tool={} command={} output={}",
                invocation.tool, invocation.command, invocation.output_file.display());
            return ExecutionOutcome::Success {
                output_file: invocation.output_file.clone(),
            };
        }

        log::debug!("[runner] run: tool={} command={} output={} timeout={:?}",
            invocation.tool, invocation.command, invocation.output_file.display(),
            invocation.timeout);

        // Children are spawned from a split argv, never through a shell, so
        // quoted metacharacters in arguments stay arguments.
        let argv = match shlex::split(&invocation.command) {
            Some(argv) if !argv.is_empty() => argv,
            _ => {
                log::error!("[runner] command_unparseable: tool={} command={}",
                    invocation.tool, invocation.command);
                return self.failure(invocation, FailureKind::Launch);
            }
        };

        let stdout = match std::fs::File::create(&invocation.output_file) {
            Ok(file) => file,
            Err(e) => {
                log::error!("[runner] output_file_create_failed: tool={} path={} error={}",
                    invocation.tool, invocation.output_file.display(), e);
                return self.failure(invocation, FailureKind::Launch);
            }
        };
        // Shares the file description so stderr interleaves with stdout.
        let stderr = match stdout.try_clone() {
            Ok(file) => file,
            Err(e) => {
                log::error!("[runner] output_file_clone_failed: tool={} path={} error={}",
                    invocation.tool, invocation.output_file.display(), e);
                return self.failure(invocation, FailureKind::Launch);
            }
        };

        let mut child = match Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                log::error!("[runner] launch_failed: tool={} command={} error={}",
                    invocation.tool, invocation.command, e);
                return self.failure(invocation, FailureKind::Launch);
            }
        };

        let status = match invocation.timeout {
            Some(limit) => match timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    log::error!("[runner] command_timed_out: tool={} command={} limit={}s, terminating",
                        invocation.tool, invocation.command, limit.as_secs());
                    if let Err(e) = child.start_kill() {
                        log::warn!("[runner] kill_failed: tool={} error={}", invocation.tool, e);
                    }
                    // Reap so no zombie outlives the call.
                    let _ = child.wait().await;
                    return self.failure(invocation, FailureKind::Timeout);
                }
            },
            None => child.wait().await,
        };

        match status {
            Ok(status) if status.success() => {
                log::debug!("[runner] command_completed: tool={} output={}",
                    invocation.tool, invocation.output_file.display());
                ExecutionOutcome::Success {
                    output_file: invocation.output_file.clone(),
                }
            }
            Ok(status) => {
                log::error!("[runner] command_failed: tool={} command={} status={}",
                    invocation.tool, invocation.command, status);
                self.failure(invocation, FailureKind::Exit(status.code()))
            }
            Err(e) => {
                log::error!("[runner] wait_failed: tool={} command={} error={}",
                    invocation.tool, invocation.command, e);
                self.failure(invocation, FailureKind::Launch)
            }
        }
    }

    fn failure(&self, invocation: &ToolInvocation, kind: FailureKind) -> ExecutionOutcome {
        ExecutionOutcome::Failure {
            kind,
            output_file: invocation.output_file.clone(),
        }
    }
}
