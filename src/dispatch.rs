use crate::config::RunConfig;
use crate::runner::CommandRunner;
use crate::target::ScanTarget;
use crate::types::{DiscoveredService, ExecutionOutcome, ToolInvocation};

const HTTP_DEFAULT_PORT: u16 = 80;
const SSH_DEFAULT_PORT: u16 = 22;

/// Closed set of services the pipeline knows how to follow up on. Raw
/// scanner names map through SERVICE_TABLE; everything else is `Unknown`
/// and dispatches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Http,
    Ssh,
    Smb,
    Unknown,
}

const SERVICE_TABLE: &[(&str, ServiceKind)] = &[
    ("http", ServiceKind::Http),
    ("ssh", ServiceKind::Ssh),
    ("smb", ServiceKind::Smb),
    ("netbios-ssn", ServiceKind::Smb),
];

impl ServiceKind {
    /// Exact, case-sensitive match against the raw scanner token.
    pub fn from_raw(raw: &str) -> Self {
        SERVICE_TABLE
            .iter()
            .find(|(name, _)| *name == raw)
            .map(|(_, kind)| *kind)
            .unwrap_or(ServiceKind::Unknown)
    }
}

/// Maps one discovered service to its follow-up tool invocations and runs
/// them sequentially through the runner. Concurrency across services is
/// the coordinator's concern, not this component's.
#[derive(Debug)]
pub struct Dispatcher {
    target: ScanTarget,
    config: RunConfig,
}

impl Dispatcher {
    pub fn new(target: ScanTarget, config: RunConfig) -> Self {
        Self { target, config }
    }

    pub async fn dispatch(
        &self,
        runner: &CommandRunner,
        service: &DiscoveredService,
    ) -> Vec<ExecutionOutcome> {
        let plan = self.plan(service);
        let mut outcomes = Vec::with_capacity(plan.len());

        for invocation in &plan {
            outcomes.push(runner.run(invocation).await);
        }
        outcomes
    }

    /// The fixed service-to-tools policy. Every externally derived value is
    /// shell-quoted before it is embedded in a command line.
    pub fn plan(&self, service: &DiscoveredService) -> Vec<ToolInvocation> {
        let port = service.port;
        match ServiceKind::from_raw(&service.service) {
            ServiceKind::Http => {
                log::info!("[dispatch] http_service: port={} running dirb and nikto", port);
                let url = self.url("http", port, HTTP_DEFAULT_PORT);
                vec![
                    ToolInvocation {
                        tool: "dirb",
                        command: format!("dirb {}", quote(&url)),
                        output_file: self.target.tool_output_file("dirb", Some(port)),
                        timeout: self.config.dirb.timeout(),
                    },
                    ToolInvocation {
                        tool: "nikto",
                        command: format!("nikto -h {}", quote(&url)),
                        output_file: self.target.tool_output_file("nikto", Some(port)),
                        timeout: self.config.nikto.timeout(),
                    },
                ]
            }
            ServiceKind::Ssh => {
                log::info!("[dispatch] ssh_service: port={} running hydra", port);
                let url = self.url("ssh", port, SSH_DEFAULT_PORT);
                let passlist = self.config.hydra.passlist.to_string_lossy();
                vec![ToolInvocation {
                    tool: "hydra",
                    command: format!(
                        "hydra -l {} -P {} {}",
                        quote(&self.config.hydra.username),
                        quote(&passlist),
                        quote(&url),
                    ),
                    output_file: self.target.tool_output_file("hydra", Some(port)),
                    timeout: self.config.hydra.timeout(),
                }]
            }
            ServiceKind::Smb => {
                log::info!("[dispatch] smb_service: port={} running enum4linux", port);
                vec![ToolInvocation {
                    tool: "enum4linux",
                    command: format!("enum4linux {}", quote(&self.target.addr.to_string())),
                    output_file: self.target.tool_output_file("enum4linux", None),
                    timeout: self.config.enum4linux.timeout(),
                }]
            }
            ServiceKind::Unknown => {
                log::debug!("[dispatch] service_ignored: port={} service={}", port, service.service);
                Vec::new()
            }
        }
    }

    fn url(&self, scheme: &str, port: u16, default_port: u16) -> String {
        if port == default_port {
            format!("{}://{}", scheme, self.target.addr)
        } else {
            format!("{}://{}:{}", scheme, self.target.addr, port)
        }
    }
}

/// Shell-quote one externally derived value for embedding into a command
/// string. The runner splits with the same dialect, so quoted values round
/// trip into single argv entries. Nul bytes cannot be represented in an
/// argv and are stripped before quoting.
fn quote(value: &str) -> String {
    match shlex::try_quote(value) {
        Ok(quoted) => quoted.into_owned(),
        Err(_) => {
            let cleaned: String = value.chars().filter(|c| *c != '\0').collect();
            log::warn!("[dispatch] nul_stripped_from_argument: value={}", cleaned);
            quote(&cleaned)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn test_config(username: &str, passlist: &str) -> RunConfig {
        use crate::config::{HydraConfig, ToolConfig};
        RunConfig {
            log_level: "info".to_string(),
            workers: 10,
            nmap: ToolConfig { timeout: Some(3600) },
            dirb: ToolConfig { timeout: Some(900) },
            nikto: ToolConfig { timeout: Some(900) },
            hydra: HydraConfig {
                timeout: Some(900),
                username: username.to_string(),
                passlist: PathBuf::from(passlist),
            },
            enum4linux: ToolConfig { timeout: Some(600) },
        }
    }

    fn dispatcher() -> Dispatcher {
        let target = ScanTarget::parse("10.0.0.5", "acme").unwrap();
        Dispatcher::new(target, test_config("root", "/usr/share/wordlists/rockyou.txt"))
    }

    #[test]
    fn test_service_table_mapping() {
        assert_eq!(ServiceKind::from_raw("http"), ServiceKind::Http);
        assert_eq!(ServiceKind::from_raw("ssh"), ServiceKind::Ssh);
        assert_eq!(ServiceKind::from_raw("smb"), ServiceKind::Smb);
        assert_eq!(ServiceKind::from_raw("netbios-ssn"), ServiceKind::Smb);
        assert_eq!(ServiceKind::from_raw("ftp"), ServiceKind::Unknown);
        assert_eq!(ServiceKind::from_raw("HTTP"), ServiceKind::Unknown);
        assert_eq!(ServiceKind::from_raw(""), ServiceKind::Unknown);
    }

    #[test]
    fn test_http_issues_two_invocations() {
        let plan = dispatcher().plan(&DiscoveredService::new(80, "http"));
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].tool, "dirb");
        assert_eq!(plan[0].command, "dirb http://10.0.0.5");
        assert_eq!(plan[0].output_file, PathBuf::from("acme_dirb_80.txt"));
        assert_eq!(plan[1].tool, "nikto");
        assert_eq!(plan[1].command, "nikto -h http://10.0.0.5");
        assert_eq!(plan[1].output_file, PathBuf::from("acme_nikto_80.txt"));
    }

    #[test]
    fn test_http_on_alternate_port_qualifies_url_and_files() {
        let plan = dispatcher().plan(&DiscoveredService::new(8080, "http"));
        assert_eq!(plan[0].command, "dirb http://10.0.0.5:8080");
        assert_eq!(plan[0].output_file, PathBuf::from("acme_dirb_8080.txt"));
        assert_eq!(plan[1].output_file, PathBuf::from("acme_nikto_8080.txt"));
    }

    #[test]
    fn test_ssh_issues_one_hydra_invocation() {
        let plan = dispatcher().plan(&DiscoveredService::new(22, "ssh"));
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].tool, "hydra");
        assert_eq!(
            plan[0].command,
            "hydra -l root -P /usr/share/wordlists/rockyou.txt ssh://10.0.0.5"
        );
        assert_eq!(plan[0].output_file, PathBuf::from("acme_hydra_22.txt"));
    }

    #[test]
    fn test_smb_targets_bare_address_without_port_suffix() {
        for name in ["smb", "netbios-ssn"] {
            let plan = dispatcher().plan(&DiscoveredService::new(445, name));
            assert_eq!(plan.len(), 1);
            assert_eq!(plan[0].command, "enum4linux 10.0.0.5");
            assert_eq!(plan[0].output_file, PathBuf::from("acme_enum4linux.txt"));
        }
    }

    #[test]
    fn test_unknown_service_issues_nothing() {
        assert!(dispatcher().plan(&DiscoveredService::new(21, "ftp")).is_empty());
        assert!(dispatcher().plan(&DiscoveredService::new(25, "smtp")).is_empty());
    }

    #[test]
    fn test_repeated_service_across_ports_yields_unique_files() {
        let d = dispatcher();
        let mut files = HashSet::new();
        for port in [80, 8080, 8443] {
            for invocation in d.plan(&DiscoveredService::new(port, "http")) {
                assert!(files.insert(invocation.output_file.clone()),
                    "duplicate output file {:?}", invocation.output_file);
            }
        }
        assert_eq!(files.len(), 6);
    }

    #[test]
    fn test_hostile_config_values_stay_single_arguments() {
        let target = ScanTarget::parse("10.0.0.5", "acme").unwrap();
        let username = "ro\"ot; rm -rf /";
        let passlist = "/tmp/pw list$(reboot).txt";
        let d = Dispatcher::new(target, test_config(username, passlist));

        let plan = d.plan(&DiscoveredService::new(22, "ssh"));
        let argv = shlex::split(&plan[0].command).expect("command must stay parseable");

        assert_eq!(argv[0], "hydra");
        assert_eq!(argv[2], username, "username must survive quoting as one argument");
        assert_eq!(argv[4], passlist, "passlist must survive quoting as one argument");
        assert_eq!(argv.len(), 6, "no injected argument may appear");
        assert!(!argv.iter().any(|a| a == "rm" || a == "-rf" || a == "/"));
    }

    #[tokio::test]
    async fn test_dispatch_runs_full_plan_in_dry_mode() {
        let runner = CommandRunner::new(true);
        let outcomes = dispatcher()
            .dispatch(&runner, &DiscoveredService::new(80, "http"))
            .await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.is_success()));
    }
}
