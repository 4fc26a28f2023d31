use crate::types::ReportFormat;
use eyre::Result;
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// The host under scan plus the project name every output file is derived
/// from. Immutable once parsed; all path derivation lives here so file
/// names stay unique per (tool, port) within a run.
#[derive(Debug, Clone)]
pub struct ScanTarget {
    pub addr: Ipv4Addr,
    pub project: String,
}

impl ScanTarget {
    pub fn parse(addr: &str, project: &str) -> Result<Self> {
        let addr = match parse_dotted_quad(addr) {
            Some(ip) => ip,
            None => {
                log::error!("[target] invalid_address: input={}", addr);
                eyre::bail!("Invalid target address '{}': expected a dotted-quad IPv4 literal", addr);
            }
        };

        log::debug!("[target] parsed: addr={} project={}", addr, project);
        Ok(Self {
            addr,
            project: project.to_string(),
        })
    }

    /// Path of the primary scan report: `<project>.txt` or `<project>.xml`.
    pub fn report_file(&self, format: ReportFormat) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.project, format.extension()))
    }

    /// Path for a follow-up tool's captured output. Port-qualified when the
    /// invocation is per-port, so repeated services on different ports
    /// never collide.
    pub fn tool_output_file(&self, tool: &str, port: Option<u16>) -> PathBuf {
        match port {
            Some(port) => PathBuf::from(format!("{}_{}_{}.txt", self.project, tool, port)),
            None => PathBuf::from(format!("{}_{}.txt", self.project, tool)),
        }
    }
}

/// Strict dotted-quad check: exactly four dot-separated decimal segments,
/// each in 0-255. `Ipv4Addr::from_str` is not used directly because it
/// rejects forms like `192.168.001.1` that scanner front-ends emit.
fn parse_dotted_quad(input: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut count = 0;

    for segment in input.split('.') {
        if count == 4 {
            return None;
        }
        if segment.is_empty() || segment.len() > 3 {
            return None;
        }
        if !segment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        octets[count] = segment.parse::<u8>().ok()?;
        count += 1;
    }

    if count != 4 {
        return None;
    }
    Some(Ipv4Addr::from(octets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_valid_addresses() {
        for input in ["0.0.0.0", "127.0.0.1", "10.0.0.254", "255.255.255.255", "192.168.001.1"] {
            assert!(parse_dotted_quad(input).is_some(), "should accept {}", input);
        }
    }

    #[test]
    fn test_rejects_wrong_arity() {
        for input in ["", "10", "10.0", "10.0.0", "10.0.0.1.5", "10..0.1", "10.0.0.1."] {
            assert!(parse_dotted_quad(input).is_none(), "should reject {}", input);
        }
    }

    #[test]
    fn test_rejects_out_of_range_octets() {
        for input in ["999.1.1.1", "1.1.1.256", "300.300.300.300", "1.1.1.1000"] {
            assert!(parse_dotted_quad(input).is_none(), "should reject {}", input);
        }
    }

    #[test]
    fn test_rejects_non_numeric_segments() {
        for input in ["a.b.c.d", "1.1.1.x", "1.-1.1.1", "1.1.1.1e0", "example.com", "1.1.1. 1"] {
            assert!(parse_dotted_quad(input).is_none(), "should reject {}", input);
        }
    }

    #[test]
    fn test_report_file_follows_format() {
        let target = ScanTarget::parse("10.0.0.5", "acme").unwrap();
        assert_eq!(target.report_file(ReportFormat::Text), PathBuf::from("acme.txt"));
        assert_eq!(target.report_file(ReportFormat::Xml), PathBuf::from("acme.xml"));
    }

    #[test]
    fn test_tool_output_files_embed_port() {
        let target = ScanTarget::parse("10.0.0.5", "acme").unwrap();
        assert_eq!(
            target.tool_output_file("dirb", Some(8080)),
            PathBuf::from("acme_dirb_8080.txt")
        );
        assert_eq!(
            target.tool_output_file("enum4linux", None),
            PathBuf::from("acme_enum4linux.txt")
        );
    }
}
