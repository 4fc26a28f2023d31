//! Pure transforms from a captured scan report to the ordered list of
//! (port, service) pairs. No process or network I/O happens here, so the
//! parsers are exercised against fixture reports alone.

use crate::types::{DiscoveredService, ReportFormat};
use regex::Regex;
use std::sync::LazyLock;

const TCP_MARKER: &str = "/tcp";

// Both patterns are literals, so the unwraps cannot fire.
static PORT_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<port\s[^>]*portid="(\d+)"[^>]*>(.*?)</port>"#).unwrap());
static SERVICE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<service\s[^>]*name="([^"]*)""#).unwrap());

pub fn parse_report(format: ReportFormat, content: &str) -> Vec<DiscoveredService> {
    match format {
        ReportFormat::Text => parse_text(content),
        ReportFormat::Xml => parse_xml(content),
    }
}

/// Line-oriented mode: every line carrying the `/tcp` marker contributes a
/// pair when it has the `<port>/tcp <state> <service> ...` shape. Lines
/// that do not fit are skipped silently; zero matches is a valid outcome.
pub fn parse_text(content: &str) -> Vec<DiscoveredService> {
    let mut services = Vec::new();

    for line in content.lines() {
        if !line.contains(TCP_MARKER) {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(port_token) = tokens.next() else { continue };
        let Some(port_digits) = port_token.split('/').next() else { continue };
        let Ok(port) = port_digits.parse::<u16>() else { continue };

        // Token 1 is the port state; token 2 the service name.
        let Some(_state) = tokens.next() else { continue };
        let Some(service) = tokens.next() else { continue };

        log::trace!("[report] tcp_line_parsed: port={} service={}", port, service);
        services.push(DiscoveredService::new(port, service));
    }

    log::debug!("[report] text_parsed: lines={} services={}",
        content.lines().count(), services.len());
    services
}

/// Compatibility mode for XML reports: one pair per `<port>` element in
/// document order, taken from the nested `<service name="...">` attribute.
/// Port elements without a service name are skipped.
pub fn parse_xml(content: &str) -> Vec<DiscoveredService> {
    let mut services = Vec::new();
    for element in PORT_ELEMENT.captures_iter(content) {
        let Ok(port) = element[1].parse::<u16>() else { continue };
        let Some(name) = SERVICE_NAME.captures(&element[2]) else { continue };

        log::trace!("[report] xml_port_parsed: port={} service={}", port, &name[1]);
        services.push(DiscoveredService::new(port, &name[1]));
    }

    log::debug!("[report] xml_parsed: services={}", services.len());
    services
}
