// src/services/scanner.rs
// Connects to a target and runs the probe over a fresh TCP connection.

use crate::config::ProbeConfig;
use crate::models::probe_result::ProbeResult;
use crate::models::scan_result::{ScanResult, VersionSupport};
use crate::services::capabilities::StaticCapabilities;
use crate::services::certificate_parser::summarize_chain;
use crate::services::cipher_suites::{cipher_suite_name, curve_name};
use crate::services::errors::ProbeError;
use crate::services::tls_handshake::client_handshake::probe;
use crate::services::tls_handshake::record_layer::RecordConn;
use crate::services::tls_parser::{TlsVersion, VERSION_TLS10, VERSION_TLS11, VERSION_TLS12};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid target: {0}")]
    InvalidTarget(String),
    #[error("Couldn't resolve address for {target}: {source}")]
    Resolve { target: String, source: io::Error },
    #[error("TCP connect to {target} failed: {source}")]
    Connect { target: String, source: io::Error },
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

impl ScanError {
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::InvalidTarget(_) => "invalid_target",
            ScanError::Resolve { .. } => "resolve",
            ScanError::Connect { .. } => "connect",
            ScanError::Probe(e) => e.kind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Accepts `host`, `host:port`, `[v6]:port` and URL-ish input such as
/// `https://host/path`.
pub fn parse_target(input: &str, default_port: u16) -> Result<Target, ScanError> {
    let trimmed = input.trim();
    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);
    let authority = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();

    if authority.is_empty() || authority.contains('\\') || authority.contains(char::is_whitespace)
    {
        return Err(ScanError::InvalidTarget(input.to_string()));
    }

    let (host, port) = if let Some(rest) = authority.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| ScanError::InvalidTarget(input.to_string()))?;
        match after.strip_prefix(':') {
            Some(port) => (host, Some(port)),
            None if after.is_empty() => (host, None),
            None => return Err(ScanError::InvalidTarget(input.to_string())),
        }
    } else if authority.matches(':').count() == 1 {
        let (host, port) = authority
            .split_once(':')
            .ok_or_else(|| ScanError::InvalidTarget(input.to_string()))?;
        (host, Some(port))
    } else {
        // Bare host, or an unbracketed IPv6 literal.
        (authority, None)
    };

    let port = match port {
        Some(p) => p
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| ScanError::InvalidTarget(input.to_string()))?,
        None => default_port,
    };
    if host.is_empty() {
        return Err(ScanError::InvalidTarget(input.to_string()));
    }

    Ok(Target {
        host: host.to_string(),
        port,
    })
}

fn connect(target: &Target, timeout: Duration) -> Result<(TcpStream, SocketAddr), ScanError> {
    let addrs: Vec<SocketAddr> = (target.host.as_str(), target.port)
        .to_socket_addrs()
        .map_err(|source| ScanError::Resolve {
            target: target.to_string(),
            source,
        })?
        .collect();

    let mut last_error = io::Error::new(io::ErrorKind::NotFound, "no addresses found");
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                let configured = stream
                    .set_read_timeout(Some(timeout))
                    .and_then(|_| stream.set_write_timeout(Some(timeout)))
                    .and_then(|_| stream.set_nodelay(true));
                if let Err(source) = configured {
                    return Err(ScanError::Connect {
                        target: target.to_string(),
                        source,
                    });
                }
                return Ok((stream, addr));
            }
            Err(e) => {
                debug!(%addr, error = %e, "connect attempt failed");
                last_error = e;
            }
        }
    }
    Err(ScanError::Connect {
        target: target.to_string(),
        source: last_error,
    })
}

/// Opens a fresh connection and probes it once with `capabilities`.
pub fn probe_target(
    target: &Target,
    capabilities: &StaticCapabilities,
    timeout: Duration,
) -> Result<(ProbeResult, SocketAddr), ScanError> {
    let (stream, addr) = connect(target, timeout)?;
    let mut conn = RecordConn::new(stream);
    let result = probe(&mut conn, capabilities)?;
    Ok((result, addr))
}

pub fn scan_domain(input: &str, config: &ProbeConfig) -> Result<ScanResult, ScanError> {
    let started = Instant::now();
    let target = parse_target(input, config.default_port)?;
    let capabilities = StaticCapabilities::from_config(config).with_server_name(&target.host);

    let (result, addr) = probe_target(&target, &capabilities, config.timeout)?;
    let version = TlsVersion::from_u16(result.version).name();
    info!(
        target = %target,
        version = %version,
        cipher_suite = %cipher_suite_name(result.cipher_suite),
        certificates = result.certificates.len(),
        "probe complete"
    );

    Ok(ScanResult {
        target: target.to_string(),
        address: addr.to_string(),
        version,
        cipher_suite_name: cipher_suite_name(result.cipher_suite),
        curve_name: result
            .named_curve
            .map(|id| curve_name(id).map(str::to_string).unwrap_or_else(|| format!("0x{:04X}", id))),
        certificates: summarize_chain(&result.certificates),
        probe: result,
        scanned_at: chrono::Utc::now(),
        duration_ms: started.elapsed().as_millis() as u64,
    })
}

/// Probes each of TLS 1.0, 1.1 and 1.2 on its own connection, offering only
/// that version. Failures are recorded per version, never retried.
pub fn scan_protocol_support(
    input: &str,
    config: &ProbeConfig,
) -> Result<Vec<VersionSupport>, ScanError> {
    let target = parse_target(input, config.default_port)?;
    let base = StaticCapabilities::from_config(config).with_server_name(&target.host);

    let support = [VERSION_TLS10, VERSION_TLS11, VERSION_TLS12]
        .into_iter()
        .map(|version| {
            let name = TlsVersion::from_u16(version).name();
            let capabilities = base.clone().with_versions(vec![version]);
            match probe_target(&target, &capabilities, config.timeout) {
                Ok((result, _)) => VersionSupport {
                    version: name,
                    supported: result.version == version,
                    cipher_suite_name: Some(cipher_suite_name(result.cipher_suite)),
                    error: None,
                },
                Err(e) => {
                    debug!(target = %target, version = %name, error = %e, "version probe failed");
                    VersionSupport {
                        version: name,
                        supported: false,
                        cipher_suite_name: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect();

    Ok(support)
}
