use crate::models::probe_result::ProbeResult;
use crate::services::certificate_parser::CertificateSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub target: String,
    pub address: String,
    pub version: String,
    pub cipher_suite_name: String,
    pub curve_name: Option<String>,
    pub probe: ProbeResult,
    pub certificates: Vec<CertificateSummary>,
    pub scanned_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Outcome of one single-version probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionSupport {
    pub version: String,
    pub supported: bool,
    pub cipher_suite_name: Option<String>,
    pub error: Option<String>,
}
