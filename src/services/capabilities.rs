// src/services/capabilities.rs

use crate::config::ProbeConfig;
use crate::services::cipher_suites::{CipherSuiteInfo, CipherSuiteTable};
use crate::services::tls_parser::{VERSION_TLS10, VERSION_TLS11, VERSION_TLS12, VERSION_TLS13};

/// A (hash, signature) pair as sent in signature_algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureAndHash {
    pub hash: u8,
    pub signature: u8,
}

impl SignatureAndHash {
    pub const fn new(hash: u8, signature: u8) -> Self {
        SignatureAndHash { hash, signature }
    }
}

pub const DEFAULT_SIGNATURE_ALGORITHMS: &[SignatureAndHash] = &[
    SignatureAndHash::new(4, 1), // sha256, rsa
    SignatureAndHash::new(4, 3), // sha256, ecdsa
    SignatureAndHash::new(5, 1), // sha384, rsa
    SignatureAndHash::new(5, 3), // sha384, ecdsa
    SignatureAndHash::new(6, 1), // sha512, rsa
    SignatureAndHash::new(6, 3), // sha512, ecdsa
    SignatureAndHash::new(2, 1), // sha1, rsa
    SignatureAndHash::new(2, 3), // sha1, ecdsa
];

// x25519, secp256r1, secp384r1, secp521r1
pub const DEFAULT_CURVES: &[u16] = &[0x001D, 0x0017, 0x0018, 0x0019];

const ALL_VERSIONS: &[u16] = &[VERSION_TLS13, VERSION_TLS12, VERSION_TLS11, VERSION_TLS10];

/// Everything a probe needs to know about what to offer and how to read the answer.
pub trait CapabilityProvider {
    /// Candidate versions, most preferred first.
    fn versions(&self) -> Vec<u16>;
    fn cipher_suites(&self) -> Vec<u16>;
    fn signature_algorithms(&self) -> Vec<SignatureAndHash>;
    fn curves(&self) -> Vec<u16>;
    fn server_name(&self) -> Option<String>;
    fn lookup(&self, cipher_suite: u16) -> Option<CipherSuiteInfo>;

    fn is_elliptic_curve(&self, cipher_suite: u16) -> bool {
        self.lookup(cipher_suite)
            .map(|info| info.elliptic_curve)
            .unwrap_or(false)
    }
}

/// Snapshot of a provider's answers, taken once per probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationRequest {
    pub versions: Vec<u16>,
    pub cipher_suites: Vec<u16>,
    pub signature_algorithms: Vec<SignatureAndHash>,
    pub curves: Vec<u16>,
    pub server_name: Option<String>,
}

impl NegotiationRequest {
    pub fn from_provider<P: CapabilityProvider + ?Sized>(provider: &P) -> Self {
        NegotiationRequest {
            versions: provider.versions(),
            cipher_suites: provider.cipher_suites(),
            signature_algorithms: provider.signature_algorithms(),
            curves: provider.curves(),
            server_name: provider.server_name(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StaticCapabilities {
    versions: Vec<u16>,
    cipher_suites: Vec<u16>,
    signature_algorithms: Vec<SignatureAndHash>,
    curves: Vec<u16>,
    server_name: Option<String>,
    table: CipherSuiteTable,
}

impl Default for StaticCapabilities {
    fn default() -> Self {
        StaticCapabilities::for_version_range(VERSION_TLS10, VERSION_TLS12)
    }
}

impl StaticCapabilities {
    /// Offers every known version in [min, max]. A min above the max leaves
    /// no candidates, which the probe reports as a configuration error.
    pub fn for_version_range(min_version: u16, max_version: u16) -> Self {
        let table = CipherSuiteTable::default();
        let versions = ALL_VERSIONS
            .iter()
            .copied()
            .filter(|v| *v >= min_version && *v <= max_version)
            .collect();
        StaticCapabilities {
            versions,
            cipher_suites: table.offered_for(min_version, max_version),
            signature_algorithms: DEFAULT_SIGNATURE_ALGORITHMS.to_vec(),
            curves: DEFAULT_CURVES.to_vec(),
            server_name: None,
            table,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::for_version_range(config.min_version, config.max_version)
    }

    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = Some(server_name.into());
        self
    }

    /// Restricts the offer to exactly these versions, keeping suites that fit them.
    pub fn with_versions(mut self, versions: Vec<u16>) -> Self {
        if let (Some(min), Some(max)) = (versions.iter().min(), versions.iter().max()) {
            self.cipher_suites = self.table.offered_for(*min, *max);
        }
        self.versions = versions;
        self
    }

    pub fn with_cipher_suites(mut self, cipher_suites: Vec<u16>) -> Self {
        self.cipher_suites = cipher_suites;
        self
    }

    pub fn with_table(mut self, table: CipherSuiteTable) -> Self {
        self.table = table;
        self
    }
}

impl CapabilityProvider for StaticCapabilities {
    fn versions(&self) -> Vec<u16> {
        self.versions.clone()
    }

    fn cipher_suites(&self) -> Vec<u16> {
        self.cipher_suites.clone()
    }

    fn signature_algorithms(&self) -> Vec<SignatureAndHash> {
        self.signature_algorithms.clone()
    }

    fn curves(&self) -> Vec<u16> {
        self.curves.clone()
    }

    fn server_name(&self) -> Option<String> {
        self.server_name.clone()
    }

    fn lookup(&self, cipher_suite: u16) -> Option<CipherSuiteInfo> {
        self.table.lookup(cipher_suite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_offers_tls12_down_to_tls10() {
        let caps = StaticCapabilities::default();
        assert_eq!(
            caps.versions(),
            vec![VERSION_TLS12, VERSION_TLS11, VERSION_TLS10]
        );
        assert!(caps.cipher_suites().contains(&0xC02F));
        assert!(!caps.cipher_suites().contains(&0x1301));
        assert_eq!(caps.server_name(), None);
    }

    #[test]
    fn inverted_range_leaves_no_versions() {
        let caps = StaticCapabilities::for_version_range(VERSION_TLS12, VERSION_TLS10);
        assert!(caps.versions().is_empty());
    }

    #[test]
    fn with_versions_narrows_suites() {
        let caps = StaticCapabilities::default().with_versions(vec![VERSION_TLS10]);
        assert_eq!(caps.versions(), vec![VERSION_TLS10]);
        assert!(caps.cipher_suites().contains(&0xC013));
        assert!(!caps.cipher_suites().contains(&0xC02F));
    }

    #[test]
    fn request_snapshots_provider() {
        let caps = StaticCapabilities::default().with_server_name("example.org");
        let req = NegotiationRequest::from_provider(&caps);
        assert_eq!(req.server_name.as_deref(), Some("example.org"));
        assert_eq!(req.versions, caps.versions());
        assert_eq!(req.curves, DEFAULT_CURVES.to_vec());
        assert!(caps.is_elliptic_curve(0xC02B));
        assert!(!caps.is_elliptic_curve(0x0035));
        assert!(!caps.is_elliptic_curve(0xABCD));
    }
}
