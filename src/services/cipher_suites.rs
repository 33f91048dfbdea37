// src/services/cipher_suites.rs

use crate::services::tls_parser::{VERSION_TLS10, VERSION_TLS12, VERSION_TLS13};

/// Facts about a cipher suite the probe needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSuiteInfo {
    pub id: u16,
    pub name: &'static str,
    /// ECDHE key exchange: the server sends a ServerKeyExchange carrying curve parameters.
    pub elliptic_curve: bool,
    pub min_version: u16,
}

const fn suite(id: u16, name: &'static str, elliptic_curve: bool, min_version: u16) -> CipherSuiteInfo {
    CipherSuiteInfo {
        id,
        name,
        elliptic_curve,
        min_version,
    }
}

// cipher suites, most preferred first
pub static CIPHER_SUITES: &[CipherSuiteInfo] = &[
    suite(0xC02C, "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384", true, VERSION_TLS12),
    suite(0xC02B, "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256", true, VERSION_TLS12),
    suite(0xC030, "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384", true, VERSION_TLS12),
    suite(0xC02F, "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256", true, VERSION_TLS12),
    suite(0xCCA9, "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256", true, VERSION_TLS12),
    suite(0xCCA8, "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256", true, VERSION_TLS12),
    suite(0x009F, "TLS_DHE_RSA_WITH_AES_256_GCM_SHA384", false, VERSION_TLS12),
    suite(0x009E, "TLS_DHE_RSA_WITH_AES_128_GCM_SHA256", false, VERSION_TLS12),
    suite(0xC024, "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA384", true, VERSION_TLS12),
    suite(0xC023, "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256", true, VERSION_TLS12),
    suite(0xC028, "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384", true, VERSION_TLS12),
    suite(0xC027, "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256", true, VERSION_TLS12),
    suite(0xC00A, "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA", true, VERSION_TLS10),
    suite(0xC009, "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA", true, VERSION_TLS10),
    suite(0xC014, "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA", true, VERSION_TLS10),
    suite(0xC013, "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA", true, VERSION_TLS10),
    suite(0xC008, "TLS_ECDHE_ECDSA_WITH_3DES_EDE_CBC_SHA", true, VERSION_TLS10),
    suite(0xC012, "TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA", true, VERSION_TLS10),
    suite(0xC007, "TLS_ECDHE_ECDSA_WITH_RC4_128_SHA", true, VERSION_TLS10),
    suite(0xC011, "TLS_ECDHE_RSA_WITH_RC4_128_SHA", true, VERSION_TLS10),
    suite(0x006B, "TLS_DHE_RSA_WITH_AES_256_CBC_SHA256", false, VERSION_TLS12),
    suite(0x0067, "TLS_DHE_RSA_WITH_AES_128_CBC_SHA256", false, VERSION_TLS12),
    suite(0x0039, "TLS_DHE_RSA_WITH_AES_256_CBC_SHA", false, VERSION_TLS10),
    suite(0x0033, "TLS_DHE_RSA_WITH_AES_128_CBC_SHA", false, VERSION_TLS10),
    suite(0x009D, "TLS_RSA_WITH_AES_256_GCM_SHA384", false, VERSION_TLS12),
    suite(0x009C, "TLS_RSA_WITH_AES_128_GCM_SHA256", false, VERSION_TLS12),
    suite(0x003D, "TLS_RSA_WITH_AES_256_CBC_SHA256", false, VERSION_TLS12),
    suite(0x003C, "TLS_RSA_WITH_AES_128_CBC_SHA256", false, VERSION_TLS12),
    suite(0x0035, "TLS_RSA_WITH_AES_256_CBC_SHA", false, VERSION_TLS10),
    suite(0x002F, "TLS_RSA_WITH_AES_128_CBC_SHA", false, VERSION_TLS10),
    suite(0x000A, "TLS_RSA_WITH_3DES_EDE_CBC_SHA", false, VERSION_TLS10),
    suite(0x0005, "TLS_RSA_WITH_RC4_128_SHA", false, VERSION_TLS10),
    suite(0x1301, "TLS_AES_128_GCM_SHA256", false, VERSION_TLS13),
    suite(0x1302, "TLS_AES_256_GCM_SHA384", false, VERSION_TLS13),
    suite(0x1303, "TLS_CHACHA20_POLY1305_SHA256", false, VERSION_TLS13),
];

/// Read-only lookup table handed to probes explicitly.
#[derive(Debug, Clone, Copy)]
pub struct CipherSuiteTable {
    suites: &'static [CipherSuiteInfo],
}

impl Default for CipherSuiteTable {
    fn default() -> Self {
        CipherSuiteTable {
            suites: CIPHER_SUITES,
        }
    }
}

impl CipherSuiteTable {
    pub fn new(suites: &'static [CipherSuiteInfo]) -> Self {
        CipherSuiteTable { suites }
    }

    pub fn lookup(&self, id: u16) -> Option<CipherSuiteInfo> {
        self.suites.iter().find(|s| s.id == id).copied()
    }

    /// Suites usable somewhere in [min_version, max_version], in table order.
    pub fn offered_for(&self, min_version: u16, max_version: u16) -> Vec<u16> {
        self.suites
            .iter()
            .filter(|s| s.min_version <= max_version)
            .filter(|s| s.min_version < VERSION_TLS13 || max_version >= VERSION_TLS13)
            .filter(|s| min_version < VERSION_TLS13 || s.min_version >= VERSION_TLS13)
            .map(|s| s.id)
            .collect()
    }
}

pub fn cipher_suite_name(id: u16) -> String {
    CipherSuiteTable::default()
        .lookup(id)
        .map(|s| s.name.to_string())
        .unwrap_or_else(|| format!("0x{:04X}", id))
}

pub fn curve_name(id: u16) -> Option<&'static str> {
    match id {
        0x0017 => Some("secp256r1"),
        0x0018 => Some("secp384r1"),
        0x0019 => Some("secp521r1"),
        0x001D => Some("x25519"),
        0x001E => Some("x448"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tls_parser::VERSION_TLS11;

    #[test]
    fn ecdhe_suites_are_flagged_elliptic() {
        let table = CipherSuiteTable::default();
        assert!(table.lookup(0xC02F).unwrap().elliptic_curve);
        assert!(!table.lookup(0x002F).unwrap().elliptic_curve);
        assert!(!table.lookup(0x009E).unwrap().elliptic_curve);
        assert!(table.lookup(0xFFFF).is_none());
    }

    #[test]
    fn offered_suites_respect_version_range() {
        let table = CipherSuiteTable::default();
        let legacy = table.offered_for(VERSION_TLS10, VERSION_TLS11);
        assert!(legacy.contains(&0xC013));
        assert!(!legacy.contains(&0xC02F));
        assert!(!legacy.contains(&0x1301));

        let modern = table.offered_for(VERSION_TLS10, VERSION_TLS13);
        assert!(modern.contains(&0x1301));
        assert!(modern.contains(&0xC02F));

        let only13 = table.offered_for(VERSION_TLS13, VERSION_TLS13);
        assert_eq!(only13, vec![0x1301, 0x1302, 0x1303]);
    }

    #[test]
    fn names_fall_back_to_hex() {
        assert_eq!(cipher_suite_name(0xC02F), "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256");
        assert_eq!(cipher_suite_name(0x1234), "0x1234");
        assert_eq!(curve_name(23), Some("secp256r1"));
        assert_eq!(curve_name(1), None);
    }
}
