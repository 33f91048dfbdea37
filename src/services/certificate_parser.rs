// src/services/certificate_parser.rs
// Descriptive summaries of the peer's chain for reports. Nothing here validates.

use serde::Serialize;
use x509_parser::{extensions::GeneralName, prelude::*, time::ASN1Time};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CertificateSummary {
    pub position: usize,
    pub der_len: usize,
    pub subject: Option<String>,
    pub issuer: Option<String>,
    pub not_before: Option<String>,
    pub not_after: Option<String>,
    pub expired: Option<bool>,
    pub key_size: Option<usize>,
    pub signature_algorithm: Option<String>,
    pub serial_number: Option<String>,
    pub subject_alt_names: Vec<String>,
    /// Set instead of the fields above when the DER could not be parsed.
    pub error: Option<String>,
}

/// Summarizes every certificate of the chain, leaf first. Unparseable entries
/// are reported in place rather than failing the whole chain.
pub fn summarize_chain(chain: &[Vec<u8>]) -> Vec<CertificateSummary> {
    chain
        .iter()
        .enumerate()
        .map(|(position, der)| summarize_certificate(position, der))
        .collect()
}

pub fn summarize_certificate(position: usize, der: &[u8]) -> CertificateSummary {
    let cert = match X509Certificate::from_der(der) {
        Ok((_, cert)) => cert,
        Err(e) => {
            return CertificateSummary {
                position,
                der_len: der.len(),
                error: Some(format!("Failed to parse certificate: {}", e)),
                ..Default::default()
            };
        }
    };

    let validity = cert.validity();
    CertificateSummary {
        position,
        der_len: der.len(),
        subject: common_name(cert.subject()),
        issuer: common_name(cert.issuer()),
        not_before: format_asn1_time(&validity.not_before),
        not_after: format_asn1_time(&validity.not_after),
        expired: Some(validity.not_after < ASN1Time::now()),
        key_size: cert
            .public_key()
            .parsed()
            .ok()
            .map(|key| key.key_size())
            .filter(|bits| *bits > 0),
        signature_algorithm: Some(cert.signature_algorithm.algorithm.to_string()),
        serial_number: Some(format!("{:x}", cert.serial)),
        subject_alt_names: subject_alt_names(&cert),
        error: None,
    }
}

fn common_name(name: &x509_parser::x509::X509Name) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
}

fn format_asn1_time(time: &ASN1Time) -> Option<String> {
    chrono::DateTime::<chrono::Utc>::from_timestamp(time.timestamp(), 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

fn subject_alt_names(cert: &X509Certificate) -> Vec<String> {
    let mut san_list = Vec::new();
    for extension in cert.extensions() {
        if let ParsedExtension::SubjectAlternativeName(san) = extension.parsed_extension() {
            for name in &san.general_names {
                match name {
                    GeneralName::DNSName(dns) => san_list.push(dns.to_string()),
                    GeneralName::IPAddress(ip) => san_list.push(format_ip_address(ip)),
                    GeneralName::URI(uri) => san_list.push(uri.to_string()),
                    GeneralName::RFC822Name(email) => san_list.push(email.to_string()),
                    _ => {}
                }
            }
        }
    }
    san_list
}

fn format_ip_address(ip: &[u8]) -> String {
    match <[u8; 4]>::try_from(ip) {
        Ok(v4) => std::net::Ipv4Addr::from(v4).to_string(),
        Err(_) => match <[u8; 16]>::try_from(ip) {
            Ok(v6) => std::net::Ipv6Addr::from(v6).to_string(),
            Err(_) => format!("IP:{}", hex::encode(ip)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_der_is_reported_not_fatal() {
        let summaries = summarize_chain(&[b"not a certificate".to_vec(), Vec::new()]);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].position, 0);
        assert_eq!(summaries[0].der_len, 17);
        assert!(summaries[0].error.is_some());
        assert!(summaries[0].subject.is_none());
        assert_eq!(summaries[1].position, 1);
        assert!(summaries[1].error.is_some());
    }

    #[test]
    fn ip_addresses_are_formatted() {
        assert_eq!(format_ip_address(&[192, 0, 2, 7]), "192.0.2.7");
        let mut v6 = [0u8; 16];
        v6[15] = 1;
        assert_eq!(format_ip_address(&v6), "::1");
        assert_eq!(format_ip_address(&[1, 2]), "IP:0102");
    }
}
