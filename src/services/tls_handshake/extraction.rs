// src/services/tls_handshake/extraction.rs

use crate::models::probe_result::ProbeResult;
use crate::services::tls_handshake::primer::PrimedHandshake;
use crate::services::tls_parser::{CURVE_TYPE_NAMED, ServerHelloRecord};

/// Builds the result from what the handshake collected. No I/O.
pub fn extract(server_hello: &ServerHelloRecord, primed: PrimedHandshake) -> ProbeResult {
    let (curve_type, named_curve) = match primed.key_exchange.as_deref() {
        Some([curve_type, rest @ ..]) => {
            // Explicit curve parameters are left undecoded.
            let named_curve = match rest {
                [hi, lo, ..] if *curve_type == CURVE_TYPE_NAMED => {
                    Some(u16::from_be_bytes([*hi, *lo]))
                }
                _ => None,
            };
            (Some(*curve_type), named_curve)
        }
        _ => (None, None),
    };

    ProbeResult {
        cipher_suite: server_hello.cipher_suite,
        version: server_hello.negotiated_version(),
        curve_type,
        named_curve,
        certificates: primed.certificates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tls_parser::{VERSION_TLS12, VERSION_TLS13};

    fn hello(cipher_suite: u16) -> ServerHelloRecord {
        ServerHelloRecord {
            version: VERSION_TLS12,
            random: [0; 32],
            session_id: Vec::new(),
            cipher_suite,
            compression_method: 0,
            ocsp_stapling: false,
            supported_version: None,
        }
    }

    fn primed(key_exchange: Option<Vec<u8>>) -> PrimedHandshake {
        PrimedHandshake {
            certificates: vec![b"leaf".to_vec(), b"intermediate".to_vec()],
            key_exchange,
        }
    }

    #[test]
    fn named_curve_is_decoded() {
        let result = extract(&hello(0xC02F), primed(Some(vec![0x03, 0x00, 0x17, 0x41])));
        assert_eq!(result.curve_type, Some(3));
        assert_eq!(result.named_curve, Some(23));
        assert_eq!(result.cipher_suite, 0xC02F);
        assert_eq!(result.version, VERSION_TLS12);
    }

    #[test]
    fn explicit_curve_leaves_named_curve_absent() {
        let result = extract(&hello(0xC02F), primed(Some(vec![0x01, 0x00, 0x17, 0x41])));
        assert_eq!(result.curve_type, Some(1));
        assert_eq!(result.named_curve, None);
    }

    #[test]
    fn no_key_exchange_means_no_curve_fields() {
        let result = extract(&hello(0x002F), primed(None));
        assert_eq!(result.curve_type, None);
        assert_eq!(result.named_curve, None);
        assert_eq!(
            result.certificates,
            vec![b"leaf".to_vec(), b"intermediate".to_vec()]
        );
    }

    #[test]
    fn supported_versions_selection_is_reported() {
        let mut sh = hello(0x1301);
        sh.supported_version = Some(VERSION_TLS13);
        assert_eq!(extract(&sh, primed(None)).version, VERSION_TLS13);
    }
}
