// src/services/tls_handshake/primer.rs
// Reads the Certificate / CertificateStatus / ServerKeyExchange messages that
// follow ServerHello, in order, and stops as soon as they are in hand.

use crate::services::capabilities::CapabilityProvider;
use crate::services::errors::ProbeError;
use crate::services::tls_handshake::messages::{InboundMessage, MessageKind};
use crate::services::tls_handshake::record_layer::HandshakeTransport;
use crate::services::tls_parser::ServerHelloRecord;
use tracing::debug;

/// Minimum ServerKeyExchange parameters: curve type, 2-byte curve id, point length.
pub const MIN_KEY_EXCHANGE_LEN: usize = 4;

/// Messages collected after ServerHello.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimedHandshake {
    pub certificates: Vec<Vec<u8>>,
    /// Raw ServerKeyExchange parameters, present only for elliptic-curve suites.
    pub key_exchange: Option<Vec<u8>>,
}

pub fn prime_handshake<T, P>(
    transport: &mut T,
    server_hello: &ServerHelloRecord,
    capabilities: &P,
) -> Result<PrimedHandshake, ProbeError>
where
    T: HandshakeTransport + ?Sized,
    P: CapabilityProvider + ?Sized,
{
    let certificates = match transport.read_handshake()? {
        InboundMessage::Certificate(certs) if !certs.is_empty() => certs,
        InboundMessage::Certificate(_) => {
            return Err(ProbeError::UnexpectedMessage {
                expected: MessageKind::Certificate,
                actual: MessageKind::Certificate,
                reason: "empty certificate list",
            });
        }
        other => return Err(ProbeError::unexpected(MessageKind::Certificate, other.kind())),
    };
    debug!(certificates = certificates.len(), "received Certificate");

    if server_hello.ocsp_stapling {
        match transport.read_handshake()? {
            InboundMessage::CertificateStatus(_) => debug!("received CertificateStatus"),
            other => {
                return Err(ProbeError::unexpected(
                    MessageKind::CertificateStatus,
                    other.kind(),
                ));
            }
        }
    }

    let key_exchange = if capabilities.is_elliptic_curve(server_hello.cipher_suite) {
        match transport.read_handshake()? {
            InboundMessage::ServerKeyExchange(params) if params.len() >= MIN_KEY_EXCHANGE_LEN => {
                debug!(length = params.len(), "received ServerKeyExchange");
                Some(params)
            }
            InboundMessage::ServerKeyExchange(_) => {
                return Err(ProbeError::UnexpectedMessage {
                    expected: MessageKind::ServerKeyExchange,
                    actual: MessageKind::ServerKeyExchange,
                    reason: "key exchange parameters too short",
                });
            }
            other => {
                return Err(ProbeError::unexpected(
                    MessageKind::ServerKeyExchange,
                    other.kind(),
                ));
            }
        }
    } else {
        None
    };

    Ok(PrimedHandshake {
        certificates,
        key_exchange,
    })
}
