// src/services/tls_handshake/client_handshake.rs
// Abbreviated client handshake: ClientHello out, ServerHello and the
// certificate/key-exchange messages in, then stop.

use crate::models::probe_result::ProbeResult;
use crate::services::capabilities::{CapabilityProvider, NegotiationRequest};
use crate::services::errors::ProbeError;
use crate::services::tls_handshake::extraction::extract;
use crate::services::tls_handshake::messages::{
    ClientHelloRecord, InboundMessage, MessageKind, build_tls_records,
};
use crate::services::tls_handshake::primer::prime_handshake;
use crate::services::tls_handshake::record_layer::HandshakeTransport;
use crate::services::tls_parser::{RECORD_VERSION_HELLO, ServerHelloRecord, TlsContentType};
use tracing::debug;

/// Sends one ClientHello built from `request` and waits for the ServerHello.
pub fn say_hello<T>(
    transport: &mut T,
    request: &NegotiationRequest,
) -> Result<ServerHelloRecord, ProbeError>
where
    T: HandshakeTransport + ?Sized,
{
    if request.versions.is_empty() {
        return Err(ProbeError::Configuration(
            "no supported versions satisfy the configured minimum and maximum".to_string(),
        ));
    }

    let hello = ClientHelloRecord::from_request(request, ClientHelloRecord::random());
    debug!(
        version = %format!("0x{:04X}", hello.version),
        cipher_suites = hello.cipher_suites.len(),
        server_name = hello.server_name.as_deref().unwrap_or(""),
        "sending ClientHello"
    );
    let message = hello.marshal()?;
    let records = build_tls_records(TlsContentType::Handshake, RECORD_VERSION_HELLO, &message);
    transport.write_record(&records)?;

    match transport.read_handshake()? {
        InboundMessage::ServerHello(server_hello) => {
            debug!(
                version = %format!("0x{:04X}", server_hello.negotiated_version()),
                cipher_suite = %format!("0x{:04X}", server_hello.cipher_suite),
                ocsp_stapling = server_hello.ocsp_stapling,
                "received ServerHello"
            );
            Ok(server_hello)
        }
        other => Err(ProbeError::unexpected(MessageKind::ServerHello, other.kind())),
    }
}

/// Runs the abbreviated handshake over `transport` and reports what the peer
/// negotiated. Writes one ClientHello and reads two to four messages.
pub fn probe<T, P>(transport: &mut T, capabilities: &P) -> Result<ProbeResult, ProbeError>
where
    T: HandshakeTransport + ?Sized,
    P: CapabilityProvider + ?Sized,
{
    let request = NegotiationRequest::from_provider(capabilities);
    let server_hello = say_hello(transport, &request)?;
    let primed = prime_handshake(transport, &server_hello, capabilities)?;
    Ok(extract(&server_hello, primed))
}
