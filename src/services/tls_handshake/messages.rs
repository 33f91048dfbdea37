// src/services/tls_handshake/messages.rs

use crate::services::capabilities::{NegotiationRequest, SignatureAndHash};
use crate::services::errors::{EncodeError, TlsParserError};
use crate::services::tls_parser::{
    COMPRESSION_METHOD_NULL, EXTENSION_TYPE_EC_POINT_FORMATS, EXTENSION_TYPE_RENEGOTIATION_INFO,
    EXTENSION_TYPE_SERVER_NAME, EXTENSION_TYPE_SIGNATURE_ALGORITHMS,
    EXTENSION_TYPE_STATUS_REQUEST, EXTENSION_TYPE_SUPPORTED_GROUPS,
    EXTENSION_TYPE_SUPPORTED_VERSIONS, Extension, HandshakeMessageType,
    LEGACY_VERSION_CEILING, MAX_PLAINTEXT, POINT_FORMAT_UNCOMPRESSED, SNI_HOSTNAME_TYPE,
    STATUS_TYPE_OCSP, ServerHelloRecord, TlsContentType, parse_certificate_list,
    parse_server_hello_content, u8_length, u16_length,
};
use rand::Rng;
use std::fmt;
use std::net::IpAddr;

/// Longest DNS name a server_name entry may carry.
pub const MAX_SERVER_NAME_LEN: usize = 255;

/// Identity of a received message, used in expected-vs-actual errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    ServerHello,
    Certificate,
    CertificateStatus,
    ServerKeyExchange,
    ServerHelloDone,
    ChangeCipherSpec,
    ApplicationData,
    Handshake(u8),
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::ServerHello => write!(f, "ServerHello"),
            MessageKind::Certificate => write!(f, "Certificate"),
            MessageKind::CertificateStatus => write!(f, "CertificateStatus"),
            MessageKind::ServerKeyExchange => write!(f, "ServerKeyExchange"),
            MessageKind::ServerHelloDone => write!(f, "ServerHelloDone"),
            MessageKind::ChangeCipherSpec => write!(f, "ChangeCipherSpec"),
            MessageKind::ApplicationData => write!(f, "ApplicationData"),
            MessageKind::Handshake(t) => match HandshakeMessageType::try_from_u8(*t) {
                Some(known) => write!(f, "{:?}", known),
                None => write!(f, "handshake type 0x{:02X}", t),
            },
        }
    }
}

/// A typed message handed up by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    ServerHello(ServerHelloRecord),
    Certificate(Vec<Vec<u8>>),
    /// Body is kept raw; the probe only checks that it arrived.
    CertificateStatus(Vec<u8>),
    /// Raw ServerKeyExchange body: curve type, curve id, point, signature.
    ServerKeyExchange(Vec<u8>),
    ServerHelloDone,
    ChangeCipherSpec,
    ApplicationData,
    Other(u8),
}

impl InboundMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            InboundMessage::ServerHello(_) => MessageKind::ServerHello,
            InboundMessage::Certificate(_) => MessageKind::Certificate,
            InboundMessage::CertificateStatus(_) => MessageKind::CertificateStatus,
            InboundMessage::ServerKeyExchange(_) => MessageKind::ServerKeyExchange,
            InboundMessage::ServerHelloDone => MessageKind::ServerHelloDone,
            InboundMessage::ChangeCipherSpec => MessageKind::ChangeCipherSpec,
            InboundMessage::ApplicationData => MessageKind::ApplicationData,
            InboundMessage::Other(t) => MessageKind::Handshake(*t),
        }
    }
}

/// Decodes one handshake message body into its typed form.
pub fn decode_handshake_message(
    msg_type: u8,
    body: &[u8],
) -> Result<InboundMessage, TlsParserError> {
    let message = match HandshakeMessageType::try_from_u8(msg_type) {
        Some(HandshakeMessageType::ServerHello) => {
            InboundMessage::ServerHello(parse_server_hello_content(body)?)
        }
        Some(HandshakeMessageType::Certificate) => {
            InboundMessage::Certificate(parse_certificate_list(body)?)
        }
        Some(HandshakeMessageType::CertificateStatus) => {
            InboundMessage::CertificateStatus(body.to_vec())
        }
        Some(HandshakeMessageType::ServerKeyExchange) => {
            InboundMessage::ServerKeyExchange(body.to_vec())
        }
        Some(HandshakeMessageType::ServerHelloDone) => InboundMessage::ServerHelloDone,
        _ => InboundMessage::Other(msg_type),
    };
    Ok(message)
}

/// Wraps a payload into as many records as needed, each no larger than MAX_PLAINTEXT.
pub fn build_tls_records(content_type: TlsContentType, version: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 5);
    for chunk in payload.chunks(MAX_PLAINTEXT) {
        out.push(content_type.as_u8());
        out.extend_from_slice(&version.to_be_bytes());
        out.extend_from_slice(&(chunk.len() as u16).to_be_bytes());
        out.extend_from_slice(chunk);
    }
    out
}

/// Prefixes a handshake body with its type and 24-bit length.
pub fn build_handshake_message(msg_type: HandshakeMessageType, body: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(body.len() + 4);
    message.push(msg_type.as_u8());
    message.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..4]);
    message.extend_from_slice(body);
    message
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHelloRecord {
    pub version: u16,
    pub random: [u8; 32],
    pub cipher_suites: Vec<u16>,
    pub compression_methods: Vec<u8>,
    pub server_name: Option<String>,
    pub ocsp_stapling: bool,
    pub supported_curves: Vec<u16>,
    pub supported_points: Vec<u8>,
    pub signature_algorithms: Vec<SignatureAndHash>,
    pub secure_renegotiation: bool,
    /// Only filled when a candidate is above the legacy ceiling.
    pub supported_versions: Vec<u16>,
}

impl ClientHelloRecord {
    /// Builds a hello for the request. The caller must have checked that
    /// there is at least one candidate version.
    pub fn from_request(request: &NegotiationRequest, random: [u8; 32]) -> Self {
        let preferred = request.versions.first().copied().unwrap_or(LEGACY_VERSION_CEILING);
        let version = preferred.min(LEGACY_VERSION_CEILING);
        let supported_versions = if request
            .versions
            .iter()
            .any(|v| *v > LEGACY_VERSION_CEILING)
        {
            request.versions.clone()
        } else {
            Vec::new()
        };

        ClientHelloRecord {
            version,
            random,
            cipher_suites: request.cipher_suites.clone(),
            compression_methods: vec![COMPRESSION_METHOD_NULL],
            server_name: request.server_name.clone(),
            ocsp_stapling: true,
            supported_curves: request.curves.clone(),
            supported_points: vec![POINT_FORMAT_UNCOMPRESSED],
            signature_algorithms: request.signature_algorithms.clone(),
            secure_renegotiation: true,
            supported_versions,
        }
    }

    pub fn random() -> [u8; 32] {
        let mut random = [0u8; 32];
        rand::thread_rng().fill(&mut random);
        random
    }

    /// Serializes to a handshake message (type + length + body), without record framing.
    /// Fails when a field does not fit its length prefix.
    pub fn marshal(&self) -> Result<Vec<u8>, EncodeError> {
        let mut body = Vec::new();
        body.extend_from_slice(&self.version.to_be_bytes());
        body.extend_from_slice(&self.random);
        // Empty session id: no resumption.
        body.push(0);

        let suites_len = u16_length("cipher suites", self.cipher_suites.len() * 2)?;
        body.extend_from_slice(&suites_len.to_be_bytes());
        for suite in &self.cipher_suites {
            body.extend_from_slice(&suite.to_be_bytes());
        }

        body.push(u8_length("compression methods", self.compression_methods.len())?);
        body.extend_from_slice(&self.compression_methods);

        let extensions = self.extensions()?;
        if !extensions.is_empty() {
            let mut extensions_bytes = Vec::new();
            for ext in &extensions {
                extensions_bytes.extend_from_slice(&ext.to_bytes()?);
            }
            let extensions_len = u16_length("extensions", extensions_bytes.len())?;
            body.extend_from_slice(&extensions_len.to_be_bytes());
            body.extend_from_slice(&extensions_bytes);
        }

        Ok(build_handshake_message(HandshakeMessageType::ClientHello, &body))
    }

    fn extensions(&self) -> Result<Vec<Extension>, EncodeError> {
        let mut extensions = Vec::new();

        if let Some(host) = self.server_name.as_deref().and_then(sni_hostname) {
            if host.len() > MAX_SERVER_NAME_LEN {
                return Err(EncodeError::ServerNameTooLong(host.len()));
            }
            let host_len = host.len() as u16;
            let mut sni_content = Vec::new();
            sni_content.extend_from_slice(&(host_len + 3).to_be_bytes());
            sni_content.push(SNI_HOSTNAME_TYPE);
            sni_content.extend_from_slice(&host_len.to_be_bytes());
            sni_content.extend_from_slice(host.as_bytes());
            extensions.push(Extension::new(EXTENSION_TYPE_SERVER_NAME, &sni_content));
        }

        if self.ocsp_stapling {
            // status_type=ocsp, empty responder_id_list, empty request_extensions
            let status_request = [STATUS_TYPE_OCSP, 0x00, 0x00, 0x00, 0x00];
            extensions.push(Extension::new(EXTENSION_TYPE_STATUS_REQUEST, &status_request));
        }

        if !self.supported_curves.is_empty() {
            let mut groups = Vec::new();
            let groups_len = u16_length("supported groups", self.supported_curves.len() * 2)?;
            groups.extend_from_slice(&groups_len.to_be_bytes());
            for curve in &self.supported_curves {
                groups.extend_from_slice(&curve.to_be_bytes());
            }
            extensions.push(Extension::new(EXTENSION_TYPE_SUPPORTED_GROUPS, &groups));
        }

        if !self.supported_points.is_empty() {
            let mut points = vec![u8_length("point formats", self.supported_points.len())?];
            points.extend_from_slice(&self.supported_points);
            extensions.push(Extension::new(EXTENSION_TYPE_EC_POINT_FORMATS, &points));
        }

        if !self.signature_algorithms.is_empty() {
            let mut sig_algs = Vec::new();
            let sig_algs_len = u16_length(
                "signature algorithms",
                self.signature_algorithms.len() * 2,
            )?;
            sig_algs.extend_from_slice(&sig_algs_len.to_be_bytes());
            for alg in &self.signature_algorithms {
                sig_algs.push(alg.hash);
                sig_algs.push(alg.signature);
            }
            extensions.push(Extension::new(EXTENSION_TYPE_SIGNATURE_ALGORITHMS, &sig_algs));
        }

        if self.secure_renegotiation {
            extensions.push(Extension::new(EXTENSION_TYPE_RENEGOTIATION_INFO, &[0x00]));
        }

        if !self.supported_versions.is_empty() {
            let mut versions = vec![u8_length(
                "supported versions",
                self.supported_versions.len() * 2,
            )?];
            for v in &self.supported_versions {
                versions.extend_from_slice(&v.to_be_bytes());
            }
            extensions.push(Extension::new(EXTENSION_TYPE_SUPPORTED_VERSIONS, &versions));
        }

        Ok(extensions)
    }
}

/// SNI carries DNS names only: strips a trailing dot and drops IP literals.
fn sni_hostname(name: &str) -> Option<&str> {
    let host = name.trim_end_matches('.');
    if host.is_empty() || host.parse::<IpAddr>().is_ok() {
        return None;
    }
    Some(host)
}
