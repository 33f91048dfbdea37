// src/services/errors.rs

use crate::services::tls_handshake::messages::MessageKind;
use std::io;
use thiserror::Error;

/// Failures while decoding records or handshake message bodies.
#[derive(Debug, Error)]
pub enum TlsParserError {
    #[error("Invalid content type: 0x{0:02X}")]
    InvalidContentType(u8),
    #[error("Handshake message of {0} bytes exceeds the maximum")]
    HandshakeTooLarge(usize),
    #[error("Malformed ServerHello message: {0}")]
    MalformedServerHello(&'static str),
    #[error("Malformed Certificate list: {0}")]
    MalformedCertificateList(String),
    #[error("Malformed alert record")]
    MalformedAlert,
    #[error("Handshake data interleaved with a {0} record")]
    Interleaved(MessageKind),
    #[error("Parser error: {0}")]
    GenericError(String),
}

impl From<io::Error> for TlsParserError {
    fn from(e: io::Error) -> Self {
        TlsParserError::GenericError(e.to_string())
    }
}

/// A ClientHello field that does not fit its wire-length prefix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Server name of {0} bytes exceeds the 255-byte DNS limit")]
    ServerNameTooLong(usize),
    #[error("{field} of {len} bytes exceeds its {max}-byte length field")]
    VectorTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

/// Everything the transport can report from a write or a typed read.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
    #[error("Peer sent alert (level {level}, description {description})")]
    Alert { level: u8, description: u8 },
    #[error("Record of {0} bytes exceeds the maximum record size")]
    RecordOverflow(usize),
    #[error("Decode Error: {0}")]
    Decode(#[from] TlsParserError),
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Configuration Error: {0}")]
    Configuration(String),
    #[error("Transport Error: {0}")]
    Transport(#[from] TransportError),
    #[error("Unexpected message: expected {expected}, got {actual} ({reason})")]
    UnexpectedMessage {
        expected: MessageKind,
        actual: MessageKind,
        reason: &'static str,
    },
}

impl From<EncodeError> for ProbeError {
    fn from(err: EncodeError) -> Self {
        ProbeError::Configuration(err.to_string())
    }
}

impl ProbeError {
    pub fn unexpected(expected: MessageKind, actual: MessageKind) -> Self {
        ProbeError::UnexpectedMessage {
            expected,
            actual,
            reason: "wrong message type",
        }
    }

    /// Stable classification used by callers that tally peer conformance.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Configuration(_) => "configuration",
            ProbeError::Transport(_) => "transport",
            ProbeError::UnexpectedMessage { .. } => "unexpected_message",
        }
    }
}
