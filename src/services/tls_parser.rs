// src/services/tls_parser.rs

use super::errors::{EncodeError, TlsParserError};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};

// --- Public Constants for TLS Protocol Values ---
// TLS Versions
pub const VERSION_TLS10: u16 = 0x0301;
pub const VERSION_TLS11: u16 = 0x0302;
pub const VERSION_TLS12: u16 = 0x0303;
pub const VERSION_TLS13: u16 = 0x0304;

/// Highest value ever placed in the ClientHello version field. Newer versions
/// are only offered through the supported_versions extension.
pub const LEGACY_VERSION_CEILING: u16 = VERSION_TLS12;

/// Record version used for the first flight; some servers reject anything newer here.
pub const RECORD_VERSION_HELLO: u16 = VERSION_TLS10;

// Record layer limits
pub const RECORD_HEADER_LEN: usize = 5;
pub const MAX_PLAINTEXT: usize = 16384;
pub const MAX_CIPHERTEXT: usize = MAX_PLAINTEXT + 2048;
pub const MAX_HANDSHAKE: usize = 65536;

// ClientHello specific
pub const COMPRESSION_METHOD_NULL: u8 = 0x00;
pub const POINT_FORMAT_UNCOMPRESSED: u8 = 0x00;
pub const STATUS_TYPE_OCSP: u8 = 0x01;
pub const SNI_HOSTNAME_TYPE: u8 = 0x00;

// Extension Types (2 bytes)
pub const EXTENSION_TYPE_SERVER_NAME: u16 = 0x0000;
pub const EXTENSION_TYPE_STATUS_REQUEST: u16 = 0x0005;
pub const EXTENSION_TYPE_SUPPORTED_GROUPS: u16 = 0x000A;
pub const EXTENSION_TYPE_EC_POINT_FORMATS: u16 = 0x000B;
pub const EXTENSION_TYPE_SIGNATURE_ALGORITHMS: u16 = 0x000D;
pub const EXTENSION_TYPE_SUPPORTED_VERSIONS: u16 = 0x002B;
pub const EXTENSION_TYPE_RENEGOTIATION_INFO: u16 = 0xFF01;

/// ServerKeyExchange curve type for a registered named curve.
pub const CURVE_TYPE_NAMED: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TlsContentType {
    ChangeCipherSpec = 0x14,
    Alert = 0x15,
    Handshake = 0x16,
    ApplicationData = 0x17,
}

impl TlsContentType {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn try_from_u8(value: u8) -> Option<Self> {
        match value {
            0x14 => Some(TlsContentType::ChangeCipherSpec),
            0x15 => Some(TlsContentType::Alert),
            0x16 => Some(TlsContentType::Handshake),
            0x17 => Some(TlsContentType::ApplicationData),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum HandshakeMessageType {
    HelloRequest = 0x00,
    ClientHello = 0x01,
    ServerHello = 0x02,
    NewSessionTicket = 0x04,
    EncryptedExtensions = 0x08,
    Certificate = 0x0B,
    ServerKeyExchange = 0x0C,
    CertificateRequest = 0x0D,
    ServerHelloDone = 0x0E,
    CertificateVerify = 0x0F,
    ClientKeyExchange = 0x10,
    Finished = 0x14,
    CertificateStatus = 0x16,
}

impl HandshakeMessageType {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn try_from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(HandshakeMessageType::HelloRequest),
            0x01 => Some(HandshakeMessageType::ClientHello),
            0x02 => Some(HandshakeMessageType::ServerHello),
            0x04 => Some(HandshakeMessageType::NewSessionTicket),
            0x08 => Some(HandshakeMessageType::EncryptedExtensions),
            0x0B => Some(HandshakeMessageType::Certificate),
            0x0C => Some(HandshakeMessageType::ServerKeyExchange),
            0x0D => Some(HandshakeMessageType::CertificateRequest),
            0x0E => Some(HandshakeMessageType::ServerHelloDone),
            0x0F => Some(HandshakeMessageType::CertificateVerify),
            0x10 => Some(HandshakeMessageType::ClientKeyExchange),
            0x14 => Some(HandshakeMessageType::Finished),
            0x16 => Some(HandshakeMessageType::CertificateStatus),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVersion {
    TLS1_0, // 0x0301
    TLS1_1, // 0x0302
    TLS1_2, // 0x0303
    TLS1_3, // 0x0304
    Unknown(u16),
}

impl TlsVersion {
    pub fn from_u16(value: u16) -> Self {
        match value {
            VERSION_TLS10 => TlsVersion::TLS1_0,
            VERSION_TLS11 => TlsVersion::TLS1_1,
            VERSION_TLS12 => TlsVersion::TLS1_2,
            VERSION_TLS13 => TlsVersion::TLS1_3,
            other => TlsVersion::Unknown(other),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            TlsVersion::TLS1_0 => VERSION_TLS10,
            TlsVersion::TLS1_1 => VERSION_TLS11,
            TlsVersion::TLS1_2 => VERSION_TLS12,
            TlsVersion::TLS1_3 => VERSION_TLS13,
            TlsVersion::Unknown(v) => *v,
        }
    }

    /// Accepts "1.2", "tls1.2" or "TLSv1.2" style names.
    pub fn parse_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        let digits = lowered
            .trim_start_matches("tlsv")
            .trim_start_matches("tls")
            .trim();
        match digits {
            "1.0" | "1" => Some(TlsVersion::TLS1_0),
            "1.1" => Some(TlsVersion::TLS1_1),
            "1.2" => Some(TlsVersion::TLS1_2),
            "1.3" => Some(TlsVersion::TLS1_3),
            _ => None,
        }
    }

    pub fn name(&self) -> String {
        match self {
            TlsVersion::TLS1_0 => "TLS 1.0".to_string(),
            TlsVersion::TLS1_1 => "TLS 1.1".to_string(),
            TlsVersion::TLS1_2 => "TLS 1.2".to_string(),
            TlsVersion::TLS1_3 => "TLS 1.3".to_string(),
            TlsVersion::Unknown(v) => format!("unknown (0x{:04X})", v),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Extension {
    pub extension_type: u16,
    pub payload: Vec<u8>,
}

impl Extension {
    pub fn new(extension_type: u16, payload: &[u8]) -> Self {
        Extension {
            extension_type,
            payload: payload.to_vec(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let length = u16_length("extension payload", self.payload.len())?;
        let mut bytes = Vec::with_capacity(4 + self.payload.len());
        bytes.extend_from_slice(&self.extension_type.to_be_bytes());
        bytes.extend_from_slice(&length.to_be_bytes());
        bytes.extend_from_slice(&self.payload);
        Ok(bytes)
    }
}

/// Length prefix for a vector with a 2-byte length field.
pub fn u16_length(field: &'static str, len: usize) -> Result<u16, EncodeError> {
    u16::try_from(len).map_err(|_| EncodeError::VectorTooLong {
        field,
        len,
        max: u16::MAX as usize,
    })
}

/// Length prefix for a vector with a 1-byte length field.
pub fn u8_length(field: &'static str, len: usize) -> Result<u8, EncodeError> {
    u8::try_from(len).map_err(|_| EncodeError::VectorTooLong {
        field,
        len,
        max: u8::MAX as usize,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub content_type: u8,
    pub version: u16,
    pub length: usize,
}

impl RecordHeader {
    pub fn parse(header: &[u8; RECORD_HEADER_LEN]) -> Self {
        RecordHeader {
            content_type: header[0],
            version: u16::from_be_bytes([header[1], header[2]]),
            length: u16::from_be_bytes([header[3], header[4]]) as usize,
        }
    }
}

/// ServerHello as received from the peer. Read-only once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHelloRecord {
    pub version: u16,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    pub cipher_suite: u16,
    pub compression_method: u8,
    pub ocsp_stapling: bool,
    pub supported_version: Option<u16>,
}

impl ServerHelloRecord {
    /// The version actually agreed on: the supported_versions selection when present.
    pub fn negotiated_version(&self) -> u16 {
        self.supported_version.unwrap_or(self.version)
    }
}

/// Splits the front of a reassembly buffer into (type, body length) once a
/// whole handshake message is available.
pub fn peek_handshake_message(buffer: &[u8]) -> Result<Option<(u8, usize)>, TlsParserError> {
    if buffer.len() < 4 {
        return Ok(None);
    }
    let length = u32::from_be_bytes([0, buffer[1], buffer[2], buffer[3]]) as usize;
    if length > MAX_HANDSHAKE {
        return Err(TlsParserError::HandshakeTooLarge(length));
    }
    if buffer.len() < 4 + length {
        return Ok(None);
    }
    Ok(Some((buffer[0], length)))
}

pub fn parse_alert(payload: &[u8]) -> Result<(u8, u8), TlsParserError> {
    match payload {
        [level, description] => Ok((*level, *description)),
        _ => Err(TlsParserError::MalformedAlert),
    }
}

pub fn parse_server_hello_content(payload: &[u8]) -> Result<ServerHelloRecord, TlsParserError> {
    if payload.len() < 38 {
        return Err(TlsParserError::MalformedServerHello("too short"));
    }
    let mut cursor = Cursor::new(payload);

    let version = cursor.read_u16::<BigEndian>()?;
    let mut random = [0u8; 32];
    cursor.read_exact(&mut random)?;

    let session_id_len = cursor.read_u8()? as usize;
    if session_id_len > 32 || cursor.position() as usize + session_id_len + 3 > payload.len() {
        return Err(TlsParserError::MalformedServerHello("bad session id"));
    }
    let mut session_id = vec![0u8; session_id_len];
    cursor.read_exact(&mut session_id)?;

    let cipher_suite = cursor.read_u16::<BigEndian>()?;
    let compression_method = cursor.read_u8()?;

    let mut hello = ServerHelloRecord {
        version,
        random,
        session_id,
        cipher_suite,
        compression_method,
        ocsp_stapling: false,
        supported_version: None,
    };

    let remaining = payload.len() - cursor.position() as usize;
    if remaining == 0 {
        return Ok(hello);
    }
    if remaining < 2 {
        return Err(TlsParserError::MalformedServerHello("truncated extensions"));
    }
    let extensions_len = cursor.read_u16::<BigEndian>()? as usize;
    if extensions_len != remaining - 2 {
        return Err(TlsParserError::MalformedServerHello(
            "extensions length mismatch",
        ));
    }

    while (cursor.position() as usize) < payload.len() {
        if payload.len() - (cursor.position() as usize) < 4 {
            return Err(TlsParserError::MalformedServerHello("truncated extension"));
        }
        let ext_type = cursor.read_u16::<BigEndian>()?;
        let ext_len = cursor.read_u16::<BigEndian>()? as usize;
        let start = cursor.position() as usize;
        if start + ext_len > payload.len() {
            return Err(TlsParserError::MalformedServerHello(
                "extension data length mismatch",
            ));
        }
        let ext_content = &payload[start..start + ext_len];

        match ext_type {
            EXTENSION_TYPE_STATUS_REQUEST => {
                if !ext_content.is_empty() {
                    return Err(TlsParserError::MalformedServerHello(
                        "non-empty status_request",
                    ));
                }
                hello.ocsp_stapling = true;
            }
            EXTENSION_TYPE_SUPPORTED_VERSIONS => {
                if ext_content.len() != 2 {
                    return Err(TlsParserError::MalformedServerHello(
                        "bad supported_versions",
                    ));
                }
                hello.supported_version =
                    Some(u16::from_be_bytes([ext_content[0], ext_content[1]]));
            }
            _ => {}
        }

        cursor.set_position((start + ext_len) as u64);
    }

    Ok(hello)
}

pub fn parse_certificate_list(payload: &[u8]) -> Result<Vec<Vec<u8>>, TlsParserError> {
    if payload.len() < 3 {
        return Err(TlsParserError::MalformedCertificateList(
            "missing list length".to_string(),
        ));
    }
    let mut cursor = Cursor::new(payload);
    let total_certs_len = cursor.read_u24::<BigEndian>()? as usize;

    if total_certs_len != payload.len() - 3 {
        return Err(TlsParserError::MalformedCertificateList(format!(
            "declared length ({}) does not match remaining payload ({})",
            total_certs_len,
            payload.len() - 3
        )));
    }

    let mut certificates = Vec::new();
    while (cursor.position() as usize) < payload.len() {
        if (cursor.position() as usize) + 3 > payload.len() {
            return Err(TlsParserError::MalformedCertificateList(
                "truncated certificate length".to_string(),
            ));
        }
        let cert_len = cursor.read_u24::<BigEndian>()? as usize;

        if (cursor.position() as usize) + cert_len > payload.len() {
            return Err(TlsParserError::MalformedCertificateList(format!(
                "certificate length ({}) exceeds list bounds",
                cert_len
            )));
        }

        let mut cert_bytes = vec![0; cert_len];
        cursor.read_exact(&mut cert_bytes)?;
        certificates.push(cert_bytes);
    }

    Ok(certificates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_hello_body(extensions: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&VERSION_TLS12.to_be_bytes());
        body.extend_from_slice(&[0xAB; 32]);
        body.push(4);
        body.extend_from_slice(&[1, 2, 3, 4]);
        body.extend_from_slice(&[0xC0, 0x2F]);
        body.push(0);
        if !extensions.is_empty() {
            body.extend_from_slice(&(extensions.len() as u16).to_be_bytes());
            body.extend_from_slice(extensions);
        }
        body
    }

    #[test]
    fn parses_server_hello_without_extensions() {
        let hello = parse_server_hello_content(&server_hello_body(&[])).unwrap();
        assert_eq!(hello.version, VERSION_TLS12);
        assert_eq!(hello.cipher_suite, 0xC02F);
        assert_eq!(hello.session_id, vec![1, 2, 3, 4]);
        assert!(!hello.ocsp_stapling);
        assert_eq!(hello.negotiated_version(), VERSION_TLS12);
    }

    #[test]
    fn status_request_extension_sets_ocsp_flag() {
        let mut exts = Extension::new(EXTENSION_TYPE_RENEGOTIATION_INFO, &[0])
            .to_bytes()
            .unwrap();
        exts.extend(Extension::new(EXTENSION_TYPE_STATUS_REQUEST, &[]).to_bytes().unwrap());
        let hello = parse_server_hello_content(&server_hello_body(&exts)).unwrap();
        assert!(hello.ocsp_stapling);
    }

    #[test]
    fn supported_versions_overrides_legacy_field() {
        let exts = Extension::new(EXTENSION_TYPE_SUPPORTED_VERSIONS, &[0x03, 0x04])
            .to_bytes()
            .unwrap();
        let hello = parse_server_hello_content(&server_hello_body(&exts)).unwrap();
        assert_eq!(hello.version, VERSION_TLS12);
        assert_eq!(hello.negotiated_version(), VERSION_TLS13);
    }

    #[test]
    fn oversized_extension_payload_is_not_encoded() {
        let ext = Extension::new(EXTENSION_TYPE_RENEGOTIATION_INFO, &vec![0; 0x1_0000]);
        assert_eq!(
            ext.to_bytes(),
            Err(EncodeError::VectorTooLong {
                field: "extension payload",
                len: 0x1_0000,
                max: 0xFFFF,
            })
        );
        assert_eq!(
            u8_length("points", 256).unwrap_err().to_string(),
            "points of 256 bytes exceeds its 255-byte length field"
        );
        assert_eq!(u16_length("suites", 4), Ok(4));
    }

    #[test]
    fn rejects_truncated_server_hello() {
        let body = server_hello_body(&[]);
        assert!(matches!(
            parse_server_hello_content(&body[..30]),
            Err(TlsParserError::MalformedServerHello(_))
        ));
    }

    #[test]
    fn rejects_extension_length_mismatch() {
        let mut body = server_hello_body(&Extension::new(0x0017, &[]).to_bytes().unwrap());
        body.push(0xFF);
        assert!(parse_server_hello_content(&body).is_err());
    }

    #[test]
    fn parses_certificate_list_in_order() {
        let payload = [0, 0, 9, 0, 0, 2, 0xAA, 0xBB, 0, 0, 1, 0xCC];
        let certs = parse_certificate_list(&payload).unwrap();
        assert_eq!(certs, vec![vec![0xAA, 0xBB], vec![0xCC]]);
    }

    #[test]
    fn empty_certificate_list_is_well_formed() {
        assert!(parse_certificate_list(&[0, 0, 0]).unwrap().is_empty());
    }

    #[test]
    fn certificate_overrunning_list_is_rejected() {
        let payload = [0, 0, 4, 0, 0, 9, 0xAA];
        assert!(matches!(
            parse_certificate_list(&payload),
            Err(TlsParserError::MalformedCertificateList(_))
        ));
    }

    #[test]
    fn peek_waits_for_full_message() {
        assert_eq!(peek_handshake_message(&[0x0B, 0, 0]).unwrap(), None);
        assert_eq!(peek_handshake_message(&[0x0B, 0, 0, 2, 1]).unwrap(), None);
        assert_eq!(
            peek_handshake_message(&[0x0B, 0, 0, 2, 1, 2, 9]).unwrap(),
            Some((0x0B, 2))
        );
    }

    #[test]
    fn peek_rejects_oversized_message() {
        assert!(matches!(
            peek_handshake_message(&[0x0B, 0x02, 0, 0]),
            Err(TlsParserError::HandshakeTooLarge(_))
        ));
    }

    #[test]
    fn version_names_round_trip_through_parse_name() {
        assert_eq!(TlsVersion::parse_name("1.2"), Some(TlsVersion::TLS1_2));
        assert_eq!(TlsVersion::parse_name("TLSv1.0"), Some(TlsVersion::TLS1_0));
        assert_eq!(TlsVersion::parse_name("tls1.3"), Some(TlsVersion::TLS1_3));
        assert_eq!(TlsVersion::parse_name("ssl3"), None);
        assert_eq!(TlsVersion::from_u16(0x0303).name(), "TLS 1.2");
    }
}
