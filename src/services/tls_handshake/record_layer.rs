// src/services/tls_handshake/record_layer.rs
// Plaintext record framing and handshake reassembly for the hello flight.

use crate::services::errors::{TlsParserError, TransportError};
use crate::services::tls_handshake::messages::{
    InboundMessage, MessageKind, decode_handshake_message,
};
use crate::services::tls_parser::{
    MAX_CIPHERTEXT, RECORD_HEADER_LEN, RecordHeader, TlsContentType, parse_alert,
    peek_handshake_message,
};
use std::io::{Read, Write};
use tracing::trace;

/// What the handshake state machine needs from a connection.
pub trait HandshakeTransport {
    /// Writes already-framed record bytes.
    fn write_record(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
    /// Blocks until one whole message is available.
    fn read_handshake(&mut self) -> Result<InboundMessage, TransportError>;
}

pub struct RecordConn<S> {
    stream: S,
    handshake_buffer: Vec<u8>,
    records_read: usize,
}

impl<S: Read + Write> RecordConn<S> {
    pub fn new(stream: S) -> Self {
        RecordConn {
            stream,
            handshake_buffer: Vec::new(),
            records_read: 0,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    fn read_record(&mut self) -> Result<(RecordHeader, Vec<u8>), TransportError> {
        let mut header_bytes = [0u8; RECORD_HEADER_LEN];
        self.stream.read_exact(&mut header_bytes)?;
        let header = RecordHeader::parse(&header_bytes);

        if header.length > MAX_CIPHERTEXT {
            return Err(TransportError::RecordOverflow(header.length));
        }

        let mut payload = vec![0u8; header.length];
        self.stream.read_exact(&mut payload)?;
        self.records_read += 1;

        trace!(
            record = self.records_read,
            content_type = header.content_type,
            version = header.version,
            length = header.length,
            "read record"
        );
        Ok((header, payload))
    }

    /// Pops a complete handshake message off the reassembly buffer, if any.
    fn next_buffered_message(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        let Some((msg_type, length)) = peek_handshake_message(&self.handshake_buffer)? else {
            return Ok(None);
        };
        let body: Vec<u8> = self.handshake_buffer.drain(..4 + length).skip(4).collect();
        trace!(msg_type, length, "reassembled handshake message");
        Ok(Some(decode_handshake_message(msg_type, &body)?))
    }

    /// Non-handshake records may not split a handshake message.
    fn reject_if_interleaved(&self, kind: MessageKind) -> Result<(), TransportError> {
        if self.handshake_buffer.is_empty() {
            Ok(())
        } else {
            Err(TlsParserError::Interleaved(kind).into())
        }
    }
}

impl<S: Read + Write> HandshakeTransport for RecordConn<S> {
    fn write_record(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        trace!(bytes = bytes.len(), "wrote records");
        Ok(())
    }

    fn read_handshake(&mut self) -> Result<InboundMessage, TransportError> {
        loop {
            if let Some(message) = self.next_buffered_message()? {
                return Ok(message);
            }

            let (header, payload) = self.read_record()?;
            match TlsContentType::try_from_u8(header.content_type) {
                Some(TlsContentType::Handshake) => {
                    self.handshake_buffer.extend_from_slice(&payload);
                }
                Some(TlsContentType::Alert) => {
                    let (level, description) = parse_alert(&payload)?;
                    return Err(TransportError::Alert { level, description });
                }
                Some(TlsContentType::ChangeCipherSpec) => {
                    self.reject_if_interleaved(MessageKind::ChangeCipherSpec)?;
                    return Ok(InboundMessage::ChangeCipherSpec);
                }
                Some(TlsContentType::ApplicationData) => {
                    self.reject_if_interleaved(MessageKind::ApplicationData)?;
                    return Ok(InboundMessage::ApplicationData);
                }
                None => {
                    return Err(TlsParserError::InvalidContentType(header.content_type).into());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    /// In-memory duplex stream: reads from canned bytes, records writes.
    struct Duplex {
        input: Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn conn(input: Vec<u8>) -> RecordConn<Duplex> {
        RecordConn::new(Duplex {
            input: Cursor::new(input),
            written: Vec::new(),
        })
    }

    fn record(content_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut r = vec![content_type, 0x03, 0x03];
        r.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        r.extend_from_slice(payload);
        r
    }

    fn handshake(msg_type: u8, body: &[u8]) -> Vec<u8> {
        let mut m = vec![msg_type];
        m.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
        m.extend_from_slice(body);
        m
    }

    #[test]
    fn coalesced_messages_are_returned_one_at_a_time() {
        let mut payload = handshake(0x16, &[1, 2, 3]);
        payload.extend(handshake(0x0E, &[]));
        let mut c = conn(record(0x16, &payload));

        assert_eq!(
            c.read_handshake().unwrap(),
            InboundMessage::CertificateStatus(vec![1, 2, 3])
        );
        assert_eq!(c.read_handshake().unwrap(), InboundMessage::ServerHelloDone);
    }

    #[test]
    fn message_spanning_records_is_reassembled() {
        let msg = handshake(0x0C, &[3, 0, 0x17, 4, 9, 9, 9, 9]);
        let (a, b) = msg.split_at(6);
        let mut input = record(0x16, a);
        input.extend(record(0x16, b));
        let mut c = conn(input);

        assert_eq!(
            c.read_handshake().unwrap(),
            InboundMessage::ServerKeyExchange(vec![3, 0, 0x17, 4, 9, 9, 9, 9])
        );
    }

    #[test]
    fn alert_record_is_an_error() {
        let mut c = conn(record(0x15, &[2, 40]));
        assert!(matches!(
            c.read_handshake(),
            Err(TransportError::Alert {
                level: 2,
                description: 40
            })
        ));
    }

    #[test]
    fn change_cipher_spec_is_surfaced_as_message() {
        let mut c = conn(record(0x14, &[1]));
        assert_eq!(c.read_handshake().unwrap(), InboundMessage::ChangeCipherSpec);
    }

    #[test]
    fn change_cipher_spec_inside_split_message_is_rejected() {
        let msg = handshake(0x0B, &[0, 0, 3, 0, 0, 0]);
        let mut input = record(0x16, &msg[..5]);
        input.extend(record(0x14, &[1]));
        let mut c = conn(input);
        assert!(matches!(
            c.read_handshake(),
            Err(TransportError::Decode(TlsParserError::Interleaved(
                MessageKind::ChangeCipherSpec
            )))
        ));
    }

    #[test]
    fn eof_mid_record_is_io_error() {
        let mut bytes = record(0x16, &handshake(0x0E, &[]));
        bytes.truncate(7);
        let mut c = conn(bytes);
        assert!(matches!(c.read_handshake(), Err(TransportError::Io(_))));
    }

    #[test]
    fn oversized_record_is_rejected_before_reading_body() {
        let mut c = conn(vec![0x16, 0x03, 0x03, 0xFF, 0xFF]);
        assert!(matches!(
            c.read_handshake(),
            Err(TransportError::RecordOverflow(0xFFFF))
        ));
    }

    #[test]
    fn unknown_content_type_is_decode_error() {
        let mut c = conn(record(0x42, &[0]));
        assert!(matches!(
            c.read_handshake(),
            Err(TransportError::Decode(TlsParserError::InvalidContentType(0x42)))
        ));
    }

    #[test]
    fn write_record_passes_bytes_through() {
        let mut c = conn(Vec::new());
        c.write_record(&[0x16, 0x03, 0x01, 0x00, 0x00]).unwrap();
        assert_eq!(c.get_ref().written, vec![0x16, 0x03, 0x01, 0x00, 0x00]);
    }
}
