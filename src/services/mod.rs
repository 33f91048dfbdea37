pub mod capabilities;
pub mod certificate_parser;
pub mod cipher_suites;
pub mod errors;
pub mod scanner;
pub mod tls_handshake;
pub mod tls_parser;
