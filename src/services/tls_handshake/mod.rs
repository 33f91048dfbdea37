// src/services/tls_handshake/mod.rs
pub mod client_handshake;
pub mod extraction;
pub mod messages;
pub mod primer;
pub mod record_layer;
