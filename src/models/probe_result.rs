use serde::{Serialize, Serializer};

/// Negotiated parameters of one probe. Owned by the caller once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub cipher_suite: u16,
    pub version: u16,
    /// ServerKeyExchange curve type; only set for elliptic-curve suites.
    pub curve_type: Option<u8>,
    /// Only set when `curve_type` is the named-curve tag.
    pub named_curve: Option<u16>,
    /// Leaf first, exactly as sent; not validated.
    #[serde(serialize_with = "serialize_chain_hex")]
    pub certificates: Vec<Vec<u8>>,
}

fn serialize_chain_hex<S: Serializer>(chain: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(chain.iter().map(hex::encode))
}
