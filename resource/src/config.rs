use bytes::Bytes;
use fabric_wire::orderer::SeekBehavior;
use sha2::{Digest, Sha256};

/// Configuration shared by all operations issued by a [crate::Client].
#[derive(Clone, Debug)]
pub struct Config {
    /// Certificate presented by the client during mutual TLS (if any).
    ///
    /// When set, its SHA-256 digest is embedded in every channel header so that a message
    /// cannot be replayed over a different transport session.
    pub tls_certificate: Option<Bytes>,

    /// How ordering nodes should treat requests for blocks that do not exist yet.
    pub seek_behavior: SeekBehavior,

    /// Channel used for peer-scoped system chaincode invocations.
    pub system_channel: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tls_certificate: None,
            seek_behavior: SeekBehavior::BlockUntilReady,
            system_channel: String::new(),
        }
    }
}

impl Config {
    /// Returns the digest of the client TLS certificate (if configured).
    pub fn tls_cert_hash(&self) -> Option<Bytes> {
        self.tls_certificate
            .as_ref()
            .map(|certificate| Bytes::copy_from_slice(&Sha256::digest(certificate)))
    }
}
