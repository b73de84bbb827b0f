use crate::{Error, Identity};
use bytes::Bytes;
use sha2::{Digest, Sha256};

/// A deterministic [crate::Signer]: the "signature" is `sha256(creator || message)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Signer;

impl crate::Signer for Signer {
    fn sign(&self, identity: &Identity, message: &[u8]) -> Result<Bytes, Error> {
        let mut hasher = Sha256::new();
        hasher.update(identity.serialize());
        hasher.update(message);
        Ok(Bytes::copy_from_slice(&hasher.finalize()))
    }
}

/// A [crate::Signer] that always fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingSigner;

impl crate::Signer for FailingSigner {
    fn sign(&self, identity: &Identity, _: &[u8]) -> Result<Bytes, Error> {
        Err(Error::Signing(format!("no key for {}", identity.msp_id)))
    }
}
