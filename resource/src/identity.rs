//! Identities and the clients that act on their behalf.

use crate::{encode, Config, Error};
use bytes::Bytes;
use fabric_wire::msp::SerializedIdentity;
use std::{fmt, sync::Arc};

/// Produces signatures on behalf of an [Identity].
///
/// Implementations typically wrap a key held in memory, on disk, or inside an HSM.
pub trait Signer: Send + Sync + 'static {
    /// Signs `message` with the private key of `identity`.
    fn sign(&self, identity: &Identity, message: &[u8]) -> Result<Bytes, Error>;
}

/// A member of an organization, as recognized by its membership service provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Identifier of the membership service provider that issued the certificate.
    pub msp_id: String,

    /// Certificate binding the member to its public key.
    pub certificate: Bytes,
}

impl Identity {
    pub fn new(msp_id: impl Into<String>, certificate: impl Into<Bytes>) -> Self {
        Self {
            msp_id: msp_id.into(),
            certificate: certificate.into(),
        }
    }

    /// Returns the encoded identity, as embedded in signature headers (the "creator").
    pub fn serialize(&self) -> Bytes {
        encode(&SerializedIdentity {
            mspid: self.msp_id.clone(),
            id_bytes: self.certificate.clone(),
        })
    }
}

/// An [Identity] paired with the means to sign as it.
#[derive(Clone)]
pub struct SigningIdentity {
    identity: Identity,
    creator: Bytes,
    signer: Arc<dyn Signer>,
}

impl SigningIdentity {
    pub fn new(identity: Identity, signer: impl Signer) -> Self {
        let creator = identity.serialize();
        Self {
            identity,
            creator,
            signer: Arc::new(signer),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns the encoded identity.
    pub fn creator(&self) -> &Bytes {
        &self.creator
    }

    /// Signs `message` as this identity.
    pub fn sign(&self, message: &[u8]) -> Result<Bytes, Error> {
        self.signer.sign(&self.identity, message)
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// The context every operation is issued from: a [Config] and (optionally) the identity to
/// sign with.
///
/// Operations that must sign fail with [Error::MissingContext] when no identity is present.
#[derive(Clone, Debug)]
pub struct Client {
    config: Config,
    identity: Option<SigningIdentity>,
}

impl Client {
    pub fn new(config: Config, identity: SigningIdentity) -> Self {
        Self {
            config,
            identity: Some(identity),
        }
    }

    /// Creates a client without a signing identity.
    pub fn anonymous(config: Config) -> Self {
        Self {
            config,
            identity: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the signing identity of the client.
    pub fn identity(&self) -> Result<&SigningIdentity, Error> {
        self.identity
            .as_ref()
            .ok_or(Error::MissingContext("signing identity"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks;
    use prost::Message;

    #[test]
    fn test_creator_is_serialized_identity() {
        let identity = mocks::signing_identity("Org1MSP");
        let decoded = SerializedIdentity::decode(identity.creator().clone()).unwrap();
        assert_eq!(decoded.mspid, "Org1MSP");
        assert_eq!(decoded.id_bytes, identity.identity().certificate);
    }

    #[test]
    fn test_anonymous_client() {
        let client = Client::anonymous(Config::default());
        assert!(matches!(
            client.identity(),
            Err(Error::MissingContext("signing identity"))
        ));
    }

    #[test]
    fn test_signing_failure_propagates() {
        let identity = SigningIdentity::new(Identity::new("Org1MSP", "cert"), mocks::FailingSigner);
        assert!(matches!(identity.sign(b"msg"), Err(Error::Signing(_))));
    }
}
