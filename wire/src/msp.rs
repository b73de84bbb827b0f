//! Serialized identities.

use bytes::Bytes;

/// An identity as it appears in the `creator` field of a signature header.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SerializedIdentity {
    /// Identifier of the membership service provider that issued the identity.
    #[prost(string, tag = "1")]
    pub mspid: String,

    /// The identity itself (typically a PEM-encoded certificate).
    #[prost(bytes = "bytes", tag = "2")]
    pub id_bytes: Bytes,
}
