//! Proposals, proposal responses and system chaincode payloads.

use crate::Timestamp;
use bytes::Bytes;
use std::collections::HashMap;

/// A request for a peer to simulate (and endorse) a chaincode invocation.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Proposal {
    /// An encoded [crate::common::Header].
    #[prost(bytes = "bytes", tag = "1")]
    pub header: Bytes,

    /// An encoded [ChaincodeProposalPayload].
    #[prost(bytes = "bytes", tag = "2")]
    pub payload: Bytes,

    #[prost(bytes = "bytes", tag = "3")]
    pub extension: Bytes,
}

/// A [Proposal] and the creator's signature over its encoding.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignedProposal {
    #[prost(bytes = "bytes", tag = "1")]
    pub proposal_bytes: Bytes,
    #[prost(bytes = "bytes", tag = "2")]
    pub signature: Bytes,
}

/// A peer's answer to a [SignedProposal].
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProposalResponse {
    #[prost(int32, tag = "1")]
    pub version: i32,
    #[prost(message, optional, tag = "2")]
    pub timestamp: Option<Timestamp>,
    #[prost(message, optional, tag = "4")]
    pub response: Option<Response>,
    #[prost(bytes = "bytes", tag = "5")]
    pub payload: Bytes,
    #[prost(message, optional, tag = "6")]
    pub endorsement: Option<Endorsement>,
}

/// The outcome of a chaincode invocation.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Response {
    /// An HTTP-like status code (`200` on success).
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(bytes = "bytes", tag = "3")]
    pub payload: Bytes,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Endorsement {
    #[prost(bytes = "bytes", tag = "1")]
    pub endorser: Bytes,
    #[prost(bytes = "bytes", tag = "2")]
    pub signature: Bytes,
}

#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ChaincodeId {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub version: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeInput {
    #[prost(bytes = "bytes", repeated, tag = "1")]
    pub args: Vec<Bytes>,
    #[prost(map = "string, bytes", tag = "2")]
    pub decorations: HashMap<String, Vec<u8>>,
    #[prost(bool, tag = "3")]
    pub is_init: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeSpec {
    #[prost(enumeration = "chaincode_spec::Type", tag = "1")]
    pub r#type: i32,
    #[prost(message, optional, tag = "2")]
    pub chaincode_id: Option<ChaincodeId>,
    #[prost(message, optional, tag = "3")]
    pub input: Option<ChaincodeInput>,
    #[prost(int32, tag = "4")]
    pub timeout: i32,
}

pub mod chaincode_spec {
    /// The language a chaincode is written in.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Type {
        Undefined = 0,
        Golang = 1,
        Node = 2,
        Car = 3,
        Java = 4,
    }
}

/// A chaincode package ready to be installed on a peer.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeDeploymentSpec {
    #[prost(message, optional, tag = "1")]
    pub chaincode_spec: Option<ChaincodeSpec>,
    #[prost(bytes = "bytes", tag = "3")]
    pub code_package: Bytes,
    #[prost(int32, tag = "4")]
    pub exec_env: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeInvocationSpec {
    #[prost(message, optional, tag = "1")]
    pub chaincode_spec: Option<ChaincodeSpec>,
}

/// The payload of a chaincode [Proposal].
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeProposalPayload {
    /// An encoded [ChaincodeInvocationSpec].
    #[prost(bytes = "bytes", tag = "1")]
    pub input: Bytes,

    /// Data used by the chaincode that must not be recorded on the ledger.
    #[prost(map = "string, bytes", tag = "2")]
    pub transient_map: HashMap<String, Vec<u8>>,
}

/// Stored in the `extension` field of the channel header of a chaincode [Proposal].
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeHeaderExtension {
    #[prost(message, optional, tag = "2")]
    pub chaincode_id: Option<ChaincodeId>,
}

/// The channels a peer has joined.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChannelQueryResponse {
    #[prost(message, repeated, tag = "1")]
    pub channels: Vec<ChannelInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChannelInfo {
    #[prost(string, tag = "1")]
    pub channel_id: String,
}

/// The chaincodes installed on a peer (or instantiated on a channel).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeQueryResponse {
    #[prost(message, repeated, tag = "1")]
    pub chaincodes: Vec<ChaincodeInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeInfo {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub version: String,
    #[prost(string, tag = "3")]
    pub path: String,
    #[prost(string, tag = "4")]
    pub input: String,
    #[prost(string, tag = "5")]
    pub escc: String,
    #[prost(string, tag = "6")]
    pub vscc: String,
    #[prost(bytes = "bytes", tag = "7")]
    pub id: Bytes,
}
