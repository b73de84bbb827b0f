//! Protobuf messages exchanged with peers and ordering nodes.
//!
//! # Overview
//!
//! Messages are grouped by the protocol package they belong to:
//! - [common]: envelopes, headers, blocks and channel configuration updates
//! - [msp]: serialized identities
//! - [orderer]: deliver seek requests and broadcast acknowledgements
//! - [peer]: proposals, proposal responses and system chaincode payloads
//!
//! Field numbers match the definitions used by remote nodes exactly, so any message built here can
//! be decoded by a node (and vice versa). Encoding and decoding is provided by [prost::Message].
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use fabric_wire::common::Envelope;
//! use prost::Message;
//!
//! let envelope = Envelope {
//!     payload: Bytes::from_static(b"payload"),
//!     signature: Bytes::from_static(b"signature"),
//! };
//! let encoded = envelope.encode_to_vec();
//! let decoded = Envelope::decode(encoded.as_slice()).unwrap();
//! assert_eq!(envelope, decoded);
//! ```

pub mod common;
pub mod msp;
pub mod orderer;
pub mod peer;

/// A point in time independent of any time zone or calendar.
///
/// Mirrors `google.protobuf.Timestamp`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Timestamp {
    /// Seconds since the Unix epoch.
    #[prost(int64, tag = "1")]
    pub seconds: i64,

    /// Non-negative fraction of a second at nanosecond resolution.
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}
