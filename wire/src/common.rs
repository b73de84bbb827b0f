//! Envelopes, headers, blocks and channel configuration updates.

use crate::Timestamp;
use bytes::Bytes;

/// The type of message carried in a [Payload], stored in the `type` field of [ChannelHeader].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum HeaderType {
    Message = 0,
    Config = 1,
    ConfigUpdate = 2,
    EndorserTransaction = 3,
    OrdererTransaction = 4,
    DeliverSeekInfo = 5,
    ChaincodePackage = 6,
}

/// Status codes returned by ordering nodes (modeled after HTTP status codes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Status {
    Unknown = 0,
    Success = 200,
    BadRequest = 400,
    Forbidden = 403,
    NotFound = 404,
    RequestEntityTooLarge = 413,
    InternalServerError = 500,
    NotImplemented = 501,
    ServiceUnavailable = 503,
}

/// Position of each entry in [BlockMetadata::metadata].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum BlockMetadataIndex {
    Signatures = 0,
    LastConfig = 1,
    TransactionsFilter = 2,
    Orderer = 3,
}

/// A signed message: the encoded [Payload] and the creator's signature over it.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Envelope {
    #[prost(bytes = "bytes", tag = "1")]
    pub payload: Bytes,
    #[prost(bytes = "bytes", tag = "2")]
    pub signature: Bytes,
}

/// The content of an [Envelope].
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Payload {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
    #[prost(bytes = "bytes", tag = "2")]
    pub data: Bytes,
}

/// Pairs an encoded [ChannelHeader] with an encoded [SignatureHeader].
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Header {
    #[prost(bytes = "bytes", tag = "1")]
    pub channel_header: Bytes,
    #[prost(bytes = "bytes", tag = "2")]
    pub signature_header: Bytes,
}

/// Routing and type information common to every message on a channel.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChannelHeader {
    /// One of [HeaderType] (kept as a raw integer on the wire).
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(int32, tag = "2")]
    pub version: i32,
    #[prost(message, optional, tag = "3")]
    pub timestamp: Option<Timestamp>,
    #[prost(string, tag = "4")]
    pub channel_id: String,
    #[prost(string, tag = "5")]
    pub tx_id: String,
    #[prost(uint64, tag = "6")]
    pub epoch: u64,
    #[prost(bytes = "bytes", tag = "7")]
    pub extension: Bytes,
    /// Hash of the client's TLS certificate, binding the message to a transport session.
    #[prost(bytes = "bytes", tag = "8")]
    pub tls_cert_hash: Bytes,
}

/// Identifies the creator of a message and carries the nonce used to derive its transaction ID.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignatureHeader {
    #[prost(bytes = "bytes", tag = "1")]
    pub creator: Bytes,
    #[prost(bytes = "bytes", tag = "2")]
    pub nonce: Bytes,
}

/// One entry of the append-only ledger.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Block {
    #[prost(message, optional, tag = "1")]
    pub header: Option<BlockHeader>,
    #[prost(message, optional, tag = "2")]
    pub data: Option<BlockData>,
    #[prost(message, optional, tag = "3")]
    pub metadata: Option<BlockMetadata>,
}

impl Block {
    /// Returns the sequence number of the block (if it has a header).
    pub fn number(&self) -> Option<u64> {
        self.header.as_ref().map(|header| header.number)
    }

    /// Returns the encoded transaction envelopes stored in the block.
    pub fn transactions(&self) -> &[Bytes] {
        self.data
            .as_ref()
            .map(|data| data.data.as_slice())
            .unwrap_or_default()
    }

    /// Returns the raw metadata entry stored at `index` (if any).
    pub fn metadata_entry(&self, index: BlockMetadataIndex) -> Option<&Bytes> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.metadata.get(index as usize))
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockHeader {
    #[prost(uint64, tag = "1")]
    pub number: u64,
    #[prost(bytes = "bytes", tag = "2")]
    pub previous_hash: Bytes,
    #[prost(bytes = "bytes", tag = "3")]
    pub data_hash: Bytes,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockData {
    #[prost(bytes = "bytes", repeated, tag = "1")]
    pub data: Vec<Bytes>,
}

/// Encoded [Metadata] entries, indexed by [BlockMetadataIndex].
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlockMetadata {
    #[prost(bytes = "bytes", repeated, tag = "1")]
    pub metadata: Vec<Bytes>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Metadata {
    #[prost(bytes = "bytes", tag = "1")]
    pub value: Bytes,
    #[prost(message, repeated, tag = "2")]
    pub signatures: Vec<MetadataSignature>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MetadataSignature {
    #[prost(bytes = "bytes", tag = "1")]
    pub signature_header: Bytes,
    #[prost(bytes = "bytes", tag = "2")]
    pub signature: Bytes,
}

/// The index of the most recent block that changed the channel configuration.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct LastConfig {
    #[prost(uint64, tag = "1")]
    pub index: u64,
}

/// Stored in the [BlockMetadataIndex::Signatures] entry by newer ordering nodes.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OrdererBlockMetadata {
    #[prost(message, optional, tag = "1")]
    pub last_config: Option<LastConfig>,
    #[prost(bytes = "bytes", tag = "2")]
    pub consenter_metadata: Bytes,
}

/// A pending channel configuration change and the signatures that endorse it.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConfigUpdateEnvelope {
    #[prost(bytes = "bytes", tag = "1")]
    pub config_update: Bytes,
    #[prost(message, repeated, tag = "2")]
    pub signatures: Vec<ConfigSignature>,
}

/// A signature over `signature_header || config_update`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConfigSignature {
    #[prost(bytes = "bytes", tag = "1")]
    pub signature_header: Bytes,
    #[prost(bytes = "bytes", tag = "2")]
    pub signature: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_block_accessors() {
        let block = Block {
            header: Some(BlockHeader {
                number: 9,
                ..Default::default()
            }),
            data: Some(BlockData {
                data: vec![Bytes::from_static(b"tx")],
            }),
            metadata: Some(BlockMetadata {
                metadata: vec![Bytes::new(), Bytes::from_static(b"last")],
            }),
        };
        assert_eq!(block.number(), Some(9));
        assert_eq!(block.transactions().len(), 1);
        assert_eq!(
            block.metadata_entry(BlockMetadataIndex::LastConfig),
            Some(&Bytes::from_static(b"last"))
        );
        assert!(block
            .metadata_entry(BlockMetadataIndex::TransactionsFilter)
            .is_none());
    }

    #[test]
    fn test_empty_block() {
        let block = Block::default();
        assert_eq!(block.number(), None);
        assert!(block.transactions().is_empty());
        assert!(block.metadata_entry(BlockMetadataIndex::Signatures).is_none());
    }

    #[test]
    fn test_channel_header_type() {
        let header = ChannelHeader {
            r#type: HeaderType::ConfigUpdate as i32,
            channel_id: "mychannel".into(),
            ..Default::default()
        };
        let decoded = ChannelHeader::decode(header.encode_to_vec().as_slice()).unwrap();
        assert!(matches!(
            HeaderType::try_from(decoded.r#type),
            Ok(HeaderType::ConfigUpdate)
        ));
        assert_eq!(decoded.channel_id, "mychannel");
    }
}
