//! Mock implementations of peers, ordering nodes, and signers for testing.

use crate::{Client, Config, Identity, SigningIdentity};
use bytes::Bytes;
use fabric_wire::{
    common::{
        Block, BlockData, BlockHeader, BlockMetadata, ChannelHeader, Header, LastConfig, Metadata,
    },
    peer::{
        ChaincodeInvocationSpec, ChaincodeProposalPayload, ChaincodeSpec, Proposal, SignedProposal,
    },
};
use prost::Message;

mod orderer;
pub use orderer::{Broadcast, Orderer};
mod peer;
pub use peer::{Behavior, Peer};
mod signer;
pub use signer::{FailingSigner, Signer};

/// Returns an identity of `msp_id` that signs with [Signer].
pub fn signing_identity(msp_id: &str) -> SigningIdentity {
    let certificate = format!("{msp_id} admin certificate");
    SigningIdentity::new(Identity::new(msp_id, certificate), Signer)
}

/// Returns a client (with default configuration) acting as [signing_identity].
pub fn client(msp_id: &str) -> Client {
    Client::new(Config::default(), signing_identity(msp_id))
}

/// Returns a client whose every signature attempt fails.
pub fn failing_client(msp_id: &str) -> Client {
    let identity = SigningIdentity::new(Identity::new(msp_id, "certificate"), FailingSigner);
    Client::new(Config::default(), identity)
}

/// Builds block `number` holding `transactions` (opaque) transactions, whose metadata points at
/// block `last_config` as the last configuration block.
pub fn block(number: u64, transactions: usize, last_config: u64) -> Block {
    let data = (0..transactions)
        .map(|i| Bytes::from(format!("block {number} transaction {i}")))
        .collect();
    let last_config = Metadata {
        value: crate::encode(&LastConfig { index: last_config }),
        ..Default::default()
    };
    Block {
        header: Some(BlockHeader {
            number,
            ..Default::default()
        }),
        data: Some(BlockData { data }),
        metadata: Some(BlockMetadata {
            metadata: vec![Bytes::new(), crate::encode(&last_config)],
        }),
    }
}

/// Decodes the channel and chaincode invocation carried by a signed proposal.
///
/// # Panics
///
/// Panics if the proposal is not a well-formed chaincode invocation.
pub fn invocation(signed: &SignedProposal) -> (String, ChaincodeSpec) {
    let proposal = Proposal::decode(signed.proposal_bytes.clone()).expect("invalid proposal");
    let header = Header::decode(proposal.header).expect("invalid header");
    let channel_header =
        ChannelHeader::decode(header.channel_header).expect("invalid channel header");
    let payload =
        ChaincodeProposalPayload::decode(proposal.payload).expect("invalid proposal payload");
    let invocation = ChaincodeInvocationSpec::decode(payload.input).expect("invalid invocation");
    let spec = invocation.chaincode_spec.expect("missing chaincode spec");
    (channel_header.channel_id, spec)
}
