//! Build, sign, and dispatch transactions.
//!
//! Every message sent to a peer or ordering node is bound to a [TransactionHeader]: the
//! signer's encoded identity (the "creator"), a fresh random nonce, and the [TransactionId]
//! derived from both. From a header this module builds:
//! - channel headers ([create_channel_header])
//! - signed envelopes for ordering nodes ([create_payload], [sign_payload], [broadcast_payload])
//! - signed proposals for peers ([create_chaincode_invoke_proposal], [send_proposal])

mod envelope;
mod header;
mod proposal;

pub use envelope::{
    broadcast_envelope, broadcast_payload, create_payload, extract_signed_envelope, sign_payload,
};
pub use header::{
    create_channel_header, ChannelHeaderOpts, TransactionHeader, TransactionId, NONCE_SIZE,
};
pub(crate) use proposal::process;
pub use proposal::{
    create_chaincode_invoke_proposal, send_proposal, sign_proposal, validate_response,
    ChaincodeInvokeRequest, Dispatch, TransactionProposal, TransactionProposalResponse,
};
