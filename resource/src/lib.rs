//! Create, join and inspect ledger channels and install chaincode.
//!
//! # Overview
//!
//! This crate is the client side of the resource management protocol spoken with peers
//! (endorsing nodes) and ordering nodes. It constructs, signs, dispatches, and interprets the
//! control-plane messages that:
//! - create or update a channel ([channel::create_channel])
//! - join peers to a channel ([channel::join_channel])
//! - install chaincode and list what is installed, instantiated, or joined ([chaincode])
//! - resolve the current channel configuration from the block log
//!   ([blocks::last_config_from_orderer])
//!
//! Remote nodes are reached through three narrow capabilities supplied by the caller:
//! [ProposalProcessor] (a peer), [BroadcastSink] and [BlockSource] (an ordering node). Signing is
//! delegated to a [Signer]. Transport (and any retry policy) lives behind these traits.
//!
//! # Requests
//!
//! Every network-bound operation takes a [Request], which carries the runtime context (a clock
//! and a source of randomness) along with an optional deadline and cancellation signal. When
//! either fires, the in-flight call is abandoned and [Error::Cancelled] or
//! [Error::DeadlineExceeded] is returned.
//!
//! # Multi-target calls
//!
//! Calls that fan out to many peers ([txn::send_proposal], [chaincode::query_chaincode]) attempt
//! every target in order, regardless of earlier failures, and return a [Dispatch]: the collected
//! responses along with one [Errors] entry (carrying the target's index and endpoint) per failed
//! target.
//!
//! # Status
//!
//! `fabric-resource` is **ALPHA** software and is not yet recommended for production use.
//! Developers should expect breaking changes and occasional instability.

use bytes::Bytes;
use fabric_wire::{
    common::{Block, Envelope},
    orderer::BroadcastResponse,
    peer::{ProposalResponse, SignedProposal},
};
use std::future::Future;

pub mod blocks;
pub mod chaincode;
pub mod channel;
mod config;
pub use config::Config;
mod error;
pub use error::{Error, Errors, TargetError};
mod identity;
pub use identity::{Client, Identity, Signer, SigningIdentity};
mod request;
pub use request::{Canceller, Request};
pub mod txn;
pub use txn::{Dispatch, TransactionId};

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

/// The status a peer returns for a successful chaincode invocation.
pub const SUCCESS: i32 = 200;

/// A remote node that can be named in logs and errors.
pub trait Endpoint: Send + Sync {
    /// Returns the address (or other identifier) of the node.
    fn endpoint(&self) -> &str;
}

/// A peer that simulates and endorses proposals.
pub trait ProposalProcessor: Endpoint {
    /// Sends a signed proposal to the peer and waits for its response.
    fn process_proposal(
        &self,
        proposal: &SignedProposal,
    ) -> impl Future<Output = Result<ProposalResponse, Error>> + Send;
}

/// An ordering node that accepts envelopes for ordering.
pub trait BroadcastSink: Endpoint {
    /// Submits an envelope and waits for the node's acknowledgement.
    fn send_broadcast(
        &self,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<BroadcastResponse, Error>> + Send;
}

/// An ordering node that serves the block log.
pub trait BlockSource: Endpoint {
    /// Submits a signed seek request and waits for the requested block.
    fn send_deliver(
        &self,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<Block, Error>> + Send;
}

/// Encodes a protobuf message.
pub(crate) fn encode<M: prost::Message>(message: &M) -> Bytes {
    Bytes::from(message.encode_to_vec())
}
