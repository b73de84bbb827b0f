use crate::{Canceller, Endpoint, Error, ProposalProcessor, SUCCESS};
use bytes::Bytes;
use fabric_wire::peer::{ProposalResponse, Response, SignedProposal};
use futures::future;
use std::sync::{Arc, Mutex};

/// How a mock [Peer] answers proposals.
#[derive(Clone)]
pub enum Behavior {
    /// Respond with the given status, message, and payload.
    Respond {
        status: i32,
        message: String,
        payload: Bytes,
    },

    /// Fail the call at the transport level.
    Fail(String),

    /// Never respond.
    Hang,

    /// Cancel the request the proposal was sent under, then never respond.
    Cancel(Arc<Mutex<Option<Canceller>>>),
}

/// A mock [crate::ProposalProcessor] that records every proposal it receives.
#[derive(Clone)]
pub struct Peer {
    endpoint: String,
    behavior: Behavior,
    received: Arc<Mutex<Vec<SignedProposal>>>,
}

impl Peer {
    pub fn new(endpoint: &str, behavior: Behavior) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            behavior,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a peer that answers every proposal successfully with `payload`.
    pub fn responding(endpoint: &str, payload: Bytes) -> Self {
        Self::new(
            endpoint,
            Behavior::Respond {
                status: SUCCESS,
                message: String::new(),
                payload,
            },
        )
    }

    /// Creates a peer that answers every proposal with a non-success `status`.
    pub fn rejecting(endpoint: &str, status: i32, message: &str) -> Self {
        Self::new(
            endpoint,
            Behavior::Respond {
                status,
                message: message.to_string(),
                payload: Bytes::new(),
            },
        )
    }

    /// Creates a peer that cannot be reached.
    pub fn failing(endpoint: &str, reason: &str) -> Self {
        Self::new(endpoint, Behavior::Fail(reason.to_string()))
    }

    /// Creates a peer that never answers.
    pub fn hanging(endpoint: &str) -> Self {
        Self::new(endpoint, Behavior::Hang)
    }

    /// Creates a peer that cancels the in-flight request when contacted.
    pub fn cancelling(endpoint: &str, canceller: Canceller) -> Self {
        Self::new(endpoint, Behavior::Cancel(Arc::new(Mutex::new(Some(canceller)))))
    }

    /// Returns every proposal received so far.
    pub fn received(&self) -> Vec<SignedProposal> {
        self.received.lock().unwrap().clone()
    }
}

impl Endpoint for Peer {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ProposalProcessor for Peer {
    async fn process_proposal(&self, proposal: &SignedProposal) -> Result<ProposalResponse, Error> {
        self.received.lock().unwrap().push(proposal.clone());
        match &self.behavior {
            Behavior::Respond {
                status,
                message,
                payload,
            } => Ok(ProposalResponse {
                response: Some(Response {
                    status: *status,
                    message: message.clone(),
                    payload: payload.clone(),
                }),
                ..Default::default()
            }),
            Behavior::Fail(reason) => Err(Error::Transport(reason.clone())),
            Behavior::Hang => future::pending().await,
            Behavior::Cancel(canceller) => {
                let canceller = canceller.lock().unwrap().take();
                if let Some(canceller) = canceller {
                    canceller.cancel();
                }
                future::pending().await
            }
        }
    }
}
