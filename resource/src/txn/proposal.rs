use super::{create_channel_header, ChannelHeaderOpts, TransactionHeader, TransactionId};
use crate::{
    encode, error::Stage, Client, Error, Errors, ProposalProcessor, Request, SigningIdentity,
    SUCCESS,
};
use bytes::Bytes;
use commonware_runtime::Clock;
use fabric_wire::{
    common::{Header, HeaderType},
    peer::{
        chaincode_spec, ChaincodeHeaderExtension, ChaincodeId, ChaincodeInput,
        ChaincodeInvocationSpec, ChaincodeProposalPayload, ChaincodeSpec, Proposal,
        ProposalResponse, SignedProposal,
    },
};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A chaincode function call.
#[derive(Clone, Debug, Default)]
pub struct ChaincodeInvokeRequest {
    pub chaincode_id: String,
    pub fcn: String,
    pub args: Vec<Bytes>,

    /// Data passed to the chaincode that is not recorded on the ledger.
    pub transient_map: HashMap<String, Vec<u8>>,
}

impl ChaincodeInvokeRequest {
    pub fn new(chaincode_id: impl Into<String>, fcn: impl Into<String>) -> Self {
        Self {
            chaincode_id: chaincode_id.into(),
            fcn: fcn.into(),
            ..Default::default()
        }
    }

    /// Appends an argument to the call.
    pub fn with_arg(mut self, arg: impl Into<Bytes>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// An unsigned proposal and the transaction it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionProposal {
    pub txn_id: TransactionId,
    pub proposal: Proposal,
}

/// The response of a single endorser.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionProposalResponse {
    /// Endpoint of the peer that produced the response.
    pub endorser: String,

    /// Status of the chaincode invocation (zero if the peer omitted it).
    pub status: i32,

    pub response: ProposalResponse,
}

impl TransactionProposalResponse {
    pub fn new(endorser: impl Into<String>, response: ProposalResponse) -> Self {
        let status = response.response.as_ref().map_or(0, |r| r.status);
        Self {
            endorser: endorser.into(),
            status,
            response,
        }
    }

    /// Returns the value returned by the chaincode.
    pub fn payload(&self) -> Bytes {
        self.response
            .response
            .as_ref()
            .map(|r| r.payload.clone())
            .unwrap_or_default()
    }

    /// Returns the message that accompanied the status.
    pub fn message(&self) -> &str {
        self.response
            .response
            .as_ref()
            .map_or("", |r| r.message.as_str())
    }
}

/// Outcome of a call made to many targets.
///
/// Targets that failed are recorded in `errors` (with their index in the target list) rather
/// than aborting the call.
#[derive(Debug)]
#[must_use = "failed targets are only reported in `errors`"]
pub struct Dispatch<T> {
    pub responses: Vec<T>,
    pub errors: Errors,
}

impl<T> Default for Dispatch<T> {
    fn default() -> Self {
        Self {
            responses: Vec::new(),
            errors: Errors::new(),
        }
    }
}

impl<T> Dispatch<T> {
    /// Returns the responses if every target succeeded and [Error::Aggregate] otherwise.
    pub fn into_result(self) -> Result<Vec<T>, Error> {
        self.errors.into_result()?;
        Ok(self.responses)
    }
}

/// Builds a proposal that invokes `request.fcn` on chaincode `request.chaincode_id`.
pub fn create_chaincode_invoke_proposal(
    header: &TransactionHeader,
    tls_cert_hash: Option<Bytes>,
    request: &ChaincodeInvokeRequest,
) -> Result<TransactionProposal, Error> {
    if request.chaincode_id.is_empty() {
        return Err(Error::Missing("chaincode ID"));
    }
    if request.fcn.is_empty() {
        return Err(Error::Missing("function"));
    }

    // The function name travels as the first argument
    let mut args = Vec::with_capacity(request.args.len() + 1);
    args.push(Bytes::from(request.fcn.clone()));
    args.extend(request.args.iter().cloned());

    let chaincode_id = ChaincodeId {
        name: request.chaincode_id.clone(),
        ..Default::default()
    };
    let invocation = ChaincodeInvocationSpec {
        chaincode_spec: Some(ChaincodeSpec {
            r#type: chaincode_spec::Type::Golang as i32,
            chaincode_id: Some(chaincode_id.clone()),
            input: Some(ChaincodeInput {
                args,
                ..Default::default()
            }),
            ..Default::default()
        }),
    };
    let payload = ChaincodeProposalPayload {
        input: encode(&invocation),
        transient_map: request.transient_map.clone(),
    };

    let extension = ChaincodeHeaderExtension {
        chaincode_id: Some(chaincode_id),
    };
    let channel_header = create_channel_header(
        HeaderType::EndorserTransaction,
        ChannelHeaderOpts {
            txn_header: header,
            tls_cert_hash,
            extension: Some(encode(&extension)),
            epoch: 0,
        },
    )?;
    let proposal_header = Header {
        channel_header: encode(&channel_header),
        signature_header: header.encoded_signature_header(),
    };

    Ok(TransactionProposal {
        txn_id: header.id().clone(),
        proposal: Proposal {
            header: encode(&proposal_header),
            payload: encode(&payload),
            extension: Bytes::new(),
        },
    })
}

/// Encodes `proposal` and signs the encoding as `identity`.
pub fn sign_proposal(
    identity: &SigningIdentity,
    proposal: &Proposal,
) -> Result<SignedProposal, Error> {
    let proposal_bytes = encode(proposal);
    let signature = identity.sign(&proposal_bytes)?;
    Ok(SignedProposal {
        proposal_bytes,
        signature,
    })
}

/// Signs `proposal` once and sends it to each of `targets` in order.
///
/// Every target is attempted, regardless of earlier failures. A failed target contributes an
/// entry to [Dispatch::errors] instead of a response.
pub async fn send_proposal<E, P>(
    request: &Request<E>,
    client: &Client,
    proposal: &TransactionProposal,
    targets: &[P],
) -> Result<Dispatch<TransactionProposalResponse>, Error>
where
    E: Clock,
    P: ProposalProcessor,
{
    if targets.is_empty() {
        return Err(Error::Missing("targets"));
    }
    let signed = sign_proposal(client.identity()?, &proposal.proposal).stage("sign proposal")?;

    let mut dispatch = Dispatch::default();
    for (index, target) in targets.iter().enumerate() {
        match process(request, &signed, target).await {
            Ok(response) => {
                debug!(
                    txn = %proposal.txn_id,
                    endorser = target.endpoint(),
                    status = response.status,
                    "received proposal response"
                );
                dispatch.responses.push(response);
            }
            Err(err) => {
                warn!(
                    txn = %proposal.txn_id,
                    endorser = target.endpoint(),
                    ?err,
                    "proposal failed"
                );
                dispatch.errors.push(index, target.endpoint(), err);
            }
        }
    }
    Ok(dispatch)
}

/// Sends a signed proposal to a single target.
pub(crate) async fn process<E, P>(
    request: &Request<E>,
    signed: &SignedProposal,
    target: &P,
) -> Result<TransactionProposalResponse, Error>
where
    E: Clock,
    P: ProposalProcessor,
{
    let response = request.run(target.process_proposal(signed)).await?;
    Ok(TransactionProposalResponse::new(target.endpoint(), response))
}

/// Returns [Error::Endorsement] if the chaincode invocation did not succeed.
pub fn validate_response(response: &TransactionProposalResponse) -> Result<(), Error> {
    if response.status != SUCCESS {
        return Err(Error::Endorsement {
            endorser: response.endorser.clone(),
            status: response.status,
            message: response.message().to_string(),
        });
    }
    Ok(())
}
