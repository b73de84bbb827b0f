//! Create channels, sign their configuration, and join peers to them.

use crate::{
    chaincode::{self, CSCC},
    encode,
    error::Stage,
    txn::{
        broadcast_envelope, create_channel_header, create_payload, extract_signed_envelope,
        sign_payload, ChannelHeaderOpts, ChaincodeInvokeRequest, TransactionHeader, TransactionId,
    },
    BroadcastSink, Client, Error, ProposalProcessor, Request, SigningIdentity,
};
use bytes::{BufMut, Bytes, BytesMut};
use commonware_runtime::Clock;
use fabric_wire::common::{
    Block, ConfigSignature, ConfigUpdateEnvelope, HeaderType, Payload, SignatureHeader,
};
use prost::Message;
use rand::{CryptoRng, RngCore};
use std::slice;
use tracing::{debug, info};

/// What to submit when creating or updating a channel.
#[derive(Clone, Debug)]
pub enum Submission {
    /// A complete, already signed, channel creation envelope (for example, one produced by an
    /// administrator tool). It is forwarded to the orderer as-is.
    Envelope(Bytes),

    /// A channel configuration update and the signatures endorsing it.
    ConfigUpdate {
        config: Bytes,
        signatures: Vec<ConfigSignature>,
    },
}

/// A request to create (or update) a channel.
#[derive(Debug)]
pub struct CreateChannelRequest<'a, O> {
    /// Name of the channel.
    pub name: String,

    /// Ordering node the update is submitted to.
    pub orderer: Option<&'a O>,

    pub submission: Submission,
}

/// A request to join peers to a channel.
#[derive(Clone, Debug, Default)]
pub struct JoinChannelRequest {
    /// Block 0 of the channel (see [crate::blocks::genesis_block]).
    pub genesis_block: Option<Block>,
}

/// Creates (or updates) a channel by submitting a configuration update to an ordering node.
///
/// Returns the ID of the transaction that carried the update. When the request supplies a
/// pre-built envelope, no transaction is created locally and [TransactionId::empty] is returned.
///
/// Fields are validated in order (orderer, name, envelope or configuration, signatures) and the
/// first missing one is reported.
pub async fn create_channel<E, O>(
    request: &Request<E>,
    client: &Client,
    create: &CreateChannelRequest<'_, O>,
) -> Result<TransactionId, Error>
where
    E: Clock + RngCore + CryptoRng,
    O: BroadcastSink,
{
    let orderer = create.orderer.ok_or(Error::Missing("orderer"))?;
    if create.name.is_empty() {
        return Err(Error::Missing("channel name"));
    }
    let (config, signatures) = match &create.submission {
        Submission::Envelope(raw) => {
            if raw.is_empty() {
                return Err(Error::Missing("channel envelope"));
            }
            let envelope = extract_signed_envelope(raw).stage("extract channel envelope")?;
            broadcast_envelope(request, &envelope, slice::from_ref(orderer))
                .await
                .stage("broadcast channel envelope")?;
            info!(channel = %create.name, "submitted channel envelope");
            return Ok(TransactionId::empty());
        }
        Submission::ConfigUpdate { config, signatures } => (config, signatures),
    };
    if config.is_empty() {
        return Err(Error::Missing("channel configuration"));
    }
    if signatures.is_empty() {
        return Err(Error::Missing("config signatures"));
    }

    let header = TransactionHeader::new(&mut request.context().clone(), client, &create.name)
        .stage("create transaction header")?;
    let update = ConfigUpdateEnvelope {
        config_update: config.clone(),
        signatures: signatures.clone(),
    };
    let mut opts = ChannelHeaderOpts::new(&header);
    opts.tls_cert_hash = client.config().tls_cert_hash();
    let channel_header =
        create_channel_header(HeaderType::ConfigUpdate, opts).stage("create channel header")?;
    let payload = create_payload(&header, &channel_header, encode(&update));
    let envelope = sign_payload(client.identity()?, &payload).stage("sign config update")?;
    broadcast_envelope(request, &envelope, slice::from_ref(orderer))
        .await
        .stage("broadcast config update")?;
    info!(channel = %create.name, txn = %header.id(), "submitted config update");
    Ok(header.id().clone())
}

/// Signs a channel configuration update as `signer` (or, if none is given, as the identity of
/// `client`).
pub fn sign_channel_config<R>(
    rng: &mut R,
    client: &Client,
    config: &[u8],
    signer: Option<&SigningIdentity>,
) -> Result<ConfigSignature, Error>
where
    R: RngCore + CryptoRng,
{
    if config.is_empty() {
        return Err(Error::Missing("channel configuration"));
    }
    let identity = match signer {
        Some(identity) => identity,
        None => client.identity()?,
    };
    create_config_signature(rng, identity, config)
}

/// Signs `config` as `identity`.
///
/// The signature covers the encoded signature header (creator and a fresh nonce) followed by
/// the configuration itself.
pub fn create_config_signature<R>(
    rng: &mut R,
    identity: &SigningIdentity,
    config: &[u8],
) -> Result<ConfigSignature, Error>
where
    R: RngCore + CryptoRng,
{
    let mut nonce = [0u8; crate::txn::NONCE_SIZE];
    rng.fill_bytes(&mut nonce);
    let signature_header = encode(&SignatureHeader {
        creator: identity.creator().clone(),
        nonce: Bytes::copy_from_slice(&nonce),
    });

    let mut message = BytesMut::with_capacity(signature_header.len() + config.len());
    message.put_slice(&signature_header);
    message.put_slice(config);
    let signature = identity.sign(&message)?;
    Ok(ConfigSignature {
        signature_header,
        signature,
    })
}

/// Extracts the configuration update carried by a channel creation envelope.
pub fn extract_channel_config(raw: &[u8]) -> Result<Bytes, Error> {
    let envelope = extract_signed_envelope(raw)?;
    let payload =
        Payload::decode(envelope.payload).map_err(|err| Error::Malformed("payload", err))?;
    let update = ConfigUpdateEnvelope::decode(payload.data)
        .map_err(|err| Error::Malformed("config update envelope", err))?;
    Ok(update.config_update)
}

/// Asks each of `targets` to join the channel described by the supplied genesis block.
///
/// Every target is attempted. If any fails, [Error::Aggregate] reports each failure along with
/// the index of the target that produced it.
pub async fn join_channel<E, P>(
    request: &Request<E>,
    client: &Client,
    join: &JoinChannelRequest,
    targets: &[P],
) -> Result<(), Error>
where
    E: Clock + RngCore + CryptoRng,
    P: ProposalProcessor,
{
    let block = join
        .genesis_block
        .as_ref()
        .ok_or(Error::Missing("genesis block"))?;
    if targets.is_empty() {
        return Err(Error::Missing("targets"));
    }
    let invoke = ChaincodeInvokeRequest::new(CSCC, "JoinChain").with_arg(encode(block));
    let dispatch = chaincode::query_chaincode(request, client, &invoke, targets).await;
    debug!(
        targets = targets.len(),
        failed = dispatch.errors.len(),
        "join channel completed"
    );
    dispatch.errors.into_result()
}
