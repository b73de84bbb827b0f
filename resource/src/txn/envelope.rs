use super::TransactionHeader;
use crate::{encode, error::Stage, BroadcastSink, Client, Error, Errors, Request, SigningIdentity};
use bytes::Bytes;
use commonware_runtime::Clock;
use fabric_wire::{
    common::{ChannelHeader, Envelope, Header, Payload, Status},
    orderer::BroadcastResponse,
};
use prost::Message;
use tracing::{debug, warn};

/// Wraps `data` in a payload addressed by `channel_header` and bound to `header`.
pub fn create_payload(
    header: &TransactionHeader,
    channel_header: &ChannelHeader,
    data: Bytes,
) -> Payload {
    Payload {
        header: Some(Header {
            channel_header: encode(channel_header),
            signature_header: header.encoded_signature_header(),
        }),
        data,
    }
}

/// Encodes `payload` and signs the encoding as `identity`.
pub fn sign_payload(identity: &SigningIdentity, payload: &Payload) -> Result<Envelope, Error> {
    let payload = encode(payload);
    let signature = identity.sign(&payload)?;
    Ok(Envelope { payload, signature })
}

/// Signs `payload` with the identity of `client` and submits it to `orderers`.
///
/// See [broadcast_envelope].
pub async fn broadcast_payload<E, O>(
    request: &Request<E>,
    client: &Client,
    payload: &Payload,
    orderers: &[O],
) -> Result<BroadcastResponse, Error>
where
    E: Clock,
    O: BroadcastSink,
{
    if orderers.is_empty() {
        return Err(Error::Missing("orderers"));
    }
    let envelope = sign_payload(client.identity()?, payload).stage("sign payload")?;
    broadcast_envelope(request, &envelope, orderers).await
}

/// Submits `envelope` to each of `orderers` in turn, returning the first acknowledgement with
/// status [Status::Success].
///
/// A failed or rejected submission moves on to the next orderer. If none accepts the envelope,
/// [Error::OrdererUnavailable] carries the failure of each. Cancellation (or an expired
/// deadline) aborts immediately.
pub async fn broadcast_envelope<E, O>(
    request: &Request<E>,
    envelope: &Envelope,
    orderers: &[O],
) -> Result<BroadcastResponse, Error>
where
    E: Clock,
    O: BroadcastSink,
{
    if orderers.is_empty() {
        return Err(Error::Missing("orderers"));
    }
    let mut errors = Errors::new();
    for (index, orderer) in orderers.iter().enumerate() {
        let result = request
            .run(orderer.send_broadcast(envelope))
            .await
            .and_then(|response| accepted(orderer.endpoint(), response));
        match result {
            Ok(response) => {
                debug!(orderer = orderer.endpoint(), "broadcast accepted");
                return Ok(response);
            }
            Err(err) if err.is_cancellation() => return Err(err),
            Err(err) => {
                warn!(orderer = orderer.endpoint(), ?err, "broadcast failed");
                errors.push(index, orderer.endpoint(), err);
            }
        }
    }
    Err(Error::OrdererUnavailable(errors))
}

fn accepted(orderer: &str, response: BroadcastResponse) -> Result<BroadcastResponse, Error> {
    match response.status() {
        Status::Success => Ok(response),
        status => Err(Error::BroadcastRejected {
            orderer: orderer.to_string(),
            status,
            info: response.info,
        }),
    }
}

/// Decodes an envelope received out-of-band (for example, a channel creation transaction
/// produced by an administrator tool).
pub fn extract_signed_envelope(raw: &[u8]) -> Result<Envelope, Error> {
    Envelope::decode(raw).map_err(|err| Error::Malformed("envelope", err))
}
