//! Retrieve blocks from ordering nodes and locate the current channel configuration.
//!
//! Every block carries, in its metadata, the number of the block holding the configuration in
//! force when it was cut. Resolving the latest configuration therefore takes two round trips:
//! fetch the newest block, read its last config index, then fetch that block.

use crate::{
    encode,
    error::Stage,
    txn::{
        create_channel_header, create_payload, sign_payload, ChannelHeaderOpts, TransactionHeader,
    },
    BlockSource, Client, Error, Errors, Request,
};
use commonware_runtime::Clock;
use fabric_wire::{
    common::{
        Block, BlockMetadataIndex, Envelope, HeaderType, LastConfig, Metadata,
        OrdererBlockMetadata,
    },
    orderer::{self, seek_position, SeekInfo, SeekNewest, SeekOldest, SeekSpecified},
};
use prost::Message;
use rand::{CryptoRng, RngCore};
use std::slice;
use tracing::{debug, warn};

/// A position in the block log of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeekPosition {
    /// The first block (the genesis block).
    Oldest,
    /// The most recently committed block.
    Newest,
    /// The block with the given number.
    Specific(u64),
}

impl From<SeekPosition> for orderer::SeekPosition {
    fn from(position: SeekPosition) -> Self {
        let kind = match position {
            SeekPosition::Oldest => seek_position::Type::Oldest(SeekOldest {}),
            SeekPosition::Newest => seek_position::Type::Newest(SeekNewest {}),
            SeekPosition::Specific(number) => {
                seek_position::Type::Specified(SeekSpecified { number })
            }
        };
        Self { r#type: Some(kind) }
    }
}

impl TryFrom<&orderer::SeekPosition> for SeekPosition {
    type Error = Error;

    fn try_from(position: &orderer::SeekPosition) -> Result<Self, Self::Error> {
        match position.r#type {
            Some(seek_position::Type::Oldest(_)) => Ok(Self::Oldest),
            Some(seek_position::Type::Newest(_)) => Ok(Self::Newest),
            Some(seek_position::Type::Specified(SeekSpecified { number })) => {
                Ok(Self::Specific(number))
            }
            None => Err(Error::Missing("seek position")),
        }
    }
}

/// Builds the signed request for the single block at `position` of `channel`.
pub fn create_seek_envelope<E>(
    context: &mut E,
    client: &Client,
    channel: &str,
    position: SeekPosition,
) -> Result<Envelope, Error>
where
    E: Clock + RngCore + CryptoRng,
{
    let header = TransactionHeader::new(context, client, channel)?;
    let seek = SeekInfo {
        start: Some(position.into()),
        stop: Some(position.into()),
        behavior: client.config().seek_behavior as i32,
    };
    let mut opts = ChannelHeaderOpts::new(&header);
    opts.tls_cert_hash = client.config().tls_cert_hash();
    let channel_header = create_channel_header(HeaderType::DeliverSeekInfo, opts)?;
    let payload = create_payload(&header, &channel_header, encode(&seek));
    sign_payload(client.identity()?, &payload)
}

/// Fetches the block at `position` of `channel`, trying each of `orderers` in order until one
/// returns it.
///
/// When a specific block is requested, a block with any other number is rejected with
/// [Error::Protocol] and the next orderer is tried.
pub async fn retrieve_block<E, O>(
    request: &Request<E>,
    client: &Client,
    orderers: &[O],
    channel: &str,
    position: SeekPosition,
) -> Result<Block, Error>
where
    E: Clock + RngCore + CryptoRng,
    O: BlockSource,
{
    if orderers.is_empty() {
        return Err(Error::Missing("orderers"));
    }
    if channel.is_empty() {
        return Err(Error::Missing("channel name"));
    }
    let envelope = create_seek_envelope(&mut request.context().clone(), client, channel, position)
        .stage("create seek request")?;

    let mut errors = Errors::new();
    for (index, orderer) in orderers.iter().enumerate() {
        let result = request
            .run(orderer.send_deliver(&envelope))
            .await
            .and_then(|block| check_block(position, block));
        match result {
            Ok(block) => {
                debug!(
                    orderer = orderer.endpoint(),
                    channel,
                    ?position,
                    number = ?block.number(),
                    "retrieved block"
                );
                return Ok(block);
            }
            Err(err) if err.is_cancellation() => return Err(err),
            Err(err) => {
                warn!(orderer = orderer.endpoint(), channel, ?position, ?err, "deliver failed");
                errors.push(index, orderer.endpoint(), err);
            }
        }
    }
    Err(Error::OrdererUnavailable(errors))
}

fn check_block(position: SeekPosition, block: Block) -> Result<Block, Error> {
    let Some(number) = block.number() else {
        return Err(Error::Protocol("block has no header".into()));
    };
    if let SeekPosition::Specific(expected) = position {
        if number != expected {
            return Err(Error::Protocol(format!(
                "requested block {expected}, received block {number}"
            )));
        }
    }
    Ok(block)
}

/// Fetches block 0 of `channel`.
pub async fn genesis_block<E, O>(
    request: &Request<E>,
    client: &Client,
    channel: &str,
    orderer: &O,
) -> Result<Block, Error>
where
    E: Clock + RngCore + CryptoRng,
    O: BlockSource,
{
    retrieve_block(
        request,
        client,
        slice::from_ref(orderer),
        channel,
        SeekPosition::Specific(0),
    )
    .await
}

/// Fetches the block holding the configuration currently in force on `channel`.
///
/// The returned block is guaranteed to contain exactly one transaction.
pub async fn last_config_from_orderer<E, O>(
    request: &Request<E>,
    client: &Client,
    channel: &str,
    orderer: &O,
) -> Result<Block, Error>
where
    E: Clock + RngCore + CryptoRng,
    O: BlockSource,
{
    let orderers = slice::from_ref(orderer);
    let newest = retrieve_block(request, client, orderers, channel, SeekPosition::Newest)
        .await
        .stage("retrieve newest block")?;
    let index = last_config_index(&newest).stage("read last config index")?;
    debug!(channel, newest = ?newest.number(), index, "found last config index");

    let block = retrieve_block(request, client, orderers, channel, SeekPosition::Specific(index))
        .await
        .stage("retrieve config block")?;
    let transactions = block.transactions().len();
    if transactions != 1 {
        return Err(Error::InvalidConfigBlock(transactions));
    }
    Ok(block)
}

/// Reads the number of the last configuration block from the metadata of `block`.
///
/// The index is read from the signatures entry (as written by current ordering nodes) and,
/// when that entry carries no value, from the dedicated last config entry.
pub fn last_config_index(block: &Block) -> Result<u64, Error> {
    if let Some(raw) = block.metadata_entry(BlockMetadataIndex::Signatures) {
        let metadata = Metadata::decode(raw.clone())
            .map_err(|err| Error::MetadataDecode(format!("signatures entry: {err}")))?;
        if !metadata.value.is_empty() {
            let orderer = OrdererBlockMetadata::decode(metadata.value)
                .map_err(|err| Error::MetadataDecode(format!("orderer block metadata: {err}")))?;
            return orderer
                .last_config
                .map(|last_config| last_config.index)
                .ok_or_else(|| {
                    Error::MetadataDecode("orderer block metadata has no last config".into())
                });
        }
    }

    let raw = block
        .metadata_entry(BlockMetadataIndex::LastConfig)
        .ok_or_else(|| Error::MetadataDecode("no last config entry".into()))?;
    let metadata = Metadata::decode(raw.clone())
        .map_err(|err| Error::MetadataDecode(format!("last config entry: {err}")))?;
    let last_config = LastConfig::decode(metadata.value)
        .map_err(|err| Error::MetadataDecode(format!("last config: {err}")))?;
    Ok(last_config.index)
}
