use crate::{encode, Client, Error};
use bytes::Bytes;
use commonware_runtime::Clock;
use commonware_utils::hex;
use fabric_wire::{
    common::{ChannelHeader, HeaderType, SignatureHeader},
    Timestamp,
};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

/// Size of the random nonce bound to every transaction.
pub const NONCE_SIZE: usize = 24;

/// Identifier of a transaction: the hex-encoded SHA-256 digest of `nonce || creator`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(String);

impl TransactionId {
    /// Derives the identifier of a transaction created by `creator` with `nonce`.
    pub fn compute(nonce: &[u8], creator: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(nonce);
        hasher.update(creator);
        Self(hex(&hasher.finalize()))
    }

    /// Returns the identifier reported when no transaction was created locally.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identity-bound core of a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionHeader {
    id: TransactionId,
    creator: Bytes,
    nonce: Bytes,
    channel: String,
    timestamp: SystemTime,
}

impl TransactionHeader {
    /// Creates a header for a new transaction on `channel`, drawing a fresh nonce from `context`.
    ///
    /// Fails with [Error::MissingContext] if `client` has no signing identity.
    pub fn new<E>(context: &mut E, client: &Client, channel: &str) -> Result<Self, Error>
    where
        E: Clock + RngCore + CryptoRng,
    {
        let creator = client.identity()?.creator().clone();
        let mut nonce = [0u8; NONCE_SIZE];
        context.fill_bytes(&mut nonce);
        let id = TransactionId::compute(&nonce, &creator);
        Ok(Self {
            id,
            creator,
            nonce: Bytes::copy_from_slice(&nonce),
            channel: channel.to_string(),
            timestamp: context.current(),
        })
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn creator(&self) -> &Bytes {
        &self.creator
    }

    pub fn nonce(&self) -> &Bytes {
        &self.nonce
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Returns the time the header was created.
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Returns the signature header (creator and nonce) of the transaction.
    pub fn signature_header(&self) -> SignatureHeader {
        SignatureHeader {
            creator: self.creator.clone(),
            nonce: self.nonce.clone(),
        }
    }

    /// Returns the encoded signature header.
    pub(crate) fn encoded_signature_header(&self) -> Bytes {
        encode(&self.signature_header())
    }
}

/// Options for [create_channel_header].
#[derive(Clone, Debug)]
pub struct ChannelHeaderOpts<'a> {
    pub txn_header: &'a TransactionHeader,

    /// Digest of the client TLS certificate (if mutual TLS is in use).
    pub tls_cert_hash: Option<Bytes>,

    /// Header extension (for example, the target chaincode of a proposal).
    pub extension: Option<Bytes>,

    pub epoch: u64,
}

impl<'a> ChannelHeaderOpts<'a> {
    pub fn new(txn_header: &'a TransactionHeader) -> Self {
        Self {
            txn_header,
            tls_cert_hash: None,
            extension: None,
            epoch: 0,
        }
    }
}

/// Builds the channel header of a message of type `kind`.
///
/// The header carries the channel, transaction ID, and creation time of `opts.txn_header`.
pub fn create_channel_header(
    kind: HeaderType,
    opts: ChannelHeaderOpts<'_>,
) -> Result<ChannelHeader, Error> {
    let txn_header = opts.txn_header;
    Ok(ChannelHeader {
        r#type: kind as i32,
        timestamp: Some(timestamp(txn_header.timestamp())?),
        channel_id: txn_header.channel().to_string(),
        tx_id: txn_header.id().to_string(),
        epoch: opts.epoch,
        extension: opts.extension.unwrap_or_default(),
        tls_cert_hash: opts.tls_cert_hash.unwrap_or_default(),
        ..Default::default()
    })
}

fn timestamp(time: SystemTime) -> Result<Timestamp, Error> {
    let elapsed = time
        .duration_since(UNIX_EPOCH)
        .map_err(|_| Error::Timestamp)?;
    Ok(Timestamp {
        seconds: i64::try_from(elapsed.as_secs()).map_err(|_| Error::Timestamp)?,
        nanos: elapsed.subsec_nanos() as i32,
    })
}
