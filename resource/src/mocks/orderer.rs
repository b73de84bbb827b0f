use crate::{blocks::SeekPosition, BlockSource, BroadcastSink, Endpoint, Error};
use fabric_wire::{
    common::{Block, Envelope, Payload, Status},
    orderer::{BroadcastResponse, SeekInfo},
};
use futures::future;
use prost::Message;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

/// How a mock [Orderer] acknowledges broadcasts.
#[derive(Clone, Debug)]
pub enum Broadcast {
    /// Acknowledge with [Status::Success].
    Accept,

    /// Acknowledge with the given (non-success) status.
    Reject(Status),

    /// Fail the call at the transport level.
    Fail(String),

    /// Never acknowledge.
    Hang,
}

#[derive(Clone, Debug)]
enum Deliver {
    Serve,
    Fail(String),
    Hang,
}

#[derive(Default)]
struct State {
    broadcasts: Vec<Envelope>,
    seeks: Vec<SeekPosition>,
}

/// A mock ordering node serving a fixed block log.
#[derive(Clone)]
pub struct Orderer {
    endpoint: String,
    broadcast: Broadcast,
    deliver: Deliver,

    /// Blocks served for each requested number (usually, but not necessarily, the block with
    /// that number).
    blocks: BTreeMap<u64, Block>,

    state: Arc<Mutex<State>>,
}

impl Orderer {
    /// Creates an orderer that accepts every broadcast and serves no blocks.
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            broadcast: Broadcast::Accept,
            deliver: Deliver::Serve,
            blocks: BTreeMap::new(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn with_broadcast(mut self, broadcast: Broadcast) -> Self {
        self.broadcast = broadcast;
        self
    }

    /// Adds `block` to the log (at its own number).
    pub fn with_block(mut self, block: Block) -> Self {
        let number = block.number().unwrap_or_default();
        self.blocks.insert(number, block);
        self
    }

    /// Serves `block` when block `number` is requested.
    pub fn with_misnumbered_block(mut self, number: u64, block: Block) -> Self {
        self.blocks.insert(number, block);
        self
    }

    /// Fails every deliver request at the transport level.
    pub fn failing_deliver(mut self, reason: &str) -> Self {
        self.deliver = Deliver::Fail(reason.to_string());
        self
    }

    /// Never answers deliver requests.
    pub fn hanging_deliver(mut self) -> Self {
        self.deliver = Deliver::Hang;
        self
    }

    /// Returns every envelope broadcast so far.
    pub fn broadcasts(&self) -> Vec<Envelope> {
        self.state.lock().unwrap().broadcasts.clone()
    }

    /// Returns every position requested so far.
    pub fn seeks(&self) -> Vec<SeekPosition> {
        self.state.lock().unwrap().seeks.clone()
    }

    fn position(envelope: &Envelope) -> Result<SeekPosition, Error> {
        let payload = Payload::decode(envelope.payload.clone())
            .map_err(|err| Error::Malformed("payload", err))?;
        let seek =
            SeekInfo::decode(payload.data).map_err(|err| Error::Malformed("seek info", err))?;
        if seek.start != seek.stop {
            return Err(Error::Protocol("only single block requests are served".into()));
        }
        let start = seek.start.ok_or(Error::Missing("seek start"))?;
        SeekPosition::try_from(&start)
    }
}

impl Endpoint for Orderer {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl BroadcastSink for Orderer {
    async fn send_broadcast(&self, envelope: &Envelope) -> Result<BroadcastResponse, Error> {
        self.state.lock().unwrap().broadcasts.push(envelope.clone());
        let status = match &self.broadcast {
            Broadcast::Accept => Status::Success,
            Broadcast::Reject(status) => *status,
            Broadcast::Fail(reason) => return Err(Error::Transport(reason.clone())),
            Broadcast::Hang => return future::pending().await,
        };
        Ok(BroadcastResponse {
            status: status as i32,
            info: String::new(),
        })
    }
}

impl BlockSource for Orderer {
    async fn send_deliver(&self, envelope: &Envelope) -> Result<Block, Error> {
        let position = Self::position(envelope)?;
        self.state.lock().unwrap().seeks.push(position);
        match &self.deliver {
            Deliver::Serve => {}
            Deliver::Fail(reason) => return Err(Error::Transport(reason.clone())),
            Deliver::Hang => return future::pending().await,
        }
        let block = match position {
            SeekPosition::Oldest => self.blocks.values().next(),
            SeekPosition::Newest => self.blocks.values().next_back(),
            SeekPosition::Specific(number) => self.blocks.get(&number),
        };
        block
            .cloned()
            .ok_or_else(|| Error::Protocol(format!("{position:?} not found")))
    }
}
