//! Errors returned by resource management operations.

use fabric_wire::common::Status;
use std::fmt;
use thiserror::Error;

/// Errors that can occur when building, sending, or interpreting protocol messages.
#[derive(Error, Debug)]
pub enum Error {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("missing client context: {0}")]
    MissingContext(&'static str),
    #[error("malformed {0}: {1}")]
    Malformed(&'static str, #[source] prost::DecodeError),
    #[error("protocol violation: {0}")]
    Protocol(String),
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("bad status from {endorser} ({status}): {message}")]
    Endorsement {
        endorser: String,
        status: i32,
        message: String,
    },
    #[error("{0}")]
    Aggregate(Errors),
    #[error("broadcast rejected by {orderer} ({status:?}): {info}")]
    BroadcastRejected {
        orderer: String,
        status: Status,
        info: String,
    },
    #[error("no orderer satisfied the request: {0}")]
    OrdererUnavailable(Errors),
    #[error("invalid last config metadata: {0}")]
    MetadataDecode(String),
    #[error("config block must contain one transaction, found {0}")]
    InvalidConfigBlock(usize),
    #[error("decode {0} failed: {1}")]
    Decode(&'static str, #[source] prost::DecodeError),
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("timestamp precedes unix epoch")]
    Timestamp,
    #[error("cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("{stage}: {source}")]
    Stage {
        stage: &'static str,
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps the error with the operation stage that produced it.
    pub fn within(self, stage: &'static str) -> Self {
        Self::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping any stage annotations.
    pub fn root(&self) -> &Error {
        match self {
            Self::Stage { source, .. } => source.root(),
            err => err,
        }
    }

    /// Returns true if the request was cancelled or its deadline expired.
    pub fn is_cancellation(&self) -> bool {
        matches!(self.root(), Self::Cancelled | Self::DeadlineExceeded)
    }
}

/// Annotates a failed [Result] with the operation stage that produced it.
pub(crate) trait Stage<T> {
    fn stage(self, stage: &'static str) -> Result<T, Error>;
}

impl<T> Stage<T> for Result<T, Error> {
    fn stage(self, stage: &'static str) -> Result<T, Error> {
        self.map_err(|err| err.within(stage))
    }
}

/// The failure of a single target during a multi-target call.
#[derive(Debug)]
pub struct TargetError {
    /// Position of the target in the list supplied by the caller.
    pub index: usize,

    /// Endpoint of the target.
    pub target: String,

    pub error: Error,
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (target {}): {}", self.target, self.index, self.error)
    }
}

/// Ordered collection of per-target failures.
///
/// Entries are kept in the order targets were attempted, so each failure stays attributable to
/// the target that produced it.
#[derive(Debug, Default)]
pub struct Errors(Vec<TargetError>);

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the failure of the target at `index`.
    pub fn push(&mut self, index: usize, target: impl Into<String>, error: Error) {
        self.0.push(TargetError {
            index,
            target: target.into(),
            error,
        });
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetError> {
        self.0.iter()
    }

    /// Returns the failure recorded for the target at `index` (if any).
    pub fn get(&self, index: usize) -> Option<&Error> {
        self.0
            .iter()
            .find(|failure| failure.index == index)
            .map(|failure| &failure.error)
    }

    /// Returns [Error::Aggregate] if any failure was recorded.
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            return Ok(());
        }
        Err(Error::Aggregate(self))
    }
}

impl IntoIterator for Errors {
    type Item = TargetError;
    type IntoIter = std::vec::IntoIter<TargetError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "no errors"),
            [only] => write!(f, "{only}"),
            all => {
                write!(f, "{} errors occurred:", all.len())?;
                for failure in all {
                    write!(f, " [{failure}]")?;
                }
                Ok(())
            }
        }
    }
}
