use thiserror::Error;

use crate::ride::RideId;

#[derive(Error, Debug, PartialEq)]
pub enum FsError {
    #[error("WriteFailed couldn't write to disk")]
    WriteFailed,
    #[error("ReadFailed couldn't read from disk")]
    ReadFailed,
}

#[derive(Error, Debug, PartialEq)]
pub enum IndexError {
    #[error("DuplicateKey key already exists in the index")]
    DuplicateKey,
}

#[derive(Error, Debug, PartialEq)]
pub enum QueueError {
    #[error("CapacityExceeded queue already holds {0} entries")]
    CapacityExceeded(usize),
}

#[derive(Error, Debug, PartialEq)]
pub enum DispatchError {
    #[error("DuplicateKey ride {0} already exists")]
    DuplicateKey(RideId),
    #[error("CapacityExceeded no room for more active rides (capacity {0})")]
    CapacityExceeded(usize),
    #[error("NotFound ride {0} doesnt exist")]
    NotFound(RideId),
    #[error("Empty no active rides")]
    Empty,
    #[error("Unlinked ride index and queue are out of sync")]
    Unlinked,
}

impl From<QueueError> for DispatchError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::CapacityExceeded(capacity) => DispatchError::CapacityExceeded(capacity),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum SerializerError {
    #[error("InvalidValueType couldn't processed specified type.")]
    InvalidValueType,
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Malformed couldn't parse command line `{0}`")]
    Malformed(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid couldn't load configuration: {0}")]
    Invalid(String),
}
