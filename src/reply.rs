use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::SerializerError;
use crate::ride::{Ride, RideId};
use crate::serializer::encode;

/// Outcome of one command, as shown to whoever issued it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    Ride { ride: Ride },
    NoMatch,
    Rides { rides: Vec<Ride> },
    NoActiveRides,
    DuplicateRide { id: RideId },
    CapacityExceeded { capacity: usize },
    /// The ride index and the queue disagree; nothing after this is trusted.
    Unlinked,
}

impl Reply {
    pub fn found(ride: Option<Ride>) -> Self {
        match ride {
            Some(ride) => Reply::Ride { ride },
            None => Reply::NoMatch,
        }
    }

    pub fn listing(rides: Vec<Ride>) -> Self {
        if rides.is_empty() {
            Reply::NoMatch
        } else {
            Reply::Rides { rides }
        }
    }

    /// A duplicate ride number ends the batch.
    pub fn halts(&self) -> bool {
        matches!(self, Reply::DuplicateRide { .. })
    }

    /// Ends the batch whatever the options say.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Reply::Unlinked)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ride { ride } => write!(f, "{ride}"),
            Reply::NoMatch => write!(f, "(0,0,0)"),
            Reply::Rides { rides } => {
                for (i, ride) in rides.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{ride}")?;
                }
                Ok(())
            }
            Reply::NoActiveRides => write!(f, "No active ride requests"),
            Reply::DuplicateRide { .. } => write!(f, "Duplicate RideNumber"),
            Reply::CapacityExceeded { .. } => write!(f, "MinHeap size exceeded"),
            Reply::Unlinked => write!(f, "Ride index out of sync"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn render(&self, reply: &Reply) -> Result<String, SerializerError> {
        match self {
            OutputFormat::Text => Ok(reply.to_string()),
            OutputFormat::Json => encode(reply),
        }
    }
}
