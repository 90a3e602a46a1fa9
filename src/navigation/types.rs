use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;
use utoipa::ToSchema;

use super::controller::SessionSnapshot;
use super::error::NavError;
use crate::geo::Coordinate;

/// Latest known user position. Replaced wholesale on every fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct TrackedPosition {
    pub coordinate: Coordinate,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
}

pub type Reply<T> = oneshot::Sender<Result<T, NavError>>;

/// Commands the presentation layer may issue. Each carries a reply channel typed
/// for its own outcome.
#[derive(Debug)]
pub enum Command {
    SetDestination {
        destination: Coordinate,
        reply: Reply<()>,
    },
    ClearDestination {
        reply: Reply<()>,
    },
    Start {
        destination: Option<Coordinate>,
        reply: Reply<SessionSnapshot>,
    },
    Stop {
        reply: Reply<()>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetDestination { .. } => "set_destination",
            Command::ClearDestination { .. } => "clear_destination",
            Command::Start { .. } => "start",
            Command::Stop { .. } => "stop",
        }
    }
}
