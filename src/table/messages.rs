//! Table actor message types.

use tokio::sync::{mpsc, oneshot};

use crate::game::entities::{Action, Answer, Chips, Question, RoundSnapshot};
use crate::game::state_machine::{RoundError, RoundEvent};

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Start a new round with the given roster and question
    StartRound {
        players: Vec<(String, Chips)>,
        question: Question,
        response: oneshot::Sender<TableResponse>,
    },

    /// Player action (check, call, raise, all-in, fold)
    TakeAction {
        player: String,
        action: Action,
        response: oneshot::Sender<TableResponse>,
    },

    /// Player answer submission. Carries the raw optional value so missing
    /// or malformed submissions are rejected at the table edge.
    SubmitAnswer {
        player: String,
        value: Option<Answer>,
        response: oneshot::Sender<TableResponse>,
    },

    /// Get a client-safe snapshot of the current round
    GetSnapshot {
        response: oneshot::Sender<Option<RoundSnapshot>>,
    },

    /// Pause table (freezes all timers)
    Pause {
        response: oneshot::Sender<TableResponse>,
    },

    /// Resume table (re-arms paused timers with captured remaining time)
    Resume {
        response: oneshot::Sender<TableResponse>,
    },

    /// Close table (stops every outstanding timer)
    Close {
        response: oneshot::Sender<TableResponse>,
    },

    /// Internal: advance logical time by one second (also injectable from
    /// tests, which keeps timeout scenarios deterministic)
    Tick,

    /// Subscribe to round events
    Subscribe {
        subscriber_id: u64,
        sender: mpsc::Sender<RoundEvent>,
    },

    /// Unsubscribe from round events
    Unsubscribe { subscriber_id: u64 },
}

/// Response from table operations
#[derive(Clone, Debug, PartialEq)]
pub enum TableResponse {
    /// Operation succeeded
    Accepted,

    /// The round engine rejected the action, with the reason
    Rejected(RoundError),

    /// Operation failed outside the round engine
    Error(String),
}

impl TableResponse {
    /// Check if response is success
    pub fn is_accepted(&self) -> bool {
        matches!(self, TableResponse::Accepted)
    }

    /// Get the rejection reason if the engine turned the action down
    pub fn rejection(&self) -> Option<&RoundError> {
        match self {
            TableResponse::Rejected(reason) => Some(reason),
            _ => None,
        }
    }

    /// Get error message if response is not a success
    pub fn error_message(&self) -> Option<String> {
        match self {
            TableResponse::Accepted => None,
            TableResponse::Rejected(reason) => Some(reason.to_string()),
            TableResponse::Error(msg) => Some(msg.clone()),
        }
    }
}
