//! Phase definitions for the round FSM.
//!
//! Each state represents a specific phase of the quiz-poker round lifecycle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::game::entities::PlayerId;

/// Label for the nine round phases, in play order. Strictly linear;
/// `Finished` is terminal.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Phase {
    Ante,
    QuestionOne,
    BettingOne,
    QuestionTwo,
    BettingTwo,
    Reveal,
    BettingThree,
    Showdown,
    Finished,
}

impl Phase {
    /// Position in the phase order, used for monotonicity checks.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Ante => 0,
            Self::QuestionOne => 1,
            Self::BettingOne => 2,
            Self::QuestionTwo => 3,
            Self::BettingTwo => 4,
            Self::Reveal => 5,
            Self::BettingThree => 6,
            Self::Showdown => 7,
            Self::Finished => 8,
        }
    }

    #[must_use]
    pub fn is_betting(self) -> bool {
        matches!(self, Self::BettingOne | Self::BettingTwo | Self::BettingThree)
    }

    #[must_use]
    pub fn is_question(self) -> bool {
        matches!(self, Self::QuestionOne | Self::QuestionTwo)
    }

    /// The correct answer becomes public knowledge from the reveal on.
    #[must_use]
    pub fn answer_is_public(self) -> bool {
        self >= Self::Reveal
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Ante => "ante",
            Self::QuestionOne => "question 1",
            Self::BettingOne => "betting 1",
            Self::QuestionTwo => "question 2",
            Self::BettingTwo => "betting 2",
            Self::Reveal => "reveal",
            Self::BettingThree => "betting 3",
            Self::Showdown => "showdown",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// Collecting the forced ante from every participant.
#[derive(Debug, Default)]
pub struct Ante {}

/// First look at the question; players lock in an initial answer.
#[derive(Debug, Default)]
pub struct QuestionOne {
    pub(crate) answers_closed: bool,
    pub(crate) submitted: BTreeSet<PlayerId>,
}

/// First betting phase.
#[derive(Debug, Default)]
pub struct BettingOne {}

/// Hint goes out; players may revise their answer.
#[derive(Debug, Default)]
pub struct QuestionTwo {
    pub(crate) answers_closed: bool,
    pub(crate) submitted: BTreeSet<PlayerId>,
}

/// Second betting phase.
#[derive(Debug, Default)]
pub struct BettingTwo {}

/// The correct answer and everyone's deviation become public.
#[derive(Debug, Default)]
pub struct Reveal {}

/// Final betting phase, played with full information.
#[derive(Debug, Default)]
pub struct BettingThree {}

/// Winners are determined and the pots distributed.
#[derive(Debug, Default)]
pub struct Showdown {}

/// Terminal state; the round is immutable and ready to archive.
#[derive(Debug, Default)]
pub struct Finished {}
