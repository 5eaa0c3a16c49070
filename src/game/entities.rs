use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, time::Duration};
use uuid::Uuid;

use super::constants;
use super::states::Phase;

/// Type alias for whole chips. All bets and player stacks are represented
/// as whole chips (there's no point arguing over fractions).
///
/// If the total chips in a round ever surpasses ~4.2 billion, then we may
/// have a problem.
pub type Chips = u32;

/// Numeric answer to a quiz question. Deviations and accuracy are computed
/// in this domain, never in chips.
pub type Answer = f64;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: &str) -> Self {
        let mut id: String = s
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .collect();
        id.truncate(constants::MAX_PLAYER_ID_LEN);
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Where a participant stands within the current round.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PlayerStatus {
    // Seated and able to act.
    Active,
    // Forfeited their contributions for the round.
    Folded,
    // Whole stack committed; still in contention, no more moves.
    AllIn,
    // Stack hit zero; takes no further actions.
    Eliminated,
    // Seated, round not started yet.
    Waiting,
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Active => "active",
            Self::Folded => "folded",
            Self::AllIn => "all-in",
            Self::Eliminated => "out",
            Self::Waiting => "waiting",
        };
        write!(f, "{repr:7}")
    }
}

/// One player's decision, as submitted to the engine.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Action {
    Check,
    Call,
    Raise(Chips),
    AllIn,
    Fold,
    Answer(Answer),
}

impl Action {
    /// Wagering actions move chips; answers don't.
    #[must_use]
    pub fn is_wager(&self) -> bool {
        !matches!(self, Self::Answer(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Check => "checks".to_string(),
            Self::Call => "calls".to_string(),
            Self::Raise(amount) => format!("raises to {amount}"),
            Self::AllIn => "all-ins (no way back)".to_string(),
            Self::Fold => "folds".to_string(),
            Self::Answer(value) => format!("answers {value}"),
        };
        write!(f, "{repr}")
    }
}

/// An immutable record of one accepted decision, kept in round history.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ActionRecord {
    pub player: PlayerId,
    pub action: Action,
    pub at: DateTime<Utc>,
}

impl ActionRecord {
    #[must_use]
    pub fn new(player: PlayerId, action: Action) -> Self {
        Self {
            player,
            action,
            at: Utc::now(),
        }
    }
}

impl fmt::Display for ActionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.player, self.action)
    }
}

/// The quiz question a round is played over. The correct answer never
/// appears in client-facing snapshots before the reveal phase.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Question {
    pub text: String,
    pub hint: Option<String>,
    pub answer: Answer,
}

impl Default for Question {
    fn default() -> Self {
        Self::new("", 0.0)
    }
}

impl Question {
    #[must_use]
    pub fn new(text: &str, answer: Answer) -> Self {
        Self {
            text: text.to_string(),
            hint: None,
            answer,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }
}

/// Per-round configuration captured at round start.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RoundSettings {
    pub ante: Chips,
    pub reraise_allowed: bool,
    pub max_raises_per_phase: u8,
    pub action_timeout: Duration,
    pub answer_timeout: Duration,
    pub warning_lead: Duration,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            ante: constants::DEFAULT_ANTE,
            reraise_allowed: true,
            max_raises_per_phase: constants::DEFAULT_MAX_RAISES_PER_PHASE,
            action_timeout: Duration::from_secs(constants::DEFAULT_ACTION_TIMEOUT_SECS),
            answer_timeout: Duration::from_secs(constants::DEFAULT_ANSWER_TIMEOUT_SECS),
            warning_lead: Duration::from_secs(constants::DEFAULT_WARNING_LEAD_SECS),
        }
    }
}

/// A player participating in one round. The stack survives across rounds;
/// everything else here is reset when a new round is constructed.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Participant {
    pub id: PlayerId,
    pub stack: Chips,
    /// Amount matched in the *current* betting phase.
    pub current_bet: Chips,
    /// Amount contributed across all phases of this round.
    pub total_bet: Chips,
    pub answer: Option<Answer>,
    pub is_all_in: bool,
    pub status: PlayerStatus,
    /// Lifetime winnings statistic. Only the resolver increases this.
    pub winnings: Chips,
}

impl Participant {
    #[must_use]
    pub fn new(id: PlayerId, stack: Chips) -> Self {
        let status = if stack == 0 {
            PlayerStatus::Eliminated
        } else {
            PlayerStatus::Waiting
        };
        Self {
            id,
            stack,
            current_bet: 0,
            total_bet: 0,
            answer: None,
            is_all_in: false,
            status,
            winnings: 0,
        }
    }

    /// Still in contention for the pot (not folded, not eliminated).
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(
            self.status,
            PlayerStatus::Active | PlayerStatus::AllIn | PlayerStatus::Waiting
        )
    }

    /// Has a meaningful move left this round.
    #[must_use]
    pub fn can_act(&self) -> bool {
        self.status == PlayerStatus::Active && !self.is_all_in
    }

    pub fn reset_for_phase(&mut self) {
        self.current_bet = 0;
    }
}

/// Public per-player state, safe to hand to any client.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub stack: Chips,
    pub current_bet: Chips,
    pub status: PlayerStatus,
    pub is_all_in: bool,
}

impl From<&Participant> for PlayerSnapshot {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id.clone(),
            stack: p.stack,
            current_bet: p.current_bet,
            status: p.status,
            is_all_in: p.is_all_in,
        }
    }
}

/// The question as a client sees it. `correct_answer` stays `None` until
/// the round reaches the reveal phase.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct QuestionSnapshot {
    pub text: String,
    pub hint: Option<String>,
    pub correct_answer: Option<Answer>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PotSnapshot {
    pub main: Chips,
    pub side_pots: Vec<SidePotSnapshot>,
    pub total: Chips,
}

impl fmt::Display for PotSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} chips", self.total)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SidePotSnapshot {
    pub amount: Chips,
    pub eligible: Vec<PlayerId>,
    pub created_by: Option<PlayerId>,
}

/// Everything the surrounding game layer needs to persist or forward a
/// round: id, phase, pots, ordered history, and public player state.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RoundSnapshot {
    pub round_id: Uuid,
    pub phase: Phase,
    pub pot: PotSnapshot,
    pub history: Vec<ActionRecord>,
    pub players: Vec<PlayerSnapshot>,
    pub question: QuestionSnapshot,
}
