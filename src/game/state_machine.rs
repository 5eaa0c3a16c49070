//! Round state machine implementation.
//!
//! The round lifecycle is a typestate FSM: shared [`RoundData`] wrapped in a
//! [`Game<T>`] per phase, dispatched through the [`RoundState`] enum. The
//! machine owns all transitions; the betting engine and winner resolver only
//! report back, they never advance phases themselves.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::betting::{BettingEngine, BettingState};
use super::entities::{
    Action, ActionRecord, Answer, Chips, Participant, PlayerId, PlayerSnapshot, PlayerStatus,
    PotSnapshot, Question, QuestionSnapshot, RoundSettings, RoundSnapshot, SidePotSnapshot,
};
use super::pot::PotLedger;
use super::resolver::{Winner, WinnerResolver};
use super::states::{
    Ante, BettingOne, BettingThree, BettingTwo, Finished, Phase, QuestionOne, QuestionTwo, Reveal,
    Showdown,
};

/// Reasons an action can be rejected. All of these are recoverable: the
/// round is left exactly as it was.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum RoundError {
    #[error("game is not active")]
    GameNotActive,
    #[error("no round in progress")]
    NoActiveRound,
    #[error("player not found")]
    PlayerNotFound,
    #[error("player is out of the game")]
    PlayerEliminated,
    #[error("player already folded")]
    PlayerFolded,
    #[error("that action doesn't belong to this phase")]
    WrongPhaseForAction,
    #[error("not your turn")]
    NotPlayersTurn,
    #[error("not enough chips")]
    InsufficientChips,
    #[error("raise must reach at least {min}")]
    InvalidRaiseAmount { min: Chips },
    #[error("an answer is required")]
    MissingAnswer,
    #[error("answers must be finite numbers")]
    AnswerWrongType,
    #[error("illegal bet")]
    InvalidBet,
}

/// Everything the round announces outward, in the order it happened.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum RoundEvent {
    RoundStarted { round_id: Uuid },
    PhaseChanged { prev: Phase, next: Phase },
    QuestionRevealed { text: String },
    HintRevealed { hint: String },
    BettingStarted { phase: Phase, current_bet: Chips, min_raise: Chips },
    TurnStarted { player: PlayerId },
    PotUpdated { total: Chips },
    SidePotCreated { index: usize, amount: Chips },
    PlayerWentAllIn { player: PlayerId },
    PlayerDefaulted { player: PlayerId },
    AnswerRevealed { correct: Answer },
    PlayerDeviation { player: PlayerId, deviation: Answer, accuracy: Answer },
    WinnersDetermined { winners: Vec<Winner>, total_distributed: Chips, carry_over: Chips },
    RoundFinished,
    TimerStarted { name: String, secs: u64 },
    TimerWarning { name: String, remaining_secs: u64 },
    TimerExpired { name: String },
}

impl fmt::Display for RoundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::RoundStarted { round_id } => format!("round {round_id} started"),
            Self::PhaseChanged { prev, next } => format!("{prev} -> {next}"),
            Self::QuestionRevealed { text } => format!("question: {text}"),
            Self::HintRevealed { hint } => format!("hint: {hint}"),
            Self::BettingStarted {
                phase, min_raise, ..
            } => format!("{phase} opens (min raise {min_raise})"),
            Self::TurnStarted { player } => format!("{player} to act"),
            Self::PotUpdated { total } => format!("pot at {total}"),
            Self::SidePotCreated { index, amount } => {
                format!("side pot {index} created ({amount})")
            }
            Self::PlayerWentAllIn { player } => format!("{player} is all-in"),
            Self::PlayerDefaulted { player } => format!("{player} timed out"),
            Self::AnswerRevealed { correct } => format!("the answer was {correct}"),
            Self::PlayerDeviation {
                player, deviation, ..
            } => format!("{player} was off by {deviation}"),
            Self::WinnersDetermined {
                winners,
                total_distributed,
                ..
            } => format!("{} winner(s) split {total_distributed}", winners.len()),
            Self::RoundFinished => "round finished".to_string(),
            Self::TimerStarted { name, secs } => format!("timer {name} started ({secs}s)"),
            Self::TimerWarning {
                name,
                remaining_secs,
            } => format!("timer {name} expires in {remaining_secs}s"),
            Self::TimerExpired { name } => format!("timer {name} expired"),
        };
        write!(f, "{repr}")
    }
}

/// Mutable round data shared across all phases.
#[derive(Debug, Default)]
pub struct RoundData {
    pub round_id: Uuid,
    /// Fixed participant list captured at round start.
    pub participants: Vec<Participant>,
    pub ledger: PotLedger,
    /// Append-only record of every accepted decision.
    pub history: Vec<ActionRecord>,
    pub question: Question,
    pub settings: RoundSettings,
    pub(crate) betting: BettingState,
    pub(crate) events: VecDeque<RoundEvent>,
}

impl RoundData {
    pub(crate) fn new(
        players: Vec<(PlayerId, Chips)>,
        question: Question,
        settings: RoundSettings,
    ) -> Self {
        Self {
            round_id: Uuid::new_v4(),
            participants: players
                .into_iter()
                .map(|(id, stack)| Participant::new(id, stack))
                .collect(),
            ledger: PotLedger::new(),
            history: Vec::new(),
            question,
            settings,
            betting: BettingState::default(),
            events: VecDeque::new(),
        }
    }

    pub(crate) fn push_event(&mut self, event: RoundEvent) {
        self.events.push_back(event);
    }

    pub(crate) fn find(&self, id: &PlayerId) -> Result<usize, RoundError> {
        self.participants
            .iter()
            .position(|p| &p.id == id)
            .ok_or(RoundError::PlayerNotFound)
    }

    /// Common pre-validation: the player exists, isn't eliminated, and (for
    /// wagering actions) hasn't folded. Phase fit is checked afterwards.
    pub(crate) fn validate_actor(
        &self,
        id: &PlayerId,
        wagering: bool,
    ) -> Result<usize, RoundError> {
        let idx = self.find(id)?;
        match self.participants[idx].status {
            PlayerStatus::Eliminated => Err(RoundError::PlayerEliminated),
            PlayerStatus::Folded if wagering => Err(RoundError::PlayerFolded),
            _ => Ok(idx),
        }
    }

    pub(crate) fn record_answer(&mut self, idx: usize, value: Answer) -> PlayerId {
        self.participants[idx].answer = Some(value);
        let id = self.participants[idx].id.clone();
        self.history
            .push(ActionRecord::new(id.clone(), Action::Answer(value)));
        id
    }

    fn all_live_submitted(&self, submitted: &BTreeSet<PlayerId>) -> bool {
        self.participants
            .iter()
            .filter(|p| p.is_live())
            .all(|p| submitted.contains(&p.id))
    }

    fn snapshot(&self, phase: Phase) -> RoundSnapshot {
        RoundSnapshot {
            round_id: self.round_id,
            phase,
            pot: PotSnapshot {
                main: self.ledger.main_pot(),
                side_pots: self
                    .ledger
                    .side_pots()
                    .iter()
                    .map(|p| SidePotSnapshot {
                        amount: p.amount,
                        eligible: p.eligible.clone(),
                        created_by: p.created_by.clone(),
                    })
                    .collect(),
                total: self.ledger.total(),
            },
            history: self.history.clone(),
            players: self.participants.iter().map(PlayerSnapshot::from).collect(),
            question: QuestionSnapshot {
                text: self.question.text.clone(),
                hint: if phase >= Phase::QuestionTwo {
                    self.question.hint.clone()
                } else {
                    None
                },
                correct_answer: phase.answer_is_public().then_some(self.question.answer),
            },
        }
    }
}

/// A quiz-poker round with data and logic for one phase of its lifecycle.
#[derive(Debug)]
pub struct Game<T> {
    pub data: RoundData,
    pub state: T,
}

/// State access shared by every phase.
#[enum_dispatch]
pub trait RoundStateManagement {
    fn drain_events(&mut self) -> VecDeque<RoundEvent>;

    /// Client-safe view of the round; the correct answer is withheld until
    /// the reveal.
    #[must_use]
    fn snapshot(&self) -> RoundSnapshot;

    fn phase(&self) -> Phase;
}

/// Player-facing operations whose meaning depends on the phase.
#[enum_dispatch]
pub trait RoundAction {
    fn take_action(&mut self, player: &PlayerId, action: Action) -> Result<(), RoundError>;

    fn next_to_act(&self) -> Option<PlayerId>;

    /// Timeout default for one player's betting turn (fold). Returns false
    /// when there was nothing to do, which makes stale expiries no-ops.
    fn expire_turn(&mut self, player: &PlayerId) -> bool;

    /// Timeout default for a question phase (close the answer window).
    fn expire_answers(&mut self) -> bool;
}

macro_rules! impl_state_management {
    ($($state:ty => $phase:expr),+ $(,)?) => {$(
        impl RoundStateManagement for Game<$state> {
            fn drain_events(&mut self) -> VecDeque<RoundEvent> {
                std::mem::take(&mut self.data.events)
            }

            fn snapshot(&self) -> RoundSnapshot {
                self.data.snapshot($phase)
            }

            fn phase(&self) -> Phase {
                $phase
            }
        }
    )+};
}

impl_state_management!(
    Ante => Phase::Ante,
    QuestionOne => Phase::QuestionOne,
    BettingOne => Phase::BettingOne,
    QuestionTwo => Phase::QuestionTwo,
    BettingTwo => Phase::BettingTwo,
    Reveal => Phase::Reveal,
    BettingThree => Phase::BettingThree,
    Showdown => Phase::Showdown,
    Finished => Phase::Finished,
);

macro_rules! impl_betting_action {
    ($($state:ty),+ $(,)?) => {$(
        impl RoundAction for Game<$state> {
            fn take_action(&mut self, player: &PlayerId, action: Action) -> Result<(), RoundError> {
                if !action.is_wager() {
                    self.data.validate_actor(player, false)?;
                    return Err(RoundError::WrongPhaseForAction);
                }
                let idx = self.data.validate_actor(player, true)?;
                BettingEngine::apply_wager(&mut self.data, idx, action).map(|_| ())
            }

            fn next_to_act(&self) -> Option<PlayerId> {
                BettingEngine::next_to_act(&self.data)
            }

            fn expire_turn(&mut self, player: &PlayerId) -> bool {
                match self.data.find(player) {
                    Ok(idx) => BettingEngine::force_fold(&mut self.data, idx),
                    Err(_) => false,
                }
            }

            fn expire_answers(&mut self) -> bool {
                false
            }
        }
    )+};
}

impl_betting_action!(BettingOne, BettingTwo, BettingThree);

macro_rules! impl_question_action {
    ($($state:ty),+ $(,)?) => {$(
        impl RoundAction for Game<$state> {
            fn take_action(&mut self, player: &PlayerId, action: Action) -> Result<(), RoundError> {
                let value = match action {
                    Action::Answer(value) => value,
                    _ => {
                        self.data.validate_actor(player, true)?;
                        return Err(RoundError::WrongPhaseForAction);
                    }
                };
                let idx = self.data.validate_actor(player, false)?;
                if self.state.answers_closed {
                    return Err(RoundError::WrongPhaseForAction);
                }
                if !value.is_finite() {
                    return Err(RoundError::AnswerWrongType);
                }
                let id = self.data.record_answer(idx, value);
                self.state.submitted.insert(id);
                Ok(())
            }

            fn next_to_act(&self) -> Option<PlayerId> {
                None
            }

            fn expire_turn(&mut self, _player: &PlayerId) -> bool {
                false
            }

            fn expire_answers(&mut self) -> bool {
                if self.state.answers_closed {
                    return false;
                }
                self.state.answers_closed = true;
                let unanswered: Vec<PlayerId> = self
                    .data
                    .participants
                    .iter()
                    .filter(|p| p.is_live() && p.answer.is_none())
                    .map(|p| p.id.clone())
                    .collect();
                for player in unanswered {
                    self.data.push_event(RoundEvent::PlayerDefaulted { player });
                }
                true
            }
        }
    )+};
}

impl_question_action!(QuestionOne, QuestionTwo);

macro_rules! impl_inert_action {
    ($($state:ty => $err:expr),+ $(,)?) => {$(
        impl RoundAction for Game<$state> {
            fn take_action(&mut self, player: &PlayerId, action: Action) -> Result<(), RoundError> {
                let _ = (player, action);
                Err($err)
            }

            fn next_to_act(&self) -> Option<PlayerId> {
                None
            }

            fn expire_turn(&mut self, _player: &PlayerId) -> bool {
                false
            }

            fn expire_answers(&mut self) -> bool {
                false
            }
        }
    )+};
}

impl_inert_action!(
    Ante => RoundError::WrongPhaseForAction,
    Reveal => RoundError::WrongPhaseForAction,
    Showdown => RoundError::WrongPhaseForAction,
    Finished => RoundError::GameNotActive,
);

impl Game<QuestionOne> {
    fn answers_done(&self) -> bool {
        self.state.answers_closed || self.data.all_live_submitted(&self.state.submitted)
    }
}

impl Game<QuestionTwo> {
    fn answers_done(&self) -> bool {
        self.state.answers_closed || self.data.all_live_submitted(&self.state.submitted)
    }
}

impl From<Game<Ante>> for Game<QuestionOne> {
    fn from(mut game: Game<Ante>) -> Self {
        game.data.push_event(RoundEvent::PhaseChanged {
            prev: Phase::Ante,
            next: Phase::QuestionOne,
        });
        let text = game.data.question.text.clone();
        game.data.push_event(RoundEvent::QuestionRevealed { text });
        Self {
            data: game.data,
            state: QuestionOne::default(),
        }
    }
}

impl From<Game<QuestionOne>> for Game<BettingOne> {
    fn from(mut game: Game<QuestionOne>) -> Self {
        game.data.push_event(RoundEvent::PhaseChanged {
            prev: Phase::QuestionOne,
            next: Phase::BettingOne,
        });
        BettingEngine::begin_phase(&mut game.data, Phase::BettingOne);
        Self {
            data: game.data,
            state: BettingOne {},
        }
    }
}

impl From<Game<BettingOne>> for Game<QuestionTwo> {
    fn from(mut game: Game<BettingOne>) -> Self {
        game.data.push_event(RoundEvent::PhaseChanged {
            prev: Phase::BettingOne,
            next: Phase::QuestionTwo,
        });
        if let Some(hint) = game.data.question.hint.clone() {
            game.data.push_event(RoundEvent::HintRevealed { hint });
        }
        Self {
            data: game.data,
            state: QuestionTwo::default(),
        }
    }
}

impl From<Game<QuestionTwo>> for Game<BettingTwo> {
    fn from(mut game: Game<QuestionTwo>) -> Self {
        game.data.push_event(RoundEvent::PhaseChanged {
            prev: Phase::QuestionTwo,
            next: Phase::BettingTwo,
        });
        BettingEngine::begin_phase(&mut game.data, Phase::BettingTwo);
        Self {
            data: game.data,
            state: BettingTwo {},
        }
    }
}

impl From<Game<BettingTwo>> for Game<Reveal> {
    fn from(mut game: Game<BettingTwo>) -> Self {
        game.data.push_event(RoundEvent::PhaseChanged {
            prev: Phase::BettingTwo,
            next: Phase::Reveal,
        });
        let correct = game.data.question.answer;
        game.data.push_event(RoundEvent::AnswerRevealed { correct });
        let deviations: Vec<RoundEvent> = game
            .data
            .participants
            .iter()
            .filter(|p| p.is_live())
            .filter_map(|p| {
                p.answer.map(|answer| RoundEvent::PlayerDeviation {
                    player: p.id.clone(),
                    deviation: (correct - answer).abs(),
                    accuracy: WinnerResolver::accuracy(correct, answer),
                })
            })
            .collect();
        for event in deviations {
            game.data.push_event(event);
        }
        Self {
            data: game.data,
            state: Reveal {},
        }
    }
}

impl From<Game<Reveal>> for Game<BettingThree> {
    fn from(mut game: Game<Reveal>) -> Self {
        game.data.push_event(RoundEvent::PhaseChanged {
            prev: Phase::Reveal,
            next: Phase::BettingThree,
        });
        BettingEngine::begin_phase(&mut game.data, Phase::BettingThree);
        Self {
            data: game.data,
            state: BettingThree {},
        }
    }
}

impl From<Game<BettingThree>> for Game<Showdown> {
    fn from(mut game: Game<BettingThree>) -> Self {
        game.data.push_event(RoundEvent::PhaseChanged {
            prev: Phase::BettingThree,
            next: Phase::Showdown,
        });
        let resolution = WinnerResolver::resolve(&mut game.data);
        game.data.push_event(RoundEvent::WinnersDetermined {
            winners: resolution.winners,
            total_distributed: resolution.total_distributed,
            carry_over: resolution.carry_over,
        });
        for p in &mut game.data.participants {
            if p.stack == 0 && p.status != PlayerStatus::Folded {
                p.status = PlayerStatus::Eliminated;
            }
        }
        Self {
            data: game.data,
            state: Showdown {},
        }
    }
}

impl From<Game<Showdown>> for Game<Finished> {
    fn from(mut game: Game<Showdown>) -> Self {
        game.data.push_event(RoundEvent::PhaseChanged {
            prev: Phase::Showdown,
            next: Phase::Finished,
        });
        game.data.push_event(RoundEvent::RoundFinished);
        Self {
            data: game.data,
            state: Finished {},
        }
    }
}

/// One quiz-poker round, in whichever phase it is currently in.
#[enum_dispatch(RoundStateManagement, RoundAction)]
#[derive(Debug)]
pub enum RoundState {
    Ante(Game<Ante>),
    QuestionOne(Game<QuestionOne>),
    BettingOne(Game<BettingOne>),
    QuestionTwo(Game<QuestionTwo>),
    BettingTwo(Game<BettingTwo>),
    Reveal(Game<Reveal>),
    BettingThree(Game<BettingThree>),
    Showdown(Game<Showdown>),
    Finished(Game<Finished>),
}

impl Default for RoundState {
    fn default() -> Self {
        Self::Finished(Game {
            data: RoundData::default(),
            state: Finished {},
        })
    }
}

impl RoundState {
    /// Start a round: capture the participant list, collect antes (capped at
    /// each stack; a short ante puts that player all-in on the spot), and
    /// enter the first phase.
    #[must_use]
    pub fn new(
        players: Vec<(PlayerId, Chips)>,
        question: Question,
        settings: RoundSettings,
    ) -> Self {
        let mut data = RoundData::new(players, question, settings);
        data.push_event(RoundEvent::RoundStarted {
            round_id: data.round_id,
        });

        let ante = data.settings.ante;
        for idx in 0..data.participants.len() {
            if data.participants[idx].status == PlayerStatus::Eliminated {
                continue;
            }
            data.participants[idx].status = PlayerStatus::Active;
            let amount = ante.min(data.participants[idx].stack);
            if amount > 0 {
                let p = &mut data.participants[idx];
                p.stack -= amount;
                p.current_bet += amount;
                p.total_bet += amount;
                let id = p.id.clone();
                data.ledger.post_contribution(&id, amount);
            }
            if data.participants[idx].stack == 0 {
                BettingEngine::flip_all_in(&mut data, idx);
            }
        }
        let total = data.ledger.total();
        data.push_event(RoundEvent::PotUpdated { total });
        BettingEngine::refresh_pots(&mut data);

        Self::Ante(Game {
            data,
            state: Ante {},
        })
    }

    /// Advance at most one phase, and only if the current phase is done.
    /// Stepping a finished round is a no-op.
    #[must_use]
    pub fn step(self) -> Self {
        match self {
            Self::Ante(game) => Self::QuestionOne(game.into()),
            Self::QuestionOne(game) => {
                if game.answers_done() {
                    Self::BettingOne(game.into())
                } else {
                    Self::QuestionOne(game)
                }
            }
            Self::BettingOne(game) => {
                if BettingEngine::is_betting_complete(&game.data) {
                    Self::QuestionTwo(game.into())
                } else {
                    Self::BettingOne(game)
                }
            }
            Self::QuestionTwo(game) => {
                if game.answers_done() {
                    Self::BettingTwo(game.into())
                } else {
                    Self::QuestionTwo(game)
                }
            }
            Self::BettingTwo(game) => {
                if BettingEngine::is_betting_complete(&game.data) {
                    Self::Reveal(game.into())
                } else {
                    Self::BettingTwo(game)
                }
            }
            Self::Reveal(game) => Self::BettingThree(game.into()),
            Self::BettingThree(game) => {
                if BettingEngine::is_betting_complete(&game.data) {
                    Self::Showdown(game.into())
                } else {
                    Self::BettingThree(game)
                }
            }
            Self::Showdown(game) => Self::Finished(game.into()),
            Self::Finished(game) => Self::Finished(game),
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }

    /// Shared read access to the round data regardless of phase.
    #[must_use]
    pub fn data(&self) -> &RoundData {
        match self {
            Self::Ante(g) => &g.data,
            Self::QuestionOne(g) => &g.data,
            Self::BettingOne(g) => &g.data,
            Self::QuestionTwo(g) => &g.data,
            Self::BettingTwo(g) => &g.data,
            Self::Reveal(g) => &g.data,
            Self::BettingThree(g) => &g.data,
            Self::Showdown(g) => &g.data,
            Self::Finished(g) => &g.data,
        }
    }
}
