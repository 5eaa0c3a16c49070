//! # Quiz Poker
//!
//! A quiz-poker round engine using a type-safe finite state machine (FSM)
//! design.
//!
//! Players ante, see a question, and bet on the accuracy of their own
//! numeric answer across several betting phases interleaved with reveals.
//! At showdown, the pot (including any side pots created by all-ins) goes
//! to whoever came closest to the correct answer. The core round is
//! implemented as an FSM using `enum_dispatch` for zero-cost trait
//! dispatch.
//!
//! ## Architecture
//!
//! A round moves through 9 phases (states), strictly in order:
//!
//! - **Ante**: Collecting the forced ante from every player
//! - **QuestionOne**: Revealing the question, collecting initial answers
//! - **BettingOne**: First betting phase
//! - **QuestionTwo**: Revealing the hint, answers may be revised
//! - **BettingTwo**: Second betting phase
//! - **Reveal**: Disclosing the correct answer and everyone's deviation
//! - **BettingThree**: Final betting phase, with full information
//! - **Showdown**: Determining winners and distributing every pot tier
//! - **Finished**: Terminal; the round is immutable and ready to archive
//!
//! ## Core Modules
//!
//! - [`game`]: Round state machine, betting engine, pot ledger, resolver
//! - [`timer`]: Logical countdown timers driven by the table tick
//! - [`table`]: Async actor serializing player actions and timeouts
//!
//! ## Example
//!
//! ```
//! use quiz_poker::RoundState;
//! use quiz_poker::entities::{Question, RoundSettings};
//!
//! // Two players ante up over a question.
//! let round = RoundState::new(
//!     vec![("alice".into(), 100), ("bob".into(), 100)],
//!     Question::new("How many keys does a piano have?", 88.0),
//!     RoundSettings::default(),
//! );
//! assert_eq!(round.data().ledger.total(), 20);
//! ```

/// Core round logic, entities, and state machine.
pub mod game;
pub use game::{
    BettingEngine, Phase, PotLedger, Resolution, RoundAction, RoundError, RoundEvent, RoundState,
    RoundStateManagement, Winner, WinnerResolver,
    constants::{self, DEFAULT_ANTE, MAX_PLAYERS, MIN_PLAYERS},
    entities::{self, Action, Chips, Participant, PlayerId, Question, RoundSettings},
    states,
};

/// Logical timers for phases and player turns.
pub mod timer;
pub use timer::{Timer, TimerFire, TimerScheduler};

/// Round driver: async actor, messages, configuration.
pub mod table;
pub use table::{TableActor, TableConfig, TableHandle, TableMessage, TableResponse};
