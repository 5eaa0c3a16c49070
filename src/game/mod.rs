//! Quiz-poker round engine - core FSM and game logic.
//!
//! This module provides the foundational round implementation including:
//! - Type-safe finite state machine with 9 round phases
//! - Betting validation and settlement with chip conservation
//! - Tiered side-pot accounting
//! - Answer scoring, winner selection, and pot distribution
//! - Event generation and client-safe snapshots

// Submodules
pub mod betting;
pub mod constants;
pub mod entities;
pub mod pot;
pub mod resolver;
pub mod state_machine;
pub mod states;

pub use betting::{ActionOutcome, BettingEngine, BettingState};
pub use pot::{Pot, PotError, PotLedger};
pub use resolver::{Resolution, Winner, WinnerResolver};
pub use state_machine::{
    Game, RoundAction, RoundData, RoundError, RoundEvent, RoundState, RoundStateManagement,
};
pub use states::Phase;
