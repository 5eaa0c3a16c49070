//! Wager validation and settlement for the betting phases.
//!
//! The engine owns no state of its own: it mutates the shared round data,
//! keeps the pot ledger in sync, and reports whether the phase is done.
//! Advancing the phase is the state machine's call, never the engine's.

use std::collections::VecDeque;

use super::entities::{Action, ActionRecord, Chips, PlayerId};
use super::state_machine::{RoundData, RoundError, RoundEvent};
use super::states::Phase;

/// Per-phase betting bookkeeping, reset on every betting phase entry.
#[derive(Clone, Debug, Default)]
pub struct BettingState {
    /// Highest current-phase bet; what everyone has to match.
    pub current_bet: Chips,
    pub raises_made: u8,
    /// Participant indices still owing a decision, in seat order.
    pub to_act: VecDeque<usize>,
    pub last_aggressor: Option<usize>,
}

impl BettingState {
    /// Smallest total a raise must reach to be legal.
    #[must_use]
    pub fn min_raise_to(&self, ante: Chips) -> Chips {
        self.current_bet + ante
    }
}

/// What a successfully applied wager did to the phase.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ActionOutcome {
    pub phase_complete: bool,
    pub went_all_in: bool,
}

pub struct BettingEngine;

impl BettingEngine {
    /// Reset per-phase bets and queue everyone who can still act.
    pub(crate) fn begin_phase(data: &mut RoundData, phase: Phase) {
        for p in &mut data.participants {
            p.reset_for_phase();
        }
        let to_act: VecDeque<usize> = data
            .participants
            .iter()
            .enumerate()
            .filter(|(_, p)| p.can_act())
            .map(|(i, _)| i)
            .collect();
        data.betting = BettingState {
            current_bet: 0,
            raises_made: 0,
            to_act,
            last_aggressor: None,
        };
        let min_raise = data.betting.min_raise_to(data.settings.ante);
        data.push_event(RoundEvent::BettingStarted {
            phase,
            current_bet: 0,
            min_raise,
        });
        Self::announce_turn(data);
    }

    /// Validate and settle one wagering action for the participant at `idx`.
    /// Rejections leave the round untouched.
    pub(crate) fn apply_wager(
        data: &mut RoundData,
        idx: usize,
        action: Action,
    ) -> Result<ActionOutcome, RoundError> {
        match data.betting.to_act.front() {
            Some(&front) if front == idx => {}
            _ => return Err(RoundError::NotPlayersTurn),
        }

        let max = data.betting.current_bet;
        let stack = data.participants[idx].stack;
        let current = data.participants[idx].current_bet;
        let mut went_all_in = false;

        match action {
            Action::Check => {
                if current != max {
                    return Err(RoundError::InvalidBet);
                }
                Self::remove_from_queue(data, idx);
            }
            Action::Call => {
                if current >= max {
                    return Err(RoundError::InvalidBet);
                }
                if stack == 0 {
                    return Err(RoundError::InsufficientChips);
                }
                let amount = (max - current).min(stack);
                Self::post(data, idx, amount);
                Self::remove_from_queue(data, idx);
                if data.participants[idx].stack == 0 {
                    Self::flip_all_in(data, idx);
                    went_all_in = true;
                }
            }
            Action::Raise(amount) => {
                let min_to = max + data.settings.ante;
                if data.betting.raises_made >= data.settings.max_raises_per_phase
                    || (data.betting.raises_made >= 1 && !data.settings.reraise_allowed)
                {
                    return Err(RoundError::InvalidRaiseAmount { min: min_to });
                }
                if amount <= max || amount < min_to {
                    return Err(RoundError::InvalidRaiseAmount { min: min_to });
                }
                let delta = amount - current;
                if delta > stack {
                    return Err(RoundError::InsufficientChips);
                }
                Self::post(data, idx, delta);
                data.betting.current_bet = amount;
                data.betting.raises_made += 1;
                data.betting.last_aggressor = Some(idx);
                Self::requeue_after_aggression(data, idx);
                if data.participants[idx].stack == 0 {
                    Self::flip_all_in(data, idx);
                    went_all_in = true;
                }
            }
            Action::AllIn => {
                if stack == 0 {
                    return Err(RoundError::InsufficientChips);
                }
                Self::post(data, idx, stack);
                let new_bet = data.participants[idx].current_bet;
                if new_bet > data.betting.current_bet {
                    data.betting.current_bet = new_bet;
                    data.betting.raises_made = data.betting.raises_made.saturating_add(1);
                    data.betting.last_aggressor = Some(idx);
                    Self::requeue_after_aggression(data, idx);
                }
                Self::flip_all_in(data, idx);
                went_all_in = true;
            }
            Action::Fold => {
                Self::fold(data, idx);
            }
            Action::Answer(_) => return Err(RoundError::WrongPhaseForAction),
        }

        let id = data.participants[idx].id.clone();
        data.history.push(ActionRecord::new(id, action));
        Self::refresh_pots(data);

        let phase_complete = Self::is_betting_complete(data);
        if !phase_complete {
            Self::announce_turn(data);
        }
        Ok(ActionOutcome {
            phase_complete,
            went_all_in,
        })
    }

    /// Timeout default: fold the named participant wherever they sit in the
    /// queue. A stale call for someone who already acted is a no-op.
    pub(crate) fn force_fold(data: &mut RoundData, idx: usize) -> bool {
        if !data.participants[idx].can_act() {
            return false;
        }
        Self::fold(data, idx);
        let id = data.participants[idx].id.clone();
        data.history.push(ActionRecord::new(id.clone(), Action::Fold));
        data.push_event(RoundEvent::PlayerDefaulted { player: id });
        Self::refresh_pots(data);
        if !Self::is_betting_complete(data) {
            Self::announce_turn(data);
        }
        true
    }

    /// A betting phase is complete when at most one non-folded player
    /// remains, or when nobody who can still act owes chips or a decision.
    #[must_use]
    pub fn is_betting_complete(data: &RoundData) -> bool {
        let live = data.participants.iter().filter(|p| p.is_live()).count();
        if live <= 1 {
            return true;
        }
        if !data.betting.to_act.is_empty() {
            return false;
        }
        let max = data.betting.current_bet;
        data.participants
            .iter()
            .filter(|p| p.can_act())
            .all(|p| p.current_bet == max)
    }

    #[must_use]
    pub fn next_to_act(data: &RoundData) -> Option<PlayerId> {
        data.betting
            .to_act
            .front()
            .map(|&i| data.participants[i].id.clone())
    }

    fn announce_turn(data: &mut RoundData) {
        if let Some(player) = Self::next_to_act(data) {
            data.push_event(RoundEvent::TurnStarted { player });
        }
    }

    fn post(data: &mut RoundData, idx: usize, amount: Chips) {
        let p = &mut data.participants[idx];
        p.stack -= amount;
        p.current_bet += amount;
        p.total_bet += amount;
        let id = p.id.clone();
        data.ledger.post_contribution(&id, amount);
        let total = data.ledger.total();
        data.push_event(RoundEvent::PotUpdated { total });
    }

    pub(crate) fn flip_all_in(data: &mut RoundData, idx: usize) {
        let p = &mut data.participants[idx];
        p.is_all_in = true;
        p.status = super::entities::PlayerStatus::AllIn;
        let player = p.id.clone();
        Self::remove_from_queue(data, idx);
        data.push_event(RoundEvent::PlayerWentAllIn { player });
    }

    fn fold(data: &mut RoundData, idx: usize) {
        data.participants[idx].status = super::entities::PlayerStatus::Folded;
        Self::remove_from_queue(data, idx);
    }

    fn remove_from_queue(data: &mut RoundData, idx: usize) {
        data.betting.to_act.retain(|&i| i != idx);
    }

    /// Everyone who can act gets another decision after a raise, in seat
    /// order starting left of the aggressor.
    fn requeue_after_aggression(data: &mut RoundData, idx: usize) {
        let n = data.participants.len();
        let mut queue = VecDeque::new();
        for offset in 1..n {
            let i = (idx + offset) % n;
            if data.participants[i].can_act() {
                queue.push_back(i);
            }
        }
        data.betting.to_act = queue;
    }

    /// Re-tier the ledger after any mutation that can move a boundary:
    /// a live all-in or a fold while tiers exist.
    pub(crate) fn refresh_pots(data: &mut RoundData) {
        let before = data.ledger.side_pots().len();
        let has_live_all_in = data.participants.iter().any(|p| p.is_all_in && p.is_live());
        if !has_live_all_in && before == 0 {
            return;
        }
        data.ledger.rebuild_side_pots(&data.participants);
        let created: Vec<(usize, Chips)> = data
            .ledger
            .side_pots()
            .iter()
            .enumerate()
            .skip(before)
            .map(|(k, pot)| (k, pot.amount))
            .collect();
        for (index, amount) in created {
            data.push_event(RoundEvent::SidePotCreated { index, amount });
        }
    }
}
