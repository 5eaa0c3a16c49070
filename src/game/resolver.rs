//! Winner selection and pot distribution at showdown.
//!
//! Accuracy is a fixed scoring policy: deviations are normalized against
//! `max(correct_answer, 100)` so a question about "8849" and a question
//! about "7" produce comparable percentages. Chip amounts never feed into
//! the score.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::constants::ACCURACY_NORMALIZATION_FLOOR;
use super::entities::{Answer, Chips, Participant, PlayerId};
use super::pot::PotLedger;
use super::state_machine::RoundData;

/// One winning player, with the score that won and the chips it paid.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Winner {
    pub player: PlayerId,
    pub deviation: Answer,
    pub accuracy: Answer,
    pub amount: Chips,
}

/// Outcome of resolving every pot tier at showdown.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Resolution {
    /// Winners in ascending player id, each with their combined payout.
    pub winners: Vec<Winner>,
    pub total_distributed: Chips,
    /// Chips from tiers that had no eligible answer-haver. The caller owns
    /// the carry-forward/refund policy; the engine never guesses one.
    pub carry_over: Chips,
}

pub struct WinnerResolver;

impl WinnerResolver {
    /// Score in `[0, 100]`, higher is closer.
    #[must_use]
    pub fn accuracy(correct: Answer, answer: Answer) -> Answer {
        let deviation = (correct - answer).abs();
        let norm = correct.max(ACCURACY_NORMALIZATION_FLOOR);
        (100.0 - (deviation / norm) * 100.0).max(0.0)
    }

    /// The minimum-deviation subset of the eligible players (not folded,
    /// answer submitted). Ties are all winners together; nothing breaks
    /// them. Returns an empty list when nobody is eligible.
    #[must_use]
    pub fn determine_winners(participants: &[Participant], correct: Answer) -> Vec<PlayerId> {
        let eligible: Vec<(&PlayerId, Answer)> = participants
            .iter()
            .filter(|p| p.is_live())
            .filter_map(|p| p.answer.map(|a| (&p.id, (correct - a).abs())))
            .collect();

        let Some(min_deviation) = eligible
            .iter()
            .map(|(_, d)| *d)
            .min_by(|a, b| a.total_cmp(b))
        else {
            return Vec::new();
        };

        eligible
            .into_iter()
            .filter(|(_, d)| d.total_cmp(&min_deviation).is_eq())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Resolve every tier independently against its own eligible set, pay
    /// the winners, and empty the ledger. This is the only place stacks
    /// increase.
    pub fn resolve(data: &mut RoundData) -> Resolution {
        let correct = data.question.answer;
        data.ledger.rebuild_side_pots(&data.participants);
        let pots = data.ledger.pots().to_vec();

        let mut payouts: BTreeMap<PlayerId, Chips> = BTreeMap::new();
        let mut carry_over: Chips = 0;

        for pot in pots {
            let in_tier: Vec<Participant> = data
                .participants
                .iter()
                .filter(|p| pot.eligible.contains(&p.id))
                .cloned()
                .collect();
            let winner_ids = Self::determine_winners(&in_tier, correct);
            if winner_ids.is_empty() {
                carry_over += pot.amount;
                continue;
            }
            for (id, amount) in PotLedger::split_even(pot.amount, &winner_ids) {
                *payouts.entry(id).or_default() += amount;
            }
        }

        let total_distributed: Chips = payouts.values().sum();
        Self::distribute_winnings(&mut data.participants, &payouts);
        data.ledger.take_all();

        let winners = payouts
            .into_iter()
            .map(|(player, amount)| {
                let answer = data
                    .participants
                    .iter()
                    .find(|p| p.id == player)
                    .and_then(|p| p.answer)
                    .unwrap_or_default();
                Winner {
                    player,
                    deviation: (correct - answer).abs(),
                    accuracy: Self::accuracy(correct, answer),
                    amount,
                }
            })
            .collect();

        Resolution {
            winners,
            total_distributed,
            carry_over,
        }
    }

    /// Credit payouts to stacks and lifetime winnings.
    pub fn distribute_winnings(
        participants: &mut [Participant],
        payouts: &BTreeMap<PlayerId, Chips>,
    ) {
        for p in participants.iter_mut() {
            if let Some(&amount) = payouts.get(&p.id) {
                p.stack += amount;
                p.winnings += amount;
            }
        }
    }
}
