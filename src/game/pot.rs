//! Pot accounting for one round: contributions, tiered side pots, and
//! deterministic distribution. This module knows nothing about phases.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use super::entities::{Chips, Participant, PlayerId};

#[derive(Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum PotError {
    #[error("can't distribute a pot to nobody")]
    NoWinners,
}

/// One contribution tier. The first pot of a ledger is the main pot; the
/// rest are side pots capped by a short all-in.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Pot {
    pub amount: Chips,
    /// Non-folded players who contributed through this tier, ascending id.
    pub eligible: Vec<PlayerId>,
    /// The all-in player whose stack capped the tier below; `None` for the
    /// main pot.
    pub created_by: Option<PlayerId>,
}

/// Tracks what every player has put into the round and how those chips
/// split into tiers. Invariant: the tier amounts always sum to the total
/// contributed, so no chip ever leaves the ledger except by distribution.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct PotLedger {
    contributions: BTreeMap<PlayerId, Chips>,
    pots: Vec<Pot>,
}

impl PotLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the player's round contribution. Infallible: the
    /// chip domain is unsigned and the ledger accepts any size of bet.
    pub fn post_contribution(&mut self, id: &PlayerId, amount: Chips) {
        *self.contributions.entry(id.clone()).or_default() += amount;
    }

    #[must_use]
    pub fn contribution(&self, id: &PlayerId) -> Chips {
        *self.contributions.get(id).unwrap_or(&0)
    }

    /// Total chips contributed this round, across all tiers.
    #[must_use]
    pub fn total(&self) -> Chips {
        self.contributions.values().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// The lowest tier, covering every still-active contributor.
    #[must_use]
    pub fn main_pot(&self) -> Chips {
        let side: Chips = self.side_pots().iter().map(|p| p.amount).sum();
        self.total() - side
    }

    #[must_use]
    pub fn side_pots(&self) -> &[Pot] {
        if self.pots.len() > 1 {
            &self.pots[1..]
        } else {
            &[]
        }
    }

    /// All tiers, main pot first. Only meaningful after a rebuild.
    #[must_use]
    pub fn pots(&self) -> &[Pot] {
        &self.pots
    }

    /// Recompute the tier structure from scratch.
    ///
    /// Contribution levels are sliced ascending: each slice is worth
    /// `(level - prev_level) * |{players who contributed >= level}|`, and its
    /// eligible set is the non-folded players at or above the level.
    /// Adjacent slices with identical eligibility merge, which puts tier
    /// boundaries exactly on the distinct short all-in amounts and sinks
    /// folded partial contributions into the lowest pot they reach. A flat
    /// per-all-in pot would undercount chips whenever two all-ins land at
    /// different sizes, so the tiers are rebuilt wholesale every time.
    pub fn rebuild_side_pots(&mut self, participants: &[Participant]) -> &[Pot] {
        let folded: BTreeSet<&PlayerId> = participants
            .iter()
            .filter(|p| !p.is_live())
            .map(|p| &p.id)
            .collect();

        let mut levels: Vec<Chips> = self
            .contributions
            .values()
            .copied()
            .filter(|c| *c > 0)
            .collect();
        levels.sort_unstable();
        levels.dedup();

        let mut pots: Vec<Pot> = Vec::new();
        // Upper contribution level of each merged pot, for created_by lookup.
        let mut boundaries: Vec<Chips> = Vec::new();
        let mut prev = 0;
        for level in levels {
            let in_tier = self.contributions.iter().filter(|(_, c)| **c >= level);
            let amount = (level - prev) * in_tier.clone().count() as Chips;
            let eligible: Vec<PlayerId> = in_tier
                .filter(|(id, _)| !folded.contains(id))
                .map(|(id, _)| id.clone())
                .collect();

            match pots.last_mut() {
                Some(last) if last.eligible == eligible => {
                    last.amount += amount;
                    if let Some(boundary) = boundaries.last_mut() {
                        *boundary = level;
                    }
                }
                _ => {
                    pots.push(Pot {
                        amount,
                        eligible,
                        created_by: None,
                    });
                    boundaries.push(level);
                }
            }
            prev = level;
        }

        for k in 1..pots.len() {
            let boundary = boundaries[k - 1];
            let capper = participants
                .iter()
                .filter(|p| p.total_bet == boundary && p.is_all_in)
                .map(|p| &p.id)
                .min()
                .or_else(|| {
                    participants
                        .iter()
                        .filter(|p| p.total_bet == boundary)
                        .map(|p| &p.id)
                        .min()
                });
            pots[k].created_by = capper.cloned();
        }

        self.pots = pots;
        &self.pots
    }

    /// Empty the ledger at showdown, returning the total that was in it.
    pub fn take_all(&mut self) -> Chips {
        let total = self.total();
        self.contributions.clear();
        self.pots.clear();
        total
    }

    /// Split `amount` evenly across `winners`. The remainder is handed out
    /// one chip at a time in ascending player id, so the whole pot is paid
    /// with no residue and the split is reproducible.
    pub fn distribute(
        amount: Chips,
        winners: &[PlayerId],
    ) -> Result<Vec<(PlayerId, Chips)>, PotError> {
        if winners.is_empty() {
            return Err(PotError::NoWinners);
        }
        Ok(Self::split_even(amount, winners))
    }

    pub(crate) fn split_even(amount: Chips, winners: &[PlayerId]) -> Vec<(PlayerId, Chips)> {
        let mut ordered: Vec<&PlayerId> = winners.iter().collect();
        ordered.sort_unstable();
        ordered.dedup();

        let n = ordered.len() as Chips;
        let share = amount / n;
        let mut remainder = amount % n;
        ordered
            .into_iter()
            .map(|id| {
                let extra = if remainder > 0 {
                    remainder -= 1;
                    1
                } else {
                    0
                };
                (id.clone(), share + extra)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::PlayerStatus;

    fn contributor(name: &str, total: Chips, all_in: bool, folded: bool) -> Participant {
        let mut p = Participant::new(name.into(), 1_000);
        p.total_bet = total;
        p.is_all_in = all_in;
        p.status = if folded {
            PlayerStatus::Folded
        } else if all_in {
            PlayerStatus::AllIn
        } else {
            PlayerStatus::Active
        };
        p
    }

    fn post_all(ledger: &mut PotLedger, participants: &[Participant]) {
        for p in participants {
            ledger.post_contribution(&p.id, p.total_bet);
        }
    }

    #[test]
    fn test_post_contribution_accumulates() {
        let mut ledger = PotLedger::new();
        let alice: PlayerId = "alice".into();
        ledger.post_contribution(&alice, 50);
        ledger.post_contribution(&alice, 25);
        assert_eq!(ledger.contribution(&alice), 75);
        assert_eq!(ledger.total(), 75);
    }

    #[test]
    fn test_main_pot_without_all_ins() {
        // Everyone level: one pot, everyone eligible.
        let players = vec![
            contributor("alice", 100, false, false),
            contributor("bob", 100, false, false),
        ];
        let mut ledger = PotLedger::new();
        post_all(&mut ledger, &players);
        ledger.rebuild_side_pots(&players);

        assert_eq!(ledger.main_pot(), 200);
        assert!(ledger.side_pots().is_empty());
        assert_eq!(ledger.pots()[0].eligible.len(), 2);
    }

    #[test]
    fn test_single_short_all_in_creates_one_side_pot() {
        // alice all-in 50, bob and carol at 100:
        // main = 50 * 3 = 150 (all eligible), side = 50 * 2 = 100 (bob, carol).
        let players = vec![
            contributor("alice", 50, true, false),
            contributor("bob", 100, false, false),
            contributor("carol", 100, false, false),
        ];
        let mut ledger = PotLedger::new();
        post_all(&mut ledger, &players);
        ledger.rebuild_side_pots(&players);

        assert_eq!(ledger.main_pot(), 150);
        assert_eq!(ledger.side_pots().len(), 1);
        let side = &ledger.side_pots()[0];
        assert_eq!(side.amount, 100);
        assert_eq!(side.eligible, vec![PlayerId::new("bob"), PlayerId::new("carol")]);
        assert_eq!(side.created_by, Some(PlayerId::new("alice")));
    }

    #[test]
    fn test_multiple_all_ins_build_multiple_tiers() {
        // 25 / 75 / 150 / 150: main 100, side1 150, side2 150.
        let players = vec![
            contributor("alice", 25, true, false),
            contributor("bob", 75, true, false),
            contributor("carol", 150, true, false),
            contributor("dave", 150, false, false),
        ];
        let mut ledger = PotLedger::new();
        post_all(&mut ledger, &players);
        ledger.rebuild_side_pots(&players);

        assert_eq!(ledger.main_pot(), 100);
        let sides = ledger.side_pots();
        assert_eq!(sides.len(), 2);
        assert_eq!(sides[0].amount, 150);
        assert_eq!(sides[0].eligible.len(), 3);
        assert_eq!(sides[0].created_by, Some(PlayerId::new("alice")));
        assert_eq!(sides[1].amount, 150);
        assert_eq!(sides[1].eligible.len(), 2);
        assert_eq!(sides[1].created_by, Some(PlayerId::new("bob")));

        let total: Chips = ledger.main_pot() + sides.iter().map(|p| p.amount).sum::<Chips>();
        assert_eq!(total, 475);
        assert_eq!(total, ledger.total());
    }

    #[test]
    fn test_folded_short_contribution_sinks_into_main_pot() {
        // carol folded after 30; her chips stay in the pot but she is not
        // eligible anywhere, and no tier boundary forms at 30.
        let players = vec![
            contributor("alice", 100, false, false),
            contributor("bob", 100, false, false),
            contributor("carol", 30, false, true),
        ];
        let mut ledger = PotLedger::new();
        post_all(&mut ledger, &players);
        ledger.rebuild_side_pots(&players);

        assert_eq!(ledger.total(), 230);
        assert_eq!(ledger.main_pot(), 230);
        assert!(ledger.side_pots().is_empty());
        let main = &ledger.pots()[0];
        assert!(!main.eligible.contains(&PlayerId::new("carol")));
    }

    #[test]
    fn test_tie_at_all_in_boundary_forms_single_tier() {
        // Two all-ins at the same 40 level must not produce two pots.
        let players = vec![
            contributor("alice", 40, true, false),
            contributor("bob", 40, true, false),
            contributor("carol", 90, false, false),
        ];
        let mut ledger = PotLedger::new();
        post_all(&mut ledger, &players);
        ledger.rebuild_side_pots(&players);

        assert_eq!(ledger.main_pot(), 120);
        assert_eq!(ledger.side_pots().len(), 1);
        assert_eq!(ledger.side_pots()[0].amount, 50);
        assert_eq!(ledger.side_pots()[0].eligible, vec![PlayerId::new("carol")]);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let players = vec![
            contributor("alice", 25, true, false),
            contributor("bob", 75, false, false),
        ];
        let mut ledger = PotLedger::new();
        post_all(&mut ledger, &players);
        ledger.rebuild_side_pots(&players);
        let first = ledger.pots().to_vec();
        ledger.rebuild_side_pots(&players);
        assert_eq!(first, ledger.pots());
    }

    #[test]
    fn test_distribute_splits_evenly() {
        let winners = vec![PlayerId::new("alice"), PlayerId::new("bob")];
        let payouts = PotLedger::distribute(300, &winners).unwrap();
        assert_eq!(payouts, vec![("alice".into(), 150), ("bob".into(), 150)]);
    }

    #[test]
    fn test_distribute_remainder_goes_to_ascending_ids() {
        // 100 across three winners: 34/33/33, extra chip to the lowest id.
        let winners = vec![
            PlayerId::new("carol"),
            PlayerId::new("alice"),
            PlayerId::new("bob"),
        ];
        let payouts = PotLedger::distribute(100, &winners).unwrap();
        assert_eq!(
            payouts,
            vec![
                ("alice".into(), 34),
                ("bob".into(), 33),
                ("carol".into(), 33),
            ]
        );
        let paid: Chips = payouts.iter().map(|(_, c)| c).sum();
        assert_eq!(paid, 100);
    }

    #[test]
    fn test_distribute_rejects_empty_winner_set() {
        assert_eq!(PotLedger::distribute(100, &[]), Err(PotError::NoWinners));
    }

    #[test]
    fn test_take_all_empties_the_ledger() {
        let mut ledger = PotLedger::new();
        ledger.post_contribution(&"alice".into(), 120);
        assert_eq!(ledger.take_all(), 120);
        assert!(ledger.is_empty());
        assert!(ledger.pots().is_empty());
    }
}
