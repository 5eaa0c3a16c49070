//! Chip conservation tests using property-based testing
//!
//! These tests verify that no chip is ever created or destroyed by the
//! round engine:
//! - Tier construction always sums back to the total contributed
//! - Arbitrary valid action sequences keep the ledger and stacks in sync
//! - Folded players contribute but never become eligible

use proptest::prelude::*;
use quiz_poker::{
    PotLedger, RoundAction, RoundState,
    entities::{Action, Chips, Participant, PlayerId, PlayerStatus, Question, RoundSettings},
};

fn participants(entries: &[(usize, Chips, bool, bool)]) -> Vec<Participant> {
    entries
        .iter()
        .map(|&(seat, total, all_in, folded)| {
            let mut p = Participant::new(PlayerId::new(&format!("p{seat}")), 10_000);
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
        })
        .collect()
}

/// Strategy: 2-9 players, each with a contribution, an all-in flag, and a
/// fold flag.
fn contribution_strategy() -> impl Strategy<Value = Vec<(Chips, bool, bool)>> {
    prop::collection::vec((1u32..=1_000, any::<bool>(), any::<bool>()), 2..=9)
}

proptest! {
    /// Tier amounts always sum to the total contributed, whatever mix of
    /// all-ins and folds produced them.
    #[test]
    fn prop_tiers_conserve_chips(entries in contribution_strategy()) {
        let entries: Vec<(usize, Chips, bool, bool)> = entries
            .into_iter()
            .enumerate()
            .map(|(seat, (total, all_in, folded))| (seat, total, all_in, folded))
            .collect();
        let players = participants(&entries);

        let mut ledger = PotLedger::new();
        for p in &players {
            ledger.post_contribution(&p.id, p.total_bet);
        }
        ledger.rebuild_side_pots(&players);

        let total: Chips = players.iter().map(|p| p.total_bet).sum();
        let tiered: Chips = ledger.pots().iter().map(|p| p.amount).sum();
        prop_assert_eq!(tiered, total, "tiers dropped or invented chips");
        prop_assert_eq!(ledger.main_pot(), ledger.pots()[0].amount);
    }

    /// Folded players never appear in any eligible set.
    #[test]
    fn prop_folded_players_are_never_eligible(entries in contribution_strategy()) {
        let entries: Vec<(usize, Chips, bool, bool)> = entries
            .into_iter()
            .enumerate()
            .map(|(seat, (total, all_in, folded))| (seat, total, all_in, folded))
            .collect();
        let players = participants(&entries);

        let mut ledger = PotLedger::new();
        for p in &players {
            ledger.post_contribution(&p.id, p.total_bet);
        }
        ledger.rebuild_side_pots(&players);

        for pot in ledger.pots() {
            for p in players.iter().filter(|p| !p.is_live()) {
                prop_assert!(
                    !pot.eligible.contains(&p.id),
                    "folded player {} is eligible",
                    p.id
                );
            }
        }
    }

    /// Eligibility is downward-nested: anyone eligible for a higher tier is
    /// eligible for every tier below it.
    #[test]
    fn prop_tier_eligibility_is_nested(entries in contribution_strategy()) {
        let entries: Vec<(usize, Chips, bool, bool)> = entries
            .into_iter()
            .enumerate()
            .map(|(seat, (total, all_in, folded))| (seat, total, all_in, folded))
            .collect();
        let players = participants(&entries);

        let mut ledger = PotLedger::new();
        for p in &players {
            ledger.post_contribution(&p.id, p.total_bet);
        }
        ledger.rebuild_side_pots(&players);

        let pots = ledger.pots();
        for pair in pots.windows(2) {
            for id in &pair[1].eligible {
                prop_assert!(pair[0].eligible.contains(id));
            }
        }
    }
}

/// Drive a whole betting phase with pseudo-random actions and check the
/// conservation invariant after every accepted action.
fn run_random_betting(stacks: Vec<Chips>, script: Vec<u8>) -> Result<(), TestCaseError> {
    let ante = 10;
    let players: Vec<(PlayerId, Chips)> = stacks
        .iter()
        .enumerate()
        .map(|(seat, stack)| (PlayerId::new(&format!("p{seat}")), *stack))
        .collect();
    let bankroll: Chips = stacks.iter().sum();

    let mut round = RoundState::new(
        players.clone(),
        Question::new("century", 100.0),
        RoundSettings {
            ante,
            ..RoundSettings::default()
        },
    );
    round = round.step();
    for (id, _) in &players {
        let _ = round.take_action(id, Action::Answer(90.0));
    }
    round.expire_answers();
    round = round.step();

    for choice in script {
        let Some(actor) = round.next_to_act() else {
            break;
        };
        let max = round
            .data()
            .participants
            .iter()
            .map(|p| p.current_bet)
            .max()
            .unwrap_or(0);
        let me = round
            .data()
            .participants
            .iter()
            .find(|p| p.id == actor)
            .cloned()
            .unwrap();
        let action = match choice % 4 {
            0 => {
                if me.current_bet == max {
                    Action::Check
                } else {
                    Action::Call
                }
            }
            1 => Action::Raise(max + ante),
            2 => Action::AllIn,
            _ => Action::Fold,
        };
        // Rejections are fine; they must not move a single chip.
        let before_total = round.data().ledger.total();
        let accepted = round.take_action(&actor, action).is_ok();
        if !accepted {
            prop_assert_eq!(round.data().ledger.total(), before_total);
        }

        let data = round.data();
        let contributed: Chips = data.participants.iter().map(|p| p.total_bet).sum();
        let side: Chips = data.ledger.side_pots().iter().map(|p| p.amount).sum();
        prop_assert_eq!(
            data.ledger.main_pot() + side,
            contributed,
            "main + sides != total contributed"
        );
        let in_stacks: Chips = data.participants.iter().map(|p| p.stack).sum();
        prop_assert_eq!(in_stacks + contributed, bankroll, "chips leaked");
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_betting_conserves_chips(
        stacks in prop::collection::vec(20u32..=500, 2..=6),
        script in prop::collection::vec(any::<u8>(), 0..=40),
    ) {
        run_random_betting(stacks, script)?;
    }
}
