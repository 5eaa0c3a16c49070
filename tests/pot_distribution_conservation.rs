//! Pot distribution conservation tests.
//!
//! These tests verify that distributed pots are paid out exactly, with no
//! chips lost to rounding. All payouts must sum to exactly the pot amount,
//! for any winner count and pot size.

use proptest::prelude::*;
use quiz_poker::{
    PotLedger,
    entities::{Chips, PlayerId},
};

#[test]
fn test_even_split_conservation() {
    let test_cases = vec![(100u32, 2usize), (300, 3), (1_000, 5), (24, 4), (7, 7)];

    for (amount, winner_count) in test_cases {
        let winners: Vec<PlayerId> = (0..winner_count)
            .map(|i| PlayerId::new(&format!("p{i}")))
            .collect();
        let payouts = PotLedger::distribute(amount, &winners).unwrap();
        let paid: Chips = payouts.iter().map(|(_, c)| c).sum();

        assert_eq!(
            paid, amount,
            "{winner_count} winners of {amount}: payouts sum to {paid}"
        );
    }
}

#[test]
fn test_non_divisible_split_is_deterministic() {
    // pot=100, 3 winners -> 34/33/33, odd chip to the lowest id, always.
    let winners = vec![
        PlayerId::new("zoe"),
        PlayerId::new("amy"),
        PlayerId::new("mel"),
    ];
    let first = PotLedger::distribute(100, &winners).unwrap();
    assert_eq!(
        first,
        vec![
            (PlayerId::new("amy"), 34),
            (PlayerId::new("mel"), 33),
            (PlayerId::new("zoe"), 33),
        ]
    );
    for _ in 0..10 {
        assert_eq!(PotLedger::distribute(100, &winners).unwrap(), first);
    }
}

#[test]
fn test_zero_pot_distributes_zeros() {
    let winners = vec![PlayerId::new("amy"), PlayerId::new("mel")];
    let payouts = PotLedger::distribute(0, &winners).unwrap();
    assert!(payouts.iter().all(|(_, c)| *c == 0));
}

proptest! {
    /// Full distribution: the pot is always paid out exactly.
    #[test]
    fn prop_distribution_has_no_residue(
        amount in 0u32..=1_000_000,
        winner_count in 1usize..=9,
    ) {
        let winners: Vec<PlayerId> = (0..winner_count)
            .map(|i| PlayerId::new(&format!("p{i}")))
            .collect();
        let payouts = PotLedger::distribute(amount, &winners).unwrap();
        let paid: Chips = payouts.iter().map(|(_, c)| c).sum();
        prop_assert_eq!(paid, amount);
    }

    /// Fairness: no winner's share differs from another's by more than one
    /// chip.
    #[test]
    fn prop_shares_differ_by_at_most_one_chip(
        amount in 0u32..=1_000_000,
        winner_count in 1usize..=9,
    ) {
        let winners: Vec<PlayerId> = (0..winner_count)
            .map(|i| PlayerId::new(&format!("p{i}")))
            .collect();
        let payouts = PotLedger::distribute(amount, &winners).unwrap();
        let max = payouts.iter().map(|(_, c)| *c).max().unwrap();
        let min = payouts.iter().map(|(_, c)| *c).min().unwrap();
        prop_assert!(max - min <= 1);
    }

    /// Duplicate winner entries don't double-pay anyone.
    #[test]
    fn prop_duplicate_winners_are_deduplicated(
        amount in 0u32..=10_000,
        winner_count in 1usize..=5,
    ) {
        let mut winners: Vec<PlayerId> = (0..winner_count)
            .map(|i| PlayerId::new(&format!("p{i}")))
            .collect();
        winners.extend(winners.clone());
        let payouts = PotLedger::distribute(amount, &winners).unwrap();
        prop_assert_eq!(payouts.len(), winner_count);
        let paid: Chips = payouts.iter().map(|(_, c)| c).sum();
        prop_assert_eq!(paid, amount);
    }
}
