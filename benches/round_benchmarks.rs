use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use quiz_poker::{
    PotLedger, RoundAction, RoundState, RoundStateManagement, WinnerResolver,
    entities::{Action, Chips, Participant, PlayerId, PlayerStatus, Question, RoundSettings},
};

/// Helper to build a field of contributors with staggered all-in levels
fn staggered_contributors(n_players: usize) -> Vec<Participant> {
    (0..n_players)
        .map(|seat| {
            let mut p = Participant::new(PlayerId::new(&format!("player{seat}")), 10_000);
            p.total_bet = 50 * (seat as Chips + 1);
            p.is_all_in = seat % 2 == 0;
            p.status = if p.is_all_in {
                PlayerStatus::AllIn
            } else {
                PlayerStatus::Active
            };
            p
        })
        .collect()
}

/// Benchmark tier construction across table sizes
fn bench_side_pot_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("side_pot_construction");
    for n_players in [2usize, 5, 9] {
        let players = staggered_contributors(n_players);
        group.bench_with_input(
            BenchmarkId::from_parameter(n_players),
            &players,
            |b, players| {
                b.iter(|| {
                    let mut ledger = PotLedger::new();
                    for p in players.iter() {
                        ledger.post_contribution(&p.id, p.total_bet);
                    }
                    ledger.rebuild_side_pots(players);
                    ledger.pots().len()
                });
            },
        );
    }
    group.finish();
}

/// Benchmark winner selection over a full field of answers
fn bench_winner_selection(c: &mut Criterion) {
    let mut players = staggered_contributors(9);
    for (seat, p) in players.iter_mut().enumerate() {
        p.answer = Some(80.0 + seat as f64 * 5.0);
    }

    c.bench_function("winner_selection_9_players", |b| {
        b.iter(|| WinnerResolver::determine_winners(&players, 100.0));
    });
}

/// Benchmark a complete scripted round, checks all the way down
fn bench_full_round(c: &mut Criterion) {
    c.bench_function("full_round_3_players", |b| {
        b.iter(|| {
            let mut round = RoundState::new(
                vec![
                    (PlayerId::new("alice"), 500),
                    (PlayerId::new("bob"), 500),
                    (PlayerId::new("carol"), 500),
                ],
                Question::new("century", 100.0),
                RoundSettings::default(),
            );
            let mut guard = 0;
            while !round.is_finished() && guard < 50 {
                guard += 1;
                if round.phase().is_question() {
                    for (name, value) in [("alice", 95.0), ("bob", 105.0), ("carol", 80.0)] {
                        let _ = round.take_action(&PlayerId::new(name), Action::Answer(value));
                    }
                } else if round.phase().is_betting() {
                    while let Some(player) = round.next_to_act() {
                        round.take_action(&player, Action::Check).unwrap();
                    }
                }
                round = round.step();
            }
            round
        });
    });
}

criterion_group!(
    benches,
    bench_side_pot_construction,
    bench_winner_selection,
    bench_full_round
);
criterion_main!(benches);
