//! Single-player match tests.
//!
//! Full matches against the computer opponent on the fixture catalog,
//! with both sides picking cards at random.

use duelogue::cards::{CardCatalog, Category};
use duelogue::core::{GameRng, MatchConfig, MatchError, Side};
use duelogue::game::{Match, MatchPhase, StatLine, TurnReport};
use duelogue::rules::{OpponentPolicy, RandomOpponent};

const MAX_HALF_TURNS: usize = 400;

fn catalog() -> CardCatalog {
    CardCatalog::from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/cards.json")).unwrap()
}

/// Play a match to the end or to `MAX_HALF_TURNS`, returning every report.
fn run(seed: u64, config: MatchConfig) -> (Match, Vec<TurnReport>) {
    let mut game = Match::new(catalog(), config, seed);
    let mut chooser = GameRng::new(seed ^ 0x5eed);
    game.start_with_coin_flip().unwrap();

    let mut reports = Vec::new();
    for _ in 0..MAX_HALF_TURNS {
        let report = match game.active() {
            Side::Player => {
                let me = game.character(Side::Player);
                let them = game.character(Side::Enemy);
                match RandomOpponent.choose_card(me, them, &mut chooser) {
                    Some(index) => Some(game.play_card(Side::Player, index).unwrap()),
                    None => None,
                }
            }
            Side::Enemy => Some(game.play_opponent_turn(&RandomOpponent).unwrap()),
        };

        if let Some(report) = report {
            let last = report.is_final();
            reports.push(report);
            if last {
                break;
            }
        }
        game.end_turn().unwrap();
    }
    (game, reports)
}

// =============================================================================
// Catalog
// =============================================================================

/// The fixture loads into the expected pools, localized category names
/// included.
#[test]
fn test_fixture_catalog_loads() {
    let catalog = catalog();

    assert_eq!(catalog.attack_pool(Side::Player).len(), 5);
    assert_eq!(catalog.attack_pool(Side::Enemy).len(), 5);
    assert!(catalog
        .attack_pool(Side::Enemy)
        .iter()
        .all(|t| t.category() == Category::Attack));
    assert_eq!(catalog.defense_cards().len(), 3);
    assert_eq!(catalog.evasion_cards().len(), 3);
    assert_eq!(catalog.rare_attack_cards().len(), 2);

    let repeat = catalog.repeat_card().unwrap();
    assert!(repeat.is_repeat());
    assert_eq!(repeat.text(), "You already said that!");
}

/// Successive copies of a card cycle through its text variants.
#[test]
fn test_variant_cursor_cycles() {
    let catalog = catalog();
    let template = catalog.find("Statistics").unwrap();

    let indices: Vec<usize> = (0..4)
        .map(|_| catalog.instantiate(template).current_variant_index)
        .collect();
    assert_eq!(indices, vec![0, 1, 2, 0]);

    catalog.reset_cursors();
    assert_eq!(catalog.instantiate(template).text(), "The numbers say otherwise.");
}

// =============================================================================
// Full matches
// =============================================================================

/// Random play on both sides never breaks the table invariants.
#[test]
fn test_random_matches_hold_invariants() {
    for seed in 0..12 {
        // Odd seeds let the opponent pull cards back from its discard pile.
        let replay = if seed % 2 == 1 { 0.3 } else { 0.0 };
        let config = MatchConfig::default().with_discard_replay_chance(replay);
        let (game, reports) = run(seed, config);
        assert!(!reports.is_empty());

        let mut points = [0u32; 2];
        for report in &reports {
            for (side, line) in report.stats.iter() {
                let slot = usize::from(side == Side::Enemy);
                assert!(line.points >= points[slot], "points went down");
                points[slot] = line.points;
                assert!(line.max_logic >= line.logic);
                assert!(line.max_emotion >= line.emotion);
                assert!(line.shield.map_or(true, |s| s > 0));
            }
            for (_, hand) in report.hands.iter() {
                assert!(hand.len() <= 7);
                assert!(hand.iter().all(|card| !card.used));
            }
        }

        if let Some(winner) = game.winner() {
            let last = reports.last().unwrap();
            assert_eq!(last.winner, Some(winner));
            assert!(game.character(winner).points >= game.config().points_to_win);
            assert!(reports[..reports.len() - 1].iter().all(|r| r.winner.is_none()));
        }
    }
}

/// A finished match rejects every further action.
#[test]
fn test_finished_match_is_frozen() {
    let finished = (0..64)
        .map(|seed| run(seed, MatchConfig::default()).0)
        .find(Match::is_over)
        .expect("no seed finished a match");

    let mut game = finished;
    let winner = game.winner().unwrap();
    assert_eq!(game.phase(), MatchPhase::Finished { winner });
    assert_eq!(game.end_turn().unwrap_err(), MatchError::GameOver);
    assert_eq!(game.play_card(Side::Player, 0).unwrap_err(), MatchError::GameOver);
    assert_eq!(
        game.play_opponent_turn(&RandomOpponent).unwrap_err(),
        MatchError::GameOver
    );
}

/// The same seed replays the same match line for line.
#[test]
fn test_seeded_match_is_reproducible() {
    let (first_game, first) = run(42, MatchConfig::default());
    let (second_game, second) = run(42, MatchConfig::default());

    let lines = |reports: &[TurnReport]| -> Vec<String> { reports.iter().flat_map(|r| r.log.clone()).collect() };
    assert_eq!(lines(&first), lines(&second));
    assert_eq!(first_game.stats(), second_game.stats());
    assert_eq!(first_game.turn(), second_game.turn());
}

/// A lower point target ends matches sooner.
#[test]
fn test_points_to_win_is_configurable() {
    let config = MatchConfig::default().with_points_to_win(1);

    for seed in 0..8 {
        let (game, reports) = run(seed, config.clone());
        if let Some(winner) = game.winner() {
            assert!(game.character(winner).points >= 1);
            assert_eq!(reports.iter().filter(|r| r.is_final()).count(), 1);
            let last = reports.last().unwrap();
            assert!(last.log.last().unwrap().contains("won"));
        }
    }
}

/// Reported numbers are the characters' numbers after the half-turn.
#[test]
fn test_report_stats_match_characters() {
    let mut game = Match::new(catalog(), MatchConfig::default(), 3);
    game.start(Side::Player).unwrap();

    let report = game.play_card(Side::Player, 0).unwrap();

    for side in Side::BOTH {
        assert_eq!(report.stats[side], StatLine::from(game.character(side)));
        assert_eq!(report.hands[side], game.character(side).hand);
    }
    assert_eq!(report.actor, Side::Player);
    assert_eq!(report.turn, 1);
    assert!(report.played.is_none());
    assert!(report.log[0].starts_with(report.resolution.as_ref().unwrap().speech.as_str()));
}
