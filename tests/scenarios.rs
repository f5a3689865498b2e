use boost_arena::engine::{Evaluator, HeuristicEvaluator, Score, SearchConfig, SearchEngine, WIN_SCORE};
use boost_arena::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cell::Cell as Counter;

fn game(preset: Preset) -> Game {
    preset
        .ruleset()
        .create_game_with_rng(&mut StdRng::seed_from_u64(0))
        .unwrap()
}

#[test]
fn test_tower_victory() {
    let mut g = game(Preset::DebugTower);
    assert_eq!(g.play_str("d1c2").unwrap(), Some(1));
    assert_eq!(g.status(), GameStatus::Won(1));
    assert!(matches!(g.play_str("d2d1"), Err(GameError::GameOver)));
}

#[test]
fn test_capture_tower_defeats_player() {
    let mut g = game(Preset::DebugCaptureTower);
    assert_eq!(g.play_str("a4b3").unwrap(), Some(1));
    let board = g.board();
    assert_eq!(board.tower_count(2), 0);
    assert!(board.is_defeated(2));
}

#[test]
fn test_capture_pawn_flank() {
    let mut g = game(Preset::DebugCapturePawn);
    assert_eq!(g.board().boost(g.board().parse_cell("a3").unwrap()), 2);
    assert_eq!(g.play_str("a3c3").unwrap(), Some(1));

    let board = g.board();
    // Only c2 has a friendly piece beyond it.
    assert_eq!(board.get_piece(board.parse_cell("c2").unwrap()), None);
    assert!(board.get_piece(board.parse_cell("b2").unwrap()).is_some());
    assert!(board.get_piece(board.parse_cell("d2").unwrap()).is_some());
    assert_eq!(board.owner_total(2), 3);
}

#[test]
fn test_triple_defeat_resolves_domination_first() {
    let mut g = game(Preset::DebugTripleDefeat);
    let mv = g.board().parse_move("b5c3").unwrap();
    assert_eq!(g.board().boost(mv.start), 3);

    // Landing on c3 also rings player 2's tower with dragons, but the captures remove it first.
    assert_eq!(g.play(mv).unwrap(), Some(1));
    let board = g.board();
    assert_eq!(board.live_players(), vec![1]);
    for owner in 2..=4 {
        assert_eq!(board.tower_count(owner), 0, "player {owner} kept a tower");
    }
}

#[test]
fn test_defeated_player_is_skipped() {
    let mut g = game(Preset::DebugDefeated);
    assert_eq!(g.play_str("a4b3").unwrap(), None);
    assert!(g.board().is_defeated(2));
    assert_eq!(g.turn(), 3);
}

#[test]
fn test_defeated_skip_holds_across_undo_and_redo() {
    let mut g = game(Preset::DebugDefeated);
    g.pass_turn().unwrap();
    assert_eq!(g.turn(), 2);
    g.forfeit().unwrap();
    assert_eq!(g.turn(), 3);
    g.pass_turn().unwrap();
    assert_eq!(g.turn(), 1);
    g.pass_turn().unwrap();
    assert_eq!(g.turn(), 3);

    // Walk back to the position where player 2 was to move.
    g.undo().unwrap();
    g.undo().unwrap();
    g.undo().unwrap();
    assert_eq!(g.turn(), 3);
    g.redo().unwrap();
    assert_eq!(g.turn(), 3);
    g.redo().unwrap();
    assert_eq!(g.turn(), 1);
    g.redo().unwrap();
    assert_eq!(g.turn(), 3);
    assert!(g.board().is_forfeited(2));
}

#[test]
fn test_boost_bounds_everywhere() {
    for preset in Preset::ALL {
        let g = game(preset);
        let board = g.board();
        for cell in board.cells() {
            let boost = board.boost(cell);
            assert!((1..=5).contains(&boost));
            assert_eq!(boost, 1 + board.occupied_neighbors(cell));
        }
    }
}

#[test]
fn test_legal_paths_have_exact_boost() {
    for preset in [Preset::P2Quickstart, Preset::P3, Preset::DebugTripleDefeat] {
        let g = game(preset);
        let board = g.board();
        for mv in g.legal_moves().into_iter().filter(|m| !m.is_in_place()) {
            let path = board.find_path(mv).unwrap();
            assert_eq!(path.len() - 1, board.boost(mv.start));
        }
    }
}

#[test]
fn test_snapshots_round_trip_through_play() {
    let mut g = game(Preset::P2);
    let mut bot = RandomBot::with_seed("r".to_string(), 4);
    for _ in 0..30 {
        if g.is_over() {
            break;
        }
        let board = g.board();
        let reloaded =
            Board::from_snapshot(board.width(), board.height(), board.rules().clone(), &board.snapshot()).unwrap();
        assert_eq!(reloaded.snapshot(), board.snapshot());
        for cell in board.cells() {
            assert_eq!(reloaded.get_piece(cell), board.get_piece(cell));
        }

        match bot.get_move(&g, std::time::Duration::from_secs(1)) {
            Some(mv) => {
                g.play(mv).unwrap();
            }
            None => g.pass_turn().unwrap(),
        }
    }
}

#[test]
fn test_depth_zero_picks_from_legal_moves() {
    let g = game(Preset::P4);
    let legal = g.legal_moves();
    let mut engine = SearchEngine::new(&SearchConfig {
        seed: Some(8),
        ..SearchConfig::default()
    });
    for _ in 0..25 {
        let mv = engine.choose_move(g.board(), 1, 1, 0).unwrap();
        assert!(legal.contains(&mv));
    }
}

struct CountingEvaluator {
    inner: HeuristicEvaluator,
    calls: Counter<usize>,
}

impl Evaluator for CountingEvaluator {
    fn evaluate(&self, board: &Board, owner: Owner) -> Score {
        self.calls.set(self.calls.get() + 1);
        self.inner.evaluate(board, owner)
    }
}

#[test]
fn test_root_win_returns_early() {
    // The dragon on d2 closes the ring around b3 by moving to c3.
    // Player 1's lone pawn on e1 is scanned after it.
    let rules = BoardRules {
        players: 1,
        ..BoardRules::default()
    };
    let board = Board::from_snapshot(
        5,
        4,
        rules,
        ".  D0 .  .  .\n\
         D0 T1 .  P1 .\n\
         .  D0 .  D0 .\n\
         .  .  .  .  P1",
    )
    .unwrap();
    let legal = board.legal_moves(1);
    let winning: Vec<Move> = legal
        .iter()
        .copied()
        .filter(|mv| board.simulate(*mv, 1).1 == Some(1))
        .collect();
    assert_eq!(winning.len(), 1);
    assert_eq!(board.format_move(winning[0]), "d2c3");

    let mut engine = SearchEngine::with_evaluator(
        CountingEvaluator {
            inner: HeuristicEvaluator::default(),
            calls: Counter::new(0),
        },
        Some(0),
    );
    let chosen = engine.choose_move(&board, 1, 1, 1).unwrap();
    assert_eq!(chosen, winning[0]);

    // Moves listed after the winner were never scored.
    let position = legal.iter().position(|mv| *mv == winning[0]).unwrap();
    assert!(position + 1 < legal.len());
    assert!(engine.evaluator().calls.get() <= position);
    assert_eq!(engine.evaluator().evaluate(&board.simulate(chosen, 1).0, 1), WIN_SCORE);
}

#[test]
fn test_deep_search_still_takes_the_capture_win() {
    let g = game(Preset::DebugCaptureTower);
    for depth in 2..=3 {
        let mut engine = SearchEngine::new(&SearchConfig {
            seed: Some(1),
            ..SearchConfig::default()
        });
        let mv = engine.choose_move(g.board(), 1, 1, depth).unwrap();
        assert_eq!(g.board().format_move(mv), "a4b3", "depth {depth}");
    }
}

#[test]
fn test_ringed_tower_is_ordinary_when_tower_victory_is_off() {
    let rules = BoardRules {
        players: 1,
        tower_victory: false,
        ..BoardRules::default()
    };
    let board = Board::from_snapshot(
        5,
        4,
        rules,
        ".  D0 .  .  .\n\
         D0 T1 .  P1 .\n\
         .  D0 .  D0 .\n\
         .  .  .  .  P1",
    )
    .unwrap();
    let mv = board.parse_move("d2c3").unwrap();
    let (child, winner) = board.simulate(mv, 1);
    assert_eq!(winner, None);
    assert_ne!(HeuristicEvaluator::default().evaluate(&child, 1), WIN_SCORE);
}

#[test]
fn test_search_prefers_winning_in_multiplayer() {
    let g = game(Preset::DebugTripleDefeat);
    let mut engine = SearchEngine::new(&SearchConfig {
        seed: Some(2),
        ..SearchConfig::default()
    });
    let mv = engine.choose_move(g.board(), 1, 1, 2).unwrap();
    assert_eq!(g.board().simulate(mv, 1).1, Some(1));
}

#[test]
fn test_search_does_not_touch_live_board() {
    let g = game(Preset::P2Quickstart);
    let before = g.board().snapshot();
    let mut engine = SearchEngine::new(&SearchConfig {
        seed: Some(5),
        ..SearchConfig::default()
    });
    engine.choose_move(g.board(), 1, 1, 2);
    assert_eq!(g.board().snapshot(), before);
}
