use crate::board::{Move, Owner};
use crate::engine::{Evaluator, HeuristicEvaluator, LOSS_SCORE, SearchConfig, SearchEngine, WIN_SCORE};
use crate::game::Game;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::time::Duration;

/// Trait that all bots must implement
pub trait Bot: Send {
    /// Get the name of the bot
    fn name(&self) -> &str;

    /// Pick a move for the player whose turn it is. `None` passes the turn.
    fn get_move(&mut self, game: &Game, time_limit: Duration) -> Option<Move>;

    /// Notified when the game starts, with the owner id this bot plays
    fn game_start(&mut self, _owner: Owner) {}

    /// Notified after every accepted move, by any player
    fn notify_move(&mut self, _mv: Move) {}

    /// Notified when the game ends
    fn game_end(&mut self) {}
}

/// Plays a uniformly random legal move.
pub struct RandomBot {
    name: String,
    rng: StdRng,
}

impl RandomBot {
    pub fn new(name: String) -> Self {
        RandomBot {
            name,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(name: String, seed: u64) -> Self {
        RandomBot {
            name,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Bot for RandomBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_move(&mut self, game: &Game, _time_limit: Duration) -> Option<Move> {
        game.legal_moves().choose(&mut self.rng).copied()
    }
}

/// Takes whichever move scores best one ply ahead.
pub struct GreedyBot {
    name: String,
    evaluator: HeuristicEvaluator,
}

impl GreedyBot {
    pub fn new(name: String) -> Self {
        GreedyBot {
            name,
            evaluator: HeuristicEvaluator::default(),
        }
    }

    fn evaluate_move(&self, game: &Game, mv: Move) -> i32 {
        let owner = game.turn();
        match game.board().simulate(mv, owner) {
            (_, Some(winner)) if winner == owner => WIN_SCORE,
            (_, Some(_)) => LOSS_SCORE,
            (child, None) => self.evaluator.evaluate(&child, owner),
        }
    }
}

impl Bot for GreedyBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_move(&mut self, game: &Game, _time_limit: Duration) -> Option<Move> {
        game.legal_moves()
            .into_iter()
            .max_by_key(|&mv| self.evaluate_move(game, mv))
    }
}

/// Alpha-beta search to a fixed depth.
pub struct SearchBot {
    name: String,
    depth: u8,
    engine: SearchEngine,
}

impl SearchBot {
    pub fn new(name: String, config: &SearchConfig) -> Self {
        SearchBot {
            name,
            depth: config.depth,
            engine: SearchEngine::new(config),
        }
    }
}

impl Bot for SearchBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_move(&mut self, game: &Game, _time_limit: Duration) -> Option<Move> {
        let owner = game.turn();
        self.engine.choose_move(game.board(), owner, owner, self.depth)
    }
}
