use crate::board::{Board, Owner};
use serde::{Deserialize, Serialize};

pub mod config;
pub mod eval;
pub mod search;

pub use config::{EvalWeights, SearchConfig};
pub use eval::{HeuristicEvaluator, LOSS_SCORE, Score, WIN_SCORE};
pub use search::SearchEngine;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub depth: u8,
    pub nodes: u64,
    pub time_ms: u64,
}

/// Scores a board from one owner's point of view.
pub trait Evaluator {
    fn evaluate(&self, board: &Board, owner: Owner) -> Score;
}
