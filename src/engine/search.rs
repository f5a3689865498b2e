use super::config::SearchConfig;
use super::eval::{HeuristicEvaluator, LOSS_SCORE, Score, WIN_SCORE};
use super::{Evaluator, SearchStats};
use crate::board::{Board, Move, Owner};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Two live players: the opponent minimizes the root's score.
    Minimax,
    /// Max^n seen from the root: every ply maximizes the root's score.
    MaxN,
}

#[derive(Debug, Clone, Copy)]
struct Context {
    root: Owner,
    mode: Mode,
}

/// Depth-limited alpha-beta search over copied boards.
pub struct SearchEngine<E = HeuristicEvaluator> {
    evaluator: E,
    rng: StdRng,
    stats: SearchStats,
}

impl SearchEngine<HeuristicEvaluator> {
    pub fn new(config: &SearchConfig) -> Self {
        Self::with_evaluator(HeuristicEvaluator::new(config.weights.clone()), config.seed)
    }
}

impl<E: Evaluator> SearchEngine<E> {
    pub fn with_evaluator(evaluator: E, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            evaluator,
            rng,
            stats: SearchStats::default(),
        }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Stats from the most recent call to `choose_move`.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Pick a move for `mover`, scoring positions from `root`'s point of view.
    ///
    /// Depth 0 picks uniformly at random among the legal moves. `None` means the
    /// mover has no legal move and should pass.
    pub fn choose_move(&mut self, board: &Board, root: Owner, mover: Owner, depth: u8) -> Option<Move> {
        let started = Instant::now();
        self.stats = SearchStats {
            depth,
            ..SearchStats::default()
        };

        if depth == 0 {
            let moves = board.legal_moves(mover);
            return moves.choose(&mut self.rng).copied();
        }

        let mode = if board.live_players().len() == 2 {
            Mode::Minimax
        } else {
            Mode::MaxN
        };
        let ctx = Context { root, mode };
        let (score, best) = self.search(board, ctx, mover, depth, Score::MIN, Score::MAX, true);

        self.stats.time_ms = started.elapsed().as_millis() as u64;
        debug!(
            root,
            mover,
            depth,
            score,
            nodes = self.stats.nodes,
            time_ms = self.stats.time_ms,
            found = best.is_some(),
            "search finished"
        );
        best
    }

    /// Score of a freshly simulated child before any recursion.
    fn immediate(&self, child: &Board, root: Owner, winner: Option<Owner>) -> Score {
        match winner {
            Some(owner) if owner == root => WIN_SCORE,
            Some(_) => LOSS_SCORE,
            None => self.evaluator.evaluate(child, root),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn search(
        &mut self,
        board: &Board,
        ctx: Context,
        mover: Owner,
        depth: u8,
        mut alpha: Score,
        mut beta: Score,
        is_root: bool,
    ) -> (Score, Option<Move>) {
        self.stats.nodes += 1;

        let moves = board.legal_moves(mover);
        if moves.is_empty() {
            return (self.evaluator.evaluate(board, ctx.root), None);
        }

        let maximizing = ctx.mode == Mode::MaxN || mover == ctx.root;
        let mut best_score = if maximizing { Score::MIN } else { Score::MAX };
        let mut best_immediate = best_score;
        let mut best_move = None;

        // The root scores every child up front so a win this turn is never pruned away.
        let mut scored = Vec::new();
        if is_root {
            for mv in &moves {
                let (child, winner) = board.simulate(*mv, mover);
                let immediate = self.immediate(&child, ctx.root, winner);
                if immediate == WIN_SCORE {
                    return (WIN_SCORE, Some(*mv));
                }
                scored.push((child, winner, immediate));
            }
        }
        let mut scored = scored.into_iter();

        for mv in moves {
            let (child, winner, immediate) = match scored.next() {
                Some(entry) => entry,
                None => {
                    let (child, winner) = board.simulate(mv, mover);
                    let immediate = self.immediate(&child, ctx.root, winner);
                    (child, winner, immediate)
                }
            };

            let score = match (winner, depth) {
                (Some(_), _) | (None, 0..=1) => immediate,
                (None, _) => match child.next_live_after(mover) {
                    Some(next) => self.search(&child, ctx, next, depth - 1, alpha, beta, false).0,
                    None => immediate,
                },
            };

            let better = if maximizing {
                score > best_score || (score == best_score && immediate > best_immediate)
            } else {
                score < best_score || (score == best_score && immediate < best_immediate)
            };
            if better || best_move.is_none() {
                best_score = score;
                best_immediate = immediate;
                best_move = Some(mv);
            }

            if maximizing {
                alpha = alpha.max(best_score);
            } else {
                beta = beta.min(best_score);
            }
            if alpha >= beta {
                break;
            }
        }

        (best_score, best_move)
    }
}
