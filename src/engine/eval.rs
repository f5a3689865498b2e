use super::Evaluator;
use super::config::EvalWeights;
use crate::board::{Board, Cell, DRAGON_OWNER, Owner, PieceKind};
use std::collections::BTreeSet;

pub type Score = i32;

pub const WIN_SCORE: Score = Score::MAX;
pub const LOSS_SCORE: Score = -Score::MAX;

#[derive(Debug, Clone, Default)]
pub struct HeuristicEvaluator {
    weights: EvalWeights,
}

impl HeuristicEvaluator {
    pub fn new(weights: EvalWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &EvalWeights {
        &self.weights
    }

    /// One of the owner's towers is ringed by dragons and that ring wins.
    fn tower_surrounded(&self, board: &Board, owner: Owner) -> bool {
        board.rules().tower_victory
            && board
                .pieces()
                .filter(|(_, piece)| piece.owner == owner && piece.kind == PieceKind::Tower)
                .any(|(cell, _)| {
                    cell.neighbors()
                        .iter()
                        .all(|n| board.get_piece(*n).is_some_and(|p| p.is_dragon()))
                })
    }

    /// With more than two players, everyone else is already under the minimum.
    fn dominates(&self, board: &Board, owner: Owner) -> bool {
        board.players() > 2
            && (1..=board.players())
                .filter(|other| *other != owner)
                .all(|other| board.owner_total(other) < board.rules().min_pieces)
    }

    fn material(&self, board: &Board, owner: Owner) -> Score {
        board
            .pieces()
            .filter(|(_, piece)| !piece.is_dragon())
            .map(|(_, piece)| {
                if piece.owner == owner {
                    piece.kind.value()
                } else {
                    -piece.kind.value()
                }
            })
            .sum()
    }

    /// Most dragons next to any one of the owner's towers.
    fn dragon_circle(&self, board: &Board, owner: Owner) -> Score {
        board
            .pieces()
            .filter(|(_, piece)| piece.owner == owner && piece.kind == PieceKind::Tower)
            .map(|(cell, _)| {
                cell.neighbors()
                    .iter()
                    .filter(|n| board.get_piece(**n).is_some_and(|p| p.is_dragon()))
                    .count() as Score
            })
            .max()
            .unwrap_or(0)
    }

    /// Best (own - opponent) neighbor count over empty interior cells.
    fn construction_circle(&self, board: &Board, owner: Owner) -> Score {
        if board.tower_count(owner) >= board.rules().max_towers {
            return 0;
        }
        board
            .tower_cells()
            .filter(|cell| board.get_piece(*cell).is_none())
            .map(|cell| {
                cell.neighbors()
                    .iter()
                    .filter_map(|n| board.get_piece(*n))
                    .filter(|p| !p.is_dragon())
                    .map(|p| if p.owner == owner { 1 } else { -1 })
                    .sum::<Score>()
            })
            .max()
            .unwrap_or(0)
    }

    fn is_interior(board: &Board, cell: Cell) -> bool {
        cell.row > 0
            && cell.col > 0
            && (cell.row as usize) < board.height() - 1
            && (cell.col as usize) < board.width() - 1
    }

    fn activity(&self, board: &Board, owner: Owner) -> Score {
        let mut score = 0;
        for (cell, piece) in board.pieces().filter(|(_, p)| p.owner == owner) {
            let interior = Self::is_interior(board, cell);
            match piece.kind {
                PieceKind::Pawn if interior => score += self.weights.interior_pawn,
                PieceKind::Knight => {
                    if interior {
                        score += self.weights.interior_knight;
                    }
                    let boost = board.boost(cell);
                    if (2..=4).contains(&boost) {
                        score += self.weights.knight_boost * boost as Score;
                    }
                }
                _ => {}
            }
        }
        score
    }

    fn dragon_claims(&self, board: &Board, owner: Owner) -> Score {
        if board.tower_count(owner) == 0 {
            return 0;
        }
        board
            .pieces()
            .filter(|(_, piece)| piece.is_dragon())
            .filter_map(|(cell, _)| {
                let claimants: BTreeSet<Owner> = cell
                    .neighbors()
                    .iter()
                    .filter_map(|n| board.get_piece(*n))
                    .map(|p| p.owner)
                    .filter(|o| *o != DRAGON_OWNER)
                    .collect();
                match claimants.len() {
                    1 if claimants.contains(&owner) => Some(self.weights.dragon_claim),
                    1 => Some(-self.weights.dragon_claim),
                    _ => None,
                }
            })
            .sum()
    }
}

impl Evaluator for HeuristicEvaluator {
    fn evaluate(&self, board: &Board, owner: Owner) -> Score {
        if self.tower_surrounded(board, owner) || self.dominates(board, owner) {
            return WIN_SCORE;
        }

        let w = &self.weights;
        self.material(board, owner)
            + self.dragon_circle(board, owner) * w.dragon_circle
            + self.construction_circle(board, owner) * w.construction
            + self.activity(board, owner)
            + self.dragon_claims(board, owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardRules;

    fn board(width: usize, height: usize, players: usize, text: &str) -> Board {
        let rules = BoardRules {
            players,
            ..BoardRules::default()
        };
        Board::from_snapshot(width, height, rules, text).unwrap()
    }

    fn flat() -> HeuristicEvaluator {
        HeuristicEvaluator::new(EvalWeights {
            dragon_circle: 0,
            construction: 0,
            interior_pawn: 0,
            interior_knight: 0,
            knight_boost: 0,
            dragon_claim: 0,
        })
    }

    #[test]
    fn test_material_is_zero_sum() {
        let b = board(4, 1, 2, "P1 K1 T2 D0");
        let eval = flat();
        assert_eq!(eval.evaluate(&b, 1), 20 + 30 - 80);
        assert_eq!(eval.evaluate(&b, 2), 80 - 20 - 30);
    }

    #[test]
    fn test_surrounded_tower_is_a_win() {
        let b = board(3, 3, 2, ".  D0 .\nD0 T1 D0\nP2 D0 .");
        let eval = HeuristicEvaluator::default();
        assert_eq!(eval.evaluate(&b, 1), WIN_SCORE);
        assert_ne!(eval.evaluate(&b, 2), WIN_SCORE);
    }

    #[test]
    fn test_ringed_tower_without_tower_victory_is_not_a_win() {
        let rules = BoardRules {
            players: 2,
            tower_victory: false,
            ..BoardRules::default()
        };
        let b = Board::from_snapshot(3, 3, rules, ".  D0 .\nD0 T1 D0\nP2 D0 .").unwrap();
        let eval = flat();
        assert_eq!(eval.evaluate(&b, 1), 80 - 20);
    }

    #[test]
    fn test_every_ringed_tower_counts_for_its_owner() {
        let b = board(5, 3, 2, ".  D0 .  D0 .\nD0 T1 D0 T2 D0\n.  D0 .  D0 .");
        let eval = HeuristicEvaluator::default();
        assert_eq!(eval.evaluate(&b, 1), WIN_SCORE);
        assert_eq!(eval.evaluate(&b, 2), WIN_SCORE);
    }

    #[test]
    fn test_domination_only_counts_with_three_or_more_players() {
        let text = "P1 P1 P1 P1\nP2 P3 .  .";
        let b = board(4, 2, 3, text);
        assert_eq!(HeuristicEvaluator::default().evaluate(&b, 1), WIN_SCORE);

        let b = board(4, 2, 2, "P1 P1 P1 P1\nP2 .  .  .");
        assert_ne!(HeuristicEvaluator::default().evaluate(&b, 1), WIN_SCORE);
    }

    #[test]
    fn test_dragon_circle_counts_best_tower() {
        let b = board(3, 3, 1, ".  D0 .\nD0 T1 D0\n.  .  .");
        let eval = HeuristicEvaluator::new(EvalWeights {
            dragon_circle: 10,
            ..flat().weights().clone()
        });
        assert_eq!(eval.evaluate(&b, 1), 80 + 3 * 10);
    }

    #[test]
    fn test_construction_prefers_own_neighbors() {
        let b = board(3, 3, 2, ".  P1 .\nP1 .  P1\n.  P2 .");
        let eval = HeuristicEvaluator::new(EvalWeights {
            construction: 10,
            ..flat().weights().clone()
        });
        // Material 3*20 - 20, best interior cell has 3 own and 1 opposing neighbor.
        assert_eq!(eval.evaluate(&b, 1), 40 + 2 * 10);
    }

    #[test]
    fn test_knight_activity() {
        let b = board(3, 3, 2, ".  P2 .\n.  K1 P2\n.  .  .");
        let eval = HeuristicEvaluator::new(EvalWeights {
            interior_knight: 3,
            knight_boost: 2,
            ..flat().weights().clone()
        });
        // boost 3 in the interior.
        assert_eq!(eval.evaluate(&b, 1), 30 - 40 + 3 + 2 * 3);
    }

    #[test]
    fn test_dragon_claims_need_a_tower() {
        let eval = HeuristicEvaluator::new(EvalWeights {
            dragon_claim: 5,
            ..flat().weights().clone()
        });
        let b = board(4, 1, 2, "P1 D0 .  T1");
        assert_eq!(eval.evaluate(&b, 1), 20 + 80 + 5);

        let b = board(4, 1, 2, "P2 D0 .  T1");
        assert_eq!(eval.evaluate(&b, 1), -20 + 80 - 5);

        // Contested dragons are nobody's.
        let b = board(4, 1, 2, "P1 D0 P2 T1");
        assert_eq!(eval.evaluate(&b, 1), 80);

        let b = board(3, 1, 2, "P1 D0 .");
        assert_eq!(eval.evaluate(&b, 1), 20);
    }
}
