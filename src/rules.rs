use crate::board::{Board, Cell, Move, Owner, PieceKind};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use thiserror::Error;

/// Why a move is illegal. Messages are shown to players verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("You cannot build a tower here nor promote a pawn to a knight here.")]
    NoActionHere,
    #[error("There is no piece at {cell} to move.")]
    NoPiece { cell: String },
    #[error("To move the Dragon at {cell}, you must have an adjacent piece.")]
    DragonNotAdjacent { cell: String },
    #[error("You are not the owner of the {kind} at {cell}.")]
    NotOwner { kind: PieceKind, cell: String },
    #[error("Towers cannot move.")]
    TowerImmobile,
    #[error("You must move this piece exactly {boost} cell(s).")]
    WrongDistance { boost: usize },
    #[error("{cell} is out of bounds.")]
    OutOfBounds { cell: String },
    #[error("A {kind} cannot capture pieces directly.")]
    NoDirectCapture { kind: PieceKind },
    #[error("You cannot capture your own piece.")]
    SelfCapture,
    #[error("Dragons cannot be captured.")]
    DragonCapture,
}

impl Board {
    /// Exact travel distance for the piece on `cell`: one plus its occupied neighbors.
    pub fn boost(&self, cell: Cell) -> usize {
        1 + self.occupied_neighbors(cell)
    }

    pub fn can_build_tower(&self, cell: Cell, owner: Owner) -> bool {
        self.in_bounds(cell)
            && self.get_piece(cell).is_none()
            && self.tower_count(owner) < self.rules().max_towers
            && cell
                .neighbors()
                .iter()
                .all(|n| self.get_piece(*n).is_some_and(|p| p.owner == owner))
    }

    pub fn can_promote_knight(&self, cell: Cell, owner: Owner) -> bool {
        let Some(piece) = self.get_piece(cell) else {
            return false;
        };
        if piece.owner != owner || piece.kind != PieceKind::Pawn {
            return false;
        }
        let knights = self.piece_count(owner, PieceKind::Knight);
        if knights >= self.tower_count(owner) * self.rules().knights_per_tower {
            return false;
        }
        cell.neighbors().iter().any(|n| {
            self.get_piece(*n)
                .is_some_and(|p| p.owner == owner && p.kind == PieceKind::Tower)
        })
    }

    /// Any of `owner`'s pieces next to the dragon on `cell` lets them move it.
    pub fn can_move_dragon(&self, cell: Cell, owner: Owner) -> bool {
        cell.neighbors()
            .iter()
            .any(|n| self.get_piece(*n).is_some_and(|p| p.owner == owner))
    }

    /// Find a simple path of exactly `boost(start)` orthogonal steps from start to end.
    ///
    /// Every intermediate cell must be on the board and empty. The final cell is
    /// checked separately by `move_error`, so it may be occupied or off the board.
    /// The returned path includes both endpoints.
    pub fn find_path(&self, mv: Move) -> Option<Vec<Cell>> {
        if mv.is_in_place() {
            return None;
        }
        let boost = self.boost(mv.start);
        if mv.distance() > boost {
            return None;
        }

        // Ordered by steps taken plus remaining manhattan distance.
        let mut worklist = BinaryHeap::new();
        worklist.push(Reverse((mv.distance(), vec![mv.start])));

        while let Some(Reverse((_, path))) = worklist.pop() {
            let steps = path.len() - 1;
            let Some(&cell) = path.last() else {
                continue;
            };
            if cell == mv.end {
                if steps == boost {
                    return Some(path);
                }
                continue;
            }
            if steps == boost {
                continue;
            }

            for next in cell.neighbors() {
                if path.contains(&next) {
                    continue;
                }
                if next != mv.end && (!self.in_bounds(next) || self.get_piece(next).is_some()) {
                    continue;
                }
                let estimate = steps + 1 + next.manhattan(mv.end);
                if estimate > boost {
                    continue;
                }
                let mut extended = path.clone();
                extended.push(next);
                worklist.push(Reverse((estimate, extended)));
            }
        }
        None
    }

    pub fn path_exists(&self, mv: Move) -> bool {
        self.find_path(mv).is_some()
    }

    /// First rule `mv` breaks when played by `owner`, checked in a fixed order.
    pub fn move_error(&self, mv: Move, owner: Owner) -> Option<MoveError> {
        if mv.is_in_place() {
            if self.can_build_tower(mv.start, owner) || self.can_promote_knight(mv.start, owner) {
                return None;
            }
            return Some(MoveError::NoActionHere);
        }

        let Some(piece) = self.get_piece(mv.start) else {
            return Some(MoveError::NoPiece {
                cell: self.format_cell(mv.start),
            });
        };
        if piece.is_dragon() && !self.can_move_dragon(mv.start, owner) {
            return Some(MoveError::DragonNotAdjacent {
                cell: self.format_cell(mv.start),
            });
        }
        if !piece.is_dragon() && piece.owner != owner {
            return Some(MoveError::NotOwner {
                kind: piece.kind,
                cell: self.format_cell(mv.start),
            });
        }
        if piece.kind == PieceKind::Tower {
            return Some(MoveError::TowerImmobile);
        }
        if !self.path_exists(mv) {
            return Some(MoveError::WrongDistance {
                boost: self.boost(mv.start),
            });
        }
        if !self.in_bounds(mv.end) {
            return Some(MoveError::OutOfBounds {
                cell: self.format_cell(mv.end),
            });
        }
        if let Some(target) = self.get_piece(mv.end) {
            if piece.kind != PieceKind::Knight {
                return Some(MoveError::NoDirectCapture { kind: piece.kind });
            }
            if target.owner == owner {
                return Some(MoveError::SelfCapture);
            }
            if target.is_dragon() {
                return Some(MoveError::DragonCapture);
            }
        }
        None
    }

    pub fn is_legal(&self, mv: Move, owner: Owner) -> bool {
        self.move_error(mv, owner).is_none()
    }

    /// Every distinct end cell of a simple path of exactly `boost(cell)` steps whose
    /// intermediate cells are empty. Unfiltered: ends may be occupied or off the board.
    pub fn destinations(&self, cell: Cell) -> Vec<Cell> {
        let mut ends = Vec::new();
        let mut visited = vec![cell];
        self.walk(cell, self.boost(cell), &mut visited, &mut ends);
        ends
    }

    fn walk(&self, cell: Cell, remaining: usize, visited: &mut Vec<Cell>, ends: &mut Vec<Cell>) {
        for next in cell.neighbors() {
            if visited.contains(&next) {
                continue;
            }
            if remaining == 1 {
                if !ends.contains(&next) {
                    ends.push(next);
                }
                continue;
            }
            if !self.in_bounds(next) || self.get_piece(next).is_some() {
                continue;
            }
            visited.push(next);
            self.walk(next, remaining - 1, visited, ends);
            visited.pop();
        }
    }

    /// All legal moves for `owner`: constructions, then promotions, then travel moves.
    pub fn legal_moves(&self, owner: Owner) -> Vec<Move> {
        let mut constructions = Vec::new();
        let mut promotions = Vec::new();
        let mut travels = Vec::new();

        for cell in self.cells() {
            if self.can_build_tower(cell, owner) {
                constructions.push(Move::in_place(cell));
            }
            if self.can_promote_knight(cell, owner) {
                promotions.push(Move::in_place(cell));
            }
            let Some(piece) = self.get_piece(cell) else {
                continue;
            };
            let movable = if piece.is_dragon() {
                self.can_move_dragon(cell, owner)
            } else {
                piece.owner == owner && piece.kind != PieceKind::Tower
            };
            if !movable {
                continue;
            }
            travels.extend(
                self.destinations(cell)
                    .into_iter()
                    .map(|end| Move::new(cell, end))
                    .filter(|mv| self.move_error(*mv, owner).is_none()),
            );
        }

        constructions.extend(promotions);
        constructions.extend(travels);
        constructions
    }
}
