use crate::board::{Board, ConfigError, Move, Owner, ParseError};
use crate::rules::MoveError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Invalid move: {0}")]
    InvalidMove(#[from] MoveError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Game already over")]
    GameOver,
    #[error("There are no previous moves to undo.")]
    NothingToUndo,
    #[error("There are no undone moves to redo.")]
    NothingToRedo,
    #[error("history snapshot could not be restored: {0}")]
    Snapshot(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Ongoing,
    Won(Owner),
    /// Every player has forfeited or been defeated.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HistoryEntry {
    snapshot: String,
    turn: Owner,
    winner: Option<Owner>,
}

/// A board plus whose turn it is, with an undo/redo history of snapshots.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    turn: Owner,
    winner: Option<Owner>,
    history: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
}

impl Game {
    /// Start a game on `board`. Player 1 moves first unless already defeated.
    pub fn new(board: Board) -> Self {
        let turn = if board.is_defeated(1) {
            board.next_live_after(1).unwrap_or(1)
        } else {
            1
        };
        let mut game = Game {
            board,
            turn,
            winner: None,
            history: Vec::new(),
            redo: Vec::new(),
        };
        game.history.push(game.entry());
        game
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Owner {
        self.turn
    }

    pub fn winner(&self) -> Option<Owner> {
        self.winner
    }

    pub fn status(&self) -> GameStatus {
        match self.winner {
            Some(owner) => GameStatus::Won(owner),
            None if self.board.live_players().is_empty() => GameStatus::Abandoned,
            None => GameStatus::Ongoing,
        }
    }

    pub fn is_over(&self) -> bool {
        self.status() != GameStatus::Ongoing
    }

    /// Number of recorded positions, including the starting one.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn get_move_error(&self, mv: Move) -> Option<MoveError> {
        self.board.move_error(mv, self.turn)
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.board.legal_moves(self.turn)
    }

    /// Validate and apply `mv` for the player to move. Returns the winner, if any.
    pub fn play(&mut self, mv: Move) -> Result<Option<Owner>, GameError> {
        self.ensure_ongoing()?;
        if let Some(err) = self.get_move_error(mv) {
            return Err(err.into());
        }

        let mover = self.turn;
        let winner = self.board.apply(mv, mover);
        info!(player = mover, mv = %self.board.format_move(mv), "move played");

        self.winner = winner;
        match winner {
            Some(owner) => info!(winner = owner, "game won"),
            None => self.advance_turn(),
        }
        self.record();
        Ok(winner)
    }

    pub fn play_str(&mut self, notation: &str) -> Result<Option<Owner>, GameError> {
        let mv = self.board.parse_move(notation)?;
        self.play(mv)
    }

    /// Skip the current player's turn, used when they have no legal move.
    pub fn pass_turn(&mut self) -> Result<(), GameError> {
        self.ensure_ongoing()?;
        debug!(player = self.turn, "turn passed");
        self.advance_turn();
        self.record();
        Ok(())
    }

    /// The player to move resigns. Forfeits survive undo and redo.
    pub fn forfeit(&mut self) -> Result<Option<Owner>, GameError> {
        self.ensure_ongoing()?;
        let owner = self.turn;
        self.board.forfeit(owner);
        info!(player = owner, "player forfeited");

        self.winner = self.board.capture_winner();
        if self.winner.is_none() && !self.board.live_players().is_empty() {
            self.advance_turn();
        }
        self.record();
        Ok(self.winner)
    }

    pub fn undo(&mut self) -> Result<(), GameError> {
        if self.history.len() <= 1 {
            return Err(GameError::NothingToUndo);
        }
        let Some(undone) = self.history.pop() else {
            return Err(GameError::NothingToUndo);
        };
        self.redo.push(undone);
        self.restore_last()
    }

    pub fn redo(&mut self) -> Result<(), GameError> {
        let Some(entry) = self.redo.pop() else {
            return Err(GameError::NothingToRedo);
        };
        self.history.push(entry);
        self.restore_last()
    }

    fn restore_last(&mut self) -> Result<(), GameError> {
        let Some(entry) = self.history.last().cloned() else {
            return Err(GameError::NothingToUndo);
        };
        self.board.load(&entry.snapshot)?;
        self.turn = entry.turn;
        self.winner = entry.winner;
        // The restored player may have forfeited since this position was recorded.
        if self.winner.is_none()
            && self.board.is_defeated(self.turn)
            && !self.board.live_players().is_empty()
        {
            self.advance_turn();
        }
        debug!(turn = self.turn, history = self.history.len(), "position restored");
        Ok(())
    }

    fn ensure_ongoing(&self) -> Result<(), GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        Ok(())
    }

    fn advance_turn(&mut self) {
        match self.board.next_live_after(self.turn) {
            Some(next) => self.turn = next,
            None => panic!("cannot advance the turn: every player is defeated"),
        }
    }

    fn entry(&self) -> HistoryEntry {
        HistoryEntry {
            snapshot: self.board.snapshot(),
            turn: self.turn,
            winner: self.winner,
        }
    }

    fn record(&mut self) {
        let entry = self.entry();
        self.history.push(entry);
        self.redo.clear();
    }
}
