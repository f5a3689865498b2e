use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Faction identifier. Player factions count up from 1.
pub type Owner = usize;

/// The neutral faction that owns every dragon.
pub const DRAGON_OWNER: Owner = 0;

/// Owner ids are written as a single digit in piece codes.
pub const MAX_PLAYERS: usize = 9;

const EMPTY_CELL_SHORT: &str = ".";
const EMPTY_CELL_LONG: &str = ". ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Self {
        Cell { row, col }
    }

    /// The four axis-adjacent cells (up, down, left, right). Some may be off the board.
    pub fn neighbors(&self) -> [Cell; 4] {
        [
            Cell::new(self.row - 1, self.col),
            Cell::new(self.row + 1, self.col),
            Cell::new(self.row, self.col - 1),
            Cell::new(self.row, self.col + 1),
        ]
    }

    pub fn manhattan(&self, other: Cell) -> usize {
        (self.row.abs_diff(other.row) + self.col.abs_diff(other.col)) as usize
    }

    /// The cell one step past `next`, continuing the direction from `self` to `next`.
    pub fn beyond(&self, next: Cell) -> Cell {
        Cell::new(2 * next.row - self.row, 2 * next.col - self.col)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Dragon,
    Pawn,
    Knight,
    Tower,
}

impl PieceKind {
    pub const ALL: [PieceKind; 4] = [
        PieceKind::Dragon,
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Tower,
    ];

    fn index(self) -> usize {
        match self {
            PieceKind::Dragon => 0,
            PieceKind::Pawn => 1,
            PieceKind::Knight => 2,
            PieceKind::Tower => 3,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            PieceKind::Dragon => 'D',
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'K',
            PieceKind::Tower => 'T',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PieceKind::Dragon => "Dragon",
            PieceKind::Pawn => "Pawn",
            PieceKind::Knight => "Knight",
            PieceKind::Tower => "Tower",
        }
    }

    /// Material value used by the evaluator.
    pub fn value(self) -> i32 {
        match self {
            PieceKind::Dragon => 0,
            PieceKind::Pawn => 20,
            PieceKind::Knight => 30,
            PieceKind::Tower => 80,
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        PieceKind::ALL.into_iter().find(|kind| kind.symbol() == symbol)
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A piece on the board. `owner == DRAGON_OWNER` exactly when `kind == Dragon`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub owner: Owner,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn dragon() -> Self {
        Piece {
            owner: DRAGON_OWNER,
            kind: PieceKind::Dragon,
        }
    }

    pub fn new(owner: Owner, kind: PieceKind) -> Self {
        debug_assert_eq!(owner == DRAGON_OWNER, kind == PieceKind::Dragon);
        Piece { owner, kind }
    }

    pub fn is_dragon(&self) -> bool {
        self.kind == PieceKind::Dragon
    }

    /// Parse a two-character piece code such as `P1` or `D0`.
    pub fn parse(code: &str) -> Result<Self, ParseError> {
        let bad = || ParseError::BadPiece(code.to_string());
        let mut chars = code.chars();
        let kind = chars
            .next()
            .and_then(PieceKind::from_symbol)
            .ok_or_else(bad)?;
        let owner = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(bad)? as Owner;
        if chars.next().is_some() || (owner == DRAGON_OWNER) != (kind == PieceKind::Dragon) {
            return Err(bad());
        }
        Ok(Piece { owner, kind })
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.symbol(), self.owner)
    }
}

/// A travel move, or an in-place build/promotion when `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub start: Cell,
    pub end: Cell,
}

impl Move {
    pub fn new(start: Cell, end: Cell) -> Self {
        Move { start, end }
    }

    pub fn in_place(cell: Cell) -> Self {
        Move {
            start: cell,
            end: cell,
        }
    }

    pub fn is_in_place(&self) -> bool {
        self.start == self.end
    }

    pub fn distance(&self) -> usize {
        self.start.manhattan(self.end)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("`{0}` is not a cell; cells are written like `a1`")]
    BadCell(String),
    #[error("Bad move format `{0}`. Moves are given in chess notation, e.g. \"a1b2\" to move from A1 to B2.")]
    BadMove(String),
    #[error("`{0}` is not a piece code")]
    BadPiece(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("board dimensions must be positive (got {width}x{height})")]
    BadDimensions { width: usize, height: usize },
    #[error("a ruleset needs between 1 and 9 players (got {0})")]
    BadPlayerCount(usize),
    #[error("layout has {found} rows but the board is {expected} rows tall")]
    RowCount { expected: usize, found: usize },
    #[error("layout row {row} has {found} cells but the board is {expected} cells wide")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("layout places a piece for player {owner} but only {players} players are playing")]
    UnknownOwner { owner: Owner, players: usize },
    #[error("Cannot place an odd number of dragons on this board (center must be unoccupied)")]
    CenterOccupied,
    #[error("cannot place {remaining} more dragon(s): no free mirrored cells are left")]
    NoDragonCells { remaining: usize },
    #[error("ruleset needs {expected} bots but {found} were supplied")]
    BotCount { expected: usize, found: usize },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid ruleset json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ruleset parameters the board consults while judging and applying moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardRules {
    pub players: usize,
    pub max_towers: usize,
    pub knights_per_tower: usize,
    pub min_pieces: usize,
    pub tower_victory: bool,
}

impl Default for BoardRules {
    fn default() -> Self {
        BoardRules {
            players: 2,
            max_towers: 2,
            knights_per_tower: 1,
            min_pieces: 4,
            tower_victory: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Option<Piece>>,
    /// Piece counts per owner, indexed by `PieceKind::index`.
    counts: Vec<[usize; 4]>,
    forfeited: BTreeSet<Owner>,
    rules: BoardRules,
}

impl Board {
    pub fn empty(width: usize, height: usize, rules: BoardRules) -> Self {
        Board {
            width,
            height,
            cells: vec![None; width * height],
            counts: vec![[0; 4]; rules.players + 1],
            forfeited: BTreeSet::new(),
            rules,
        }
    }

    /// Build a board from layout or snapshot text.
    pub fn from_snapshot(
        width: usize,
        height: usize,
        rules: BoardRules,
        text: &str,
    ) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::BadDimensions { width, height });
        }
        let mut board = Board::empty(width, height, rules);
        board.load(text)?;
        Ok(board)
    }

    /// Replace the grid with the contents of `text`. The forfeited set is left alone.
    ///
    /// Rows are separated by newlines (blank lines are skipped) and cells by
    /// whitespace; each cell is `.` or a piece code. On error the board is unchanged.
    pub fn load(&mut self, text: &str) -> Result<(), ConfigError> {
        let rows: Vec<Vec<&str>> = text
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>())
            .filter(|tokens| !tokens.is_empty())
            .collect();
        if rows.len() != self.height {
            return Err(ConfigError::RowCount {
                expected: self.height,
                found: rows.len(),
            });
        }

        let mut cells = Vec::with_capacity(self.width * self.height);
        for (row, tokens) in rows.iter().enumerate() {
            if tokens.len() != self.width {
                return Err(ConfigError::RowWidth {
                    row,
                    expected: self.width,
                    found: tokens.len(),
                });
            }
            for token in tokens {
                if *token == EMPTY_CELL_SHORT {
                    cells.push(None);
                    continue;
                }
                let piece = Piece::parse(token)?;
                if piece.owner > self.rules.players {
                    return Err(ConfigError::UnknownOwner {
                        owner: piece.owner,
                        players: self.rules.players,
                    });
                }
                cells.push(Some(piece));
            }
        }

        self.cells = cells;
        self.recount();
        Ok(())
    }

    fn recount(&mut self) {
        self.counts = vec![[0; 4]; self.rules.players + 1];
        for piece in self.cells.iter().flatten() {
            if let Some(row) = self.counts.get_mut(piece.owner) {
                row[piece.kind.index()] += 1;
            }
        }
    }

    /// Serialized form used for history and undo; the inverse of [`Board::load`].
    pub fn snapshot(&self) -> String {
        self.to_string()
    }

    /// Place dragons in point-symmetric pairs, plus one on the center for odd counts.
    pub fn place_dragons<R: Rng + ?Sized>(
        &mut self,
        dragons: usize,
        rng: &mut R,
    ) -> Result<(), ConfigError> {
        if dragons == 0 {
            return Ok(());
        }
        let middle_row = (self.height / 2) as i32;
        let middle_col = (self.width / 2) as i32;
        let odd_height = self.height % 2 == 1;
        let mut available: Vec<Cell> = self
            .cells()
            .filter(|cell| {
                cell.row < middle_row || (odd_height && cell.row == middle_row && cell.col < middle_col)
            })
            .filter(|cell| self.get_piece(*cell).is_none())
            .collect();

        let mut remaining = dragons;
        if dragons % 2 != 0 {
            let center = Cell::new(middle_row, middle_col);
            if self.get_piece(center).is_some() {
                return Err(ConfigError::CenterOccupied);
            }
            self.set_piece(center, Some(Piece::dragon()));
            remaining -= 1;
        }

        while remaining > 0 {
            if available.is_empty() {
                return Err(ConfigError::NoDragonCells { remaining });
            }
            let cell = available.swap_remove(rng.gen_range(0..available.len()));
            let mirror = self.mirror(cell);
            if self.get_piece(mirror).is_none() {
                self.set_piece(cell, Some(Piece::dragon()));
                self.set_piece(mirror, Some(Piece::dragon()));
                remaining = remaining.saturating_sub(2);
            }
        }
        Ok(())
    }

    /// The 180-degree rotation of `cell` about the board center.
    pub fn mirror(&self, cell: Cell) -> Cell {
        Cell::new(
            self.height as i32 - cell.row - 1,
            self.width as i32 - cell.col - 1,
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rules(&self) -> &BoardRules {
        &self.rules
    }

    pub fn players(&self) -> usize {
        self.rules.players
    }

    /// Number of factions including the dragon faction.
    pub fn owners(&self) -> usize {
        self.rules.players + 1
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row >= 0
            && (cell.row as usize) < self.height
            && cell.col >= 0
            && (cell.col as usize) < self.width
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| cell.row as usize * self.width + cell.col as usize)
    }

    pub fn get_piece(&self, cell: Cell) -> Option<Piece> {
        self.index(cell).and_then(|i| self.cells[i])
    }

    /// Write a cell, keeping the piece-count cache in step. Off-board writes are ignored.
    pub(crate) fn set_piece(&mut self, cell: Cell, piece: Option<Piece>) {
        let Some(i) = self.index(cell) else {
            return;
        };
        if let Some(old) = self.cells[i] {
            if let Some(row) = self.counts.get_mut(old.owner) {
                row[old.kind.index()] -= 1;
            }
        }
        if let Some(new) = piece {
            if let Some(row) = self.counts.get_mut(new.owner) {
                row[new.kind.index()] += 1;
            }
        }
        self.cells[i] = piece;
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height as i32).flat_map(move |row| (0..self.width as i32).map(move |col| Cell::new(row, col)))
    }

    /// Cells that are not on the outer ring.
    pub fn tower_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let (height, width) = (self.height as i32, self.width as i32);
        self.cells()
            .filter(move |cell| cell.row > 0 && cell.row < height - 1 && cell.col > 0 && cell.col < width - 1)
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Cell, Piece)> + '_ {
        self.cells()
            .filter_map(|cell| self.get_piece(cell).map(|piece| (cell, piece)))
    }

    pub fn piece_count(&self, owner: Owner, kind: PieceKind) -> usize {
        self.counts.get(owner).map_or(0, |row| row[kind.index()])
    }

    pub fn owner_total(&self, owner: Owner) -> usize {
        self.counts.get(owner).map_or(0, |row| row.iter().sum())
    }

    pub fn tower_count(&self, owner: Owner) -> usize {
        self.piece_count(owner, PieceKind::Tower)
    }

    pub fn occupied_neighbors(&self, cell: Cell) -> usize {
        cell.neighbors()
            .iter()
            .filter(|n| self.get_piece(**n).is_some())
            .count()
    }

    pub fn forfeit(&mut self, owner: Owner) {
        if owner != DRAGON_OWNER {
            self.forfeited.insert(owner);
        }
    }

    pub fn is_forfeited(&self, owner: Owner) -> bool {
        self.forfeited.contains(&owner)
    }

    pub fn forfeited(&self) -> &BTreeSet<Owner> {
        &self.forfeited
    }

    /// A player is defeated once forfeited, or once below the minimum piece
    /// count without a tower still guarded by mobile pieces.
    pub fn is_defeated(&self, owner: Owner) -> bool {
        if owner == DRAGON_OWNER {
            return false;
        }
        if self.is_forfeited(owner) {
            return true;
        }
        let total = self.owner_total(owner);
        let towers = self.tower_count(owner);
        let tower_threat = self.rules.tower_victory && towers >= 1 && total > towers;
        total < self.rules.min_pieces && !tower_threat
    }

    pub fn defeated(&self) -> BTreeSet<Owner> {
        (1..=self.rules.players)
            .filter(|owner| self.is_defeated(*owner))
            .collect()
    }

    /// Players still in the game, in turn order.
    pub fn live_players(&self) -> Vec<Owner> {
        (1..=self.rules.players)
            .filter(|owner| !self.is_defeated(*owner))
            .collect()
    }

    /// The next live player after `owner`, wrapping around. `owner` itself is
    /// returned when it is the only one left.
    pub fn next_live_after(&self, owner: Owner) -> Option<Owner> {
        let live = self.live_players();
        live.iter()
            .copied()
            .find(|candidate| *candidate > owner)
            .or_else(|| live.first().copied())
    }

    /// Domination: the dragon faction plus exactly one live player remain.
    pub fn capture_winner(&self) -> Option<Owner> {
        match self.live_players().as_slice() {
            [winner] => Some(*winner),
            _ => None,
        }
    }

    /// A tower with a dragon on all four sides wins for its owner.
    pub fn tower_winner(&self) -> Option<Owner> {
        self.tower_cells().find_map(|cell| {
            let tower = self.get_piece(cell)?;
            if tower.kind != PieceKind::Tower {
                return None;
            }
            cell.neighbors()
                .iter()
                .all(|n| self.get_piece(*n).is_some_and(|p| p.is_dragon()))
                .then_some(tower.owner)
        })
    }

    /// Resolve flanking captures made by a pawn or dragon that `owner` landed on `cell`.
    pub(crate) fn capture(&mut self, cell: Cell, owner: Owner) -> usize {
        let captured: Vec<Cell> = cell
            .neighbors()
            .into_iter()
            .filter(|neighbor| {
                let Some(target) = self.get_piece(*neighbor) else {
                    return false;
                };
                if target.owner == owner || target.is_dragon() {
                    return false;
                }
                self.get_piece(cell.beyond(*neighbor))
                    .is_some_and(|flank| flank.owner == owner || flank.is_dragon())
            })
            .collect();
        for target in &captured {
            self.set_piece(*target, None);
        }
        captured.len()
    }

    /// Apply a move that has already been validated for `owner`, returning the
    /// winner if the move ends the game.
    pub fn apply(&mut self, mv: Move, owner: Owner) -> Option<Owner> {
        if mv.is_in_place() {
            let kind = match self.get_piece(mv.start) {
                None => PieceKind::Tower,
                Some(_) => PieceKind::Knight,
            };
            self.set_piece(mv.start, Some(Piece::new(owner, kind)));
            return None;
        }

        let piece = self.get_piece(mv.start)?;
        let target = self.get_piece(mv.end);
        self.set_piece(mv.start, None);
        self.set_piece(mv.end, Some(piece));

        let captures = match piece.kind {
            PieceKind::Knight => usize::from(target.is_some()),
            PieceKind::Pawn | PieceKind::Dragon => self.capture(mv.end, owner),
            PieceKind::Tower => 0,
        };
        if captures > 0 {
            if let Some(winner) = self.capture_winner() {
                return Some(winner);
            }
        }

        // Checked after captures: a fourth dragon may have just captured the tower.
        if self.rules.tower_victory && piece.kind == PieceKind::Dragon {
            return self.tower_winner();
        }
        None
    }

    /// Apply `mv` to a copy of the board, leaving `self` untouched.
    pub fn simulate(&self, mv: Move, owner: Owner) -> (Board, Option<Owner>) {
        let mut branch = self.clone();
        let winner = branch.apply(mv, owner);
        (branch, winner)
    }

    pub fn parse_cell(&self, text: &str) -> Result<Cell, ParseError> {
        let bad = || ParseError::BadCell(text.to_string());
        let mut chars = text.chars();
        let file = chars
            .next()
            .filter(|c| c.is_ascii_alphabetic())
            .ok_or_else(bad)?;
        // Ranks outside the board are rejected here; files past the edge are
        // left for the out-of-bounds move check.
        let rank: usize = chars
            .as_str()
            .parse()
            .ok()
            .filter(|rank| (1..=self.height).contains(rank))
            .ok_or_else(bad)?;
        let col = (file.to_ascii_lowercase() as u8 - b'a') as i32;
        Ok(Cell::new((self.height - rank) as i32, col))
    }

    pub fn format_cell(&self, cell: Cell) -> String {
        let file = u8::try_from(cell.col)
            .ok()
            .and_then(|col| col.checked_add(b'a'))
            .map_or('?', char::from);
        format!("{}{}", file, self.height as i32 - cell.row)
    }

    /// Parse `a1b2` (travel) or `d2` (build or promote in place).
    pub fn parse_move(&self, text: &str) -> Result<Move, ParseError> {
        let text = text.trim();
        let bad = || ParseError::BadMove(text.to_string());
        let split = text
            .char_indices()
            .skip(1)
            .find(|(_, c)| c.is_ascii_alphabetic())
            .map(|(i, _)| i);
        let (start, end) = match split {
            Some(i) => (&text[..i], Some(&text[i..])),
            None => (text, None),
        };
        let start = self.parse_cell(start).map_err(|_| bad())?;
        let end = match end {
            Some(end) => self.parse_cell(end).map_err(|_| bad())?,
            None => start,
        };
        Ok(Move::new(start, end))
    }

    pub fn format_move(&self, mv: Move) -> String {
        if mv.is_in_place() {
            self.format_cell(mv.start)
        } else {
            format!("{}{}", self.format_cell(mv.start), self.format_cell(mv.end))
        }
    }

    fn cell_width(&self) -> usize {
        if self.owners() <= 3 { 2 } else { 3 }
    }

    fn format_piece(&self, piece: Piece) -> String {
        if self.owners() > 3 {
            return piece.to_string();
        }
        let symbol = piece.kind.symbol();
        if piece.owner == 1 {
            symbol.to_ascii_lowercase().to_string()
        } else {
            symbol.to_string()
        }
    }

    /// Human-readable board with file and rank labels.
    pub fn pretty(&self) -> String {
        let cell_width = self.cell_width();
        let mut file_labels = String::from("  ");
        for col in 0..self.width {
            file_labels.push(char::from(b'A' + (col % 26) as u8));
            file_labels.push_str(&" ".repeat(cell_width - 1));
        }
        let border = "─".repeat(cell_width * self.width - 1);

        let mut out = format!("{}\n ┌{}┐\n", file_labels, border);
        for row in 0..self.height {
            let rank = self.height - row;
            out.push_str(&format!("{}│", rank));
            for col in 0..self.width {
                let cell = Cell::new(row as i32, col as i32);
                match self.get_piece(cell) {
                    Some(piece) => out.push_str(&self.format_piece(piece)),
                    None if cell_width == 2 => out.push_str(EMPTY_CELL_SHORT),
                    None => out.push_str(EMPTY_CELL_LONG),
                }
                out.push(if col + 1 < self.width { ' ' } else { '│' });
            }
            out.push_str(&format!("{}\n", rank));
        }
        out.push_str(&format!(" └{}┘\n{}", border, file_labels));
        out
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.height {
            if row > 0 {
                writeln!(f)?;
            }
            for col in 0..self.width {
                match self.get_piece(Cell::new(row as i32, col as i32)) {
                    Some(piece) => write!(f, "{} ", piece)?,
                    None => write!(f, "{} ", EMPTY_CELL_LONG)?,
                }
            }
        }
        Ok(())
    }
}
