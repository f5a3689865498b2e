use crate::board::{Board, BoardRules, ConfigError, MAX_PLAYERS};
use crate::game::Game;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const SOLO_BOARD: &str = "
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
P1 P1 P1 P1 .  P1 P1 P1 P1
";

const P2_BOARD: &str = "
P2 P2 P2 P2 .  P2 P2 P2 P2
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
P1 P1 P1 P1 .  P1 P1 P1 P1
";

const P2_BOARD_MINI: &str = "
.  .  .  P2 P2 P2 P2
.  .  .  .  .  .  .
.  .  .  .  .  .  .
.  .  .  .  .  .  .
.  .  .  .  .  .  .
.  .  .  .  .  .  .
P1 P1 P1 P1 .  .  .
";

const P2_BOARD_QUICKSTART: &str = "
.  .  P2 .  .  .  P2 .  .
.  P2 T2 P2 .  P2 T2 P2 .
.  .  P2 .  .  .  P2 .  .
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
.  .  P1 .  .  .  P1 .  .
.  P1 T1 P1 .  P1 T1 P1 .
.  .  P1 .  .  .  P1 .  .
";

const P3_BOARD: &str = "
P2 P2 P2 P2 .  P3 P3 P3 P3
.  .  .  .  .  .  .  .  .
P2 .  .  .  .  .  .  .  P3
P2 .  .  .  .  .  .  .  P3
P2 .  .  .  .  .  .  .  P3
P2 .  .  .  .  .  .  .  P3
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
P1 P1 P1 P1 .  P1 P1 P1 P1
";

const P4_BOARD: &str = "
P2 P2 P2 P2 .  P4 P4 P4 P4
.  .  .  .  .  .  .  .  .
P2 .  .  .  .  .  .  .  P4
P2 .  .  .  .  .  .  .  P4
.  .  .  .  .  .  .  .  .
P1 .  .  .  .  .  .  .  P3
P1 .  .  .  .  .  .  .  P3
.  .  .  .  .  .  .  .  .
P1 P1 P1 P1 .  P3 P3 P3 P3
";

const P4_BOARD_MINIMAL: &str = "
P2 .  .  .  .  P3 P3 P3 P3
P2 .  .  .  .  .  .  .  .
P2 .  .  .  .  .  .  .  .
P2 .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  .
.  .  .  .  .  .  .  .  P4
.  .  .  .  .  .  .  .  P4
.  .  .  .  .  .  .  .  P4
P1 P1 P1 P1 .  .  .  .  P4
";

// Player 1 wins by tower with d1c2.
const DEBUG_BOARD_TOWER: &str = "
.  D0 .  .
D0 T1 .  P1
.  D0 .  D0
";

// Player 1 wins by capture with a4b3.
const DEBUG_BOARD_CAPTURE_TOWER: &str = "
P1 T1
.  .
P2 T2
.  D0
";

// Player 1 wins by capture with a3c3.
const DEBUG_BOARD_CAPTURE_PAWN: &str = "
P1 .  .  .
P2 P2 P2 P2
P1 P1 P1 P1
";

// b5c3 knocks out players 2, 3 and 4 before any of their towers is surrounded.
const DEBUG_BOARD_TRIPLE_DEFEAT: &str = "
P1 D0 .  T1 P3
P2 D0 .  D0 P4
D0 T2 .  T3 D0
.  D0 T4 D0 .
.  .  D0 .  .
";

// a4b3 defeats player 2, so the turn passes to player 3.
const DEBUG_BOARD_DEFEATED: &str = "
P1 T1 P3
.  .  .
P2 T2 .
.  D0 T3
";

/// Named starting configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    P2,
    Solo,
    P2Dragonless,
    P2Mini,
    P2MiniDragonless,
    P2Quickstart,
    P3,
    P4,
    P4Minimal,
    DebugTower,
    DebugCaptureTower,
    DebugCapturePawn,
    DebugTripleDefeat,
    DebugDefeated,
}

impl Preset {
    pub const ALL: [Preset; 14] = [
        Preset::P2,
        Preset::Solo,
        Preset::P2Dragonless,
        Preset::P2Mini,
        Preset::P2MiniDragonless,
        Preset::P2Quickstart,
        Preset::P3,
        Preset::P4,
        Preset::P4Minimal,
        Preset::DebugTower,
        Preset::DebugCaptureTower,
        Preset::DebugCapturePawn,
        Preset::DebugTripleDefeat,
        Preset::DebugDefeated,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::P2 => "p2",
            Preset::Solo => "solo",
            Preset::P2Dragonless => "p2-dragonless",
            Preset::P2Mini => "p2-mini",
            Preset::P2MiniDragonless => "p2-mini-dragonless",
            Preset::P2Quickstart => "p2-quickstart",
            Preset::P3 => "p3",
            Preset::P4 => "p4",
            Preset::P4Minimal => "p4-minimal",
            Preset::DebugTower => "debug-tower",
            Preset::DebugCaptureTower => "debug-capture-tower",
            Preset::DebugCapturePawn => "debug-capture-pawn",
            Preset::DebugTripleDefeat => "debug-triple-defeat",
            Preset::DebugDefeated => "debug-defeated",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase().replace('_', "-");
        Preset::ALL.into_iter().find(|preset| preset.name() == name)
    }

    pub fn ruleset(self) -> Ruleset {
        let (layout, width, height, players, dragons) = match self {
            Preset::P2 => (P2_BOARD, 9, 9, 2, 7),
            Preset::Solo => (SOLO_BOARD, 9, 9, 1, 7),
            Preset::P2Dragonless => (P2_BOARD, 9, 9, 2, 0),
            Preset::P2Mini => (P2_BOARD_MINI, 7, 7, 2, 7),
            Preset::P2MiniDragonless => (P2_BOARD_MINI, 7, 7, 2, 0),
            Preset::P2Quickstart => (P2_BOARD_QUICKSTART, 9, 9, 2, 7),
            Preset::P3 => (P3_BOARD, 9, 9, 3, 7),
            Preset::P4 => (P4_BOARD, 9, 9, 4, 7),
            Preset::P4Minimal => (P4_BOARD_MINIMAL, 9, 9, 4, 7),
            Preset::DebugTower => (DEBUG_BOARD_TOWER, 4, 3, 1, 0),
            Preset::DebugCaptureTower => (DEBUG_BOARD_CAPTURE_TOWER, 2, 4, 2, 0),
            Preset::DebugCapturePawn => (DEBUG_BOARD_CAPTURE_PAWN, 4, 3, 2, 0),
            Preset::DebugTripleDefeat => (DEBUG_BOARD_TRIPLE_DEFEAT, 5, 5, 4, 0),
            Preset::DebugDefeated => (DEBUG_BOARD_DEFEATED, 3, 4, 3, 0),
        };
        Ruleset {
            layout: layout.trim().to_string(),
            width,
            height,
            players,
            dragons,
            ..Ruleset::default()
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A starting configuration: layout, dimensions, factions and dragon count,
/// plus the tunable rule constants. Missing JSON fields fall back to the
/// two-player default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ruleset {
    pub layout: String,
    pub width: usize,
    pub height: usize,
    pub players: usize,
    pub dragons: usize,
    pub max_towers: usize,
    pub knights_per_tower: usize,
    pub min_pieces: usize,
    pub tower_victory: bool,
}

impl Default for Ruleset {
    fn default() -> Self {
        let rules = BoardRules::default();
        Ruleset {
            layout: P2_BOARD.trim().to_string(),
            width: 9,
            height: 9,
            players: 2,
            dragons: 7,
            max_towers: rules.max_towers,
            knights_per_tower: rules.knights_per_tower,
            min_pieces: rules.min_pieces,
            tower_victory: rules.tower_victory,
        }
    }
}

impl Ruleset {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let ruleset: Ruleset = serde_json::from_str(json)?;
        ruleset.validate()?;
        Ok(ruleset)
    }

    /// Factions including the dragons.
    pub fn owners(&self) -> usize {
        self.players + 1
    }

    pub fn rules(&self) -> BoardRules {
        BoardRules {
            players: self.players,
            max_towers: self.max_towers,
            knights_per_tower: self.knights_per_tower,
            min_pieces: self.min_pieces,
            tower_victory: self.tower_victory,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::BadDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.players == 0 || self.players > MAX_PLAYERS {
            return Err(ConfigError::BadPlayerCount(self.players));
        }
        Board::from_snapshot(self.width, self.height, self.rules(), &self.layout)?;
        Ok(())
    }

    pub fn create_board(&self) -> Result<Board, ConfigError> {
        self.create_board_with_rng(&mut rand::thread_rng())
    }

    /// Load the layout, then scatter the dragons using `rng`.
    pub fn create_board_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Board, ConfigError> {
        self.validate()?;
        let mut board = Board::from_snapshot(self.width, self.height, self.rules(), &self.layout)?;
        board.place_dragons(self.dragons, rng)?;
        debug!(
            width = self.width,
            height = self.height,
            players = self.players,
            dragons = self.dragons,
            "created board"
        );
        Ok(board)
    }

    pub fn create_game(&self) -> Result<Game, ConfigError> {
        Ok(Game::new(self.create_board()?))
    }

    pub fn create_game_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Game, ConfigError> {
        Ok(Game::new(self.create_board_with_rng(rng)?))
    }
}

impl From<Preset> for Ruleset {
    fn from(preset: Preset) -> Self {
        preset.ruleset()
    }
}
