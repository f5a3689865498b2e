use crate::board::{ConfigError, Move, Owner};
use crate::bot::Bot;
use crate::game::{Game, GameStatus};
use crate::ruleset::Ruleset;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub time_per_move: Duration,
    pub max_moves: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            time_per_move: Duration::from_secs(5),
            max_moves: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Win {
        owner: Owner,
        winner_name: String,
        moves: usize,
    },
    /// The move limit was reached.
    Draw { moves: usize },
    /// Every player dropped out without a winner.
    Abandoned { moves: usize },
}

impl MatchResult {
    pub fn winner(&self) -> Option<&str> {
        match self {
            MatchResult::Win { winner_name, .. } => Some(winner_name),
            MatchResult::Draw { .. } | MatchResult::Abandoned { .. } => None,
        }
    }

    pub fn moves(&self) -> usize {
        match self {
            MatchResult::Win { moves, .. }
            | MatchResult::Draw { moves }
            | MatchResult::Abandoned { moves } => *moves,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Timeout,
    IllegalMove,
}

/// A bot that was forced to forfeit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forfeit {
    pub owner: Owner,
    pub bot_name: String,
    pub violation: Violation,
}

/// One game between bots. Bot `i` plays owner `i + 1`.
pub struct Match {
    config: MatchConfig,
    game: Game,
    bots: Vec<Box<dyn Bot>>,
    move_count: usize,
    forfeits: Vec<Forfeit>,
}

impl Match {
    pub fn new(
        ruleset: &Ruleset,
        bots: Vec<Box<dyn Bot>>,
        config: MatchConfig,
    ) -> Result<Self, ConfigError> {
        Self::with_game(ruleset.create_game()?, bots, config)
    }

    pub fn with_game(
        game: Game,
        bots: Vec<Box<dyn Bot>>,
        config: MatchConfig,
    ) -> Result<Self, ConfigError> {
        let expected = game.board().players();
        if bots.len() != expected {
            return Err(ConfigError::BotCount {
                expected,
                found: bots.len(),
            });
        }
        Ok(Match {
            config,
            game,
            bots,
            move_count: 0,
            forfeits: Vec::new(),
        })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn forfeits(&self) -> &[Forfeit] {
        &self.forfeits
    }

    pub fn play(&mut self) -> MatchResult {
        for (index, bot) in self.bots.iter_mut().enumerate() {
            bot.game_start(index + 1);
        }

        let names: Vec<&str> = self.bots.iter().map(|bot| bot.name()).collect();
        info!(players = ?names, "match starting");
        debug!("initial board:\n{}", self.game.board().pretty());

        while !self.game.is_over() && self.move_count < self.config.max_moves {
            self.play_turn();
        }

        for bot in self.bots.iter_mut() {
            bot.game_end();
        }

        let moves = self.move_count;
        let result = match self.game.status() {
            GameStatus::Won(owner) => MatchResult::Win {
                owner,
                winner_name: self.bot_name(owner),
                moves,
            },
            GameStatus::Abandoned => MatchResult::Abandoned { moves },
            GameStatus::Ongoing => {
                info!(max_moves = self.config.max_moves, "move limit reached");
                MatchResult::Draw { moves }
            }
        };
        info!(?result, "match finished");
        result
    }

    fn bot_name(&self, owner: Owner) -> String {
        owner
            .checked_sub(1)
            .and_then(|index| self.bots.get(index))
            .map_or_else(|| format!("Player {owner}"), |bot| bot.name().to_string())
    }

    fn play_turn(&mut self) {
        let owner = self.game.turn();
        let Some(bot) = owner.checked_sub(1).and_then(|index| self.bots.get_mut(index)) else {
            warn!(owner, "no bot seated for player");
            self.forfeit(owner, Violation::IllegalMove);
            return;
        };

        let start = Instant::now();
        let mv = bot.get_move(&self.game, self.config.time_per_move);
        let elapsed = start.elapsed();

        if elapsed > self.config.time_per_move {
            warn!(
                bot = bot.name(),
                ?elapsed,
                limit = ?self.config.time_per_move,
                "bot exceeded its time limit"
            );
            self.forfeit(owner, Violation::Timeout);
            return;
        }

        match mv {
            None => {
                debug!(bot = bot.name(), "no move, passing");
                if let Err(e) = self.game.pass_turn() {
                    warn!(error = %e, "pass rejected");
                }
            }
            Some(mv) => self.apply(owner, mv, elapsed),
        }
        self.move_count += 1;
    }

    fn apply(&mut self, owner: Owner, mv: Move, elapsed: Duration) {
        let notation = self.game.board().format_move(mv);
        match self.game.play(mv) {
            Ok(_) => {
                debug!(owner, mv = %notation, ?elapsed, "move accepted");
                debug!("\n{}", self.game.board().pretty());
                for bot in self.bots.iter_mut() {
                    bot.notify_move(mv);
                }
            }
            Err(e) => {
                warn!(owner, mv = %notation, error = %e, "illegal move");
                self.forfeit(owner, Violation::IllegalMove);
            }
        }
    }

    fn forfeit(&mut self, owner: Owner, violation: Violation) {
        let bot_name = self.bot_name(owner);
        self.forfeits.push(Forfeit {
            owner,
            bot_name,
            violation,
        });
        if let Err(e) = self.game.forfeit() {
            warn!(error = %e, "forfeit rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::{GreedyBot, RandomBot};
    use crate::ruleset::Preset;

    struct StubbornBot;

    impl Bot for StubbornBot {
        fn name(&self) -> &str {
            "stubborn"
        }

        // a1a2 is a short move into an enemy pawn on the capture-pawn board.
        fn get_move(&mut self, game: &Game, _time_limit: Duration) -> Option<Move> {
            game.board().parse_move("a1a2").ok()
        }
    }

    struct SlowBot;

    impl Bot for SlowBot {
        fn name(&self) -> &str {
            "slow"
        }

        fn get_move(&mut self, game: &Game, time_limit: Duration) -> Option<Move> {
            std::thread::sleep(time_limit + Duration::from_millis(5));
            game.legal_moves().first().copied()
        }
    }

    #[test]
    fn test_bot_count_must_match_players() {
        let bots: Vec<Box<dyn Bot>> = vec![Box::new(GreedyBot::new("solo".to_string()))];
        assert!(matches!(
            Match::new(&Preset::P2Dragonless.ruleset(), bots, MatchConfig::default()),
            Err(ConfigError::BotCount { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_greedy_bot_wins_debug_board() {
        let bots: Vec<Box<dyn Bot>> = vec![
            Box::new(GreedyBot::new("greedy".to_string())),
            Box::new(RandomBot::with_seed("random".to_string(), 5)),
        ];
        let mut m = Match::new(&Preset::DebugCapturePawn.ruleset(), bots, MatchConfig::default()).unwrap();
        let result = m.play();
        assert_eq!(
            result,
            MatchResult::Win {
                owner: 1,
                winner_name: "greedy".to_string(),
                moves: 1,
            }
        );
    }

    #[test]
    fn test_illegal_move_forfeits() {
        let bots: Vec<Box<dyn Bot>> = vec![
            Box::new(StubbornBot),
            Box::new(GreedyBot::new("greedy".to_string())),
        ];
        let mut m = Match::new(&Preset::DebugCapturePawn.ruleset(), bots, MatchConfig::default()).unwrap();
        let result = m.play();
        assert_eq!(result.winner(), Some("greedy"));
        assert_eq!(m.forfeits()[0].violation, Violation::IllegalMove);
        assert_eq!(m.forfeits()[0].owner, 1);
    }

    #[test]
    fn test_timeout_forfeits() {
        let bots: Vec<Box<dyn Bot>> = vec![
            Box::new(SlowBot),
            Box::new(GreedyBot::new("greedy".to_string())),
        ];
        let config = MatchConfig {
            time_per_move: Duration::from_millis(10),
            ..MatchConfig::default()
        };
        let mut m = Match::new(&Preset::DebugCapturePawn.ruleset(), bots, config).unwrap();
        assert_eq!(m.play().winner(), Some("greedy"));
        assert_eq!(m.forfeits()[0].violation, Violation::Timeout);
    }

    #[test]
    fn test_move_limit_draws() {
        let bots: Vec<Box<dyn Bot>> = vec![
            Box::new(RandomBot::with_seed("a".to_string(), 1)),
            Box::new(RandomBot::with_seed("b".to_string(), 2)),
        ];
        let config = MatchConfig {
            max_moves: 2,
            ..MatchConfig::default()
        };
        let mut m = Match::new(&Preset::P2Dragonless.ruleset(), bots, config).unwrap();
        assert_eq!(m.play(), MatchResult::Draw { moves: 2 });
    }
}
