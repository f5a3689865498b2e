use boost_arena::*;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt::init();

    println!("Simple Boost Match Demo\n");

    let bots: Vec<Box<dyn Bot>> = vec![
        Box::new(RandomBot::new("Random Alice".to_string())),
        Box::new(GreedyBot::new("Greedy Bob".to_string())),
    ];

    let config = MatchConfig {
        time_per_move: Duration::from_millis(500),
        max_moves: 40,
    };

    let mut match_game = match Match::new(&Preset::P2Mini.ruleset(), bots, config) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };
    let result = match_game.play();

    println!("{}", match_game.game().board().pretty());
    println!("\n{}", "=".repeat(60));
    match &result {
        MatchResult::Win { winner_name, moves, .. } => {
            println!("{} won in {} moves!", winner_name, moves);
        }
        MatchResult::Draw { moves } => {
            println!("Draw after {} moves", moves);
        }
        MatchResult::Abandoned { moves } => {
            println!("Everyone dropped out after {} moves", moves);
        }
    }
    println!("{}", "=".repeat(60));
}
