use boost_arena::engine::SearchConfig;
use boost_arena::*;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Boost Arena - Bot Match");
    println!("=======================\n");

    // Optional first argument picks a preset, e.g. `p2-mini` or `p3`.
    let preset_name = std::env::args().nth(1).unwrap_or_else(|| Preset::P2.name().to_string());
    let Some(preset) = Preset::from_name(&preset_name) else {
        eprintln!("Unknown preset `{preset_name}`. Available presets:");
        for preset in Preset::ALL {
            eprintln!("  {preset}");
        }
        std::process::exit(2);
    };
    let ruleset = preset.ruleset();

    let search = SearchConfig {
        depth: 2,
        ..SearchConfig::default()
    };
    let mut bots: Vec<Box<dyn Bot>> = Vec::new();
    for owner in 1..=ruleset.players {
        if owner == 1 {
            bots.push(Box::new(SearchBot::new("SearchBot".to_string(), &search)));
        } else {
            bots.push(Box::new(GreedyBot::new(format!("GreedyBot{owner}"))));
        }
    }

    let config = MatchConfig {
        time_per_move: Duration::from_secs(10),
        max_moves: 300,
    };

    let mut match_game = match Match::new(&ruleset, bots, config) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Could not set up the match: {e}");
            std::process::exit(1);
        }
    };
    let result = match_game.play();

    println!("{}", match_game.game().board().pretty());
    println!("\n=======================");
    println!("Match Result:");
    match result {
        MatchResult::Win {
            owner,
            winner_name,
            moves,
        } => {
            println!("  {} wins as player {} in {} moves!", winner_name, owner, moves);
        }
        MatchResult::Draw { moves } => {
            println!("  Draw after {} moves", moves);
        }
        MatchResult::Abandoned { moves } => {
            println!("  Abandoned after {} moves", moves);
        }
    }
    for forfeit in match_game.forfeits() {
        println!("  {} forfeited ({:?})", forfeit.bot_name, forfeit.violation);
    }
    println!("=======================");
}
