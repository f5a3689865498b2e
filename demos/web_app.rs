use boost_arena::engine::SearchConfig;
use boost_arena::web::run_server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("Boost Arena - Web Edition");
    println!("=========================");
    println!();

    run_server("127.0.0.1:3000", &SearchConfig::default()).await?;

    Ok(())
}
