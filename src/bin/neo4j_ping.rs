use clap::Parser;
use notebook_llm_lab::graph::{Neo4jClient, Neo4jConfig};
use notebook_llm_lab::utils::logger;
use notebook_llm_lab::LabError;

#[derive(Parser)]
#[command(name = "neo4j-ping")]
#[command(about = "Check the Neo4j connection configured in .env")]
struct Args {
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    match ping().await {
        Ok(ok) => println!("<Record ok={}>", ok),
        Err(e) => {
            tracing::error!("❌ Neo4j check failed: {} (Category: {:?})", e, e.category());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(e.severity().exit_code().max(1));
        }
    }
}

async fn ping() -> Result<i64, LabError> {
    let config = Neo4jConfig::from_env()?;
    tracing::info!("Connecting to {} (database {})", config.uri, config.database);
    let client = Neo4jClient::connect(config).await?;
    client.ping().await
}
