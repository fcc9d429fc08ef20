use clap::Parser;
use notebook_llm_lab::llm::{LlmConfig, OllamaClient};
use notebook_llm_lab::utils::{logger, validation::Validate};

const DEFAULT_PROMPT: &str = "Summarize the history of Linux in one paragraph.";

#[derive(Parser)]
#[command(name = "ask-llm")]
#[command(about = "Send a prompt to a local Ollama model")]
struct Args {
    /// Prompt text
    prompt: Option<String>,

    /// Model name (defaults to OLLAMA_DEFAULT_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama server (defaults to OLLAMA_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Do not print the reply
    #[arg(short, long)]
    quiet: bool,

    /// List installed models and exit
    #[arg(long)]
    list: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let mut config = LlmConfig::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(model) = args.model {
        config.model = model;
    }

    let client = match config.validate().and_then(|_| OllamaClient::new(&config)) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if args.list {
        match client.list_models().await {
            Ok(models) => {
                for model in models {
                    println!("{}", model.name);
                }
            }
            Err(e) => {
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 建議: {}", e.recovery_suggestion());
                std::process::exit(e.severity().exit_code());
            }
        }
        return;
    }

    let prompt = args.prompt.as_deref().unwrap_or(DEFAULT_PROMPT);
    tracing::info!("Asking {} at {}", client.model(), client.base_url());

    let reply = client.ask(prompt).await;
    if !args.quiet {
        println!("{}", reply);
    }
}
