use clap::Parser;
use notebook_llm_lab::config::toml_config::DEFAULT_INPUT_DIR;
use notebook_llm_lab::core::ingest;
use notebook_llm_lab::utils::logger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fit-inspect")]
#[command(about = "Load a directory of FIT files and preview the cleaned table")]
struct Args {
    /// Directory holding .fit / .fit.gz files
    #[arg(default_value = DEFAULT_INPUT_DIR)]
    dir: PathBuf,

    /// Rows to preview
    #[arg(short = 'n', long, default_value_t = 5)]
    rows: usize,

    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let frame = ingest::load_fit_dir(&args.dir);
    let (rows, cols) = frame.shape();
    println!("({}, {})", rows, cols);

    if !frame.is_empty() {
        println!("{}", frame.head(args.rows));
    }
}
