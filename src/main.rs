use clap::Parser;
use notebook_llm_lab::core::ConfigProvider;
use notebook_llm_lab::utils::{logger, validation::Validate};
use notebook_llm_lab::{CliConfig, EtlEngine, FitPipeline, LabError, LocalStorage, TomlConfig};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting fit-to-parquet");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    match cli.config.clone() {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let config = match TomlConfig::from_file(&path) {
                Ok(config) => cli.apply_to(config),
                Err(e) => {
                    eprintln!("❌ Failed to load config file '{}': {}", path, e);
                    eprintln!("💡 Make sure the file exists and is valid TOML format");
                    std::process::exit(1);
                }
            };
            let monitor = cli.monitor || config.monitoring_enabled();
            run(config, monitor, cli.dry_run).await
        }
        None => run(cli.clone(), cli.monitor, cli.dry_run).await,
    }
}

async fn run<C>(config: C, monitor: bool, dry_run: bool) -> Result<(), Box<dyn std::error::Error>>
where
    C: ConfigProvider + Validate + 'static,
{
    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let input_dir = config.input_dir().to_string();

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config)?;
        return Ok(());
    }

    if monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 創建存儲和管道
    let storage = LocalStorage::current_dir();
    let pipeline = FitPipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor);

    match engine.run().await {
        Ok(summary) if summary.outputs.is_empty() => {
            println!("No .fit/.fit.gz files found in {}", input_dir);
        }
        Ok(summary) => {
            tracing::info!("✅ Conversion completed successfully!");
            println!("✅ Saved {} records to:", with_thousands(summary.records));
            for path in &summary.outputs {
                println!("- {}", path);
            }
        }
        Err(e) => report_failure(&e),
    }

    Ok(())
}

fn perform_dry_run<C: ConfigProvider>(config: &C) -> Result<(), Box<dyn std::error::Error>> {
    let input = Path::new(config.input_dir());
    let files = if input.is_dir() {
        notebook_llm_lab::core::ingest::list_fit_files(input)?
    } else {
        Vec::new()
    };

    println!("🔍 Dry run - would convert {} file(s) from {}", files.len(), input.display());
    for file in &files {
        println!("  {}", file.display());
    }

    let formats: Vec<String> = config.output_formats().iter().map(|f| f.to_string()).collect();
    println!(
        "📁 Outputs: {}/{}.{{{}}}",
        config.output_path(),
        config.file_stem(),
        formats.join(",")
    );
    if let Some(zip) = config.zip_bundle() {
        println!("📦 Bundled into: {}", zip);
    }
    Ok(())
}

/// `12345` -> `12,345`
fn with_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn report_failure(e: &LabError) {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Conversion failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = e.severity().exit_code();
    if exit_code > 0 {
        std::process::exit(exit_code);
    }
}
