use crate::config::toml_config::{
    default_output_formats, CompressionConfig, TomlConfig, DEFAULT_CONCURRENT_FILES,
    DEFAULT_FILE_STEM, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_PATH,
};
use crate::core::ConfigProvider;
use crate::output::OutputFormat;
use crate::utils::error::{LabError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "fit-to-parquet")]
#[command(about = "Batch-convert .fit/.fit.gz to cleaned Parquet/CSV")]
pub struct CliConfig {
    /// Directory holding .fit / .fit.gz files
    #[arg(short, long)]
    pub input: Option<String>,

    /// Directory the outputs are written to
    #[arg(short, long)]
    pub outdir: Option<String>,

    /// TOML config file; flags given on the command line override it
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output formats (parquet, csv, json)
    #[arg(long, value_delimiter = ',')]
    pub formats: Vec<OutputFormat>,

    /// Files decoded in parallel [default: 4]
    #[arg(long)]
    pub concurrent_files: Option<usize>,

    /// Base name of the output files [default: strava_runs]
    #[arg(long)]
    pub file_stem: Option<String>,

    /// Bundle all outputs into this ZIP archive
    #[arg(long)]
    pub zip: Option<String>,

    /// Accept files whose CRC does not match
    #[arg(long)]
    pub no_crc_check: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    /// List the files that would be converted and exit
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines instead of the compact format
    #[arg(long)]
    pub log_json: bool,

    #[arg(skip = default_output_formats())]
    default_formats: Vec<OutputFormat>,
}

impl CliConfig {
    /// Applies the flags given on the command line on top of a file config.
    pub fn apply_to(&self, mut config: TomlConfig) -> TomlConfig {
        if let Some(input) = &self.input {
            config.source.input_dir = input.clone();
        }
        if let Some(outdir) = &self.outdir {
            config.load.output_path = outdir.clone();
        }
        if !self.formats.is_empty() {
            config.load.output_formats = self.formats.clone();
        }
        if let Some(concurrent) = self.concurrent_files {
            config.source.concurrent_files = Some(concurrent);
        }
        if let Some(stem) = &self.file_stem {
            config.load.file_stem = Some(stem.clone());
        }
        if self.no_crc_check {
            config.source.check_crc = Some(false);
        }
        if let Some(zip) = &self.zip {
            config.load.compression = Some(CompressionConfig {
                enabled: true,
                filename: zip.clone(),
            });
        }
        config
    }
}

impl ConfigProvider for CliConfig {
    fn input_dir(&self) -> &str {
        self.input.as_deref().unwrap_or(DEFAULT_INPUT_DIR)
    }

    fn output_path(&self) -> &str {
        self.outdir.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn output_formats(&self) -> &[OutputFormat] {
        if self.formats.is_empty() {
            &self.default_formats
        } else {
            &self.formats
        }
    }

    fn concurrent_files(&self) -> usize {
        self.concurrent_files.unwrap_or(DEFAULT_CONCURRENT_FILES)
    }

    fn file_stem(&self) -> &str {
        self.file_stem.as_deref().unwrap_or(DEFAULT_FILE_STEM)
    }

    fn check_crc(&self) -> bool {
        !self.no_crc_check
    }

    fn zip_bundle(&self) -> Option<&str> {
        self.zip.as_deref()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", self.input_dir())?;
        validation::validate_path("outdir", self.output_path())?;
        validation::validate_positive_number("concurrent_files", self.concurrent_files(), 1)?;
        validation::validate_non_empty_string("file_stem", self.file_stem())?;
        if let Some(zip) = &self.zip {
            if !zip.ends_with(".zip") {
                return Err(LabError::InvalidConfigValueError {
                    field: "zip".to_string(),
                    value: zip.clone(),
                    reason: "Archive name must end in .zip".to_string(),
                });
            }
        }
        Ok(())
    }
}
