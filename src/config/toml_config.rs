use crate::core::ingest::CleanOptions;
use crate::core::ConfigProvider;
use crate::llm::LlmConfig;
use crate::output::OutputFormat;
use crate::utils::error::{LabError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub load: LoadConfig,
    pub llm: Option<LlmConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: String,
    pub check_crc: Option<bool>,
    pub concurrent_files: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    pub derived_columns: Option<bool>,
    pub drop_missing_timestamp: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_output_formats")]
    pub output_formats: Vec<OutputFormat>,
    pub file_stem: Option<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

pub const DEFAULT_INPUT_DIR: &str = "data/strava/raw";
pub const DEFAULT_OUTPUT_PATH: &str = "data/strava/processed";
pub const DEFAULT_CONCURRENT_FILES: usize = 4;
pub const DEFAULT_FILE_STEM: &str = "strava_runs";

fn default_input_dir() -> String {
    DEFAULT_INPUT_DIR.to_string()
}

fn default_output_path() -> String {
    DEFAULT_OUTPUT_PATH.to_string()
}

pub fn default_output_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Parquet, OutputFormat::Csv]
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            check_crc: None,
            concurrent_files: None,
        }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            output_formats: default_output_formats(),
            file_stem: None,
            compression: None,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LabError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LabError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OLLAMA_HOST})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LabError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validation::validate_path("source.input_dir", &self.source.input_dir)?;
        validation::validate_path("load.output_path", &self.load.output_path)?;

        if let Some(concurrent) = self.source.concurrent_files {
            validation::validate_positive_number("source.concurrent_files", concurrent, 1)?;
        }

        if self.load.output_formats.is_empty() {
            return Err(LabError::InvalidConfigValueError {
                field: "load.output_formats".to_string(),
                value: "[]".to_string(),
                reason: "At least one output format is required".to_string(),
            });
        }

        if let Some(stem) = &self.load.file_stem {
            validation::validate_non_empty_string("load.file_stem", stem)?;
        }

        if let Some(compression) = &self.load.compression {
            if compression.enabled {
                validation::validate_non_empty_string(
                    "load.compression.filename",
                    &compression.filename,
                )?;
            }
        }

        if let Some(llm) = &self.llm {
            llm.validate()?;
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn llm_config(&self) -> LlmConfig {
        self.llm.clone().unwrap_or_default()
    }
}

impl ConfigProvider for TomlConfig {
    fn input_dir(&self) -> &str {
        &self.source.input_dir
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.load.output_formats
    }

    fn concurrent_files(&self) -> usize {
        self.source
            .concurrent_files
            .unwrap_or(DEFAULT_CONCURRENT_FILES)
    }

    fn file_stem(&self) -> &str {
        self.load.file_stem.as_deref().unwrap_or(DEFAULT_FILE_STEM)
    }

    fn check_crc(&self) -> bool {
        self.source.check_crc.unwrap_or(true)
    }

    fn clean_options(&self) -> CleanOptions {
        let defaults = CleanOptions::default();
        CleanOptions {
            derived_columns: self
                .transform
                .derived_columns
                .unwrap_or(defaults.derived_columns),
            drop_missing_timestamp: self
                .transform
                .drop_missing_timestamp
                .unwrap_or(defaults.drop_missing_timestamp),
        }
    }

    fn zip_bundle(&self) -> Option<&str> {
        self.load
            .compression
            .as_ref()
            .filter(|c| c.enabled)
            .map(|c| c.filename.as_str())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[pipeline]
name = "strava-runs"
description = "Convert Strava exports"
version = "1.0.0"

[source]
input_dir = "exports/raw"
check_crc = false
concurrent_files = 2

[transform]
derived_columns = true
drop_missing_timestamp = false

[load]
output_path = "exports/processed"
output_formats = ["csv", "json"]
file_stem = "runs"

[load.compression]
enabled = true
filename = "runs.zip"

[llm]
host = "http://localhost:11434"
model = "phi3:mini"
timeout_seconds = 30

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.input_dir(), "exports/raw");
        assert!(!config.check_crc());
        assert_eq!(config.concurrent_files(), 2);
        assert_eq!(config.output_formats(), &[OutputFormat::Csv, OutputFormat::Json]);
        assert_eq!(config.file_stem(), "runs");
        assert_eq!(config.zip_bundle(), Some("runs.zip"));
        assert!(!config.clean_options().drop_missing_timestamp);
        assert!(config.monitoring_enabled());
        assert_eq!(config.llm_config().model, "phi3:mini");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("[pipeline]\nname = \"minimal\"\n").unwrap();

        assert_eq!(config.input_dir(), DEFAULT_INPUT_DIR);
        assert_eq!(config.output_path(), DEFAULT_OUTPUT_PATH);
        assert_eq!(config.output_formats(), &[OutputFormat::Parquet, OutputFormat::Csv]);
        assert_eq!(config.file_stem(), "strava_runs");
        assert!(config.check_crc());
        assert_eq!(config.zip_bundle(), None);
        assert!(!config.monitoring_enabled());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LAB_TEST_INPUT_DIR", "/mnt/garmin");

        let toml_content = r#"
[pipeline]
name = "env"

[source]
input_dir = "${LAB_TEST_INPUT_DIR}"

[load]
output_path = "${LAB_TEST_UNSET_VAR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.source.input_dir, "/mnt/garmin");
        assert_eq!(config.load.output_path, "${LAB_TEST_UNSET_VAR}");

        std::env::remove_var("LAB_TEST_INPUT_DIR");
    }

    #[test]
    fn test_unknown_output_format_is_rejected() {
        let toml_content = r#"
[pipeline]
name = "bad"

[load]
output_formats = ["tsv"]
"#;
        assert!(matches!(
            TomlConfig::from_toml_str(toml_content),
            Err(LabError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[pipeline]
name = "test"

[source]
concurrent_files = 0

[llm]
host = "not a url"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[pipeline]\nname = \"file-test\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.pipeline.name, "file-test");
    }
}
