pub mod config;
pub mod core;
pub mod domain;
pub mod fit;
pub mod graph;
pub mod llm;
pub mod output;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use config::{toml_config::TomlConfig, LocalStorage};
pub use core::{etl::EtlEngine, frame::Frame, pipeline::FitPipeline};
pub use fit::{FitError, FitFile};
pub use utils::error::{LabError, Result};
