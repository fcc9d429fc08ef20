use crate::core::ingest::CleanOptions;
use crate::domain::model::{Activity, TransformResult};
use crate::output::OutputFormat;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Paths of the regular files directly inside `dir`, sorted.
    fn list_files(&self, dir: &str)
        -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_dir(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[OutputFormat];
    fn concurrent_files(&self) -> usize;

    fn file_stem(&self) -> &str {
        "strava_runs"
    }

    fn check_crc(&self) -> bool {
        true
    }

    fn clean_options(&self) -> CleanOptions {
        CleanOptions::default()
    }

    /// Archive name when outputs should be bundled into one ZIP.
    fn zip_bundle(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub records: usize,
    pub outputs: Vec<String>,
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Activity>>;
    async fn transform(&self, data: Vec<Activity>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<LoadSummary>;
}
