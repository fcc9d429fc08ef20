use crate::core::frame::Frame;
use crate::core::ingest::{self, records_from_bytes};
use crate::core::{ConfigProvider, LoadSummary, Pipeline, Storage};
use crate::domain::model::{Activity, Record, TransformResult, Value};
use crate::fit::{self, DecodeOptions};
use crate::output;
use crate::utils::error::{LabError, Result};
use std::path::Path;
use tokio::task::JoinHandle;

/// Batch conversion of a directory of FIT activities into tabular outputs.
pub struct FitPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> FitPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn output_file(&self, name: &str) -> String {
        Path::new(self.config.output_path())
            .join(name)
            .to_string_lossy()
            .into_owned()
    }
}

type DecodeTask = Option<JoinHandle<Result<Vec<Record>>>>;

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for FitPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Activity>> {
        let input_dir = self.config.input_dir();
        tracing::debug!("Scanning {} for FIT files", input_dir);

        let listed = match self.storage.list_files(input_dir).await {
            Ok(listed) => listed,
            Err(LabError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Input directory {} does not exist", input_dir);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let files: Vec<String> = listed
            .into_iter()
            .filter(|p| fit::is_fit_file(p))
            .collect();
        tracing::debug!("Found {} FIT files", files.len());

        let options = DecodeOptions {
            check_crc: self.config.check_crc(),
        };
        let mut activities = Vec::with_capacity(files.len());

        // 每批最多 concurrent_files 個檔案同時解碼，輸出維持輸入順序
        for chunk in files.chunks(self.config.concurrent_files().max(1)) {
            let mut tasks: Vec<(String, DecodeTask)> = Vec::with_capacity(chunk.len());

            for path in chunk {
                match self.storage.read_file(path).await {
                    Ok(bytes) => {
                        let name = path.clone();
                        let handle = tokio::task::spawn_blocking(move || {
                            records_from_bytes(&name, &bytes, options)
                        });
                        tasks.push((path.clone(), Some(handle)));
                    }
                    Err(e) => {
                        tracing::error!("Failed to read {}: {}", path, e);
                        tasks.push((path.clone(), None));
                    }
                }
            }

            for (path, task) in tasks {
                let records = match task {
                    Some(handle) => match handle.await {
                        Ok(Ok(records)) => {
                            if records.is_empty() {
                                tracing::warn!("No record data in {}", path);
                            }
                            records
                        }
                        Ok(Err(e)) => {
                            tracing::error!("Failed to read {}: {}", path, e);
                            Vec::new()
                        }
                        Err(e) => {
                            return Err(LabError::processing(format!(
                                "decoder task for {} failed: {}",
                                path, e
                            )))
                        }
                    },
                    None => Vec::new(),
                };

                activities.push(Activity {
                    run_id: ingest::run_id(Path::new(&path)),
                    source: path,
                    records,
                });
            }
        }

        Ok(activities)
    }

    async fn transform(&self, data: Vec<Activity>) -> Result<TransformResult> {
        let options = self.config.clean_options();
        let mut frames = Vec::with_capacity(data.len());
        let mut skipped = Vec::new();

        for activity in data {
            let mut frame = ingest::clean(Frame::from_records(&activity.records), &options);
            if frame.is_empty() {
                tracing::warn!("Skipping empty or unreadable file: {}", activity.source);
                skipped.push(activity.source);
                continue;
            }
            frame.fill_column("run_id", Value::Text(activity.run_id));
            frames.push(frame);
        }

        let runs = frames.len();
        if runs == 0 {
            tracing::warn!("No valid FIT files found in {}", self.config.input_dir());
        }

        Ok(TransformResult {
            frame: Frame::concat(frames),
            runs,
            skipped,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<LoadSummary> {
        let frame = &result.frame;
        if frame.is_empty() {
            tracing::warn!(
                "No .fit/.fit.gz files found in {}; nothing written",
                self.config.input_dir()
            );
            return Ok(LoadSummary::default());
        }

        let stem = self.config.file_stem();
        let mut encoded = Vec::new();
        for format in self.config.output_formats() {
            let name = format!("{}.{}", stem, format.extension());
            tracing::debug!("Encoding {} ({} rows)", name, frame.height());
            encoded.push((name, format.encode(frame)?));
        }

        let mut outputs = Vec::new();
        if let Some(archive) = self.config.zip_bundle() {
            let data = output::bundle_zip(&encoded)?;
            let path = self.output_file(archive);
            tracing::debug!("Writing ZIP file ({} bytes) to {}", data.len(), path);
            self.storage.write_file(&path, &data).await?;
            outputs.push(path);
        } else {
            for (name, data) in encoded {
                let path = self.output_file(&name);
                tracing::debug!("Writing {} bytes to {}", data.len(), path);
                self.storage.write_file(&path, &data).await?;
                outputs.push(path);
            }
        }

        Ok(LoadSummary {
            records: frame.height(),
            outputs,
        })
    }
}
