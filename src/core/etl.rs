use crate::core::{LoadSummary, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<LoadSummary> {
        tracing::info!("Starting FIT conversion...");
        self.monitor.log_stats("Start");

        // Extract
        let activities = self.pipeline.extract().await?;
        tracing::info!("Extracted {} activity files", activities.len());
        self.monitor.log_stats("Extract");

        // Transform
        let result = self.pipeline.transform(activities).await?;
        tracing::info!(
            "Transformed {} records from {} runs ({} skipped)",
            result.frame.height(),
            result.runs,
            result.skipped.len()
        );
        self.monitor.log_stats("Transform");

        // Load
        let summary = self.pipeline.load(result).await?;
        for path in &summary.outputs {
            tracing::info!("Output saved to: {}", path);
        }
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(summary)
    }
}
