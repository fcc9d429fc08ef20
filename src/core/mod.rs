pub mod etl;
pub mod frame;
pub mod ingest;
pub mod pipeline;

pub use crate::domain::model::{Activity, Record, TransformResult};
pub use crate::domain::ports::{ConfigProvider, LoadSummary, Pipeline, Storage};
pub use crate::utils::error::Result;
