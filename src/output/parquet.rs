use crate::core::frame::Frame;
use crate::domain::model::Value;
use crate::utils::error::Result;
use arrow_array::{
    ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray, TimestampMicrosecondArray,
};
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Timestamp,
    Int64,
    Float64,
    Utf8,
}

impl ColumnType {
    fn data_type(self) -> DataType {
        match self {
            ColumnType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            ColumnType::Int64 => DataType::Int64,
            ColumnType::Float64 => DataType::Float64,
            ColumnType::Utf8 => DataType::Utf8,
        }
    }
}

/// Picks the narrowest type that holds every non-null cell of a column.
fn infer_type<'a>(cells: impl Iterator<Item = Option<&'a Value>>) -> ColumnType {
    let mut seen: Option<ColumnType> = None;

    for value in cells.flatten() {
        let ty = match value {
            Value::Timestamp(_) => ColumnType::Timestamp,
            Value::Int(_) => ColumnType::Int64,
            Value::UInt(v) if *v <= i64::MAX as u64 => ColumnType::Int64,
            Value::UInt(_) | Value::Float(_) => ColumnType::Float64,
            Value::Text(_) | Value::Array(_) => ColumnType::Utf8,
        };
        seen = Some(match (seen, ty) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(ColumnType::Int64), ColumnType::Float64)
            | (Some(ColumnType::Float64), ColumnType::Int64) => ColumnType::Float64,
            _ => return ColumnType::Utf8,
        });
    }

    seen.unwrap_or(ColumnType::Utf8)
}

fn build_array<'a>(ty: ColumnType, cells: impl Iterator<Item = Option<&'a Value>>) -> ArrayRef {
    match ty {
        ColumnType::Timestamp => {
            let values: Vec<Option<i64>> = cells
                .map(|c| c.and_then(Value::as_timestamp).map(|ts| ts.timestamp_micros()))
                .collect();
            Arc::new(TimestampMicrosecondArray::from(values).with_timezone("UTC"))
        }
        ColumnType::Int64 => {
            let values: Vec<Option<i64>> = cells
                .map(|c| match c {
                    Some(Value::Int(v)) => Some(*v),
                    Some(Value::UInt(v)) => i64::try_from(*v).ok(),
                    _ => None,
                })
                .collect();
            Arc::new(Int64Array::from(values))
        }
        ColumnType::Float64 => {
            let values: Vec<Option<f64>> = cells.map(|c| c.and_then(Value::as_f64)).collect();
            Arc::new(Float64Array::from(values))
        }
        ColumnType::Utf8 => {
            let values: Vec<Option<String>> = cells.map(|c| c.map(|v| v.to_string())).collect();
            Arc::new(StringArray::from(values))
        }
    }
}

pub fn to_record_batch(frame: &Frame) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(frame.width());
    let mut arrays = Vec::with_capacity(frame.width());

    for name in frame.columns() {
        let ty = frame.column(name).map(infer_type).unwrap_or(ColumnType::Utf8);
        let array = match frame.column(name) {
            Some(cells) => build_array(ty, cells),
            None => build_array(ty, std::iter::repeat(None).take(frame.height())),
        };
        fields.push(Field::new(name.as_str(), ty.data_type(), true));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    Ok(RecordBatch::try_new(schema, arrays)?)
}

pub fn to_parquet(frame: &Frame) -> Result<Vec<u8>> {
    let batch = to_record_batch(frame)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(buffer)
}
