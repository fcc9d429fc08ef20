use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A decoded field value, after FIT scale/offset have been applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    /// Multi-value field; invalid elements stay in place as `None`.
    Array(Vec<Option<Value>>),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            // `3.0` rather than `3`, like pandas
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Text(s) => f.write_str(s),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    if let Some(item) = item {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// One row of field data, in field-definition order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub data: Vec<(String, Value)>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// The decoded record messages of one activity file.
#[derive(Debug, Clone)]
pub struct Activity {
    pub source: String,
    pub run_id: String,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub frame: crate::core::frame::Frame,
    pub runs: usize,
    pub skipped: Vec<String>,
}
