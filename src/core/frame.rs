use crate::domain::model::{Record, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Row-major table with a dynamic set of named columns.
///
/// Columns keep the order in which they were first seen; cells missing from
/// a row are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Option<Value>>>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: &[Record]) -> Self {
        let mut frame = Self::new();
        for record in records {
            frame.push_record(record);
        }
        frame
    }

    pub fn push_record(&mut self, record: &Record) {
        for (name, _) in &record.data {
            self.ensure_column(name);
        }
        let mut row = vec![None; self.columns.len()];
        for (name, value) in &record.data {
            if let Some(&i) = self.index.get(name) {
                row[i] = Some(value.clone());
            }
        }
        self.rows.push(row);
    }

    fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.columns.len();
        self.columns.push(name.to_string());
        self.index.insert(name.to_string(), i);
        for row in &mut self.rows {
            row.push(None);
        }
        i
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// True when either axis is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let i = *self.index.get(column)?;
        self.rows.get(row)?.get(i)?.as_ref()
    }

    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = Option<&'a Value>> + 'a> {
        let i = *self.index.get(name)?;
        Some(self.rows.iter().map(move |row| row.get(i).and_then(|c| c.as_ref())))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Option<Value>]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// Fills `target` from `source` cell by cell. No-op when `source` is absent.
    pub fn derive_column<F>(&mut self, target: &str, source: &str, f: F)
    where
        F: Fn(&Value) -> Option<Value>,
    {
        let Some(&src) = self.index.get(source) else {
            return;
        };
        let dst = self.ensure_column(target);
        for row in &mut self.rows {
            row[dst] = row[src].as_ref().and_then(&f);
        }
    }

    pub fn fill_column(&mut self, name: &str, value: Value) {
        let i = self.ensure_column(name);
        for row in &mut self.rows {
            row[i] = Some(value.clone());
        }
    }

    pub fn retain_where_present(&mut self, column: &str) {
        if let Some(&i) = self.index.get(column) {
            self.rows.retain(|row| row[i].is_some());
        }
    }

    /// Stable sort on one column; rows with a missing cell sort last.
    pub fn sort_by_column(&mut self, column: &str) {
        let Some(&i) = self.index.get(column) else {
            return;
        };
        self.rows.sort_by(|a, b| match (&a[i], &b[i]) {
            (Some(x), Some(y)) => compare_values(x, y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    pub fn head(&self, n: usize) -> Frame {
        Frame {
            columns: self.columns.clone(),
            index: self.index.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Stacks frames vertically over the union of their columns.
    pub fn concat(frames: Vec<Frame>) -> Frame {
        let mut out = Frame::new();
        for frame in frames {
            let targets: Vec<usize> = frame
                .columns
                .iter()
                .map(|name| out.ensure_column(name))
                .collect();
            for row in frame.rows {
                let mut new_row = vec![None; out.columns.len()];
                for (cell, &dst) in row.into_iter().zip(&targets) {
                    new_row[dst] = cell;
                }
                out.rows.push(new_row);
            }
        }
        out
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| c.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "NaN".to_string()))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .map(|row| row[i].len())
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let index_width = self.rows.len().saturating_sub(1).to_string().len();
        write!(f, "{:index_width$}", "")?;
        for (name, w) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>w$}", name, w = w)?;
        }
        writeln!(f)?;
        for (n, row) in cells.iter().enumerate() {
            write!(f, "{:<index_width$}", n)?;
            for (cell, w) in row.iter().zip(&widths) {
                write!(f, "  {:>w$}", cell, w = w)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Value)]) -> Record {
        Record {
            data: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_from_records_unions_columns_in_first_seen_order() {
        let frame = Frame::from_records(&[
            record(&[("speed", Value::Float(2.0)), ("distance", Value::Float(5.0))]),
            record(&[("heart_rate", Value::UInt(140)), ("speed", Value::Float(3.0))]),
        ]);

        assert_eq!(frame.columns(), &["speed", "distance", "heart_rate"]);
        assert_eq!(frame.shape(), (2, 3));
        assert!(frame.get(0, "heart_rate").is_none());
        assert_eq!(frame.get(1, "heart_rate"), Some(&Value::UInt(140)));
    }

    #[test]
    fn test_empty_frames() {
        assert!(Frame::new().is_empty());
        let no_columns = Frame::from_records(&[Record::default()]);
        assert_eq!(no_columns.height(), 1);
        assert!(no_columns.is_empty());
    }

    #[test]
    fn test_derive_and_sort() {
        let mut frame = Frame::from_records(&[
            record(&[("t", Value::UInt(3)), ("distance", Value::Float(3000.0))]),
            record(&[("distance", Value::Float(1000.0))]),
            record(&[("t", Value::UInt(1)), ("distance", Value::Float(1000.0))]),
        ]);

        frame.derive_column("distance_km", "distance", |v| v.as_f64().map(|d| Value::Float(d / 1000.0)));
        frame.derive_column("missing_out", "missing_in", |v| Some(v.clone()));
        assert!(!frame.has_column("missing_out"));

        frame.retain_where_present("t");
        frame.sort_by_column("t");

        assert_eq!(frame.height(), 2);
        assert_eq!(frame.get(0, "t"), Some(&Value::UInt(1)));
        assert_eq!(frame.get(1, "distance_km"), Some(&Value::Float(3.0)));
    }

    #[test]
    fn test_concat_aligns_columns() {
        let mut a = Frame::from_records(&[record(&[("speed", Value::Float(1.0))])]);
        a.fill_column("run_id", Value::Text("a".to_string()));
        let mut b = Frame::from_records(&[record(&[("cadence", Value::UInt(80))])]);
        b.fill_column("run_id", Value::Text("b".to_string()));

        let all = Frame::concat(vec![a, b]);
        assert_eq!(all.columns(), &["speed", "run_id", "cadence"]);
        assert_eq!(all.get(1, "run_id"), Some(&Value::Text("b".to_string())));
        assert!(all.get(1, "speed").is_none());
        assert_eq!(all.get(1, "cadence"), Some(&Value::UInt(80)));
    }

    #[test]
    fn test_display_head() {
        let frame = Frame::from_records(&[
            record(&[("speed", Value::Float(2.5))]),
            record(&[("speed", Value::Float(3.0))]),
        ]);
        let text = frame.head(1).to_string();
        assert!(text.contains("speed"));
        assert!(text.contains("2.5"));
        assert!(!text.contains("3\n"));
    }
}
