use crate::core::frame::Frame;
use crate::utils::error::{LabError, Result};

pub fn to_csv(frame: &Frame) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(frame.columns())?;

    for row in frame.rows() {
        writer.write_record(
            row.iter()
                .map(|cell| cell.as_ref().map(|v| v.to_string()).unwrap_or_default()),
        )?;
    }

    writer
        .into_inner()
        .map_err(|e| LabError::IoError(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Record, Value};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_to_csv() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 2, 7, 0, 5).unwrap();
        let frame = Frame::from_records(&[
            Record {
                data: vec![
                    ("timestamp".to_string(), Value::Timestamp(ts)),
                    ("speed".to_string(), Value::Float(3.2)),
                ],
            },
            Record {
                data: vec![
                    ("timestamp".to_string(), Value::Timestamp(ts)),
                    ("run_id".to_string(), Value::Text("morning, easy".to_string())),
                ],
            },
        ]);

        let text = String::from_utf8(to_csv(&frame).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "timestamp,speed,run_id");
        assert_eq!(lines[1], "2024-03-02 07:00:05,3.2,");
        assert_eq!(lines[2], "2024-03-02 07:00:05,,\"morning, easy\"");
    }
}
