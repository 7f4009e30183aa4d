//! Data sources for the mosaic.
//!
//! - `synthetic`: style-biased random students
//! - `rows`: attendance rows (CSV text or JSON records) grouped per student
//!
//! Both produce plain [`Entity`] lists; layout does not care which one ran.

pub mod rows;
pub mod synthetic;

pub use rows::{
    AttendanceRow, IngestReport, categorize, infer_style, ingest_numbered, ingest_rows, parse_csv,
    parse_date,
};

use serde::Deserialize;

use crate::error::{MosaicError, Result};
use crate::model::Entity;

/// Configuration for data acquisition.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Synthetic students to generate (default: 400).
    pub entity_count: usize,
    /// Months covered by the timeline (default: 8).
    pub months: u8,
    /// Calendar year of month 1 (default: 2025).
    pub start_year: i32,
    /// Calendar month of month 1, 1-12 (default: 1).
    pub start_month: u32,
    /// Class year used in generated ids (default: 2025).
    pub class_year: u32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            entity_count: 400,
            months: 8,
            start_year: 2025,
            start_month: 1,
            class_year: 2025,
        }
    }
}

/// Where the host's data came from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// CSV text with a header row.
    Csv(String),
    /// Already-parsed attendance records.
    Rows(Vec<AttendanceRow>),
}

/// Load entities from a source.
///
/// Malformed rows are skipped; a source that yields no entity at all is an
/// error so the caller can fall back to synthetic data.
pub fn load(source: &DataSource, config: &DataConfig) -> Result<Vec<Entity>> {
    let report = match source {
        DataSource::Csv(text) => {
            let rows = parse_csv(text)?;
            ingest_numbered(rows.iter().map(|(line, row)| (*line, row)), config)
        }
        DataSource::Rows(rows) => ingest_rows(rows, 1, config),
    };

    if !report.skipped.is_empty() {
        log::warn!("Skipped {} malformed rows", report.skipped.len());
    }
    if report.entities.is_empty() {
        return Err(MosaicError::Load("no usable attendance rows".into()));
    }

    log::info!("Loaded {} students from attendance rows", report.entities.len());
    Ok(report.entities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_csv() {
        let csv = "student_id,event_name,event_type,event_tags,event_date\n\
                   S1,Career Fair,career,,2025-02-01\n\
                   S2,Study Group,academic,,2025-03-01\n";
        let entities = load(&DataSource::Csv(csv.into()), &DataConfig::default()).unwrap();
        assert_eq!(entities.len(), 2);
    }

    #[test]
    fn test_load_all_malformed_is_error() {
        let rows = vec![AttendanceRow::default(), AttendanceRow::default()];
        let err = load(&DataSource::Rows(rows), &DataConfig::default()).unwrap_err();
        assert!(matches!(err, MosaicError::Load(_)));
    }

    #[test]
    fn test_config_partial_json() {
        let config: DataConfig = serde_json::from_str(r#"{"entity_count": 12}"#).unwrap();
        assert_eq!(config.entity_count, 12);
        assert_eq!(config.months, 8);
    }
}
