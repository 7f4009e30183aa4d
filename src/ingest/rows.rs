//! Attendance-row ingestion.
//!
//! One row per (student, event). Rows missing the student id, event name or
//! a parseable date are skipped individually and reported; they never abort
//! the batch. Event categories come from a keyword lookup over the event type
//! and then its tags, with `Other` as the fallback bucket. Engagement style is
//! inferred from the resulting distribution.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use super::DataConfig;
use crate::error::{MosaicError, Result};
use crate::model::{Category, EngagementStyle, Entity, Event};

/// Keyword table for event types and tags.
const CATEGORY_KEYWORDS: [(Category, &[&str]); 5] = [
    (
        Category::Academic,
        &[
            "academic", "lecture", "seminar", "study", "research", "library", "tutoring",
            "symposium", "honors",
        ],
    ),
    (
        Category::Social,
        &[
            "social", "club", "mixer", "party", "festival", "community", "service", "residence",
            "government",
        ],
    ),
    (
        Category::Professional,
        &[
            "professional", "career", "networking", "internship", "leadership", "alumni",
            "interview", "industry",
        ],
    ),
    (
        Category::Cultural,
        &[
            "cultural", "culture", "arts", "art", "music", "theater", "theatre", "film", "museum",
            "diversity", "concert",
        ],
    ),
    (
        Category::Athletic,
        &[
            "athletic", "athletics", "sports", "sport", "game", "fitness", "intramural", "varsity",
            "rally", "spirit",
        ],
    ),
];

/// One attendance record as delivered by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AttendanceRow {
    #[serde(alias = "studentId")]
    pub student_id: Option<String>,
    #[serde(alias = "eventName")]
    pub event_name: Option<String>,
    #[serde(alias = "eventType")]
    pub event_type: Option<String>,
    #[serde(alias = "eventTags")]
    pub event_tags: Option<String>,
    #[serde(alias = "eventDate")]
    pub event_date: Option<String>,
}

/// Result of an ingestion pass.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Entities in first-seen order.
    pub entities: Vec<Entity>,
    /// One error per skipped row.
    pub skipped: Vec<MosaicError>,
}

/// Category for an event type and tag list.
pub fn categorize(event_type: &str, tags: &str) -> Category {
    lookup(event_type)
        .or_else(|| tags.split([',', ';', '|']).find_map(lookup))
        .unwrap_or(Category::Other)
}

fn lookup(term: &str) -> Option<Category> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return None;
    }
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, words)| {
            term.split(|c: char| !c.is_alphanumeric())
                .any(|word| words.contains(&word))
        })
        .map(|(category, _)| *category)
}

/// Parse `YYYY-MM-DD` or `MM/DD/YYYY` (an ISO timestamp suffix is ignored).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%m/%d/%Y"))
        .ok()
}

/// Month index of `date` within the configured window, clamped to `1..=months`.
pub fn month_index(date: NaiveDate, config: &DataConfig) -> u8 {
    let years = i64::from(date.year()) - i64::from(config.start_year);
    let offset = years * 12 + i64::from(date.month()) - i64::from(config.start_month);
    (offset + 1).clamp(1, i64::from(config.months.max(1))) as u8
}

/// Infer an engagement style from an event history.
pub fn infer_style(entity: &Entity) -> EngagementStyle {
    let distribution = entity.distribution();
    let total = distribution.total();
    let distinct = distribution.distinct();
    let top = distribution.iter().map(|(_, n)| n).max().unwrap_or(0);

    if distinct >= 4 && total >= 7 {
        EngagementStyle::SuperConnector
    } else if total > 0 && f64::from(top) / f64::from(total) >= 0.7 && total >= 3 {
        EngagementStyle::Specialist
    } else if distinct <= 2 {
        EngagementStyle::Selective
    } else {
        EngagementStyle::Sampler
    }
}

fn required<'a>(value: &'a Option<String>, line: usize, field: &'static str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(MosaicError::MalformedRecord { line, field })
}

/// Turn one row into `(student id, event)`.
fn row_event(row: &AttendanceRow, line: usize, config: &DataConfig) -> Result<(String, Event)> {
    let id = required(&row.student_id, line, "student_id")?;
    let name = required(&row.event_name, line, "event_name")?;
    let raw_date = required(&row.event_date, line, "event_date")?;
    let date = parse_date(raw_date).ok_or(MosaicError::MalformedRecord {
        line,
        field: "event_date",
    })?;

    let category = categorize(
        row.event_type.as_deref().unwrap_or(""),
        row.event_tags.as_deref().unwrap_or(""),
    );
    Ok((id.to_string(), Event::new(month_index(date, config), category, name)))
}

/// Group rows into entities. Malformed rows are skipped and reported.
///
/// `first_line` is the line number of `rows[0]` for error messages.
pub fn ingest_rows(rows: &[AttendanceRow], first_line: usize, config: &DataConfig) -> IngestReport {
    ingest_numbered(rows.iter().enumerate().map(|(i, row)| (first_line + i, row)), config)
}

/// Group `(line, row)` pairs into entities, reporting errors at each row's
/// own line.
pub fn ingest_numbered<'a>(
    rows: impl IntoIterator<Item = (usize, &'a AttendanceRow)>,
    config: &DataConfig,
) -> IngestReport {
    let mut order: Vec<String> = Vec::new();
    let mut events: HashMap<String, Vec<Event>> = HashMap::new();
    let mut skipped = Vec::new();

    for (line, row) in rows {
        match row_event(row, line, config) {
            Ok((id, event)) => {
                let list = events.entry(id.clone()).or_insert_with(|| {
                    order.push(id);
                    Vec::new()
                });
                list.push(event);
            }
            Err(err) => {
                log::warn!("Skipping row: {err}");
                skipped.push(err);
            }
        }
    }

    let entities = order
        .into_iter()
        .map(|id| {
            let list = events.remove(&id).unwrap_or_default();
            let draft = Entity::with_events(id.clone(), EngagementStyle::Sampler, list);
            let style = infer_style(&draft);
            Entity::with_events(id, style, draft.events().to_vec())
        })
        .collect();

    IngestReport { entities, skipped }
}

/// Split CSV text into records tagged with the line each starts on.
///
/// A record stays open while it has an odd number of quotes, so a quoted
/// field may span lines. Blank lines between records are skipped.
fn csv_records(text: &str) -> Vec<(usize, String)> {
    let mut records = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (i, line) in text.lines().enumerate() {
        match pending.as_mut() {
            Some((_, record)) => {
                record.push('\n');
                record.push_str(line);
            }
            None if line.trim().is_empty() => continue,
            None => pending = Some((i + 1, line.to_string())),
        }
        if pending.as_ref().is_some_and(|(_, r)| r.matches('"').count() % 2 == 0) {
            records.extend(pending.take());
        }
    }
    // An unterminated quote runs to the end of the text
    records.extend(pending);
    records
}

/// Split one CSV record, honoring double quotes and `""` escapes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            ('"', _) => quoted = !quoted,
            (',', false) => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Parse CSV text with a header row into attendance rows, each paired with
/// the source line it starts on.
///
/// Header names are matched case-insensitively, ignoring spaces and
/// underscores. A missing required column is a load error.
pub fn parse_csv(text: &str) -> Result<Vec<(usize, AttendanceRow)>> {
    let mut records = csv_records(text).into_iter();
    let (_, header) = records
        .next()
        .ok_or_else(|| MosaicError::Load("empty CSV".into()))?;

    let normalize = |h: &str| h.trim().to_lowercase().replace([' ', '_'], "");
    let columns: Vec<String> = split_csv_line(&header).iter().map(|h| normalize(h)).collect();
    let column = |name: &str, label: &str| {
        columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| MosaicError::Load(format!("missing {label} column")))
    };

    let id_col = column("studentid", "student_id")?;
    let name_col = column("eventname", "event_name")?;
    let date_col = column("eventdate", "event_date")?;
    let type_col = column("eventtype", "event_type").ok();
    let tags_col = column("eventtags", "event_tags").ok();

    let rows = records
        .map(|(line, record)| {
            let fields = split_csv_line(&record);
            let get = |col: Option<usize>| {
                col.and_then(|c| fields.get(c))
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            };
            let row = AttendanceRow {
                student_id: get(Some(id_col)),
                event_name: get(Some(name_col)),
                event_type: get(type_col),
                event_tags: get(tags_col),
                event_date: get(Some(date_col)),
            };
            (line, row)
        })
        .collect();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, name: &str, kind: &str, tags: &str, date: &str) -> AttendanceRow {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        AttendanceRow {
            student_id: opt(id),
            event_name: opt(name),
            event_type: opt(kind),
            event_tags: opt(tags),
            event_date: opt(date),
        }
    }

    #[test]
    fn test_categorize() {
        assert_eq!(categorize("Career Fair", ""), Category::Professional);
        assert_eq!(categorize("", "outdoor; Intramural"), Category::Athletic);
        assert_eq!(categorize("Mystery", "misc"), Category::Other);
        assert_eq!(categorize("Film-Screening", ""), Category::Cultural);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14);
        assert_eq!(parse_date("2025-03-14"), expected);
        assert_eq!(parse_date("03/14/2025"), expected);
        assert_eq!(parse_date("2025-03-14T18:30:00Z"), expected);
        assert_eq!(parse_date("last tuesday"), None);
    }

    #[test]
    fn test_month_index_clamps() {
        let config = DataConfig::default();
        let date = |y, m| NaiveDate::from_ymd_opt(y, m, 1).unwrap();
        assert_eq!(month_index(date(2025, 1), &config), 1);
        assert_eq!(month_index(date(2025, 8), &config), 8);
        assert_eq!(month_index(date(2025, 11), &config), 8);
        assert_eq!(month_index(date(2024, 12), &config), 1);
    }

    #[test]
    fn test_row_missing_date_is_dropped() {
        let rows = vec![
            row("A1", "Career Fair", "career", "", "2025-02-10"),
            row("A1", "Varsity Game", "sports", "", ""),
            row("B2", "Study Group", "academic", "", "2025-03-01"),
        ];
        let report = ingest_rows(&rows, 2, &DataConfig::default());

        assert_eq!(report.entities.len(), 2);
        assert_eq!(report.entities[0].event_count(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(
            report.skipped[0],
            MosaicError::MalformedRecord { line: 3, field: "event_date" }
        ));
    }

    #[test]
    fn test_all_rows_malformed() {
        let rows = vec![
            row("", "Career Fair", "", "", "2025-01-01"),
            row("A1", "", "", "", "2025-01-01"),
        ];
        let report = ingest_rows(&rows, 1, &DataConfig::default());
        assert!(report.entities.is_empty());
        assert_eq!(report.skipped.len(), 2);
    }

    #[test]
    fn test_entities_keep_first_seen_order() {
        let rows = vec![
            row("Z9", "Film Screening", "film", "", "2025-04-01"),
            row("A1", "Study Group", "academic", "", "2025-01-01"),
            row("Z9", "Museum Visit", "museum", "", "2025-02-01"),
        ];
        let report = ingest_rows(&rows, 1, &DataConfig::default());
        let ids: Vec<&str> = report.entities.iter().map(Entity::id).collect();
        assert_eq!(ids, vec!["Z9", "A1"]);
        let months: Vec<u8> = report.entities[0].events().iter().map(|e| e.month).collect();
        assert_eq!(months, vec![2, 4]);
    }

    #[test]
    fn test_infer_style() {
        let make = |cats: &[Category]| {
            let events = cats.iter().map(|&c| Event::new(1, c, "E")).collect();
            Entity::with_events("X", EngagementStyle::Sampler, events)
        };
        use Category::*;
        let broad = make(&[Academic, Social, Professional, Cultural, Athletic, Social, Social]);
        assert_eq!(infer_style(&broad), EngagementStyle::SuperConnector);
        let focused = make(&[Academic, Academic, Academic, Social]);
        assert_eq!(infer_style(&focused), EngagementStyle::Specialist);
        assert_eq!(infer_style(&make(&[Academic, Social])), EngagementStyle::Selective);
        assert_eq!(infer_style(&make(&[Academic, Social, Cultural])), EngagementStyle::Sampler);
    }

    #[test]
    fn test_parse_csv() {
        let text = "Student ID,Event Name,Event Type,Event Tags,Event Date\n\
                    S1,\"Concert, Spring\",music,\"arts;evening\",2025-04-02\n\
                    \n\
                    S2,Rally,,spirit,\n";
        let rows = parse_csv(text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1.event_name.as_deref(), Some("Concert, Spring"));
        assert_eq!(rows[0].1.event_tags.as_deref(), Some("arts;evening"));
        assert_eq!(rows[1].1.event_type, None);
        assert_eq!(rows[1].1.event_date, None);
        let lines: Vec<usize> = rows.iter().map(|(line, _)| *line).collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn test_csv_errors_report_source_line() {
        let text = "student_id,event_name,event_type,event_tags,event_date\n\
                    S1,Career Fair,career,,2025-02-01\n\
                    \n\
                    \n\
                    S2,Rally,sports,,\n";
        let rows = parse_csv(text).unwrap();
        let numbered = rows.iter().map(|(line, row)| (*line, row));
        let report = ingest_numbered(numbered, &DataConfig::default());

        assert_eq!(report.entities.len(), 1);
        assert!(matches!(
            report.skipped[..],
            [MosaicError::MalformedRecord { line: 5, field: "event_date" }]
        ));
    }

    #[test]
    fn test_csv_quoted_field_spans_lines() {
        let text = "student_id,event_name,event_date\n\
                    S1,\"Spring\nConcert\",2025-04-02\n\
                    S2,\"Rally \"\"Go\"\"\",\n";
        let rows = parse_csv(text).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1.event_name.as_deref(), Some("Spring\nConcert"));
        assert_eq!(rows[0].1.event_date.as_deref(), Some("2025-04-02"));
        assert_eq!(rows[1].0, 4);
        assert_eq!(rows[1].1.event_name.as_deref(), Some("Rally \"Go\""));
    }

    #[test]
    fn test_parse_csv_requires_columns() {
        assert!(parse_csv("").is_err());
        assert!(parse_csv("name,date\nx,2025-01-01").is_err());
    }

    #[test]
    fn test_rows_from_json() {
        let json = r#"[{"studentId":"S1","eventName":"Career Fair","eventDate":"2025-05-05"}]"#;
        let rows: Vec<AttendanceRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[0].student_id.as_deref(), Some("S1"));
        assert_eq!(rows[0].event_tags, None);
    }
}
