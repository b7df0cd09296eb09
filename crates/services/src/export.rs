//! CSV and JSON renderings of the attempt history.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use quiz_core::model::HistoryEntry;
use quiz_core::time::format_duration_secs;

use crate::error::ExportError;

const CSV_HEADER: [&str; 7] = [
    "date",
    "score",
    "total",
    "correct",
    "wrong",
    "time_spent",
    "topic",
];

/// Placeholder for attempts without a timer.
pub const NO_TIME_SPENT: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// Rendered export ready to hand to a download or file writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub format: ExportFormat,
    pub file_name: String,
    pub contents: String,
}

/// Render `entries` (newest first) in `format`.
///
/// # Errors
///
/// Returns `ExportError` if serialization fails.
pub fn render(
    format: ExportFormat,
    entries: &[HistoryEntry],
    exported_at: DateTime<Utc>,
) -> Result<ExportDocument, ExportError> {
    let contents = match format {
        ExportFormat::Csv => to_csv(entries)?,
        ExportFormat::Json => to_json(entries, exported_at)?,
    };
    Ok(ExportDocument {
        format,
        file_name: format!(
            "quiz-history_{}.{}",
            exported_at.timestamp_millis(),
            format.extension()
        ),
        contents,
    })
}

/// Header row plus one row per entry.
///
/// # Errors
///
/// Returns `ExportError::Csv` on writer failures and
/// `ExportError::Buffer` if the output is not UTF-8.
pub fn to_csv(entries: &[HistoryEntry]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for entry in entries {
        writer.write_record([
            entry
                .timestamp()
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            entry.score().to_string(),
            entry.total_questions().to_string(),
            entry.correct_count().to_string(),
            entry.wrong_count().to_string(),
            entry
                .time_spent_secs()
                .map_or_else(|| NO_TIME_SPENT.to_string(), format_duration_secs),
            entry.topic().to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))
}

#[derive(Serialize)]
struct JsonExport<'a> {
    export_date: String,
    total_sessions: usize,
    sessions: &'a [HistoryEntry],
}

/// Pretty-printed `{export_date, total_sessions, sessions}` object.
///
/// # Errors
///
/// Returns `ExportError::Json` if serialization fails.
pub fn to_json(entries: &[HistoryEntry], exported_at: DateTime<Utc>) -> Result<String, ExportError> {
    let document = JsonExport {
        export_date: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        total_sessions: entries.len(),
        sessions: entries,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Score, TopicFilter};
    use quiz_core::time::fixed_now;

    fn entry(correct: u32, total: u32, time: Option<u32>, topic: TopicFilter) -> HistoryEntry {
        HistoryEntry::from_persisted(
            fixed_now(),
            Score::from_counts(correct as usize, total as usize).unwrap(),
            total,
            correct,
            total - correct,
            time,
            topic,
        )
        .unwrap()
    }

    #[test]
    fn csv_has_header_and_one_row_per_entry() {
        let entries = vec![
            entry(3, 4, Some(75), TopicFilter::from("math")),
            entry(1, 2, None, TopicFilter::All),
        ];
        let csv = to_csv(&entries).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines[0], "date,score,total,correct,wrong,time_spent,topic");
        assert_eq!(lines[1], "2023-11-14T22:13:20Z,7.50,4,3,1,1:15,math");
        assert_eq!(lines[2], "2023-11-14T22:13:20Z,5.00,2,1,1,N/A,all");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn csv_quotes_topics_with_commas() {
        let csv = to_csv(&[entry(1, 1, None, TopicFilter::from("a, b"))]).unwrap();
        assert!(csv.lines().nth(1).unwrap().ends_with("\"a, b\""));
    }

    #[test]
    fn json_wraps_sessions_with_metadata() {
        let entries = vec![entry(2, 2, Some(30), TopicFilter::All)];
        let json = to_json(&entries, fixed_now()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["export_date"], "2023-11-14T22:13:20.000Z");
        assert_eq!(value["total_sessions"], 1);
        assert_eq!(value["sessions"][0]["score"], 10.0);
        assert_eq!(value["sessions"][0]["time_spent_secs"], 30);
        assert_eq!(value["sessions"][0]["topic"], "all");
    }

    #[test]
    fn render_names_the_file_after_the_format() {
        let doc = render(ExportFormat::Json, &[], fixed_now()).unwrap();
        assert_eq!(doc.file_name, "quiz-history_1700000000000.json");
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
