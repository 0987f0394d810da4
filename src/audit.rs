//! Session audit log.
//!
//! Every completed turn appends one row: when it happened, what was asked,
//! and how it was answered. Rows are never mutated or removed, and the log
//! lives only as long as its session unless exported. Export is CSV with a
//! fixed header; [`read_csv`] parses an exported file back into the
//! identical entry sequence so review tooling can rely on round-trips.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;
use uuid::Uuid;

use crate::models::LogEntry;

const CSV_HEADER: [&str; 3] = ["timestamp", "query", "outcome"];

/// Append-only log of completed turns, oldest first.
#[derive(Debug, Default)]
pub struct SessionLog {
    entries: Vec<LogEntry>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed turn. The timestamp is captured here, in UTC
    /// at second precision.
    pub fn append(&mut self, query: &str, outcome: &str) {
        self.entries.push(LogEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            query: query.to_string(),
            outcome: outcome.to_string(),
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the log as CSV, oldest entry first.
    pub fn export_csv(&self, path: &Path) -> Result<()> {
        let mut out = String::from("timestamp,query,outcome\n");
        for entry in &self.entries {
            out.push_str(&format!(
                "{},{},{}\n",
                csv_field(&entry.timestamp),
                csv_field(&entry.query),
                csv_field(&entry.outcome)
            ));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, out).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}

/// Parse an exported audit file back into its entries.
pub fn read_csv(path: &Path) -> Result<Vec<LogEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;

    let mut rows = parse_csv(&content)?.into_iter();
    let header = rows.next().ok_or_else(|| anyhow::anyhow!("audit file is empty"))?;
    if header != CSV_HEADER {
        bail!("unexpected audit header: {:?}", header);
    }

    rows.map(|row| {
        let [timestamp, query, outcome]: [String; 3] = row
            .try_into()
            .map_err(|r: Vec<String>| anyhow::anyhow!("audit row has {} fields, expected 3", r.len()))?;
        Ok(LogEntry {
            timestamp,
            query,
            outcome,
        })
    })
    .collect()
}

/// Quote a field per RFC 4180 when it needs it.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn parse_csv(content: &str) -> Result<Vec<Vec<String>>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' if field.is_empty() => in_quotes = true,
                ',' => row.push(std::mem::take(&mut field)),
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                '\r' => {}
                _ => field.push(c),
            }
        }
    }

    if in_quotes {
        bail!("unterminated quoted field in audit file");
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    Ok(rows)
}

/// Caller-owned per-session state: identity, start time, and the audit
/// log. Passed mutably into each turn; nothing about a session is global.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub log: SessionLog,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            log: SessionLog::new(),
        }
    }

    /// Default audit export filename for this session.
    pub fn default_export_name(&self) -> String {
        format!("session-{}-audit.csv", self.id)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn append_preserves_order_and_timestamps_parse() {
        let mut log = SessionLog::new();
        log.append("first question", "answered (content, 2 sources)");
        log.append("second question", "answered (metadata)");

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].query, "first question");
        assert_eq!(log.entries()[1].query, "second question");
        for entry in log.entries() {
            DateTime::parse_from_rfc3339(&entry.timestamp).unwrap();
        }
    }

    #[test]
    fn csv_roundtrip_preserves_awkward_queries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("audit.csv");

        let mut log = SessionLog::new();
        log.append("plain question", "answered (content, 1 source)");
        log.append("with, a comma", "answered (content, 3 sources)");
        log.append("he said \"stop\"", "answered (metadata)");
        log.append("line one\nline two", "answered (content, 2 sources)");

        log.export_csv(&path).unwrap();
        let restored = read_csv(&path).unwrap();

        assert_eq!(restored, log.entries());
    }

    #[test]
    fn export_starts_with_fixed_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("audit.csv");

        let mut log = SessionLog::new();
        log.append("q", "answered (metadata)");
        log.export_csv(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("timestamp,query,outcome\n"));
    }

    #[test]
    fn quotes_are_doubled_in_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("audit.csv");

        let mut log = SessionLog::new();
        log.append("he said \"stop\"", "answered (metadata)");
        log.export_csv(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"he said \"\"stop\"\"\""));
    }

    #[test]
    fn wrong_header_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("audit.csv");
        std::fs::write(&path, "when,what,how\na,b,c\n").unwrap();

        let err = read_csv(&path).unwrap_err();
        assert!(err.to_string().contains("unexpected audit header"));
    }

    #[test]
    fn export_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("dir").join("audit.csv");

        let mut log = SessionLog::new();
        log.append("q", "answered (metadata)");
        log.export_csv(&path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn sessions_have_distinct_ids() {
        let a = Session::new();
        let b = Session::new();
        assert_ne!(a.id, b.id);
        assert!(a.default_export_name().starts_with("session-"));
        assert!(a.default_export_name().ends_with("-audit.csv"));
    }
}
