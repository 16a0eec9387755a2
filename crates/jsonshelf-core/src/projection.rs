//! Pure derivations from the synchronized records to what the screen shows.

use chrono::{DateTime, Local, TimeZone, Utc};
use jsonshelf_protocol::{OwnerId, Record, RecordId};
use serde_json::Value;

/// Created-at format used in table rows.
pub const SHORT_TIME_FORMAT: &str = "%b %d, %H:%M";
/// Created-at format used in the detail view.
pub const LONG_TIME_FORMAT: &str = "%b %d, %Y %H:%M:%S";

/// Filtered records laid out as a table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableView {
    /// Discovered payload keys, first-seen order.
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl TableView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub id: RecordId,
    /// Short created-at label.
    pub created: String,
    /// One cell per column.
    pub cells: Vec<String>,
}

/// Everything the detail modal shows for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDetail {
    pub id: RecordId,
    pub owner_id: OwnerId,
    /// Long created-at label.
    pub created: String,
    /// Full pretty-printed payload.
    pub body: String,
}

/// Records whose compact JSON contains `term`, ignoring case. Order is kept.
pub fn filter<'a>(records: &'a [Record], term: &str) -> Vec<&'a Record> {
    if term.is_empty() {
        return records.iter().collect();
    }
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|record| compact(&record.payload).to_lowercase().contains(&needle))
        .collect()
}

/// Union of top-level object keys, in the order they are first seen.
pub fn discover_columns<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        let Value::Object(map) = &record.payload else {
            continue;
        };
        for key in map.keys() {
            if !columns.iter().any(|column| column == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Display text for one column of a record.
pub fn cell_value(record: &Record, column: &str) -> String {
    match record.payload.get(column) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(value) => compact(value),
    }
}

/// Pretty JSON cut to `max_chars` characters, with `...` appended when cut.
pub fn preview(payload: &Value, max_chars: usize) -> String {
    let pretty = pretty(payload);
    match pretty.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &pretty[..end]),
        None => pretty,
    }
}

pub fn detail(record: &Record) -> RecordDetail {
    detail_in(record, &Local)
}

/// `detail` with timestamps rendered in `zone`.
pub fn detail_in<Tz: TimeZone>(record: &Record, zone: &Tz) -> RecordDetail
where
    Tz::Offset: std::fmt::Display,
{
    RecordDetail {
        id: record.id.clone(),
        owner_id: record.owner_id.clone(),
        created: time_label(record.created_at, zone, LONG_TIME_FORMAT),
        body: pretty(&record.payload),
    }
}

/// Filter `records` by `term` and lay the matches out as a table.
pub fn table(records: &[Record], term: &str) -> TableView {
    table_in(records, term, &Local)
}

/// `table` with timestamps rendered in `zone`.
pub fn table_in<Tz: TimeZone>(records: &[Record], term: &str, zone: &Tz) -> TableView
where
    Tz::Offset: std::fmt::Display,
{
    let matching = filter(records, term);
    let columns = discover_columns(matching.iter().copied());
    let rows = matching
        .into_iter()
        .map(|record| TableRow {
            id: record.id.clone(),
            created: time_label(record.created_at, zone, SHORT_TIME_FORMAT),
            cells: columns
                .iter()
                .map(|column| cell_value(record, column))
                .collect(),
        })
        .collect();
    TableView { columns, rows }
}

/// Hint shown under "No records found".
pub fn empty_message(term: &str) -> &'static str {
    if term.is_empty() {
        "Start by adding some JSON data from the entry screen."
    } else {
        "Try adjusting your search term."
    }
}

fn time_label<Tz: TimeZone>(at: DateTime<Utc>, zone: &Tz, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(zone).format(format).to_string()
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonshelf_test_utils::record;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn filter_is_case_insensitive_over_compact_json() {
        let records = vec![
            record("a", "u1", json!({ "name": "Data Science" })),
            record("b", "u1", json!({ "name": "Business" })),
            record("c", "u1", json!([1, 2, 3])),
        ];
        let ids = |found: Vec<&Record>| -> Vec<String> {
            found.iter().map(|record| record.id.to_string()).collect()
        };
        assert_eq!(ids(filter(&records, "SCIENCE")), vec!["a"]);
        assert_eq!(ids(filter(&records, "\"name\":\"bus")), vec!["b"]);
        assert_eq!(ids(filter(&records, "2,3")), vec!["c"]);
        assert_eq!(ids(filter(&records, "")), vec!["a", "b", "c"]);
        assert!(filter(&records, "zzz").is_empty());
    }

    #[test]
    fn cell_values_follow_json_kind() {
        let record = record(
            "a",
            "u1",
            json!({ "s": "text", "n": 4.5, "b": false, "z": null, "o": { "k": [1] } }),
        );
        assert_eq!(cell_value(&record, "s"), "text");
        assert_eq!(cell_value(&record, "n"), "4.5");
        assert_eq!(cell_value(&record, "b"), "false");
        assert_eq!(cell_value(&record, "z"), "");
        assert_eq!(cell_value(&record, "missing"), "");
        assert_eq!(cell_value(&record, "o"), r#"{"k":[1]}"#);
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        let payload = json!({ "name": "é".repeat(20) });
        let full = serde_json::to_string_pretty(&payload).expect("pretty");
        let short = preview(&payload, 12);
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), 15);
        assert!(full.starts_with(short.trim_end_matches("...")));
        assert_eq!(preview(&payload, full.chars().count()), full);
    }

    #[test]
    fn table_lists_columns_of_matching_records_only() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 30).unwrap();
        let mut first = record("a", "u1", json!({ "name": "x", "credits": 1 }));
        first.created_at = at;
        let second = record("b", "u1", json!({ "other": true }));

        let view = table_in(&[first.clone(), second], "credits", &Utc);
        assert_eq!(view.columns, vec!["name", "credits"]);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].created, "Mar 09, 14:05");
        assert_eq!(view.rows[0].cells, vec!["x", "1"]);

        let detail = detail_in(&first, &Utc);
        assert_eq!(detail.created, "Mar 09, 2024 14:05:30");
        assert_eq!(detail.body, "{\n  \"name\": \"x\",\n  \"credits\": 1\n}");
    }

    #[test]
    fn empty_message_depends_on_term() {
        assert_eq!(empty_message("x"), "Try adjusting your search term.");
        assert!(empty_message("").starts_with("Start by adding"));
    }
}
