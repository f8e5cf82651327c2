//! Header-driven record parsing for published spreadsheet exports.
//!
//! Lines are split on `\n` and fields on `,` with no quote handling. A
//! quoted cell containing a comma is split like any other; exports that
//! need embedded commas are not supported.

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::ViewError;

/// What to do with a data line whose value count differs from the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum ParsePolicy {
    /// Pad missing values with `""` and ignore extras.
    #[default]
    Lenient,
    /// Drop the line and report it.
    Strict,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: HashMap<String, String>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Value for `field`, or `""` when the record has no such key.
    pub fn value(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Parsed records plus the header they were keyed by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.headers.iter().any(|h| h == field)
    }

    /// Header names with duplicates removed, first occurrence kept.
    pub fn unique_headers(&self) -> Vec<String> {
        let mut seen = Vec::with_capacity(self.headers.len());
        for header in &self.headers {
            if !seen.contains(header) {
                seen.push(header.clone());
            }
        }
        seen
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub set: RecordSet,
    /// Lines dropped under [`ParsePolicy::Strict`], as `MalformedRow` errors.
    pub rejected: Vec<ViewError>,
}

impl ParseOutcome {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

pub fn parse(text: &str, policy: ParsePolicy) -> ParseOutcome {
    let mut lines = text
        .split('\n')
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header_line)) = lines.next() else {
        debug!("Input contained no non-blank lines");
        return ParseOutcome::default();
    };
    let headers = header_line
        .split(',')
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();

    let mut records = Vec::new();
    let mut rejected = Vec::new();
    for (idx, line) in lines {
        let values = line.split(',').map(str::trim).collect::<Vec<_>>();
        if policy == ParsePolicy::Strict && values.len() != headers.len() {
            let err = ViewError::MalformedRow {
                line: idx + 1,
                expected: headers.len(),
                found: values.len(),
            };
            warn!("Skipping row: {err}");
            rejected.push(err);
            continue;
        }
        let record = headers
            .iter()
            .enumerate()
            .map(|(pos, header)| {
                (
                    header.clone(),
                    values.get(pos).copied().unwrap_or("").to_string(),
                )
            })
            .collect::<Record>();
        records.push(record);
    }

    debug!(
        "Parsed {} record(s) across {} field(s), {} rejected",
        records.len(),
        headers.len(),
        rejected.len()
    );
    ParseOutcome {
        set: RecordSet { headers, records },
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_yields_nothing() {
        assert!(parse("", ParsePolicy::Lenient).is_empty());
        assert!(parse("\n\n", ParsePolicy::Lenient).is_empty());
        assert!(parse("  \n\t\n", ParsePolicy::Strict).set.headers.is_empty());
    }

    #[test]
    fn header_only_has_headers_but_no_records() {
        let outcome = parse("name,mount\n", ParsePolicy::Lenient);
        assert_eq!(outcome.set.headers, vec!["name", "mount"]);
        assert!(outcome.is_empty());
    }

    #[test]
    fn lenient_pads_short_rows_and_ignores_extras() {
        let outcome = parse("a,b,c\n1\n1,2,3,4\n", ParsePolicy::Lenient);
        let records = &outcome.set.records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("b"), Some(""));
        assert_eq!(records[0].get("c"), Some(""));
        assert_eq!(records[1].len(), 3);
        assert_eq!(records[1].value("c"), "3");
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn strict_reports_line_numbers_of_dropped_rows() {
        let outcome = parse("a,b\n1,2\n\n3\n4,5\n", ParsePolicy::Strict);
        assert_eq!(outcome.set.len(), 2);
        assert_eq!(
            outcome.rejected,
            vec![ViewError::MalformedRow {
                line: 4,
                expected: 2,
                found: 1
            }]
        );
    }

    #[test]
    fn values_and_headers_are_trimmed() {
        let outcome = parse(" name , mount \r\n Lens A ,  EF \r\n", ParsePolicy::Strict);
        assert_eq!(outcome.set.headers, vec!["name", "mount"]);
        assert_eq!(outcome.set.records[0].value("name"), "Lens A");
        assert_eq!(outcome.set.records[0].value("mount"), "EF");
    }

    #[test]
    fn duplicate_header_keeps_last_value() {
        let outcome = parse("x,x\n1,2\n", ParsePolicy::Lenient);
        assert_eq!(outcome.set.records[0].len(), 1);
        assert_eq!(outcome.set.records[0].value("x"), "2");
        assert_eq!(outcome.set.unique_headers(), vec!["x"]);
    }

    #[test]
    fn single_column_header() {
        let outcome = parse("name\nA\nB\n", ParsePolicy::Strict);
        assert_eq!(outcome.set.len(), 2);
        assert!(outcome.set.records.iter().all(|r| r.len() == 1));
    }
}
