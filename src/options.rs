//! Distinct-value option lists for filter controls.

use std::{cmp::Ordering, collections::BTreeMap, sync::OnceLock};

use itertools::Itertools;
use regex::Regex;

use crate::parser::Record;

fn leading_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))").expect("leading number pattern is valid")
    })
}

/// Numeric prefix of a value such as `"24mm"` or `"24-70mm"`.
pub fn leading_number(value: &str) -> Option<f64> {
    leading_number_pattern()
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Sorts by leading number when every value has one, lexicographically
/// otherwise.
pub fn sort_numeric_aware(values: &mut Vec<String>) {
    let Some(numbers) = values
        .iter()
        .map(|v| leading_number(v))
        .collect::<Option<Vec<_>>>()
    else {
        values.sort();
        return;
    };
    let mut keyed = numbers.into_iter().zip(values.drain(..)).collect::<Vec<_>>();
    keyed.sort_by(|(x, a), (y, b)| compare_keyed(*x, a, *y, b));
    values.extend(keyed.into_iter().map(|(_, value)| value));
}

fn compare_keyed(x: f64, a: &str, y: f64, b: &str) -> Ordering {
    x.total_cmp(&y).then_with(|| a.cmp(b))
}

pub fn distinct_values(records: &[Record], field: &str) -> Vec<String> {
    records
        .iter()
        .map(|r| r.value(field))
        .filter(|v| !v.is_empty())
        .unique()
        .map(str::to_string)
        .collect()
}

/// For each of `fields`, the sorted distinct non-empty values observed.
/// `numeric_field` is sorted with [`sort_numeric_aware`].
pub fn derive_filter_options(
    records: &[Record],
    fields: &[String],
    numeric_field: Option<&str>,
) -> BTreeMap<String, Vec<String>> {
    fields
        .iter()
        .map(|field| {
            let mut values = distinct_values(records, field);
            if numeric_field == Some(field.as_str()) {
                sort_numeric_aware(&mut values);
            } else {
                values.sort();
            }
            (field.clone(), values)
        })
        .collect()
}
