use anyhow::{Result, anyhow};

use crate::parser::Record;

/// A single `field = value` constraint. An empty `value` places no
/// constraint on the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    pub field: String,
    pub value: String,
}

impl Criterion {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.value.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        !self.is_active() || record.value(&self.field) == self.value
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    criteria: Vec<Criterion>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the constraint for `field`, replacing any earlier one.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let criterion = Criterion::new(field, value);
        match self.criteria.iter_mut().find(|c| c.field == criterion.field) {
            Some(existing) => existing.value = criterion.value,
            None => self.criteria.push(criterion),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter()
    }

    pub fn active(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter().filter(|c| c.is_active())
    }

    pub fn is_unconstrained(&self) -> bool {
        self.active().next().is_none()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.criteria.iter().all(|c| c.matches(record))
    }
}

impl FromIterator<Criterion> for FilterCriteria {
    fn from_iter<I: IntoIterator<Item = Criterion>>(iter: I) -> Self {
        let mut criteria = FilterCriteria::new();
        for criterion in iter {
            criteria.set(criterion.field, criterion.value);
        }
        criteria
    }
}

/// Keeps the records that satisfy every active criterion, in input order.
pub fn apply_filters(records: &[Record], criteria: &FilterCriteria) -> Vec<Record> {
    if criteria.is_unconstrained() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect()
}

pub fn parse_filters(filters: &[String]) -> Result<FilterCriteria> {
    filters.iter().map(|f| parse_filter(f)).collect()
}

/// Parses `field=value`. The value may be quoted and may be empty.
fn parse_filter(filter: &str) -> Result<Criterion> {
    let trimmed = filter.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Empty filter expression"));
    }
    let Some((left, right)) = trimmed.split_once('=') else {
        return Err(anyhow!(
            "Failed to parse filter expression '{trimmed}', expected field=value"
        ));
    };
    let field = left.trim();
    if field.is_empty() {
        return Err(anyhow!("Filter expression '{trimmed}' has no field name"));
    }
    Ok(Criterion::new(field, unquote(right.trim())))
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs.iter().copied().collect()
    }

    #[test]
    fn parse_filter_accepts_quotes_and_spaces() {
        let criteria = parse_filters(&[
            "mount = EF".to_string(),
            "maker='Canon Inc'".to_string(),
        ])
        .unwrap();
        let collected = criteria.iter().cloned().collect::<Vec<_>>();
        assert_eq!(
            collected,
            vec![Criterion::new("mount", "EF"), Criterion::new("maker", "Canon Inc")]
        );
    }

    #[test]
    fn parse_filter_allows_empty_value_as_no_op() {
        let criteria = parse_filters(&["mount=".to_string()]).unwrap();
        assert!(criteria.is_unconstrained());
    }

    #[test]
    fn parse_filter_rejects_missing_operator() {
        assert!(parse_filters(&["mount EF".to_string()]).is_err());
        assert!(parse_filters(&["=EF".to_string()]).is_err());
        assert!(parse_filters(&["   ".to_string()]).is_err());
    }

    #[test]
    fn later_constraint_on_same_field_wins() {
        let criteria = FilterCriteria::new().with("mount", "EF").with("mount", "RF");
        assert_eq!(criteria.iter().count(), 1);
        assert!(criteria.matches(&record(&[("mount", "RF")])));
    }

    #[test]
    fn equality_is_exact_and_case_sensitive() {
        let criteria = FilterCriteria::new().with("mount", "ef");
        assert!(!criteria.matches(&record(&[("mount", "EF")])));
        assert!(!criteria.matches(&record(&[("mount", "EF-S")])));
    }

    #[test]
    fn missing_field_never_matches_an_active_criterion() {
        let criteria = FilterCriteria::new().with("mount", "EF");
        assert!(!criteria.matches(&record(&[("name", "A")])));
    }

    #[test]
    fn dash_constraint_does_not_match_blank_cell() {
        let records = vec![record(&[("mount", "")])];
        let criteria = FilterCriteria::new().with("mount", "-");
        assert!(apply_filters(&records, &criteria).is_empty());
    }
}
