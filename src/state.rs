//! View state for one load cycle.
//!
//! The full record set is shared read-only behind an `Rc`; every transition
//! borrows the current state and returns a fresh one, so a failed transition
//! leaves the caller's state exactly as it was. [`Session`] owns the single
//! live value and tells subscribed observers whenever it changes.

use std::rc::Rc;

use log::{debug, info};

use crate::{
    error::ViewError,
    filter::{FilterCriteria, apply_filters},
    parser::{Record, RecordSet},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ViewState {
    #[default]
    Loading,
    Loaded {
        full: Rc<RecordSet>,
    },
    Filtered {
        full: Rc<RecordSet>,
        criteria: FilterCriteria,
        subset: Vec<Record>,
    },
    Comparing {
        full: Rc<RecordSet>,
        keys: Vec<String>,
        subset: Vec<Record>,
    },
    Error {
        message: String,
    },
}

impl ViewState {
    /// Result of a fetch + parse attempt.
    pub fn complete_load(result: Result<RecordSet, ViewError>) -> ViewState {
        match result {
            Ok(set) => ViewState::Loaded { full: Rc::new(set) },
            Err(err) => ViewState::Error {
                message: err.to_string(),
            },
        }
    }

    pub fn full(&self) -> Option<&Rc<RecordSet>> {
        match self {
            ViewState::Loaded { full }
            | ViewState::Filtered { full, .. }
            | ViewState::Comparing { full, .. } => Some(full),
            ViewState::Loading | ViewState::Error { .. } => None,
        }
    }

    /// Records currently on display.
    pub fn active(&self) -> &[Record] {
        match self {
            ViewState::Loaded { full } => full.records.as_slice(),
            ViewState::Filtered { subset, .. } | ViewState::Comparing { subset, .. } => {
                subset.as_slice()
            }
            ViewState::Loading | ViewState::Error { .. } => &[],
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.full().is_some()
    }

    fn require_full(&self) -> Result<&Rc<RecordSet>, ViewError> {
        self.full().ok_or(ViewError::NotLoaded)
    }

    pub fn filter(&self, criteria: FilterCriteria) -> Result<ViewState, ViewError> {
        let full = self.require_full()?;
        let subset = apply_filters(&full.records, &criteria);
        debug!("Filter kept {} of {} record(s)", subset.len(), full.len());
        Ok(ViewState::Filtered {
            full: Rc::clone(full),
            criteria,
            subset,
        })
    }

    pub fn compare(&self, key_field: &str, keys: &[String]) -> Result<ViewState, ViewError> {
        let full = self.require_full()?;
        let subset = select_for_comparison(&full.records, key_field, keys)?;
        Ok(ViewState::Comparing {
            full: Rc::clone(full),
            keys: keys.to_vec(),
            subset,
        })
    }

    pub fn reset(&self) -> Result<ViewState, ViewError> {
        let full = self.require_full()?;
        Ok(ViewState::Loaded {
            full: Rc::clone(full),
        })
    }
}

/// Records whose `key_field` value is one of `keys`, at most one per key,
/// in record-set order. Fewer than two distinct keys is an error.
pub fn select_for_comparison(
    records: &[Record],
    key_field: &str,
    keys: &[String],
) -> Result<Vec<Record>, ViewError> {
    let mut wanted = keys
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>();
    wanted.sort_unstable();
    wanted.dedup();
    if wanted.len() < 2 {
        return Err(ViewError::InvalidSelection {
            provided: wanted.len(),
        });
    }

    let mut taken = Vec::with_capacity(wanted.len());
    let mut selected = Vec::with_capacity(wanted.len());
    for record in records {
        let key = record.value(key_field);
        if wanted.binary_search(&key).is_ok() && !taken.contains(&key) {
            taken.push(key);
            selected.push(record.clone());
        }
    }
    Ok(selected)
}

pub trait StateObserver {
    fn state_changed(&mut self, state: &ViewState);
}

/// Owns the live [`ViewState`] and fans changes out to observers.
pub struct Session {
    key_field: String,
    state: ViewState,
    observers: Vec<Box<dyn StateObserver>>,
}

impl Session {
    pub fn new(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            state: ViewState::Loading,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn StateObserver>) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Records the outcome of the load cycle. Returns `EmptyInput` as a
    /// notice when the load succeeded without any data rows.
    pub fn finish_load(&mut self, result: Result<RecordSet, ViewError>) -> Option<ViewError> {
        let notice = match &result {
            Ok(set) if set.is_empty() => Some(ViewError::EmptyInput),
            _ => None,
        };
        let next = ViewState::complete_load(result);
        match &next {
            ViewState::Loaded { full } => info!("Loaded {} record(s)", full.len()),
            ViewState::Error { message } => info!("Load failed: {message}"),
            _ => {}
        }
        self.transition(next);
        notice
    }

    pub fn apply_filters(&mut self, criteria: FilterCriteria) -> Result<(), ViewError> {
        let next = self.state.filter(criteria)?;
        self.transition(next);
        Ok(())
    }

    pub fn compare(&mut self, keys: &[String]) -> Result<(), ViewError> {
        let next = self.state.compare(&self.key_field, keys)?;
        self.transition(next);
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), ViewError> {
        let next = self.state.reset()?;
        self.transition(next);
        Ok(())
    }

    fn transition(&mut self, next: ViewState) {
        self.state = next;
        for observer in &mut self.observers {
            observer.state_changed(&self.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::parser::{ParsePolicy, parse};

    fn loaded(text: &str) -> ViewState {
        ViewState::complete_load(Ok(parse(text, ParsePolicy::Lenient).set))
    }

    fn keys(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn derived_operations_require_a_completed_load() {
        let loading = ViewState::Loading;
        assert_eq!(
            loading.filter(FilterCriteria::new()).unwrap_err(),
            ViewError::NotLoaded
        );
        assert_eq!(loading.reset().unwrap_err(), ViewError::NotLoaded);

        let failed = ViewState::complete_load(Err(ViewError::NetworkFailure {
            url: "http://x".into(),
            reason: "404".into(),
        }));
        assert!(matches!(failed, ViewState::Error { .. }));
        assert_eq!(
            failed.compare("name", &keys(&["A", "B"])).unwrap_err(),
            ViewError::NotLoaded
        );
    }

    #[test]
    fn selection_dedupes_keys_and_keeps_first_match() {
        let state = loaded("name,v\nA,1\nB,2\nA,3\nC,4\n");
        let full = state.full().unwrap();
        let picked = select_for_comparison(&full.records, "name", &keys(&["C", "A", "A"])).unwrap();
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].value("v"), "1");
        assert_eq!(picked[1].value("name"), "C");
    }

    #[test]
    fn duplicate_single_key_is_still_one_key() {
        let state = loaded("name\nA\nB\n");
        assert_eq!(
            state.compare("name", &keys(&["A", " A "])).unwrap_err(),
            ViewError::InvalidSelection { provided: 1 }
        );
    }

    #[test]
    fn filtering_from_comparing_uses_the_full_set() {
        let state = loaded("name,mount\nA,X\nB,Y\nC,X\n");
        let comparing = state.compare("name", &keys(&["A", "B"])).unwrap();
        let filtered = comparing
            .filter(FilterCriteria::new().with("mount", "X"))
            .unwrap();
        let names = filtered
            .active()
            .iter()
            .map(|r| r.value("name"))
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["A", "C"]);
    }

    struct Recorder(Rc<RefCell<Vec<usize>>>);

    impl StateObserver for Recorder {
        fn state_changed(&mut self, state: &ViewState) {
            self.0.borrow_mut().push(state.active().len());
        }
    }

    #[test]
    fn observers_see_successful_transitions_only() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut session = Session::new("name");
        session.subscribe(Box::new(Recorder(Rc::clone(&seen))));

        assert_eq!(session.apply_filters(FilterCriteria::new()), Err(ViewError::NotLoaded));
        let notice = session.finish_load(Ok(parse("name,m\nA,X\nB,Y\n", ParsePolicy::Lenient).set));
        assert!(notice.is_none());
        session
            .apply_filters(FilterCriteria::new().with("m", "Y"))
            .unwrap();
        assert!(session.compare(&keys(&["A"])).is_err());
        session.reset().unwrap();

        assert_eq!(*seen.borrow(), vec![2, 1, 2]);
        assert!(matches!(session.state(), ViewState::Loaded { .. }));
    }

    #[test]
    fn empty_load_is_reported_but_still_loaded() {
        let mut session = Session::new("name");
        let notice = session.finish_load(Ok(parse("name\n", ParsePolicy::Lenient).set));
        assert_eq!(notice, Some(ViewError::EmptyInput));
        assert!(session.state().is_loaded());
        assert!(session.state().active().is_empty());
    }
}
