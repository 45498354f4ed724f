//! Per-conversation list of names: ordered, unique ignoring case.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::names::name_key;

/// Ordered list of names with case-insensitive uniqueness.
///
/// Display always uses the spelling that was stored first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameList {
    names: Vec<String>,
}

/// Result of [`NameList::add`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    pub added: Vec<String>,
    pub skipped: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveReport {
    /// Stored spellings of the entries that were removed.
    pub removed: Vec<String>,
    /// Requested names with no match.
    pub missing: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The list was empty before the call.
    ListEmpty,
    /// No names were given.
    NoNames,
    Removed(RemoveReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    AlreadyEmpty,
    Cleared(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing<'a> {
    Empty,
    /// 1-indexed entries in insertion order.
    Names(Vec<(usize, &'a str)>),
}

impl NameList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    /// Append every token whose key is not present yet. Tokens are handled in
    /// order, so a repeat within the same call is skipped too.
    pub fn add<S: AsRef<str>>(&mut self, tokens: &[S]) -> AddReport {
        let mut seen: HashSet<String> = self.names.iter().map(|n| name_key(n)).collect();
        let mut report = AddReport::default();

        for token in tokens {
            let token = token.as_ref();
            if token.is_empty() {
                continue;
            }
            if seen.insert(name_key(token)) {
                self.names.push(token.to_string());
                report.added.push(token.to_string());
            } else {
                report.skipped.push(token.to_string());
            }
        }

        report.total = self.names.len();
        report
    }

    pub fn listing(&self) -> Listing<'_> {
        if self.names.is_empty() {
            return Listing::Empty;
        }
        Listing::Names(
            self.names
                .iter()
                .enumerate()
                .map(|(i, name)| (i + 1, name.as_str()))
                .collect(),
        )
    }

    /// Remove the first case-insensitive match for each token.
    pub fn remove<S: AsRef<str>>(&mut self, tokens: &[S]) -> RemoveOutcome {
        if self.names.is_empty() {
            return RemoveOutcome::ListEmpty;
        }
        if tokens.iter().all(|t| t.as_ref().is_empty()) {
            return RemoveOutcome::NoNames;
        }

        let mut removed = Vec::new();
        let mut missing = Vec::new();
        for token in tokens {
            let token = token.as_ref();
            if token.is_empty() {
                continue;
            }
            let key = name_key(token);
            match self.names.iter().position(|n| name_key(n) == key) {
                Some(index) => removed.push(self.names.remove(index)),
                None => missing.push(token.to_string()),
            }
        }

        RemoveOutcome::Removed(RemoveReport {
            removed,
            missing,
            total: self.names.len(),
        })
    }

    pub fn clear(&mut self) -> ClearOutcome {
        if self.names.is_empty() {
            return ClearOutcome::AlreadyEmpty;
        }
        let count = self.names.len();
        self.names.clear();
        ClearOutcome::Cleared(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::parse_args;

    fn has_case_duplicates(list: &NameList) -> bool {
        let mut seen = HashSet::new();
        list.as_slice().iter().any(|n| !seen.insert(name_key(n)))
    }

    #[test]
    fn add_keeps_first_spelling_and_order() {
        let mut list = NameList::new();
        let first = list.add(&["B", "a", "B"]);
        assert_eq!(first.added, vec!["B", "a"]);
        assert_eq!(first.skipped, vec!["B"]);

        let second = list.add(&["A"]);
        assert!(second.added.is_empty());
        assert_eq!(second.skipped, vec!["A"]);
        assert_eq!(list.as_slice(), ["B", "a"]);
        assert_eq!(second.total, 2);
    }

    #[test]
    fn add_never_creates_case_duplicates() {
        let batches: [&[&str]; 5] = [
            &["Ann", "ANN", "bob"],
            &["Bob", "Cy", "cy"],
            &["ann", "Dee"],
            &[],
            &["DEE", "eve", "Eve", "EVE"],
        ];
        let mut list = NameList::new();
        for batch in batches {
            list.add(batch);
            assert!(!has_case_duplicates(&list));
        }
        assert_eq!(list.as_slice(), ["Ann", "bob", "Cy", "Dee", "eve"]);
    }

    #[test]
    fn add_and_remove_use_full_case_folding() {
        let mut list = NameList::new();
        let report = list.add(&["STRASSE", "straße", "ΟΔΟΣ", "οδοσ"]);
        assert_eq!(report.added, ["STRASSE", "ΟΔΟΣ"]);
        assert_eq!(report.skipped, ["straße", "οδοσ"]);

        let RemoveOutcome::Removed(removed) = list.remove(&["strasse", "οδος"]) else {
            panic!("expected a removal");
        };
        assert_eq!(removed.removed, ["STRASSE", "ΟΔΟΣ"]);
        assert!(removed.missing.is_empty());
        assert!(list.is_empty());
    }

    #[test]
    fn add_empty_input_changes_nothing() {
        let mut list = NameList::new();
        list.add(&["Ann"]);
        let report = list.add(&parse_args("/add"));
        assert_eq!(report, AddReport { added: vec![], skipped: vec![], total: 1 });
        assert_eq!(list.as_slice(), ["Ann"]);
    }

    #[test]
    fn add_then_remove_round_trip() {
        let mut list = NameList::new();
        list.add(&parse_args("/add Tom, Jerry"));
        assert_eq!(list.as_slice(), ["Tom", "Jerry"]);

        let outcome = list.remove(&parse_args("/remove tom"));
        assert_eq!(
            outcome,
            RemoveOutcome::Removed(RemoveReport {
                removed: vec!["Tom".into()],
                missing: vec![],
                total: 1,
            })
        );
        assert_eq!(list.as_slice(), ["Jerry"]);
    }

    #[test]
    fn remove_reports_missing_and_preserves_order() {
        let mut list = NameList::new();
        list.add(&["Ann", "Bob", "Cy", "Dee"]);
        let outcome = list.remove(&["cy", "Zed", "ANN"]);
        let RemoveOutcome::Removed(report) = outcome else {
            panic!("expected removal, got {outcome:?}");
        };
        assert_eq!(report.removed, vec!["Cy", "Ann"]);
        assert_eq!(report.missing, vec!["Zed"]);
        assert_eq!(list.as_slice(), ["Bob", "Dee"]);
    }

    #[test]
    fn remove_same_name_twice_only_removes_once() {
        let mut list = NameList::new();
        list.add(&["Ann", "Bob"]);
        let RemoveOutcome::Removed(report) = list.remove(&["ann", "Ann"]) else {
            panic!("expected removal");
        };
        assert_eq!(report.removed, vec!["Ann"]);
        assert_eq!(report.missing, vec!["Ann"]);
    }

    #[test]
    fn remove_usage_conditions() {
        let mut list = NameList::new();
        assert_eq!(list.remove(&["Ann"]), RemoveOutcome::ListEmpty);

        list.add(&["Ann"]);
        let none: [&str; 0] = [];
        assert_eq!(list.remove(&none), RemoveOutcome::NoNames);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn listing_is_one_indexed() {
        let mut list = NameList::new();
        assert_eq!(list.listing(), Listing::Empty);
        list.add(&["Ann", "Bob"]);
        assert_eq!(list.listing(), Listing::Names(vec![(1, "Ann"), (2, "Bob")]));
    }

    #[test]
    fn clear_reports_prior_count() {
        let mut list = NameList::new();
        assert_eq!(list.clear(), ClearOutcome::AlreadyEmpty);
        list.add(&["Ann", "Bob", "Cy"]);
        assert_eq!(list.clear(), ClearOutcome::Cleared(3));
        assert!(list.is_empty());
        assert_eq!(list.clear(), ClearOutcome::AlreadyEmpty);
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut list = NameList::new();
        list.add(&["Ann", "Bob"]);
        assert_eq!(serde_json::to_string(&list).unwrap(), r#"["Ann","Bob"]"#);
    }
}
