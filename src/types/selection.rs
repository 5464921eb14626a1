use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The value(s) a user picked for one option: a code, or a list of codes for
/// multi-select controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    Single(String),
    Many(Vec<String>),
}

impl Selection {
    /// The selected codes as a slice. A `Single` yields one element.
    #[must_use]
    pub fn codes(&self) -> &[String] {
        match self {
            Selection::Single(code) => std::slice::from_ref(code),
            Selection::Many(codes) => codes,
        }
    }

    /// An empty multi-select counts as no selection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes().is_empty()
    }
}

impl From<&str> for Selection {
    fn from(v: &str) -> Self {
        Selection::Single(v.to_owned())
    }
}

impl From<String> for Selection {
    fn from(v: String) -> Self {
        Selection::Single(v)
    }
}

impl From<Vec<String>> for Selection {
    fn from(v: Vec<String>) -> Self {
        Selection::Many(v)
    }
}

impl From<Vec<&str>> for Selection {
    fn from(v: Vec<&str>) -> Self {
        Selection::Many(v.into_iter().map(str::to_owned).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Selection {
    fn from(v: [&str; N]) -> Self {
        Selection::Many(v.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Single(code) => write!(f, "{code}"),
            Selection::Many(codes) => write!(f, "[{}]", codes.join(", ")),
        }
    }
}

/// The in-progress answers of one form, keyed by option key.
///
/// Options absent from the map are unselected. The evaluator only reads this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionState {
    selections: HashMap<String, Selection>,
}

impl SelectionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the selection for an option.
    #[must_use]
    pub fn set(mut self, key: &str, selection: impl Into<Selection>) -> Self {
        self.insert(key, selection);
        self
    }

    /// Set the selection for an option (mutable reference version).
    pub fn insert(&mut self, key: &str, selection: impl Into<Selection>) {
        self.selections.insert(key.to_owned(), selection.into());
    }

    /// Remove the selection for an option, returning what was there.
    pub fn remove(&mut self, key: &str) -> Option<Selection> {
        self.selections.remove(key)
    }

    /// The selection for an option. Empty multi-selects are reported as `None`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Selection> {
        self.selections.get(key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn is_selected(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selection)> {
        self.selections.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_single() {
        let state = SelectionState::new().set("control", "chain");
        assert_eq!(
            state.get("control"),
            Some(&Selection::Single("chain".to_owned()))
        );
        assert!(state.is_selected("control"));
    }

    #[test]
    fn set_and_get_many() {
        let state = SelectionState::new().set("extras", ["valance", "tieback"]);
        assert_eq!(
            state.get("extras").map(Selection::codes),
            Some(&["valance".to_owned(), "tieback".to_owned()][..])
        );
    }

    #[test]
    fn missing_returns_none() {
        let state = SelectionState::new().set("control", "chain");
        assert_eq!(state.get("heading"), None);
        assert!(!state.is_selected("heading"));
    }

    #[test]
    fn empty_many_counts_as_unselected() {
        let state = SelectionState::new().set("extras", Vec::<String>::new());
        assert_eq!(state.get("extras"), None);
        assert!(!state.is_selected("extras"));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn overwrite_and_remove() {
        let mut state = SelectionState::new().set("control", "chain");
        state.insert("control", "motor");
        assert_eq!(
            state.get("control"),
            Some(&Selection::Single("motor".to_owned()))
        );
        assert_eq!(
            state.remove("control"),
            Some(Selection::Single("motor".to_owned()))
        );
        assert!(state.is_empty());
    }

    #[test]
    fn single_codes_is_one_element() {
        let s = Selection::from("chain");
        assert_eq!(s.codes(), &["chain".to_owned()]);
        assert!(!s.is_empty());
    }

    #[test]
    fn display() {
        assert_eq!(Selection::from("chain").to_string(), "chain");
        assert_eq!(Selection::from(["a", "b"]).to_string(), "[a, b]");
    }
}
