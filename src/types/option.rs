use std::fmt;

use serde::{Deserialize, Serialize};

/// One selectable choice for a [`ProductOption`].
///
/// `code` is the canonical match key. `id` is accepted as an alias when the
/// rule set is compiled with [`MatchPolicy::CodeOrId`](super::MatchPolicy).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionValue {
    pub id: String,
    pub code: String,
    pub label: String,
}

impl OptionValue {
    /// Create a value whose `id` is the same as its `code`.
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            id: code.clone(),
            code,
            label: label.into(),
        }
    }

    /// Create a value with a distinct stable `id`.
    pub fn with_id(
        id: impl Into<String>,
        code: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            label: label.into(),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.code, self.label)
    }
}

fn visible_by_default() -> bool {
    true
}

/// A configurable product attribute with an ordered list of values.
///
/// `required` and `visible` are the authored defaults a derived view starts
/// from before any rule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub values: Vec<OptionValue>,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
}

impl ProductOption {
    /// Create a visible, optional option with no values.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            values: Vec::new(),
            required: false,
            visible: true,
        }
    }

    /// Append a value whose `id` equals its `code`.
    #[must_use]
    pub fn value(mut self, code: &str, label: &str) -> Self {
        self.values.push(OptionValue::new(code, label));
        self
    }

    /// Append a fully specified value.
    #[must_use]
    pub fn push_value(mut self, value: OptionValue) -> Self {
        self.values.push(value);
        self
    }

    /// Mark the option as required before any rule fires.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the option as hidden before any rule fires.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}
