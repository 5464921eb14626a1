use std::collections::HashMap;
use std::fmt;

use super::option::OptionValue;

/// The evaluator's computed state for one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedOptionView {
    pub key: String,
    pub visible: bool,
    pub required: bool,
    /// Values the form may offer, in the option's authored order.
    pub allowed_values: Vec<OptionValue>,
    /// Set only when a `set_default` rule fired and the option is unselected.
    pub default_value: Option<OptionValue>,
}

impl DerivedOptionView {
    /// Whether a value with this code survived every `filter_values` rule.
    #[must_use]
    pub fn allows(&self, code: &str) -> bool {
        self.allowed_values.iter().any(|v| v.code == code)
    }

    /// Codes of the allowed values, in order.
    #[must_use]
    pub fn allowed_codes(&self) -> Vec<&str> {
        self.allowed_values.iter().map(|v| v.code.as_str()).collect()
    }
}

impl fmt::Display for DerivedOptionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}{}, allowed [{}]",
            self.key,
            if self.visible { "visible" } else { "hidden" },
            if self.required { ", required" } else { "" },
            self.allowed_codes().join(", "),
        )?;
        if let Some(default) = &self.default_value {
            write!(f, ", default {}", default.code)?;
        }
        Ok(())
    }
}

/// One [`DerivedOptionView`] per option, in catalog order, with lookup by key.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct DerivedViews {
    views: Vec<DerivedOptionView>,
    index: HashMap<String, usize>,
}

impl DerivedViews {
    pub(crate) fn new(views: Vec<DerivedOptionView>) -> Self {
        let mut index = HashMap::with_capacity(views.len());
        for (i, view) in views.iter().enumerate() {
            index.entry(view.key.clone()).or_insert(i);
        }
        Self { views, index }
    }

    /// The view for an option key. With duplicate keys the first option wins.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DerivedOptionView> {
        self.index.get(key).map(|&i| &self.views[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DerivedOptionView> {
        self.views.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[DerivedOptionView] {
        &self.views
    }
}

impl<'a> IntoIterator for &'a DerivedViews {
    type Item = &'a DerivedOptionView;
    type IntoIter = std::slice::Iter<'a, DerivedOptionView>;

    fn into_iter(self) -> Self::IntoIter {
        self.views.iter()
    }
}

impl fmt::Display for DerivedViews {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, view) in self.views.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{view}")?;
        }
        Ok(())
    }
}
