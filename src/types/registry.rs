use std::collections::HashMap;

/// Maps option keys (e.g. `"control"`) to their position in the catalog.
///
/// Built when a rule set is compiled. Rules and selections address options by
/// these indices at evaluation time.
#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    keys: HashMap<String, usize>,
}

impl OptionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register an option key at the given catalog position. A key that is
    /// already registered keeps its first position; returns `false` in that case.
    pub(crate) fn register(&mut self, key: &str, index: usize) -> bool {
        if self.keys.contains_key(key) {
            return false;
        }
        self.keys.insert(key.to_owned(), index);
        true
    }

    /// Look up the catalog position for an option key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<usize> {
        self.keys.get(key).copied()
    }

    /// The number of distinct registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over all registered (key, index) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &usize)> {
        self.keys.iter().map(|(k, v)| (k.as_str(), v))
    }
}
