use std::sync::Arc;

use crate::{DerivedViews, OptionRuleSet, Selection, SelectionState};

/// Tuning for [`FormSession::settle()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Upper bound on evaluate/apply-defaults passes per settle. Zero is
    /// treated as one.
    pub max_passes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_passes: 8 }
    }
}

/// Outcome of [`FormSession::settle()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settled {
    pub passes: usize,
    /// `false` if the pass limit was hit while defaults were still changing.
    pub converged: bool,
}

/// One in-progress form: a shared rule snapshot plus the selections this
/// session owns.
///
/// The evaluator is a single pass. Rules whose conditions depend on a value
/// another rule defaulted only fire once that default is written back into the
/// selections and the evaluator runs again; [`settle()`](Self::settle) does
/// exactly that, with a bounded number of passes.
#[derive(Debug, Clone)]
pub struct FormSession {
    rules: Arc<OptionRuleSet>,
    selections: SelectionState,
    config: SessionConfig,
}

impl FormSession {
    #[must_use]
    pub fn new(rules: Arc<OptionRuleSet>) -> Self {
        Self::with_config(rules, SessionConfig::default())
    }

    #[must_use]
    pub fn with_config(rules: Arc<OptionRuleSet>, config: SessionConfig) -> Self {
        Self {
            rules,
            selections: SelectionState::new(),
            config,
        }
    }

    /// Record user input for one option.
    pub fn select(&mut self, key: &str, selection: impl Into<Selection>) {
        let selection = selection.into();
        tracing::trace!(key, %selection, "select");
        self.selections.insert(key, selection);
    }

    /// Clear the selection for one option, returning what was there.
    pub fn clear(&mut self, key: &str) -> Option<Selection> {
        tracing::trace!(key, "clear");
        self.selections.remove(key)
    }

    #[must_use]
    pub fn selections(&self) -> &SelectionState {
        &self.selections
    }

    #[must_use]
    pub fn rules(&self) -> &Arc<OptionRuleSet> {
        &self.rules
    }

    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Derive the current views. Does not touch the selections.
    #[must_use]
    pub fn views(&self) -> DerivedViews {
        self.rules.evaluate(&self.selections)
    }

    /// Write every visible view's default into the selections of options the
    /// user has not chosen yet. A default that the same pass filtered out of
    /// the allowed values is skipped. Returns how many defaults were applied.
    pub fn apply_defaults(&mut self) -> usize {
        let views = self.views();
        let mut applied = 0;
        for view in &views {
            if !view.visible || self.selections.is_selected(&view.key) {
                continue;
            }
            if let Some(default) = &view.default_value {
                if !view.allows(&default.code) {
                    tracing::debug!(
                        key = %view.key,
                        code = %default.code,
                        "default not in allowed values"
                    );
                    continue;
                }
                tracing::trace!(key = %view.key, code = %default.code, "apply default");
                self.selections.insert(&view.key, default.code.as_str());
                applied += 1;
            }
        }
        applied
    }

    /// Alternate evaluation and [`apply_defaults()`](Self::apply_defaults)
    /// until no default changes or the pass limit is reached.
    ///
    /// Hitting the limit is not an error; it means the authored defaults keep
    /// feeding each other and is logged as a warning.
    pub fn settle(&mut self) -> Settled {
        let limit = self.config.max_passes.max(1);
        let mut passes = 0;
        while passes < limit {
            passes += 1;
            let applied = self.apply_defaults();
            tracing::debug!(pass = passes, applied, "settle pass");
            if applied == 0 {
                return Settled {
                    passes,
                    converged: true,
                };
            }
        }
        tracing::warn!(
            max_passes = limit,
            "defaults did not settle within the pass limit"
        );
        Settled {
            passes,
            converged: false,
        }
    }

    /// Swap in a refetched rule snapshot, keeping the selections.
    pub fn replace_rules(&mut self, rules: Arc<OptionRuleSet>) {
        tracing::debug!(rules = rules.rule_count(), "replacing rule snapshot");
        self.rules = rules;
    }

    /// Give up the session, keeping its selections.
    #[must_use]
    pub fn into_selections(self) -> SelectionState {
        self.selections
    }
}
