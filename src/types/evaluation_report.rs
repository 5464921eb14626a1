use std::fmt;
use std::time::Duration;

use super::view::DerivedViews;

/// Why a rule was left out of a compiled rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The condition names an option that is not in the catalog.
    UnknownConditionOption,
    /// The effect targets an option that is not in the catalog.
    UnknownTargetOption,
    /// `equals`/`not_equals` compares against a code the condition option lacks,
    /// or no code of an `in_list` resolves.
    UnknownConditionValue,
    /// `set_default` names a code the target lacks, or no code of a
    /// `filter_values` list resolves.
    UnknownTargetValue,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::UnknownConditionOption => "unknown condition option",
            SkipReason::UnknownTargetOption => "unknown target option",
            SkipReason::UnknownConditionValue => "unknown condition value",
            SkipReason::UnknownTargetValue => "unknown target value",
        };
        f.write_str(text)
    }
}

/// A rule that compiled to nothing because of a malformed reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRule {
    pub rule_id: String,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.rule_id, self.reason)
    }
}

/// Detailed evaluation report returned by
/// [`OptionRuleSet::evaluate_detailed()`](super::OptionRuleSet::evaluate_detailed).
///
/// Contains the derived views, which rules fired, which rules were inert,
/// and the wall-clock duration of the evaluation.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    views: DerivedViews,
    fired: Vec<String>,
    skipped: Vec<SkippedRule>,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(
        views: DerivedViews,
        fired: Vec<String>,
        skipped: Vec<SkippedRule>,
        duration: Duration,
    ) -> Self {
        Self {
            views,
            fired,
            skipped,
            duration,
        }
    }

    /// The derived views, same as [`OptionRuleSet::evaluate()`](super::OptionRuleSet::evaluate).
    pub fn views(&self) -> &DerivedViews {
        &self.views
    }

    /// Consume the report, keeping only the views.
    pub fn into_views(self) -> DerivedViews {
        self.views
    }

    /// Ids of rules whose condition matched, in stored rule order.
    ///
    /// A `set_default` rule that matched but lost to an earlier default, or
    /// whose target was already selected, is still listed.
    #[must_use]
    pub fn fired(&self) -> &[String] {
        &self.fired
    }

    /// Rules that were inert because of malformed references.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedRule] {
        &self.skipped
    }

    /// Wall-clock duration of the evaluation.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "options: {}", self.views.len())?;
        write!(f, ", fired: [{}]", self.fired.join(", "))?;
        if !self.skipped.is_empty() {
            let skipped: Vec<String> = self.skipped.iter().map(ToString::to_string).collect();
            write!(f, ", skipped: [{}]", skipped.join(", "))?;
        }
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}
