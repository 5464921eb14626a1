mod catalog;
mod error;
mod evaluation_report;
mod option;
mod registry;
mod rule;
mod selection;
mod view;

pub use catalog::{Catalog, CatalogBuilder, MatchPolicy, OptionRuleSet, RuleBuilder};
pub use error::AuthoringError;
pub use evaluation_report::{EvaluationReport, SkipReason, SkippedRule};
pub use option::{OptionValue, ProductOption};
pub use registry::OptionRegistry;
pub use rule::{
    filter_values, hide_option, option, require_option, set_default, show_option, Action,
    Condition, Effect, Operator, OptionExpr, Rule, Test,
};
pub use selection::{Selection, SelectionState};
pub use view::{DerivedOptionView, DerivedViews};

pub(crate) use rule::{CompiledCondition, CompiledEffect, CompiledRule, CompiledTest};
