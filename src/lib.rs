//! Declarative option rules for product configuration forms.
//!
//! A [`Catalog`] holds the options a form offers and the rules that tie them
//! together. Compile it into an [`OptionRuleSet`] once, then derive the
//! per-option [`DerivedViews`] for any [`SelectionState`] as often as needed.
//!
//! ```
//! use optrule::{option, set_default, show_option, Catalog, ProductOption, Rule, SelectionState};
//!
//! let catalog = Catalog::new(
//!     vec![
//!         ProductOption::new("control", "Control").value("chain", "Chain").value("motor", "Motor"),
//!         ProductOption::new("chain_length", "Chain length")
//!             .value("short", "Short")
//!             .value("long", "Long")
//!             .hidden(),
//!     ],
//!     vec![
//!         Rule::new("show", option("control").equals("chain"), show_option("chain_length")),
//!         Rule::new("long", option("control").equals("chain"), set_default("chain_length", "long")),
//!     ],
//! );
//! catalog.validate().unwrap();
//!
//! let rules = catalog.compile();
//! let views = rules.evaluate(&SelectionState::new().set("control", "chain"));
//! let length = views.get("chain_length").unwrap();
//! assert!(length.visible);
//! assert_eq!(length.default_value.as_ref().unwrap().code, "long");
//! ```

mod compile;
mod error;
mod evaluate;
pub mod parse;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod session;
mod types;
pub mod wire;

pub use error::OptruleError;
pub use evaluate::evaluate;
pub use parse::ParseError;
#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
pub use session::{FormSession, SessionConfig, Settled};
pub use types::{
    filter_values, hide_option, option, require_option, set_default, show_option, Action,
    AuthoringError, Catalog, CatalogBuilder, Condition, DerivedOptionView, DerivedViews, Effect,
    EvaluationReport, MatchPolicy, Operator, OptionExpr, OptionRegistry, OptionRuleSet,
    OptionValue, ProductOption, Rule, RuleBuilder, Selection, SelectionState, SkipReason,
    SkippedRule, Test,
};
