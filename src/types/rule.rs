use std::fmt;

use serde::{Deserialize, Serialize};

/// Condition operators as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    InList,
}

/// Effect actions as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ShowOption,
    HideOption,
    RequireOption,
    SetDefault,
    FilterValues,
}

impl Operator {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::InList => "in_list",
        }
    }
}

impl Action {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Action::ShowOption => "show_option",
            Action::HideOption => "hide_option",
            Action::RequireOption => "require_option",
            Action::SetDefault => "set_default",
            Action::FilterValues => "filter_values",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The test a condition applies to the current selection of one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Test {
    /// Selected code equals the given code.
    Equals(String),
    /// Selected code differs from the given code, or nothing is selected.
    NotEquals(String),
    /// Selected code or label contains the text, ignoring case.
    Contains(String),
    /// Selected code is one of the given codes.
    InList(Vec<String>),
}

impl Test {
    #[must_use]
    pub fn operator(&self) -> Operator {
        match self {
            Test::Equals(_) => Operator::Equals,
            Test::NotEquals(_) => Operator::NotEquals,
            Test::Contains(_) => Operator::Contains,
            Test::InList(_) => Operator::InList,
        }
    }
}

/// `WHEN <option_key> <test>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub option_key: String,
    pub test: Test,
}

/// What a rule does to its target option once its condition matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ShowOption { target: String },
    HideOption { target: String },
    RequireOption { target: String },
    SetDefault { target: String, value: String },
    FilterValues { target: String, values: Vec<String> },
}

impl Effect {
    #[must_use]
    pub fn action(&self) -> Action {
        match self {
            Effect::ShowOption { .. } => Action::ShowOption,
            Effect::HideOption { .. } => Action::HideOption,
            Effect::RequireOption { .. } => Action::RequireOption,
            Effect::SetDefault { .. } => Action::SetDefault,
            Effect::FilterValues { .. } => Action::FilterValues,
        }
    }

    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Effect::ShowOption { target }
            | Effect::HideOption { target }
            | Effect::RequireOption { target }
            | Effect::SetDefault { target, .. }
            | Effect::FilterValues { target, .. } => target,
        }
    }
}

/// An authored `WHEN <condition> THEN <effect>` statement.
///
/// The wire shape (see [`crate::wire`]) carries loosely typed
/// `operator`/`action` strings; this type makes the per-action payload
/// explicit so a `set_default` can never lack its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "crate::wire::RawRule", into = "crate::wire::RawRule")]
pub struct Rule {
    pub id: String,
    pub condition: Condition,
    pub effect: Effect,
    pub description: Option<String>,
}

impl Rule {
    pub fn new(id: impl Into<String>, condition: Condition, effect: Effect) -> Self {
        Self {
            id: id.into(),
            condition,
            effect,
            description: None,
        }
    }

    #[must_use]
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Whether the condition and the effect name the same option.
    #[must_use]
    pub fn is_self_referential(&self) -> bool {
        self.condition.option_key == self.effect.target()
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[String]) -> fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "\"{item}\"")?;
    }
    write!(f, "]")
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.option_key, self.test.operator())?;
        match &self.test {
            Test::Equals(v) | Test::NotEquals(v) | Test::Contains(v) => write!(f, "\"{v}\""),
            Test::InList(vs) => write_list(f, vs),
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action(), self.target())?;
        match self {
            Effect::SetDefault { value, .. } => write!(f, " \"{value}\""),
            Effect::FilterValues { values, .. } => {
                write!(f, " ")?;
                write_list(f, values)
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: when {} then {}",
            self.id, self.condition, self.effect
        )
    }
}

/// A condition test with value codes resolved to indices into the condition
/// option's values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CompiledTest {
    Equals(usize),
    NotEquals(usize),
    /// Lowercased needle.
    Contains(String),
    InList(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompiledCondition {
    pub(crate) option: usize,
    pub(crate) test: CompiledTest,
}

/// An effect with its target resolved to a catalog position and its codes
/// resolved to value indices of the target option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CompiledEffect {
    Show(usize),
    Hide(usize),
    Require(usize),
    SetDefault { target: usize, value: usize },
    FilterValues { target: usize, keep: Vec<usize> },
}

/// A rule whose option keys and value codes have been resolved for fast
/// evaluation. Kept in stored rule order.
#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub(crate) id: String,
    pub(crate) condition: CompiledCondition,
    pub(crate) effect: CompiledEffect,
}

/// Intermediate builder for conditions. Created by [`option()`].
#[derive(Debug, Clone)]
pub struct OptionExpr {
    key: String,
}

impl OptionExpr {
    #[must_use]
    pub fn equals(self, code: &str) -> Condition {
        self.test(Test::Equals(code.to_owned()))
    }

    #[must_use]
    pub fn not_equals(self, code: &str) -> Condition {
        self.test(Test::NotEquals(code.to_owned()))
    }

    #[must_use]
    pub fn contains(self, text: &str) -> Condition {
        self.test(Test::Contains(text.to_owned()))
    }

    #[must_use]
    pub fn in_list<I, S>(self, codes: I) -> Condition
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.test(Test::InList(codes.into_iter().map(Into::into).collect()))
    }

    fn test(self, test: Test) -> Condition {
        Condition {
            option_key: self.key,
            test,
        }
    }
}

/// Start a condition on the option with the given key.
#[must_use]
pub fn option(key: &str) -> OptionExpr {
    OptionExpr {
        key: key.to_owned(),
    }
}

#[must_use]
pub fn show_option(target: &str) -> Effect {
    Effect::ShowOption {
        target: target.to_owned(),
    }
}

#[must_use]
pub fn hide_option(target: &str) -> Effect {
    Effect::HideOption {
        target: target.to_owned(),
    }
}

#[must_use]
pub fn require_option(target: &str) -> Effect {
    Effect::RequireOption {
        target: target.to_owned(),
    }
}

#[must_use]
pub fn set_default(target: &str, code: &str) -> Effect {
    Effect::SetDefault {
        target: target.to_owned(),
        value: code.to_owned(),
    }
}

#[must_use]
pub fn filter_values<I, S>(target: &str, codes: I) -> Effect
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Effect::FilterValues {
        target: target.to_owned(),
        values: codes.into_iter().map(Into::into).collect(),
    }
}
