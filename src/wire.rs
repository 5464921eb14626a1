//! JSON wire shapes for rules.
//!
//! Rule editors store rules with loosely typed `operator`/`action` strings and
//! a `value`/`target_value` that is either one code or a list of codes.
//! [`RawRule`] mirrors that shape exactly; converting it into a [`Rule`]
//! rejects combinations the typed model cannot represent.
//!
//! ```json
//! {
//!   "id": "r1",
//!   "condition": { "option_key": "control", "operator": "in_list", "value": ["chain", "cord"] },
//!   "effect": { "action": "set_default", "target_option_key": "chain_length", "target_value": "long" },
//!   "description": "corded blinds default to long"
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Action, Condition, Effect, Operator, Rule, Test};

/// A single code or a list of codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCondition {
    pub option_key: String,
    pub operator: Operator,
    pub value: StringOrList,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEffect {
    pub action: Action,
    pub target_option_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<StringOrList>,
}

/// A rule exactly as rule editors persist it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRule {
    pub id: String,
    pub condition: RawCondition,
    pub effect: RawEffect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A wire rule whose fields do not fit its operator or action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("rule '{rule}': operator {operator} takes a single value, got a list")]
    ListForSingleOperator { rule: String, operator: Operator },

    #[error("rule '{rule}': {action} requires a target_value")]
    MissingTargetValue { rule: String, action: Action },

    #[error("rule '{rule}': set_default takes a single target_value, got a list")]
    ListDefault { rule: String },

    #[error("rule '{rule}': filter_values requires a non-empty list")]
    EmptyFilter { rule: String },
}

impl TryFrom<RawRule> for Rule {
    type Error = WireError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let id = raw.id;

        let test = match (raw.condition.operator, raw.condition.value) {
            (Operator::InList, StringOrList::List(codes)) => Test::InList(codes),
            // A lone string is a one-element list.
            (Operator::InList, StringOrList::One(code)) => Test::InList(vec![code]),
            (operator, StringOrList::List(_)) => {
                return Err(WireError::ListForSingleOperator { rule: id, operator });
            }
            (Operator::Equals, StringOrList::One(code)) => Test::Equals(code),
            (Operator::NotEquals, StringOrList::One(code)) => Test::NotEquals(code),
            (Operator::Contains, StringOrList::One(text)) => Test::Contains(text),
        };

        let target = raw.effect.target_option_key;
        let effect = match (raw.effect.action, raw.effect.target_value) {
            (Action::ShowOption, _) => Effect::ShowOption { target },
            (Action::HideOption, _) => Effect::HideOption { target },
            (Action::RequireOption, _) => Effect::RequireOption { target },
            (Action::SetDefault, Some(StringOrList::One(value))) => {
                Effect::SetDefault { target, value }
            }
            (Action::SetDefault, Some(StringOrList::List(_))) => {
                return Err(WireError::ListDefault { rule: id });
            }
            (Action::FilterValues, Some(StringOrList::List(values))) => {
                if values.is_empty() {
                    return Err(WireError::EmptyFilter { rule: id });
                }
                Effect::FilterValues { target, values }
            }
            (Action::FilterValues, Some(StringOrList::One(value))) => Effect::FilterValues {
                target,
                values: vec![value],
            },
            (action, None) => return Err(WireError::MissingTargetValue { rule: id, action }),
        };

        Ok(Rule {
            id,
            condition: Condition {
                option_key: raw.condition.option_key,
                test,
            },
            effect,
            description: raw.description,
        })
    }
}

impl From<Rule> for RawRule {
    fn from(rule: Rule) -> Self {
        let operator = rule.condition.test.operator();
        let value = match rule.condition.test {
            Test::Equals(v) | Test::NotEquals(v) | Test::Contains(v) => StringOrList::One(v),
            Test::InList(vs) => StringOrList::List(vs),
        };
        let action = rule.effect.action();
        let (target_option_key, target_value) = match rule.effect {
            Effect::ShowOption { target }
            | Effect::HideOption { target }
            | Effect::RequireOption { target } => (target, None),
            Effect::SetDefault { target, value } => (target, Some(StringOrList::One(value))),
            Effect::FilterValues { target, values } => (target, Some(StringOrList::List(values))),
        };

        RawRule {
            id: rule.id,
            condition: RawCondition {
                option_key: rule.condition.option_key,
                operator,
                value,
            },
            effect: RawEffect {
                action,
                target_option_key,
                target_value,
            },
            description: rule.description,
        }
    }
}
