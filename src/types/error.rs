use thiserror::Error;

/// Reasons a catalog is rejected at the authoring boundary.
///
/// The evaluator itself never produces these: at evaluation time a malformed
/// rule is simply inert. See [`Catalog::validate()`](super::Catalog::validate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthoringError {
    #[error("duplicate option key '{key}'")]
    DuplicateOption { key: String },

    #[error("option '{key}' has no values")]
    EmptyOption { key: String },

    #[error("option '{key}' defines value code '{code}' more than once")]
    DuplicateValue { key: String, code: String },

    #[error("duplicate rule id '{id}'")]
    DuplicateRule { id: String },

    #[error("rule '{rule}' references unknown option '{key}'")]
    UnknownOption { rule: String, key: String },

    #[error("rule '{rule}' references unknown value '{code}' of option '{key}'")]
    UnknownValue {
        rule: String,
        key: String,
        code: String,
    },

    #[error("rule '{rule}' is missing a {missing} clause")]
    IncompleteRule { rule: String, missing: &'static str },

    #[error("rule '{rule}' has an empty value")]
    EmptyValue { rule: String },

    #[error("rule '{rule}' targets its own condition option '{key}'")]
    SelfReference { rule: String, key: String },

    #[error("cyclic set_default chain: {}", path.join(" -> "))]
    CyclicDefaults { path: Vec<String> },
}
