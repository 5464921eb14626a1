use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::AuthoringError;
use super::evaluation_report::{EvaluationReport, SkippedRule};
use super::option::{OptionValue, ProductOption};
use super::registry::OptionRegistry;
use super::rule::{CompiledRule, Condition, Effect, Rule};
use super::selection::SelectionState;
use super::view::DerivedViews;

/// Which `OptionValue` field a code in a rule or selection may match.
///
/// `code` is canonical. Rows written by older rule editors sometimes stored a
/// value's `id` instead; `CodeOrId` lets those resolve, with an exact `code`
/// match taking precedence over an `id` match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    CodeOnly,
    #[default]
    CodeOrId,
}

/// The authored inputs for one product template: its options and the rules
/// over them, in stored order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub options: Vec<ProductOption>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Catalog {
    #[must_use]
    pub fn new(options: Vec<ProductOption>, rules: Vec<Rule>) -> Self {
        Self { options, rules }
    }

    /// Check the catalog the way a rule editor must before saving it.
    ///
    /// # Errors
    ///
    /// Returns the first [`AuthoringError`] found.
    pub fn validate(&self) -> Result<(), AuthoringError> {
        crate::compile::validate(&self.options, &self.rules)
    }

    /// [`validate()`](Self::validate) and hand the catalog back, for chaining
    /// after a loader.
    ///
    /// ```
    /// # use optrule::{Catalog, OptruleError};
    /// let err = Catalog::from_dsl("option a:\n    x\nrule r:\n    when b == x then show_option a")
    ///     .and_then(Catalog::validated)
    ///     .unwrap_err();
    /// assert!(matches!(err, OptruleError::Authoring(_)));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`OptruleError::Authoring`](crate::OptruleError::Authoring)
    /// with the first [`AuthoringError`] found.
    pub fn validated(self) -> Result<Self, crate::OptruleError> {
        self.validate()?;
        Ok(self)
    }

    /// Compile into an evaluation snapshot with the default [`MatchPolicy`].
    ///
    /// Never fails: rules with malformed references are kept out of the
    /// snapshot and reported by [`OptionRuleSet::skipped_rules()`].
    #[must_use]
    pub fn compile(&self) -> OptionRuleSet {
        self.compile_with(MatchPolicy::default())
    }

    /// Compile with an explicit [`MatchPolicy`], logging each inert rule at
    /// debug level.
    #[must_use]
    pub fn compile_with(&self, policy: MatchPolicy) -> OptionRuleSet {
        let set = crate::compile::compile(&self.options, &self.rules, policy);
        for skipped in set.skipped_rules() {
            tracing::debug!(rule = %skipped.rule_id, reason = %skipped.reason, "rule is inert");
        }
        set
    }

    /// Parse a catalog from its JSON wire shape.
    ///
    /// # Errors
    ///
    /// Returns [`OptruleError::Json`](crate::OptruleError::Json) if the document
    /// is not valid JSON or carries invalid authoring input.
    pub fn from_json(input: &str) -> Result<Self, crate::OptruleError> {
        let catalog: Catalog = serde_json::from_str(input)?;
        tracing::debug!(
            options = catalog.options.len(),
            rules = catalog.rules.len(),
            "loaded catalog from json"
        );
        Ok(catalog)
    }

    /// Read a JSON file and parse the catalog it contains.
    ///
    /// # Errors
    ///
    /// Returns [`OptruleError`](crate::OptruleError) on I/O or JSON failure.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::OptruleError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_json(&input)
    }

    /// Render the catalog in its JSON wire shape.
    ///
    /// # Errors
    ///
    /// Returns [`OptruleError::Json`](crate::OptruleError::Json) if encoding fails.
    pub fn to_json(&self) -> Result<String, crate::OptruleError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a catalog from the text DSL.
    ///
    /// # Errors
    ///
    /// Returns [`OptruleError::Parse`](crate::OptruleError::Parse) on invalid syntax.
    pub fn from_dsl(input: &str) -> Result<Self, crate::OptruleError> {
        let parsed = crate::parse::parse(input)?;
        tracing::debug!(
            options = parsed.options.len(),
            rules = parsed.rules.len(),
            "parsed catalog dsl"
        );
        Ok(Self::new(parsed.options, parsed.rules))
    }

    /// Read a DSL file and parse the catalog it contains.
    ///
    /// # Errors
    ///
    /// Returns [`OptruleError`](crate::OptruleError) on I/O or parse failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::OptruleError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_dsl(&input)
    }
}

#[cfg(feature = "binary-cache")]
impl Catalog {
    /// Serialize this catalog to a binary snapshot.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the
    /// payload metadata so a stale cache can be detected with
    /// [`cache_matches_source`](Self::cache_matches_source).
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Deserialize a catalog previously produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// Whether a snapshot was produced from exactly this source text.
    ///
    /// Snapshots written without source text never match.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) if the
    /// snapshot itself is unreadable.
    pub fn cache_matches_source(
        bytes: &[u8],
        source_text: &str,
    ) -> Result<bool, crate::serial::DeserializeError> {
        let stored = crate::serial::source_digest(bytes)?;
        Ok(stored == Some(*blake3::hash(source_text.as_bytes()).as_bytes()))
    }

    /// Serialize this catalog and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a file and deserialize the catalog snapshot it contains.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

/// Builder for constructing a [`Catalog`] in code.
///
/// # Example
///
/// ```
/// use optrule::{option, show_option, CatalogBuilder, ProductOption, SelectionState};
///
/// let rules = CatalogBuilder::new()
///     .option(ProductOption::new("control", "Control").value("chain", "Chain").value("motor", "Motor"))
///     .option(ProductOption::new("chain_length", "Chain length").value("short", "Short").hidden())
///     .rule("chain_shows_length", |r| {
///         r.when(option("control").equals("chain")).then(show_option("chain_length"))
///     })
///     .compile()
///     .unwrap();
///
/// let views = rules.evaluate(&SelectionState::new().set("control", "chain"));
/// assert!(views.get("chain_length").unwrap().visible);
/// ```
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    options: Vec<ProductOption>,
    rules: Vec<PendingRule>,
}

#[derive(Debug)]
struct PendingRule {
    id: String,
    condition: Option<Condition>,
    effect: Option<Effect>,
    description: Option<String>,
}

/// Intermediate builder passed to the rule definition closure.
#[derive(Debug, Default)]
pub struct RuleBuilder {
    condition: Option<Condition>,
    effect: Option<Effect>,
    description: Option<String>,
}

impl RuleBuilder {
    /// Set the condition for this rule.
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Set the effect for this rule.
    #[must_use]
    pub fn then(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    #[must_use]
    pub fn describe(mut self, text: &str) -> Self {
        self.description = Some(text.to_owned());
        self
    }
}

impl CatalogBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn option(mut self, option: ProductOption) -> Self {
        self.options.push(option);
        self
    }

    /// Add several options at once, in order.
    #[must_use]
    pub fn options(mut self, options: impl IntoIterator<Item = ProductOption>) -> Self {
        self.options.extend(options);
        self
    }

    /// Define a rule. The closure must call both `.when()` and `.then()`.
    #[must_use]
    pub fn rule(mut self, id: &str, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        let builder = f(RuleBuilder::default());
        self.rules.push(PendingRule {
            id: id.to_owned(),
            condition: builder.condition,
            effect: builder.effect,
            description: builder.description,
        });
        self
    }

    /// Assemble the catalog without checking references.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::IncompleteRule`] if a rule lacks `when` or `then`.
    pub fn build(self) -> Result<Catalog, AuthoringError> {
        let rules = self
            .rules
            .into_iter()
            .map(|pending| {
                let condition = pending.condition.ok_or_else(|| AuthoringError::IncompleteRule {
                    rule: pending.id.clone(),
                    missing: "when",
                })?;
                let effect = pending.effect.ok_or_else(|| AuthoringError::IncompleteRule {
                    rule: pending.id.clone(),
                    missing: "then",
                })?;
                Ok(Rule {
                    id: pending.id,
                    condition,
                    effect,
                    description: pending.description,
                })
            })
            .collect::<Result<Vec<_>, AuthoringError>>()?;
        Ok(Catalog::new(self.options, rules))
    }

    /// Build, validate, and compile the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError`] if the rules would be rejected by a rule editor.
    pub fn compile(self) -> Result<OptionRuleSet, AuthoringError> {
        let catalog = self.build()?;
        catalog.validate()?;
        Ok(catalog.compile())
    }
}

/// A compiled, immutable snapshot of one catalog. Thread-safe and designed to
/// live behind `Arc`; recompile when the catalog is refetched.
#[derive(Debug)]
pub struct OptionRuleSet {
    pub(crate) options: Vec<ProductOption>,
    pub(crate) registry: OptionRegistry,
    /// Per option: accepted match key -> value index.
    pub(crate) value_index: Vec<HashMap<String, usize>>,
    pub(crate) rules: Vec<CompiledRule>,
    pub(crate) skipped: Vec<SkippedRule>,
    pub(crate) policy: MatchPolicy,
}

impl OptionRuleSet {
    /// Compute one derived view per option for the given selections.
    ///
    /// Pure and single-pass: applying a returned default is the caller's job,
    /// followed by another call (see [`FormSession`](crate::FormSession)).
    pub fn evaluate(&self, selections: &SelectionState) -> DerivedViews {
        crate::evaluate::run(self, selections, None)
    }

    /// Evaluate with diagnostics: which rules fired, which were inert, and timing.
    pub fn evaluate_detailed(&self, selections: &SelectionState) -> EvaluationReport {
        let start = std::time::Instant::now();
        let mut fired = Vec::new();
        let views = crate::evaluate::run(self, selections, Some(&mut fired));
        EvaluationReport::new(views, fired, self.skipped.clone(), start.elapsed())
    }

    /// The options of the snapshot, in catalog order.
    #[must_use]
    pub fn options(&self) -> &[ProductOption] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, key: &str) -> Option<&ProductOption> {
        self.registry.get(key).map(|i| &self.options[i])
    }

    /// Resolve a code (or, under [`MatchPolicy::CodeOrId`], an id) to a value
    /// of the given option.
    #[must_use]
    pub fn resolve_value(&self, key: &str, code: &str) -> Option<&OptionValue> {
        let option = self.registry.get(key)?;
        self.resolve_index(option, code)
            .map(|i| &self.options[option].values[i])
    }

    pub(crate) fn resolve_index(&self, option: usize, code: &str) -> Option<usize> {
        self.value_index[option].get(code).copied()
    }

    /// Number of rules that take part in evaluation.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Ids of the active rules, in stored order.
    #[must_use]
    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id.as_str()).collect()
    }

    /// Rules left out because of malformed references.
    #[must_use]
    pub fn skipped_rules(&self) -> &[SkippedRule] {
        &self.skipped
    }

    #[must_use]
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    #[must_use]
    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }
}

impl fmt::Display for OptionRuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OptionRuleSet({} options, {} rules, {} skipped)",
            self.options.len(),
            self.rules.len(),
            self.skipped.len(),
        )
    }
}
