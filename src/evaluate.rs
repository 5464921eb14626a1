use crate::types::{CompiledCondition, CompiledEffect, CompiledTest};
use crate::{DerivedOptionView, DerivedViews, OptionRuleSet, ProductOption, Rule, SelectionState};

/// Evaluate a rule set against the current selections in one pass.
///
/// Returns exactly one view per option, in option order. Rules that reference
/// unknown options or value codes are inert. This compiles a fresh snapshot
/// on every call; hold an [`OptionRuleSet`] to skip that step.
pub fn evaluate(
    options: &[ProductOption],
    rules: &[Rule],
    selections: &SelectionState,
) -> DerivedViews {
    crate::compile::compile(options, rules, crate::MatchPolicy::default()).evaluate(selections)
}

pub(crate) fn run(
    set: &OptionRuleSet,
    selections: &SelectionState,
    mut fired: Option<&mut Vec<String>>,
) -> DerivedViews {
    let options = &set.options;

    let mut shown = vec![false; options.len()];
    let mut hidden = vec![false; options.len()];
    let mut required: Vec<bool> = options.iter().map(|o| o.required).collect();
    let mut defaults: Vec<Option<usize>> = vec![None; options.len()];
    let mut allowed: Vec<Vec<bool>> = options.iter().map(|o| vec![true; o.values.len()]).collect();

    for rule in &set.rules {
        if !condition_matches(set, &rule.condition, selections) {
            continue;
        }
        if let Some(fired) = fired.as_mut() {
            fired.push(rule.id.clone());
        }
        match &rule.effect {
            CompiledEffect::Show(target) => shown[*target] = true,
            CompiledEffect::Hide(target) => hidden[*target] = true,
            CompiledEffect::Require(target) => required[*target] = true,
            CompiledEffect::SetDefault { target, value } => {
                // First write wins, and only while the user has not chosen.
                if defaults[*target].is_none() && !selections.is_selected(&options[*target].key) {
                    defaults[*target] = Some(*value);
                }
            }
            CompiledEffect::FilterValues { target, keep } => {
                for (i, slot) in allowed[*target].iter_mut().enumerate() {
                    if !keep.contains(&i) {
                        *slot = false;
                    }
                }
            }
        }
    }

    let views = options
        .iter()
        .enumerate()
        .map(|(i, option)| DerivedOptionView {
            key: option.key.clone(),
            // An explicit show beats a hide fired in the same pass.
            visible: if shown[i] {
                true
            } else if hidden[i] {
                false
            } else {
                option.visible
            },
            required: required[i],
            allowed_values: option
                .values
                .iter()
                .zip(&allowed[i])
                .filter(|(_, keep)| **keep)
                .map(|(value, _)| value.clone())
                .collect(),
            default_value: defaults[i].map(|v| option.values[v].clone()),
        })
        .collect();

    DerivedViews::new(views)
}

/// An unselected option only satisfies `not_equals`. With several selected
/// codes, `not_equals` needs all of them to differ; the other tests need any
/// one of them to match.
fn condition_matches(
    set: &OptionRuleSet,
    condition: &CompiledCondition,
    selections: &SelectionState,
) -> bool {
    let option = condition.option;
    let Some(selection) = selections.get(&set.options[option].key) else {
        return matches!(condition.test, CompiledTest::NotEquals(_));
    };
    let codes = selection.codes();
    let resolve = |code: &String| set.resolve_index(option, code);

    match &condition.test {
        CompiledTest::Equals(value) => codes.iter().any(|c| resolve(c) == Some(*value)),
        CompiledTest::NotEquals(value) => !codes.iter().any(|c| resolve(c) == Some(*value)),
        CompiledTest::InList(values) => codes
            .iter()
            .any(|c| resolve(c).is_some_and(|i| values.contains(&i))),
        CompiledTest::Contains(needle) => codes.iter().any(|c| match resolve(c) {
            Some(i) => {
                let value = &set.options[option].values[i];
                contains_folded(&value.code, needle) || contains_folded(&value.label, needle)
            }
            // A stale selection still has its raw code to search.
            None => contains_folded(c, needle),
        }),
    }
}

fn contains_folded(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}
