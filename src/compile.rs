use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::{
    CompiledCondition, CompiledEffect, CompiledRule, CompiledTest, OptionRegistry,
};
use crate::{
    AuthoringError, Effect, MatchPolicy, OptionRuleSet, ProductOption, Rule, SkipReason,
    SkippedRule, Test,
};

// -- Lenient snapshot compilation -------------------------------------------

pub(crate) fn compile(
    options: &[ProductOption],
    rules: &[Rule],
    policy: MatchPolicy,
) -> OptionRuleSet {
    let mut registry = OptionRegistry::new();
    for (i, option) in options.iter().enumerate() {
        registry.register(&option.key, i);
    }

    let value_index: Vec<HashMap<String, usize>> = options
        .iter()
        .map(|option| build_value_index(option, policy))
        .collect();

    let mut compiled = Vec::with_capacity(rules.len());
    let mut skipped = Vec::new();

    for rule in rules {
        match compile_rule(rule, &registry, &value_index) {
            Ok(c) => compiled.push(c),
            Err(reason) => {
                skipped.push(SkippedRule {
                    rule_id: rule.id.clone(),
                    reason,
                });
            }
        }
    }

    OptionRuleSet {
        options: options.to_vec(),
        registry,
        value_index,
        rules: compiled,
        skipped,
        policy,
    }
}

/// Ids are inserted first so an exact code match overrides an id alias.
fn build_value_index(option: &ProductOption, policy: MatchPolicy) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(option.values.len() * 2);
    if policy == MatchPolicy::CodeOrId {
        for (i, value) in option.values.iter().enumerate() {
            index.entry(value.id.clone()).or_insert(i);
        }
    }
    let mut seen = HashSet::new();
    for (i, value) in option.values.iter().enumerate() {
        if seen.insert(value.code.as_str()) {
            index.insert(value.code.clone(), i);
        }
    }
    index
}

fn compile_rule(
    rule: &Rule,
    registry: &OptionRegistry,
    value_index: &[HashMap<String, usize>],
) -> Result<CompiledRule, SkipReason> {
    let option = registry
        .get(&rule.condition.option_key)
        .ok_or(SkipReason::UnknownConditionOption)?;
    let target = registry
        .get(rule.effect.target())
        .ok_or(SkipReason::UnknownTargetOption)?;

    let condition_values = &value_index[option];
    let lookup = |code: &String| condition_values.get(code).copied();

    let test = match &rule.condition.test {
        Test::Equals(code) => {
            CompiledTest::Equals(lookup(code).ok_or(SkipReason::UnknownConditionValue)?)
        }
        Test::NotEquals(code) => {
            CompiledTest::NotEquals(lookup(code).ok_or(SkipReason::UnknownConditionValue)?)
        }
        Test::Contains(text) => CompiledTest::Contains(text.to_lowercase()),
        Test::InList(codes) => {
            let resolved: Vec<usize> = codes.iter().filter_map(lookup).collect();
            if resolved.is_empty() {
                return Err(SkipReason::UnknownConditionValue);
            }
            CompiledTest::InList(resolved)
        }
    };

    let target_values = &value_index[target];
    let effect = match &rule.effect {
        Effect::ShowOption { .. } => CompiledEffect::Show(target),
        Effect::HideOption { .. } => CompiledEffect::Hide(target),
        Effect::RequireOption { .. } => CompiledEffect::Require(target),
        Effect::SetDefault { value, .. } => CompiledEffect::SetDefault {
            target,
            value: target_values
                .get(value)
                .copied()
                .ok_or(SkipReason::UnknownTargetValue)?,
        },
        Effect::FilterValues { values, .. } => {
            let keep: Vec<usize> = values
                .iter()
                .filter_map(|code| target_values.get(code).copied())
                .collect();
            if keep.is_empty() {
                return Err(SkipReason::UnknownTargetValue);
            }
            CompiledEffect::FilterValues { target, keep }
        }
    };

    Ok(CompiledRule {
        id: rule.id.clone(),
        condition: CompiledCondition { option, test },
        effect,
    })
}

// -- Strict authoring validation --------------------------------------------

pub(crate) fn validate(options: &[ProductOption], rules: &[Rule]) -> Result<(), AuthoringError> {
    let option_map = check_options(options)?;
    check_duplicate_rules(rules)?;
    for rule in rules {
        check_rule(rule, &option_map)?;
    }
    check_default_cycles(rules)
}

fn check_options(
    options: &[ProductOption],
) -> Result<HashMap<&str, &ProductOption>, AuthoringError> {
    let mut map = HashMap::with_capacity(options.len());
    for option in options {
        if map.insert(option.key.as_str(), option).is_some() {
            return Err(AuthoringError::DuplicateOption {
                key: option.key.clone(),
            });
        }
        if option.values.is_empty() {
            return Err(AuthoringError::EmptyOption {
                key: option.key.clone(),
            });
        }
        let mut codes = HashSet::new();
        for value in &option.values {
            if !codes.insert(value.code.as_str()) {
                return Err(AuthoringError::DuplicateValue {
                    key: option.key.clone(),
                    code: value.code.clone(),
                });
            }
        }
    }
    Ok(map)
}

fn check_duplicate_rules(rules: &[Rule]) -> Result<(), AuthoringError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(&rule.id) {
            return Err(AuthoringError::DuplicateRule {
                id: rule.id.clone(),
            });
        }
    }
    Ok(())
}

fn check_rule(rule: &Rule, options: &HashMap<&str, &ProductOption>) -> Result<(), AuthoringError> {
    let condition_key = rule.condition.option_key.as_str();
    let target_key = rule.effect.target();

    let condition_option = lookup_option(rule, condition_key, options)?;
    let target_option = lookup_option(rule, target_key, options)?;

    if rule.is_self_referential() {
        return Err(AuthoringError::SelfReference {
            rule: rule.id.clone(),
            key: condition_key.to_owned(),
        });
    }

    match &rule.condition.test {
        Test::Equals(code) | Test::NotEquals(code) => {
            check_code(rule, condition_option, code)?;
        }
        Test::Contains(text) => {
            if text.is_empty() {
                return Err(empty_value(rule));
            }
        }
        Test::InList(codes) => {
            if codes.is_empty() {
                return Err(empty_value(rule));
            }
            for code in codes {
                check_code(rule, condition_option, code)?;
            }
        }
    }

    match &rule.effect {
        Effect::SetDefault { value, .. } => check_code(rule, target_option, value)?,
        Effect::FilterValues { values, .. } => {
            if values.is_empty() {
                return Err(empty_value(rule));
            }
            for code in values {
                check_code(rule, target_option, code)?;
            }
        }
        Effect::ShowOption { .. } | Effect::HideOption { .. } | Effect::RequireOption { .. } => {}
    }

    Ok(())
}

fn lookup_option<'a>(
    rule: &Rule,
    key: &str,
    options: &HashMap<&str, &'a ProductOption>,
) -> Result<&'a ProductOption, AuthoringError> {
    options
        .get(key)
        .copied()
        .ok_or_else(|| AuthoringError::UnknownOption {
            rule: rule.id.clone(),
            key: key.to_owned(),
        })
}

/// Authoring accepts canonical codes only.
fn check_code(rule: &Rule, option: &ProductOption, code: &str) -> Result<(), AuthoringError> {
    if code.is_empty() {
        return Err(empty_value(rule));
    }
    if option.values.iter().any(|v| v.code == code) {
        Ok(())
    } else {
        Err(AuthoringError::UnknownValue {
            rule: rule.id.clone(),
            key: option.key.clone(),
            code: code.to_owned(),
        })
    }
}

fn empty_value(rule: &Rule) -> AuthoringError {
    AuthoringError::EmptyValue {
        rule: rule.id.clone(),
    }
}

// -- set_default cycles -----------------------------------------------------

/// Edges run from a `set_default` rule's condition option to its target.
/// Applying a default is a new selection, so a cycle here can oscillate
/// across re-evaluations.
fn default_edges(rules: &[Rule]) -> Vec<(&str, &str)> {
    rules
        .iter()
        .filter(|r| matches!(r.effect, Effect::SetDefault { .. }))
        .map(|r| (r.condition.option_key.as_str(), r.effect.target()))
        .collect()
}

/// Kahn's algorithm over the `set_default` graph; a leftover node means a cycle.
fn check_default_cycles(rules: &[Rule]) -> Result<(), AuthoringError> {
    let edges = default_edges(rules);
    if edges.is_empty() {
        return Ok(());
    }

    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();

    for &(from, to) in &edges {
        in_degree.entry(from).or_insert(0);
        *in_degree.entry(to).or_insert(0) += 1;
        dependents.entry(from).or_default().push(to);
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(name, _)| *name)
        .collect();

    let mut visited = 0;
    while let Some(node) = queue.pop_front() {
        visited += 1;
        if let Some(next) = dependents.get(node) {
            for &dependent in next {
                if let Some(deg) = in_degree.get_mut(dependent) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }
    }

    if visited == in_degree.len() {
        return Ok(());
    }

    Err(AuthoringError::CyclicDefaults {
        path: cycle_path(&edges, &dependents),
    })
}

/// Walk the default graph from each condition option in rule order and return
/// the first closed loop, e.g. `[heading, hardware, heading]`.
fn cycle_path(edges: &[(&str, &str)], targets: &HashMap<&str, Vec<&str>>) -> Vec<String> {
    let mut finished: HashSet<&str> = HashSet::new();

    for &(start, _) in edges {
        if finished.contains(start) {
            continue;
        }
        // Each frame is an option key and the index of its next unexplored target.
        let mut path: Vec<(&str, usize)> = vec![(start, 0)];
        while let Some(frame) = path.last_mut() {
            let (key, next) = *frame;
            frame.1 += 1;

            let Some(&target) = targets.get(key).and_then(|t| t.get(next)) else {
                finished.insert(key);
                path.pop();
                continue;
            };
            if let Some(at) = path.iter().position(|&(k, _)| k == target) {
                let mut cycle: Vec<String> =
                    path[at..].iter().map(|&(k, _)| k.to_owned()).collect();
                cycle.push(target.to_owned());
                return cycle;
            }
            if !finished.contains(target) {
                path.push((target, 0));
            }
        }
    }

    Vec::new()
}
