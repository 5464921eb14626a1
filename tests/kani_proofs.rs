#![cfg(kani)]
//! Kani proof harnesses for the optrule evaluation model.
//!
//! These harnesses verify the conflict-resolution invariants of the evaluator
//! using a model that mirrors the semantics of `evaluate` without `String`,
//! hash maps, or `Vec`.
//!
//! Model:
//! - Each option has up to 8 values; allowed values are a `u8` bitmask.
//! - A selection is one value index, or `NONE` for unselected.
//! - Conditions: 0 = equals, 1 = not_equals, 2 = in_list (bitmask).
//! - Effects: 0 = show, 1 = hide, 2 = require, 3 = set_default, 4 = filter (bitmask).
//! - Rules apply in index order; show beats hide; the first default wins;
//!   filters intersect.
//!
//! Run with: `cargo kani --tests --harness <harness_name>`

/// Maximum number of options / rules for bounded proofs.
const MAX_N: usize = 4;

/// Sentinel for an unselected option.
const NONE: u8 = u8::MAX;

#[derive(Clone, Copy)]
struct ModelRule {
    cond_option: usize,
    cond_op: u8,
    cond_value: u8,
    cond_mask: u8,
    effect: u8,
    target: usize,
    effect_value: u8,
    effect_mask: u8,
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct ModelView {
    visible: bool,
    required: bool,
    allowed: u8,
    default: u8,
}

fn fires(rule: &ModelRule, selection: &[u8; MAX_N]) -> bool {
    let picked = selection[rule.cond_option];
    if picked == NONE {
        return rule.cond_op == 1;
    }
    match rule.cond_op {
        0 => picked == rule.cond_value,
        1 => picked != rule.cond_value,
        _ => rule.cond_mask & (1 << picked) != 0,
    }
}

fn model_evaluate(
    n_options: usize,
    n_rules: usize,
    authored_visible: &[bool; MAX_N],
    authored_required: &[bool; MAX_N],
    selection: &[u8; MAX_N],
    rules: &[ModelRule; MAX_N],
) -> [ModelView; MAX_N] {
    let mut shown = [false; MAX_N];
    let mut hidden = [false; MAX_N];
    let mut views = [ModelView {
        visible: true,
        required: false,
        allowed: u8::MAX,
        default: NONE,
    }; MAX_N];

    let mut o: usize = 0;
    while o < n_options {
        views[o].required = authored_required[o];
        o += 1;
    }

    let mut i: usize = 0;
    while i < n_rules {
        let rule = &rules[i];
        if fires(rule, selection) {
            let t = rule.target;
            match rule.effect {
                0 => shown[t] = true,
                1 => hidden[t] = true,
                2 => views[t].required = true,
                3 => {
                    if views[t].default == NONE && selection[t] == NONE {
                        views[t].default = rule.effect_value;
                    }
                }
                _ => views[t].allowed &= rule.effect_mask,
            }
        }
        i += 1;
    }

    let mut o: usize = 0;
    while o < n_options {
        views[o].visible = if shown[o] {
            true
        } else if hidden[o] {
            false
        } else {
            authored_visible[o]
        };
        o += 1;
    }
    views
}

/// Symbolic inputs constrained to well-formed indices.
fn any_inputs() -> (usize, usize, [bool; MAX_N], [bool; MAX_N], [u8; MAX_N], [ModelRule; MAX_N]) {
    let n_options: usize = kani::any();
    kani::assume(n_options >= 1 && n_options <= MAX_N);
    let n_rules: usize = kani::any();
    kani::assume(n_rules <= MAX_N);

    let authored_visible: [bool; MAX_N] = kani::any();
    let authored_required: [bool; MAX_N] = kani::any();
    let selection: [u8; MAX_N] = kani::any();

    let mut o: usize = 0;
    while o < n_options {
        kani::assume(selection[o] == NONE || selection[o] < 8);
        o += 1;
    }

    let mut rules = [ModelRule {
        cond_option: 0,
        cond_op: 0,
        cond_value: 0,
        cond_mask: 0,
        effect: 0,
        target: 0,
        effect_value: 0,
        effect_mask: 0,
    }; MAX_N];
    let mut i: usize = 0;
    while i < n_rules {
        let rule = ModelRule {
            cond_option: kani::any(),
            cond_op: kani::any(),
            cond_value: kani::any(),
            cond_mask: kani::any(),
            effect: kani::any(),
            target: kani::any(),
            effect_value: kani::any(),
            effect_mask: kani::any(),
        };
        kani::assume(rule.cond_option < n_options && rule.target < n_options);
        kani::assume(rule.cond_op < 3 && rule.effect < 5);
        kani::assume(rule.cond_value < 8 && rule.effect_value < 8);
        rules[i] = rule;
        i += 1;
    }

    (n_options, n_rules, authored_visible, authored_required, selection, rules)
}

// ---------------------------------------------------------------------------
// Proof 1: Panic freedom and determinism
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(6)]
fn panic_freedom_and_determinism() {
    let (n_options, n_rules, vis, req, sel, rules) = any_inputs();
    let a = model_evaluate(n_options, n_rules, &vis, &req, &sel, &rules);
    let b = model_evaluate(n_options, n_rules, &vis, &req, &sel, &rules);
    assert!(a == b);
}

// ---------------------------------------------------------------------------
// Proof 2: Show wins
//
// Any firing show rule makes its target visible, whatever else fired.
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(6)]
fn show_wins() {
    let (n_options, n_rules, vis, req, sel, rules) = any_inputs();
    let views = model_evaluate(n_options, n_rules, &vis, &req, &sel, &rules);

    let mut i: usize = 0;
    while i < n_rules {
        if rules[i].effect == 0 && fires(&rules[i], &sel) {
            assert!(views[rules[i].target].visible);
        }
        i += 1;
    }
}

// ---------------------------------------------------------------------------
// Proof 3: Filter intersection
//
// Allowed values are a subset of every firing filter's set.
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(6)]
fn filters_intersect() {
    let (n_options, n_rules, vis, req, sel, rules) = any_inputs();
    let views = model_evaluate(n_options, n_rules, &vis, &req, &sel, &rules);

    let mut i: usize = 0;
    while i < n_rules {
        if rules[i].effect == 4 && fires(&rules[i], &sel) {
            let allowed = views[rules[i].target].allowed;
            assert!(allowed & !rules[i].effect_mask == 0);
        }
        i += 1;
    }
}

// ---------------------------------------------------------------------------
// Proof 4: First write wins
//
// The default of an unselected option comes from the first firing
// set_default rule that targets it; a selected option has none.
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(6)]
fn first_default_wins() {
    let (n_options, n_rules, vis, req, sel, rules) = any_inputs();
    let views = model_evaluate(n_options, n_rules, &vis, &req, &sel, &rules);

    let mut o: usize = 0;
    while o < n_options {
        let mut expected = NONE;
        if sel[o] == NONE {
            let mut i: usize = 0;
            while i < n_rules {
                if rules[i].effect == 3 && rules[i].target == o && fires(&rules[i], &sel) {
                    expected = rules[i].effect_value;
                    break;
                }
                i += 1;
            }
        }
        assert!(views[o].default == expected);
        o += 1;
    }
}

// ---------------------------------------------------------------------------
// Proof 5: Default non-interference
//
// With no rules, every view is the authored default.
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(6)]
fn no_rules_is_authored() {
    let (n_options, _, vis, req, sel, rules) = any_inputs();
    let views = model_evaluate(n_options, 0, &vis, &req, &sel, &rules);

    let mut o: usize = 0;
    while o < n_options {
        assert!(views[o].visible == vis[o]);
        assert!(views[o].required == req[o]);
        assert!(views[o].allowed == u8::MAX);
        assert!(views[o].default == NONE);
        o += 1;
    }
}

// ---------------------------------------------------------------------------
// Proof 6: Required is monotonic
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(6)]
fn required_never_dropped() {
    let (n_options, n_rules, vis, req, sel, rules) = any_inputs();
    let views = model_evaluate(n_options, n_rules, &vis, &req, &sel, &rules);

    let mut o: usize = 0;
    while o < n_options {
        if req[o] {
            assert!(views[o].required);
        }
        o += 1;
    }
}
