use criterion::{black_box, criterion_group, criterion_main, Criterion};
use optrule::{
    filter_values, option, require_option, set_default, show_option, Catalog, FormSession,
    OptionRuleSet, ProductOption, Rule, SelectionState,
};

/// Build a catalog with `n` options of four values each, where option `i`
/// drives option `i + 1` through a rotating mix of effects.
fn build_catalog(n: usize) -> Catalog {
    let options: Vec<ProductOption> = (0..n)
        .map(|i| {
            (0..4).fold(ProductOption::new(format!("o{i}"), format!("Option {i}")), |o, v| {
                o.value(&format!("v{v}"), &format!("Value {v}"))
            })
        })
        .collect();

    let rules: Vec<Rule> = (0..n.saturating_sub(1))
        .map(|i| {
            let source = format!("o{i}");
            let target = format!("o{}", i + 1);
            let effect = match i % 4 {
                0 => show_option(&target),
                1 => require_option(&target),
                2 => set_default(&target, "v1"),
                _ => filter_values(&target, ["v0", "v1", "v2"]),
            };
            let condition = if i % 2 == 0 {
                option(&source).equals("v0")
            } else {
                option(&source).in_list(["v0", "v2"])
            };
            Rule::new(format!("r{i}"), condition, effect)
        })
        .collect();

    Catalog::new(options, rules)
}

fn half_selected(n: usize) -> SelectionState {
    let mut sel = SelectionState::new();
    for i in (0..n).step_by(2) {
        sel.insert(&format!("o{i}"), "v0");
    }
    sel
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_eval");

    for &n in &[5, 20, 50] {
        let catalog = build_catalog(n);
        let rules = catalog.compile();
        let sel = half_selected(n);

        group.bench_function(&format!("{n}_options_compiled"), |b| {
            b.iter(|| rules.evaluate(black_box(&sel)));
        });

        group.bench_function(&format!("{n}_options_uncompiled"), |b| {
            b.iter(|| optrule::evaluate(&catalog.options, &catalog.rules, black_box(&sel)));
        });
    }

    group.finish();
}

fn bench_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("compilation");

    for &n in &[5, 20, 50] {
        let catalog = build_catalog(n);
        group.bench_function(&format!("{n}_options"), |b| {
            b.iter(|| black_box(catalog.compile()));
        });
        group.bench_function(&format!("{n}_options_validate"), |b| {
            b.iter(|| black_box(catalog.validate()));
        });
    }

    group.finish();
}

fn bench_settle(c: &mut Criterion) {
    let mut group = c.benchmark_group("settle");

    for &n in &[5, 20, 50] {
        let rules: std::sync::Arc<OptionRuleSet> = std::sync::Arc::new(build_catalog(n).compile());
        group.bench_function(&format!("{n}_options"), |b| {
            b.iter(|| {
                let mut session = FormSession::new(std::sync::Arc::clone(&rules));
                session.select("o0", "v0");
                black_box(session.settle())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_compilation, bench_settle);
criterion_main!(benches);
