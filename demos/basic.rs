use optrule::{option, set_default, show_option, CatalogBuilder, ProductOption, SelectionState};

fn main() {
    // Define options and rules
    let rules = CatalogBuilder::new()
        .option(
            ProductOption::new("control", "Control")
                .value("chain", "Chain")
                .value("motor", "Motor")
                .required(),
        )
        .option(
            ProductOption::new("chain_length", "Chain length")
                .value("short", "Short")
                .value("long", "Long")
                .hidden(),
        )
        .rule("chain_shows_length", |r| {
            r.when(option("control").equals("chain"))
                .then(show_option("chain_length"))
        })
        .rule("chain_defaults_long", |r| {
            r.when(option("control").equals("chain"))
                .then(set_default("chain_length", "long"))
        })
        .compile()
        .expect("failed to compile catalog");

    println!("{rules}");

    // Evaluate against the user's selections
    let selections = SelectionState::new().set("control", "chain");
    println!("{}", rules.evaluate(&selections));
}
