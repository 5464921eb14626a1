use optrule::{
    filter_values, hide_option, option, require_option, show_option, Catalog, ProductOption, Rule,
    SelectionState,
};

fn main() {
    let catalog = Catalog::new(
        vec![
            ProductOption::new("heading", "Heading")
                .value("wave", "S-Fold Wave")
                .value("pinch", "Pinch pleat"),
            ProductOption::new("hardware", "Hardware")
                .value("track", "Track")
                .value("rod", "Rod"),
            ProductOption::new("wand", "Wand").value("short", "Short").value("long", "Long"),
        ],
        vec![
            Rule::new("wave_on_track", option("heading").equals("wave"), filter_values("hardware", ["track"])),
            Rule::new("wave_wand", option("heading").equals("wave"), show_option("wand")),
            Rule::new("pinch_no_wand", option("heading").not_equals("wave"), hide_option("wand")),
            Rule::new("lined_weight", option("lining").equals("blockout"), require_option("hardware")),
        ],
    );

    let rules = catalog.compile();
    let report = rules.evaluate_detailed(&SelectionState::new().set("heading", "wave"));

    println!("{report}");
    println!();
    println!("Rules that fired: {:?}", report.fired());
    println!("Inert rules: {:?}", report.skipped());
    println!("Duration: {:?}", report.duration());
}
