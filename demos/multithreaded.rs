use std::sync::Arc;
use std::thread;

use optrule::{option, require_option, show_option, CatalogBuilder, ProductOption, SelectionState};

fn main() {
    let rules = Arc::new(
        CatalogBuilder::new()
            .option(ProductOption::new("control", "Control").value("chain", "Chain").value("motor", "Motor"))
            .option(ProductOption::new("motor_side", "Motor side").value("left", "Left").value("right", "Right").hidden())
            .rule("motor_side", |r| {
                r.when(option("control").equals("motor")).then(show_option("motor_side"))
            })
            .rule("motor_needs_side", |r| {
                r.when(option("control").equals("motor")).then(require_option("motor_side"))
            })
            .compile()
            .expect("failed to compile catalog"),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let rs = Arc::clone(&rules);
            thread::spawn(move || {
                let control = if i % 2 == 0 { "chain" } else { "motor" };
                let views = rs.evaluate(&SelectionState::new().set("control", control));
                let side = views.get("motor_side").map(ToString::to_string);
                println!("Thread {i} ({control}): {side:?}");
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
