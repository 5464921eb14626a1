use optrule::{Catalog, SelectionState};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let catalog = match Catalog::from_file("demos/blind.optr").and_then(Catalog::validated) {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("catalog rejected: {err}");
            return;
        }
    };

    let rules = catalog.compile();
    println!("{rules}");

    for control in ["chain", "cord", "motor"] {
        let views = rules.evaluate(&SelectionState::new().set("control", control));
        println!("\ncontrol = {control}\n{views}");
    }
}
