use std::sync::Arc;

use optrule::{Catalog, FormSession};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("optrule=debug")),
        )
        .init();

    let catalog = Catalog::from_file("demos/blind.optr").expect("failed to load catalog");
    let mut session = FormSession::new(Arc::new(catalog.compile()));

    session.select("control", "chain");
    let settled = session.settle();
    println!("settled after {} passes (converged: {})", settled.passes, settled.converged);

    for (key, selection) in session.selections().iter() {
        println!("{key} = {selection}");
    }
    println!("\n{}", session.views());
}
