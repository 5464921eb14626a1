use crate::{ProductOption, Rule};

/// The result of parsing a DSL input string, in source order.
#[derive(Debug, Default)]
pub struct ParsedCatalog {
    pub options: Vec<ProductOption>,
    pub rules: Vec<Rule>,
}
