mod error;
mod grammar;
mod parser;

pub use error::ParseError;
pub use parser::ParsedCatalog;

/// Parse a DSL input string into a [`ParsedCatalog`].
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid DSL syntax.
pub fn parse(input: &str) -> Result<ParsedCatalog, ParseError> {
    use winnow::Parser;
    grammar::parse_catalog
        .parse(input)
        .map_err(|e| ParseError::new(e.to_string(), e.offset()))
}
