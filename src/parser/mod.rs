// Filter expression parser

pub mod lexer;
pub mod selection;

use crate::filter::FilterOverrides;

pub use selection::parse_filter_expr;

/// Parse a filter expression into selection overrides
pub fn parse_filter(input: &str) -> anyhow::Result<FilterOverrides> {
    match parse_filter_expr(input) {
        Ok((_, overrides)) => Ok(overrides),
        Err(e) => anyhow::bail!("invalid filter expression '{}': {}", input, e),
    }
}
