// Parser for one-line filter expressions, e.g.
//   country(Spain, "United States") | room_type("Private room") | price(30, 80)

use super::lexer::{bare_word, number_literal, string_literal, ws};
use crate::filter::FilterOverrides;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace0},
    combinator::{eof, value},
    multi::separated_list0,
    IResult,
};

/// The columns a filter expression can select on
#[derive(Debug, Clone, Copy, PartialEq)]
enum Facet {
    Country,
    PropertyType,
    RoomType,
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Facet(Facet, Vec<String>),
    Price(f64, f64),
}

fn facet_name(input: &str) -> IResult<&str, Facet> {
    alt((
        value(Facet::Country, tag("country")),
        value(Facet::PropertyType, tag("property_type")),
        value(Facet::RoomType, tag("room_type")),
    ))(input)
}

fn facet_value(input: &str) -> IResult<&str, String> {
    alt((string_literal, bare_word))(input)
}

/// country(...) / property_type(...) / room_type(...)
fn parse_facet_clause(input: &str) -> IResult<&str, Clause> {
    let (input, field) = ws(facet_name)(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, values) = separated_list0(ws(char(',')), ws(facet_value))(input)?;
    let (input, _) = ws(char(')'))(input)?;
    Ok((input, Clause::Facet(field, values)))
}

/// price(min, max)
fn parse_price_clause(input: &str) -> IResult<&str, Clause> {
    let (input, _) = ws(tag("price"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, min) = ws(number_literal)(input)?;
    let (input, _) = ws(char(','))(input)?;
    let (input, max) = ws(number_literal)(input)?;
    let (input, _) = ws(char(')'))(input)?;
    Ok((input, Clause::Price(min, max)))
}

/// Parse a complete filter expression: clause | clause | ...
/// Later clauses for the same facet replace earlier ones.
pub fn parse_filter_expr(input: &str) -> IResult<&str, FilterOverrides> {
    let (input, clauses) = separated_list0(
        ws(char('|')),
        alt((parse_price_clause, parse_facet_clause)),
    )(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = eof(input)?;

    let mut overrides = FilterOverrides::default();
    for clause in clauses {
        match clause {
            Clause::Facet(Facet::Country, values) => overrides.countries = Some(values),
            Clause::Facet(Facet::PropertyType, values) => overrides.property_types = Some(values),
            Clause::Facet(Facet::RoomType, values) => overrides.room_types = Some(values),
            Clause::Price(min, max) => {
                overrides.price_min = Some(min);
                overrides.price_max = Some(max);
            }
        }
    }

    Ok((input, overrides))
}
