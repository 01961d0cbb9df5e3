use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::map,
    number::complete::double,
    sequence::delimited,
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// `"..."` with no escapes; may be empty
pub fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
        |s: &str| s.to_string(),
    )(input)
}

/// Unquoted value: letters, digits and `_ - . / &`
pub fn bare_word(input: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| c.is_alphanumeric() || "_-./&".contains(c)),
        |s: &str| s.to_string(),
    )(input)
}

pub fn number_literal(input: &str) -> IResult<&str, f64> {
    double(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal(r#""Entire home/apt" rest"#), Ok((" rest", "Entire home/apt".to_string())));
        assert_eq!(string_literal(r#""""#), Ok(("", String::new())));
        assert!(string_literal("unquoted").is_err());
    }

    #[test]
    fn test_bare_word_stops_at_delimiters() {
        assert_eq!(bare_word("Hong_Kong, Spain"), Ok((", Spain", "Hong_Kong".to_string())));
        assert!(bare_word(")").is_err());
    }

    #[test]
    fn test_ws_and_numbers() {
        assert_eq!(ws(number_literal)("  42.5 )"), Ok((")", 42.5)));
        assert_eq!(number_literal("-3"), Ok(("", -3.0)));
    }
}
