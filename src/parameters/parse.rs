//! Parsing of textual parameter input
//!
//! Setup code often receives bounds, start values and targets as text. This
//! module turns such text into typed values with nom. Every parser consumes the
//! whole input (surrounding whitespace allowed) and reports malformed text as
//! [`MarshalError::Parse`].

use nom::{
    branch::alt,
    character::complete::{char, i64 as integer, multispace0},
    combinator::{all_consuming, verify},
    number::complete::double,
    sequence::delimited,
    IResult, Parser,
};

use crate::error::{MarshalError, Result};
use crate::parameters::point::Point3;
use crate::parameters::value::{Value, ValueKind};

/// Parse a finite real number surrounded by optional whitespace
fn real(input: &str) -> IResult<&str, f64> {
    delimited(
        multispace0,
        verify(double, |v: &f64| v.is_finite()),
        multispace0,
    )
    .parse(input)
}

/// Parse an integer surrounded by optional whitespace
fn whole(input: &str) -> IResult<&str, i64> {
    delimited(multispace0, integer, multispace0).parse(input)
}

/// Parse `x,y,z` without brackets
fn coordinates(input: &str) -> IResult<&str, Point3> {
    let (input, x) = real(input)?;
    let (input, _) = char(',').parse(input)?;
    let (input, y) = real(input)?;
    let (input, _) = char(',').parse(input)?;
    let (input, z) = real(input)?;
    Ok((input, Point3::new(x, y, z)))
}

/// Parse a point, optionally wrapped in matching brackets
fn point(input: &str) -> IResult<&str, Point3> {
    let (input, _) = multispace0.parse(input)?;
    let (input, p) = alt((
        delimited(char('('), coordinates, char(')')),
        delimited(char('['), coordinates, char(']')),
        delimited(char('{'), coordinates, char('}')),
        coordinates,
    ))
    .parse(input)?;
    let (input, _) = multispace0.parse(input)?;
    Ok((input, p))
}

fn parse_error(text: &str, kind: ValueKind) -> MarshalError {
    MarshalError::Parse {
        text: text.to_string(),
        kind,
    }
}

/// Parse a finite real number; `inf` and `nan` are rejected.
///
/// # Examples
///
/// ```
/// use optmarshal_rs::parameters::parse::parse_real;
///
/// assert_eq!(parse_real(" -2.5e1 ").unwrap(), -25.0);
/// assert!(parse_real("2.5 m").is_err());
/// ```
pub fn parse_real(text: &str) -> Result<f64> {
    all_consuming(real)
        .parse(text)
        .map(|(_, v)| v)
        .map_err(|_| parse_error(text, ValueKind::Real))
}

/// Parse an integer; decimal points are rejected.
pub fn parse_integer(text: &str) -> Result<i64> {
    all_consuming(whole)
        .parse(text)
        .map(|(_, v)| v)
        .map_err(|_| parse_error(text, ValueKind::Integer))
}

/// Parse a point written as `x,y,z`, `(x,y,z)`, `[x,y,z]` or `{x,y,z}`.
pub fn parse_point(text: &str) -> Result<Point3> {
    all_consuming(point)
        .parse(text)
        .map(|(_, p)| p)
        .map_err(|_| parse_error(text, ValueKind::Point))
}

/// Parse text into a value of the given kind.
pub fn parse_value(kind: ValueKind, text: &str) -> Result<Value> {
    Ok(match kind {
        ValueKind::Real => Value::Real(parse_real(text)?),
        ValueKind::Integer => Value::Integer(parse_integer(text)?),
        ValueKind::Point => Value::Point(parse_point(text)?),
    })
}

/// Parse optional text: blank input means "not set".
pub fn parse_optional(kind: ValueKind, text: &str) -> Result<Option<Value>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    parse_value(kind, text).map(Some)
}
