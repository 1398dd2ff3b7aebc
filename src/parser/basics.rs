// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use nom::bytes::complete::{tag, take_till, take_while, take_while1};
use nom::character::complete::{char, digit1, space0};
use nom::combinator::{map_res, opt, recognize};
use nom::sequence::{delimited, pair};
use nom::IResult;

pub(crate) fn parse_ident(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-')(input)
}

/// Single quoted text, may be empty
pub(crate) fn parse_string(input: &str) -> IResult<&str, &str> {
    delimited(char('\''), take_till(|c: char| c == '\''), char('\''))(input)
}

pub(crate) fn parse_number(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| {
        s.parse::<i64>()
    })(input)
}

pub(crate) fn parse_separator(input: &str) -> IResult<&str, &str> {
    delimited(
        take_while(|c: char| c == ' '),
        tag(","),
        take_while(|c: char| c == ' '),
    )(input)
}

/// Wrap a parser between parentheses, spaces around the content are allowed
pub(crate) fn args<'a, O, F>(inner: F) -> impl Fn(&'a str) -> IResult<&'a str, O>
where
    F: Fn(&'a str) -> IResult<&'a str, O>,
{
    delimited(pair(char('('), space0), inner, pair(space0, char(')')))
}
