// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

mod basics;

use basics::{args, parse_ident, parse_number, parse_separator, parse_string};
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::combinator::{all_consuming, map, opt, value};
use nom::sequence::{preceded, separated_pair, tuple};
use nom::IResult;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ProfileField {
    DisplayName,
    Description,
    Photo,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Statement {
    Register {
        username: String,
        display_name: String,
        password: String,
        email: Option<String>,
    },
    Login(String, String),
    Logout,
    User(String),
    Users,
    Profile(ProfileField, String),
    ResetPhoto,
    Movies,
    Movie(String),
    Rate(String, i64),
    Ratings(String),
    Favorite(String),
    Favorites,
    Comment(String, String),
    Comments(String),
    React(String, String),
    Contact(String, String, String),
    Contacts(i64),
}

fn parse_profile_field(input: &str) -> IResult<&str, ProfileField> {
    alt((
        value(ProfileField::DisplayName, tag("name")),
        value(ProfileField::Description, tag("description")),
        value(ProfileField::Photo, tag("photo")),
    ))(input)
}

fn parse_two_strings(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(parse_string, parse_separator, parse_string)(input)
}

fn parse_user_statement(input: &str) -> IResult<&str, Statement> {
    alt((
        map(
            preceded(
                tag("register"),
                args(tuple((
                    parse_string,
                    parse_separator,
                    parse_string,
                    parse_separator,
                    parse_string,
                    opt(preceded(parse_separator, parse_string)),
                ))),
            ),
            |(username, _, display_name, _, password, email)| Statement::Register {
                username: username.into(),
                display_name: display_name.into(),
                password: password.into(),
                email: email.map(String::from),
            },
        ),
        map(
            preceded(tag("login"), args(parse_two_strings)),
            |(username, password)| Statement::Login(username.into(), password.into()),
        ),
        value(Statement::Logout, tag("logout")),
        value(Statement::Users, tag("users")),
        map(preceded(tag("user"), args(parse_string)), |username| {
            Statement::User(username.into())
        }),
        map(
            preceded(
                tag("profile"),
                args(separated_pair(
                    parse_profile_field,
                    parse_separator,
                    parse_string,
                )),
            ),
            |(field, value)| Statement::Profile(field, value.into()),
        ),
        value(Statement::ResetPhoto, tag("reset_photo")),
    ))(input)
}

fn parse_movie_statement(input: &str) -> IResult<&str, Statement> {
    alt((
        value(Statement::Movies, tag("movies")),
        map(preceded(tag("movie"), args(parse_string)), |title| {
            Statement::Movie(title.into())
        }),
        map(
            preceded(
                tag("rate"),
                args(separated_pair(parse_string, parse_separator, parse_number)),
            ),
            |(title, score)| Statement::Rate(title.into(), score),
        ),
        map(preceded(tag("ratings"), args(parse_string)), |title| {
            Statement::Ratings(title.into())
        }),
        value(Statement::Favorites, tag("favs")),
        map(preceded(tag("fav"), args(parse_string)), |title| {
            Statement::Favorite(title.into())
        }),
        map(preceded(tag("comments"), args(parse_string)), |title| {
            Statement::Comments(title.into())
        }),
        map(
            preceded(tag("comment"), args(parse_two_strings)),
            |(title, text)| Statement::Comment(title.into(), text.into()),
        ),
        map(
            preceded(
                tag("react"),
                args(separated_pair(parse_string, parse_separator, parse_ident)),
            ),
            |(id, reaction)| Statement::React(id.into(), reaction.into()),
        ),
    ))(input)
}

fn parse_contact_statement(input: &str) -> IResult<&str, Statement> {
    alt((
        map(preceded(tag("contacts"), args(parse_number)), Statement::Contacts),
        map(
            preceded(
                tag("contact"),
                args(tuple((
                    parse_string,
                    parse_separator,
                    parse_string,
                    parse_separator,
                    parse_string,
                ))),
            ),
            |(name, _, email, _, message)| {
                Statement::Contact(name.into(), email.into(), message.into())
            },
        ),
    ))(input)
}

fn parse_statement(input: &str) -> IResult<&str, Statement> {
    alt((
        parse_user_statement,
        parse_movie_statement,
        parse_contact_statement,
    ))(input)
}

pub fn parse_line(input: &str) -> Option<Statement> {
    let (_, statement) = all_consuming(parse_statement)(input.trim()).ok()?;
    Some(statement)
}
