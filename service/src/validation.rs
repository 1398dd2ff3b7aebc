// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use store::ErrorKind;

pub const MAX_COMMENT_LEN: usize = 500;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_DISPLAY_NAME_LEN: usize = 50;

/// Trimmed value of a field that can't be blank
pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, ErrorKind> {
    let value = value.trim();

    if value.is_empty() {
        Err(ErrorKind::validation(format!("{} is required", field)))
    } else {
        Ok(value)
    }
}

fn at_most(field: &str, value: &str, max: usize) -> Result<(), ErrorKind> {
    if value.chars().count() > max {
        Err(ErrorKind::validation(format!(
            "{} can't be longer than {} characters",
            field, max
        )))
    } else {
        Ok(())
    }
}

pub fn comment_text(text: &str) -> Result<&str, ErrorKind> {
    let text = required("Comment", text)?;
    at_most("Comment", text, MAX_COMMENT_LEN)?;
    Ok(text)
}

pub fn password(password: &str) -> Result<&str, ErrorKind> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ErrorKind::validation(format!(
            "Password must have at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(password)
}

pub fn display_name(name: &str) -> Result<&str, ErrorKind> {
    let name = required("Display name", name)?;
    at_most("Display name", name, MAX_DISPLAY_NAME_LEN)?;
    Ok(name)
}

pub fn description(description: &str) -> Result<&str, ErrorKind> {
    let description = description.trim();
    at_most("Description", description, MAX_DESCRIPTION_LEN)?;
    Ok(description)
}

pub fn email(email: &str) -> Result<&str, ErrorKind> {
    let email = email.trim();

    if !email.contains('@') {
        return Err(ErrorKind::validation(format!("Invalid email({})", email)));
    }

    Ok(email)
}

/// Photos are references (urls or stored file names), never raw content
pub fn photo(photo: &str) -> Result<&str, ErrorKind> {
    let photo = required("Photo", photo)?;

    if photo.chars().any(char::is_whitespace) {
        return Err(ErrorKind::validation("Photo reference can't contain spaces"));
    }

    Ok(photo)
}
