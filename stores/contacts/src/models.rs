// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use crate::schema::contacts;
use chrono::{DateTime, Utc};
use serde::Serialize;
use store::ErrorKind;

pub const MAX_MESSAGE_LEN: usize = 2000;

/// How many messages to list, must be positive
pub fn validated_limit(limit: i64) -> Result<i64, ErrorKind> {
    if limit < 1 {
        return Err(ErrorKind::validation(format!(
            "Limit must be a positive number, got {}",
            limit
        )));
    }

    Ok(limit)
}

// To query data from the database
#[derive(Debug, Clone, Queryable, Serialize)]
pub struct ContactMessage {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

// To insert a new message into the database
#[derive(Debug, Clone, PartialEq, Insertable)]
#[table_name = "contacts"]
pub struct NewContact<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub message: &'a str,
}

impl<'a> NewContact<'a> {
    pub fn validated(name: &'a str, email: &'a str, message: &'a str) -> Result<Self, ErrorKind> {
        let name = name.trim();
        let email = email.trim();
        let message = message.trim();

        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Err(ErrorKind::validation(
                "Name, email and message are required",
            ));
        }

        if !email.contains('@') {
            return Err(ErrorKind::validation(format!("Invalid email({})", email)));
        }

        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err(ErrorKind::validation(format!(
                "Message can't be longer than {} characters",
                MAX_MESSAGE_LEN
            )));
        }

        Ok(Self {
            name,
            email,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_fields() {
        let contact = NewContact::validated(" Ana ", "ana@cinetec.pe ", " Hola ");
        let expected = NewContact {
            name: "Ana",
            email: "ana@cinetec.pe",
            message: "Hola",
        };

        assert_eq!(contact, Ok(expected));
    }

    #[test]
    fn required_fields() {
        assert!(NewContact::validated("", "ana@cinetec.pe", "Hola").is_err());
        assert!(NewContact::validated("Ana", "  ", "Hola").is_err());
        assert!(NewContact::validated("Ana", "ana@cinetec.pe", "\n").is_err());
    }

    #[test]
    fn invalid_email() {
        let err = NewContact::validated("Ana", "ana.cinetec.pe", "Hola").unwrap_err();
        assert_eq!(err, ErrorKind::validation("Invalid email(ana.cinetec.pe)"));
    }

    #[test]
    fn limit_must_be_positive() {
        assert_eq!(validated_limit(10), Ok(10));
        assert_eq!(
            validated_limit(-1),
            Err(ErrorKind::validation("Limit must be a positive number, got -1"))
        );
        assert!(validated_limit(0).is_err());
    }

    #[test]
    fn message_too_long() {
        let message = "a".repeat(MAX_MESSAGE_LEN + 1);
        assert!(NewContact::validated("Ana", "ana@cinetec.pe", &message).is_err());

        let message = "a".repeat(MAX_MESSAGE_LEN);
        assert!(NewContact::validated("Ana", "ana@cinetec.pe", &message).is_ok());
    }
}
