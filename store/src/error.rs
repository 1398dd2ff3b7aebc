// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use std::fmt::Display;
use thiserror::Error as DError;

#[derive(Debug, Clone, PartialEq, DError)]
pub enum ErrorKind {
    #[error("Score must be between 1 and 5, got {0}")]
    InvalidScore(i64),

    #[error("Couldn't find movie({0})")]
    MovieNotFound(String),

    #[error("Couldn't find user({0})")]
    UserNotFound(String),

    #[error("Store is unavailable ({0})")]
    StoreUnavailable(String),

    #[error("{0}")]
    ValidationError(String),
}

impl ErrorKind {
    pub fn unavailable(reason: impl Display) -> Self {
        Self::StoreUnavailable(reason.to_string())
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::ValidationError(reason.into())
    }

    /// Stable machine readable name, sent next to the message in responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidScore(_) => "invalid_score",
            Self::MovieNotFound(_) => "movie_not_found",
            Self::UserNotFound(_) => "user_not_found",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::ValidationError(_) => "validation_error",
        }
    }
}
