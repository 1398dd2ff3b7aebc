// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use crate::error::ErrorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt::{self, Display};
use std::str::FromStr;
use uuid::Uuid;

/// Avatar assigned to users that never uploaded a photo
pub const DEFAULT_PHOTO: &str = "https://cdn-icons-png.flaticon.com/512/3135/3135715.png";

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;

/// A validated rating score, always inside `[MIN_SCORE, MAX_SCORE]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub fn new(value: i64) -> Result<Self, ErrorKind> {
        if (MIN_SCORE..=MAX_SCORE).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ErrorKind::InvalidScore(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = ErrorKind;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cached average and vote count of a movie
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aggregate {
    pub average: f64,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub description: String,
    pub photo: String,
    pub favorites: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: &str, display_name: &str, password_hash: String) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
            email: None,
            password_hash,
            description: String::new(),
            photo: DEFAULT_PHOTO.into(),
            favorites: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_favorite(&self, title: &str) -> bool {
        self.favorites.iter().any(|fav| fav == title)
    }
}

/// Partial profile edit, `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub photo: Option<String>,
}

impl ProfileUpdate {
    pub fn reset_photo() -> Self {
        Self {
            photo: Some(DEFAULT_PHOTO.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.description.is_none() && self.photo.is_none()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(display_name) = &self.display_name {
            user.display_name = display_name.clone();
        }

        if let Some(description) = &self.description {
            user.description = description.clone();
        }

        if let Some(photo) = &self.photo {
            user.photo = photo.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub title: String,
    pub description: String,
    pub platform: String,
    pub cover: String,
    #[serde(default)]
    pub aggregate: Aggregate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rating {
    pub username: String,
    pub title: String,
    pub score: Score,
    pub rated_at: DateTime<Utc>,
}

impl Rating {
    pub fn new(username: &str, title: &str, score: Score) -> Self {
        Self {
            username: username.into(),
            title: title.into(),
            score,
            rated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: Uuid,
    pub title: String,
    pub username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub likes: u32,
    pub dislikes: u32,
}

impl Comment {
    pub fn new(username: &str, title: &str, text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            username: username.into(),
            text: text.into(),
            created_at: Utc::now(),
            likes: 0,
            dislikes: 0,
        }
    }

    pub fn react(&mut self, reaction: Reaction) {
        match reaction {
            Reaction::Like => self.likes += 1,
            Reaction::Dislike => self.dislikes += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    /// Name of the counter touched by this reaction
    pub fn counter(self) -> &'static str {
        match self {
            Self::Like => "likes",
            Self::Dislike => "dislikes",
        }
    }
}

impl FromStr for Reaction {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            other => Err(ErrorKind::validation(format!(
                "Unknown reaction '{}', expected like or dislike",
                other
            ))),
        }
    }
}
