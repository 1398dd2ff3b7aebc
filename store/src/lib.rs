// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

pub mod catalog;
pub mod error;
pub mod models;
pub mod noop;

use anyhow::Error;
use uuid::Uuid;

pub use catalog::Catalog;
pub use error::ErrorKind;
pub use models::{
    Aggregate, Comment, Movie, ProfileUpdate, Rating, Reaction, Score, User, DEFAULT_PHOTO,
};
pub use noop::NoopStore;

pub type Result<T> = std::result::Result<T, Error>;

/// Persistence backend shared by every request.
///
/// Implementations must make each write a single atomic operation on the
/// underlying storage, two concurrent callers never observe each other's
/// half finished read-modify-write. Failures of the storage itself surface
/// as `ErrorKind::StoreUnavailable`.
pub trait Store: Send + Sync {
    /// Short backend name, used in logs
    fn backend(&self) -> &'static str;

    /// Insert a freshly registered user, fails if the username is taken
    fn insert_user(&self, user: &User) -> Result<()>;

    /// Get a single user by its unique username
    fn user_by_username(&self, username: &str) -> Result<User>;

    /// Get all users
    fn users(&self) -> Result<Vec<User>>;

    /// Apply a partial profile edit and return the updated user
    fn update_profile(&self, username: &str, update: &ProfileUpdate) -> Result<User>;

    /// Insert catalog movies missing from the store, returns how many were inserted
    fn seed_movies(&self, movies: &[Movie]) -> Result<usize>;

    /// Get a movie together with its cached aggregate
    fn movie(&self, title: &str) -> Result<Movie>;

    /// Get all movies
    fn movies(&self) -> Result<Vec<Movie>>;

    /// Overwrite the cached aggregate of a movie
    fn set_aggregate(&self, title: &str, aggregate: Aggregate) -> Result<()>;

    /// Insert or replace the rating of user for a movie
    fn submit_rating(&self, username: &str, title: &str, score: Score) -> Result<Rating>;

    /// Get every individual rating of a movie
    fn list_ratings(&self, title: &str) -> Result<Vec<Rating>>;

    /// Get the rating of user for a movie, if any
    fn user_rating(&self, username: &str, title: &str) -> Result<Option<Rating>>;

    /// Flip the membership of a movie in the user favorites, returns `true`
    /// when the movie is a favorite after the call
    fn toggle_favorite(&self, username: &str, title: &str) -> Result<bool>;

    /// Get the favorites of a user in insertion order
    fn favorites(&self, username: &str) -> Result<Vec<String>>;

    /// Append a comment
    fn add_comment(&self, comment: &Comment) -> Result<()>;

    /// Get the comments of a movie, newest first
    fn list_comments(&self, title: &str) -> Result<Vec<Comment>>;

    /// Increment a reaction counter of a comment and return the comment
    fn react_to_comment(&self, id: &Uuid, reaction: Reaction) -> Result<Comment>;
}
