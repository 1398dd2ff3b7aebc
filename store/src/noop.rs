// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use crate::{
    Aggregate, Catalog, Comment, ErrorKind, Movie, ProfileUpdate, Rating, Reaction, Result,
    Score, Store, User,
};
use std::sync::Arc;
use uuid::Uuid;

/// Store that persists nothing.
///
/// Writes are accepted and dropped, reads answer with empty results. Movies
/// are served straight from the catalog with a zero aggregate so the rest of
/// the application keeps working without a database.
pub struct NoopStore {
    catalog: Arc<Catalog>,
}

impl NoopStore {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        log::warn!("Using the no-op store, nothing will be persisted");
        Self { catalog }
    }
}

impl Store for NoopStore {
    fn backend(&self) -> &'static str {
        "noop"
    }

    fn insert_user(&self, user: &User) -> Result<()> {
        log::debug!("noop: dropping user({})", user.username);
        Ok(())
    }

    fn user_by_username(&self, username: &str) -> Result<User> {
        Err(ErrorKind::UserNotFound(username.into()).into())
    }

    fn users(&self) -> Result<Vec<User>> {
        Ok(vec![])
    }

    fn update_profile(&self, username: &str, _: &ProfileUpdate) -> Result<User> {
        Err(ErrorKind::UserNotFound(username.into()).into())
    }

    fn seed_movies(&self, _: &[Movie]) -> Result<usize> {
        Ok(0)
    }

    fn movie(&self, title: &str) -> Result<Movie> {
        Ok(self.catalog.require(title)?.clone())
    }

    fn movies(&self) -> Result<Vec<Movie>> {
        Ok(self.catalog.movies().to_vec())
    }

    fn set_aggregate(&self, title: &str, _: Aggregate) -> Result<()> {
        self.catalog.require(title)?;
        Ok(())
    }

    fn submit_rating(&self, username: &str, title: &str, score: Score) -> Result<Rating> {
        Ok(Rating::new(username, title, score))
    }

    fn list_ratings(&self, _: &str) -> Result<Vec<Rating>> {
        Ok(vec![])
    }

    fn user_rating(&self, _: &str, _: &str) -> Result<Option<Rating>> {
        Ok(None)
    }

    fn toggle_favorite(&self, username: &str, _: &str) -> Result<bool> {
        Err(ErrorKind::UserNotFound(username.into()).into())
    }

    fn favorites(&self, _: &str) -> Result<Vec<String>> {
        Ok(vec![])
    }

    fn add_comment(&self, comment: &Comment) -> Result<()> {
        log::debug!("noop: dropping comment on movie({})", comment.title);
        Ok(())
    }

    fn list_comments(&self, _: &str) -> Result<Vec<Comment>> {
        Ok(vec![])
    }

    fn react_to_comment(&self, id: &Uuid, _: Reaction) -> Result<Comment> {
        Err(ErrorKind::validation(format!("Couldn't find comment({})", id)).into())
    }
}
