// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use store::{
    Aggregate, Comment, ErrorKind, Movie, ProfileUpdate, Rating, Reaction, Result, Score, Store,
    User,
};
use uuid::Uuid;

/// In-process store backed by concurrent maps.
///
/// Every write touches a single map entry while holding that entry's shard
/// lock, which gives the same per-document atomicity a document database
/// gives with its single update operations.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    movies: DashMap<String, Movie>,
    ratings: DashMap<(String, String), Rating>,
    comments: DashMap<Uuid, (u64, Comment)>,
    sequence: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movies(movies: &[Movie]) -> Self {
        let store = Self::new();
        for movie in movies {
            store.movies.insert(movie.title.clone(), movie.clone());
        }

        store
    }
}

impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn insert_user(&self, user: &User) -> Result<()> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(ErrorKind::validation(format!(
                "Username({}) is already taken",
                user.username
            ))
            .into()),

            Entry::Vacant(entry) => {
                entry.insert(user.clone());
                Ok(())
            }
        }
    }

    fn user_by_username(&self, username: &str) -> Result<User> {
        self.users
            .get(username)
            .map(|user| user.value().clone())
            .ok_or_else(|| ErrorKind::UserNotFound(username.into()).into())
    }

    fn users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));

        Ok(users)
    }

    fn update_profile(&self, username: &str, update: &ProfileUpdate) -> Result<User> {
        let mut user = self
            .users
            .get_mut(username)
            .ok_or_else(|| ErrorKind::UserNotFound(username.into()))?;

        update.apply(&mut user);
        Ok(user.clone())
    }

    fn seed_movies(&self, movies: &[Movie]) -> Result<usize> {
        let mut inserted = 0;
        for movie in movies {
            if let Entry::Vacant(entry) = self.movies.entry(movie.title.clone()) {
                entry.insert(movie.clone());
                inserted += 1;
            }
        }

        Ok(inserted)
    }

    fn movie(&self, title: &str) -> Result<Movie> {
        self.movies
            .get(title)
            .map(|movie| movie.value().clone())
            .ok_or_else(|| ErrorKind::MovieNotFound(title.into()).into())
    }

    fn movies(&self) -> Result<Vec<Movie>> {
        let mut movies: Vec<Movie> = self.movies.iter().map(|e| e.value().clone()).collect();
        movies.sort_by(|a, b| a.title.cmp(&b.title));

        Ok(movies)
    }

    fn set_aggregate(&self, title: &str, aggregate: Aggregate) -> Result<()> {
        let mut movie = self
            .movies
            .get_mut(title)
            .ok_or_else(|| ErrorKind::MovieNotFound(title.into()))?;

        movie.aggregate = aggregate;
        Ok(())
    }

    fn submit_rating(&self, username: &str, title: &str, score: Score) -> Result<Rating> {
        let rating = Rating::new(username, title, score);
        self.ratings
            .insert((username.into(), title.into()), rating.clone());

        Ok(rating)
    }

    fn list_ratings(&self, title: &str) -> Result<Vec<Rating>> {
        let ratings = self
            .ratings
            .iter()
            .filter(|e| e.key().1 == title)
            .map(|e| e.value().clone())
            .collect();

        Ok(ratings)
    }

    fn user_rating(&self, username: &str, title: &str) -> Result<Option<Rating>> {
        let key = (username.to_string(), title.to_string());
        Ok(self.ratings.get(&key).map(|e| e.value().clone()))
    }

    fn toggle_favorite(&self, username: &str, title: &str) -> Result<bool> {
        let mut user = self
            .users
            .get_mut(username)
            .ok_or_else(|| ErrorKind::UserNotFound(username.into()))?;

        match user.favorites.iter().position(|fav| fav == title) {
            Some(pos) => {
                user.favorites.remove(pos);
                Ok(false)
            }

            None => {
                user.favorites.push(title.into());
                Ok(true)
            }
        }
    }

    fn favorites(&self, username: &str) -> Result<Vec<String>> {
        self.users
            .get(username)
            .map(|user| user.favorites.clone())
            .ok_or_else(|| ErrorKind::UserNotFound(username.into()).into())
    }

    fn add_comment(&self, comment: &Comment) -> Result<()> {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.comments.insert(comment.id, (seq, comment.clone()));

        Ok(())
    }

    fn list_comments(&self, title: &str) -> Result<Vec<Comment>> {
        let mut comments: Vec<(u64, Comment)> = self
            .comments
            .iter()
            .filter(|e| e.value().1.title == title)
            .map(|e| e.value().clone())
            .collect();

        comments.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(comments.into_iter().map(|(_, comment)| comment).collect())
    }

    fn react_to_comment(&self, id: &Uuid, reaction: Reaction) -> Result<Comment> {
        let mut entry = self
            .comments
            .get_mut(id)
            .ok_or_else(|| ErrorKind::validation(format!("Couldn't find comment({})", id)))?;

        entry.1.react(reaction);
        Ok(entry.1.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Error;
    use std::sync::Arc;
    use std::thread;
    use store::Catalog;

    fn seeded() -> std::result::Result<MemoryStore, Error> {
        let catalog = Catalog::embedded()?;
        let store = MemoryStore::with_movies(catalog.movies());

        for name in &["ana", "bruno", "carla"] {
            store.insert_user(&User::new(name, name, String::new()))?;
        }

        Ok(store)
    }

    #[test]
    fn rating_upsert_keeps_one_row() -> std::result::Result<(), Error> {
        let store = seeded()?;

        store.submit_rating("ana", "Matrix", Score::new(2)?)?;
        store.submit_rating("ana", "Matrix", Score::new(5)?)?;
        store.submit_rating("bruno", "Matrix", Score::new(3)?)?;

        let ratings = store.list_ratings("Matrix")?;
        assert_eq!(ratings.len(), 2);

        let ana = store.user_rating("ana", "Matrix")?.map(|r| r.score.value());
        assert_eq!(ana, Some(5));

        assert!(store.list_ratings("El Padrino")?.is_empty());
        Ok(())
    }

    #[test]
    fn duplicated_username() -> std::result::Result<(), Error> {
        let store = seeded()?;

        let err = store
            .insert_user(&User::new("ana", "Otra Ana", String::new()))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ErrorKind>(),
            Some(ErrorKind::ValidationError(_))
        ));
        assert_eq!(store.user_by_username("ana")?.display_name, "ana");

        Ok(())
    }

    #[test]
    fn seeding_is_idempotent() -> std::result::Result<(), Error> {
        let catalog = Catalog::embedded()?;
        let store = MemoryStore::new();

        assert_eq!(store.seed_movies(catalog.movies())?, 5);
        store.set_aggregate(
            "Matrix",
            Aggregate {
                average: 4.5,
                count: 2,
            },
        )?;

        assert_eq!(store.seed_movies(catalog.movies())?, 0);
        assert_eq!(store.movie("Matrix")?.aggregate.count, 2);

        Ok(())
    }

    #[test]
    fn aggregate_of_unknown_movie() {
        let store = MemoryStore::new();
        let err = store
            .set_aggregate("Matrix", Aggregate::default())
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<ErrorKind>(),
            Some(&ErrorKind::MovieNotFound("Matrix".into()))
        );
    }

    #[test]
    fn toggle_favorite_twice() -> std::result::Result<(), Error> {
        let store = seeded()?;

        assert!(store.toggle_favorite("ana", "Matrix")?);
        assert!(store.toggle_favorite("ana", "El Padrino")?);
        assert_eq!(store.favorites("ana")?, vec!["Matrix", "El Padrino"]);

        assert!(!store.toggle_favorite("ana", "Matrix")?);
        assert_eq!(store.favorites("ana")?, vec!["El Padrino"]);

        Ok(())
    }

    #[test]
    fn toggle_favorite_unknown_user() {
        let store = MemoryStore::new();
        let err = store.toggle_favorite("nadie", "Matrix").unwrap_err();

        assert_eq!(
            err.downcast_ref::<ErrorKind>(),
            Some(&ErrorKind::UserNotFound("nadie".into()))
        );
    }

    #[test]
    fn concurrent_toggles_do_not_lose_updates() -> std::result::Result<(), Error> {
        let store = Arc::new(seeded()?);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..125 {
                        store.toggle_favorite("ana", "Matrix").unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // 1000 toggles, an even number, must end where it started
        assert!(store.favorites("ana")?.is_empty());
        Ok(())
    }

    #[test]
    fn comments_newest_first() -> std::result::Result<(), Error> {
        let store = seeded()?;

        let first = Comment::new("ana", "Matrix", "Primera");
        let second = Comment::new("bruno", "Matrix", "Segunda");
        let other = Comment::new("carla", "El Padrino", "Otra");

        store.add_comment(&first)?;
        store.add_comment(&second)?;
        store.add_comment(&other)?;

        let texts: Vec<_> = store
            .list_comments("Matrix")?
            .into_iter()
            .map(|c| c.text)
            .collect();

        assert_eq!(texts, vec!["Segunda", "Primera"]);
        Ok(())
    }

    #[test]
    fn react_to_comment() -> std::result::Result<(), Error> {
        let store = seeded()?;
        let comment = Comment::new("ana", "Matrix", "Buenísima");
        store.add_comment(&comment)?;

        store.react_to_comment(&comment.id, Reaction::Like)?;
        let updated = store.react_to_comment(&comment.id, Reaction::Dislike)?;

        assert_eq!((updated.likes, updated.dislikes), (1, 1));
        assert!(store
            .react_to_comment(&Uuid::new_v4(), Reaction::Like)
            .is_err());

        Ok(())
    }
}
