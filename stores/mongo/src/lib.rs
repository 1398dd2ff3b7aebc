// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

mod documents;

use crate::documents::{
    comment_doc, comment_from, movie_fields, movie_from, profile_set, rating_from, user_fields,
    user_from,
};
use anyhow::Error;
use config::StoreConfig;
use mongodb::bson::{doc, Document};
use mongodb::options::{
    ClientOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument, UpdateOptions,
};
use mongodb::sync::{Client, Collection, Database};
use num_traits::Zero;
use store::{
    Aggregate, Comment, ErrorKind, Movie, ProfileUpdate, Rating, Reaction, Result, Score, Store,
    User,
};
use uuid::Uuid;

const USERS: &str = "users";
const MOVIES: &str = "movies";
const RATINGS: &str = "ratings";
const COMMENTS: &str = "comments";

// Rounds of conditional updates before giving up on a contended toggle
const TOGGLE_ATTEMPTS: usize = 8;

fn unavailable(err: mongodb::error::Error) -> Error {
    ErrorKind::unavailable(err).into()
}

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Build the long-lived client, the driver keeps its own connection pool
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.mongo_url).map_err(unavailable)?;
        options.app_name = Some("cinetec".into());
        options.connect_timeout = Some(config.connect_timeout());
        options.server_selection_timeout = Some(config.connect_timeout());
        if config.max_pool_size.is_some() {
            options.max_pool_size = config.max_pool_size;
        }

        let client = Client::with_options(options).map_err(unavailable)?;
        let db = client.database(&config.mongo_db);

        log::info!("Using mongo database {}", config.mongo_db);
        Ok(Self { db })
    }

    fn collection(&self, name: &str) -> Collection {
        self.db.collection(name)
    }

    /// Create the unique and lookup indexes the store relies on
    pub fn ensure_indexes(&self) -> Result<()> {
        let indexes: Vec<(&str, Document, &str, bool)> = vec![
            (RATINGS, doc! { "username": 1, "title": 1 }, "username_title", true),
            (COMMENTS, doc! { "title": 1, "created_at": -1 }, "title_created_at", false),
            (COMMENTS, doc! { "comment_id": 1 }, "comment_id", true),
            (USERS, doc! { "username": 1 }, "username", true),
            (MOVIES, doc! { "title": 1 }, "title", true),
        ];

        for (collection, key, name, unique) in indexes {
            self.db
                .run_command(
                    doc! {
                        "createIndexes": collection,
                        "indexes": [{ "key": key, "name": name, "unique": unique }],
                    },
                    None,
                )
                .map_err(unavailable)?;

            log::debug!("Index {}.{} ready", collection, name);
        }

        Ok(())
    }

    fn find_user(&self, username: &str) -> Result<Option<Document>> {
        self.collection(USERS)
            .find_one(doc! { "username": username }, None)
            .map_err(unavailable)
    }
}

impl Store for MongoStore {
    fn backend(&self) -> &'static str {
        "mongo"
    }

    fn insert_user(&self, user: &User) -> Result<()> {
        let query = doc! { "username": user.username.clone() };
        let update = doc! { "$setOnInsert": user_fields(user) };
        let options = UpdateOptions::builder().upsert(true).build();

        let result = self
            .collection(USERS)
            .update_one(query, update, options)
            .map_err(unavailable)?;

        if result.upserted_id.is_none() {
            return Err(ErrorKind::validation(format!(
                "Username({}) is already taken",
                user.username
            ))
            .into());
        }

        Ok(())
    }

    fn user_by_username(&self, username: &str) -> Result<User> {
        match self.find_user(username)? {
            Some(doc) => user_from(&doc),
            None => Err(ErrorKind::UserNotFound(username.into()).into()),
        }
    }

    fn users(&self) -> Result<Vec<User>> {
        let options = FindOptions::builder().sort(doc! { "username": 1 }).build();
        let cursor = self
            .collection(USERS)
            .find(None, options)
            .map_err(unavailable)?;

        let mut users = Vec::new();
        for doc in cursor {
            let doc = doc.map_err(unavailable)?;
            users.push(user_from(&doc)?);
        }

        Ok(users)
    }

    fn update_profile(&self, username: &str, update: &ProfileUpdate) -> Result<User> {
        if update.is_empty() {
            return self.user_by_username(username);
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .collection(USERS)
            .find_one_and_update(
                doc! { "username": username },
                doc! { "$set": profile_set(update) },
                options,
            )
            .map_err(unavailable)?;

        match updated {
            Some(doc) => user_from(&doc),
            None => Err(ErrorKind::UserNotFound(username.into()).into()),
        }
    }

    fn seed_movies(&self, movies: &[Movie]) -> Result<usize> {
        let collection = self.collection(MOVIES);
        let mut inserted = 0;

        for movie in movies {
            let query = doc! { "title": movie.title.clone() };
            let update = doc! { "$setOnInsert": movie_fields(movie) };
            let options = UpdateOptions::builder().upsert(true).build();

            let result = collection
                .update_one(query, update, options)
                .map_err(unavailable)?;

            if result.upserted_id.is_some() {
                inserted += 1;
            }
        }

        Ok(inserted)
    }

    fn movie(&self, title: &str) -> Result<Movie> {
        let doc = self
            .collection(MOVIES)
            .find_one(doc! { "title": title }, None)
            .map_err(unavailable)?;

        match doc {
            Some(doc) => movie_from(&doc),
            None => Err(ErrorKind::MovieNotFound(title.into()).into()),
        }
    }

    fn movies(&self) -> Result<Vec<Movie>> {
        let options = FindOptions::builder().sort(doc! { "title": 1 }).build();
        let cursor = self
            .collection(MOVIES)
            .find(None, options)
            .map_err(unavailable)?;

        let mut movies = Vec::new();
        for doc in cursor {
            let doc = doc.map_err(unavailable)?;
            movies.push(movie_from(&doc)?);
        }

        Ok(movies)
    }

    fn set_aggregate(&self, title: &str, aggregate: Aggregate) -> Result<()> {
        let query = doc! { "title": title };
        let update = doc! {
            "$set": {
                "average_rating": aggregate.average,
                "rating_count": i64::from(aggregate.count),
            }
        };

        let result = self
            .collection(MOVIES)
            .update_one(query, update, None)
            .map_err(unavailable)?;

        if result.matched_count.is_zero() {
            return Err(ErrorKind::MovieNotFound(title.into()).into());
        }

        Ok(())
    }

    fn submit_rating(&self, username: &str, title: &str, score: Score) -> Result<Rating> {
        let rating = Rating::new(username, title, score);

        let query = doc! { "username": username, "title": title };
        let update = doc! {
            "$set": {
                "score": i32::from(score.value()),
                "rated_at": rating.rated_at,
            }
        };

        // The unique (username, title) index keeps this a single row
        let options = UpdateOptions::builder().upsert(true).build();
        self.collection(RATINGS)
            .update_one(query, update, options)
            .map_err(unavailable)?;

        Ok(rating)
    }

    fn list_ratings(&self, title: &str) -> Result<Vec<Rating>> {
        let cursor = self
            .collection(RATINGS)
            .find(doc! { "title": title }, None)
            .map_err(unavailable)?;

        let mut ratings = Vec::new();
        for doc in cursor {
            let doc = doc.map_err(unavailable)?;
            ratings.push(rating_from(&doc)?);
        }

        Ok(ratings)
    }

    fn user_rating(&self, username: &str, title: &str) -> Result<Option<Rating>> {
        let doc = self
            .collection(RATINGS)
            .find_one(doc! { "username": username, "title": title }, None)
            .map_err(unavailable)?;

        doc.as_ref().map(rating_from).transpose()
    }

    fn toggle_favorite(&self, username: &str, title: &str) -> Result<bool> {
        let users = self.collection(USERS);

        // Each step only applies when the list is still in the state it
        // checks for, a concurrent toggle makes it miss instead of clobbering
        for attempt in 1..=TOGGLE_ATTEMPTS {
            let removed = users
                .update_one(
                    doc! { "username": username, "favorites": title },
                    doc! { "$pull": { "favorites": title } },
                    None,
                )
                .map_err(unavailable)?;

            if !removed.modified_count.is_zero() {
                return Ok(false);
            }

            let added = users
                .update_one(
                    doc! { "username": username, "favorites": { "$ne": title } },
                    doc! { "$addToSet": { "favorites": title } },
                    None,
                )
                .map_err(unavailable)?;

            if !added.modified_count.is_zero() {
                return Ok(true);
            }

            if self.find_user(username)?.is_none() {
                return Err(ErrorKind::UserNotFound(username.into()).into());
            }

            log::debug!(
                "Favorites of user({}) changed during toggle, attempt {}",
                username,
                attempt
            );
        }

        Err(ErrorKind::unavailable(format!(
            "favorites of user({}) kept changing",
            username
        ))
        .into())
    }

    fn favorites(&self, username: &str) -> Result<Vec<String>> {
        Ok(self.user_by_username(username)?.favorites)
    }

    fn add_comment(&self, comment: &Comment) -> Result<()> {
        self.collection(COMMENTS)
            .insert_one(comment_doc(comment), None)
            .map_err(unavailable)?;

        Ok(())
    }

    fn list_comments(&self, title: &str) -> Result<Vec<Comment>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self
            .collection(COMMENTS)
            .find(doc! { "title": title }, options)
            .map_err(unavailable)?;

        let mut comments = Vec::new();
        for doc in cursor {
            let doc = doc.map_err(unavailable)?;
            comments.push(comment_from(&doc)?);
        }

        Ok(comments)
    }

    fn react_to_comment(&self, id: &Uuid, reaction: Reaction) -> Result<Comment> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .collection(COMMENTS)
            .find_one_and_update(
                doc! { "comment_id": id.to_string() },
                doc! { "$inc": { reaction.counter(): 1 } },
                options,
            )
            .map_err(unavailable)?;

        match updated {
            Some(doc) => comment_from(&doc),
            None => Err(ErrorKind::validation(format!("Couldn't find comment({})", id)).into()),
        }
    }
}

/// Remove every document written by the store, used by the live tests
#[cfg(all(feature = "test-store", test))]
fn clear(store: &MongoStore) -> Result<()> {
    for name in &[USERS, MOVIES, RATINGS, COMMENTS] {
        store
            .collection(name)
            .delete_many(doc! {}, None)
            .map_err(unavailable)?;
    }

    Ok(())
}
