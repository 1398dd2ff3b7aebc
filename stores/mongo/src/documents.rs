// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use anyhow::Error;
use chrono::Utc;
use mongodb::bson::{doc, Bson, Document};
use store::{Aggregate, Comment, ErrorKind, Movie, ProfileUpdate, Rating, Score, User};
use uuid::Uuid;

// Numbers written by other tools may come back as any bson numeric type
fn read_f64(doc: &Document, key: &str) -> f64 {
    match doc.get(key) {
        Some(Bson::Double(v)) => *v,
        Some(Bson::Int32(v)) => f64::from(*v),
        Some(Bson::Int64(v)) => *v as f64,
        _ => 0.0,
    }
}

fn read_u32(doc: &Document, key: &str) -> u32 {
    match doc.get(key) {
        Some(Bson::Int32(v)) => (*v).max(0) as u32,
        Some(Bson::Int64(v)) => (*v).max(0) as u32,
        Some(Bson::Double(v)) => v.max(0.0) as u32,
        _ => 0,
    }
}

fn read_string(doc: &Document, key: &str) -> String {
    doc.get_str(key).map(String::from).unwrap_or_default()
}

/// Fields of a user document, the username goes in the upsert filter
pub(crate) fn user_fields(user: &User) -> Document {
    let email = match &user.email {
        Some(email) => Bson::String(email.clone()),
        None => Bson::Null,
    };

    doc! {
        "display_name": user.display_name.clone(),
        "email": email,
        "password_hash": user.password_hash.clone(),
        "description": user.description.clone(),
        "photo": user.photo.clone(),
        "favorites": user.favorites.clone(),
        "created_at": user.created_at,
    }
}

pub(crate) fn user_from(doc: &Document) -> Result<User, Error> {
    let favorites = doc
        .get_array("favorites")
        .map(|favs| {
            favs.iter()
                .filter_map(Bson::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Ok(User {
        username: doc.get_str("username")?.into(),
        display_name: read_string(doc, "display_name"),
        email: doc.get_str("email").ok().map(String::from),
        password_hash: read_string(doc, "password_hash"),
        description: read_string(doc, "description"),
        photo: read_string(doc, "photo"),
        favorites,
        created_at: doc
            .get_datetime("created_at")
            .map(|at| *at)
            .unwrap_or_else(|_| Utc::now()),
    })
}

/// `$set` document for a profile edit
pub(crate) fn profile_set(update: &ProfileUpdate) -> Document {
    let mut set = Document::new();

    if let Some(display_name) = &update.display_name {
        set.insert("display_name", display_name.clone());
    }

    if let Some(description) = &update.description {
        set.insert("description", description.clone());
    }

    if let Some(photo) = &update.photo {
        set.insert("photo", photo.clone());
    }

    set
}

/// Movie fields written only when the movie is first inserted
pub(crate) fn movie_fields(movie: &Movie) -> Document {
    doc! {
        "description": movie.description.clone(),
        "platform": movie.platform.clone(),
        "cover": movie.cover.clone(),
        "average_rating": 0.0,
        "rating_count": 0i64,
    }
}

pub(crate) fn movie_from(doc: &Document) -> Result<Movie, Error> {
    Ok(Movie {
        title: doc.get_str("title")?.into(),
        description: read_string(doc, "description"),
        platform: read_string(doc, "platform"),
        cover: read_string(doc, "cover"),
        aggregate: Aggregate {
            average: read_f64(doc, "average_rating"),
            count: read_u32(doc, "rating_count"),
        },
    })
}

pub(crate) fn rating_from(doc: &Document) -> Result<Rating, Error> {
    let raw = match doc.get("score") {
        Some(Bson::Int32(v)) => i64::from(*v),
        Some(Bson::Int64(v)) => *v,
        _ => return Err(ErrorKind::unavailable("rating without score").into()),
    };

    Ok(Rating {
        username: doc.get_str("username")?.into(),
        title: doc.get_str("title")?.into(),
        score: Score::new(raw)?,
        rated_at: doc
            .get_datetime("rated_at")
            .map(|at| *at)
            .unwrap_or_else(|_| Utc::now()),
    })
}

pub(crate) fn comment_doc(comment: &Comment) -> Document {
    doc! {
        "comment_id": comment.id.to_string(),
        "title": comment.title.clone(),
        "username": comment.username.clone(),
        "text": comment.text.clone(),
        "created_at": comment.created_at,
        "likes": i64::from(comment.likes),
        "dislikes": i64::from(comment.dislikes),
    }
}

pub(crate) fn comment_from(doc: &Document) -> Result<Comment, Error> {
    Ok(Comment {
        id: Uuid::parse_str(doc.get_str("comment_id")?)?,
        title: doc.get_str("title")?.into(),
        username: read_string(doc, "username"),
        text: read_string(doc, "text"),
        created_at: doc
            .get_datetime("created_at")
            .map(|at| *at)
            .unwrap_or_else(|_| Utc::now()),
        likes: read_u32(doc, "likes"),
        dislikes: read_u32(doc, "dislikes"),
    })
}
