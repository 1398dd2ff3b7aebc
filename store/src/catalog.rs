// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use crate::error::ErrorKind;
use crate::models::{Aggregate, Movie};
use anyhow::Error;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const EMBEDDED: &str = include_str!("../catalog/movies.toml");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    movies: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    title: String,
    description: String,
    platform: String,
    cover: String,
}

/// Read-only table of the movies known to the application.
///
/// Loaded once at start-up and shared behind an `Arc`, the aggregates of the
/// movies it holds are always zero, live aggregates belong to the store.
#[derive(Debug, Clone)]
pub struct Catalog {
    movies: Vec<Movie>,
    by_title: HashMap<String, usize>,
}

impl Catalog {
    /// The seed list compiled into the binary
    pub fn embedded() -> Result<Self, Error> {
        Self::from_toml(EMBEDDED)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        let parsed: CatalogFile = toml::from_str(contents)?;

        let mut movies = Vec::with_capacity(parsed.movies.len());
        let mut by_title = HashMap::with_capacity(parsed.movies.len());

        for entry in parsed.movies {
            let title = entry.title.trim().to_string();
            if title.is_empty() {
                return Err(ErrorKind::validation("Catalog entry without title").into());
            }

            if by_title.insert(title.clone(), movies.len()).is_some() {
                return Err(
                    ErrorKind::validation(format!("Duplicated catalog title({})", title)).into(),
                );
            }

            movies.push(Movie {
                title,
                description: entry.description,
                platform: entry.platform,
                cover: entry.cover,
                aggregate: Aggregate::default(),
            });
        }

        Ok(Self { movies, by_title })
    }

    pub fn get(&self, title: &str) -> Option<&Movie> {
        self.by_title.get(title).map(|&idx| &self.movies[idx])
    }

    pub fn contains(&self, title: &str) -> bool {
        self.by_title.contains_key(title)
    }

    /// Same as `get` but failing with `MovieNotFound`
    pub fn require(&self, title: &str) -> Result<&Movie, ErrorKind> {
        self.get(title)
            .ok_or_else(|| ErrorKind::MovieNotFound(title.into()))
    }

    /// Movies in seed order
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}
