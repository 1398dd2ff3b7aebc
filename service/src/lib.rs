// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

pub mod aggregate;
pub mod credentials;
pub mod response;
pub mod validation;

use serde::Serialize;
use std::sync::Arc;
use store::{
    Aggregate, Catalog, Comment, ErrorKind, Movie, ProfileUpdate, Rating, Reaction, Result,
    Score, Store, User,
};
use uuid::Uuid;

pub use response::Response;

/// Everything the movie page shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieDetails {
    pub movie: Movie,
    pub comments: Vec<Comment>,
    pub user_rating: Option<Rating>,
    pub is_favorite: bool,
}

/// Operations exposed to the request layer.
///
/// The store and the catalog are acquired once at start up and injected
/// here, every request then goes through a shared `Service`.
#[derive(Clone)]
pub struct Service {
    store: Arc<dyn Store>,
    catalog: Arc<Catalog>,
}

impl Service {
    pub fn new(store: Arc<dyn Store>, catalog: Arc<Catalog>) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Make sure every catalog movie exists in the store
    pub fn seed_catalog(&self) -> Result<usize> {
        let inserted = self.store.seed_movies(self.catalog.movies())?;
        log::info!(
            "Seeded {} of {} catalog movies into the {} store",
            inserted,
            self.catalog.len(),
            self.store.backend()
        );

        Ok(inserted)
    }

    pub fn register_user(
        &self,
        username: &str,
        display_name: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<User> {
        let username = validation::required("Username", username)?;
        let display_name = validation::display_name(display_name)?;
        let password = validation::password(password)?;

        let mut user = User::new(username, display_name, credentials::hash_password(password));
        if let Some(email) = email {
            user.email = Some(validation::email(email)?.into());
        }

        self.store.insert_user(&user)?;
        log::info!("Registered user({})", user.username);

        Ok(user)
    }

    /// Check the credentials of a user, no session is created
    pub fn login(&self, username: &str, password: &str) -> Result<User> {
        let invalid = || ErrorKind::validation("Invalid username or password");

        let user = match self.store.user_by_username(username.trim()) {
            Ok(user) => user,
            Err(e) => match e.downcast_ref::<ErrorKind>() {
                Some(ErrorKind::UserNotFound(_)) => return Err(invalid().into()),
                _ => return Err(e),
            },
        };

        if !credentials::verify_password(password, &user.password_hash) {
            log::warn!("Failed login attempt for user({})", user.username);
            return Err(invalid().into());
        }

        Ok(user)
    }

    pub fn user(&self, username: &str) -> Result<User> {
        self.store.user_by_username(username)
    }

    pub fn update_profile(&self, username: &str, update: ProfileUpdate) -> Result<User> {
        if update.is_empty() {
            return Err(ErrorKind::validation("Nothing to update").into());
        }

        let update = ProfileUpdate {
            display_name: match update.display_name {
                Some(name) => Some(validation::display_name(&name)?.into()),
                None => None,
            },
            description: match update.description {
                Some(description) => Some(validation::description(&description)?.into()),
                None => None,
            },
            photo: match update.photo {
                Some(photo) => Some(validation::photo(&photo)?.into()),
                None => None,
            },
        };

        self.store.update_profile(username, &update)
    }

    pub fn reset_photo(&self, username: &str) -> Result<User> {
        self.store.update_profile(username, &ProfileUpdate::reset_photo())
    }

    pub fn movies(&self) -> Result<Vec<Movie>> {
        self.store.movies()
    }

    /// Movie with its aggregate and comments, plus the viewer's own rating
    /// and favorite flag when someone is logged in
    pub fn movie_details(&self, title: &str, viewer: Option<&str>) -> Result<MovieDetails> {
        self.catalog.require(title)?;

        let movie = self.store.movie(title)?;
        let comments = self.store.list_comments(title)?;

        let (user_rating, is_favorite) = match viewer {
            Some(username) => {
                let rating = self.store.user_rating(username, title)?;
                let favorite = match self.store.user_by_username(username) {
                    Ok(user) => user.is_favorite(title),
                    Err(e) => match e.downcast_ref::<ErrorKind>() {
                        Some(ErrorKind::UserNotFound(_)) => false,
                        _ => return Err(e),
                    },
                };

                (rating, favorite)
            }
            None => (None, false),
        };

        Ok(MovieDetails {
            movie,
            comments,
            user_rating,
            is_favorite,
        })
    }

    /// Store the rating of a user and refresh the movie aggregate
    pub fn rate_movie(&self, username: &str, title: &str, score: i64) -> Result<Aggregate> {
        let score = Score::new(score)?;
        let username = validation::required("Username", username)?;
        self.catalog.require(title)?;

        self.store.submit_rating(username, title, score)?;
        let aggregate = self.recompute_aggregate(title)?;

        log::info!(
            "User({}) rated movie({}) with {}, now {:.1} from {} votes",
            username,
            title,
            score,
            aggregate.average,
            aggregate.count
        );

        Ok(aggregate)
    }

    /// Rebuild the cached aggregate of a movie from a fresh read of its ratings
    pub fn recompute_aggregate(&self, title: &str) -> Result<Aggregate> {
        let ratings = self.store.list_ratings(title)?;
        let aggregate = aggregate::from_scores(ratings.iter().map(|rating| rating.score));

        self.store.set_aggregate(title, aggregate)?;
        Ok(aggregate)
    }

    pub fn list_ratings(&self, title: &str) -> Result<Vec<Rating>> {
        self.catalog.require(title)?;
        self.store.list_ratings(title)
    }

    /// Returns `true` when the movie is a favorite after the call
    pub fn toggle_favorite(&self, username: &str, title: &str) -> Result<bool> {
        self.catalog.require(title)?;

        let favorite = self.store.toggle_favorite(username, title)?;
        log::debug!(
            "User({}) {} movie({})",
            username,
            if favorite { "favorited" } else { "unfavorited" },
            title
        );

        Ok(favorite)
    }

    pub fn favorites(&self, username: &str) -> Result<Vec<String>> {
        self.store.favorites(username)
    }

    pub fn add_comment(&self, username: &str, title: &str, text: &str) -> Result<Comment> {
        let username = validation::required("Username", username)?;
        let text = validation::comment_text(text)?;
        self.catalog.require(title)?;

        let comment = Comment::new(username, title, text);
        self.store.add_comment(&comment)?;
        log::info!("User({}) commented on movie({})", username, title);

        Ok(comment)
    }

    pub fn list_comments(&self, title: &str) -> Result<Vec<Comment>> {
        self.catalog.require(title)?;
        self.store.list_comments(title)
    }

    pub fn react_to_comment(&self, id: &str, reaction: &str) -> Result<Comment> {
        let id = Uuid::parse_str(id.trim())
            .map_err(|_| ErrorKind::validation(format!("Invalid comment id({})", id)))?;
        let reaction: Reaction = reaction.parse()?;

        self.store.react_to_comment(&id, reaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Error;
    use assert_approx_eq::assert_approx_eq;
    use memory_store::MemoryStore;
    use std::thread;

    fn service() -> std::result::Result<Service, Error> {
        let catalog = Arc::new(Catalog::embedded()?);
        let store = Arc::new(MemoryStore::with_movies(catalog.movies()));

        Ok(Service::new(store, catalog))
    }

    fn kind(err: &Error) -> Option<&ErrorKind> {
        err.downcast_ref::<ErrorKind>()
    }

    struct UnavailableStore;

    fn down<T>() -> Result<T> {
        Err(ErrorKind::unavailable("connection refused").into())
    }

    impl Store for UnavailableStore {
        fn backend(&self) -> &'static str {
            "unavailable"
        }

        fn insert_user(&self, _: &User) -> Result<()> {
            down()
        }

        fn user_by_username(&self, _: &str) -> Result<User> {
            down()
        }

        fn users(&self) -> Result<Vec<User>> {
            down()
        }

        fn update_profile(&self, _: &str, _: &ProfileUpdate) -> Result<User> {
            down()
        }

        fn seed_movies(&self, _: &[Movie]) -> Result<usize> {
            down()
        }

        fn movie(&self, _: &str) -> Result<Movie> {
            down()
        }

        fn movies(&self) -> Result<Vec<Movie>> {
            down()
        }

        fn set_aggregate(&self, _: &str, _: Aggregate) -> Result<()> {
            down()
        }

        fn submit_rating(&self, _: &str, _: &str, _: Score) -> Result<Rating> {
            down()
        }

        fn list_ratings(&self, _: &str) -> Result<Vec<Rating>> {
            down()
        }

        fn user_rating(&self, _: &str, _: &str) -> Result<Option<Rating>> {
            down()
        }

        fn toggle_favorite(&self, _: &str, _: &str) -> Result<bool> {
            down()
        }

        fn favorites(&self, _: &str) -> Result<Vec<String>> {
            down()
        }

        fn add_comment(&self, _: &Comment) -> Result<()> {
            down()
        }

        fn list_comments(&self, _: &str) -> Result<Vec<Comment>> {
            down()
        }

        fn react_to_comment(&self, _: &Uuid, _: Reaction) -> Result<Comment> {
            down()
        }
    }

    #[test]
    fn rating_is_a_single_row_per_user() -> std::result::Result<(), Error> {
        let service = service()?;

        for score in 1..=5 {
            service.rate_movie("ana", "Matrix", score)?;

            let ratings = service.list_ratings("Matrix")?;
            assert_eq!(ratings.len(), 1);
            assert_eq!(ratings[0].username, "ana");
            assert_eq!(i64::from(ratings[0].score.value()), score);
        }

        Ok(())
    }

    #[test]
    fn rating_again_is_idempotent() -> std::result::Result<(), Error> {
        let service = service()?;

        service.rate_movie("ana", "El Padrino", 5)?;
        let first = service.rate_movie("beto", "El Padrino", 2)?;
        let second = service.rate_movie("beto", "El Padrino", 2)?;

        assert_eq!(first, second);
        assert_eq!(service.store().movie("El Padrino")?.aggregate, second);

        Ok(())
    }

    #[test]
    fn matrix_scenario() -> std::result::Result<(), Error> {
        let service = service()?;

        service.rate_movie("ana", "Matrix", 4)?;
        service.rate_movie("beto", "Matrix", 5)?;
        let aggregate = service.rate_movie("carla", "Matrix", 3)?;
        assert_approx_eq!(aggregate.average, 4.0);
        assert_eq!(aggregate.count, 3);

        let aggregate = service.rate_movie("dani", "Matrix", 2)?;
        assert_approx_eq!(aggregate.average, 3.5);
        assert_eq!(aggregate.count, 4);

        let cached = service.store().movie("Matrix")?.aggregate;
        assert_eq!(cached, aggregate);

        Ok(())
    }

    #[test]
    fn aggregate_tracks_every_change() -> std::result::Result<(), Error> {
        let service = service()?;
        let steps = vec![("ana", 5), ("beto", 4), ("ana", 1), ("carla", 4), ("beto", 5)];

        for (username, score) in steps {
            let aggregate = service.rate_movie(username, "El Resplandor", score)?;
            let scores: Vec<f64> = service
                .list_ratings("El Resplandor")?
                .iter()
                .map(|rating| f64::from(rating.score.value()))
                .collect();

            let expected = aggregate::round_tenth(scores.iter().sum::<f64>() / scores.len() as f64);
            assert_approx_eq!(aggregate.average, expected);
            assert_eq!(aggregate.count as usize, scores.len());
        }

        Ok(())
    }

    #[test]
    fn invalid_score_is_not_stored() -> std::result::Result<(), Error> {
        let service = service()?;

        for score in &[0, 6, -1] {
            let err = service.rate_movie("ana", "Matrix", *score).unwrap_err();
            assert_eq!(kind(&err), Some(&ErrorKind::InvalidScore(*score)));
        }

        assert!(service.list_ratings("Matrix")?.is_empty());
        Ok(())
    }

    #[test]
    fn unknown_movie() -> std::result::Result<(), Error> {
        let service = service()?;
        let err = service.rate_movie("ana", "Matrix 4", 3).unwrap_err();

        assert_eq!(kind(&err), Some(&ErrorKind::MovieNotFound("Matrix 4".into())));
        Ok(())
    }

    #[test]
    fn unavailable_store() -> std::result::Result<(), Error> {
        let catalog = Arc::new(Catalog::embedded()?);
        let service = Service::new(Arc::new(UnavailableStore), catalog);

        let err = service.rate_movie("ana", "Matrix", 3).unwrap_err();
        assert!(matches!(kind(&err), Some(ErrorKind::StoreUnavailable(_))));

        let response = Response::from_error(&err);
        assert_eq!(response.code, Some("store_unavailable"));

        // Login must not hide an outage behind a credentials error
        let err = service.login("ana", "secreto123").unwrap_err();
        assert!(matches!(kind(&err), Some(ErrorKind::StoreUnavailable(_))));

        Ok(())
    }

    #[test]
    fn toggle_favorite_is_its_own_inverse() -> std::result::Result<(), Error> {
        let service = service()?;
        service.register_user("ana", "Ana", "secreto123", None)?;

        assert!(service.toggle_favorite("ana", "Matrix")?);
        assert_eq!(service.favorites("ana")?, vec!["Matrix".to_string()]);

        assert!(!service.toggle_favorite("ana", "Matrix")?);
        assert!(service.favorites("ana")?.is_empty());

        Ok(())
    }

    #[test]
    fn toggle_favorite_of_unknown_user() -> std::result::Result<(), Error> {
        let service = service()?;
        let err = service.toggle_favorite("nadie", "Matrix").unwrap_err();

        assert_eq!(kind(&err), Some(&ErrorKind::UserNotFound("nadie".into())));
        Ok(())
    }

    #[test]
    fn long_comment_is_rejected() -> std::result::Result<(), Error> {
        let service = service()?;
        let text = "a".repeat(validation::MAX_COMMENT_LEN + 1);

        let err = service.add_comment("ana", "Matrix", &text).unwrap_err();
        assert!(matches!(kind(&err), Some(ErrorKind::ValidationError(_))));
        assert!(service.list_comments("Matrix")?.is_empty());

        let text = "a".repeat(validation::MAX_COMMENT_LEN);
        service.add_comment("ana", "Matrix", &text)?;
        assert_eq!(service.list_comments("Matrix")?.len(), 1);

        Ok(())
    }

    #[test]
    fn comments_and_reactions() -> std::result::Result<(), Error> {
        let service = service()?;

        let first = service.add_comment("ana", "Matrix", "Un clásico")?;
        let second = service.add_comment("beto", "Matrix", "Muy larga")?;

        let comments = service.list_comments("Matrix")?;
        assert_eq!(comments[0].id, second.id);
        assert_eq!(comments[1].id, first.id);

        service.react_to_comment(&first.id.to_string(), "like")?;
        let reacted = service.react_to_comment(&first.id.to_string(), "dislike")?;
        assert_eq!((reacted.likes, reacted.dislikes), (1, 1));

        assert!(service.react_to_comment("not-a-uuid", "like").is_err());
        assert!(service
            .react_to_comment(&first.id.to_string(), "love")
            .is_err());

        Ok(())
    }

    #[test]
    fn register_and_login() -> std::result::Result<(), Error> {
        let service = service()?;

        let user = service.register_user(" ana ", "Ana", "secreto123", Some("ana@cinetec.pe"))?;
        assert_eq!(user.username, "ana");
        assert_ne!(user.password_hash, "secreto123");

        assert_eq!(service.login("ana", "secreto123")?.username, "ana");

        let wrong = service.login("ana", "secreto").unwrap_err();
        let unknown = service.login("nadie", "secreto123").unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());

        let duplicate = service.register_user("ana", "Otra Ana", "secreto123", None);
        assert!(duplicate.is_err());

        Ok(())
    }

    #[test]
    fn register_validation() -> std::result::Result<(), Error> {
        let service = service()?;

        assert!(service.register_user("", "Ana", "secreto123", None).is_err());
        assert!(service.register_user("ana", " ", "secreto123", None).is_err());
        assert!(service.register_user("ana", "Ana", "123", None).is_err());
        assert!(service
            .register_user("ana", "Ana", "secreto123", Some("ana.cinetec.pe"))
            .is_err());
        assert!(service.user("ana").is_err());

        Ok(())
    }

    #[test]
    fn profile_edits() -> std::result::Result<(), Error> {
        let service = service()?;
        service.register_user("ana", "Ana", "secreto123", None)?;

        let user = service.update_profile(
            "ana",
            ProfileUpdate {
                description: Some(" Cinéfila ".into()),
                photo: Some("avatars/ana.png".into()),
                ..Default::default()
            },
        )?;
        assert_eq!(user.display_name, "Ana");
        assert_eq!(user.description, "Cinéfila");
        assert_eq!(user.photo, "avatars/ana.png");

        let user = service.reset_photo("ana")?;
        assert_eq!(user.photo, store::DEFAULT_PHOTO);

        assert!(service.update_profile("ana", ProfileUpdate::default()).is_err());

        Ok(())
    }

    #[test]
    fn details_for_a_viewer() -> std::result::Result<(), Error> {
        let service = service()?;
        service.register_user("ana", "Ana", "secreto123", None)?;
        service.rate_movie("ana", "Matrix", 5)?;
        service.toggle_favorite("ana", "Matrix")?;
        service.add_comment("ana", "Matrix", "Un clásico")?;

        let details = service.movie_details("Matrix", Some("ana"))?;
        assert_eq!(details.movie.aggregate.count, 1);
        assert_eq!(details.comments.len(), 1);
        assert_eq!(details.user_rating.map(|r| r.score.value()), Some(5));
        assert!(details.is_favorite);

        let anonymous = service.movie_details("Matrix", None)?;
        assert!(anonymous.user_rating.is_none());
        assert!(!anonymous.is_favorite);

        let stranger = service.movie_details("Matrix", Some("nadie"))?;
        assert!(!stranger.is_favorite);

        service.toggle_favorite("ana", "Matrix")?;
        assert!(!service.movie_details("Matrix", Some("ana"))?.is_favorite);

        Ok(())
    }

    #[test]
    fn concurrent_raters_leave_one_row_each() -> std::result::Result<(), Error> {
        let service = service()?;

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let service = service.clone();
                thread::spawn(move || -> Result<()> {
                    let username = format!("user{}", n);
                    for score in 1..=5 {
                        service.rate_movie(&username, "Matrix", score)?;
                    }
                    Ok(())
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("rater thread panicked")?;
        }

        let ratings = service.list_ratings("Matrix")?;
        assert_eq!(ratings.len(), 8);
        assert!(ratings.iter().all(|rating| rating.score.value() == 5));

        let aggregate = service.recompute_aggregate("Matrix")?;
        assert_approx_eq!(aggregate.average, 5.0);
        assert_eq!(aggregate.count, 8);

        Ok(())
    }
}
