// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

pub mod parser;
pub mod table;

use anyhow::Error;
use clap::{App, Arg};
use config::{Backend, Config};
use contacts::ContactBook;
use memory_store::MemoryStore;
use mongo_store::MongoStore;
use parser::{ProfileField, Statement};
use service::{Response, Service};
use simplelog::{LevelFilter, TermLogger, TerminalMode};
use std::collections::HashMap;
use std::sync::Arc;
use store::{Catalog, ErrorKind, NoopStore, ProfileUpdate, Store};
use table::ToTable;

macro_rules! prompt {
    ($ed:ident, $user:expr) => {{
        use rustyline::error::ReadlineError;

        let msg = match $user {
            Some(user) => format!("({}) {}", user, PROMPT),
            None => format!("{}", PROMPT),
        };

        match $ed.readline(&msg) {
            Ok(line) => {
                $ed.add_history_entry(line.as_str());
                Ok(line)
            }

            Err(ReadlineError::Interrupted) => {
                continue;
            }

            Err(ReadlineError::Eof) => {
                println!("Exiting...Good bye!");
                break;
            }

            Err(e) => Err(e),
        }
    }};
}

const VERSION: &str = env!("CARGO_PKG_VERSION");
const PROMPT: &str = ">> ";

fn init_logger(level: &str, verbosity: u64) {
    let level = match verbosity {
        0 => level.parse().unwrap_or(LevelFilter::Info),
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    if let Err(e) = TermLogger::init(level, simplelog::Config::default(), TerminalMode::Mixed) {
        eprintln!("Couldn't initialize logger: {}", e);
    }
}

fn build_store(config: &Config, catalog: &Arc<Catalog>) -> Result<Arc<dyn Store>, Error> {
    let store: Arc<dyn Store> = match config.store.backend {
        Backend::Mongo => {
            let store = MongoStore::from_config(&config.store)?;
            store.ensure_indexes()?;
            Arc::new(store)
        }

        Backend::Memory => Arc::new(MemoryStore::new()),
        Backend::Noop => Arc::new(NoopStore::new(catalog.clone())),
    };

    log::info!("Using the {} store", store.backend());
    Ok(store)
}

fn build_contacts(config: &Config) -> Option<ContactBook> {
    config.contacts.psql_url.as_ref()?;

    match ContactBook::from_config(&config.contacts) {
        Ok(book) => Some(book),
        Err(e) => {
            log::warn!("Contact book disabled: {}", e);
            None
        }
    }
}

fn current_user(session: &Option<String>) -> Result<&str, Error> {
    session
        .as_deref()
        .ok_or_else(|| ErrorKind::validation("You must login first").into())
}

fn contacts_disabled() -> Response {
    Response::from_error(&Error::from(ErrorKind::unavailable("contact book disabled")))
}

fn execute(
    statement: Statement,
    service: &Service,
    contacts: Option<&ContactBook>,
    session: &mut Option<String>,
) -> Response {
    match statement {
        Statement::Register {
            username,
            display_name,
            password,
            email,
        } => Response::from_result(
            "user",
            service.register_user(&username, &display_name, &password, email.as_deref()),
        ),

        Statement::Login(username, password) => match service.login(&username, &password) {
            Ok(user) => {
                *session = Some(user.username.clone());
                Response::ok().with("user", user)
            }
            Err(e) => Response::from_error(&e),
        },

        Statement::Logout => {
            *session = None;
            Response::ok()
        }

        Statement::User(username) => Response::from_result("user", service.user(&username)),

        Statement::Users => Response::from_result("users", service.store().users()),

        Statement::Profile(field, value) => {
            let update = match field {
                ProfileField::DisplayName => ProfileUpdate {
                    display_name: Some(value),
                    ..Default::default()
                },
                ProfileField::Description => ProfileUpdate {
                    description: Some(value),
                    ..Default::default()
                },
                ProfileField::Photo => ProfileUpdate {
                    photo: Some(value),
                    ..Default::default()
                },
            };

            let result = current_user(session).and_then(|u| service.update_profile(u, update));
            Response::from_result("user", result)
        }

        Statement::ResetPhoto => {
            let result = current_user(session).and_then(|u| service.reset_photo(u));
            Response::from_result("user", result)
        }

        Statement::Movies => Response::from_result("movies", service.movies()),

        Statement::Movie(title) => Response::from_result(
            "details",
            service.movie_details(&title, session.as_deref()),
        ),

        Statement::Rate(title, score) => {
            let result = current_user(session).and_then(|u| service.rate_movie(u, &title, score));
            Response::from_result("aggregate", result)
        }

        Statement::Ratings(title) => Response::from_result("ratings", service.list_ratings(&title)),

        Statement::Favorite(title) => {
            let result = current_user(session).and_then(|u| service.toggle_favorite(u, &title));
            Response::from_result("is_favorite", result)
        }

        Statement::Favorites => {
            let result = current_user(session).and_then(|u| service.favorites(u));
            Response::from_result("favorites", result)
        }

        Statement::Comment(title, text) => {
            let result =
                current_user(session).and_then(|u| service.add_comment(u, &title, &text));
            Response::from_result("comment", result)
        }

        Statement::Comments(title) => {
            Response::from_result("comments", service.list_comments(&title))
        }

        Statement::React(id, reaction) => {
            Response::from_result("comment", service.react_to_comment(&id, &reaction))
        }

        Statement::Contact(name, email, message) => match contacts {
            Some(book) => Response::from_result("contact", book.register(&name, &email, &message)),
            None => contacts_disabled(),
        },

        Statement::Contacts(limit) => match contacts {
            Some(book) => Response::from_result("contacts", book.recent(limit)),
            None => contacts_disabled(),
        },
    }
}

fn show(response: &Response, as_table: bool) {
    let json = response.to_json();

    if as_table {
        json.to_table().printstd();
    } else {
        match serde_json::to_string_pretty(&json) {
            Ok(text) => println!("{}", text),
            Err(e) => log::error!("Couldn't render response: {}", e),
        }
    }
}

fn print_help() {
    println!("Main help:");
    println!("h | help                                  Shows this help");
    println!("q | quit                                  Quit");
    println!("register('user', 'name', 'pass'[, 'mail']) Create an account");
    println!("login('user', 'pass') | logout            Start or end a session");
    println!("user('user') | users                      Show users");
    println!("profile(name|description|photo, 'value')  Edit your profile");
    println!("reset_photo                               Restore the default photo");
    println!("movies | movie('title')                   Show the catalog or a movie");
    println!("rate('title', 1..5) | ratings('title')    Rate a movie, list its ratings");
    println!("fav('title') | favs                       Toggle or list favorites");
    println!("comment('title', 'text')                  Comment on a movie");
    println!("comments('title')                         List the comments of a movie");
    println!("react('comment id', like|dislike)         React to a comment");
    println!("contact('name', 'mail', 'message')        Leave us a message");
    println!("contacts(n)                               Show the last n messages");
}

fn main() -> Result<(), Error> {
    let matches = App::new("cinetec")
        .version(VERSION)
        .about("CineTec movie catalog console")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .takes_value(true)
                .help("TOML configuration file"),
        )
        .arg(
            Arg::with_name("table")
                .short("t")
                .long("table")
                .help("Print responses as tables instead of JSON"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Increase log verbosity"),
        )
        .get_matches();

    dotenv::dotenv().ok();

    let mut config = match matches.value_of("config") {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let vars: HashMap<String, String> = std::env::vars().collect();
    config.apply_env(&vars)?;

    init_logger(&config.log.level, matches.occurrences_of("verbose"));

    let catalog = Arc::new(match &config.catalog.path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::embedded()?,
    });
    log::info!("Loaded catalog with {} movies", catalog.len());

    let store = build_store(&config, &catalog)?;
    let service = Service::new(store, catalog);
    service.seed_catalog()?;

    let contacts = build_contacts(&config);
    let as_table = matches.is_present("table");

    println!("Welcome to cinetec {}", VERSION);
    let mut rl = rustyline::Editor::<()>::new();
    let mut session: Option<String> = None;

    loop {
        let line: String = prompt!(rl, session.as_deref())?;

        match line.trim() {
            "?" | "h" | "help" => print_help(),

            "q" | "quit" => {
                println!("Bye!");
                break;
            }

            "v" | "version" => {
                println!("version: {}", VERSION);
            }

            empty if empty.is_empty() => {}

            line => match parser::parse_line(line) {
                Some(statement) => {
                    let response = execute(statement, &service, contacts.as_ref(), &mut session);
                    show(&response, as_table);
                }
                None => println!("Invalid syntax!"),
            },
        }
    }

    Ok(())
}
