// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use anyhow::Error;
use config::Config;
use mongo_store::MongoStore;
use std::collections::HashMap;
use store::{Catalog, Store};

fn main() -> Result<(), Error> {
    let vars: HashMap<String, String> = dotenv::vars().collect();
    let mut config = Config::default();
    config.apply_env(&vars)?;

    let catalog = match &config.catalog.path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::embedded()?,
    };

    let store = MongoStore::from_config(&config.store)?;

    let inserted = store.seed_movies(catalog.movies())?;
    println!(
        "Inserted {} movies ({} already present)",
        inserted,
        catalog.len() - inserted
    );

    store.ensure_indexes()?;
    println!("Indexes created, database ready");

    Ok(())
}
