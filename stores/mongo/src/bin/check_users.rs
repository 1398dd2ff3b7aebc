// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use anyhow::Error;
use config::Config;
use mongo_store::MongoStore;
use std::collections::HashMap;
use store::Store;

fn main() -> Result<(), Error> {
    let vars: HashMap<String, String> = dotenv::vars().collect();
    let mut config = Config::default();
    config.apply_env(&vars)?;

    let store = MongoStore::from_config(&config.store)?;
    let users = store.users()?;

    println!("Found {} users", users.len());
    for user in users {
        println!(
            "- {} ({}), {} favorites",
            user.username,
            user.display_name,
            user.favorites.len()
        );
    }

    Ok(())
}
