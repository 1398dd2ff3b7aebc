// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

#[macro_use]
extern crate diesel;

pub mod models;
pub mod schema;

use crate::models::{validated_limit, ContactMessage, NewContact};
use crate::schema::contacts;
use config::ContactsConfig;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::{insert_into, prelude::*};
use store::{ErrorKind, Result};

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Messages sent through the public contact form
pub struct ContactBook {
    pool: PgPool,
}

impl ContactBook {
    pub fn from_config(config: &ContactsConfig) -> Result<Self> {
        let url = config
            .psql_url
            .as_deref()
            .ok_or_else(|| ErrorKind::unavailable("no postgres url configured"))?;

        let manager = ConnectionManager::<PgConnection>::new(url);
        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .connection_timeout(config.connect_timeout())
            .build(manager)
            .map_err(ErrorKind::unavailable)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>> {
        Ok(self.pool.get().map_err(ErrorKind::unavailable)?)
    }

    pub fn register(&self, name: &str, email: &str, message: &str) -> Result<ContactMessage> {
        let contact = NewContact::validated(name, email, message)?;
        let conn = self.conn()?;

        let saved: ContactMessage = insert_into(contacts::table)
            .values(&contact)
            .get_result(&conn)
            .map_err(ErrorKind::unavailable)?;

        log::info!("Contact message({}) saved from {}", saved.id, saved.email);
        Ok(saved)
    }

    pub fn recent(&self, limit: i64) -> Result<Vec<ContactMessage>> {
        let limit = validated_limit(limit)?;
        let conn = self.conn()?;

        let messages = contacts::table
            .order(contacts::created_at.desc())
            .limit(limit)
            .load::<ContactMessage>(&conn)
            .map_err(ErrorKind::unavailable)?;

        Ok(messages)
    }
}
