// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use rand::Rng;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a password as `salt$hex(sha256(salt + password))`
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::thread_rng().gen();
    let salt = hex::encode(salt);
    let hash = digest(&salt, password);

    format!("{}${}", salt, hash)
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => !salt.is_empty() && digest(salt, password) == hash,
        None => false,
    }
}
