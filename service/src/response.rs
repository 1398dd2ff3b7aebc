// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use anyhow::Error;
use serde::Serialize;
use serde_json::{Map, Value};
use store::ErrorKind;

const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable, please try again";

/// Outcome of an operation, rendered as `{success, ...fields, error?, code?}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub success: bool,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            fields: Map::new(),
            error: None,
            code: None,
        }
    }

    /// Add a field to the response body
    pub fn with<T: Serialize>(mut self, key: &str, value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.fields.insert(key.into(), value);
                self
            }
            Err(e) => Self::from_error(&Error::from(e)),
        }
    }

    /// Build a successful response holding a single field, or the error
    pub fn from_result<T: Serialize>(key: &str, result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => Self::ok().with(key, value),
            Err(e) => Self::from_error(&e),
        }
    }

    pub fn from_error(error: &Error) -> Self {
        let (message, code) = match error.downcast_ref::<ErrorKind>() {
            Some(ErrorKind::StoreUnavailable(reason)) => {
                log::error!("Store unavailable: {}", reason);
                (UNAVAILABLE_MESSAGE.to_string(), "store_unavailable")
            }
            Some(kind) => (kind.to_string(), kind.code()),
            None => {
                log::error!("Unexpected error: {:#}", error);
                (UNAVAILABLE_MESSAGE.to_string(), "store_unavailable")
            }
        };

        Self {
            success: false,
            fields: Map::new(),
            error: Some(message),
            code: Some(code),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Bool(self.success))
    }
}
