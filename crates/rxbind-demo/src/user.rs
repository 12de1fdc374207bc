#![forbid(unsafe_code)]

//! The user payload shown by the list screen.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub age: u32,
}

impl User {
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self {
            name: name.into(),
            age,
        }
    }
}

/// The list the users screen starts with.
#[must_use]
pub fn default_users() -> Vec<User> {
    vec![
        User::new("Anton", 18),
        User::new("Max", 21),
        User::new("Alex", 31),
    ]
}

/// Decode a JSON array of users.
pub fn decode_users(bytes: &[u8]) -> Result<Vec<User>, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}
