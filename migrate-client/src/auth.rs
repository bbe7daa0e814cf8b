//! Session establishment: one of three ways to authenticate against the
//! analytics platform (spec §6: "user+password **or** session token **or**
//! personal token — one of three").

use serde::{Deserialize, Serialize};

/// The credentials a caller supplies to establish a session.
#[derive(Debug, Clone)]
pub enum Credentials {
    UserPassword { email: String, password: String },
    SessionToken(String),
    ApiKey(String),
}

/// An established session, carrying whatever header the platform expects
/// on subsequent requests.
#[derive(Debug, Clone)]
pub struct Session {
    pub header_name: &'static str,
    pub header_value: String,
}

impl Session {
    pub fn from_token(header_name: &'static str, token: impl Into<String>) -> Self {
        Self {
            header_name,
            header_value: token.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionResponse {
    pub id: String,
}
