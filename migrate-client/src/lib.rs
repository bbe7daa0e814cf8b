//! # migrate-client
//!
//! HTTP client for the analytics platform's administration API.
//!
//! The migration engine consumes this crate only through the [`Client`]
//! trait: session management, retries, and pagination are this crate's
//! concern, not the core engine's. [`ReqwestClient`] is the concrete
//! implementation used in production; tests can substitute any other
//! `Client` implementation.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;

pub use auth::{Credentials, Session};
pub use client::{Client, ReqwestClient};
pub use error::{ClientError, ClientResult};
pub use models::{CollectionId, CollectionItem, CollectionNode, ItemsQuery};
