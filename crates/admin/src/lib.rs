//! Bitbox admin directory.
//!
//! Manages the administrator accounts of the Bitbox platform and announces
//! authority changes to the rest of the platform.
//!
//! The [`AdminDirectory`] service runs on top of two collaborators:
//! - an [`AdminStore`](db::AdminStore) holding admin records
//!   (`PostgreSQL` or in-memory)
//! - an [`EventPublisher`](events::EventPublisher) delivering role-change
//!   events (`PostgreSQL` `NOTIFY` or in-memory)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod services;
pub mod telemetry;

pub use config::{ConfigError, DatabaseConfig, DirectoryConfig};
pub use error::DirectoryError;
pub use services::AdminDirectory;
