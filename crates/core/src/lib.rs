//! Bitbox Admin Core - Shared types library.
//!
//! This crate provides the types shared by every Bitbox admin component:
//! - `admin` - The admin directory service and its collaborators
//! - `cli` - Command-line tools for migrations and directory operations
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no
//! message broker clients. The `postgres` feature adds `sqlx` encode/decode
//! impls so the same types can be bound directly in queries.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for admin IDs, emails and authority levels
//! - [`event`] - Payloads published when an admin's authority changes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod event;
pub mod types;

pub use event::RoleChangeEvent;
pub use types::*;
