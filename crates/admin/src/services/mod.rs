//! Business logic services for the admin directory.
//!
//! # Services
//!
//! - `directory` - Admin registration, lookup, profile and authority management

pub mod directory;

pub use directory::AdminDirectory;
