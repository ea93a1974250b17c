//! Core types for the admin directory.
//!
//! This module provides type-safe wrappers for the directory's domain concepts.

pub mod authority;
pub mod email;
pub mod id;

pub use authority::{AuthorityType, ParseAuthorityError};
pub use email::{Email, EmailError};
pub use id::{AdminId, ParseIdError};
