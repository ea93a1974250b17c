//! Domain models for the admin directory.

pub mod admin;

pub use admin::{Admin, AdminPatch, AdminSummary, NewAdmin, ValidationError};
