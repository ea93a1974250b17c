//! Admin domain types.
//!
//! These types represent validated admin records and the inputs used to
//! create and modify them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bitbox_admin_core::{AdminId, AuthorityType, Email};

/// Maximum length of an admin's display name (in characters).
pub const MAX_NAME_LENGTH: usize = 50;

/// Maximum length of a profile image URL.
pub const MAX_PROFILE_IMAGE_URL_LENGTH: usize = 2048;

/// Precondition failures on admin input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Display name is blank or too long.
    #[error("name must be between 1 and {max} characters")]
    NameLength {
        /// Maximum allowed length.
        max: usize,
    },

    /// Profile image URL is too long.
    #[error("profile image url must be at most {max} characters")]
    ProfileImageUrlLength {
        /// Maximum allowed length.
        max: usize,
    },

    /// Profile image URL is not an http(s) URL.
    #[error("profile image url must start with http:// or https://")]
    ProfileImageUrlScheme,
}

/// An admin record (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    /// Unique admin ID, fixed at creation.
    pub id: AdminId,
    /// Admin's email address (unique among active admins).
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Optional avatar URL.
    pub profile_image_url: Option<String>,
    /// Admin's authority level.
    pub authority: AuthorityType,
    /// Soft-delete marker.
    pub deleted: bool,
    /// When the admin was created.
    pub created_at: DateTime<Utc>,
    /// When the admin was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    /// Build a new, active admin from validated creation input.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name or profile image URL is invalid.
    pub fn register(input: NewAdmin, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let name = validate_name(&input.name)?;
        let profile_image_url = input
            .profile_image_url
            .as_deref()
            .and_then(non_blank)
            .map(validate_profile_image_url)
            .transpose()?;

        Ok(Self {
            id: input.id.unwrap_or_else(AdminId::generate),
            email: input.email,
            name,
            profile_image_url,
            authority: input.authority,
            deleted: false,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Input for registering a new admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdmin {
    /// Caller-supplied ID; generated when absent.
    #[serde(default)]
    pub id: Option<AdminId>,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Optional avatar URL.
    #[serde(default)]
    pub profile_image_url: Option<String>,
    /// Initial authority level.
    #[serde(default)]
    pub authority: AuthorityType,
}

/// Partial update of an admin's profile fields.
///
/// Blank values count as absent, so a form that submits every field can be
/// passed through as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminPatch {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New avatar URL.
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

impl AdminPatch {
    /// Returns `true` if the patch carries no non-blank field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.as_deref().and_then(non_blank).is_none()
            && self.profile_image_url.as_deref().and_then(non_blank).is_none()
    }

    /// Apply the non-blank fields of this patch to `admin`.
    ///
    /// Every present field is validated before anything is written, so a
    /// rejected patch leaves `admin` untouched.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a present field is invalid.
    pub fn apply_to(&self, admin: &mut Admin) -> Result<(), ValidationError> {
        let name = self
            .name
            .as_deref()
            .and_then(non_blank)
            .map(validate_name)
            .transpose()?;
        let profile_image_url = self
            .profile_image_url
            .as_deref()
            .and_then(non_blank)
            .map(validate_profile_image_url)
            .transpose()?;

        if let Some(name) = name {
            admin.name = name;
        }
        if let Some(url) = profile_image_url {
            admin.profile_image_url = Some(url);
        }
        Ok(())
    }
}

/// Public view of an active admin, as returned by directory listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSummary {
    /// Admin ID.
    pub id: AdminId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Optional avatar URL.
    pub profile_image_url: Option<String>,
    /// Admin's authority level.
    pub authority: AuthorityType,
}

impl From<Admin> for AdminSummary {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
            name: admin.name,
            profile_image_url: admin.profile_image_url,
            authority: admin.authority,
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LENGTH {
        return Err(ValidationError::NameLength {
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(name.to_owned())
}

fn validate_profile_image_url(url: &str) -> Result<String, ValidationError> {
    let url = url.trim();
    if url.len() > MAX_PROFILE_IMAGE_URL_LENGTH {
        return Err(ValidationError::ProfileImageUrlLength {
            max: MAX_PROFILE_IMAGE_URL_LENGTH,
        });
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ValidationError::ProfileImageUrlScheme);
    }
    Ok(url.to_owned())
}
