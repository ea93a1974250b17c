//! Member authority levels.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name an [`AuthorityType`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid authority: {0}. Valid authorities: general, trainee, teacher, manager, admin")]
pub struct ParseAuthorityError(pub String);

/// Authority level of a member.
///
/// Downstream services consume these values from role-change events, so the
/// serialized form (`GENERAL`, `ADMIN`, ...) is part of the wire contract.
/// `General` is the baseline every member falls back to, including admins
/// removed from the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin.authority_type", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorityType {
    /// Regular member without administrative rights.
    #[default]
    General,
    /// Member enrolled in a course.
    Trainee,
    /// Instructor running courses.
    Teacher,
    /// Operations staff.
    Manager,
    /// Full administrative access.
    Admin,
}

impl AuthorityType {
    /// All authority levels, lowest first.
    pub const ALL: [Self; 5] = [
        Self::General,
        Self::Trainee,
        Self::Teacher,
        Self::Manager,
        Self::Admin,
    ];

    /// Wire name of the authority.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::General => "GENERAL",
            Self::Trainee => "TRAINEE",
            Self::Teacher => "TEACHER",
            Self::Manager => "MANAGER",
            Self::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for AuthorityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuthorityType {
    type Err = ParseAuthorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|authority| authority.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseAuthorityError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_general() {
        assert_eq!(AuthorityType::default(), AuthorityType::General);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("admin".parse::<AuthorityType>().unwrap(), AuthorityType::Admin);
        assert_eq!(
            " Manager ".parse::<AuthorityType>().unwrap(),
            AuthorityType::Manager
        );
        assert_eq!(
            "GENERAL".parse::<AuthorityType>().unwrap(),
            AuthorityType::General
        );
    }

    #[test]
    fn test_parse_unknown() {
        let err = "super_admin".parse::<AuthorityType>().unwrap_err();
        assert_eq!(err, ParseAuthorityError("super_admin".to_owned()));
    }

    #[test]
    fn test_display_matches_wire_name() {
        for authority in AuthorityType::ALL {
            let json = serde_json::to_string(&authority).unwrap();
            assert_eq!(json, format!("\"{authority}\""));
        }
    }
}
