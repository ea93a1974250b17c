//! Role-change event payload.
//!
//! Published to the member authority channel whenever an admin's authority
//! changes, including the implicit demotion to [`AuthorityType::General`]
//! when an admin is removed from the directory.

use serde::{Deserialize, Serialize};

use crate::types::{AdminId, AuthorityType};

/// A member's new authority level.
///
/// Serialized with camelCase keys:
///
/// ```json
/// {"memberId":"6f1c...","memberAuthority":"ADMIN"}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleChangeEvent {
    /// The admin whose authority changed.
    pub member_id: AdminId,
    /// The authority the member now holds.
    pub member_authority: AuthorityType,
}

impl RoleChangeEvent {
    /// Event for an explicit authority change.
    #[must_use]
    pub const fn new(member_id: AdminId, member_authority: AuthorityType) -> Self {
        Self {
            member_id,
            member_authority,
        }
    }

    /// Event emitted when an admin is removed: a demotion to `GENERAL`.
    #[must_use]
    pub const fn demotion(member_id: AdminId) -> Self {
        Self::new(member_id, AuthorityType::General)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_demotion_targets_general() {
        let id = AdminId::generate();
        let event = RoleChangeEvent::demotion(id);
        assert_eq!(event.member_id, id);
        assert_eq!(event.member_authority, AuthorityType::General);
    }

    #[test]
    fn test_wire_format_uses_camel_case() {
        let id = AdminId::new(uuid::Uuid::nil());
        let json = serde_json::to_value(RoleChangeEvent::new(id, AuthorityType::Admin)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "memberId": "00000000-0000-0000-0000-000000000000",
                "memberAuthority": "ADMIN",
            })
        );
    }
}
