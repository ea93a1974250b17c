//! Admin directory service.
//!
//! Owns the lifecycle of admin records:
//! 1. Registration, guarded by duplicate-ID and duplicate-email checks
//! 2. Lookup by ID (deleted records included) and listing of active admins
//! 3. Profile updates, authority changes and soft deletion
//!
//! Authority changes and deletions publish a [`RoleChangeEvent`] so other
//! services can adjust the member's permissions. A deletion is announced as a
//! demotion to `GENERAL`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use bitbox_admin_core::{AdminId, AuthorityType, RoleChangeEvent};

use crate::db::{AdminStore, AdminTransaction, RepositoryError};
use crate::error::DirectoryError;
use crate::events::EventPublisher;
use crate::models::{Admin, AdminPatch, AdminSummary, NewAdmin};

/// Admin directory service.
///
/// Every operation runs in a single store transaction: the existence or
/// uniqueness check, the mutation and the commit cannot interleave with
/// another operation on the same record.
#[derive(Clone)]
pub struct AdminDirectory {
    store: Arc<dyn AdminStore>,
    publisher: Arc<dyn EventPublisher>,
    channel: String,
}

impl std::fmt::Debug for AdminDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminDirectory")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

impl AdminDirectory {
    /// Create a new admin directory.
    ///
    /// `channel` is the name role-change events are published on.
    #[must_use]
    pub fn new(
        store: Arc<dyn AdminStore>,
        publisher: Arc<dyn EventPublisher>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            store,
            publisher,
            channel: channel.into(),
        }
    }

    /// Register a new admin.
    ///
    /// No event is published for a new registration.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Validation` if the input is invalid.
    /// Returns `DirectoryError::DuplicateId` if a record, deleted or not,
    /// already has the supplied ID.
    /// Returns `DirectoryError::DuplicateEmail` if an active admin already
    /// uses the email.
    /// Returns `DirectoryError::Repository` if the store fails.
    #[instrument(skip(self, input), fields(email = %input.email, authority = %input.authority))]
    pub async fn create(&self, input: NewAdmin) -> Result<Admin, DirectoryError> {
        let admin = Admin::register(input, Utc::now())?;

        let mut tx = self.store.begin().await?;
        if tx.find_by_id_for_update(admin.id).await?.is_some() {
            return Err(DirectoryError::DuplicateId(admin.id));
        }
        if tx.count_active_by_email(&admin.email).await? != 0 {
            return Err(DirectoryError::DuplicateEmail(admin.email));
        }

        // The checks above can still lose a race with a concurrent registration.
        let saved = tx.insert(&admin).await.map_err(|e| match e {
            RepositoryError::IdConflict(id) => DirectoryError::DuplicateId(id),
            RepositoryError::Conflict(_) => DirectoryError::DuplicateEmail(admin.email.clone()),
            other => other.into(),
        })?;
        tx.commit().await?;

        info!(admin_id = %saved.id, "Registered admin");
        Ok(saved)
    }

    /// Get an admin by ID, whether deleted or not.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` if no record has this ID.
    /// Returns `DirectoryError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: AdminId) -> Result<Admin, DirectoryError> {
        let mut tx = self.store.begin().await?;
        let admin = tx.find_by_id(id).await?;
        tx.commit().await?;

        admin.ok_or(DirectoryError::NotFound(id))
    }

    /// List all active admins in registration order.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<AdminSummary>, DirectoryError> {
        let mut tx = self.store.begin().await?;
        let admins = tx.find_all_active().await?;
        tx.commit().await?;

        Ok(admins.into_iter().map(AdminSummary::from).collect())
    }

    /// Apply the non-blank fields of `patch` to an admin's profile.
    ///
    /// An empty patch is accepted and leaves the profile unchanged.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` if no record has this ID.
    /// Returns `DirectoryError::Validation` if a present field is invalid.
    /// Returns `DirectoryError::Repository` if the store fails.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: AdminId, patch: AdminPatch) -> Result<bool, DirectoryError> {
        let mut tx = self.store.begin().await?;
        let mut admin = Self::resolve(tx.as_mut(), id).await?;

        patch.apply_to(&mut admin)?;
        admin.updated_at = Utc::now();
        tx.save(&admin).await?;
        tx.commit().await?;

        info!(admin_id = %id, empty = patch.is_empty(), "Updated admin profile");
        Ok(true)
    }

    /// Change an admin's authority and announce it.
    ///
    /// The event is published once the new authority is set on the record,
    /// before the write is committed.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` if no record has this ID.
    /// Returns `DirectoryError::Repository` if the store fails.
    #[instrument(skip(self), fields(authority = %authority))]
    pub async fn update_role(
        &self,
        member_id: AdminId,
        authority: AuthorityType,
    ) -> Result<Admin, DirectoryError> {
        let mut tx = self.store.begin().await?;
        let mut admin = Self::resolve(tx.as_mut(), member_id).await?;

        let previous = admin.authority;
        admin.authority = authority;
        admin.updated_at = Utc::now();
        self.announce(RoleChangeEvent::new(member_id, authority)).await;

        let saved = tx.save(&admin).await?;
        tx.commit().await?;

        info!(admin_id = %member_id, %previous, "Changed admin authority");
        Ok(saved)
    }

    /// Soft-delete an admin and announce a demotion to `GENERAL`.
    ///
    /// The record stays retrievable through [`get_by_id`](Self::get_by_id).
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` if no record has this ID.
    /// Returns `DirectoryError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: AdminId) -> Result<(), DirectoryError> {
        let mut tx = self.store.begin().await?;
        let mut admin = Self::resolve(tx.as_mut(), id).await?;

        admin.deleted = true;
        admin.updated_at = Utc::now();
        self.announce(RoleChangeEvent::demotion(id)).await;

        tx.save(&admin).await?;
        tx.commit().await?;

        warn!(admin_id = %id, "Deleted admin");
        Ok(())
    }

    /// Load a record for modification, locking it for the rest of `tx`.
    async fn resolve(tx: &mut dyn AdminTransaction, id: AdminId) -> Result<Admin, DirectoryError> {
        tx.find_by_id_for_update(id)
            .await?
            .ok_or(DirectoryError::NotFound(id))
    }

    /// Publish a role-change event, logging instead of failing.
    async fn announce(&self, event: RoleChangeEvent) {
        if let Err(e) = self.publisher.publish(&self.channel, &event).await {
            warn!(
                channel = %self.channel,
                member_id = %event.member_id,
                authority = %event.member_authority,
                error = %e,
                "Failed to publish role change event"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use async_trait::async_trait;

    use bitbox_admin_core::Email;

    use super::*;
    use crate::db::InMemoryAdminStore;
    use crate::events::{InMemoryPublisher, PublishError};

    const CHANNEL: &str = "member-authority";

    struct ClosedPublisher;

    #[async_trait]
    impl EventPublisher for ClosedPublisher {
        async fn publish(&self, _: &str, _: &RoleChangeEvent) -> Result<(), PublishError> {
            Err(PublishError::Closed("broker unavailable".to_owned()))
        }
    }

    fn setup() -> (AdminDirectory, InMemoryAdminStore, InMemoryPublisher) {
        let store = InMemoryAdminStore::new();
        let publisher = InMemoryPublisher::new();
        let directory = AdminDirectory::new(
            Arc::new(store.clone()),
            Arc::new(publisher.clone()),
            CHANNEL,
        );
        (directory, store, publisher)
    }

    fn new_admin(email: &str, authority: AuthorityType) -> NewAdmin {
        NewAdmin {
            id: None,
            email: Email::parse(email).unwrap(),
            name: "Kim Bitbox".to_owned(),
            profile_image_url: None,
            authority,
        }
    }

    #[tokio::test]
    async fn test_create_returns_active_record() {
        let (directory, store, publisher) = setup();

        let admin = directory
            .create(new_admin("a@x.com", AuthorityType::Manager))
            .await
            .unwrap();

        assert!(!admin.deleted);
        assert_eq!(admin.authority, AuthorityType::Manager);
        assert_eq!(store.snapshot().await, vec![admin]);
        assert!(publisher.published().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let (directory, store, _) = setup();
        directory
            .create(new_admin("a@x.com", AuthorityType::General))
            .await
            .unwrap();

        let err = directory
            .create(new_admin("a@x.com", AuthorityType::Admin))
            .await
            .unwrap_err();

        assert!(matches!(err, DirectoryError::DuplicateEmail(email) if email.as_str() == "a@x.com"));
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_name() {
        let (directory, store, _) = setup();
        let input = NewAdmin {
            name: "  ".to_owned(),
            ..new_admin("a@x.com", AuthorityType::General)
        };

        let err = directory.create(input).await.unwrap_err();

        assert!(matches!(err, DirectoryError::Validation(_)));
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_existing_id() {
        let (directory, store, publisher) = setup();
        let first = directory
            .create(new_admin("a@x.com", AuthorityType::General))
            .await
            .unwrap();

        let input = NewAdmin {
            id: Some(first.id),
            ..new_admin("other@x.com", AuthorityType::Admin)
        };
        let err = directory.create(input).await.unwrap_err();

        assert!(matches!(err, DirectoryError::DuplicateId(id) if id == first.id));
        assert_eq!(store.snapshot().await, vec![first]);
        assert!(publisher.published().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_role_publishes_one_event() {
        let (directory, _, publisher) = setup();
        let admin = directory
            .create(new_admin("b@x.com", AuthorityType::General))
            .await
            .unwrap();

        let updated = directory
            .update_role(admin.id, AuthorityType::Admin)
            .await
            .unwrap();

        assert_eq!(updated.authority, AuthorityType::Admin);
        assert_eq!(
            directory.get_by_id(admin.id).await.unwrap().authority,
            AuthorityType::Admin
        );
        let published = publisher.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].channel, CHANNEL);
        assert_eq!(
            published[0].event,
            RoleChangeEvent::new(admin.id, AuthorityType::Admin)
        );
    }

    #[tokio::test]
    async fn test_delete_is_soft_and_announces_demotion() {
        let (directory, _, publisher) = setup();
        let admin = directory
            .create(new_admin("c@x.com", AuthorityType::Teacher))
            .await
            .unwrap();

        directory.delete(admin.id).await.unwrap();

        let stored = directory.get_by_id(admin.id).await.unwrap();
        assert!(stored.deleted);
        assert_eq!(stored.authority, AuthorityType::Teacher);
        assert!(directory.list_all().await.unwrap().is_empty());
        let published = publisher.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event, RoleChangeEvent::demotion(admin.id));
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found_without_side_effects() {
        let (directory, store, publisher) = setup();
        let unknown = AdminId::generate();

        assert!(matches!(
            directory.get_by_id(unknown).await,
            Err(DirectoryError::NotFound(id)) if id == unknown
        ));
        assert!(matches!(
            directory.update(unknown, AdminPatch::default()).await,
            Err(DirectoryError::NotFound(_))
        ));
        assert!(matches!(
            directory.update_role(unknown, AuthorityType::Admin).await,
            Err(DirectoryError::NotFound(_))
        ));
        assert!(matches!(
            directory.delete(unknown).await,
            Err(DirectoryError::NotFound(_))
        ));

        assert!(store.snapshot().await.is_empty());
        assert!(publisher.published().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_applies_partial_patch() {
        let (directory, _, publisher) = setup();
        let admin = directory
            .create(new_admin("d@x.com", AuthorityType::General))
            .await
            .unwrap();

        let patch = AdminPatch {
            name: Some("Lee Bitbox".to_owned()),
            profile_image_url: None,
        };
        assert!(directory.update(admin.id, patch).await.unwrap());

        let stored = directory.get_by_id(admin.id).await.unwrap();
        assert_eq!(stored.name, "Lee Bitbox");
        assert_eq!(stored.email, admin.email);
        assert_eq!(stored.authority, admin.authority);
        assert!(publisher.published().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_accepts_empty_patch() {
        let (directory, _, _) = setup();
        let admin = directory
            .create(new_admin("e@x.com", AuthorityType::General))
            .await
            .unwrap();

        assert!(directory.update(admin.id, AdminPatch::default()).await.unwrap());
        assert_eq!(directory.get_by_id(admin.id).await.unwrap().name, admin.name);
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_fail_operation() {
        let store = InMemoryAdminStore::new();
        let directory =
            AdminDirectory::new(Arc::new(store.clone()), Arc::new(ClosedPublisher), CHANNEL);
        let admin = directory
            .create(new_admin("f@x.com", AuthorityType::General))
            .await
            .unwrap();

        directory
            .update_role(admin.id, AuthorityType::Manager)
            .await
            .unwrap();
        directory.delete(admin.id).await.unwrap();

        let stored = directory.get_by_id(admin.id).await.unwrap();
        assert_eq!(stored.authority, AuthorityType::Manager);
        assert!(stored.deleted);
    }

    #[tokio::test]
    async fn test_deleted_email_can_be_reused() {
        let (directory, _, _) = setup();
        let first = directory
            .create(new_admin("g@x.com", AuthorityType::General))
            .await
            .unwrap();
        directory.delete(first.id).await.unwrap();

        let second = directory
            .create(new_admin("g@x.com", AuthorityType::General))
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        let listed = directory.list_all().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, second.id);
    }
}
