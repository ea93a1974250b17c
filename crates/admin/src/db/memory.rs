//! In-memory admin store.
//!
//! Used by tests and by embedders that run the directory without a database.
//! A transaction holds the store's lock for its whole lifetime and works on a
//! staged copy of the records, so transactions are fully serialized.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use bitbox_admin_core::{AdminId, Email};

use super::{AdminStore, AdminTransaction, RepositoryError};
use crate::models::Admin;

/// Admin store kept in process memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAdminStore {
    records: Arc<Mutex<Vec<Admin>>>,
}

impl InMemoryAdminStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every committed record, deleted ones included.
    pub async fn snapshot(&self) -> Vec<Admin> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl AdminStore for InMemoryAdminStore {
    async fn begin(&self) -> Result<Box<dyn AdminTransaction>, RepositoryError> {
        let guard = Arc::clone(&self.records).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryTransaction { guard, staged }))
    }
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<Vec<Admin>>,
    staged: Vec<Admin>,
}

impl InMemoryTransaction {
    fn get(&self, id: AdminId) -> Option<Admin> {
        self.staged.iter().find(|admin| admin.id == id).cloned()
    }

    fn check_email(&self, admin: &Admin) -> Result<(), RepositoryError> {
        let email_taken = !admin.deleted
            && self
                .staged
                .iter()
                .any(|other| other.id != admin.id && !other.deleted && other.email == admin.email);
        if email_taken {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl AdminTransaction for InMemoryTransaction {
    async fn count_active_by_email(&mut self, email: &Email) -> Result<i64, RepositoryError> {
        let count = self
            .staged
            .iter()
            .filter(|admin| !admin.deleted && admin.email == *email)
            .count();
        i64::try_from(count).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }

    async fn find_by_id(&mut self, id: AdminId) -> Result<Option<Admin>, RepositoryError> {
        Ok(self.get(id))
    }

    async fn find_by_id_for_update(
        &mut self,
        id: AdminId,
    ) -> Result<Option<Admin>, RepositoryError> {
        // The whole store is already locked by this transaction.
        Ok(self.get(id))
    }

    async fn find_all_active(&mut self) -> Result<Vec<Admin>, RepositoryError> {
        Ok(self
            .staged
            .iter()
            .filter(|admin| !admin.deleted)
            .cloned()
            .collect())
    }

    async fn insert(&mut self, admin: &Admin) -> Result<Admin, RepositoryError> {
        if self.staged.iter().any(|other| other.id == admin.id) {
            return Err(RepositoryError::IdConflict(admin.id));
        }
        self.check_email(admin)?;

        self.staged.push(admin.clone());
        Ok(admin.clone())
    }

    async fn save(&mut self, admin: &Admin) -> Result<Admin, RepositoryError> {
        self.check_email(admin)?;

        match self.staged.iter_mut().find(|other| other.id == admin.id) {
            Some(existing) => existing.clone_from(admin),
            None => self.staged.push(admin.clone()),
        }
        Ok(admin.clone())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let Self { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use bitbox_admin_core::AuthorityType;

    use super::*;
    use crate::models::NewAdmin;

    fn admin(email: &str) -> Admin {
        Admin::register(
            NewAdmin {
                id: None,
                email: Email::parse(email).unwrap(),
                name: "Kim".to_owned(),
                profile_image_url: None,
                authority: AuthorityType::General,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = InMemoryAdminStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.save(&admin("a@x.com")).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let store = InMemoryAdminStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.save(&admin("a@x.com")).await.unwrap();
        }

        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_transaction_reads_its_own_writes() {
        let store = InMemoryAdminStore::new();
        let record = admin("a@x.com");
        let mut tx = store.begin().await.unwrap();
        tx.save(&record).await.unwrap();

        assert_eq!(tx.find_by_id(record.id).await.unwrap(), Some(record.clone()));
        assert_eq!(tx.count_active_by_email(&record.email).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_active_email() {
        let store = InMemoryAdminStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.save(&admin("a@x.com")).await.unwrap();

        let err = tx.save(&admin("a@x.com")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_deleted_rows_free_their_email() {
        let store = InMemoryAdminStore::new();
        let mut first = admin("a@x.com");
        let mut tx = store.begin().await.unwrap();
        tx.save(&first).await.unwrap();
        first.deleted = true;
        tx.save(&first).await.unwrap();

        assert_eq!(tx.count_active_by_email(&first.email).await.unwrap(), 0);
        tx.save(&admin("a@x.com")).await.unwrap();
        assert_eq!(tx.find_all_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_never_overwrites() {
        let store = InMemoryAdminStore::new();
        let mut original = admin("a@x.com");
        let mut tx = store.begin().await.unwrap();
        tx.insert(&original).await.unwrap();

        let mut replacement = admin("b@x.com");
        replacement.id = original.id;
        let err = tx.insert(&replacement).await.unwrap_err();
        assert!(matches!(err, RepositoryError::IdConflict(id) if id == original.id));

        original.deleted = true;
        tx.save(&original).await.unwrap();
        let err = tx.insert(&replacement).await.unwrap_err();
        assert!(matches!(err, RepositoryError::IdConflict(_)));
        assert_eq!(tx.find_by_id(original.id).await.unwrap(), Some(original));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_active_email() {
        let store = InMemoryAdminStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert(&admin("a@x.com")).await.unwrap();

        let err = tx.insert(&admin("a@x.com")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_find_all_active_keeps_insertion_order() {
        let store = InMemoryAdminStore::new();
        let emails = ["c@x.com", "a@x.com", "b@x.com"];
        let mut tx = store.begin().await.unwrap();
        for email in emails {
            tx.save(&admin(email)).await.unwrap();
        }

        let listed: Vec<String> = tx
            .find_all_active()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.email.to_string())
            .collect();
        assert_eq!(listed, emails);
    }
}
