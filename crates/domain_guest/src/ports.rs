//! Guest Domain Ports
//!
//! This module defines the storage port of the guest domain. The
//! [`GuestStorePort`] trait lists every operation the workflows need from
//! durable storage; adapters implement it:
//!
//! - **PostgreSQL adapter**: `infra_db::adapters::PostgresGuestStore`
//! - **In-memory adapter**: [`memory::InMemoryGuestStore`], for tests and for
//!   running the service without a database
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_guest::ports::GuestStorePort;
//! use std::sync::Arc;
//!
//! let store: Arc<dyn GuestStorePort> = match config.database_url {
//!     Some(url) => Arc::new(PostgresGuestStore::new(connect(&url).await?)),
//!     None => Arc::new(InMemoryGuestStore::new()),
//! };
//! ```
//!
//! Workflows only call [`GuestStorePort::apply_changeset`] for writes, so
//! each operation reaches storage as one atomic unit.

use async_trait::async_trait;

use core_kernel::{DomainPort, GuestId, HealthCheckable, OperationMetadata, PortError};

use crate::guest::{Guest, GuestRole};
use crate::repository::Changeset;

/// Query parameters for finding guests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestQuery {
    /// Filter by role (parent reference absent or present)
    pub role: Option<GuestRole>,
    /// Filter by primary guest
    pub primary_id: Option<GuestId>,
    /// Limit results
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

impl GuestQuery {
    /// Creates a query for all guests of a role
    pub fn by_role(role: GuestRole) -> Self {
        Self {
            role: Some(role),
            ..Default::default()
        }
    }

    /// Creates a query for the companions of a primary guest
    pub fn companions_of(primary_id: GuestId) -> Self {
        Self {
            primary_id: Some(primary_id),
            ..Default::default()
        }
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Returns true if the guest matches the filters (pagination aside)
    pub fn matches(&self, guest: &Guest) -> bool {
        if let Some(role) = self.role {
            if guest.role() != role {
                return false;
            }
        }
        if let Some(primary_id) = self.primary_id {
            if guest.primary_guest != Some(primary_id) {
                return false;
            }
        }
        true
    }
}

/// Durable storage for guests
///
/// All methods take optional operation metadata for tracing and return
/// `PortError` on failure. Writes must be all-or-nothing.
#[async_trait]
pub trait GuestStorePort: DomainPort + HealthCheckable {
    // ========================================================================
    // Reads
    // ========================================================================

    /// Retrieves a guest by ID, or `PortError::NotFound`
    async fn get_guest(
        &self,
        id: GuestId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Guest, PortError>;

    /// Finds the guest holding a normalised document number
    async fn find_by_document_number(
        &self,
        number: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<Guest>, PortError>;

    /// Finds guests matching the query, in registration order
    async fn find_guests(
        &self,
        query: GuestQuery,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Guest>, PortError>;

    /// Loads every stored guest, in registration order
    async fn load_all(&self, metadata: Option<OperationMetadata>) -> Result<Vec<Guest>, PortError>;

    // ========================================================================
    // Writes
    // ========================================================================

    /// Inserts a new guest
    ///
    /// # Returns
    ///
    /// `PortError::Conflict` if the guest or one of its document numbers exists
    async fn create_guest(
        &self,
        guest: &Guest,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// Overwrites existing guests as one batch
    async fn update_guests(
        &self,
        guests: &[Guest],
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// Deletes guests as one batch
    async fn delete_guests(
        &self,
        ids: &[GuestId],
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// Applies deletions, updates and insertions of a changeset atomically
    async fn apply_changeset(
        &self,
        changes: &Changeset,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;
}

/// Extension trait for GuestStorePort with convenience methods
#[async_trait]
pub trait GuestStorePortExt: GuestStorePort {
    /// Checks if a guest is stored
    async fn guest_exists(
        &self,
        id: GuestId,
        metadata: Option<OperationMetadata>,
    ) -> Result<bool, PortError> {
        match self.get_guest(id, metadata).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Finds the stored companions of a primary guest
    async fn find_companions(
        &self,
        primary_id: GuestId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Guest>, PortError> {
        self.find_guests(GuestQuery::companions_of(primary_id), metadata)
            .await
    }
}

// Blanket implementation for all GuestStorePort implementors
impl<T: GuestStorePort + ?Sized> GuestStorePortExt for T {}

/// In-memory implementation of GuestStorePort
///
/// Stores guests in a map behind a `tokio` lock. Writes can be made to fail
/// on demand to exercise persistence error paths.
pub mod memory {
    use super::*;
    use std::collections::{BTreeMap, HashSet};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::Utc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    /// In-memory guest store
    #[derive(Debug, Default, Clone)]
    pub struct InMemoryGuestStore {
        guests: Arc<RwLock<BTreeMap<GuestId, Guest>>>,
        fail_writes: Arc<AtomicBool>,
        writes: Arc<AtomicUsize>,
    }

    impl InMemoryGuestStore {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates the store
        pub async fn with_guests(guests: Vec<Guest>) -> Self {
            let store = Self::new();
            {
                let mut map = store.guests.write().await;
                for guest in guests {
                    map.insert(guest.id, guest);
                }
            }
            store
        }

        /// Makes every following write fail with a connection error
        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Number of successful write calls
        pub fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        /// Copies the stored guests, in registration order
        pub async fn snapshot(&self) -> Vec<Guest> {
            self.guests.read().await.values().cloned().collect()
        }

        fn check_writable(&self) -> Result<(), PortError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PortError::connection("in-memory store rejected the write"));
            }
            Ok(())
        }

        fn ensure_unique_documents(map: &BTreeMap<GuestId, Guest>) -> Result<(), PortError> {
            let mut seen = HashSet::new();
            for number in map.values().flat_map(|g| g.document_numbers()) {
                if !seen.insert(number) {
                    return Err(PortError::conflict(format!(
                        "document number {} already stored",
                        number
                    )));
                }
            }
            Ok(())
        }

        fn stage(
            map: &BTreeMap<GuestId, Guest>,
            changes: &Changeset,
        ) -> Result<BTreeMap<GuestId, Guest>, PortError> {
            let mut staged = map.clone();
            for guest in &changes.removed {
                staged.remove(&guest.id);
            }
            for guest in &changes.updated {
                if !staged.contains_key(&guest.id) {
                    return Err(PortError::not_found("Guest", guest.id));
                }
                staged.insert(guest.id, guest.clone());
            }
            for guest in &changes.created {
                if staged.insert(guest.id, guest.clone()).is_some() {
                    return Err(PortError::conflict(format!("guest {} already stored", guest.id)));
                }
            }
            Self::ensure_unique_documents(&staged)?;
            Ok(staged)
        }

        async fn commit(&self, changes: &Changeset) -> Result<(), PortError> {
            self.check_writable()?;
            let mut map = self.guests.write().await;
            let staged = Self::stage(&map, changes)?;
            *map = staged;
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl DomainPort for InMemoryGuestStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryGuestStore {
        async fn health_check(&self) -> HealthCheckResult {
            let status = if self.fail_writes.load(Ordering::SeqCst) {
                AdapterHealth::Degraded
            } else {
                AdapterHealth::Healthy
            };
            HealthCheckResult {
                adapter_id: "in-memory-guest-store".to_string(),
                status,
                latency_ms: 0,
                message: Some(format!("{} guests held in memory", self.guests.read().await.len())),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl GuestStorePort for InMemoryGuestStore {
        async fn get_guest(
            &self,
            id: GuestId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Guest, PortError> {
            self.guests
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Guest", id))
        }

        async fn find_by_document_number(
            &self,
            number: &str,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Option<Guest>, PortError> {
            let guests = self.guests.read().await;
            Ok(guests.values().find(|g| g.holds_document(number)).cloned())
        }

        async fn find_guests(
            &self,
            query: GuestQuery,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Guest>, PortError> {
            let guests = self.guests.read().await;
            let offset = query.offset.unwrap_or(0) as usize;
            let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
            Ok(guests
                .values()
                .filter(|g| query.matches(g))
                .skip(offset)
                .take(limit)
                .cloned()
                .collect())
        }

        async fn load_all(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<Guest>, PortError> {
            Ok(self.snapshot().await)
        }

        async fn create_guest(
            &self,
            guest: &Guest,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let changes = Changeset {
                created: vec![guest.clone()],
                ..Default::default()
            };
            self.commit(&changes).await
        }

        async fn update_guests(
            &self,
            guests: &[Guest],
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let changes = Changeset {
                updated: guests.to_vec(),
                ..Default::default()
            };
            self.commit(&changes).await
        }

        async fn delete_guests(
            &self,
            ids: &[GuestId],
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            self.check_writable()?;
            let mut guests = self.guests.write().await;
            for id in ids {
                guests.remove(id);
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn apply_changeset(
            &self,
            changes: &Changeset,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            self.commit(changes).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::InMemoryGuestStore;
    use super::*;
    use crate::document::{Document, DocumentCategory};
    use chrono::NaiveDate;

    fn guest_with_document(number: &str) -> Guest {
        let mut guest = Guest::new(
            "Ana Costa",
            "Ana",
            NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
        );
        guest
            .add_document(Document::new(
                DocumentCategory::NationalId,
                number,
                NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            ))
            .unwrap();
        guest
    }

    #[tokio::test]
    async fn test_store_create_and_get() {
        let store = InMemoryGuestStore::new();
        let guest = guest_with_document("52998224725");
        store.create_guest(&guest, None).await.unwrap();

        let retrieved = store.get_guest(guest.id, None).await.unwrap();
        assert_eq!(retrieved, guest);
        assert!(store.guest_exists(guest.id, None).await.unwrap());
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_store_not_found() {
        let store = InMemoryGuestStore::new();
        let result = store.get_guest(GuestId::new_v7(), None).await;
        assert!(result.unwrap_err().is_not_found());
        assert!(!store.guest_exists(GuestId::new_v7(), None).await.unwrap());
    }

    #[tokio::test]
    async fn test_store_rejects_duplicate_document() {
        let store = InMemoryGuestStore::new();
        store
            .create_guest(&guest_with_document("52998224725"), None)
            .await
            .unwrap();
        let result = store
            .create_guest(&guest_with_document("529.982.247-25"), None)
            .await;
        assert!(matches!(result, Err(PortError::Conflict { .. })));
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_injection() {
        let store = InMemoryGuestStore::new();
        store.fail_writes(true);

        let result = store
            .create_guest(&guest_with_document("52998224725"), None)
            .await;
        assert!(result.unwrap_err().is_transient());
        assert!(store.snapshot().await.is_empty());
        assert_ne!(store.health_check().await.status, core_kernel::AdapterHealth::Healthy);

        store.fail_writes(false);
        store
            .create_guest(&guest_with_document("52998224725"), None)
            .await
            .unwrap();
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_store_changeset_is_atomic() {
        let first = guest_with_document("52998224725");
        let store = InMemoryGuestStore::with_guests(vec![first.clone()]).await;

        let mut renamed = first.clone();
        renamed.display_name = "Aninha".to_string();
        let changes = Changeset {
            created: vec![guest_with_document("52998224725")],
            updated: vec![renamed],
            removed: vec![],
        };

        assert!(store.apply_changeset(&changes, None).await.is_err());
        let stored = store.get_guest(first.id, None).await.unwrap();
        assert_eq!(stored.display_name, "Ana");
    }

    #[tokio::test]
    async fn test_store_find_guests_by_role() {
        let primary = guest_with_document("52998224725");
        let companion = Guest::companion_of(
            &primary,
            "Bruno Costa",
            "Bruno",
            NaiveDate::from_ymd_opt(2015, 9, 3).unwrap(),
        )
        .unwrap();
        let store = InMemoryGuestStore::with_guests(vec![primary.clone(), companion.clone()]).await;

        let primaries = store
            .find_guests(GuestQuery::by_role(GuestRole::Primary), None)
            .await
            .unwrap();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].id, primary.id);

        let companions = store.find_companions(primary.id, None).await.unwrap();
        assert_eq!(companions.len(), 1);
        assert_eq!(companions[0].id, companion.id);

        let found = store
            .find_by_document_number("529.982.247-25", None)
            .await
            .unwrap();
        assert_eq!(found.map(|g| g.id), Some(primary.id));
    }

    #[tokio::test]
    async fn test_store_delete_guests() {
        let guest = guest_with_document("52998224725");
        let store = InMemoryGuestStore::with_guests(vec![guest.clone()]).await;
        store.delete_guests(&[guest.id], None).await.unwrap();
        assert!(store.load_all(None).await.unwrap().is_empty());
    }
}
