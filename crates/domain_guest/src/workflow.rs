//! Registration and update workflows
//!
//! [`GuestService`] is the entry point used by transports. It owns the
//! [`GuestRepository`] behind a single `tokio` lock and the storage port.
//! Every mutating workflow runs the same sequence under the write guard:
//!
//! 1. validate the request
//! 2. plan the change against the repository
//! 3. persist the changeset through [`GuestStorePort::apply_changeset`]
//! 4. apply the changeset to the repository
//!
//! The guard is held across the storage call, so two registrations cannot
//! both pass the uniqueness check. A storage failure is returned as
//! `GuestError::Persistence` with the repository untouched.
//!
//! Steps 3 and 4 run on a spawned task that owns the write guard. Dropping
//! the caller's future (a client disconnect, a timeout) cannot stop between
//! them, so a change the store acknowledged always reaches the repository.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::{info, warn, Instrument};

use core_kernel::{GuestId, OperationMetadata, PortError};

use crate::address::Address;
use crate::contact::ContactNumber;
use crate::document::Document;
use crate::error::GuestError;
use crate::guest::Guest;
use crate::ports::GuestStorePort;
use crate::repository::{Changeset, CompanionRemovalPolicy, GuestRepository, RemovedGuest};
use crate::validation::{validate_document, GuestValidator, ValidationResult};

/// Service configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestServiceConfig {
    /// What happens to companions when their primary guest is removed
    pub removal_policy: CompanionRemovalPolicy,
}

/// Request for registering a primary guest
#[derive(Debug, Clone)]
pub struct RegisterPrimary {
    pub full_name: String,
    pub display_name: String,
    pub birth_date: NaiveDate,
    pub address: Address,
    pub contact: ContactNumber,
    pub document: Document,
}

/// Request for registering a companion under a primary guest
///
/// Address and contacts are inherited from the primary.
#[derive(Debug, Clone)]
pub struct RegisterCompanion {
    pub full_name: String,
    pub display_name: String,
    pub birth_date: NaiveDate,
    pub document: Document,
}

/// Partial update of a guest's profile
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub full_name: Option<String>,
    pub display_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl UpdateProfile {
    /// Returns true if no field is set
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.display_name.is_none() && self.birth_date.is_none()
    }
}

/// Guest registration service
///
/// Clones share the registry and the store.
#[derive(Clone)]
pub struct GuestService {
    store: Arc<dyn GuestStorePort>,
    repository: Arc<RwLock<GuestRepository>>,
    config: GuestServiceConfig,
    /// Tags the storage calls of this handle, usually the HTTP request id
    correlation_id: Option<String>,
}

impl GuestService {
    /// Creates a service with an empty registry
    pub fn new(store: Arc<dyn GuestStorePort>, config: GuestServiceConfig) -> Self {
        Self {
            store,
            repository: Arc::new(RwLock::new(GuestRepository::new())),
            config,
            correlation_id: None,
        }
    }

    /// Creates a service whose registry is rebuilt from every stored guest
    ///
    /// # Errors
    ///
    /// - `GuestError::Persistence` if the store cannot be read
    /// - `GuestError::DuplicateDocument` / `InvalidRelation` if the stored data
    ///   breaks the registry invariants
    pub async fn hydrate(
        store: Arc<dyn GuestStorePort>,
        config: GuestServiceConfig,
    ) -> Result<Self, GuestError> {
        let guests = store
            .load_all(Some(metadata("hydrate")))
            .await?;
        let count = guests.len();
        let repository = GuestRepository::from_guests(guests)?;
        info!(guests = count, "Guest registry hydrated from store");

        Ok(Self {
            store,
            repository: Arc::new(RwLock::new(repository)),
            config,
            correlation_id: None,
        })
    }

    /// The storage port backing this service
    pub fn store(&self) -> Arc<dyn GuestStorePort> {
        Arc::clone(&self.store)
    }

    /// Returns a handle on the same registry whose storage calls carry
    /// `correlation_id` in their [`OperationMetadata`]
    pub fn with_correlation_id(&self, correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: Some(correlation_id.into()),
            ..self.clone()
        }
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// The configured companion removal policy
    pub fn removal_policy(&self) -> CompanionRemovalPolicy {
        self.config.removal_policy
    }

    // ========================================================================
    // Workflows
    // ========================================================================

    /// Registers a primary guest with one address, contact and document
    pub async fn register_primary(&self, request: RegisterPrimary) -> Result<Guest, GuestError> {
        validate_document(&request.document).inspect_err(|e| rejected("register_primary", e))?;

        let mut guest = Guest::new(request.full_name, request.display_name, request.birth_date);
        guest.address = Some(request.address);
        guest.add_contact_number(request.contact);
        guest.add_document(request.document)?;
        check_profile(&guest).inspect_err(|e| rejected("register_primary", e))?;

        let repository = self.lock().await;
        let changes = repository
            .plan_add(guest.clone())
            .inspect_err(|e| rejected("register_primary", e))?;
        self.commit(repository, changes, "register_primary").await?;

        info!(guest_id = %guest.id, "Primary guest registered");
        Ok(guest)
    }

    /// Registers a companion under an existing primary guest
    pub async fn register_companion(
        &self,
        primary_id: GuestId,
        request: RegisterCompanion,
    ) -> Result<Guest, GuestError> {
        validate_document(&request.document).inspect_err(|e| rejected("register_companion", e))?;

        let repository = self.lock().await;
        let primary = repository
            .require(primary_id)
            .inspect_err(|e| rejected("register_companion", e))?;

        let mut companion = Guest::companion_of(
            primary,
            request.full_name,
            request.display_name,
            request.birth_date,
        )
        .inspect_err(|e| rejected("register_companion", e))?;
        companion.add_document(request.document)?;
        check_profile(&companion).inspect_err(|e| rejected("register_companion", e))?;

        let changes = repository
            .plan_add(companion.clone())
            .inspect_err(|e| rejected("register_companion", e))?;
        self.commit(repository, changes, "register_companion").await?;

        info!(guest_id = %companion.id, primary_id = %primary_id, "Companion registered");
        Ok(companion)
    }

    /// Replaces a guest's address
    ///
    /// On a primary guest the new address is copied to every current
    /// companion, overwriting theirs. On a companion only the companion changes.
    pub async fn update_address(
        &self,
        guest_id: GuestId,
        address: Address,
    ) -> Result<Guest, GuestError> {
        let repository = self.lock().await;
        let changes = repository
            .plan_update_address(guest_id, address)
            .inspect_err(|e| rejected("update_address", e))?;
        let cascaded = changes.updated.len().saturating_sub(1);
        let updated = post_state(&changes, guest_id)?;
        self.commit(repository, changes, "update_address").await?;

        info!(guest_id = %guest_id, cascaded, "Guest address updated");
        Ok(updated)
    }

    /// Moves a guest under another primary guest
    ///
    /// The guest receives a copy of the new primary's address. Reassigning to
    /// the current primary refreshes that copy and changes nothing else.
    pub async fn reassign_primary(
        &self,
        companion_id: GuestId,
        new_primary_id: GuestId,
    ) -> Result<Guest, GuestError> {
        let repository = self.lock().await;
        let changes = repository
            .plan_reassign_primary(companion_id, new_primary_id)
            .inspect_err(|e| rejected("reassign_primary", e))?;
        let updated = post_state(&changes, companion_id)?;
        self.commit(repository, changes, "reassign_primary").await?;

        info!(guest_id = %companion_id, primary_id = %new_primary_id, "Guest reassigned");
        Ok(updated)
    }

    /// Appends a validated, globally unique document to a guest
    pub async fn attach_document(
        &self,
        guest_id: GuestId,
        document: Document,
    ) -> Result<Guest, GuestError> {
        validate_document(&document).inspect_err(|e| rejected("attach_document", e))?;

        let repository = self.lock().await;
        let changes = repository
            .plan_attach_document(guest_id, document)
            .inspect_err(|e| rejected("attach_document", e))?;
        let updated = post_state(&changes, guest_id)?;
        self.commit(repository, changes, "attach_document").await?;

        info!(guest_id = %guest_id, "Document attached");
        Ok(updated)
    }

    /// Appends a contact number to a guest
    pub async fn attach_contact(
        &self,
        guest_id: GuestId,
        contact: ContactNumber,
    ) -> Result<Guest, GuestError> {
        if contact.digits().is_empty() {
            let error = GuestError::invalid("Contact number cannot be empty");
            rejected("attach_contact", &error);
            return Err(error);
        }

        let repository = self.lock().await;
        let changes = repository
            .plan_attach_contact(guest_id, contact)
            .inspect_err(|e| rejected("attach_contact", e))?;
        let updated = post_state(&changes, guest_id)?;
        self.commit(repository, changes, "attach_contact").await?;

        info!(guest_id = %guest_id, "Contact attached");
        Ok(updated)
    }

    /// Changes a guest's names or birth date
    pub async fn update_profile(
        &self,
        guest_id: GuestId,
        update: UpdateProfile,
    ) -> Result<Guest, GuestError> {
        let repository = self.lock().await;
        let mut guest = repository
            .require(guest_id)
            .inspect_err(|e| rejected("update_profile", e))?
            .clone();

        if update.is_empty() {
            return Ok(guest);
        }
        if let Some(full_name) = update.full_name {
            guest.full_name = full_name;
        }
        if let Some(display_name) = update.display_name {
            guest.display_name = display_name;
        }
        if let Some(birth_date) = update.birth_date {
            guest.birth_date = birth_date;
        }
        check_profile(&guest).inspect_err(|e| rejected("update_profile", e))?;

        let changes = repository
            .plan_replace(guest.clone())
            .inspect_err(|e| rejected("update_profile", e))?;
        self.commit(repository, changes, "update_profile").await?;

        info!(guest_id = %guest_id, "Guest profile updated");
        Ok(guest)
    }

    /// Removes a guest, applying the configured policy to its companions
    pub async fn remove_guest(&self, guest_id: GuestId) -> Result<RemovedGuest, GuestError> {
        let policy = self.config.removal_policy;
        let repository = self.lock().await;
        let changes = repository
            .plan_remove(guest_id, policy)
            .inspect_err(|e| rejected("remove_guest", e))?;
        let outcome = RemovedGuest::from_changeset(guest_id, &changes)
            .ok_or_else(|| GuestError::not_found(guest_id))?;
        self.commit(repository, changes, "remove_guest").await?;

        info!(
            guest_id = %guest_id,
            policy = %policy,
            cascaded = outcome.cascaded.len(),
            promoted = outcome.promoted.len(),
            "Guest removed"
        );
        Ok(outcome)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Retrieves a guest by ID
    pub async fn get_guest(&self, guest_id: GuestId) -> Result<Guest, GuestError> {
        self.repository.read().await.require(guest_id).cloned()
    }

    /// Finds the guest holding a document number (any formatting)
    pub async fn find_by_document_number(&self, number: &str) -> Option<Guest> {
        self.repository
            .read()
            .await
            .find_by_document_number(number)
            .cloned()
    }

    /// All guests, in registration order
    pub async fn all_guests(&self) -> Vec<Guest> {
        self.repository.read().await.iter().cloned().collect()
    }

    /// All primary guests, in registration order
    pub async fn all_primaries(&self) -> Vec<Guest> {
        let repository = self.repository.read().await;
        repository.all_primaries().into_iter().cloned().collect()
    }

    /// All companions, in registration order
    pub async fn all_companions(&self) -> Vec<Guest> {
        let repository = self.repository.read().await;
        repository.all_companions().into_iter().cloned().collect()
    }

    /// Companions of a primary guest
    ///
    /// # Errors
    ///
    /// Returns `GuestError::NotFound` if the guest does not exist
    pub async fn companions_of(&self, primary_id: GuestId) -> Result<Vec<Guest>, GuestError> {
        let repository = self.repository.read().await;
        repository.require(primary_id)?;
        Ok(repository
            .companions_of(primary_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Number of registered guests
    pub async fn guest_count(&self) -> usize {
        self.repository.read().await.len()
    }

    /// Lists every violated registry invariant; empty when consistent
    pub async fn check_invariants(&self) -> Vec<String> {
        self.repository.read().await.check_invariants()
    }

    async fn lock(&self) -> OwnedRwLockWriteGuard<GuestRepository> {
        Arc::clone(&self.repository).write_owned().await
    }

    /// Persists a changeset, then applies it to the repository
    ///
    /// Both steps run on their own task, which keeps the write guard until
    /// the repository is updated.
    async fn commit(
        &self,
        mut repository: OwnedRwLockWriteGuard<GuestRepository>,
        changes: Changeset,
        operation: &'static str,
    ) -> Result<(), GuestError> {
        if changes.is_empty() {
            return Ok(());
        }

        let store = Arc::clone(&self.store);
        let call_metadata = OperationMetadata {
            correlation_id: self.correlation_id.clone(),
            ..metadata(operation)
        };

        let task = tokio::spawn(
            async move {
                if let Err(e) = store.apply_changeset(&changes, Some(call_metadata)).await {
                    warn!(operation, error = %e, "Persisting guest changes failed; registry unchanged");
                    return Err(GuestError::from(e));
                }
                repository.apply(changes);
                Ok(())
            }
            .in_current_span(),
        );

        task.await.map_err(|e| {
            GuestError::Persistence(PortError::internal(format!(
                "{} commit task failed: {}",
                operation, e
            )))
        })?
    }
}

fn metadata(operation: &str) -> OperationMetadata {
    OperationMetadata::for_operation(operation).initiated_by("guest-service")
}

fn rejected(operation: &'static str, error: &GuestError) {
    warn!(operation, kind = error.kind(), error = %error, "Guest operation rejected");
}

fn check_profile(guest: &Guest) -> Result<(), GuestError> {
    let result: ValidationResult = GuestValidator::validate(guest);
    for warning in &result.warnings {
        warn!(guest_id = %guest.id, warning = %warning, "Guest profile warning");
    }
    result.into_result()
}

fn post_state(changes: &Changeset, id: GuestId) -> Result<Guest, GuestError> {
    changes
        .guest(id)
        .cloned()
        .ok_or_else(|| GuestError::not_found(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentCategory;
    use crate::ports::memory::InMemoryGuestStore;

    fn request(number: &str) -> RegisterPrimary {
        RegisterPrimary {
            full_name: "Ana Costa".to_string(),
            display_name: "Ana".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
            address: Address::new("Rua A", "Centro", "Sao Paulo", "SP", "Brazil", "01000-000"),
            contact: ContactNumber::new("11", "99999-1111"),
            document: Document::new(
                DocumentCategory::NationalId,
                number,
                NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            ),
        }
    }

    #[tokio::test]
    async fn test_register_primary_persists_then_applies() {
        let store = Arc::new(InMemoryGuestStore::new());
        let service = GuestService::new(store.clone(), GuestServiceConfig::default());

        let guest = service.register_primary(request("529.982.247-25")).await.unwrap();
        assert_eq!(service.guest_count().await, 1);
        assert_eq!(store.snapshot().await, vec![guest]);
    }

    #[tokio::test]
    async fn test_invalid_document_never_reaches_store() {
        let store = Arc::new(InMemoryGuestStore::new());
        let service = GuestService::new(store.clone(), GuestServiceConfig::default());

        let result = service.register_primary(request("111.111.111-11")).await;
        assert!(matches!(result, Err(GuestError::Validation { .. })));
        assert_eq!(store.write_count(), 0);
        assert_eq!(service.guest_count().await, 0);
    }

    #[tokio::test]
    async fn test_store_failure_leaves_registry_unchanged() {
        let store = Arc::new(InMemoryGuestStore::new());
        let service = GuestService::new(store.clone(), GuestServiceConfig::default());
        store.fail_writes(true);

        let result = service.register_primary(request("52998224725")).await;
        assert!(matches!(result, Err(GuestError::Persistence(_))));
        assert_eq!(service.guest_count().await, 0);
        assert!(service.find_by_document_number("52998224725").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_profile_update_is_noop() {
        let store = Arc::new(InMemoryGuestStore::new());
        let service = GuestService::new(store.clone(), GuestServiceConfig::default());
        let guest = service.register_primary(request("52998224725")).await.unwrap();

        let unchanged = service
            .update_profile(guest.id, UpdateProfile::default())
            .await
            .unwrap();
        assert_eq!(unchanged, guest);
        assert_eq!(store.write_count(), 1);
    }
}
