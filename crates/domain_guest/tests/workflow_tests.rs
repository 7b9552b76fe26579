//! Workflow tests for GuestService against the in-memory store

use std::sync::Arc;

use chrono::NaiveDate;

use domain_guest::document::{Document, DocumentCategory};
use domain_guest::error::GuestError;
use domain_guest::ports::memory::InMemoryGuestStore;
use domain_guest::ports::{GuestQuery, GuestStorePort};
use domain_guest::repository::CompanionRemovalPolicy;
use domain_guest::workflow::{GuestService, GuestServiceConfig, UpdateProfile};
use domain_guest::GuestRole;

use test_utils::{
    assert_error_kind, AddressFixtures, ContactFixtures, DocumentFixtures, IdFixtures,
    RegisterCompanionBuilder, RegisterPrimaryBuilder,
};

fn service_with(policy: CompanionRemovalPolicy) -> (GuestService, Arc<InMemoryGuestStore>) {
    let store = Arc::new(InMemoryGuestStore::new());
    let service = GuestService::new(
        store.clone(),
        GuestServiceConfig {
            removal_policy: policy,
        },
    );
    (service, store)
}

fn service() -> (GuestService, Arc<InMemoryGuestStore>) {
    service_with(CompanionRemovalPolicy::default())
}

// ============================================================================
// Registration
// ============================================================================

mod registration_tests {
    use super::*;

    #[tokio::test]
    async fn test_register_primary_round_trip() {
        let (service, _) = service();
        let ana = service
            .register_primary(
                RegisterPrimaryBuilder::new()
                    .with_names("Ana Costa", "Ana")
                    .with_document(Document::new(
                        DocumentCategory::NationalId,
                        "529.982.247-25",
                        DocumentFixtures::issued_date(),
                    ))
                    .build(),
            )
            .await
            .unwrap();

        let found = service.find_by_document_number("52998224725").await.unwrap();
        assert_eq!(found.id, ana.id);
        assert_eq!(found.full_name, "Ana Costa");
        assert_eq!(found.display_name, "Ana");
        assert!(found.is_primary());
    }

    #[tokio::test]
    async fn test_register_primary_rejects_invalid_documents() {
        let (service, store) = service();
        for number in ["111.111.111-11", "123.456.789-00"] {
            let result = service
                .register_primary(
                    RegisterPrimaryBuilder::new()
                        .with_document(Document::new(
                            DocumentCategory::NationalId,
                            number,
                            DocumentFixtures::issued_date(),
                        ))
                        .build(),
                )
                .await;
            assert_error_kind(&result, "validation_error");
        }
        assert_eq!(service.guest_count().await, 0);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_register_primary_rejects_duplicate() {
        let (service, _) = service();
        service
            .register_primary(RegisterPrimaryBuilder::new().build())
            .await
            .unwrap();

        let result = service
            .register_primary(
                RegisterPrimaryBuilder::new()
                    .with_document(Document::new(
                        DocumentCategory::NationalId,
                        DocumentFixtures::valid_national_id_formatted(),
                        DocumentFixtures::issued_date(),
                    ))
                    .build(),
            )
            .await;
        assert!(matches!(result, Err(GuestError::DuplicateDocument(n)) if n == "52998224725"));
        assert_eq!(service.guest_count().await, 1);
    }

    #[tokio::test]
    async fn test_register_primary_rejects_blank_name() {
        let (service, _) = service();
        let result = service
            .register_primary(RegisterPrimaryBuilder::new().with_names("", "Ana").build())
            .await;
        assert_error_kind(&result, "invalid_data");
    }

    #[tokio::test]
    async fn test_register_companion_inherits_snapshot() {
        let (service, _) = service();
        let ana = service
            .register_primary(RegisterPrimaryBuilder::new().build())
            .await
            .unwrap();

        let bruno = service
            .register_companion(ana.id, RegisterCompanionBuilder::new().build())
            .await
            .unwrap();

        assert_eq!(bruno.primary_guest, Some(ana.id));
        assert_eq!(bruno.address, ana.address);
        assert_eq!(bruno.contact_numbers, ana.contact_numbers);

        // Later contacts on the primary stay on the primary
        service
            .attach_contact(ana.id, ContactFixtures::other_mobile())
            .await
            .unwrap();
        let bruno = service.get_guest(bruno.id).await.unwrap();
        assert_eq!(bruno.contact_numbers.len(), 1);

        let companions = service.companions_of(ana.id).await.unwrap();
        assert_eq!(companions.len(), 1);
        assert!(service.check_invariants().await.is_empty());
    }

    #[tokio::test]
    async fn test_register_companion_errors() {
        let (service, _) = service();
        let result = service
            .register_companion(IdFixtures::unknown_guest_id(), RegisterCompanionBuilder::new().build())
            .await;
        assert_error_kind(&result, "not_found");

        let ana = service
            .register_primary(RegisterPrimaryBuilder::new().build())
            .await
            .unwrap();
        let bruno = service
            .register_companion(ana.id, RegisterCompanionBuilder::new().build())
            .await
            .unwrap();

        let result = service
            .register_companion(
                bruno.id,
                RegisterCompanionBuilder::new()
                    .with_document(DocumentFixtures::state_id())
                    .build(),
            )
            .await;
        assert_error_kind(&result, "invalid_relation");
        assert_eq!(service.guest_count().await, 2);
    }
}

// ============================================================================
// Updates
// ============================================================================

mod update_tests {
    use super::*;

    #[tokio::test]
    async fn test_address_cascade_reaches_store() {
        let (service, store) = service();
        let ana = service
            .register_primary(RegisterPrimaryBuilder::new().build())
            .await
            .unwrap();
        let bruno = service
            .register_companion(ana.id, RegisterCompanionBuilder::new().build())
            .await
            .unwrap();

        service
            .update_address(ana.id, AddressFixtures::rio())
            .await
            .unwrap();

        let stored = store.get_guest(bruno.id, None).await.unwrap();
        assert_eq!(stored.address, Some(AddressFixtures::rio()));
        let cached = service.get_guest(bruno.id).await.unwrap();
        assert_eq!(cached.address, Some(AddressFixtures::rio()));
    }

    #[tokio::test]
    async fn test_reassign_primary_workflow() {
        let (service, _) = service();
        let ana = service
            .register_primary(RegisterPrimaryBuilder::new().build())
            .await
            .unwrap();
        let carla = service
            .register_primary(
                RegisterPrimaryBuilder::new()
                    .with_document(DocumentFixtures::nth_national_id(1))
                    .with_address(AddressFixtures::rio())
                    .build(),
            )
            .await
            .unwrap();
        let bruno = service
            .register_companion(ana.id, RegisterCompanionBuilder::new().build())
            .await
            .unwrap();

        let moved = service.reassign_primary(bruno.id, carla.id).await.unwrap();
        assert_eq!(moved.primary_guest, Some(carla.id));
        assert_eq!(moved.address, Some(AddressFixtures::rio()));

        // Idempotent
        let again = service.reassign_primary(bruno.id, carla.id).await.unwrap();
        assert_eq!(again, moved);

        assert!(service.companions_of(ana.id).await.unwrap().is_empty());
        assert_eq!(service.companions_of(carla.id).await.unwrap().len(), 1);

        let result = service.reassign_primary(carla.id, carla.id).await;
        assert_error_kind(&result, "invalid_relation");
        assert!(service.check_invariants().await.is_empty());
    }

    #[tokio::test]
    async fn test_attach_document_validates_and_checks_uniqueness() {
        let (service, _) = service();
        let ana = service
            .register_primary(RegisterPrimaryBuilder::new().build())
            .await
            .unwrap();

        let short = Document::new(
            DocumentCategory::Passport,
            DocumentFixtures::short_passport(),
            DocumentFixtures::issued_date(),
        );
        assert_error_kind(&service.attach_document(ana.id, short).await, "validation_error");

        let updated = service
            .attach_document(ana.id, DocumentFixtures::passport())
            .await
            .unwrap();
        assert_eq!(updated.documents.len(), 2);

        let again = service.attach_document(ana.id, DocumentFixtures::passport()).await;
        assert_error_kind(&again, "duplicate_document");
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (service, _) = service();
        let ana = service
            .register_primary(RegisterPrimaryBuilder::new().build())
            .await
            .unwrap();

        let updated = service
            .update_profile(
                ana.id,
                UpdateProfile {
                    display_name: Some("Aninha".to_string()),
                    birth_date: Some(NaiveDate::from_ymd_opt(1991, 1, 2).unwrap()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.display_name, "Aninha");
        assert_eq!(updated.full_name, ana.full_name);

        let result = service
            .update_profile(
                ana.id,
                UpdateProfile {
                    full_name: Some(" ".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert_error_kind(&result, "invalid_data");
    }
}

// ============================================================================
// Persistence atomicity
// ============================================================================

mod persistence_tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_cascade_leaves_registry_untouched() {
        let (service, store) = service();
        let ana = service
            .register_primary(RegisterPrimaryBuilder::new().build())
            .await
            .unwrap();
        let bruno = service
            .register_companion(ana.id, RegisterCompanionBuilder::new().build())
            .await
            .unwrap();
        let before = service.all_guests().await;

        store.fail_writes(true);
        let result = service.update_address(ana.id, AddressFixtures::rio()).await;
        assert_error_kind(&result, "persistence_error");

        assert_eq!(service.all_guests().await, before);
        assert_eq!(
            service.get_guest(bruno.id).await.unwrap().address,
            Some(AddressFixtures::sao_paulo())
        );
    }

    #[tokio::test]
    async fn test_failed_operations_change_nothing() {
        let (service, store) = service();
        let ana = service
            .register_primary(RegisterPrimaryBuilder::new().build())
            .await
            .unwrap();
        let before = service.all_guests().await;
        store.fail_writes(true);

        assert!(service.register_companion(ana.id, RegisterCompanionBuilder::new().build()).await.is_err());
        assert!(service.attach_document(ana.id, DocumentFixtures::passport()).await.is_err());
        assert!(service.attach_contact(ana.id, ContactFixtures::other_mobile()).await.is_err());
        assert!(service.remove_guest(ana.id).await.is_err());

        assert_eq!(service.all_guests().await, before);
        assert_eq!(store.snapshot().await, before);
    }
}

// ============================================================================
// Removal and hydration
// ============================================================================

mod removal_tests {
    use super::*;

    #[tokio::test]
    async fn test_remove_primary_promotes_by_default() {
        let (service, store) = service();
        let ana = service
            .register_primary(RegisterPrimaryBuilder::new().build())
            .await
            .unwrap();
        let bruno = service
            .register_companion(ana.id, RegisterCompanionBuilder::new().build())
            .await
            .unwrap();

        let removed = service.remove_guest(ana.id).await.unwrap();
        assert_eq!(removed.promoted, vec![bruno.id]);

        let bruno = service.get_guest(bruno.id).await.unwrap();
        assert!(bruno.is_primary());
        assert_eq!(service.all_primaries().await.len(), 1);
        assert!(service.all_companions().await.is_empty());
        assert_eq!(store.snapshot().await, vec![bruno]);
    }

    #[tokio::test]
    async fn test_remove_primary_cascade_policy() {
        let (service, store) = service_with(CompanionRemovalPolicy::CascadeDelete);
        let ana = service
            .register_primary(RegisterPrimaryBuilder::new().build())
            .await
            .unwrap();
        service
            .register_companion(ana.id, RegisterCompanionBuilder::new().build())
            .await
            .unwrap();

        let removed = service.remove_guest(ana.id).await.unwrap();
        assert_eq!(removed.cascaded.len(), 1);
        assert_eq!(service.guest_count().await, 0);
        assert!(store.snapshot().await.is_empty());
        assert!(service.find_by_document_number(DocumentFixtures::valid_passport()).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_unknown_guest() {
        let (service, _) = service();
        let result = service.remove_guest(IdFixtures::unknown_guest_id()).await;
        assert_error_kind(&result, "not_found");
    }

    #[tokio::test]
    async fn test_hydrate_rebuilds_registry() {
        let (service, store) = service();
        let ana = service
            .register_primary(RegisterPrimaryBuilder::new().build())
            .await
            .unwrap();
        let bruno = service
            .register_companion(ana.id, RegisterCompanionBuilder::new().build())
            .await
            .unwrap();

        let restarted = GuestService::hydrate(store.clone(), GuestServiceConfig::default())
            .await
            .unwrap();
        assert_eq!(restarted.all_guests().await, service.all_guests().await);
        assert_eq!(restarted.companions_of(ana.id).await.unwrap()[0].id, bruno.id);
        assert!(restarted.check_invariants().await.is_empty());

        let companions = store
            .find_guests(GuestQuery::by_role(GuestRole::Companion), None)
            .await
            .unwrap();
        assert_eq!(companions.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_keep_numbers_unique() {
        let (service, _) = service();
        let service = Arc::new(service);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service
                    .register_primary(RegisterPrimaryBuilder::new().build())
                    .await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(service.guest_count().await, 1);
    }
}

// ============================================================================
// Commit durability
// ============================================================================

mod commit_tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use core_kernel::{
        DomainPort, GuestId, HealthCheckResult, HealthCheckable, OperationMetadata, PortError,
    };
    use domain_guest::{Changeset, Guest};

    /// Delegates to the in-memory store, acknowledging changesets only after
    /// `ack_delay` and recording the metadata of every write
    struct DelayedAckStore {
        inner: InMemoryGuestStore,
        ack_delay: Duration,
        seen: Mutex<Vec<OperationMetadata>>,
    }

    impl DelayedAckStore {
        fn new(inner: InMemoryGuestStore, ack_delay: Duration) -> Self {
            Self {
                inner,
                ack_delay,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<OperationMetadata> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl DomainPort for DelayedAckStore {}

    #[async_trait]
    impl HealthCheckable for DelayedAckStore {
        async fn health_check(&self) -> HealthCheckResult {
            self.inner.health_check().await
        }
    }

    #[async_trait]
    impl GuestStorePort for DelayedAckStore {
        async fn get_guest(
            &self,
            id: GuestId,
            metadata: Option<OperationMetadata>,
        ) -> Result<Guest, PortError> {
            self.inner.get_guest(id, metadata).await
        }

        async fn find_by_document_number(
            &self,
            number: &str,
            metadata: Option<OperationMetadata>,
        ) -> Result<Option<Guest>, PortError> {
            self.inner.find_by_document_number(number, metadata).await
        }

        async fn find_guests(
            &self,
            query: GuestQuery,
            metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Guest>, PortError> {
            self.inner.find_guests(query, metadata).await
        }

        async fn load_all(
            &self,
            metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Guest>, PortError> {
            self.inner.load_all(metadata).await
        }

        async fn create_guest(
            &self,
            guest: &Guest,
            metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            self.inner.create_guest(guest, metadata).await
        }

        async fn update_guests(
            &self,
            guests: &[Guest],
            metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            self.inner.update_guests(guests, metadata).await
        }

        async fn delete_guests(
            &self,
            ids: &[GuestId],
            metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            self.inner.delete_guests(ids, metadata).await
        }

        async fn apply_changeset(
            &self,
            changes: &Changeset,
            metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            if let Some(metadata) = &metadata {
                self.seen.lock().unwrap().push(metadata.clone());
            }
            self.inner.apply_changeset(changes, metadata).await?;
            tokio::time::sleep(self.ack_delay).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dropped_caller_still_applies_committed_changes() {
        let inner = InMemoryGuestStore::new();
        let store = Arc::new(DelayedAckStore::new(inner.clone(), Duration::from_millis(50)));
        let service = GuestService::new(store, GuestServiceConfig::default());
        let request = RegisterPrimaryBuilder::new().build();

        let first = tokio::time::timeout(
            Duration::from_millis(10),
            service.register_primary(request.clone()),
        )
        .await;
        assert!(first.is_err(), "registration should outlive the 10ms deadline");

        // Waits for the write guard held by the detached commit
        assert_eq!(service.guest_count().await, 1);
        assert_eq!(inner.snapshot().await.len(), 1);
        assert!(service.check_invariants().await.is_empty());

        let retry = service.register_primary(request).await;
        assert!(matches!(retry, Err(GuestError::DuplicateDocument(_))));
        assert_eq!(inner.write_count(), 1);
    }

    #[tokio::test]
    async fn test_correlation_id_reaches_the_store() {
        let store = Arc::new(DelayedAckStore::new(InMemoryGuestStore::new(), Duration::ZERO));
        let service = GuestService::new(store.clone(), GuestServiceConfig::default());

        let tagged = service.with_correlation_id("req-42");
        assert_eq!(tagged.correlation_id(), Some("req-42"));
        assert_eq!(service.correlation_id(), None);

        let ana = tagged
            .register_primary(RegisterPrimaryBuilder::new().build())
            .await
            .unwrap();
        // Both handles share one registry
        assert_eq!(service.get_guest(ana.id).await.unwrap(), ana);

        service
            .attach_contact(ana.id, ContactFixtures::other_mobile())
            .await
            .unwrap();

        let seen = store.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].operation.as_deref(), Some("register_primary"));
        assert_eq!(seen[0].correlation_id.as_deref(), Some("req-42"));
        assert_eq!(seen[1].operation.as_deref(), Some("attach_contact"));
        assert_eq!(seen[1].correlation_id, None);
    }
}
