//! PostgreSQL Guest Adapter
//!
//! This module provides the database adapter for the guest domain,
//! implementing the `GuestStorePort` trait on top of [`GuestRecordRepository`].
//!
//! The adapter:
//!
//! - Translates domain guests into table rows and back
//! - Runs every changeset in one transaction
//! - Translates database errors into port errors
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresGuestStore;
//! use domain_guest::{GuestService, GuestServiceConfig, GuestStorePort};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn GuestStorePort> = Arc::new(PostgresGuestStore::new(pool));
//! let service = GuestService::hydrate(store, GuestServiceConfig::default()).await?;
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AdapterHealth, DomainPort, GuestId, HealthCheckResult, HealthCheckable, OperationMetadata,
    PortError,
};
use domain_guest::{
    normalize_document_number, Address, Changeset, ContactNumber, Document, DocumentCategory,
    Guest, GuestQuery, GuestRole, GuestStorePort,
};

use crate::error::DatabaseError;
use crate::repositories::guest::{
    AddressRow, ContactRow, DocumentCategory as DbDocumentCategory, DocumentRow,
    GuestRecord, GuestRecordRepository, GuestRow,
};

const ADAPTER_ID: &str = "postgres-guest-store";

/// PostgreSQL-backed implementation of the GuestStorePort trait
///
/// # Error Handling
///
/// Database errors are translated to `PortError` variants:
/// - `DatabaseError::NotFound` -> `PortError::NotFound`
/// - `DatabaseError::DuplicateEntry` -> `PortError::Conflict`
/// - Connection, pool and serialization-failure errors -> `PortError::Connection`
/// - Other errors -> `PortError::Internal`
#[derive(Debug, Clone)]
pub struct PostgresGuestStore {
    repository: GuestRecordRepository,
    pool: PgPool,
}

impl PostgresGuestStore {
    /// Creates a new PostgreSQL guest store
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: GuestRecordRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &GuestRecordRepository {
        &self.repository
    }
}

impl DomainPort for PostgresGuestStore {}

#[async_trait]
impl HealthCheckable for PostgresGuestStore {
    /// Performs a `SELECT 1` to verify the pool is operational
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl GuestStorePort for PostgresGuestStore {
    #[instrument(skip(self, _metadata), fields(guest_id = %id))]
    async fn get_guest(
        &self,
        id: GuestId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Guest, PortError> {
        debug!("Fetching guest by ID");

        let record = self
            .repository
            .get(id.into())
            .await
            .map_err(db_to_port_error)?;

        record_to_guest(record)
    }

    #[instrument(skip(self, _metadata))]
    async fn find_by_document_number(
        &self,
        number: &str,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Option<Guest>, PortError> {
        let key = normalize_document_number(number);
        debug!(key = %key, "Looking up guest by document number");

        self.repository
            .find_by_document_number(&key)
            .await
            .map_err(db_to_port_error)?
            .map(record_to_guest)
            .transpose()
    }

    #[instrument(skip(self, _metadata))]
    async fn find_guests(
        &self,
        query: GuestQuery,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Guest>, PortError> {
        debug!("Finding guests with query: {:?}", query);

        let companions = query.role.map(|role| role == GuestRole::Companion);
        let records = self
            .repository
            .find(
                companions,
                query.primary_id.map(Uuid::from),
                query.limit.map(i64::from),
                query.offset.map(i64::from),
            )
            .await
            .map_err(db_to_port_error)?;

        records.into_iter().map(record_to_guest).collect()
    }

    #[instrument(skip(self, _metadata))]
    async fn load_all(&self, _metadata: Option<OperationMetadata>) -> Result<Vec<Guest>, PortError> {
        let records = self.repository.load_all().await.map_err(db_to_port_error)?;
        debug!(count = records.len(), "Loaded stored guests");
        records.into_iter().map(record_to_guest).collect()
    }

    #[instrument(skip(self, guest, _metadata), fields(guest_id = %guest.id))]
    async fn create_guest(
        &self,
        guest: &Guest,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        let record = guest_to_record(guest)?;
        self.repository.insert(&record).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self, guests, _metadata), fields(count = guests.len()))]
    async fn update_guests(
        &self,
        guests: &[Guest],
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        let records = guests
            .iter()
            .map(guest_to_record)
            .collect::<Result<Vec<_>, _>>()?;
        self.repository
            .update_many(&records)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip(self, ids, _metadata), fields(count = ids.len()))]
    async fn delete_guests(
        &self,
        ids: &[GuestId],
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        let ids: Vec<Uuid> = ids.iter().copied().map(Uuid::from).collect();
        self.repository
            .delete_many(&ids)
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(
        skip(self, changes, metadata),
        fields(
            created = changes.created.len(),
            updated = changes.updated.len(),
            removed = changes.removed.len(),
        )
    )]
    async fn apply_changeset(
        &self,
        changes: &Changeset,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        if let Some(metadata) = &metadata {
            debug!(
                operation = metadata.operation.as_deref().unwrap_or("-"),
                correlation_id = metadata.correlation_id.as_deref().unwrap_or("-"),
                "Applying changeset"
            );
        }

        let created = changes
            .created
            .iter()
            .map(guest_to_record)
            .collect::<Result<Vec<_>, _>>()?;
        let updated = changes
            .updated
            .iter()
            .map(guest_to_record)
            .collect::<Result<Vec<_>, _>>()?;
        let removed: Vec<Uuid> = changes.removed.iter().map(|g| g.id.into()).collect();

        self.repository
            .apply(&created, &updated, &removed)
            .await
            .map_err(db_to_port_error)
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn db_to_port_error(e: DatabaseError) -> PortError {
    match e {
        DatabaseError::NotFound { entity, id } => PortError::not_found(entity, id),
        DatabaseError::DuplicateEntry(message) => PortError::conflict(message),
        DatabaseError::ForeignKeyViolation(message)
        | DatabaseError::ConstraintViolation(message) => PortError::validation(message),
        DatabaseError::ConnectionFailed(message) | DatabaseError::TransactionFailed(message) => {
            PortError::connection(message)
        }
        DatabaseError::PoolExhausted => PortError::connection("connection pool exhausted"),
        DatabaseError::SerializationError(message) => PortError::transformation(message),
        other => PortError::Internal {
            message: other.to_string(),
            source: Some(Box::new(other)),
        },
    }
}

fn category_to_db(category: DocumentCategory) -> DbDocumentCategory {
    match category {
        DocumentCategory::NationalId => DbDocumentCategory::NationalId,
        DocumentCategory::StateId => DbDocumentCategory::StateId,
        DocumentCategory::Passport => DbDocumentCategory::Passport,
    }
}

fn category_from_db(category: DbDocumentCategory) -> DocumentCategory {
    match category {
        DbDocumentCategory::NationalId => DocumentCategory::NationalId,
        DbDocumentCategory::StateId => DocumentCategory::StateId,
        DbDocumentCategory::Passport => DocumentCategory::Passport,
    }
}

fn position(index: usize) -> Result<i32, PortError> {
    i32::try_from(index).map_err(|_| PortError::transformation("too many rows for one guest"))
}

/// Converts a domain guest to its rows
fn guest_to_record(guest: &Guest) -> Result<GuestRecord, PortError> {
    let guest_id: Uuid = guest.id.into();

    let documents = guest
        .documents
        .iter()
        .enumerate()
        .map(|(index, document)| {
            Ok(DocumentRow {
                number: document.number.clone(),
                guest_id,
                category: category_to_db(document.category),
                issued_date: document.issued_date,
                position: position(index)?,
            })
        })
        .collect::<Result<Vec<_>, PortError>>()?;

    let contacts = guest
        .contact_numbers
        .iter()
        .enumerate()
        .map(|(index, contact)| {
            Ok(ContactRow {
                guest_id,
                position: position(index)?,
                area_code: contact.area_code.clone(),
                number: contact.number.clone(),
            })
        })
        .collect::<Result<Vec<_>, PortError>>()?;

    Ok(GuestRecord {
        guest: GuestRow {
            guest_id,
            full_name: guest.full_name.clone(),
            display_name: guest.display_name.clone(),
            birth_date: guest.birth_date,
            registered_at: guest.registered_at,
            primary_guest_id: guest.primary_guest.map(Uuid::from),
        },
        address: guest.address.as_ref().map(|a| AddressRow {
            guest_id,
            street: a.street.clone(),
            district: a.district.clone(),
            city: a.city.clone(),
            region: a.region.clone(),
            country: a.country.clone(),
            postal_code: a.postal_code.clone(),
        }),
        documents,
        contacts,
        companion_ids: guest.companions.iter().copied().map(Uuid::from).collect(),
    })
}

/// Converts stored rows back into a domain guest
fn record_to_guest(record: GuestRecord) -> Result<Guest, PortError> {
    let row = record.guest;

    if row.primary_guest_id.is_some() && !record.companion_ids.is_empty() {
        return Err(PortError::transformation(format!(
            "companion {} is itself referenced as a primary",
            row.guest_id
        )));
    }

    Ok(Guest {
        id: GuestId::from(row.guest_id),
        full_name: row.full_name,
        display_name: row.display_name,
        birth_date: row.birth_date,
        registered_at: row.registered_at,
        address: record.address.map(|a| Address {
            street: a.street,
            district: a.district,
            city: a.city,
            region: a.region,
            country: a.country,
            postal_code: a.postal_code,
        }),
        primary_guest: row.primary_guest_id.map(GuestId::from),
        companions: record.companion_ids.into_iter().map(GuestId::from).collect(),
        documents: record
            .documents
            .into_iter()
            .map(|d| Document {
                number: d.number,
                category: category_from_db(d.category),
                issued_date: d.issued_date,
            })
            .collect(),
        contact_numbers: record
            .contacts
            .into_iter()
            .map(|c| ContactNumber::new(c.area_code, c.number))
            .collect(),
    })
}
