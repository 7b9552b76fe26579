//! Guest repository implementation
//!
//! This module provides database access for guests. A guest is spread over
//! four tables:
//!
//! - `guests`: profile and the parent reference (`primary_guest_id`)
//! - `guest_addresses`: at most one address per guest
//! - `guest_documents`: documents; `number` is the primary key, which makes
//!   document numbers unique across all guests
//! - `guest_contact_numbers`: ordered contact numbers
//!
//! A [`GuestRecord`] bundles the rows of one guest. Every write method runs
//! in a single transaction.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for guest rows
#[derive(Debug, Clone)]
pub struct GuestRecordRepository {
    pool: PgPool,
}

impl GuestRecordRepository {
    /// Creates a new GuestRecordRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves a guest with all of its rows
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no guest has this identifier
    pub async fn get(&self, guest_id: Uuid) -> Result<GuestRecord, DatabaseError> {
        let row = sqlx::query_as::<_, GuestRow>(
            r#"
            SELECT guest_id, full_name, display_name, birth_date, registered_at, primary_guest_id
            FROM guests
            WHERE guest_id = $1
            "#,
        )
        .bind(guest_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Guest", guest_id))?;

        let mut records = self.hydrate(vec![row]).await?;
        records
            .pop()
            .ok_or_else(|| DatabaseError::not_found("Guest", guest_id))
    }

    /// Finds the guest holding a normalised document number
    pub async fn find_by_document_number(
        &self,
        number: &str,
    ) -> Result<Option<GuestRecord>, DatabaseError> {
        let row = sqlx::query_as::<_, GuestRow>(
            r#"
            SELECT g.guest_id, g.full_name, g.display_name, g.birth_date,
                   g.registered_at, g.primary_guest_id
            FROM guests g
            JOIN guest_documents d ON d.guest_id = g.guest_id
            WHERE d.number = $1
            "#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Finds guests by role and parent, in registration order
    ///
    /// # Arguments
    ///
    /// * `companions` - `Some(true)` for companions only, `Some(false)` for primaries only
    /// * `primary_id` - Only companions of this primary guest
    /// * `limit` / `offset` - Pagination
    pub async fn find(
        &self,
        companions: Option<bool>,
        primary_id: Option<Uuid>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<GuestRecord>, DatabaseError> {
        let rows = sqlx::query_as::<_, GuestRow>(
            r#"
            SELECT guest_id, full_name, display_name, birth_date, registered_at, primary_guest_id
            FROM guests
            WHERE ($1::BOOLEAN IS NULL OR (primary_guest_id IS NOT NULL) = $1)
              AND ($2::UUID IS NULL OR primary_guest_id = $2)
            ORDER BY guest_id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(companions)
        .bind(primary_id)
        .bind(limit)
        .bind(offset.unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    /// Loads every guest, in registration order
    pub async fn load_all(&self) -> Result<Vec<GuestRecord>, DatabaseError> {
        self.find(None, None, None, None).await
    }

    /// Inserts a guest with all of its rows
    pub async fn insert(&self, record: &GuestRecord) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        insert_record(&mut tx, record).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Overwrites guests; child rows are replaced
    pub async fn update_many(&self, records: &[GuestRecord]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            update_record(&mut tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Deletes guests; child rows go with them
    pub async fn delete_many(&self, guest_ids: &[Uuid]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        delete_records(&mut tx, guest_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Deletes, updates and inserts guests in one transaction
    pub async fn apply(
        &self,
        created: &[GuestRecord],
        updated: &[GuestRecord],
        removed: &[Uuid],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        delete_records(&mut tx, removed).await?;
        for record in updated {
            update_record(&mut tx, record).await?;
        }
        for record in created {
            insert_record(&mut tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Attaches addresses, documents, contacts and companion ids to guest rows
    async fn hydrate(&self, rows: Vec<GuestRow>) -> Result<Vec<GuestRecord>, DatabaseError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.guest_id).collect();

        let addresses = sqlx::query_as::<_, AddressRow>(
            r#"
            SELECT guest_id, street, district, city, region, country, postal_code
            FROM guest_addresses
            WHERE guest_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let documents = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT number, guest_id, category, issued_date, position
            FROM guest_documents
            WHERE guest_id = ANY($1)
            ORDER BY guest_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let contacts = sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT guest_id, position, area_code, number
            FROM guest_contact_numbers
            WHERE guest_id = ANY($1)
            ORDER BY guest_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let companions = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"
            SELECT primary_guest_id, guest_id
            FROM guests
            WHERE primary_guest_id = ANY($1)
            ORDER BY guest_id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut address_by_guest: HashMap<Uuid, AddressRow> =
            addresses.into_iter().map(|a| (a.guest_id, a)).collect();
        let mut documents_by_guest: HashMap<Uuid, Vec<DocumentRow>> = HashMap::new();
        for document in documents {
            documents_by_guest.entry(document.guest_id).or_default().push(document);
        }
        let mut contacts_by_guest: HashMap<Uuid, Vec<ContactRow>> = HashMap::new();
        for contact in contacts {
            contacts_by_guest.entry(contact.guest_id).or_default().push(contact);
        }
        let mut companions_by_guest: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (primary_id, companion_id) in companions {
            companions_by_guest.entry(primary_id).or_default().push(companion_id);
        }

        Ok(rows
            .into_iter()
            .map(|guest| {
                let id = guest.guest_id;
                GuestRecord {
                    address: address_by_guest.remove(&id),
                    documents: documents_by_guest.remove(&id).unwrap_or_default(),
                    contacts: contacts_by_guest.remove(&id).unwrap_or_default(),
                    companion_ids: companions_by_guest.remove(&id).unwrap_or_default(),
                    guest,
                }
            })
            .collect())
    }
}

async fn insert_record(conn: &mut PgConnection, record: &GuestRecord) -> Result<(), DatabaseError> {
    let guest = &record.guest;
    sqlx::query(
        r#"
        INSERT INTO guests (
            guest_id, full_name, display_name, birth_date, registered_at, primary_guest_id
        ) VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(guest.guest_id)
    .bind(&guest.full_name)
    .bind(&guest.display_name)
    .bind(guest.birth_date)
    .bind(guest.registered_at)
    .bind(guest.primary_guest_id)
    .execute(&mut *conn)
    .await?;

    insert_children(conn, record).await
}

async fn update_record(conn: &mut PgConnection, record: &GuestRecord) -> Result<(), DatabaseError> {
    let guest = &record.guest;
    let result = sqlx::query(
        r#"
        UPDATE guests
        SET full_name = $2, display_name = $3, birth_date = $4, primary_guest_id = $5
        WHERE guest_id = $1
        "#,
    )
    .bind(guest.guest_id)
    .bind(&guest.full_name)
    .bind(&guest.display_name)
    .bind(guest.birth_date)
    .bind(guest.primary_guest_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Guest", guest.guest_id));
    }

    for table in ["guest_addresses", "guest_documents", "guest_contact_numbers"] {
        sqlx::query(&format!("DELETE FROM {} WHERE guest_id = $1", table))
            .bind(guest.guest_id)
            .execute(&mut *conn)
            .await?;
    }

    insert_children(conn, record).await
}

async fn insert_children(conn: &mut PgConnection, record: &GuestRecord) -> Result<(), DatabaseError> {
    if let Some(address) = &record.address {
        sqlx::query(
            r#"
            INSERT INTO guest_addresses (
                guest_id, street, district, city, region, country, postal_code
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(address.guest_id)
        .bind(&address.street)
        .bind(&address.district)
        .bind(&address.city)
        .bind(&address.region)
        .bind(&address.country)
        .bind(&address.postal_code)
        .execute(&mut *conn)
        .await?;
    }

    for document in &record.documents {
        sqlx::query(
            r#"
            INSERT INTO guest_documents (number, guest_id, category, issued_date, position)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&document.number)
        .bind(document.guest_id)
        .bind(document.category)
        .bind(document.issued_date)
        .bind(document.position)
        .execute(&mut *conn)
        .await?;
    }

    for contact in &record.contacts {
        sqlx::query(
            r#"
            INSERT INTO guest_contact_numbers (guest_id, position, area_code, number)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(contact.guest_id)
        .bind(contact.position)
        .bind(&contact.area_code)
        .bind(&contact.number)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn delete_records(conn: &mut PgConnection, guest_ids: &[Uuid]) -> Result<(), DatabaseError> {
    if guest_ids.is_empty() {
        return Ok(());
    }
    sqlx::query("DELETE FROM guests WHERE guest_id = ANY($1)")
        .bind(guest_ids)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// ============================================================================
// Row types
// ============================================================================

/// Document category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "document_category", rename_all = "snake_case")]
pub enum DocumentCategory {
    NationalId,
    StateId,
    Passport,
}

/// Guest profile row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct GuestRow {
    pub guest_id: Uuid,
    pub full_name: String,
    pub display_name: String,
    pub birth_date: NaiveDate,
    pub registered_at: DateTime<Utc>,
    pub primary_guest_id: Option<Uuid>,
}

/// Address row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AddressRow {
    pub guest_id: Uuid,
    pub street: String,
    pub district: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub postal_code: String,
}

/// Document row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DocumentRow {
    pub number: String,
    pub guest_id: Uuid,
    pub category: DocumentCategory,
    pub issued_date: NaiveDate,
    pub position: i32,
}

/// Contact number row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ContactRow {
    pub guest_id: Uuid,
    pub position: i32,
    pub area_code: String,
    pub number: String,
}

/// All rows of one guest
#[derive(Debug, Clone, PartialEq)]
pub struct GuestRecord {
    pub guest: GuestRow,
    pub address: Option<AddressRow>,
    pub documents: Vec<DocumentRow>,
    pub contacts: Vec<ContactRow>,
    /// Guests whose `primary_guest_id` is this guest; derived, never written
    pub companion_ids: Vec<Uuid>,
}
