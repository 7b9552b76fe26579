//! Guest repository
//!
//! The [`GuestRepository`] is the single source of truth for registered
//! guests. It stores guests in an arena keyed by [`GuestId`] and keeps an
//! index from normalised document number to guest, so that document numbers
//! are unique across the whole population and lookups are O(1).
//!
//! # Plans and changesets
//!
//! Every mutation is split in two steps:
//!
//! 1. A `plan_*` method checks the request against the current state and
//!    returns a [`Changeset`] holding the post-state of every affected guest.
//!    Planning never mutates the repository.
//! 2. [`GuestRepository::apply`] commits a changeset.
//!
//! Workflows persist the changeset between the two steps, so a storage
//! failure leaves the repository untouched. The convenience methods
//! (`add`, `remove`, `reassign_primary`, ...) plan and apply in one call.
//!
//! # Invariants
//!
//! - No document number appears on two guests, or twice on one guest
//! - A companion's primary exists and is a primary
//! - A companion holds no companions
//! - `primary.companions` lists exactly the guests pointing back at `primary`

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::GuestId;

use crate::address::Address;
use crate::contact::ContactNumber;
use crate::document::{normalize_document_number, Document};
use crate::error::GuestError;
use crate::guest::Guest;

/// What happens to the companions of a primary guest that is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanionRemovalPolicy {
    /// Companions become standalone primary guests, keeping their snapshots
    #[default]
    PromoteToPrimary,
    /// Companions are removed together with their primary guest
    CascadeDelete,
}

impl CompanionRemovalPolicy {
    /// Stable string representation used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanionRemovalPolicy::PromoteToPrimary => "promote_to_primary",
            CompanionRemovalPolicy::CascadeDelete => "cascade_delete",
        }
    }
}

impl fmt::Display for CompanionRemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompanionRemovalPolicy {
    type Err = GuestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "promote_to_primary" | "promote" => Ok(CompanionRemovalPolicy::PromoteToPrimary),
            "cascade_delete" | "cascade" => Ok(CompanionRemovalPolicy::CascadeDelete),
            other => Err(GuestError::invalid(format!(
                "Unknown companion removal policy: {}",
                other
            ))),
        }
    }
}

/// Post-state of every guest touched by one operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    /// Guests to insert
    pub created: Vec<Guest>,
    /// Guests to overwrite, in their new state
    pub updated: Vec<Guest>,
    /// Guests to delete, in their last stored state
    pub removed: Vec<Guest>,
}

impl Changeset {
    /// Returns true if the changeset touches no guest
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Identifiers of the removed guests
    pub fn removed_ids(&self) -> Vec<GuestId> {
        self.removed.iter().map(|g| g.id).collect()
    }

    /// Finds a guest's post-state among created and updated guests
    pub fn guest(&self, id: GuestId) -> Option<&Guest> {
        self.created
            .iter()
            .chain(self.updated.iter())
            .find(|g| g.id == id)
    }

    fn update(&mut self, guest: Guest) {
        match self.updated.iter_mut().find(|g| g.id == guest.id) {
            Some(existing) => *existing = guest,
            None => self.updated.push(guest),
        }
    }
}

/// Outcome of removing a guest
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedGuest {
    /// The removed guest, as last stored
    pub guest: Guest,
    /// Companions removed along with it (cascade policy)
    pub cascaded: Vec<Guest>,
    /// Companions promoted to primary guests (promotion policy)
    pub promoted: Vec<GuestId>,
}

impl RemovedGuest {
    /// Builds the outcome from a removal changeset
    pub fn from_changeset(id: GuestId, changes: &Changeset) -> Option<Self> {
        let guest = changes.removed.iter().find(|g| g.id == id)?.clone();
        let cascaded = changes
            .removed
            .iter()
            .filter(|g| g.id != id)
            .cloned()
            .collect();
        let promoted = changes
            .updated
            .iter()
            .filter(|g| guest.companions.contains(&g.id) && g.is_primary())
            .map(|g| g.id)
            .collect();
        Some(Self {
            guest,
            cascaded,
            promoted,
        })
    }
}

/// In-memory arena of guests with a document-number index
#[derive(Debug, Clone, Default)]
pub struct GuestRepository {
    guests: BTreeMap<GuestId, Guest>,
    document_index: HashMap<String, GuestId>,
}

impl GuestRepository {
    /// Creates an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a repository from stored guests
    ///
    /// Companion lists are rebuilt from the companions' back-references;
    /// the stored order is kept where present.
    ///
    /// # Errors
    ///
    /// - `GuestError::DuplicateDocument` if two guests share a document number
    /// - `GuestError::InvalidRelation` if a back-reference is broken or nested
    pub fn from_guests(guests: impl IntoIterator<Item = Guest>) -> Result<Self, GuestError> {
        let mut repository = Self::new();

        for guest in guests {
            if repository.guests.contains_key(&guest.id) {
                return Err(GuestError::invalid(format!("Guest {} appears twice", guest.id)));
            }
            repository.guests.insert(guest.id, guest);
        }

        let mut index = HashMap::new();
        for guest in repository.guests.values() {
            for number in guest.document_numbers() {
                if index.insert(number.to_string(), guest.id).is_some() {
                    return Err(GuestError::duplicate_document(number));
                }
            }
        }
        repository.document_index = index;

        let mut back_references: BTreeMap<GuestId, Vec<GuestId>> = BTreeMap::new();
        for guest in repository.guests.values() {
            if let Some(primary_id) = guest.primary_guest {
                let primary = repository.guests.get(&primary_id).ok_or_else(|| {
                    GuestError::invalid_relation(format!(
                        "{} references missing primary {}",
                        guest.id, primary_id
                    ))
                })?;
                if primary.is_companion() {
                    return Err(GuestError::invalid_relation(format!(
                        "{} references companion {} as its primary",
                        guest.id, primary_id
                    )));
                }
                back_references.entry(primary_id).or_default().push(guest.id);
            }
        }

        for guest in repository.guests.values_mut() {
            let pointing: Vec<GuestId> = back_references.remove(&guest.id).unwrap_or_default();
            let mut companions: Vec<GuestId> = guest
                .companions
                .iter()
                .copied()
                .filter(|id| pointing.contains(id))
                .collect();
            for id in pointing {
                if !companions.contains(&id) {
                    companions.push(id);
                }
            }
            guest.companions = companions;
        }

        Ok(repository)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Number of stored guests
    pub fn len(&self) -> usize {
        self.guests.len()
    }

    /// Returns true if no guest is stored
    pub fn is_empty(&self) -> bool {
        self.guests.is_empty()
    }

    /// Returns true if the guest is stored
    pub fn contains(&self, id: GuestId) -> bool {
        self.guests.contains_key(&id)
    }

    /// Retrieves a guest by identifier
    pub fn get(&self, id: GuestId) -> Option<&Guest> {
        self.guests.get(&id)
    }

    /// Retrieves a guest or returns `GuestError::NotFound`
    pub fn require(&self, id: GuestId) -> Result<&Guest, GuestError> {
        self.get(id).ok_or_else(|| GuestError::not_found(id))
    }

    /// Iterates over all guests in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Guest> {
        self.guests.values()
    }

    /// Finds the guest holding a document number (any formatting)
    pub fn find_by_document_number(&self, number: &str) -> Option<&Guest> {
        let key = normalize_document_number(number);
        self.document_index
            .get(&key)
            .and_then(|id| self.guests.get(id))
    }

    /// Returns true if any stored guest holds the document number
    pub fn is_document_registered(&self, number: &str) -> bool {
        self.document_index
            .contains_key(&normalize_document_number(number))
    }

    /// All guests without a primary guest
    pub fn all_primaries(&self) -> Vec<&Guest> {
        self.guests.values().filter(|g| g.is_primary()).collect()
    }

    /// All guests registered under a primary guest
    pub fn all_companions(&self) -> Vec<&Guest> {
        self.guests.values().filter(|g| g.is_companion()).collect()
    }

    /// Companions of a primary guest, in the primary's order
    ///
    /// Returns an empty list for unknown guests and for companions.
    pub fn companions_of(&self, primary_id: GuestId) -> Vec<&Guest> {
        match self.guests.get(&primary_id) {
            Some(primary) => primary
                .companions
                .iter()
                .filter_map(|id| self.guests.get(id))
                .filter(|c| c.primary_guest == Some(primary_id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Lists every violated invariant; empty when the repository is consistent
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let mut seen: HashMap<&str, GuestId> = HashMap::new();

        for guest in self.guests.values() {
            for number in guest.document_numbers() {
                if let Some(other) = seen.insert(number, guest.id) {
                    violations.push(format!(
                        "document {} held by {} and {}",
                        number, other, guest.id
                    ));
                }
                if self.document_index.get(number) != Some(&guest.id) {
                    violations.push(format!("document {} missing from index", number));
                }
            }

            match guest.primary_guest {
                Some(primary_id) => {
                    if guest.has_companions() {
                        violations.push(format!("companion {} holds companions", guest.id));
                    }
                    match self.guests.get(&primary_id) {
                        None => violations.push(format!(
                            "{} references missing primary {}",
                            guest.id, primary_id
                        )),
                        Some(primary) if primary.is_companion() => violations.push(format!(
                            "{} references companion {} as primary",
                            guest.id, primary_id
                        )),
                        Some(primary) if !primary.companions.contains(&guest.id) => violations
                            .push(format!("{} is not listed by primary {}", guest.id, primary_id)),
                        Some(_) => {}
                    }
                }
                None => {
                    let mut unique = HashSet::new();
                    for companion_id in &guest.companions {
                        if !unique.insert(companion_id) {
                            violations.push(format!(
                                "{} lists companion {} twice",
                                guest.id, companion_id
                            ));
                        }
                        let points_back = self
                            .guests
                            .get(companion_id)
                            .map(|c| c.primary_guest == Some(guest.id))
                            .unwrap_or(false);
                        if !points_back {
                            violations.push(format!(
                                "{} lists {} which does not point back",
                                guest.id, companion_id
                            ));
                        }
                    }
                }
            }
        }

        if self.document_index.len() != seen.len() {
            violations.push("document index holds stale entries".to_string());
        }
        violations
    }

    // ========================================================================
    // Planning
    // ========================================================================

    /// Plans the insertion of a new guest
    ///
    /// # Errors
    ///
    /// - `GuestError::DuplicateDocument` if a document number is already stored
    ///   or repeated on the incoming guest
    /// - `GuestError::NotFound` if the guest's primary does not exist
    /// - `GuestError::InvalidRelation` if the primary is a companion, or the
    ///   incoming guest already lists companions
    pub fn plan_add(&self, guest: Guest) -> Result<Changeset, GuestError> {
        if self.guests.contains_key(&guest.id) {
            return Err(GuestError::invalid(format!(
                "Guest {} is already registered",
                guest.id
            )));
        }
        if guest.has_companions() {
            return Err(GuestError::invalid_relation(format!(
                "{} cannot be registered with companions attached",
                guest.id
            )));
        }
        self.ensure_documents_available(&guest.documents, None)?;

        let mut changes = Changeset::default();
        if let Some(primary_id) = guest.primary_guest {
            let mut primary = self.require(primary_id)?.clone();
            if primary.is_companion() {
                return Err(GuestError::invalid_relation(format!(
                    "{} is a companion and cannot have companions",
                    primary_id
                )));
            }
            primary.add_companion(guest.id);
            changes.update(primary);
        }
        changes.created.push(guest);
        Ok(changes)
    }

    /// Plans the removal of a guest
    ///
    /// A companion is detached from its primary. The companions of a primary
    /// are promoted or removed according to `policy`.
    pub fn plan_remove(
        &self,
        id: GuestId,
        policy: CompanionRemovalPolicy,
    ) -> Result<Changeset, GuestError> {
        let guest = self.require(id)?;
        let mut changes = Changeset::default();

        if let Some(primary_id) = guest.primary_guest {
            let mut primary = self.require(primary_id)?.clone();
            primary.remove_companion(id);
            changes.update(primary);
        }

        for companion in self.companions_of(id) {
            match policy {
                CompanionRemovalPolicy::PromoteToPrimary => {
                    let mut promoted = companion.clone();
                    promoted.primary_guest = None;
                    changes.update(promoted);
                }
                CompanionRemovalPolicy::CascadeDelete => {
                    changes.removed.push(companion.clone());
                }
            }
        }

        changes.removed.insert(0, guest.clone());
        Ok(changes)
    }

    /// Plans moving a guest under another primary guest
    ///
    /// The guest is detached from its current primary (if any), attached to
    /// the new one and receives a copy of the new primary's address.
    ///
    /// # Errors
    ///
    /// - `GuestError::NotFound` for unknown identifiers
    /// - `GuestError::InvalidRelation` if the target is not a primary, is the
    ///   guest itself, or the guest has companions of its own
    pub fn plan_reassign_primary(
        &self,
        companion_id: GuestId,
        new_primary_id: GuestId,
    ) -> Result<Changeset, GuestError> {
        let companion = self.require(companion_id)?;
        let new_primary = self.require(new_primary_id)?;

        if companion_id == new_primary_id {
            return Err(GuestError::invalid_relation(format!(
                "{} cannot be its own primary",
                companion_id
            )));
        }
        if new_primary.is_companion() {
            return Err(GuestError::invalid_relation(format!(
                "{} is a companion and cannot have companions",
                new_primary_id
            )));
        }
        if companion.has_companions() {
            return Err(GuestError::invalid_relation(format!(
                "{} has companions and cannot become a companion",
                companion_id
            )));
        }

        let mut changes = Changeset::default();

        if let Some(old_primary_id) = companion.primary_guest {
            if old_primary_id != new_primary_id {
                let mut old_primary = self.require(old_primary_id)?.clone();
                old_primary.remove_companion(companion_id);
                changes.update(old_primary);
            }
        }

        let mut new_primary = new_primary.clone();
        new_primary.add_companion(companion_id);

        let mut moved = companion.clone();
        moved.primary_guest = Some(new_primary_id);
        moved.inherit_address_from(&new_primary);

        changes.update(new_primary);
        changes.update(moved);
        Ok(changes)
    }

    /// Plans an address replacement, cascading to companions of a primary
    pub fn plan_update_address(
        &self,
        id: GuestId,
        address: Address,
    ) -> Result<Changeset, GuestError> {
        let guest = self.require(id)?;
        let mut changes = Changeset::default();

        let mut updated = guest.clone();
        updated.address = Some(address);

        if updated.is_primary() {
            for companion in self.companions_of(id) {
                let mut companion = companion.clone();
                companion.inherit_address_from(&updated);
                changes.update(companion);
            }
        }

        changes.updated.insert(0, updated);
        Ok(changes)
    }

    /// Plans appending a document to a guest
    ///
    /// # Errors
    ///
    /// Returns `GuestError::DuplicateDocument` if any guest holds the number
    pub fn plan_attach_document(
        &self,
        id: GuestId,
        document: Document,
    ) -> Result<Changeset, GuestError> {
        let mut guest = self.require(id)?.clone();
        self.ensure_documents_available(std::slice::from_ref(&document), None)?;
        guest.add_document(document)?;

        let mut changes = Changeset::default();
        changes.update(guest);
        Ok(changes)
    }

    /// Plans appending a contact number to a guest
    pub fn plan_attach_contact(
        &self,
        id: GuestId,
        contact: ContactNumber,
    ) -> Result<Changeset, GuestError> {
        let mut guest = self.require(id)?.clone();
        guest.add_contact_number(contact);

        let mut changes = Changeset::default();
        changes.update(guest);
        Ok(changes)
    }

    /// Plans turning a companion into a standalone primary guest
    ///
    /// The guest keeps its address and contact snapshots.
    pub fn plan_unlink_companion(&self, companion_id: GuestId) -> Result<Changeset, GuestError> {
        let companion = self.require(companion_id)?;
        let primary_id = companion.primary_guest.ok_or_else(|| {
            GuestError::invalid_relation(format!("{} is not a companion", companion_id))
        })?;

        let mut primary = self.require(primary_id)?.clone();
        primary.remove_companion(companion_id);

        let mut detached = companion.clone();
        detached.primary_guest = None;

        let mut changes = Changeset::default();
        changes.update(primary);
        changes.update(detached);
        Ok(changes)
    }

    /// Plans overwriting a stored guest's own fields
    ///
    /// Relation fields and the registration time must be unchanged; use the
    /// dedicated plans to move guests between primaries.
    pub fn plan_replace(&self, guest: Guest) -> Result<Changeset, GuestError> {
        let stored = self.require(guest.id)?;
        if stored.primary_guest != guest.primary_guest || stored.companions != guest.companions {
            return Err(GuestError::invalid_relation(format!(
                "relations of {} cannot be changed by a replacement",
                guest.id
            )));
        }
        if stored.registered_at != guest.registered_at {
            return Err(GuestError::invalid(format!(
                "registration time of {} cannot change",
                guest.id
            )));
        }
        self.ensure_documents_available(&guest.documents, Some(guest.id))?;

        let mut changes = Changeset::default();
        changes.update(guest);
        Ok(changes)
    }

    /// Checks that no document number is repeated or held by another guest
    fn ensure_documents_available(
        &self,
        documents: &[Document],
        owner: Option<GuestId>,
    ) -> Result<(), GuestError> {
        let mut incoming = HashSet::new();
        for document in documents {
            if !incoming.insert(document.number.as_str()) {
                return Err(GuestError::duplicate_document(&document.number));
            }
            match self.document_index.get(&document.number) {
                Some(holder) if Some(*holder) != owner => {
                    return Err(GuestError::duplicate_document(&document.number));
                }
                _ => {}
            }
        }
        Ok(())
    }

    // ========================================================================
    // Commit
    // ========================================================================

    /// Commits a changeset produced by one of the `plan_*` methods
    ///
    /// The changeset must have been planned against the current state.
    pub fn apply(&mut self, changes: Changeset) {
        debug!(
            created = changes.created.len(),
            updated = changes.updated.len(),
            removed = changes.removed.len(),
            "Applying guest changeset"
        );

        for guest in changes.removed {
            if let Some(stored) = self.guests.remove(&guest.id) {
                self.unindex(&stored);
            }
        }
        for guest in changes.updated.into_iter().chain(changes.created) {
            if let Some(previous) = self.guests.remove(&guest.id) {
                self.unindex(&previous);
            }
            self.index(&guest);
            self.guests.insert(guest.id, guest);
        }
    }

    fn index(&mut self, guest: &Guest) {
        for number in guest.document_numbers() {
            self.document_index.insert(number.to_string(), guest.id);
        }
    }

    fn unindex(&mut self, guest: &Guest) {
        for number in guest.document_numbers() {
            if self.document_index.get(number) == Some(&guest.id) {
                self.document_index.remove(number);
            }
        }
    }

    // ========================================================================
    // Plan-and-apply shortcuts
    // ========================================================================

    /// Stores a new guest
    pub fn add(&mut self, guest: Guest) -> Result<(), GuestError> {
        let changes = self.plan_add(guest)?;
        self.apply(changes);
        Ok(())
    }

    /// Removes a guest, applying `policy` to its companions
    pub fn remove(
        &mut self,
        id: GuestId,
        policy: CompanionRemovalPolicy,
    ) -> Result<RemovedGuest, GuestError> {
        let changes = self.plan_remove(id, policy)?;
        let outcome = RemovedGuest::from_changeset(id, &changes)
            .ok_or_else(|| GuestError::not_found(id))?;
        self.apply(changes);
        Ok(outcome)
    }

    /// Moves a guest under another primary guest
    pub fn reassign_primary(
        &mut self,
        companion_id: GuestId,
        new_primary_id: GuestId,
    ) -> Result<(), GuestError> {
        let changes = self.plan_reassign_primary(companion_id, new_primary_id)?;
        self.apply(changes);
        Ok(())
    }

    /// Replaces a guest's address, cascading to companions of a primary
    pub fn update_address(&mut self, id: GuestId, address: Address) -> Result<(), GuestError> {
        let changes = self.plan_update_address(id, address)?;
        self.apply(changes);
        Ok(())
    }

    /// Attaches a guest to a primary guest; see [`Self::plan_reassign_primary`]
    pub fn link_companion(
        &mut self,
        primary_id: GuestId,
        companion_id: GuestId,
    ) -> Result<(), GuestError> {
        self.reassign_primary(companion_id, primary_id)
    }

    /// Detaches a companion from its primary guest
    pub fn unlink_companion(&mut self, companion_id: GuestId) -> Result<(), GuestError> {
        let changes = self.plan_unlink_companion(companion_id)?;
        self.apply(changes);
        Ok(())
    }

    /// Overwrites a stored guest's own fields, re-indexing its documents
    pub fn replace(&mut self, guest: Guest) -> Result<(), GuestError> {
        let changes = self.plan_replace(guest)?;
        self.apply(changes);
        Ok(())
    }

    /// Appends a document to a guest
    pub fn attach_document(&mut self, id: GuestId, document: Document) -> Result<(), GuestError> {
        let changes = self.plan_attach_document(id, document)?;
        self.apply(changes);
        Ok(())
    }

    /// Appends a contact number to a guest
    pub fn attach_contact(&mut self, id: GuestId, contact: ContactNumber) -> Result<(), GuestError> {
        let changes = self.plan_attach_contact(id, contact)?;
        self.apply(changes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentCategory;
    use chrono::NaiveDate;

    fn birth() -> NaiveDate {
        NaiveDate::from_ymd_opt(1988, 2, 20).unwrap()
    }

    fn issued() -> NaiveDate {
        NaiveDate::from_ymd_opt(2012, 5, 5).unwrap()
    }

    fn primary(number: &str) -> Guest {
        let mut guest = Guest::new("Ana Costa", "Ana", birth());
        guest.address = Some(Address::new("Rua A", "Centro", "Sao Paulo", "SP", "Brazil", "01000-000"));
        guest
            .add_document(Document::new(DocumentCategory::NationalId, number, issued()))
            .unwrap();
        guest
    }

    fn companion(repo: &GuestRepository, primary_id: GuestId, passport: &str) -> Guest {
        let mut guest =
            Guest::companion_of(repo.get(primary_id).unwrap(), "Bruno", "Bruno", birth()).unwrap();
        guest
            .add_document(Document::new(DocumentCategory::Passport, passport, issued()))
            .unwrap();
        guest
    }

    #[test]
    fn test_add_and_find_by_document() {
        let mut repo = GuestRepository::new();
        let guest = primary("52998224725");
        let id = guest.id;
        repo.add(guest).unwrap();

        assert_eq!(repo.find_by_document_number("529.982.247-25").unwrap().id, id);
        assert!(repo.find_by_document_number("00000000000").is_none());
    }

    #[test]
    fn test_add_rejects_duplicate_across_guests() {
        let mut repo = GuestRepository::new();
        repo.add(primary("52998224725")).unwrap();
        let result = repo.add(primary("529.982.247-25"));
        assert!(matches!(result, Err(GuestError::DuplicateDocument(n)) if n == "52998224725"));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_add_companion_links_primary() {
        let mut repo = GuestRepository::new();
        let p = primary("52998224725");
        let pid = p.id;
        repo.add(p).unwrap();
        let c = companion(&repo, pid, "FZ123456");
        let cid = c.id;
        repo.add(c).unwrap();

        assert_eq!(repo.get(pid).unwrap().companions, vec![cid]);
        assert_eq!(repo.companions_of(pid).len(), 1);
        assert_eq!(repo.all_primaries().len(), 1);
        assert_eq!(repo.all_companions().len(), 1);
        assert!(repo.check_invariants().is_empty());
    }

    #[test]
    fn test_add_companion_with_missing_primary() {
        let mut repo = GuestRepository::new();
        let ghost = primary("52998224725");
        let orphan = Guest::companion_of(&ghost, "Bruno", "Bruno", birth()).unwrap();
        assert!(matches!(repo.add(orphan), Err(GuestError::NotFound(_))));
    }

    #[test]
    fn test_remove_companion_detaches() {
        let mut repo = GuestRepository::new();
        let p = primary("52998224725");
        let pid = p.id;
        repo.add(p).unwrap();
        let c = companion(&repo, pid, "FZ123456");
        let cid = c.id;
        repo.add(c).unwrap();

        let removed = repo.remove(cid, CompanionRemovalPolicy::default()).unwrap();
        assert_eq!(removed.guest.id, cid);
        assert!(repo.get(pid).unwrap().companions.is_empty());
        assert!(repo.find_by_document_number("FZ123456").is_none());
        assert!(repo.check_invariants().is_empty());
    }

    #[test]
    fn test_remove_primary_promotes_companions() {
        let mut repo = GuestRepository::new();
        let p = primary("52998224725");
        let pid = p.id;
        repo.add(p).unwrap();
        let c = companion(&repo, pid, "FZ123456");
        let cid = c.id;
        repo.add(c).unwrap();

        let removed = repo.remove(pid, CompanionRemovalPolicy::PromoteToPrimary).unwrap();
        assert_eq!(removed.promoted, vec![cid]);
        assert!(removed.cascaded.is_empty());
        assert!(repo.get(cid).unwrap().is_primary());
        assert!(repo.get(cid).unwrap().address.is_some());
        assert!(repo.check_invariants().is_empty());
    }

    #[test]
    fn test_remove_primary_cascades() {
        let mut repo = GuestRepository::new();
        let p = primary("52998224725");
        let pid = p.id;
        repo.add(p).unwrap();
        let c = companion(&repo, pid, "FZ123456");
        repo.add(c).unwrap();

        let removed = repo.remove(pid, CompanionRemovalPolicy::CascadeDelete).unwrap();
        assert_eq!(removed.cascaded.len(), 1);
        assert!(repo.is_empty());
        assert!(!repo.is_document_registered("FZ123456"));
    }

    #[test]
    fn test_plan_does_not_mutate() {
        let mut repo = GuestRepository::new();
        let p = primary("52998224725");
        let pid = p.id;
        repo.add(p).unwrap();

        let changes = repo
            .plan_update_address(pid, Address::new("Rua B", "", "Rio", "RJ", "Brazil", "20000-000"))
            .unwrap();
        assert_eq!(changes.updated.len(), 1);
        assert_eq!(repo.get(pid).unwrap().address.as_ref().unwrap().street, "Rua A");
    }

    #[test]
    fn test_reassign_to_current_primary_keeps_single_link() {
        let mut repo = GuestRepository::new();
        let p = primary("52998224725");
        let pid = p.id;
        repo.add(p).unwrap();
        let c = companion(&repo, pid, "FZ123456");
        let cid = c.id;
        repo.add(c).unwrap();

        repo.reassign_primary(cid, pid).unwrap();
        assert_eq!(repo.get(pid).unwrap().companions, vec![cid]);
        assert!(repo.check_invariants().is_empty());
    }

    #[test]
    fn test_from_guests_rebuilds_companion_lists() {
        let mut repo = GuestRepository::new();
        let p = primary("52998224725");
        let pid = p.id;
        repo.add(p).unwrap();
        let c = companion(&repo, pid, "FZ123456");
        let cid = c.id;
        repo.add(c).unwrap();

        let mut stored: Vec<Guest> = repo.iter().cloned().collect();
        for guest in &mut stored {
            guest.companions.clear();
        }
        let rebuilt = GuestRepository::from_guests(stored).unwrap();
        assert_eq!(rebuilt.get(pid).unwrap().companions, vec![cid]);
        assert!(rebuilt.check_invariants().is_empty());
    }

    #[test]
    fn test_from_guests_rejects_duplicate_documents() {
        let result = GuestRepository::from_guests(vec![primary("52998224725"), primary("52998224725")]);
        assert!(matches!(result, Err(GuestError::DuplicateDocument(_))));
    }

    #[test]
    fn test_plan_replace_rejects_relation_change() {
        let mut repo = GuestRepository::new();
        let p = primary("52998224725");
        let pid = p.id;
        repo.add(p).unwrap();

        let mut changed = repo.get(pid).unwrap().clone();
        changed.primary_guest = Some(GuestId::new_v7());
        assert!(matches!(repo.plan_replace(changed), Err(GuestError::InvalidRelation(_))));
    }

    #[test]
    fn test_unlink_and_link_companion() {
        let mut repo = GuestRepository::new();
        let p = primary("52998224725");
        let pid = p.id;
        repo.add(p).unwrap();
        let c = companion(&repo, pid, "FZ123456");
        let cid = c.id;
        repo.add(c).unwrap();

        repo.unlink_companion(cid).unwrap();
        assert!(repo.get(cid).unwrap().is_primary());
        assert!(repo.get(pid).unwrap().companions.is_empty());
        assert!(matches!(repo.unlink_companion(cid), Err(GuestError::InvalidRelation(_))));

        repo.link_companion(pid, cid).unwrap();
        assert_eq!(repo.get(cid).unwrap().primary_guest, Some(pid));
        assert!(repo.check_invariants().is_empty());
    }

    #[test]
    fn test_replace_reindexes_documents() {
        let mut repo = GuestRepository::new();
        let p = primary("52998224725");
        let pid = p.id;
        repo.add(p).unwrap();

        let mut changed = repo.get(pid).unwrap().clone();
        changed.documents.clear();
        changed
            .add_document(Document::new(DocumentCategory::Passport, "XK998877", issued()))
            .unwrap();
        repo.replace(changed).unwrap();

        assert!(repo.find_by_document_number("52998224725").is_none());
        assert_eq!(repo.find_by_document_number("xk998877").unwrap().id, pid);
        assert!(repo.check_invariants().is_empty());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "cascade_delete".parse::<CompanionRemovalPolicy>().unwrap(),
            CompanionRemovalPolicy::CascadeDelete
        );
        assert_eq!(
            CompanionRemovalPolicy::default(),
            CompanionRemovalPolicy::PromoteToPrimary
        );
        assert!("orphan".parse::<CompanionRemovalPolicy>().is_err());
    }
}
