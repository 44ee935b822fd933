//! Patient Records Core Library
//!
//! Keyed patient storage with BMI derivation and partial updates.
//!
//! # Architecture
//!
//! ```text
//!  HTTP handler ──► PatientRegistry ──► Mutex<Database> (SQLite `patients`)
//!                        │
//!                        ├── merge(existing, update)   sparse overlay, id preserved
//!                        └── Patient::view(policy)     bmi + verdict, computed on read
//! ```
//!
//! # Core Principle
//!
//! **Derived fields are never stored.** BMI and verdict are recomputed from
//! height and weight on every read.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Patient, PatientUpdate, ValidationError)
//! - [`bmi`]: BMI and verdict derivation
//! - [`sort`]: Stable ordering by height, weight or BMI
//! - [`document`]: Flat JSON document import/export

pub mod bmi;
pub mod db;
pub mod document;
pub mod models;
pub mod sort;

// Re-export commonly used types
pub use bmi::{Derived, Verdict, VerdictPolicy};
pub use db::{Database, DbError};
pub use document::{DocumentError, ImportMode, ImportReport, PatientDocument};
pub use models::{merge, Gender, Patient, PatientUpdate, PatientView, ValidationError};
pub use sort::{SortField, SortOrder};

use std::path::Path;
use std::sync::{Arc, Mutex};

// =========================================================================
// Error Type
// =========================================================================

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("Patient already exists: {0}")]
    AlreadyExists(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Storage error: {0}")]
    Storage(DbError),

    #[error("Lock poisoned: {0}")]
    Poisoned(String),
}

pub type RecordResult<T> = Result<T, RecordError>;

impl From<DbError> for RecordError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::AlreadyExists(id) => RecordError::AlreadyExists(id),
            other => RecordError::Storage(other),
        }
    }
}

impl From<DocumentError> for RecordError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::Db(db) => db.into(),
            DocumentError::Invalid { id, source } => RecordError::Validation(
                ValidationError::new(format!("{}.{}", id, source.field), source.message),
            ),
            DocumentError::Duplicate(id) => RecordError::AlreadyExists(id),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for RecordError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        RecordError::Poisoned(e.to_string())
    }
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe handle over the record store.
///
/// Every operation holds the store lock for its whole read-modify-write
/// sequence, so concurrent updates are serialized instead of lost.
#[derive(Clone)]
pub struct PatientRegistry {
    db: Arc<Mutex<Database>>,
    policy: VerdictPolicy,
}

impl PatientRegistry {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P, policy: VerdictPolicy) -> RecordResult<Self> {
        Ok(Self::new(Database::open(path)?, policy))
    }

    /// Create an in-memory registry (for testing).
    pub fn open_in_memory(policy: VerdictPolicy) -> RecordResult<Self> {
        Ok(Self::new(Database::open_in_memory()?, policy))
    }

    pub fn new(db: Database, policy: VerdictPolicy) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            policy,
        }
    }

    /// Verdict policy applied to every read.
    pub fn policy(&self) -> VerdictPolicy {
        self.policy
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Get one patient with derived fields.
    pub fn view(&self, id: &str) -> RecordResult<PatientView> {
        self.view_with_etag(id).map(|(view, _)| view)
    }

    /// Get one patient together with its entity tag.
    pub fn view_with_etag(&self, id: &str) -> RecordResult<(PatientView, String)> {
        let db = self.db.lock()?;
        let patient = db
            .get_patient(id)?
            .ok_or_else(|| RecordError::NotFound(id.to_string()))?;
        let etag = patient.etag();
        Ok((patient.view(self.policy), etag))
    }

    /// All patients in store order.
    pub fn list(&self) -> RecordResult<Vec<PatientView>> {
        let db = self.db.lock()?;
        let patients = db.list_patients()?;
        Ok(self.views(patients))
    }

    /// All patients ordered by `sort_by` (`height`, `weight` or `bmi`).
    /// `order` defaults to ascending.
    pub fn sort(&self, sort_by: &str, order: Option<&str>) -> RecordResult<Vec<PatientView>> {
        let field: SortField = sort_by.parse().map_err(RecordError::InvalidArgument)?;
        let order: SortOrder = match order {
            Some(order) => order.parse().map_err(RecordError::InvalidArgument)?,
            None => SortOrder::default(),
        };

        let patients = {
            let db = self.db.lock()?;
            db.list_patients()?
        };
        Ok(self.views(sort::sorted(patients, field, order)))
    }

    /// Number of stored patients.
    pub fn count(&self) -> RecordResult<u64> {
        let db = self.db.lock()?;
        Ok(db.count_patients()?)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Store a new patient. The id must not be taken.
    pub fn create(&self, patient: Patient) -> RecordResult<PatientView> {
        patient.validate()?;

        let db = self.db.lock()?;
        db.insert_patient(&patient)?;
        tracing::info!(id = %patient.id, "patient created");

        Ok(patient.view(self.policy))
    }

    /// Apply a sparse update. With `if_match`, the update only goes through
    /// when the stored record's entity tag still matches.
    pub fn update(
        &self,
        id: &str,
        update: &PatientUpdate,
        if_match: Option<&str>,
    ) -> RecordResult<PatientView> {
        update.validate()?;

        let db = self.db.lock()?;
        let existing = db
            .get_patient(id)?
            .ok_or_else(|| RecordError::NotFound(id.to_string()))?;

        if let Some(expected) = if_match {
            if expected != existing.etag() {
                return Err(RecordError::PreconditionFailed(format!(
                    "Patient {} was modified since it was read",
                    id
                )));
            }
        }

        let merged = merge(&existing, update);
        merged.validate()?;
        if merged != existing {
            db.update_patient(&merged)?;
        }
        tracing::info!(id = %id, "patient updated");

        Ok(merged.view(self.policy))
    }

    /// Remove a patient.
    pub fn delete(&self, id: &str) -> RecordResult<()> {
        let db = self.db.lock()?;
        if !db.delete_patient(id)? {
            return Err(RecordError::NotFound(id.to_string()));
        }
        tracing::info!(id = %id, "patient deleted");
        Ok(())
    }

    // =========================================================================
    // Document Operations
    // =========================================================================

    /// Load a flat JSON document into the store.
    pub fn import_document(
        &self,
        document: PatientDocument,
        mode: ImportMode,
    ) -> RecordResult<ImportReport> {
        let mut db = self.db.lock()?;
        let report = document::import_document(&mut db, document, mode)?;
        tracing::info!(
            imported = report.imported,
            skipped = report.skipped,
            "document imported"
        );
        Ok(report)
    }

    /// Snapshot the store as a flat JSON document.
    pub fn export_document(&self) -> RecordResult<PatientDocument> {
        let db = self.db.lock()?;
        Ok(document::export_document(&db)?)
    }

    fn views(&self, patients: Vec<Patient>) -> Vec<PatientView> {
        patients.iter().map(|p| p.view(self.policy)).collect()
    }
}
