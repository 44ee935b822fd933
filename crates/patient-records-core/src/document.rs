//! Import and export of the flat JSON patient document.
//!
//! The document maps each patient id to its base fields:
//!
//! ```json
//! { "P001": { "name": "...", "city": "...", "age": 25, "gender": "male",
//!             "height": 175.5, "weight": 70.2 } }
//! ```
//!
//! Older files also carry `bmi`/`verdict` per entry. Those keys are ignored
//! on import and never written on export.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{self, Database, DbError};
use crate::models::{Gender, Patient, ValidationError};

/// Document errors.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Invalid entry {id}: {source}")]
    Invalid {
        id: String,
        #[source]
        source: ValidationError,
    },

    #[error("Patient already exists: {0}")]
    Duplicate(String),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// One entry of the document, keyed by patient id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentEntry {
    pub name: String,
    pub city: String,
    pub age: u32,
    pub gender: Gender,
    pub height: f64,
    pub weight: f64,
}

impl DocumentEntry {
    fn into_patient(self, id: String) -> Patient {
        Patient {
            id,
            name: self.name,
            city: self.city,
            age: self.age,
            gender: self.gender,
            height: self.height,
            weight: self.weight,
        }
    }
}

impl From<Patient> for DocumentEntry {
    fn from(patient: Patient) -> Self {
        Self {
            name: patient.name,
            city: patient.city,
            age: patient.age,
            gender: patient.gender,
            height: patient.height,
            weight: patient.weight,
        }
    }
}

/// The whole document. Entries are kept ordered by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PatientDocument {
    pub entries: BTreeMap<String, DocumentEntry>,
}

impl PatientDocument {
    /// Parse a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Render as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Read a document from disk.
    pub fn read(path: &Path) -> DocumentResult<Self> {
        let text = fs::read_to_string(path).map_err(DbError::from)?;
        Ok(Self::from_json(&text).map_err(DbError::from)?)
    }

    /// Write a document to disk. The data goes to a sibling temp file first
    /// and is renamed over `path`, so readers never see a partial file.
    pub fn write(&self, path: &Path) -> DocumentResult<()> {
        let json = self.to_json().map_err(DbError::from)?;
        let tmp = temp_path(path);
        fs::write(&tmp, json).map_err(DbError::from)?;
        fs::rename(&tmp, path).map_err(DbError::from)?;
        Ok(())
    }

    /// Validated patients in id order.
    pub fn into_patients(self) -> DocumentResult<Vec<Patient>> {
        self.entries
            .into_iter()
            .map(|(id, entry)| {
                let patient = entry.into_patient(id);
                patient.validate().map_err(|source| DocumentError::Invalid {
                    id: patient.id.clone(),
                    source,
                })?;
                Ok(patient)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Patient> for PatientDocument {
    fn from_iter<I: IntoIterator<Item = Patient>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|p| (p.id.clone(), DocumentEntry::from(p)))
            .collect();
        Self { entries }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// What to do when an imported id is already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Abort the whole import.
    #[default]
    Fail,
    /// Keep the stored record and move on.
    SkipExisting,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Load every entry of `document` into the store in one transaction.
/// Nothing is written unless every entry is valid.
pub fn import_document(
    database: &mut Database,
    document: PatientDocument,
    mode: ImportMode,
) -> DocumentResult<ImportReport> {
    let patients = document.into_patients()?;
    let tx = database.transaction()?;
    let mut report = ImportReport::default();

    for patient in &patients {
        if db::patient_exists(&tx, &patient.id)? {
            match mode {
                ImportMode::Fail => return Err(DocumentError::Duplicate(patient.id.clone())),
                ImportMode::SkipExisting => {
                    tracing::debug!(id = %patient.id, "skipping existing patient");
                    report.skipped += 1;
                    continue;
                }
            }
        }
        db::insert_patient(&tx, patient)?;
        report.imported += 1;
    }

    tx.commit().map_err(DbError::from)?;
    Ok(report)
}

/// Snapshot the whole store as a document.
pub fn export_document(database: &Database) -> DocumentResult<PatientDocument> {
    Ok(database.list_patients()?.into_iter().collect())
}
