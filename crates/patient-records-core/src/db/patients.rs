//! Patient database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Gender, Patient};

const PATIENT_COLUMNS: &str = "id, name, city, age, gender, height, weight";

impl Database {
    /// Insert a new patient. Fails with `AlreadyExists` on a duplicate id.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        insert_patient(&self.conn, patient)
    }

    /// Overwrite an existing patient's fields.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        update_patient(&self.conn, patient)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        get_patient(&self.conn, id)
    }

    /// List all patients in insertion order.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        list_patients(&self.conn)
    }

    /// Delete a patient.
    pub fn delete_patient(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Check whether an ID is taken.
    pub fn patient_exists(&self, id: &str) -> DbResult<bool> {
        patient_exists(&self.conn, id)
    }

    /// Number of stored patients.
    pub fn count_patients(&self) -> DbResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

// Connection-level helpers so the same statements run inside a transaction.

pub(crate) fn insert_patient(conn: &Connection, patient: &Patient) -> DbResult<()> {
    let result = conn.execute(
        r#"
        INSERT INTO patients (id, name, city, age, gender, height, weight)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            patient.id,
            patient.name,
            patient.city,
            patient.age,
            patient.gender.as_str(),
            patient.height,
            patient.weight,
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Err(DbError::AlreadyExists(patient.id.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn update_patient(conn: &Connection, patient: &Patient) -> DbResult<bool> {
    let rows_affected = conn.execute(
        r#"
        UPDATE patients SET
            name = ?2,
            city = ?3,
            age = ?4,
            gender = ?5,
            height = ?6,
            weight = ?7,
            updated_at = datetime('now')
        WHERE id = ?1
        "#,
        params![
            patient.id,
            patient.name,
            patient.city,
            patient.age,
            patient.gender.as_str(),
            patient.height,
            patient.weight,
        ],
    )?;
    Ok(rows_affected > 0)
}

pub(crate) fn get_patient(conn: &Connection, id: &str) -> DbResult<Option<Patient>> {
    conn.query_row(
        &format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS),
        [id],
        row_to_patient,
    )
    .optional()
    .map_err(Into::into)
}

pub(crate) fn list_patients(conn: &Connection) -> DbResult<Vec<Patient>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM patients ORDER BY rowid",
        PATIENT_COLUMNS
    ))?;
    let rows = stmt.query_map([], row_to_patient)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub(crate) fn patient_exists(conn: &Connection, id: &str) -> DbResult<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM patients WHERE id = ?", [id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

fn row_to_patient(row: &Row<'_>) -> rusqlite::Result<Patient> {
    let gender: String = row.get(4)?;
    let gender = Gender::parse(&gender).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown gender '{}'", gender).into(),
        )
    })?;

    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        city: row.get(2)?,
        age: row.get(3)?,
        gender,
        height: row.get(5)?,
        weight: row.get(6)?,
    })
}
