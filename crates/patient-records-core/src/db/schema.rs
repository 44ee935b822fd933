//! SQLite schema definition.

/// Complete database schema for patient records.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients
-- ============================================================================

-- Derived values (bmi, verdict) are computed on read and never stored.
CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY CHECK (length(trim(id)) > 0),
    name TEXT NOT NULL,
    city TEXT NOT NULL,
    age INTEGER NOT NULL CHECK (age >= 0),
    gender TEXT NOT NULL CHECK (gender IN ('male', 'female', 'other')),
    height REAL NOT NULL CHECK (height > 0),
    weight REAL NOT NULL CHECK (weight > 0),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_no_secondary_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        // Only SQLite's implicit primary-key index may exist
        let explicit: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND sql IS NOT NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(explicit, 0);
    }

    #[test]
    fn test_measurement_constraints() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        // Non-positive height should fail
        let result = conn.execute(
            "INSERT INTO patients (id, name, city, age, gender, height, weight)
             VALUES ('P1', 'A', 'B', 30, 'male', 0, 70)",
            [],
        );
        assert!(result.is_err());

        // Unknown gender should fail
        let result = conn.execute(
            "INSERT INTO patients (id, name, city, age, gender, height, weight)
             VALUES ('P1', 'A', 'B', 30, 'robot', 170, 70)",
            [],
        );
        assert!(result.is_err());

        // Negative age should fail
        let result = conn.execute(
            "INSERT INTO patients (id, name, city, age, gender, height, weight)
             VALUES ('P1', 'A', 'B', -1, 'male', 170, 70)",
            [],
        );
        assert!(result.is_err());

        // Valid row should succeed
        let result = conn.execute(
            "INSERT INTO patients (id, name, city, age, gender, height, weight)
             VALUES ('P1', 'A', 'B', 30, 'male', 170, 70)",
            [],
        );
        assert!(result.is_ok());
    }
}
