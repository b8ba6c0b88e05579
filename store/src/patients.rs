use std::path::Path;

use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use contact_protocol::Gender;
use contact_protocol::Patient;
use contact_protocol::UpdatePatient;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use rusqlite::types::Type;

use crate::error::Result;
use crate::error::StoreError;

/// Embedded schema, applied on every open.
const SCHEMA_SQL: &str = include_str!("../PATIENTS_SCHEMA.sql");

const SELECT_PATIENT: &str = r#"
    SELECT p.id, p.first_name, p.last_name, p.ssn, p.contacted, p.created, p.updated,
           g.id, g.name
    FROM patients p
    LEFT JOIN genders g ON g.id = p.gender_id
"#;

/// Fields for inserting a patient. The id is generated by the store.
#[derive(Debug, Clone)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub ssn: String,
    pub gender_id: Option<i64>,
    pub contacted: bool,
    pub created: DateTime<Utc>,
}

/// SQLite-backed patient store.
pub struct PatientStore {
    conn: Connection,
}

impl PatientStore {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(StoreError::database("failed to open db"))?;
        Self::apply_schema(&conn)?;

        tracing::debug!(path = %path.display(), "Patient store initialized");

        Ok(Self { conn })
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(StoreError::database("failed to open in-memory db"))?;
        Self::apply_schema(&conn)?;
        Ok(Self { conn })
    }

    fn apply_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(StoreError::database("failed to apply schema"))
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────────

    /// Patients whose contacted flag equals `contacted`, oldest first.
    pub fn find(&self, contacted: bool) -> Result<Vec<Patient>> {
        let sql = format!("{SELECT_PATIENT} WHERE p.contacted = ?1 ORDER BY p.created, p.id");
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(StoreError::database("failed to prepare patient list"))?;

        let rows = stmt
            .query_map(params![contacted], patient_from_row)
            .map_err(StoreError::database("failed to list patients"))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::database("failed to read patient row"))
    }

    /// Number of patients, optionally restricted to one contacted state.
    pub fn count(&self, contacted: Option<bool>) -> Result<u64> {
        let count: i64 = match contacted {
            Some(contacted) => self.conn.query_row(
                "SELECT COUNT(*) FROM patients WHERE contacted = ?1",
                params![contacted],
                |row| row.get(0),
            ),
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0)),
        }
        .map_err(StoreError::database("failed to count patients"))?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    pub fn find_one(&self, id: &str) -> Result<Option<Patient>> {
        let sql = format!("{SELECT_PATIENT} WHERE p.id = ?1");
        self.conn
            .query_row(&sql, params![id], patient_from_row)
            .optional()
            .map_err(StoreError::database("failed to load patient"))
    }

    pub fn gender(&self, id: i64) -> Result<Option<Gender>> {
        self.conn
            .query_row(
                "SELECT id, name FROM genders WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Gender {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::database("failed to load gender"))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn insert(&self, new: &NewPatient) -> Result<Patient> {
        let id = insert_patient(&self.conn, new)?;
        self.find_one(&id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
            .map_err(StoreError::database("inserted patient not found"))
    }

    /// Apply the provided fields of `update` to patient `id`.
    ///
    /// Returns `Ok(None)` when no such patient exists. `updated` is bumped
    /// even when the update carries no fields.
    pub fn update(&self, id: &str, update: &UpdatePatient) -> Result<Option<Patient>> {
        let Some(mut patient) = self.find_one(id)? else {
            return Ok(None);
        };

        if let Some(first_name) = &update.first_name {
            patient.first_name = non_blank("firstName", first_name)?;
        }
        if let Some(last_name) = &update.last_name {
            patient.last_name = non_blank("lastName", last_name)?;
        }
        if let Some(ssn) = &update.ssn {
            patient.ssn = ssn.trim().to_string();
        }
        if let Some(gender_id) = update.gender_id {
            let gender = self
                .gender(gender_id)?
                .ok_or_else(|| StoreError::Validation(format!("unknown genderId {gender_id}")))?;
            patient.gender = Some(gender);
        }
        if let Some(contacted) = update.contacted {
            patient.contacted = contacted;
        }

        self.conn
            .execute(
                r#"
                UPDATE patients
                SET first_name = ?2, last_name = ?3, ssn = ?4, gender_id = ?5,
                    contacted = ?6, updated = ?7
                WHERE id = ?1
                "#,
                params![
                    patient.id,
                    patient.first_name,
                    patient.last_name,
                    patient.ssn,
                    patient.gender.as_ref().map(|g| g.id),
                    patient.contacted,
                    timestamp(Utc::now()),
                ],
            )
            .map_err(StoreError::database("failed to update patient"))?;

        tracing::debug!(patient_id = id, contacted = patient.contacted, "Updated patient");

        self.find_one(id)
    }
}

pub(crate) fn insert_patient(conn: &Connection, new: &NewPatient) -> Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    let first_name = non_blank("firstName", &new.first_name)?;
    let last_name = non_blank("lastName", &new.last_name)?;
    let created = timestamp(new.created);
    conn.execute(
        r#"
        INSERT INTO patients
            (id, first_name, last_name, ssn, gender_id, contacted, created, updated)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
        "#,
        params![
            id,
            first_name,
            last_name,
            new.ssn,
            new.gender_id,
            new.contacted,
            created,
        ],
    )
    .map_err(StoreError::database("failed to insert patient"))?;
    Ok(id)
}

fn non_blank(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation(format!("{field} must not be blank")));
    }
    Ok(trimmed.to_string())
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    let gender_id: Option<i64> = row.get(7)?;
    let gender_name: Option<String> = row.get(8)?;
    let gender = match (gender_id, gender_name) {
        (Some(id), Some(name)) => Some(Gender { id, name }),
        _ => None,
    };

    Ok(Patient {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        ssn: row.get(3)?,
        contacted: row.get(4)?,
        created: parse_timestamp(row, 5)?,
        updated: parse_timestamp(row, 6)?,
        gender,
    })
}
