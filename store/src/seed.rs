//! Deterministic demo data for local runs.

use chrono::Duration;
use chrono::TimeZone;
use chrono::Utc;

use crate::PatientStore;
use crate::error::Result;
use crate::error::StoreError;
use crate::patients::NewPatient;
use crate::patients::insert_patient;

/// Number of patients `contact-server --seed` inserts by default.
pub const DEFAULT_DEMO_PATIENTS: usize = 40;

const FIRST_NAMES: &[&str] = &[
    "Amelia", "Bruno", "Chiara", "Dmitri", "Elif", "Farah", "Goran", "Hana", "Ivo", "Jana",
    "Kemal", "Lucia", "Marek", "Nadia", "Oskar", "Petra", "Quentin", "Rosa", "Stefan", "Tamara",
];

const LAST_NAMES: &[&str] = &[
    "Novak", "Horvat", "Kovac", "Babic", "Marić", "Jurić", "Knez", "Vuković", "Petrović",
    "Tomić", "Blažević", "Grgić", "Pavlović", "Lovrić",
];

impl PatientStore {
    /// Insert `count` demo patients if the store is empty.
    ///
    /// Returns the number of rows inserted (zero when data already exists).
    /// Every fourth patient starts out contacted; creation times are one
    /// minute apart so listing order follows insertion order.
    pub fn seed_demo(&mut self, count: usize) -> Result<usize> {
        if self.count(None)? > 0 {
            tracing::debug!("Patient store already populated; skipping demo seed");
            return Ok(0);
        }

        let base = Utc
            .with_ymd_and_hms(2024, 1, 8, 8, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);

        let tx = self
            .connection_mut()
            .transaction()
            .map_err(StoreError::database("failed to begin seed transaction"))?;

        for i in 0..count {
            let patient = NewPatient {
                first_name: FIRST_NAMES[i % FIRST_NAMES.len()].to_string(),
                last_name: LAST_NAMES[(i * 7 + 3) % LAST_NAMES.len()].to_string(),
                ssn: format!(
                    "{:03}-{:02}-{:04}",
                    100 + (i * 37) % 800,
                    10 + (i * 13) % 89,
                    (i * 7919) % 10_000
                ),
                gender_id: Some((i % 3) as i64 + 1),
                contacted: i % 4 == 0,
                created: base + Duration::minutes(i as i64),
            };
            insert_patient(&tx, &patient)?;
        }

        tx.commit()
            .map_err(StoreError::database("failed to commit seed transaction"))?;

        tracing::info!(count, "Seeded demo patients");
        Ok(count)
    }
}
