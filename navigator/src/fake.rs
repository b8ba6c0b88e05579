//! In-memory [`PatientApi`] for tests.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use contact_protocol::Patient;
use contact_protocol::PatientPatch;
use contact_protocol::PatientStats;
use tokio::sync::Notify;

use crate::api::PatientApi;

/// Patient with predictable fields. `created` follows the id's first byte so
/// that lists built from `a`, `b`, `c`... stay in creation order.
pub fn patient(id: &str, contacted: bool) -> Patient {
    let offset = id.bytes().next().map(i64::from).unwrap_or_default();
    let created = DateTime::<Utc>::UNIX_EPOCH + Duration::minutes(offset);
    Patient {
        id: id.to_string(),
        first_name: format!("First-{id}"),
        last_name: format!("Last-{id}"),
        ssn: format!("000-00-{offset:04}"),
        gender: None,
        contacted,
        created,
        updated: created,
    }
}

/// Backend double holding patients in memory.
///
/// Every toggle is observable: call counters, failure switches, a mode that
/// answers PATCH with only `{contacted}`, and per-id gates that park
/// `fetch_patient` until released.
#[derive(Debug, Default)]
pub struct FakePatientApi {
    patients: Mutex<Vec<Patient>>,
    stats_override: Mutex<Option<PatientStats>>,
    holds: Mutex<HashMap<String, Arc<Notify>>>,
    patient_fetches: AtomicUsize,
    list_fetches: AtomicUsize,
    stats_fetches: AtomicUsize,
    updates: AtomicUsize,
    fail_loads: AtomicBool,
    fail_stats: AtomicBool,
    fail_updates: AtomicBool,
    partial_updates: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn injected(what: &str) -> io::Error {
    io::Error::other(format!("injected {what} failure"))
}

impl FakePatientApi {
    pub fn with_patients(patients: Vec<Patient>) -> Self {
        Self {
            patients: Mutex::new(patients),
            ..Self::default()
        }
    }

    /// Report fixed stats instead of counting the held patients.
    pub fn override_stats(&self, stats: PatientStats) {
        *lock(&self.stats_override) = Some(stats);
    }

    /// Change a patient behind the hook's back, as another operator would.
    pub fn set_contacted(&self, patient_id: &str, contacted: bool) {
        if let Some(patient) = lock(&self.patients).iter_mut().find(|p| p.id == patient_id) {
            patient.contacted = contacted;
        }
    }

    /// Park `fetch_patient(patient_id)` until the returned gate is notified.
    pub fn hold_patient(&self, patient_id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        lock(&self.holds).insert(patient_id.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_stats(&self, fail: bool) {
        self.fail_stats.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Answer PATCH with `{contacted}` only instead of the full record.
    pub fn partial_update_responses(&self, partial: bool) {
        self.partial_updates.store(partial, Ordering::SeqCst);
    }

    pub fn patient_fetches(&self) -> usize {
        self.patient_fetches.load(Ordering::SeqCst)
    }

    pub fn list_fetches(&self) -> usize {
        self.list_fetches.load(Ordering::SeqCst)
    }

    pub fn stats_fetches(&self) -> usize {
        self.stats_fetches.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PatientApi for FakePatientApi {
    type Error = io::Error;

    async fn fetch_patient(&self, patient_id: &str) -> Result<Option<Patient>, Self::Error> {
        self.patient_fetches.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.holds).get(patient_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(injected("patient"));
        }
        Ok(lock(&self.patients)
            .iter()
            .find(|p| p.id == patient_id)
            .cloned())
    }

    async fn fetch_uncontacted_patients(&self) -> Result<Vec<Patient>, Self::Error> {
        self.list_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(injected("list"));
        }
        Ok(lock(&self.patients)
            .iter()
            .filter(|p| !p.contacted)
            .cloned()
            .collect())
    }

    async fn fetch_patient_stats(&self) -> Result<PatientStats, Self::Error> {
        self.stats_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_stats.load(Ordering::SeqCst) {
            return Err(injected("stats"));
        }
        if let Some(stats) = *lock(&self.stats_override) {
            return Ok(stats);
        }
        let patients = lock(&self.patients);
        let total = patients.len() as u64;
        let contacted = patients.iter().filter(|p| p.contacted).count() as u64;
        Ok(PatientStats {
            total_patients_count: total,
            contacted_patients_count: contacted,
            remaining_patients_count: total - contacted,
        })
    }

    async fn update_contacted_patient(
        &self,
        patient_id: &str,
        contacted: bool,
    ) -> Result<PatientPatch, Self::Error> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(injected("update"));
        }
        let mut patients = lock(&self.patients);
        let Some(patient) = patients.iter_mut().find(|p| p.id == patient_id) else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no patient {patient_id}"),
            ));
        };
        patient.contacted = contacted;
        patient.updated += Duration::seconds(1);

        if self.partial_updates.load(Ordering::SeqCst) {
            Ok(PatientPatch {
                contacted: Some(contacted),
                ..Default::default()
            })
        } else {
            Ok(PatientPatch::from(patient.clone()))
        }
    }
}
