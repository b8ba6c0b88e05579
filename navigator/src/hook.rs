//! Patient data hook.
//!
//! Fetches one patient, the uncontacted list and the stats together, and
//! owns the contacted mutation. State is published through a watch channel;
//! work runs on spawned tasks so callers never block on the network.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use contact_async_utils::CancellationToken;
use contact_async_utils::LatestRequest;
use contact_async_utils::OrCancelExt;
use contact_protocol::Patient;
use contact_protocol::PatientPatch;
use contact_protocol::PatientStats;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::PatientApi;

/// Snapshot of everything the hook has fetched.
///
/// After a failed fetch this holds whatever was there before; there is no
/// separate error state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientDataState {
    pub patient: Option<Patient>,
    pub loading: bool,
    pub uncontacted_patients: Vec<Patient>,
    pub stats: PatientStats,
}

struct Inner<A> {
    api: A,
    state: watch::Sender<PatientDataState>,
    patient_id: Mutex<String>,
    loads: LatestRequest,
}

impl<A> Inner<A> {
    fn current_id(&self) -> String {
        self.patient_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Data hook for one patient page. Cheap to clone; clones share state.
pub struct PatientData<A> {
    inner: Arc<Inner<A>>,
}

impl<A> Clone for PatientData<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: PatientApi> PatientData<A> {
    pub fn new(api: A) -> Self {
        let (state, _) = watch::channel(PatientDataState::default());
        Self {
            inner: Arc::new(Inner {
                api,
                state,
                patient_id: Mutex::new(String::new()),
                loads: LatestRequest::new(),
            }),
        }
    }

    pub fn api(&self) -> &A {
        &self.inner.api
    }

    pub fn subscribe(&self) -> watch::Receiver<PatientDataState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> PatientDataState {
        self.inner.state.borrow().clone()
    }

    /// Identifier the hook is currently bound to (empty before the first open).
    pub fn patient_id(&self) -> String {
        self.inner.current_id()
    }

    /// Bind the hook to `patient_id` and start loading it.
    ///
    /// Returns `None` without fetching when the id is empty or unchanged.
    /// A load still running for the previous id is cancelled and its
    /// results are discarded.
    pub fn open(&self, patient_id: &str) -> Option<JoinHandle<()>> {
        if patient_id.is_empty() {
            return None;
        }
        {
            let mut current = self
                .inner
                .patient_id
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *current == patient_id {
                return None;
            }
            *current = patient_id.to_string();
        }
        Some(self.spawn_load(patient_id.to_string()))
    }

    /// Re-run the combined load for the current id.
    pub fn reload(&self) -> Option<JoinHandle<()>> {
        let patient_id = self.patient_id();
        if patient_id.is_empty() {
            return None;
        }
        Some(self.spawn_load(patient_id))
    }

    fn spawn_load(&self, patient_id: String) -> JoinHandle<()> {
        let token = self.inner.loads.begin();
        self.inner.state.send_modify(|state| state.loading = true);
        tokio::spawn(load(Arc::clone(&self.inner), patient_id, token))
    }

    /// Set the contacted flag of the current patient, merge the response
    /// into the held record, then refresh stats and the uncontacted list.
    pub fn update_contacted(&self, contacted: bool) -> JoinHandle<()> {
        let patient_id = self.patient_id();
        tokio::spawn(update_contacted(
            Arc::clone(&self.inner),
            patient_id,
            contacted,
        ))
    }
}

async fn load<A: PatientApi>(inner: Arc<Inner<A>>, patient_id: String, token: CancellationToken) {
    let api = &inner.api;
    let fetched = async {
        tokio::try_join!(
            api.fetch_patient(&patient_id),
            api.fetch_uncontacted_patients(),
            api.fetch_patient_stats(),
        )
    }
    .or_cancel(&token)
    .await;

    let Ok(fetched) = fetched else {
        tracing::debug!(%patient_id, "Dropping superseded patient load");
        return;
    };

    inner.state.send_if_modified(|state| {
        // A newer open may have begun between fetch and publish.
        if token.is_cancelled() {
            return false;
        }
        match fetched {
            Ok((patient, uncontacted_patients, stats)) => {
                if patient.is_none() {
                    tracing::info!(%patient_id, "No patient found");
                }
                state.patient = patient;
                state.uncontacted_patients = uncontacted_patients;
                state.stats = stats;
            }
            Err(err) => {
                tracing::error!(%patient_id, error = %err, "Error loading patient data");
            }
        }
        state.loading = false;
        true
    });
}

async fn update_contacted<A: PatientApi>(inner: Arc<Inner<A>>, patient_id: String, contacted: bool) {
    if patient_id.is_empty() {
        tracing::warn!("Ignoring contacted update with no patient open");
        return;
    }

    let api = &inner.api;
    let patch = match api.update_contacted_patient(&patient_id, contacted).await {
        Ok(patch) => patch,
        Err(err) => {
            tracing::error!(%patient_id, error = %err, "Error updating patient");
            return;
        }
    };

    let still_open = inner.current_id() == patient_id;
    inner.state.send_if_modified(|state| {
        if !still_open {
            tracing::debug!(%patient_id, "Patient closed before update returned; not merging");
            return false;
        }
        merge_patch(state, &patient_id, patch)
    });

    match tokio::try_join!(
        api.fetch_patient_stats(),
        api.fetch_uncontacted_patients()
    ) {
        Ok((stats, uncontacted_patients)) => {
            inner.state.send_modify(|state| {
                state.stats = stats;
                state.uncontacted_patients = uncontacted_patients;
            });
        }
        Err(err) => {
            tracing::error!(%patient_id, error = %err, "Error refreshing after update");
        }
    }
}

/// Shallow-merge `patch` into the held patient. Returns whether state changed.
fn merge_patch(state: &mut PatientDataState, patient_id: &str, patch: PatientPatch) -> bool {
    match state.patient.as_mut() {
        Some(patient) if patient.id == patient_id => {
            patient.merge(patch);
            true
        }
        Some(_) => false,
        None => match Patient::try_from(patch) {
            Ok(patient) => {
                state.patient = Some(patient);
                true
            }
            Err(err) => {
                tracing::warn!(%patient_id, error = %err, "Cannot build patient from update");
                false
            }
        },
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::fake::FakePatientApi;
    use crate::fake::patient;
    use pretty_assertions::assert_eq;

    fn ids(patients: &[Patient]) -> Vec<&str> {
        patients.iter().map(|p| p.id.as_str()).collect()
    }

    #[tokio::test]
    async fn open_fetches_patient_list_and_stats() {
        let api = FakePatientApi::with_patients(vec![
            patient("a", false),
            patient("b", true),
            patient("c", false),
        ]);
        let data = PatientData::new(api);

        let handle = data.open("b").expect("load started");
        assert!(data.snapshot().loading);
        handle.await.expect("join");

        let state = data.snapshot();
        assert!(!state.loading);
        assert_eq!(state.patient.map(|p| p.id), Some("b".to_string()));
        assert_eq!(ids(&state.uncontacted_patients), vec!["a", "c"]);
        assert_eq!(
            state.stats,
            PatientStats {
                total_patients_count: 3,
                contacted_patients_count: 1,
                remaining_patients_count: 2,
            }
        );
    }

    #[tokio::test]
    async fn reopening_the_same_id_does_not_refetch() {
        let data = PatientData::new(FakePatientApi::with_patients(vec![patient("a", false)]));

        data.open("a").expect("first load").await.expect("join");
        assert!(data.open("a").is_none());
        assert!(data.open("").is_none());

        assert_eq!(data.api().patient_fetches(), 1);
    }

    #[tokio::test]
    async fn failed_load_clears_loading_and_keeps_old_state() {
        let api = FakePatientApi::with_patients(vec![patient("a", false), patient("b", false)]);
        let data = PatientData::new(api);
        data.open("a").expect("load").await.expect("join");

        data.api().fail_stats(true);
        data.open("b").expect("load").await.expect("join");

        let state = data.snapshot();
        assert!(!state.loading);
        assert_eq!(state.patient.map(|p| p.id), Some("a".to_string()));
    }

    #[tokio::test]
    async fn unknown_id_leaves_no_patient() {
        let data = PatientData::new(FakePatientApi::with_patients(vec![patient("a", false)]));
        data.open("zzz").expect("load").await.expect("join");

        let state = data.snapshot();
        assert_eq!(state.patient, None);
        assert_eq!(ids(&state.uncontacted_patients), vec!["a"]);
    }

    #[tokio::test]
    async fn superseded_load_is_discarded() {
        let api = FakePatientApi::with_patients(vec![patient("a", false), patient("b", false)]);
        let gate = api.hold_patient("a");
        let data = PatientData::new(api);

        let stale = data.open("a").expect("load a");
        let fresh = data.open("b").expect("load b");
        fresh.await.expect("join b");
        stale.await.expect("join a");
        gate.notify_one();

        let state = data.snapshot();
        assert!(!state.loading);
        assert_eq!(state.patient.map(|p| p.id), Some("b".to_string()));
    }

    #[tokio::test]
    async fn update_merges_partial_response_and_refreshes() {
        let api = FakePatientApi::with_patients(vec![
            patient("a", false),
            patient("b", false),
            patient("c", false),
        ]);
        api.partial_update_responses(true);
        let data = PatientData::new(api);
        data.open("b").expect("load").await.expect("join");
        let before = data.snapshot().patient.expect("patient");

        data.update_contacted(true).await.expect("join");

        let state = data.snapshot();
        let after = state.patient.expect("patient");
        assert!(after.contacted);
        assert_eq!(after.first_name, before.first_name);
        assert_eq!(after.updated, before.updated);
        assert_eq!(ids(&state.uncontacted_patients), vec!["a", "c"]);
        assert_eq!(state.stats.contacted_patients_count, 1);
        assert_eq!(state.stats.remaining_patients_count, 2);
        assert_eq!(data.api().list_fetches(), 2);
        assert_eq!(data.api().stats_fetches(), 2);
        assert_eq!(data.api().patient_fetches(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_merged_patient() {
        let api = FakePatientApi::with_patients(vec![patient("a", false), patient("b", false)]);
        api.partial_update_responses(true);
        let data = PatientData::new(api);
        data.open("b").expect("load").await.expect("join");

        data.api().fail_loads(true);
        data.update_contacted(true).await.expect("join");

        let state = data.snapshot();
        assert_eq!(state.patient.map(|p| p.contacted), Some(true));
        assert_eq!(ids(&state.uncontacted_patients), vec!["a", "b"]);
        assert_eq!(state.stats.contacted_patients_count, 0);
        assert_eq!(data.api().updates(), 1);
        assert_eq!(data.api().list_fetches(), 2);
    }

    #[tokio::test]
    async fn failed_patient_fetch_keeps_the_previous_record() {
        let data = PatientData::new(FakePatientApi::with_patients(vec![
            patient("a", false),
            patient("b", false),
        ]));
        data.open("a").expect("load").await.expect("join");

        data.api().fail_loads(true);
        data.open("b").expect("load").await.expect("join");
        assert_eq!(data.snapshot().patient.map(|p| p.id), Some("a".to_string()));

        data.api().fail_loads(false);
        data.reload().expect("reload").await.expect("join");
        assert_eq!(data.snapshot().patient.map(|p| p.id), Some("b".to_string()));
    }

    #[tokio::test]
    async fn failed_update_changes_nothing() {
        let api = FakePatientApi::with_patients(vec![patient("a", false)]);
        let data = PatientData::new(api);
        data.open("a").expect("load").await.expect("join");
        let before = data.snapshot();

        data.api().fail_updates(true);
        data.update_contacted(true).await.expect("join");

        assert_eq!(data.snapshot(), before);
    }

    #[test]
    fn merge_into_empty_state_needs_a_complete_record() {
        let mut state = PatientDataState::default();
        let partial = PatientPatch {
            contacted: Some(true),
            ..Default::default()
        };
        assert!(!merge_patch(&mut state, "a", partial));
        assert_eq!(state.patient, None);

        let full = PatientPatch::from(patient("a", true));
        assert!(merge_patch(&mut state, "a", full));
        assert_eq!(state.patient.map(|p| p.contacted), Some(true));
    }
}
