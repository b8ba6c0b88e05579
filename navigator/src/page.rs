//! Patient navigation page.
//!
//! Keeps a cursor into the uncontacted list held by [`PatientData`] and turns
//! prev/next/toggle into identifiers to open. The list is refetched after
//! every toggle, so a patient marked contacted drops out of it and the entry
//! that followed slides into its slot; `contacted_for_next` remembers that so
//! the next step lands on the right patient.

use contact_protocol::Patient;
use contact_protocol::PatientStats;
use tokio::task::JoinHandle;

use crate::api::PatientApi;
use crate::hook::PatientData;
use crate::hook::PatientDataState;

/// What the page shows right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageView {
    Loading,
    NotFound { patient_id: String },
    Ready(PatientPageModel),
}

/// Render model for a loaded patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientPageModel {
    pub patient: Patient,
    /// One-based position in the uncontacted list.
    pub position: usize,
    pub stats: PatientStats,
    pub uncontacted_patients: Vec<Patient>,
    pub previous_disabled: bool,
    pub next_disabled: bool,
}

impl PatientPageModel {
    pub fn toggle_label(&self) -> &'static str {
        if self.patient.contacted {
            "Mark not contacted"
        } else {
            "Mark contacted"
        }
    }
}

pub struct PatientPage<A> {
    data: PatientData<A>,
    patient_id: String,
    current_index: usize,
    contacted_for_next: bool,
    pending: Vec<JoinHandle<()>>,
}

impl<A: PatientApi> PatientPage<A> {
    pub fn new(data: PatientData<A>) -> Self {
        Self {
            data,
            patient_id: String::new(),
            current_index: 0,
            contacted_for_next: false,
            pending: Vec::new(),
        }
    }

    pub fn data(&self) -> &PatientData<A> {
        &self.data
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn contacted_for_next(&self) -> bool {
        self.contacted_for_next
    }

    /// Show `patient_id`. Returns whether a load was started; opening the
    /// patient the hook already holds (or an empty id) leaves the page as is.
    pub fn open(&mut self, patient_id: &str) -> bool {
        let Some(handle) = self.data.open(patient_id) else {
            return false;
        };
        self.patient_id = patient_id.to_string();
        self.contacted_for_next = false;
        self.pending.push(handle);
        true
    }

    pub fn reload(&mut self) {
        if let Some(handle) = self.data.reload() {
            self.pending.push(handle);
        }
    }

    /// Recompute the cursor from the latest list. An id missing from the
    /// list leaves the cursor where it was.
    pub fn sync_index(&mut self) {
        let state = self.data.snapshot();
        self.sync_index_with(&state.uncontacted_patients);
    }

    fn sync_index_with(&mut self, uncontacted: &[Patient]) {
        if let Some(index) = uncontacted.iter().position(|p| p.id == self.patient_id) {
            self.current_index = index;
        }
    }

    /// Open the entry before the cursor. Returns the opened id; nothing
    /// moves while a load is in flight.
    pub fn go_to_previous(&mut self) -> Option<String> {
        let state = self.data.snapshot();
        if state.loading {
            return None;
        }
        self.sync_index_with(&state.uncontacted_patients);
        if self.current_index == 0 {
            return None;
        }
        let target = state.uncontacted_patients.get(self.current_index - 1)?;
        self.open(&target.id).then(|| target.id.clone())
    }

    /// Open the entry after the cursor, or the entry now sitting at the
    /// cursor when the patient just left was marked contacted.
    pub fn go_to_next(&mut self) -> Option<String> {
        let state = self.data.snapshot();
        if state.loading {
            return None;
        }
        self.sync_index_with(&state.uncontacted_patients);
        let len = state.uncontacted_patients.len();
        if len == 0 || self.current_index >= len - 1 {
            return None;
        }
        let index = if self.contacted_for_next {
            self.current_index
        } else {
            self.current_index + 1
        };
        let target = state.uncontacted_patients.get(index)?;
        self.open(&target.id).then(|| target.id.clone())
    }

    /// Flip the shown patient's contacted flag. The mutation runs in the
    /// background; the new value is returned immediately. While a load is in
    /// flight the held record belongs to the previous patient, so this does
    /// nothing.
    pub fn toggle_contacted(&mut self) -> Option<bool> {
        let state = self.data.snapshot();
        if state.loading {
            return None;
        }
        let patient = state.patient?;
        let contacted = !patient.contacted;
        self.contacted_for_next = contacted;
        self.pending.push(self.data.update_contacted(contacted));
        Some(contacted)
    }

    /// Wait for every load and mutation this page started, then re-derive
    /// the cursor.
    pub async fn settle(&mut self) {
        for handle in self.pending.drain(..) {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "Patient task failed");
            }
        }
        self.sync_index();
    }

    pub fn view(&mut self) -> PageView {
        let state = self.data.snapshot();
        self.sync_index_with(&state.uncontacted_patients);
        render(state, &self.patient_id, self.current_index)
    }
}

fn render(state: PatientDataState, patient_id: &str, current_index: usize) -> PageView {
    if state.loading {
        return PageView::Loading;
    }
    let Some(patient) = state.patient else {
        return PageView::NotFound {
            patient_id: patient_id.to_string(),
        };
    };
    let len = state.uncontacted_patients.len();
    PageView::Ready(PatientPageModel {
        patient,
        position: current_index + 1,
        stats: state.stats,
        previous_disabled: current_index == 0,
        next_disabled: len == 0 || current_index >= len - 1,
        uncontacted_patients: state.uncontacted_patients,
    })
}
