use serde::Deserialize;
use serde::Serialize;

/// Aggregate patient counts.
///
/// The three numbers come from independent count queries and are never
/// reconciled against each other; under concurrent updates
/// `contacted + remaining` may differ from `total`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatientStats {
    pub total_patients_count: u64,
    pub contacted_patients_count: u64,
    pub remaining_patients_count: u64,
}
