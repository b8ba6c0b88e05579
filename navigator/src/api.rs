use async_trait::async_trait;
use contact_protocol::Patient;
use contact_protocol::PatientPatch;
use contact_protocol::PatientStats;

/// Backend operations the patient page depends on.
///
/// Implementations:
/// - `PatientClient` (contact-client) - HTTP against the REST service
/// - [`FakePatientApi`](crate::fake::FakePatientApi) (tests) - in-memory
#[async_trait]
pub trait PatientApi: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// `Ok(None)` when no patient has this id.
    async fn fetch_patient(&self, patient_id: &str) -> Result<Option<Patient>, Self::Error>;

    async fn fetch_uncontacted_patients(&self) -> Result<Vec<Patient>, Self::Error>;

    async fn fetch_patient_stats(&self) -> Result<PatientStats, Self::Error>;

    /// Set the contacted flag; the response may carry only the changed fields.
    async fn update_contacted_patient(
        &self,
        patient_id: &str,
        contacted: bool,
    ) -> Result<PatientPatch, Self::Error>;
}
