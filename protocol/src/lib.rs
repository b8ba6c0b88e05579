//! Wire types shared by the patient REST service and its clients.
//!
//! Everything here serializes in camelCase to match the JSON the
//! `/api/v1/patients` surface has always produced.

mod error;
mod patient;
mod stats;

pub use error::ApiErrorBody;
pub use error::ApiErrorDetail;
pub use patient::Gender;
pub use patient::IncompletePatch;
pub use patient::Patient;
pub use patient::PatientPatch;
pub use patient::UpdatePatient;
pub use stats::PatientStats;

/// Path prefix of the patient resource.
pub const PATIENTS_PATH: &str = "/api/v1/patients";

/// Path of the count endpoint, relative to [`PATIENTS_PATH`].
pub const COUNT_PATH: &str = "stats/count";

/// Base URL used by clients when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3333/api/v1/patients";
