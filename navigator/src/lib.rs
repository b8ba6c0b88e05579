//! Operator-side patient navigation.
//!
//! Two layers:
//! - [`PatientData`] (the data hook) owns the fetched patient, the
//!   uncontacted list and the stats, and runs the contacted mutation.
//! - [`PatientPage`] derives a cursor into the uncontacted list and turns
//!   prev/next/toggle actions into patient ids to open.
//!
//! Both talk to the backend only through the [`PatientApi`] seam.

mod api;
#[cfg(any(test, feature = "test-utils"))]
pub mod fake;
mod hook;
mod page;

pub use api::PatientApi;
pub use hook::PatientData;
pub use hook::PatientDataState;
pub use page::PageView;
pub use page::PatientPage;
pub use page::PatientPageModel;
