//! HTTP client for the patient REST service.
//!
//! [`PatientClient`] implements [`contact_navigator::PatientApi`], so it can
//! back the navigation page directly.

mod client;
mod config;
pub mod error;

pub use client::PatientClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use error::ConfigError;
