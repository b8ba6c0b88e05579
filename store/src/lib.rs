//! Patient record store.
//!
//! A single SQLite database holding patients and the gender lookup table.
//! The store answers contacted-flag filtered listings, counts, point lookups
//! and partial updates; it knows nothing about HTTP.

pub mod error;
mod patients;
mod seed;

pub use error::Result;
pub use error::StoreError;
pub use patients::NewPatient;
pub use patients::PatientStore;
pub use seed::DEFAULT_DEMO_PATIENTS;
