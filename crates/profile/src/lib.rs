//! EFRN Profile - Employee reputation records
//!
//! Each employee has one profile holding a trust score in `[0, 100]`.
//! Profiles are created on first reference and only change through
//! bounded-delta adjustment.

pub mod error;
pub mod profile;
pub mod store;

pub use error::ProfileError;
pub use profile::{apply_delta, EmployeeProfile, MAX_TRUST_SCORE, MIN_TRUST_SCORE};
pub use store::ProfileStore;
