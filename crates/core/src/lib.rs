//! EFRN Core - Domain types
//!
//! This crate contains the fundamental types shared by every EFRN crate:
//! - `Amount`: Non-negative decimal wrapper for transaction amounts
//! - `Currency`: Currency code with its minor-unit precision
//! - `EmployeeId`: Validated, non-empty employee identifier
//! - `Clock`: Injected time source (`SystemClock`, `FixedClock`)
//! - `ValidationError`: Request rejections raised before any pipeline stage runs

pub mod amount;
pub mod clock;
pub mod currency;
pub mod employee;
pub mod error;

pub use amount::Amount;
pub use clock::{Clock, FixedClock, SystemClock};
pub use currency::Currency;
pub use employee::EmployeeId;
pub use error::ValidationError;
