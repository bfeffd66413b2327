//! EFRN Settlement - External payment rail boundary
//!
//! The orchestrator only sees the `SettlementConnector` trait. Real rails,
//! the random mock, and scripted test fixtures all plug in behind it.

pub mod error;
pub mod mock;
pub mod scripted;
pub mod types;

pub use error::ConnectorError;
pub use mock::MockConnector;
pub use scripted::{ScriptStep, ScriptedConnector};
pub use types::{SettlementConnector, SettlementRequest, SettlementResponse, SettlementStatus};
