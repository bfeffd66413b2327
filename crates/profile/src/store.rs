//! SQLite storage for employee profiles

use crate::error::ProfileError;
use crate::profile::{apply_delta, EmployeeProfile};
use chrono::{DateTime, Utc};
use efrn_core::{Clock, EmployeeId, SystemClock};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Raw column values of one profile row
type ProfileRow = (String, String, i64, String);

/// Single-writer profile store.
///
/// Every read and every read-modify-write runs under the connection mutex,
/// and adjustments run inside a SQLite transaction.
pub struct ProfileStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
    default_score: u8,
}

impl ProfileStore {
    /// Score given to a profile created on first reference
    pub const DEFAULT_TRUST_SCORE: u8 = 50;

    /// Open a store at the given database path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ProfileError> {
        Self::from_connection(Connection::open(path)?, Arc::new(SystemClock))
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, ProfileError> {
        Self::from_connection(Connection::open_in_memory()?, Arc::new(SystemClock))
    }

    /// Open a store at the given path that stamps activity with `clock`
    pub fn with_clock<P: AsRef<Path>>(path: P, clock: Arc<dyn Clock>) -> Result<Self, ProfileError> {
        Self::from_connection(Connection::open(path)?, clock)
    }

    /// In-memory store with an injected clock
    pub fn in_memory_with_clock(clock: Arc<dyn Clock>) -> Result<Self, ProfileError> {
        Self::from_connection(Connection::open_in_memory()?, clock)
    }

    fn from_connection(conn: Connection, clock: Arc<dyn Clock>) -> Result<Self, ProfileError> {
        let store = Self {
            conn: Mutex::new(conn),
            clock,
            default_score: Self::DEFAULT_TRUST_SCORE,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Override the starting score for newly created profiles
    pub fn with_default_score(mut self, score: u8) -> Self {
        self.default_score = apply_delta(score, 0);
        self
    }

    fn init_schema(&self) -> Result<(), ProfileError> {
        self.lock()?.execute(
            "CREATE TABLE IF NOT EXISTS employee_profiles (
                employee_id TEXT PRIMARY KEY,
                reputation_id TEXT NOT NULL,
                trust_score INTEGER NOT NULL CHECK (trust_score BETWEEN 0 AND 100),
                last_active TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, ProfileError> {
        self.conn.lock().map_err(|_| ProfileError::LockPoisoned)
    }

    /// Look up a profile without creating it
    pub fn get(&self, employee: &EmployeeId) -> Result<Option<EmployeeProfile>, ProfileError> {
        let conn = self.lock()?;
        let row = select_profile(&conn, employee)?;
        row.map(decode_profile).transpose()
    }

    /// Current score, or the default for an unknown employee
    pub fn trust_score(&self, employee: &EmployeeId) -> Result<u8, ProfileError> {
        Ok(self
            .get(employee)?
            .map(|p| p.trust_score)
            .unwrap_or(self.default_score))
    }

    /// Apply a bounded delta, creating the profile first if needed.
    ///
    /// The score is clamped to `[0, 100]` and `last_active` is refreshed even
    /// when the delta is zero.
    pub fn adjust(&self, employee: &EmployeeId, delta: i32) -> Result<EmployeeProfile, ProfileError> {
        let now = self.clock.now();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut profile = match select_profile(&tx, employee)? {
            Some(row) => decode_profile(row)?,
            None => EmployeeProfile::new(employee.clone(), self.default_score, now),
        };

        let before = profile.trust_score;
        profile.trust_score = apply_delta(before, delta);
        profile.last_active = now;

        tx.execute(
            "INSERT INTO employee_profiles (employee_id, reputation_id, trust_score, last_active)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(employee_id) DO UPDATE SET
                trust_score = excluded.trust_score,
                last_active = excluded.last_active",
            params![
                profile.employee.as_str(),
                profile.reputation_id,
                profile.trust_score,
                profile.last_active.to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        debug!(
            employee = %employee,
            delta,
            before,
            after = profile.trust_score,
            "Adjusted trust score"
        );

        Ok(profile)
    }

    /// All profiles ordered by employee id
    pub fn list_all(&self) -> Result<Vec<EmployeeProfile>, ProfileError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT employee_id, reputation_id, trust_score, last_active
             FROM employee_profiles ORDER BY employee_id",
        )?;

        let rows = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(decode_profile).collect()
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn select_profile(conn: &Connection, employee: &EmployeeId) -> Result<Option<ProfileRow>, ProfileError> {
    let row = conn
        .query_row(
            "SELECT employee_id, reputation_id, trust_score, last_active
             FROM employee_profiles WHERE employee_id = ?1",
            params![employee.as_str()],
            read_row,
        )
        .optional()?;
    Ok(row)
}

fn decode_profile(row: ProfileRow) -> Result<EmployeeProfile, ProfileError> {
    let (employee_id, reputation_id, score, last_active) = row;

    let employee =
        EmployeeId::new(&employee_id).map_err(|e| ProfileError::Corrupt(e.to_string()))?;
    let trust_score = u8::try_from(score)
        .ok()
        .filter(|s| *s <= crate::profile::MAX_TRUST_SCORE)
        .ok_or_else(|| ProfileError::Corrupt(format!("trust score {} out of range", score)))?;
    let last_active = DateTime::parse_from_rfc3339(&last_active)
        .map_err(|_| ProfileError::InvalidTimestamp {
            employee: employee_id.clone(),
            value: last_active.clone(),
        })?
        .with_timezone(&Utc);

    Ok(EmployeeProfile {
        employee,
        reputation_id,
        trust_score,
        last_active,
    })
}
