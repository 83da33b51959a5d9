//! Supported on-disk schema versions and the per-version checks and DDL.
//!
//! The version set is closed: each variant names one revision, and every
//! capability dispatches on the variant through the layouts in [`tables`].
//! A revision that changed nothing structurally shares its predecessor's
//! layout.

pub(crate) mod tables;
mod verify;

use std::fmt;
use std::str::FromStr;

use rusqlite::{Connection, params};

use super::{DbError, MUSIC_SCHEMA, PERFORMANCE_SCHEMA, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SchemaVersion {
    V1_6_0,
    V1_7_1,
    V1_9_1,
    V1_11_1,
    V1_13_0,
    V1_13_1,
    V1_13_2,
    V1_15_0,
    V1_17_0,
    V1_18_0,
}

impl SchemaVersion {
    pub const ALL: [SchemaVersion; 10] = [
        Self::V1_6_0,
        Self::V1_7_1,
        Self::V1_9_1,
        Self::V1_11_1,
        Self::V1_13_0,
        Self::V1_13_1,
        Self::V1_13_2,
        Self::V1_15_0,
        Self::V1_17_0,
        Self::V1_18_0,
    ];

    pub const LATEST: SchemaVersion = Self::V1_18_0;

    /// `(major, minor, patch)` as stored in the `Information` table.
    pub fn triple(self) -> (i64, i64, i64) {
        match self {
            Self::V1_6_0 => (1, 6, 0),
            Self::V1_7_1 => (1, 7, 1),
            Self::V1_9_1 => (1, 9, 1),
            Self::V1_11_1 => (1, 11, 1),
            Self::V1_13_0 => (1, 13, 0),
            Self::V1_13_1 => (1, 13, 1),
            Self::V1_13_2 => (1, 13, 2),
            Self::V1_15_0 => (1, 15, 0),
            Self::V1_17_0 => (1, 17, 0),
            Self::V1_18_0 => (1, 18, 0),
        }
    }

    pub fn from_triple(major: i64, minor: i64, patch: i64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.triple() == (major, minor, patch))
    }

    /// The application or firmware release that introduced this version.
    /// Informational only.
    pub fn name(self) -> &'static str {
        match self {
            Self::V1_6_0 => "SC5000 Firmware 1.0.0",
            Self::V1_7_1 => "SC5000 Firmware 1.0.3",
            Self::V1_9_1 => "Engine Prime 1.1.1",
            Self::V1_11_1 => "SC5000 Firmware 1.2.0",
            Self::V1_13_0 => "Engine Prime 1.2.2",
            Self::V1_13_1 => "SC5000 Firmware 1.2.2",
            Self::V1_13_2 => "SC5000 Firmware 1.3.1",
            Self::V1_15_0 => "Engine Prime 1.3.1",
            Self::V1_17_0 => "SC5000 Firmware 1.4.0",
            Self::V1_18_0 => "Engine Prime 1.5.1 / SC5000 Firmware 1.5.1",
        }
    }

    /// `PerformanceData.hasRekordboxValues` exists.
    pub fn has_rekordbox_flag(self) -> bool {
        self >= Self::V1_7_1
    }

    /// `PerformanceData.hasTraktorValues` exists.
    pub fn has_traktor_flag(self) -> bool {
        self >= Self::V1_11_1
    }

    /// Lists live in the shared `List` table rather than per-kind tables.
    pub fn has_list_table(self) -> bool {
        self >= Self::V1_9_1
    }

    pub fn verify_track(self, conn: &Connection) -> Result<()> {
        verify::verify_table(conn, MUSIC_SCHEMA, &tables::track(self))
    }

    pub fn verify_list(self, conn: &Connection) -> Result<()> {
        verify::verify_tables(conn, MUSIC_SCHEMA, &tables::lists(self))
    }

    pub fn verify_performance_data(self, conn: &Connection) -> Result<()> {
        verify::verify_table(conn, PERFORMANCE_SCHEMA, &tables::performance_data(self))
    }

    pub fn verify_music_schema(self, conn: &Connection) -> Result<()> {
        verify::verify_table(conn, MUSIC_SCHEMA, &tables::information())?;
        self.verify_track(conn)?;
        verify::verify_tables(conn, MUSIC_SCHEMA, &tables::metadata())?;
        verify::verify_tables(conn, MUSIC_SCHEMA, &tables::auxiliary(self))?;
        self.verify_list(conn)
    }

    pub fn verify_performance_schema(self, conn: &Connection) -> Result<()> {
        verify::verify_table(conn, PERFORMANCE_SCHEMA, &tables::information())?;
        self.verify_performance_data(conn)
    }

    /// Structural check of both databases. Row contents are not inspected.
    pub fn verify(self, conn: &Connection) -> Result<()> {
        self.verify_music_schema(conn)?;
        self.verify_performance_schema(conn)
    }

    pub fn create_music_schema(self, conn: &Connection, uuid: &str) -> Result<()> {
        verify::create_tables(conn, MUSIC_SCHEMA, &tables::music(self))?;
        self.insert_information(conn, MUSIC_SCHEMA, uuid)
    }

    pub fn create_performance_schema(self, conn: &Connection, uuid: &str) -> Result<()> {
        verify::create_tables(conn, PERFORMANCE_SCHEMA, &tables::performance(self))?;
        self.insert_information(conn, PERFORMANCE_SCHEMA, uuid)
    }

    /// Create both databases at exactly this version in one transaction.
    /// The targets must be empty; existing tables make the DDL fail.
    pub fn create(self, conn: &Connection, uuid: &str) -> Result<()> {
        let tx = conn.unchecked_transaction()?;
        self.create_music_schema(&tx, uuid)?;
        self.create_performance_schema(&tx, uuid)?;
        tx.commit()?;
        log::debug!("Created schema {self} ({})", self.name());
        Ok(())
    }

    fn insert_information(self, conn: &Connection, schema: &str, uuid: &str) -> Result<()> {
        let (major, minor, patch) = self.triple();
        conn.execute(
            &format!(
                "INSERT INTO {schema}.Information (
                    uuid, schemaVersionMajor, schemaVersionMinor, schemaVersionPatch,
                    currentPlayedIndiciator, lastRekordBoxLibraryImportReadCounter
                ) VALUES (?1, ?2, ?3, ?4, 0, 0)"
            ),
            params![uuid, major, minor, patch],
        )?;
        Ok(())
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor, patch) = self.triple();
        write!(f, "{major}.{minor}.{patch}")
    }
}

impl FromStr for SchemaVersion {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<i64> = s
            .trim()
            .split('.')
            .map(|p| p.parse::<i64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| DbError::UnsupportedVersion(s.to_string()))?;
        match parts[..] {
            [major, minor, patch] => Self::from_triple(major, minor, patch)
                .ok_or_else(|| DbError::UnsupportedVersion(s.to_string())),
            _ => Err(DbError::UnsupportedVersion(s.to_string())),
        }
    }
}
