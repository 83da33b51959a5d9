pub mod metadata;
pub mod models;
pub mod perfdata;
pub mod queries;
pub mod schema;
pub mod track;

use rusqlite::{Connection, OpenFlags, params};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::perfdata::CodecError;
use schema::SchemaVersion;

/// File name of the music database inside a library directory.
pub const MUSIC_DB: &str = "m.db";
/// File name of the performance database inside a library directory.
pub const PERFORMANCE_DB: &str = "p.db";

pub(crate) const MUSIC_SCHEMA: &str = "main";
pub(crate) const PERFORMANCE_SCHEMA: &str = "perfdata";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Malformed data in column {column}: {source}")]
    MalformedData {
        column: &'static str,
        source: CodecError,
    },
    #[error("Database inconsistency for track {track_id}: {message}")]
    DatabaseInconsistency { track_id: i64, message: String },
    #[error("Track {track_id} does not exist")]
    TrackDeleted { track_id: i64 },
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error(
        "Data supplied for column {column} is not invariant under encoding and \
         subsequent decoding. This is a bug in enginelib."
    )]
    InvariantViolation { column: &'static str },
    #[error("Unsupported schema version {0}")]
    UnsupportedVersion(String),
    #[error("Column Track.{column} does not exist in schema version {version}")]
    UnsupportedColumn {
        column: &'static str,
        version: SchemaVersion,
    },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("A database already exists at {0}")]
    AlreadyExists(PathBuf),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// An open Engine Library: the music database with the performance
/// database attached. The schema version is resolved and verified once at
/// open time and never re-read.
pub struct Database {
    pub conn: Connection,
    version: SchemaVersion,
    uuid: String,
}

fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

fn attach(conn: &Connection, path: &str) -> Result<()> {
    conn.execute(
        &format!("ATTACH DATABASE ?1 AS {PERFORMANCE_SCHEMA}"),
        params![path],
    )?;
    Ok(())
}

/// An in-memory music database with an in-memory performance database
/// attached, both empty.
pub(crate) fn attach_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    attach(&conn, ":memory:")?;
    Ok(conn)
}

fn read_information(conn: &Connection, schema: &str) -> Result<(SchemaVersion, String)> {
    let mut stmt = conn.prepare(&format!(
        "SELECT schemaVersionMajor, schemaVersionMinor, schemaVersionPatch, uuid
         FROM {schema}.Information"
    ))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let [(major, minor, patch, uuid)] = rows.as_slice() else {
        return Err(DbError::SchemaMismatch(format!(
            "{schema}.Information has {} rows, expected 1",
            rows.len()
        )));
    };
    let version = SchemaVersion::from_triple(*major, *minor, *patch)
        .ok_or_else(|| DbError::UnsupportedVersion(format!("{major}.{minor}.{patch}")))?;
    Ok((version, uuid.clone().unwrap_or_default()))
}

impl Database {
    /// Open an existing library directory, resolve its schema version and
    /// verify both databases against it.
    pub fn open(dir: &Path) -> Result<Self> {
        let music_path = dir.join(MUSIC_DB);
        let performance_path = dir.join(PERFORMANCE_DB);
        let conn = Connection::open_with_flags(
            &music_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        if !performance_path.exists() {
            return Err(DbError::SchemaMismatch(format!(
                "{} is missing",
                performance_path.display()
            )));
        }
        configure(&conn)?;
        attach(&conn, &performance_path.to_string_lossy())?;
        Self::from_connection(conn)
    }

    /// Create a new library directory at `version`. Refuses to touch an
    /// existing music database.
    pub fn create(dir: &Path, version: SchemaVersion) -> Result<Self> {
        let music_path = dir.join(MUSIC_DB);
        if music_path.exists() {
            return Err(DbError::AlreadyExists(music_path));
        }
        std::fs::create_dir_all(dir).ok();

        let conn = Connection::open(&music_path)?;
        configure(&conn)?;
        attach(&conn, &dir.join(PERFORMANCE_DB).to_string_lossy())?;
        let db = Self::create_schema(conn, version)?;
        log::info!("Created {} library at {}", version, dir.display());
        Ok(db)
    }

    /// A fresh in-memory library at `version`.
    pub fn open_in_memory(version: SchemaVersion) -> Result<Self> {
        Self::create_schema(attach_in_memory()?, version)
    }

    fn create_schema(conn: Connection, version: SchemaVersion) -> Result<Self> {
        let uuid = uuid::Uuid::new_v4().to_string();
        version.create(&conn, &uuid)?;
        Ok(Self {
            conn,
            version,
            uuid,
        })
    }

    /// Resolve and verify the version of an already-attached connection.
    fn from_connection(conn: Connection) -> Result<Self> {
        let (version, uuid) = read_information(&conn, MUSIC_SCHEMA)?;
        let (performance_version, _) = read_information(&conn, PERFORMANCE_SCHEMA)?;
        if performance_version != version {
            return Err(DbError::SchemaMismatch(format!(
                "music database is {version} but performance database is {performance_version}"
            )));
        }
        log::debug!("Resolved schema {} ({})", version, version.name());

        version.verify(&conn)?;
        log::info!("Opened library {uuid} with schema {version}");
        Ok(Self {
            conn,
            version,
            uuid,
        })
    }

    /// The schema version fixed at open time.
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Run `f` in a transaction that commits only if `f` succeeds. Inside an
    /// already open transaction `f` joins it instead.
    pub(crate) fn atomically<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        if !self.conn.is_autocommit() {
            return f();
        }
        let tx = self.conn.unchecked_transaction()?;
        let value = f()?;
        tx.commit()?;
        Ok(value)
    }

    /// Re-run the structural verification for the open version.
    pub fn verify(&self) -> Result<()> {
        self.version.verify(&self.conn)
    }
}
