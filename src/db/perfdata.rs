//! Reading and writing `PerformanceData` blobs and `Track` scalar cells.

use rusqlite::types::{FromSql, ToSql};
use rusqlite::{OptionalExtension, params};

use super::models::{PerformanceColumn, PerformanceFlags, TrackColumn};
use super::{Database, DbError, Result};
use crate::perfdata::{
    BeatData, BlobCodec, HighResWaveformData, LoopsData, OverviewWaveformData, QuickCuesData,
    TrackData,
};

fn more_than_one_row(track_id: i64) -> DbError {
    DbError::DatabaseInconsistency {
        track_id,
        message: "More than one PerformanceData entry for the same track".to_string(),
    }
}

impl Database {
    /// Number of `PerformanceData` rows for `track_id`; more than one is an
    /// inconsistency.
    fn performance_row_exists(&self, track_id: i64) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM PerformanceData WHERE id = ?1",
            params![track_id],
            |row| row.get(0),
        )?;
        match count {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(more_than_one_row(track_id)),
        }
    }

    /// Fetch and decode one blob column, or the codec default when the track
    /// has no performance data yet.
    pub fn get_blob_field<T: BlobCodec>(
        &self,
        track_id: i64,
        column: PerformanceColumn,
    ) -> Result<T> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM PerformanceData WHERE id = ?1",
            column.name()
        ))?;
        let blobs = stmt
            .query_map(params![track_id], |row| row.get::<_, Option<Vec<u8>>>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        match blobs.as_slice() {
            [] => Ok(T::default_value()),
            [blob] => T::decode(blob.as_deref().unwrap_or_default()).map_err(|source| {
                DbError::MalformedData {
                    column: column.name(),
                    source,
                }
            }),
            _ => Err(more_than_one_row(track_id)),
        }
    }

    /// Encode and store one blob column.
    ///
    /// The encoding is decoded again and compared with `value` before
    /// anything is written. The first write for a track inserts a row with
    /// every other blob at its codec default.
    pub fn set_blob_field<T: BlobCodec>(
        &self,
        track_id: i64,
        column: PerformanceColumn,
        value: &T,
    ) -> Result<()> {
        let encoded = value.encode();
        match T::decode(&encoded) {
            Ok(decoded) if decoded == *value => {}
            _ => {
                log::error!(
                    "{} for track {track_id} does not survive an encode/decode round trip",
                    T::KIND
                );
                return Err(DbError::InvariantViolation {
                    column: column.name(),
                });
            }
        }

        self.atomically(|| {
            if !self.performance_row_exists(track_id)? {
                self.insert_performance_row(track_id)?;
            }
            self.conn.execute(
                &format!(
                    "UPDATE PerformanceData SET {} = ?1, isAnalyzed = 1 WHERE id = ?2",
                    column.name()
                ),
                params![encoded, track_id],
            )?;
            Ok(())
        })
    }

    fn insert_performance_row(&self, track_id: i64) -> Result<()> {
        log::debug!("Creating PerformanceData row for track {track_id}");
        self.conn.execute(
            "INSERT INTO PerformanceData (
                id, isAnalyzed, isRendered, trackData, highResolutionWaveFormData,
                overviewWaveFormData, beatData, quickCues, loops, hasSeratoValues
            ) VALUES (?1, 1, 0, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
            params![
                track_id,
                TrackData::default_value().encode(),
                HighResWaveformData::default_value().encode(),
                OverviewWaveformData::default_value().encode(),
                BeatData::default_value().encode(),
                QuickCuesData::default_value().encode(),
                LoopsData::default_value().encode(),
            ],
        )?;

        if self.version().has_rekordbox_flag() {
            self.conn.execute(
                "UPDATE PerformanceData SET hasRekordboxValues = 0 WHERE id = ?1",
                params![track_id],
            )?;
        }
        if self.version().has_traktor_flag() {
            self.conn.execute(
                "UPDATE PerformanceData SET hasTraktorValues = 0 WHERE id = ?1",
                params![track_id],
            )?;
        }
        Ok(())
    }

    /// The flag columns of the track's performance row, if it has one.
    pub fn performance_flags(&self, track_id: i64) -> Result<Option<PerformanceFlags>> {
        if !self.performance_row_exists(track_id)? {
            return Ok(None);
        }
        let rekordbox = if self.version().has_rekordbox_flag() {
            "hasRekordboxValues"
        } else {
            "NULL"
        };
        let traktor = if self.version().has_traktor_flag() {
            "hasTraktorValues"
        } else {
            "NULL"
        };
        let flags = self
            .conn
            .query_row(
                &format!(
                    "SELECT isAnalyzed, isRendered, hasSeratoValues, {rekordbox}, {traktor}
                     FROM PerformanceData WHERE id = ?1"
                ),
                params![track_id],
                |row| {
                    Ok(PerformanceFlags {
                        is_analyzed: row.get::<_, Option<f64>>(0)?.unwrap_or(0.0) != 0.0,
                        is_rendered: row.get::<_, Option<f64>>(1)?.unwrap_or(0.0) != 0.0,
                        has_serato_values: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0) != 0.0,
                        has_rekordbox_values: row.get::<_, Option<f64>>(3)?.map(|v| v != 0.0),
                        has_traktor_values: row.get::<_, Option<f64>>(4)?.map(|v| v != 0.0),
                    })
                },
            )
            .optional()?;
        Ok(flags)
    }

    fn check_track_column(&self, column: TrackColumn) -> Result<()> {
        if column.since() <= self.version() {
            Ok(())
        } else {
            Err(DbError::UnsupportedColumn {
                column: column.name(),
                version: self.version(),
            })
        }
    }

    /// Read one cell of the `Track` row. A missing row means the track was
    /// deleted.
    pub fn get_scalar_field<T: FromSql>(&self, track_id: i64, column: TrackColumn) -> Result<T> {
        self.check_track_column(column)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM Track WHERE id = ?1", column.name()))?;
        let mut values = stmt
            .query_map(params![track_id], |row| row.get::<_, T>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        match values.len() {
            0 => Err(DbError::TrackDeleted { track_id }),
            1 => Ok(values.remove(0)),
            _ => Err(DbError::DatabaseInconsistency {
                track_id,
                message: "More than one track with the same ID".to_string(),
            }),
        }
    }

    /// Write one cell of the `Track` row.
    pub fn set_scalar_field<T: ToSql>(
        &self,
        track_id: i64,
        column: TrackColumn,
        value: T,
    ) -> Result<()> {
        self.check_track_column(column)?;
        // Only a single-row update is kept; the transaction rolls back otherwise.
        self.atomically(|| {
            let changed = self.conn.execute(
                &format!("UPDATE Track SET {} = ?1 WHERE id = ?2", column.name()),
                params![value, track_id],
            )?;
            match changed {
                0 => Err(DbError::TrackDeleted { track_id }),
                1 => Ok(()),
                _ => Err(DbError::DatabaseInconsistency {
                    track_id,
                    message: "More than one track with the same ID".to_string(),
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::SchemaVersion;
    use crate::db::test_support::{drop_constraints, insert_track};
    use crate::perfdata::{HotCue, PadColor, WaveformEntry, WaveformPoint};

    fn waveform() -> HighResWaveformData {
        let point = |v| WaveformPoint { value: v, opacity: 255 };
        HighResWaveformData {
            samples_per_entry: 420.0,
            waveform: (0..50u8)
                .map(|i| WaveformEntry { low: point(i), mid: point(i / 2), high: point(255 - i) })
                .collect(),
        }
    }

    fn blob(db: &Database, id: i64, column: &str) -> Vec<u8> {
        db.conn
            .query_row(
                &format!("SELECT {column} FROM PerformanceData WHERE id = ?1"),
                params![id],
                |r| r.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_first_write_creates_single_row() {
        let db = Database::open_in_memory(SchemaVersion::V1_18_0).unwrap();
        insert_track(&db, 7);
        let w = waveform();

        db.set_blob_field(7, PerformanceColumn::HighResolutionWaveForm, &w).unwrap();

        let rows: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM PerformanceData WHERE id = 7", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
        let read: HighResWaveformData =
            db.get_blob_field(7, PerformanceColumn::HighResolutionWaveForm).unwrap();
        assert_eq!(read, w);
        let overview: OverviewWaveformData =
            db.get_blob_field(7, PerformanceColumn::OverviewWaveForm).unwrap();
        assert_eq!(overview, OverviewWaveformData::default());

        let flags = db.performance_flags(7).unwrap().unwrap();
        assert!(flags.is_analyzed);
        assert!(!flags.is_rendered);
        assert!(!flags.has_serato_values);
        assert_eq!(flags.has_rekordbox_values, Some(false));
        assert_eq!(flags.has_traktor_values, Some(false));
    }

    #[test]
    fn test_first_write_defaults_other_columns() {
        let db = Database::open_in_memory(SchemaVersion::V1_11_1).unwrap();
        db.set_blob_field(3, PerformanceColumn::Loops, &LoopsData::default()).unwrap();

        assert_eq!(blob(&db, 3, "trackData"), TrackData::default().encode());
        assert_eq!(blob(&db, 3, "beatData"), BeatData::default().encode());
        assert_eq!(blob(&db, 3, "quickCues"), QuickCuesData::default().encode());
        assert_eq!(
            blob(&db, 3, "highResolutionWaveFormData"),
            HighResWaveformData::default().encode()
        );
    }

    #[test]
    fn test_compatibility_flag_absent_before_1_7_1() {
        let db = Database::open_in_memory(SchemaVersion::V1_6_0).unwrap();
        db.set_blob_field(1, PerformanceColumn::TrackData, &TrackData::default()).unwrap();
        let flags = db.performance_flags(1).unwrap().unwrap();
        assert_eq!(flags.has_rekordbox_values, None);
        assert_eq!(flags.has_traktor_values, None);
        assert!(flags.is_analyzed);
    }

    #[test]
    fn test_update_touches_only_target_column() {
        let db = Database::open_in_memory(SchemaVersion::V1_18_0).unwrap();
        db.set_blob_field(4, PerformanceColumn::HighResolutionWaveForm, &waveform()).unwrap();
        db.conn
            .execute("UPDATE PerformanceData SET isAnalyzed = 0, isRendered = 1 WHERE id = 4", [])
            .unwrap();

        let mut cues = QuickCuesData::default();
        cues.hot_cues[2] = Some(HotCue {
            label: "Vocal".to_string(),
            sample_offset: 99.0,
            color: PadColor::new(1, 2, 3),
        });
        db.set_blob_field(4, PerformanceColumn::QuickCues, &cues).unwrap();

        let read: QuickCuesData = db.get_blob_field(4, PerformanceColumn::QuickCues).unwrap();
        assert_eq!(read, cues);
        let still: HighResWaveformData =
            db.get_blob_field(4, PerformanceColumn::HighResolutionWaveForm).unwrap();
        assert_eq!(still, waveform());
        let flags = db.performance_flags(4).unwrap().unwrap();
        assert!(flags.is_analyzed);
        assert!(flags.is_rendered);
    }

    #[test]
    fn test_read_without_row_is_default() {
        let db = Database::open_in_memory(SchemaVersion::V1_9_1).unwrap();
        let beats: BeatData = db.get_blob_field(42, PerformanceColumn::BeatData).unwrap();
        assert_eq!(beats, BeatData::default());
        assert!(db.performance_flags(42).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_rows_are_inconsistent() {
        let db = Database::open_in_memory(SchemaVersion::V1_18_0).unwrap();
        db.set_blob_field(9, PerformanceColumn::TrackData, &TrackData::default()).unwrap();
        drop_constraints(&db, "perfdata", "PerformanceData");
        db.conn
            .execute("INSERT INTO PerformanceData SELECT * FROM PerformanceData WHERE id = 9", [])
            .unwrap();

        let read = db.get_blob_field::<TrackData>(9, PerformanceColumn::TrackData);
        assert!(matches!(read, Err(DbError::DatabaseInconsistency { track_id: 9, .. })));
        let write = db.set_blob_field(9, PerformanceColumn::TrackData, &TrackData::default());
        assert!(matches!(write, Err(DbError::DatabaseInconsistency { track_id: 9, .. })));
        assert!(matches!(
            db.performance_flags(9),
            Err(DbError::DatabaseInconsistency { track_id: 9, .. })
        ));
    }

    #[test]
    fn test_round_trip_failure_writes_nothing() {
        let db = Database::open_in_memory(SchemaVersion::V1_18_0).unwrap();
        let mut cues = QuickCuesData::default();
        cues.hot_cues[0] = Some(HotCue {
            label: "z".repeat(256),
            sample_offset: 10.0,
            color: PadColor::default(),
        });

        let err = db.set_blob_field(5, PerformanceColumn::QuickCues, &cues).unwrap_err();
        assert!(matches!(err, DbError::InvariantViolation { column: "quickCues" }));
        assert!(db.performance_flags(5).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_blob_is_malformed() {
        let db = Database::open_in_memory(SchemaVersion::V1_18_0).unwrap();
        db.set_blob_field(6, PerformanceColumn::BeatData, &BeatData::default()).unwrap();
        db.conn
            .execute("UPDATE PerformanceData SET beatData = X'0000001000' WHERE id = 6", [])
            .unwrap();

        let err = db.get_blob_field::<BeatData>(6, PerformanceColumn::BeatData).unwrap_err();
        assert!(matches!(err, DbError::MalformedData { column: "beatData", .. }));
    }

    #[test]
    fn test_null_blob_is_default() {
        let db = Database::open_in_memory(SchemaVersion::V1_18_0).unwrap();
        db.set_blob_field(8, PerformanceColumn::TrackData, &TrackData::default()).unwrap();
        db.conn
            .execute("UPDATE PerformanceData SET loops = NULL WHERE id = 8", [])
            .unwrap();
        let loops: LoopsData = db.get_blob_field(8, PerformanceColumn::Loops).unwrap();
        assert_eq!(loops, LoopsData::default());
    }

    #[test]
    fn test_scalar_round_trip() {
        let db = Database::open_in_memory(SchemaVersion::V1_18_0).unwrap();
        insert_track(&db, 2);
        db.set_scalar_field(2, TrackColumn::Year, Some(1999)).unwrap();
        let year: Option<i64> = db.get_scalar_field(2, TrackColumn::Year).unwrap();
        assert_eq!(year, Some(1999));
        let path: String = db.get_scalar_field(2, TrackColumn::Path).unwrap();
        assert_eq!(path, "../Music/track2.mp3");
    }

    #[test]
    fn test_scalar_on_missing_track_is_deleted() {
        let db = Database::open_in_memory(SchemaVersion::V1_18_0).unwrap();
        let read = db.get_scalar_field::<Option<i64>>(11, TrackColumn::Bitrate);
        assert!(matches!(read, Err(DbError::TrackDeleted { track_id: 11 })));
        let write = db.set_scalar_field(11, TrackColumn::Bitrate, 320);
        assert!(matches!(write, Err(DbError::TrackDeleted { track_id: 11 })));
    }

    #[test]
    fn test_scalar_duplicate_track_is_inconsistent() {
        let db = Database::open_in_memory(SchemaVersion::V1_18_0).unwrap();
        insert_track(&db, 12);
        drop_constraints(&db, "main", "Track");
        insert_track(&db, 12);

        let read = db.get_scalar_field::<Option<i64>>(12, TrackColumn::Bitrate);
        assert!(matches!(read, Err(DbError::DatabaseInconsistency { track_id: 12, .. })));
        let write = db.set_scalar_field(12, TrackColumn::Bitrate, 320);
        assert!(matches!(write, Err(DbError::DatabaseInconsistency { track_id: 12, .. })));

        let written: i64 = db
            .conn
            .query_row(
                "SELECT COUNT(*) FROM Track WHERE id = 12 AND bitrate IS NOT NULL",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(written, 0);
    }

    #[test]
    fn test_column_missing_from_version_is_rejected() {
        let db = Database::open_in_memory(SchemaVersion::V1_6_0).unwrap();
        insert_track(&db, 1);
        let err = db.get_scalar_field::<Option<i64>>(1, TrackColumn::PdbImportKey).unwrap_err();
        assert!(matches!(err, DbError::UnsupportedColumn { column: "pdbImportKey", .. }));
    }
}
