//! Per-track key/value slots in `MetaData` (strings) and `MetaDataInteger`
//! (integers). A missing row means the slot is unset.

use chrono::{DateTime, NaiveTime, Utc};
use rusqlite::params;
use rusqlite::types::FromSql;

use super::models::{MetadataIntType, MetadataStrType};
use super::{Database, DbError, Result};
use crate::perfdata::CodecError;

impl Database {
    fn get_slot<T: FromSql>(&self, sql: &str, track_id: i64, type_id: i64) -> Result<Option<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut values = stmt
            .query_map(params![track_id, type_id], |row| row.get::<_, Option<T>>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        match values.len() {
            0 => Ok(None),
            1 => Ok(values.remove(0)),
            _ => Err(DbError::DatabaseInconsistency {
                track_id,
                message: format!("More than one metadata entry of type {type_id}"),
            }),
        }
    }

    pub fn get_metadata_str(&self, track_id: i64, ty: MetadataStrType) -> Result<Option<String>> {
        self.get_slot(
            "SELECT text FROM MetaData WHERE id = ?1 AND type = ?2",
            track_id,
            ty.id(),
        )
    }

    /// Upsert a string slot, or delete it when `value` is `None`.
    pub fn set_metadata_str(
        &self,
        track_id: i64,
        ty: MetadataStrType,
        value: Option<&str>,
    ) -> Result<()> {
        match value {
            Some(text) => {
                self.conn.execute(
                    "INSERT INTO MetaData (id, type, text) VALUES (?1, ?2, ?3)
                     ON CONFLICT(id, type) DO UPDATE SET text = excluded.text",
                    params![track_id, ty.id(), text],
                )?;
            }
            None => {
                self.conn.execute(
                    "DELETE FROM MetaData WHERE id = ?1 AND type = ?2",
                    params![track_id, ty.id()],
                )?;
            }
        }
        Ok(())
    }

    pub fn get_metadata_int(&self, track_id: i64, ty: MetadataIntType) -> Result<Option<i64>> {
        self.get_slot(
            "SELECT value FROM MetaDataInteger WHERE id = ?1 AND type = ?2",
            track_id,
            ty.id(),
        )
    }

    /// Upsert an integer slot, or delete it when `value` is `None`.
    pub fn set_metadata_int(
        &self,
        track_id: i64,
        ty: MetadataIntType,
        value: Option<i64>,
    ) -> Result<()> {
        match value {
            Some(v) => {
                self.conn.execute(
                    "INSERT INTO MetaDataInteger (id, type, value) VALUES (?1, ?2, ?3)
                     ON CONFLICT(id, type) DO UPDATE SET value = excluded.value",
                    params![track_id, ty.id(), v],
                )?;
            }
            None => {
                self.conn.execute(
                    "DELETE FROM MetaDataInteger WHERE id = ?1 AND type = ?2",
                    params![track_id, ty.id()],
                )?;
            }
        }
        Ok(())
    }

    /// Read a timestamp slot stored as seconds since the Unix epoch.
    pub fn get_metadata_time(
        &self,
        track_id: i64,
        ty: MetadataIntType,
    ) -> Result<Option<DateTime<Utc>>> {
        let Some(secs) = self.get_metadata_int(track_id, ty)? else {
            return Ok(None);
        };
        DateTime::from_timestamp(secs, 0)
            .map(Some)
            .ok_or_else(|| DbError::MalformedData {
                column: "MetaDataInteger.value",
                source: CodecError::invalid(
                    "timestamp",
                    format!("{} of track {track_id} is out of range: {secs}", ty.label()),
                ),
            })
    }

    /// Write a timestamp slot. Sub-second precision is dropped; the
    /// last-accessed slot is additionally truncated to midnight UTC.
    pub fn set_metadata_time(
        &self,
        track_id: i64,
        ty: MetadataIntType,
        value: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let value = value.map(|ts| match ty {
            MetadataIntType::LastAccessedTs => truncate_to_date(ts),
            _ => ts,
        });
        self.set_metadata_int(track_id, ty, value.map(|ts| ts.timestamp()))
    }
}

/// Midnight UTC of the same day.
pub fn truncate_to_date(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::SchemaVersion;
    use crate::db::test_support::insert_track;
    use chrono::TimeZone;

    fn db_with_track(id: i64) -> Database {
        let db = Database::open_in_memory(SchemaVersion::V1_18_0).unwrap();
        insert_track(&db, id);
        db
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_unset_slot_is_none() {
        let db = db_with_track(1);
        assert_eq!(db.get_metadata_str(1, MetadataStrType::Title).unwrap(), None);
        assert_eq!(db.get_metadata_int(1, MetadataIntType::Hash).unwrap(), None);
    }

    #[test]
    fn test_set_upserts_and_clear_deletes() {
        let db = db_with_track(1);
        db.set_metadata_str(1, MetadataStrType::Artist, Some("Moodymann")).unwrap();
        db.set_metadata_str(1, MetadataStrType::Artist, Some("KDJ")).unwrap();
        assert_eq!(
            db.get_metadata_str(1, MetadataStrType::Artist).unwrap().as_deref(),
            Some("KDJ")
        );
        assert_eq!(count(&db, "MetaData"), 1);

        db.set_metadata_str(1, MetadataStrType::Artist, None).unwrap();
        assert_eq!(db.get_metadata_str(1, MetadataStrType::Artist).unwrap(), None);
        assert_eq!(count(&db, "MetaData"), 0);

        // clearing an absent slot is a no-op
        db.set_metadata_str(1, MetadataStrType::Artist, None).unwrap();
    }

    #[test]
    fn test_empty_string_is_a_value() {
        let db = db_with_track(1);
        db.set_metadata_str(1, MetadataStrType::Comment, Some("")).unwrap();
        assert_eq!(
            db.get_metadata_str(1, MetadataStrType::Comment).unwrap().as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_int_slots_are_independent() {
        let db = db_with_track(3);
        db.set_metadata_int(3, MetadataIntType::Hash, Some(0)).unwrap();
        db.set_metadata_int(3, MetadataIntType::MusicalKey, Some(4)).unwrap();
        assert_eq!(db.get_metadata_int(3, MetadataIntType::Hash).unwrap(), Some(0));
        assert_eq!(db.get_metadata_int(3, MetadataIntType::MusicalKey).unwrap(), Some(4));

        db.set_metadata_int(3, MetadataIntType::Hash, None).unwrap();
        assert_eq!(db.get_metadata_int(3, MetadataIntType::Hash).unwrap(), None);
        assert_eq!(count(&db, "MetaDataInteger"), 1);
    }

    #[test]
    fn test_last_accessed_keeps_date_only() {
        let db = db_with_track(5);
        let ts = Utc.with_ymd_and_hms(2020, 2, 29, 17, 45, 12).unwrap();
        db.set_metadata_time(5, MetadataIntType::LastAccessedTs, Some(ts)).unwrap();

        let read = db.get_metadata_time(5, MetadataIntType::LastAccessedTs).unwrap().unwrap();
        assert_ne!(read, ts);
        assert_eq!(read.date_naive(), ts.date_naive());
        assert_eq!(read, Utc.with_ymd_and_hms(2020, 2, 29, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_other_timestamps_keep_time_of_day() {
        let db = db_with_track(5);
        let ts = Utc.with_ymd_and_hms(2021, 7, 1, 23, 59, 59).unwrap();
        db.set_metadata_time(5, MetadataIntType::LastPlayedTs, Some(ts)).unwrap();
        assert_eq!(
            db.get_metadata_time(5, MetadataIntType::LastPlayedTs).unwrap(),
            Some(ts)
        );
    }

    #[test]
    fn test_out_of_range_timestamp_is_malformed() {
        let db = db_with_track(5);
        db.set_metadata_int(5, MetadataIntType::LastModifiedTs, Some(i64::MAX)).unwrap();
        let err = db
            .get_metadata_time(5, MetadataIntType::LastModifiedTs)
            .unwrap_err();
        assert!(matches!(err, DbError::MalformedData { column: "MetaDataInteger.value", .. }));
        assert_eq!(db.get_metadata_time(5, MetadataIntType::LastPlayedTs).unwrap(), None);
    }

    #[test]
    fn test_slot_for_unknown_track_fails() {
        let db = db_with_track(1);
        let err = db
            .set_metadata_str(99, MetadataStrType::Title, Some("ghost"))
            .unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
    }
}
