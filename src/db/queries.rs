use super::models::{Information, LibraryStats};
use super::{Database, MUSIC_SCHEMA, PERFORMANCE_SCHEMA, Result};

impl Database {
    /// Ids of all tracks in the music database, ascending.
    pub fn track_ids(&self) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare("SELECT id FROM Track ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Ids of tracks whose `path` matches exactly.
    pub fn track_ids_by_path(&self, path: &str) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM Track WHERE path = ?1 ORDER BY id")?;
        let ids = stmt
            .query_map([path], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    pub fn stats(&self) -> Result<LibraryStats> {
        let total_tracks: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM Track", [], |row| row.get(0))?;

        let (performance_rows, analyzed_tracks, rendered_tracks): (i64, i64, i64) =
            self.conn.query_row(
                &format!(
                    "SELECT COUNT(*),
                            COALESCE(SUM(isAnalyzed != 0), 0),
                            COALESCE(SUM(isRendered != 0), 0)
                     FROM {PERFORMANCE_SCHEMA}.PerformanceData"
                ),
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        Ok(LibraryStats {
            total_tracks,
            performance_rows,
            analyzed_tracks,
            rendered_tracks,
        })
    }

    /// The `Information` rows of the music and performance databases.
    pub fn information(&self) -> Result<(Information, Information)> {
        Ok((
            self.information_of(MUSIC_SCHEMA)?,
            self.information_of(PERFORMANCE_SCHEMA)?,
        ))
    }

    fn information_of(&self, schema: &str) -> Result<Information> {
        let info = self.conn.query_row(
            &format!(
                "SELECT uuid, schemaVersionMajor, schemaVersionMinor, schemaVersionPatch
                 FROM {schema}.Information"
            ),
            [],
            |row| {
                Ok(Information {
                    uuid: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    schema_version_major: row.get(1)?,
                    schema_version_minor: row.get(2)?,
                    schema_version_patch: row.get(3)?,
                })
            },
        )?;
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::db::schema::SchemaVersion;
    use crate::db::test_support::insert_track;
    use crate::perfdata::{SamplingInfo, TrackData};

    #[test]
    fn test_track_ids_sorted() {
        let db = Database::open_in_memory(SchemaVersion::V1_9_1).unwrap();
        for id in [5, 2, 9] {
            insert_track(&db, id);
        }
        assert_eq!(db.track_ids().unwrap(), vec![2, 5, 9]);
        assert_eq!(db.track_ids_by_path("../Music/track5.mp3").unwrap(), vec![5]);
        assert!(db.track_ids_by_path("nowhere.mp3").unwrap().is_empty());
    }

    #[test]
    fn test_stats_on_empty_library() {
        let db = Database::open_in_memory(SchemaVersion::LATEST).unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats.total_tracks, 0);
        assert_eq!(stats.performance_rows, 0);
        assert_eq!(stats.analyzed_tracks, 0);
        assert_eq!(stats.rendered_tracks, 0);
    }

    #[test]
    fn test_stats_counts_performance_rows() {
        let db = Database::open_in_memory(SchemaVersion::LATEST).unwrap();
        insert_track(&db, 1);
        insert_track(&db, 2);
        let data = TrackData {
            sampling: Some(SamplingInfo { sample_rate: 48000.0, sample_count: 480_000 }),
            ..TrackData::default()
        };
        db.track(1).set_track_data(&data).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.total_tracks, 2);
        assert_eq!(stats.performance_rows, 1);
        assert_eq!(stats.analyzed_tracks, 1);
        assert_eq!(stats.rendered_tracks, 0);
    }

    #[test]
    fn test_information_matches_version() {
        let db = Database::open_in_memory(SchemaVersion::V1_15_0).unwrap();
        let (music, performance) = db.information().unwrap();
        assert_eq!(music, performance);
        assert_eq!(music.uuid, db.uuid());
        assert_eq!(
            (music.schema_version_major, music.schema_version_minor, music.schema_version_patch),
            (1, 15, 0)
        );
    }
}
