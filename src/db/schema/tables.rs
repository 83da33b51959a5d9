//! Expected table layouts per schema version.
//!
//! These descriptions are the single source for both DDL generation and
//! structural verification, so a freshly created database always verifies.

use super::SchemaVersion;
use crate::db::models::TrackColumn;

pub(crate) struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
    /// Column constraint appended in DDL, e.g. `PRIMARY KEY AUTOINCREMENT`.
    pub constraint: &'static str,
}

pub(crate) struct Index {
    pub name: &'static str,
    pub columns: &'static str,
}

pub(crate) struct Table {
    pub name: &'static str,
    pub columns: Vec<Column>,
    /// Table-level composite primary key, empty if none.
    pub primary_key: &'static [&'static str],
    pub indices: Vec<Index>,
}

impl Table {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            columns: Vec::new(),
            primary_key: &[],
            indices: Vec::new(),
        }
    }

    fn col(mut self, name: &'static str, sql_type: &'static str) -> Self {
        self.columns.push(Column {
            name,
            sql_type,
            constraint: "",
        });
        self
    }

    fn col_with(
        mut self,
        name: &'static str,
        sql_type: &'static str,
        constraint: &'static str,
    ) -> Self {
        self.columns.push(Column {
            name,
            sql_type,
            constraint,
        });
        self
    }

    fn primary_key(mut self, columns: &'static [&'static str]) -> Self {
        self.primary_key = columns;
        self
    }

    fn index(mut self, name: &'static str, columns: &'static str) -> Self {
        self.indices.push(Index { name, columns });
        self
    }

    /// 1-based position of `column` in the primary key, 0 if not part of it.
    /// Matches the `pk` field of `PRAGMA table_info`.
    pub fn pk_position(&self, column: &Column) -> i64 {
        if column.constraint.starts_with("PRIMARY KEY") {
            return 1;
        }
        self.primary_key
            .iter()
            .position(|c| *c == column.name)
            .map_or(0, |p| p as i64 + 1)
    }

    /// `CREATE TABLE` and `CREATE INDEX` statements for this table in the
    /// attached database `schema`.
    pub fn ddl(&self, schema: &str) -> String {
        let mut defs: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                if c.constraint.is_empty() {
                    format!("[{}] {}", c.name, c.sql_type)
                } else {
                    format!("[{}] {} {}", c.name, c.sql_type, c.constraint)
                }
            })
            .collect();
        if !self.primary_key.is_empty() {
            let cols: Vec<String> = self.primary_key.iter().map(|c| format!("[{c}]")).collect();
            defs.push(format!("PRIMARY KEY ( {} )", cols.join(", ")));
        }

        let mut sql = format!(
            "CREATE TABLE {schema}.{} ( {} );\n",
            self.name,
            defs.join(", ")
        );
        for index in &self.indices {
            sql.push_str(&format!(
                "CREATE INDEX {schema}.{} ON {} ( {} );\n",
                index.name, self.name, index.columns
            ));
        }
        sql
    }
}

pub(crate) fn information() -> Table {
    Table::new("Information")
        .col_with("id", "INTEGER", "PRIMARY KEY AUTOINCREMENT")
        .col("uuid", "TEXT")
        .col("schemaVersionMajor", "INTEGER")
        .col("schemaVersionMinor", "INTEGER")
        .col("schemaVersionPatch", "INTEGER")
        .col("currentPlayedIndiciator", "INTEGER")
        .col("lastRekordBoxLibraryImportReadCounter", "INTEGER")
        .index("index_Information_id", "id")
}

pub(crate) fn track(version: SchemaVersion) -> Table {
    let mut table = Table::new("Track").col_with("id", "INTEGER", "PRIMARY KEY AUTOINCREMENT");
    for column in TrackColumn::ALL.into_iter().filter(|c| c.since() <= version) {
        table = match column {
            TrackColumn::AlbumArtId => table.col_with(
                column.name(),
                column.sql_type(),
                "REFERENCES AlbumArt ( id ) ON DELETE RESTRICT",
            ),
            _ => table.col(column.name(), column.sql_type()),
        };
    }

    table = table
        .index("index_Track_id", "id")
        .index("index_Track_path", "path")
        .index("index_Track_filename", "filename")
        .index("index_Track_isExternalTrack", "isExternalTrack")
        .index("index_Track_uuidOfExternalDatabase", "uuidOfExternalDatabase")
        .index("index_Track_idTrackInExternalDatabase", "idTrackInExternalDatabase")
        .index("index_Track_idAlbumArt", "idAlbumArt");
    if version >= SchemaVersion::V1_13_1 {
        table = table.index("index_Track_uri", "uri");
    }
    table
}

pub(crate) fn metadata() -> Vec<Table> {
    vec![
        Table::new("MetaData")
            .col_with("id", "INTEGER", "REFERENCES Track ( id ) ON DELETE CASCADE")
            .col("type", "INTEGER")
            .col("text", "TEXT")
            .primary_key(&["id", "type"])
            .index("index_MetaData_id", "id")
            .index("index_MetaData_type", "type")
            .index("index_MetaData_text", "text"),
        Table::new("MetaDataInteger")
            .col_with("id", "INTEGER", "REFERENCES Track ( id ) ON DELETE CASCADE")
            .col("type", "INTEGER")
            .col("value", "INTEGER")
            .primary_key(&["id", "type"])
            .index("index_MetaDataInteger_id", "id")
            .index("index_MetaDataInteger_type", "type")
            .index("index_MetaDataInteger_value", "value"),
    ]
}

/// Album art, copied-track bookkeeping and crates. Unchanged across the
/// supported range apart from the change log added in 1.13.0.
pub(crate) fn auxiliary(version: SchemaVersion) -> Vec<Table> {
    let mut tables = vec![
        Table::new("AlbumArt")
            .col_with("id", "INTEGER", "PRIMARY KEY AUTOINCREMENT")
            .col("hash", "TEXT")
            .col("albumArt", "BLOB")
            .index("index_AlbumArt_id", "id")
            .index("index_AlbumArt_hash", "hash"),
        Table::new("CopiedTrack")
            .col_with(
                "trackId",
                "INTEGER",
                "PRIMARY KEY REFERENCES Track ( id ) ON DELETE CASCADE",
            )
            .col("uuidOfSourceDatabase", "TEXT")
            .col("idOfTrackInSourceDatabase", "INTEGER")
            .index("index_CopiedTrack_trackId", "trackId"),
        Table::new("Crate")
            .col_with("id", "INTEGER", "PRIMARY KEY AUTOINCREMENT")
            .col("title", "TEXT")
            .col("path", "TEXT")
            .index("index_Crate_id", "id")
            .index("index_Crate_title", "title")
            .index("index_Crate_path", "path"),
        Table::new("CrateParentList")
            .col_with("crateOriginId", "INTEGER", "REFERENCES Crate ( id ) ON DELETE CASCADE")
            .col_with("crateParentId", "INTEGER", "REFERENCES Crate ( id ) ON DELETE CASCADE")
            .index("index_CrateParentList_crateOriginId", "crateOriginId")
            .index("index_CrateParentList_crateParentId", "crateParentId"),
        Table::new("CrateHierarchy")
            .col_with("crateId", "INTEGER", "REFERENCES Crate ( id ) ON DELETE CASCADE")
            .col_with("crateIdChild", "INTEGER", "REFERENCES Crate ( id ) ON DELETE CASCADE")
            .index("index_CrateHierarchy_crateId", "crateId")
            .index("index_CrateHierarchy_crateIdChild", "crateIdChild"),
        Table::new("CrateTrackList")
            .col_with("crateId", "INTEGER", "REFERENCES Crate ( id ) ON DELETE CASCADE")
            .col_with("trackId", "INTEGER", "REFERENCES Track ( id ) ON DELETE CASCADE")
            .index("index_CrateTrackList_crateId", "crateId")
            .index("index_CrateTrackList_trackId", "trackId"),
    ];
    if version >= SchemaVersion::V1_13_0 {
        tables.push(
            Table::new("ChangeLog")
                .col_with("id", "INTEGER", "PRIMARY KEY AUTOINCREMENT")
                .col("trackId", "INTEGER")
                .index("index_ChangeLog_id", "id")
                .index("index_ChangeLog_trackId", "trackId"),
        );
        tables.push(
            Table::new("Pack")
                .col_with("id", "INTEGER", "PRIMARY KEY AUTOINCREMENT")
                .col("packId", "TEXT")
                .col("changeLogDatabaseUuid", "TEXT")
                .col("changeLogId", "INTEGER")
                .index("index_Pack_id", "id"),
        );
    }
    tables
}

fn legacy_list(
    list: &'static str,
    tracks: &'static str,
    id_column: &'static str,
    extra: (&'static str, &'static str),
) -> [Table; 2] {
    [
        Table::new(list)
            .col_with("id", "INTEGER", "PRIMARY KEY AUTOINCREMENT")
            .col("title", "TEXT"),
        Table::new(tracks)
            .col(id_column, "INTEGER")
            .col_with("trackId", "INTEGER", "REFERENCES Track ( id ) ON DELETE CASCADE")
            .col("trackIdInOriginDatabase", "INTEGER")
            .col("databaseUuid", "TEXT")
            .col(extra.0, extra.1),
    ]
}

/// Playlist-like tables. Before 1.9.1 each list kind had its own pair of
/// tables; from 1.9.1 they share `List` keyed by `(id, type)`.
pub(crate) fn lists(version: SchemaVersion) -> Vec<Table> {
    if !version.has_list_table() {
        let mut tables = Vec::new();
        tables.extend(legacy_list(
            "Playlist",
            "PlaylistTrackList",
            "playlistId",
            ("trackNumber", "INTEGER"),
        ));
        tables.extend(legacy_list(
            "Historylist",
            "HistorylistTrackList",
            "historylistId",
            ("date", "INTEGER"),
        ));
        tables.extend(legacy_list(
            "Preparelist",
            "PreparelistTrackList",
            "playlistId",
            ("trackNumber", "INTEGER"),
        ));
        return tables;
    }

    let mut list = Table::new("List")
        .col("id", "INTEGER")
        .col("type", "INTEGER")
        .col("title", "TEXT")
        .col("path", "TEXT")
        .col("isFolder", "NUMERIC")
        .col("trackCount", "INTEGER");
    if version >= SchemaVersion::V1_11_1 {
        list = list.col("isExplicitlyExported", "NUMERIC");
    }
    list = list
        .primary_key(&["id", "type"])
        .index("index_List_id", "id")
        .index("index_List_type", "type")
        .index("index_List_path", "path");

    vec![
        list,
        Table::new("ListTrackList")
            .col_with("id", "INTEGER", "PRIMARY KEY AUTOINCREMENT")
            .col("listId", "INTEGER")
            .col("listType", "INTEGER")
            .col_with("trackId", "INTEGER", "REFERENCES Track ( id ) ON DELETE CASCADE")
            .col("trackIdInOriginDatabase", "INTEGER")
            .col("databaseUuid", "TEXT")
            .col("trackNumber", "INTEGER")
            .index("index_ListTrackList_listId", "listId")
            .index("index_ListTrackList_trackId", "trackId"),
        Table::new("ListHierarchy")
            .col("listId", "INTEGER")
            .col("listType", "INTEGER")
            .col("listIdChild", "INTEGER")
            .col("listTypeChild", "INTEGER")
            .index("index_ListHierarchy_listId", "listId")
            .index("index_ListHierarchy_listIdChild", "listIdChild"),
        Table::new("ListParentList")
            .col("listOriginId", "INTEGER")
            .col("listOriginType", "INTEGER")
            .col("listParentId", "INTEGER")
            .col("listParentType", "INTEGER")
            .index("index_ListParentList_listOriginId", "listOriginId")
            .index("index_ListParentList_listParentId", "listParentId"),
    ]
}

pub(crate) fn performance_data(version: SchemaVersion) -> Table {
    let mut table = Table::new("PerformanceData")
        .col_with("id", "INTEGER", "PRIMARY KEY")
        .col("isAnalyzed", "NUMERIC")
        .col("isRendered", "NUMERIC")
        .col("trackData", "BLOB")
        .col("highResolutionWaveFormData", "BLOB")
        .col("overviewWaveFormData", "BLOB")
        .col("beatData", "BLOB")
        .col("quickCues", "BLOB")
        .col("loops", "BLOB")
        .col("hasSeratoValues", "NUMERIC");
    if version.has_rekordbox_flag() {
        table = table.col("hasRekordboxValues", "NUMERIC");
    }
    if version.has_traktor_flag() {
        table = table.col("hasTraktorValues", "NUMERIC");
    }
    table.index("index_PerformanceData_id", "id")
}

/// Every table of the music database (`m.db`).
pub(crate) fn music(version: SchemaVersion) -> Vec<Table> {
    let mut tables = vec![information(), track(version)];
    tables.extend(metadata());
    tables.extend(auxiliary(version));
    tables.extend(lists(version));
    tables
}

/// Every table of the performance database (`p.db`).
pub(crate) fn performance(version: SchemaVersion) -> Vec<Table> {
    vec![information(), performance_data(version)]
}
