use super::schema::SchemaVersion;

/// String slots of the `MetaData` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataStrType {
    Title,
    Artist,
    Album,
    Genre,
    Comment,
    Publisher,
    Composer,
    DurationMmSs,
    EverPlayed,
    FileExtension,
}

impl MetadataStrType {
    pub const ALL: [MetadataStrType; 10] = [
        Self::Title,
        Self::Artist,
        Self::Album,
        Self::Genre,
        Self::Comment,
        Self::Publisher,
        Self::Composer,
        Self::DurationMmSs,
        Self::EverPlayed,
        Self::FileExtension,
    ];

    /// Value of the `type` column.
    pub fn id(self) -> i64 {
        match self {
            Self::Title => 1,
            Self::Artist => 2,
            Self::Album => 3,
            Self::Genre => 4,
            Self::Comment => 5,
            Self::Publisher => 6,
            Self::Composer => 7,
            Self::DurationMmSs => 10,
            Self::EverPlayed => 12,
            Self::FileExtension => 13,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Artist => "artist",
            Self::Album => "album",
            Self::Genre => "genre",
            Self::Comment => "comment",
            Self::Publisher => "publisher",
            Self::Composer => "composer",
            Self::DurationMmSs => "duration",
            Self::EverPlayed => "ever played",
            Self::FileExtension => "file extension",
        }
    }
}

/// Integer slots of the `MetaDataInteger` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataIntType {
    LastPlayedTs,
    LastModifiedTs,
    /// Stored with date precision only: the FAT "last access" field the
    /// hardware mirrors has no time of day.
    LastAccessedTs,
    MusicalKey,
    Hash,
}

impl MetadataIntType {
    pub const ALL: [MetadataIntType; 5] = [
        Self::LastPlayedTs,
        Self::LastModifiedTs,
        Self::LastAccessedTs,
        Self::MusicalKey,
        Self::Hash,
    ];

    pub fn id(self) -> i64 {
        match self {
            Self::LastPlayedTs => 1,
            Self::LastModifiedTs => 2,
            Self::LastAccessedTs => 3,
            Self::MusicalKey => 4,
            Self::Hash => 10,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::LastPlayedTs => "last played",
            Self::LastModifiedTs => "last modified",
            Self::LastAccessedTs => "last accessed",
            Self::MusicalKey => "key",
            Self::Hash => "hash",
        }
    }
}

/// Blob columns of the `PerformanceData` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerformanceColumn {
    TrackData,
    HighResolutionWaveForm,
    OverviewWaveForm,
    BeatData,
    QuickCues,
    Loops,
}

impl PerformanceColumn {
    pub fn name(self) -> &'static str {
        match self {
            Self::TrackData => "trackData",
            Self::HighResolutionWaveForm => "highResolutionWaveFormData",
            Self::OverviewWaveForm => "overviewWaveFormData",
            Self::BeatData => "beatData",
            Self::QuickCues => "quickCues",
            Self::Loops => "loops",
        }
    }
}

/// Scalar columns of the `Track` table (everything except `id`), in table
/// order. Later schema versions append columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackColumn {
    PlayOrder,
    Length,
    LengthCalculated,
    Bpm,
    Year,
    Path,
    Filename,
    Bitrate,
    BpmAnalyzed,
    TrackType,
    IsExternalTrack,
    UuidOfExternalDatabase,
    IdTrackInExternalDatabase,
    AlbumArtId,
    PdbImportKey,
    Uri,
    IsBeatGridLocked,
    IsMetadataImported,
    ExplicitLyrics,
    ActiveOnLoadLoops,
}

impl TrackColumn {
    pub const ALL: [TrackColumn; 20] = [
        Self::PlayOrder,
        Self::Length,
        Self::LengthCalculated,
        Self::Bpm,
        Self::Year,
        Self::Path,
        Self::Filename,
        Self::Bitrate,
        Self::BpmAnalyzed,
        Self::TrackType,
        Self::IsExternalTrack,
        Self::UuidOfExternalDatabase,
        Self::IdTrackInExternalDatabase,
        Self::AlbumArtId,
        Self::PdbImportKey,
        Self::Uri,
        Self::IsBeatGridLocked,
        Self::IsMetadataImported,
        Self::ExplicitLyrics,
        Self::ActiveOnLoadLoops,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::PlayOrder => "playOrder",
            Self::Length => "length",
            Self::LengthCalculated => "lengthCalculated",
            Self::Bpm => "bpm",
            Self::Year => "year",
            Self::Path => "path",
            Self::Filename => "filename",
            Self::Bitrate => "bitrate",
            Self::BpmAnalyzed => "bpmAnalyzed",
            Self::TrackType => "trackType",
            Self::IsExternalTrack => "isExternalTrack",
            Self::UuidOfExternalDatabase => "uuidOfExternalDatabase",
            Self::IdTrackInExternalDatabase => "idTrackInExternalDatabase",
            Self::AlbumArtId => "idAlbumArt",
            Self::PdbImportKey => "pdbImportKey",
            Self::Uri => "uri",
            Self::IsBeatGridLocked => "isBeatGridLocked",
            Self::IsMetadataImported => "isMetadataImported",
            Self::ExplicitLyrics => "explicitLyrics",
            Self::ActiveOnLoadLoops => "activeOnLoadLoops",
        }
    }

    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Path | Self::Filename | Self::UuidOfExternalDatabase | Self::Uri => "TEXT",
            Self::BpmAnalyzed => "REAL",
            Self::IsExternalTrack
            | Self::IsBeatGridLocked
            | Self::IsMetadataImported
            | Self::ExplicitLyrics => "NUMERIC",
            _ => "INTEGER",
        }
    }

    /// First schema version whose `Track` table has this column.
    pub fn since(self) -> SchemaVersion {
        match self {
            Self::PdbImportKey => SchemaVersion::V1_7_1,
            Self::Uri | Self::IsBeatGridLocked => SchemaVersion::V1_11_1,
            Self::IsMetadataImported => SchemaVersion::V1_15_0,
            Self::ExplicitLyrics => SchemaVersion::V1_17_0,
            Self::ActiveOnLoadLoops => SchemaVersion::V1_18_0,
            _ => SchemaVersion::V1_6_0,
        }
    }
}

/// The non-blob columns of one `PerformanceData` row.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceFlags {
    pub is_analyzed: bool,
    pub is_rendered: bool,
    pub has_serato_values: bool,
    /// `None` when the schema version has no such column.
    pub has_rekordbox_values: Option<bool>,
    pub has_traktor_values: Option<bool>,
}

/// Reference to the library a track was imported from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackImportInfo {
    pub external_db_uuid: String,
    pub external_track_id: i64,
}

/// The single row of an `Information` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Information {
    pub uuid: String,
    pub schema_version_major: i64,
    pub schema_version_minor: i64,
    pub schema_version_patch: i64,
}

/// Summary counts for a library.
#[derive(Debug)]
pub struct LibraryStats {
    pub total_tracks: i64,
    pub performance_rows: i64,
    pub analyzed_tracks: i64,
    pub rendered_tracks: i64,
}
