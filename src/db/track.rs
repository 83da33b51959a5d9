//! Typed access to one track's attributes, combining `Track` cells,
//! metadata slots and performance data.

use chrono::{DateTime, Utc};

use super::models::{
    MetadataIntType, MetadataStrType, PerformanceColumn, TrackColumn, TrackImportInfo,
};
use super::{Database, DbError, Result};
use crate::perfdata::{
    BeatData, BeatgridMarker, HighResWaveformData, HotCue, Loop, LoopsData, MusicalKey,
    OverviewWaveformData, PadColor, QuickCuesData, SLOT_COUNT, SamplingInfo, TrackData,
    WaveformEntry,
};

/// Overview waveforms always have this many entries.
pub const OVERVIEW_WAVEFORM_SIZE: usize = 1024;

/// High-resolution waveform entries per second of audio.
const WAVEFORM_ENTRIES_PER_SECOND: f64 = 105.0;

pub struct Track<'a> {
    db: &'a Database,
    id: i64,
}

impl Database {
    pub fn track(&self, id: i64) -> Track<'_> {
        Track { db: self, id }
    }
}

fn slot_index(index: usize) -> Result<usize> {
    if index < SLOT_COUNT {
        Ok(index)
    } else {
        Err(DbError::InvalidArgument(format!(
            "slot index {index} is out of range 0..{SLOT_COUNT}"
        )))
    }
}

impl<'a> Track<'a> {
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Whether the `Track` row still exists.
    pub fn is_valid(&self) -> Result<bool> {
        let count: i64 = self.db.conn.query_row(
            "SELECT COUNT(*) FROM Track WHERE id = ?1",
            [self.id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Performance data, whole blobs

    pub fn track_data(&self) -> Result<TrackData> {
        self.db.get_blob_field(self.id, PerformanceColumn::TrackData)
    }

    pub fn set_track_data(&self, data: &TrackData) -> Result<()> {
        self.db.set_blob_field(self.id, PerformanceColumn::TrackData, data)
    }

    pub fn beat_data(&self) -> Result<BeatData> {
        self.db.get_blob_field(self.id, PerformanceColumn::BeatData)
    }

    pub fn set_beat_data(&self, data: &BeatData) -> Result<()> {
        self.db.set_blob_field(self.id, PerformanceColumn::BeatData, data)
    }

    pub fn quick_cues_data(&self) -> Result<QuickCuesData> {
        self.db.get_blob_field(self.id, PerformanceColumn::QuickCues)
    }

    pub fn set_quick_cues_data(&self, data: &QuickCuesData) -> Result<()> {
        self.db.set_blob_field(self.id, PerformanceColumn::QuickCues, data)
    }

    pub fn loops_data(&self) -> Result<LoopsData> {
        self.db.get_blob_field(self.id, PerformanceColumn::Loops)
    }

    pub fn set_loops_data(&self, data: &LoopsData) -> Result<()> {
        self.db.set_blob_field(self.id, PerformanceColumn::Loops, data)
    }

    pub fn high_res_waveform_data(&self) -> Result<HighResWaveformData> {
        self.db.get_blob_field(self.id, PerformanceColumn::HighResolutionWaveForm)
    }

    pub fn set_high_res_waveform_data(&self, data: &HighResWaveformData) -> Result<()> {
        self.db
            .set_blob_field(self.id, PerformanceColumn::HighResolutionWaveForm, data)
    }

    pub fn overview_waveform_data(&self) -> Result<OverviewWaveformData> {
        self.db.get_blob_field(self.id, PerformanceColumn::OverviewWaveForm)
    }

    pub fn set_overview_waveform_data(&self, data: &OverviewWaveformData) -> Result<()> {
        self.db
            .set_blob_field(self.id, PerformanceColumn::OverviewWaveForm, data)
    }

    // Sampling and analysis summary

    pub fn sampling(&self) -> Result<Option<SamplingInfo>> {
        Ok(self.track_data()?.sampling)
    }

    /// Sampling is recorded in both track data and beat data.
    pub fn set_sampling(&self, sampling: Option<SamplingInfo>) -> Result<()> {
        self.db.atomically(|| {
            let mut track_data = self.track_data()?;
            track_data.sampling = sampling;
            self.set_track_data(&track_data)?;

            let mut beat_data = self.beat_data()?;
            beat_data.sampling = sampling;
            self.set_beat_data(&beat_data)
        })
    }

    /// Length in milliseconds, derived from the sampling info.
    pub fn duration_ms(&self) -> Result<Option<i64>> {
        Ok(self.sampling()?.and_then(|s| s.duration_ms()))
    }

    pub fn average_loudness(&self) -> Result<Option<f64>> {
        Ok(self.track_data()?.average_loudness)
    }

    pub fn set_average_loudness(&self, loudness: Option<f64>) -> Result<()> {
        let mut data = self.track_data()?;
        data.average_loudness = loudness;
        self.set_track_data(&data)
    }

    pub fn key(&self) -> Result<Option<MusicalKey>> {
        Ok(self
            .db
            .get_metadata_int(self.id, MetadataIntType::MusicalKey)?
            .and_then(MusicalKey::from_i64))
    }

    /// The key is kept in the metadata slot and in track data.
    pub fn set_key(&self, key: Option<MusicalKey>) -> Result<()> {
        self.db.atomically(|| {
            let mut data = self.track_data()?;
            data.key = key;
            self.set_track_data(&data)?;
            self.db.set_metadata_int(
                self.id,
                MetadataIntType::MusicalKey,
                key.map(|k| k.as_i32() as i64),
            )
        })
    }

    // Beat grids and main cue

    pub fn default_beatgrid(&self) -> Result<Vec<BeatgridMarker>> {
        Ok(self.beat_data()?.default_beatgrid)
    }

    pub fn set_default_beatgrid(&self, grid: Vec<BeatgridMarker>) -> Result<()> {
        let mut data = self.beat_data()?;
        data.default_beatgrid = grid;
        self.set_beat_data(&data)
    }

    pub fn adjusted_beatgrid(&self) -> Result<Vec<BeatgridMarker>> {
        Ok(self.beat_data()?.adjusted_beatgrid)
    }

    pub fn set_adjusted_beatgrid(&self, grid: Vec<BeatgridMarker>) -> Result<()> {
        let mut data = self.beat_data()?;
        data.adjusted_beatgrid = grid;
        self.set_beat_data(&data)
    }

    pub fn default_main_cue(&self) -> Result<f64> {
        Ok(self.quick_cues_data()?.default_main_cue)
    }

    pub fn set_default_main_cue(&self, sample_offset: f64) -> Result<()> {
        let mut data = self.quick_cues_data()?;
        data.default_main_cue = sample_offset;
        self.set_quick_cues_data(&data)
    }

    pub fn adjusted_main_cue(&self) -> Result<f64> {
        Ok(self.quick_cues_data()?.adjusted_main_cue)
    }

    pub fn set_adjusted_main_cue(&self, sample_offset: f64) -> Result<()> {
        let mut data = self.quick_cues_data()?;
        data.adjusted_main_cue = sample_offset;
        self.set_quick_cues_data(&data)
    }

    // Hot cues and loops

    pub fn hot_cues(&self) -> Result<[Option<HotCue>; SLOT_COUNT]> {
        Ok(self.quick_cues_data()?.hot_cues)
    }

    pub fn set_hot_cues(&self, cues: [Option<HotCue>; SLOT_COUNT]) -> Result<()> {
        let mut data = self.quick_cues_data()?;
        data.hot_cues = cues;
        self.set_quick_cues_data(&data)
    }

    pub fn hot_cue_at(&self, index: usize) -> Result<Option<HotCue>> {
        let index = slot_index(index)?;
        let mut data = self.quick_cues_data()?;
        Ok(data.hot_cues[index].take())
    }

    pub fn set_hot_cue_at(&self, index: usize, cue: Option<HotCue>) -> Result<()> {
        let index = slot_index(index)?;
        let mut data = self.quick_cues_data()?;
        data.hot_cues[index] = cue;
        self.set_quick_cues_data(&data)
    }

    /// Put a hot cue in slot `index` with that slot's standard pad colour.
    pub fn place_hot_cue(&self, index: usize, label: &str, sample_offset: f64) -> Result<()> {
        let index = slot_index(index)?;
        self.set_hot_cue_at(
            index,
            Some(HotCue {
                label: label.to_string(),
                sample_offset,
                color: PadColor::standard(index),
            }),
        )
    }

    pub fn loops(&self) -> Result<[Option<Loop>; SLOT_COUNT]> {
        Ok(self.loops_data()?.loops)
    }

    pub fn set_loops(&self, loops: [Option<Loop>; SLOT_COUNT]) -> Result<()> {
        self.set_loops_data(&LoopsData { loops })
    }

    pub fn loop_at(&self, index: usize) -> Result<Option<Loop>> {
        let index = slot_index(index)?;
        let mut data = self.loops_data()?;
        Ok(data.loops[index].take())
    }

    pub fn set_loop_at(&self, index: usize, l: Option<Loop>) -> Result<()> {
        let index = slot_index(index)?;
        let mut data = self.loops_data()?;
        data.loops[index] = l;
        self.set_loops_data(&data)
    }

    /// Put a loop in slot `index` with that slot's standard pad colour.
    pub fn place_loop(&self, index: usize, label: &str, start: f64, end: f64) -> Result<()> {
        let index = slot_index(index)?;
        self.set_loop_at(
            index,
            Some(Loop {
                label: label.to_string(),
                start_sample_offset: start,
                end_sample_offset: end,
                color: PadColor::standard(index),
            }),
        )
    }

    // Waveforms

    /// Samples per high-resolution waveform entry for this track's sample
    /// rate, or 0 without sampling info.
    pub fn required_waveform_samples_per_entry(&self) -> Result<i64> {
        Ok(self
            .sampling()?
            .map_or(0, |s| (s.sample_rate / WAVEFORM_ENTRIES_PER_SECOND) as i64))
    }

    pub fn waveform(&self) -> Result<Vec<WaveformEntry>> {
        Ok(self.high_res_waveform_data()?.waveform)
    }

    /// Store a high-resolution waveform and the overview derived from it.
    /// Needs sampling info to know the entry spacing.
    pub fn set_waveform(&self, waveform: Vec<WaveformEntry>) -> Result<()> {
        let mut overview = OverviewWaveformData::default();
        let mut high_res = HighResWaveformData::default();

        if !waveform.is_empty() {
            let samples_per_entry = self.required_waveform_samples_per_entry()?;
            if samples_per_entry == 0 {
                return Err(DbError::InvalidArgument(
                    "cannot store a waveform for a track without sampling info".to_string(),
                ));
            }

            let n = waveform.len();
            overview.samples_per_entry =
                (n as f64 * samples_per_entry as f64) / OVERVIEW_WAVEFORM_SIZE as f64;
            overview.waveform = (0..OVERVIEW_WAVEFORM_SIZE)
                .map(|i| waveform[n * (2 * i + 1) / (2 * OVERVIEW_WAVEFORM_SIZE)].into())
                .collect();

            high_res.samples_per_entry = samples_per_entry as f64;
            high_res.waveform = waveform;
        }

        self.db.atomically(|| {
            self.set_overview_waveform_data(&overview)?;
            self.set_high_res_waveform_data(&high_res)
        })
    }

    pub fn overview_waveform(&self) -> Result<OverviewWaveformData> {
        self.overview_waveform_data()
    }

    // Metadata slots

    pub fn metadata(&self, ty: MetadataStrType) -> Result<Option<String>> {
        self.db.get_metadata_str(self.id, ty)
    }

    pub fn set_metadata(&self, ty: MetadataStrType, value: Option<&str>) -> Result<()> {
        self.db.set_metadata_str(self.id, ty, value)
    }

    pub fn title(&self) -> Result<Option<String>> {
        self.metadata(MetadataStrType::Title)
    }

    pub fn set_title(&self, title: Option<&str>) -> Result<()> {
        self.set_metadata(MetadataStrType::Title, title)
    }

    pub fn artist(&self) -> Result<Option<String>> {
        self.metadata(MetadataStrType::Artist)
    }

    pub fn set_artist(&self, artist: Option<&str>) -> Result<()> {
        self.set_metadata(MetadataStrType::Artist, artist)
    }

    pub fn album(&self) -> Result<Option<String>> {
        self.metadata(MetadataStrType::Album)
    }

    pub fn set_album(&self, album: Option<&str>) -> Result<()> {
        self.set_metadata(MetadataStrType::Album, album)
    }

    pub fn genre(&self) -> Result<Option<String>> {
        self.metadata(MetadataStrType::Genre)
    }

    pub fn set_genre(&self, genre: Option<&str>) -> Result<()> {
        self.set_metadata(MetadataStrType::Genre, genre)
    }

    pub fn comment(&self) -> Result<Option<String>> {
        self.metadata(MetadataStrType::Comment)
    }

    pub fn set_comment(&self, comment: Option<&str>) -> Result<()> {
        self.set_metadata(MetadataStrType::Comment, comment)
    }

    pub fn publisher(&self) -> Result<Option<String>> {
        self.metadata(MetadataStrType::Publisher)
    }

    pub fn set_publisher(&self, publisher: Option<&str>) -> Result<()> {
        self.set_metadata(MetadataStrType::Publisher, publisher)
    }

    pub fn composer(&self) -> Result<Option<String>> {
        self.metadata(MetadataStrType::Composer)
    }

    pub fn set_composer(&self, composer: Option<&str>) -> Result<()> {
        self.set_metadata(MetadataStrType::Composer, composer)
    }

    pub fn file_extension(&self) -> Result<Option<String>> {
        self.metadata(MetadataStrType::FileExtension)
    }

    /// Store a length as the `mm:ss` string the hardware displays.
    pub fn set_duration_mm_ss(&self, duration_ms: Option<i64>) -> Result<()> {
        let text = duration_ms.map(|ms| {
            let secs = ms / 1000;
            format!("{:02}:{:02}", secs / 60, secs % 60)
        });
        self.set_metadata(MetadataStrType::DurationMmSs, text.as_deref())
    }

    pub fn ever_played(&self) -> Result<bool> {
        Ok(self.metadata(MetadataStrType::EverPlayed)?.as_deref() == Some("1"))
    }

    pub fn set_ever_played(&self, played: bool) -> Result<()> {
        self.set_metadata(MetadataStrType::EverPlayed, played.then_some("1"))
    }

    pub fn hash(&self) -> Result<Option<i64>> {
        self.db.get_metadata_int(self.id, MetadataIntType::Hash)
    }

    pub fn set_hash(&self, hash: Option<i64>) -> Result<()> {
        self.db.set_metadata_int(self.id, MetadataIntType::Hash, hash)
    }

    pub fn last_played_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.db.get_metadata_time(self.id, MetadataIntType::LastPlayedTs)
    }

    pub fn set_last_played_at(&self, ts: Option<DateTime<Utc>>) -> Result<()> {
        self.db.set_metadata_time(self.id, MetadataIntType::LastPlayedTs, ts)
    }

    pub fn last_modified_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.db.get_metadata_time(self.id, MetadataIntType::LastModifiedTs)
    }

    pub fn set_last_modified_at(&self, ts: Option<DateTime<Utc>>) -> Result<()> {
        self.db.set_metadata_time(self.id, MetadataIntType::LastModifiedTs, ts)
    }

    /// Only the date survives storage; the time of day reads back as
    /// midnight UTC.
    pub fn last_accessed_at(&self) -> Result<Option<DateTime<Utc>>> {
        self.db.get_metadata_time(self.id, MetadataIntType::LastAccessedTs)
    }

    pub fn set_last_accessed_at(&self, ts: Option<DateTime<Utc>>) -> Result<()> {
        self.db.set_metadata_time(self.id, MetadataIntType::LastAccessedTs, ts)
    }

    // Track cells

    pub fn path(&self) -> Result<Option<String>> {
        self.db.get_scalar_field(self.id, TrackColumn::Path)
    }

    pub fn set_path(&self, path: &str) -> Result<()> {
        self.db.set_scalar_field(self.id, TrackColumn::Path, path)
    }

    pub fn filename(&self) -> Result<Option<String>> {
        self.db.get_scalar_field(self.id, TrackColumn::Filename)
    }

    pub fn set_filename(&self, filename: &str) -> Result<()> {
        self.db.set_scalar_field(self.id, TrackColumn::Filename, filename)
    }

    pub fn bpm(&self) -> Result<Option<f64>> {
        self.db.get_scalar_field(self.id, TrackColumn::BpmAnalyzed)
    }

    /// Writes the analysed BPM and its rounded integer form.
    pub fn set_bpm(&self, bpm: Option<f64>) -> Result<()> {
        self.db.atomically(|| {
            self.db.set_scalar_field(self.id, TrackColumn::BpmAnalyzed, bpm)?;
            self.db
                .set_scalar_field(self.id, TrackColumn::Bpm, bpm.map(|b| b.round() as i64))
        })
    }

    pub fn year(&self) -> Result<Option<i64>> {
        self.db.get_scalar_field(self.id, TrackColumn::Year)
    }

    pub fn set_year(&self, year: Option<i64>) -> Result<()> {
        self.db.set_scalar_field(self.id, TrackColumn::Year, year)
    }

    pub fn bitrate(&self) -> Result<Option<i64>> {
        self.db.get_scalar_field(self.id, TrackColumn::Bitrate)
    }

    pub fn set_bitrate(&self, bitrate: Option<i64>) -> Result<()> {
        self.db.set_scalar_field(self.id, TrackColumn::Bitrate, bitrate)
    }

    /// Length in seconds as recorded in the `Track` table.
    pub fn length(&self) -> Result<Option<i64>> {
        self.db.get_scalar_field(self.id, TrackColumn::Length)
    }

    pub fn set_length(&self, seconds: Option<i64>) -> Result<()> {
        self.db.set_scalar_field(self.id, TrackColumn::Length, seconds)
    }

    pub fn album_art_id(&self) -> Result<Option<i64>> {
        self.db.get_scalar_field(self.id, TrackColumn::AlbumArtId)
    }

    pub fn set_album_art_id(&self, album_art_id: Option<i64>) -> Result<()> {
        self.db
            .set_scalar_field(self.id, TrackColumn::AlbumArtId, album_art_id)
    }

    /// Position in the album, stored as `playOrder`.
    pub fn track_number(&self) -> Result<Option<i64>> {
        self.db.get_scalar_field(self.id, TrackColumn::PlayOrder)
    }

    pub fn set_track_number(&self, track_number: Option<i64>) -> Result<()> {
        self.db
            .set_scalar_field(self.id, TrackColumn::PlayOrder, track_number)
    }

    /// Where the track was imported from, if it came from another library.
    pub fn import_info(&self) -> Result<Option<TrackImportInfo>> {
        let is_external: Option<i64> =
            self.db.get_scalar_field(self.id, TrackColumn::IsExternalTrack)?;
        if is_external.unwrap_or(0) == 0 {
            return Ok(None);
        }

        let uuid: Option<String> =
            self.db.get_scalar_field(self.id, TrackColumn::UuidOfExternalDatabase)?;
        let external_id: Option<i64> =
            self.db.get_scalar_field(self.id, TrackColumn::IdTrackInExternalDatabase)?;
        match (uuid, external_id) {
            (Some(external_db_uuid), Some(external_track_id)) => Ok(Some(TrackImportInfo {
                external_db_uuid,
                external_track_id,
            })),
            _ => Err(DbError::DatabaseInconsistency {
                track_id: self.id,
                message: "External track without external database reference".to_string(),
            }),
        }
    }

    /// The three import columns are always written together.
    pub fn set_import_info(&self, info: Option<&TrackImportInfo>) -> Result<()> {
        self.db.atomically(|| {
            self.db
                .set_scalar_field(self.id, TrackColumn::IsExternalTrack, info.is_some() as i64)?;
            self.db.set_scalar_field(
                self.id,
                TrackColumn::UuidOfExternalDatabase,
                info.map(|i| i.external_db_uuid.as_str()),
            )?;
            self.db.set_scalar_field(
                self.id,
                TrackColumn::IdTrackInExternalDatabase,
                info.map(|i| i.external_track_id),
            )
        })
    }
}
