//! Binary codecs for the blobs stored in the `PerformanceData` table.
//!
//! Each analysis kind owns one column and one fixed layout. Most kinds are
//! wrapped in a zlib envelope (see [`envelope`]); loops are stored raw.
//! Codecs are pure: they never touch the database.

pub mod beat_data;
mod bytes;
pub mod envelope;
pub mod loops;
pub mod quick_cues;
pub mod track_data;
pub mod types;
pub mod waveform;

pub use beat_data::BeatData;
pub use loops::LoopsData;
pub use quick_cues::QuickCuesData;
pub use track_data::TrackData;
pub use types::{
    BeatgridMarker, HotCue, Loop, MusicalKey, OverviewWaveformEntry, PadColor, SamplingInfo,
    WaveformEntry, WaveformPoint,
};
pub use waveform::{HighResWaveformData, OverviewWaveformData};

use std::fmt::Debug;
use thiserror::Error;

/// Number of hot cue and loop slots on a track.
pub const SLOT_COUNT: usize = 8;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("{kind}: unexpected end of data")]
    Truncated { kind: &'static str },
    #[error("{kind}: {count} unexpected trailing bytes")]
    TrailingBytes { kind: &'static str, count: usize },
    #[error("{kind}: {reason}")]
    Invalid { kind: &'static str, reason: String },
    #[error("{kind}: zlib envelope: {reason}")]
    Envelope { kind: &'static str, reason: String },
}

impl CodecError {
    pub(crate) fn invalid(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            kind,
            reason: reason.into(),
        }
    }
}

/// A value that is persisted as one blob column.
///
/// `decode(encode(v)) == v` must hold for every value the crate produces;
/// the storage layer re-checks it before each write.
pub trait BlobCodec: Sized + PartialEq + Debug {
    /// Human-readable name of the data kind, used in errors.
    const KIND: &'static str;

    fn encode(&self) -> Vec<u8>;

    fn decode(data: &[u8]) -> Result<Self, CodecError>;

    /// The "nothing recorded yet" value returned when no row exists.
    fn default_value() -> Self;
}
