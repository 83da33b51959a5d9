use std::fmt;

/// Sample rate and length of the analysed audio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingInfo {
    pub sample_rate: f64,
    pub sample_count: i64,
}

impl SamplingInfo {
    /// Track length in milliseconds, or `None` when the sample rate is zero.
    pub fn duration_ms(&self) -> Option<i64> {
        if self.sample_rate > 0.0 {
            Some((self.sample_count as f64 * 1000.0 / self.sample_rate) as i64)
        } else {
            None
        }
    }
}

/// One anchor of a beat grid: the beat numbered `index` falls on
/// `sample_offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatgridMarker {
    pub index: i64,
    pub sample_offset: f64,
}

/// ARGB colour of a hot cue or loop pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PadColor {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PadColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { a: 0xff, r, g, b }
    }

    /// Colour the hardware gives a new cue or loop in pad `slot`.
    pub fn standard(slot: usize) -> Self {
        STANDARD_PAD_COLORS[slot % STANDARD_PAD_COLORS.len()]
    }
}

/// Default pad colours, one per slot.
pub const STANDARD_PAD_COLORS: [PadColor; 8] = [
    PadColor::new(0xea, 0xc5, 0x32),
    PadColor::new(0xea, 0x8f, 0x32),
    PadColor::new(0xb8, 0x55, 0xbf),
    PadColor::new(0xba, 0x2a, 0x41),
    PadColor::new(0x86, 0xc6, 0x4b),
    PadColor::new(0x20, 0xc6, 0x7c),
    PadColor::new(0x00, 0xa8, 0xb1),
    PadColor::new(0x15, 0x8e, 0xe2),
];

#[derive(Debug, Clone, PartialEq)]
pub struct HotCue {
    pub label: String,
    pub sample_offset: f64,
    pub color: PadColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    pub label: String,
    pub start_sample_offset: f64,
    pub end_sample_offset: f64,
    pub color: PadColor,
}

/// Value and opacity of one frequency band in a high-resolution waveform entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WaveformPoint {
    pub value: u8,
    pub opacity: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WaveformEntry {
    pub low: WaveformPoint,
    pub mid: WaveformPoint,
    pub high: WaveformPoint,
}

/// Overview waveforms carry band values only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverviewWaveformEntry {
    pub low: u8,
    pub mid: u8,
    pub high: u8,
}

impl From<WaveformEntry> for OverviewWaveformEntry {
    fn from(e: WaveformEntry) -> Self {
        Self {
            low: e.low.value,
            mid: e.mid.value,
            high: e.high.value,
        }
    }
}

/// Musical key, numbered in circle-of-fifths order as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MusicalKey {
    CMajor = 1,
    AMinor = 2,
    GMajor = 3,
    EMinor = 4,
    DMajor = 5,
    BMinor = 6,
    AMajor = 7,
    FSharpMinor = 8,
    EMajor = 9,
    DFlatMinor = 10,
    BMajor = 11,
    AFlatMinor = 12,
    FSharpMajor = 13,
    EFlatMinor = 14,
    DFlatMajor = 15,
    BFlatMinor = 16,
    AFlatMajor = 17,
    FMinor = 18,
    EFlatMajor = 19,
    CMinor = 20,
    BFlatMajor = 21,
    GMinor = 22,
    FMajor = 23,
    DMinor = 24,
}

impl MusicalKey {
    pub const ALL: [MusicalKey; 24] = [
        Self::CMajor,
        Self::AMinor,
        Self::GMajor,
        Self::EMinor,
        Self::DMajor,
        Self::BMinor,
        Self::AMajor,
        Self::FSharpMinor,
        Self::EMajor,
        Self::DFlatMinor,
        Self::BMajor,
        Self::AFlatMinor,
        Self::FSharpMajor,
        Self::EFlatMinor,
        Self::DFlatMajor,
        Self::BFlatMinor,
        Self::AFlatMajor,
        Self::FMinor,
        Self::EFlatMajor,
        Self::CMinor,
        Self::BFlatMajor,
        Self::GMinor,
        Self::FMajor,
        Self::DMinor,
    ];

    pub fn from_i64(value: i64) -> Option<Self> {
        if (1..=24).contains(&value) {
            Some(Self::ALL[(value - 1) as usize])
        } else {
            None
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::CMajor => "C",
            Self::AMinor => "Am",
            Self::GMajor => "G",
            Self::EMinor => "Em",
            Self::DMajor => "D",
            Self::BMinor => "Bm",
            Self::AMajor => "A",
            Self::FSharpMinor => "F#m",
            Self::EMajor => "E",
            Self::DFlatMinor => "Dbm",
            Self::BMajor => "B",
            Self::AFlatMinor => "Abm",
            Self::FSharpMajor => "F#",
            Self::EFlatMinor => "Ebm",
            Self::DFlatMajor => "Db",
            Self::BFlatMinor => "Bbm",
            Self::AFlatMajor => "Ab",
            Self::FMinor => "Fm",
            Self::EFlatMajor => "Eb",
            Self::CMinor => "Cm",
            Self::BFlatMajor => "Bb",
            Self::GMinor => "Gm",
            Self::FMajor => "F",
            Self::DMinor => "Dm",
        }
    }
}

impl fmt::Display for MusicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_colour_per_slot() {
        assert_eq!(PadColor::standard(0), PadColor::new(0xea, 0xc5, 0x32));
        assert_eq!(PadColor::standard(7), PadColor::new(0x15, 0x8e, 0xe2));
        assert_eq!(PadColor::standard(8), PadColor::standard(0));
        assert_eq!(PadColor::standard(3).a, 0xff);
    }

    #[test]
    fn test_key_numbering_matches_table() {
        for (i, key) in MusicalKey::ALL.iter().enumerate() {
            assert_eq!(key.as_i32() as usize, i + 1);
            assert_eq!(MusicalKey::from_i64(i as i64 + 1), Some(*key));
        }
        assert_eq!(MusicalKey::from_i64(0), None);
        assert_eq!(MusicalKey::from_i64(25), None);
    }

    #[test]
    fn test_duration_from_sampling() {
        let s = SamplingInfo { sample_rate: 44100.0, sample_count: 44100 * 90 };
        assert_eq!(s.duration_ms(), Some(90_000));
        let none = SamplingInfo { sample_rate: 0.0, sample_count: 10 };
        assert_eq!(none.duration_ms(), None);
    }
}
