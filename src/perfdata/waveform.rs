//! Overview (`overviewWaveFormData`) and high-resolution
//! (`highResolutionWaveFormData`) waveforms.
//!
//! Both share a header of two identical i64 entry counts and an f64
//! samples-per-entry, followed by the entries and one trailing entry holding
//! the per-band maximum. The maximum is derived on encode and ignored on
//! decode.

use super::bytes::{BlobReader, BlobWriter};
use super::types::{OverviewWaveformEntry, WaveformEntry, WaveformPoint};
use super::{BlobCodec, CodecError, envelope};

const HEADER_LEN: usize = 24;

fn read_header(
    r: &mut BlobReader<'_>,
    kind: &'static str,
    entry_len: usize,
) -> Result<(usize, f64), CodecError> {
    let first = r.i64_be()?;
    let second = r.i64_be()?;
    if first != second {
        return Err(CodecError::invalid(
            kind,
            format!("entry counts disagree ({first} vs {second})"),
        ));
    }
    let samples_per_entry = r.f64_be()?;
    let count = r.count(first, entry_len)?;
    Ok((count, samples_per_entry))
}

fn write_header(w: &mut BlobWriter, count: usize, samples_per_entry: f64) {
    w.i64_be(count as i64);
    w.i64_be(count as i64);
    w.f64_be(samples_per_entry);
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverviewWaveformData {
    pub samples_per_entry: f64,
    pub waveform: Vec<OverviewWaveformEntry>,
}

impl OverviewWaveformData {
    const ENTRY_LEN: usize = 3;
}

impl BlobCodec for OverviewWaveformData {
    const KIND: &'static str = "overview waveform";

    fn encode(&self) -> Vec<u8> {
        let mut w =
            BlobWriter::with_capacity(HEADER_LEN + Self::ENTRY_LEN * (self.waveform.len() + 1));
        write_header(&mut w, self.waveform.len(), self.samples_per_entry);

        let mut max = OverviewWaveformEntry::default();
        for e in &self.waveform {
            w.u8(e.low);
            w.u8(e.mid);
            w.u8(e.high);
            max.low = max.low.max(e.low);
            max.mid = max.mid.max(e.mid);
            max.high = max.high.max(e.high);
        }
        w.u8(max.low);
        w.u8(max.mid);
        w.u8(max.high);
        envelope::compress(&w.into_inner())
    }

    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let raw = envelope::uncompress(data, Self::KIND)?;
        if raw.is_empty() {
            return Ok(Self::default());
        }

        let mut r = BlobReader::new(&raw, Self::KIND);
        let (count, samples_per_entry) = read_header(&mut r, Self::KIND, Self::ENTRY_LEN)?;
        let mut waveform = Vec::with_capacity(count);
        for _ in 0..count {
            waveform.push(OverviewWaveformEntry {
                low: r.u8()?,
                mid: r.u8()?,
                high: r.u8()?,
            });
        }
        for _ in 0..Self::ENTRY_LEN {
            r.u8()?;
        }
        r.finish()?;

        Ok(Self {
            samples_per_entry,
            waveform,
        })
    }

    fn default_value() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HighResWaveformData {
    pub samples_per_entry: f64,
    pub waveform: Vec<WaveformEntry>,
}

impl HighResWaveformData {
    const ENTRY_LEN: usize = 6;
}

fn write_entry(w: &mut BlobWriter, e: &WaveformEntry) {
    w.u8(e.low.value);
    w.u8(e.mid.value);
    w.u8(e.high.value);
    w.u8(e.low.opacity);
    w.u8(e.mid.opacity);
    w.u8(e.high.opacity);
}

fn max_point(a: WaveformPoint, b: WaveformPoint) -> WaveformPoint {
    WaveformPoint {
        value: a.value.max(b.value),
        opacity: a.opacity.max(b.opacity),
    }
}

impl BlobCodec for HighResWaveformData {
    const KIND: &'static str = "high-resolution waveform";

    fn encode(&self) -> Vec<u8> {
        let mut w =
            BlobWriter::with_capacity(HEADER_LEN + Self::ENTRY_LEN * (self.waveform.len() + 1));
        write_header(&mut w, self.waveform.len(), self.samples_per_entry);

        let mut max = WaveformEntry::default();
        for e in &self.waveform {
            write_entry(&mut w, e);
            max.low = max_point(max.low, e.low);
            max.mid = max_point(max.mid, e.mid);
            max.high = max_point(max.high, e.high);
        }
        write_entry(&mut w, &max);
        envelope::compress(&w.into_inner())
    }

    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let raw = envelope::uncompress(data, Self::KIND)?;
        if raw.is_empty() {
            return Ok(Self::default());
        }

        let mut r = BlobReader::new(&raw, Self::KIND);
        let (count, samples_per_entry) = read_header(&mut r, Self::KIND, Self::ENTRY_LEN)?;
        let mut waveform = Vec::with_capacity(count);
        for _ in 0..count {
            let values = [r.u8()?, r.u8()?, r.u8()?];
            let opacities = [r.u8()?, r.u8()?, r.u8()?];
            waveform.push(WaveformEntry {
                low: WaveformPoint { value: values[0], opacity: opacities[0] },
                mid: WaveformPoint { value: values[1], opacity: opacities[1] },
                high: WaveformPoint { value: values[2], opacity: opacities[2] },
            });
        }
        for _ in 0..Self::ENTRY_LEN {
            r.u8()?;
        }
        r.finish()?;

        Ok(Self {
            samples_per_entry,
            waveform,
        })
    }

    fn default_value() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(low: u8, mid: u8, high: u8) -> WaveformEntry {
        WaveformEntry {
            low: WaveformPoint { value: low, opacity: 255 },
            mid: WaveformPoint { value: mid, opacity: 200 },
            high: WaveformPoint { value: high, opacity: 127 },
        }
    }

    fn high_res() -> HighResWaveformData {
        HighResWaveformData {
            samples_per_entry: 420.0,
            waveform: vec![entry(1, 2, 3), entry(90, 10, 0), entry(4, 200, 5)],
        }
    }

    #[test]
    fn test_high_res_round_trip() {
        let data = high_res();
        assert_eq!(HighResWaveformData::decode(&data.encode()).unwrap(), data);
    }

    #[test]
    fn test_overview_round_trip() {
        let data = OverviewWaveformData {
            samples_per_entry: 7000.5,
            waveform: high_res().waveform.into_iter().map(Into::into).collect(),
        };
        assert_eq!(OverviewWaveformData::decode(&data.encode()).unwrap(), data);
    }

    #[test]
    fn test_defaults_round_trip() {
        let h = HighResWaveformData::default_value();
        assert_eq!(HighResWaveformData::decode(&h.encode()).unwrap(), h);
        let o = OverviewWaveformData::default_value();
        assert_eq!(OverviewWaveformData::decode(&o.encode()).unwrap(), o);
    }

    #[test]
    fn test_high_res_maximum_entry() {
        let raw = envelope::uncompress(&high_res().encode(), "test").unwrap();
        assert_eq!(raw.len(), 24 + 6 * 4);
        assert_eq!(&raw[raw.len() - 6..], &[90, 200, 5, 255, 200, 127]);
    }

    #[test]
    fn test_mismatched_counts_are_malformed() {
        let mut raw = envelope::uncompress(&high_res().encode(), "test").unwrap();
        raw[15] = 2;
        let err = HighResWaveformData::decode(&envelope::compress(&raw)).unwrap_err();
        assert!(err.to_string().contains("disagree"));
    }

    #[test]
    fn test_missing_maximum_is_malformed() {
        let mut raw = envelope::uncompress(&high_res().encode(), "test").unwrap();
        raw.truncate(raw.len() - 6);
        assert!(HighResWaveformData::decode(&envelope::compress(&raw)).is_err());
    }
}
