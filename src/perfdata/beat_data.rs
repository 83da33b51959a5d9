use super::bytes::{BlobReader, BlobWriter};
use super::types::{BeatgridMarker, SamplingInfo};
use super::{BlobCodec, CodecError, envelope};

const KIND: &str = "beat data";
const HEADER_LEN: usize = 17;
const MARKER_LEN: usize = 24;

/// Beat grids of a track (`beatData` column).
///
/// The default grid is what the analyser produced; the adjusted grid is the
/// one the user has edited. Both are usually two markers long.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BeatData {
    pub sampling: Option<SamplingInfo>,
    pub default_beatgrid: Vec<BeatgridMarker>,
    pub adjusted_beatgrid: Vec<BeatgridMarker>,
}

/// Beats from `marker` to `next`, if the gap fits the on-disk `i32`.
fn beats_between(marker: &BeatgridMarker, next: &BeatgridMarker) -> Option<i32> {
    next.index
        .checked_sub(marker.index)
        .and_then(|gap| i32::try_from(gap).ok())
}

fn encode_beatgrid(w: &mut BlobWriter, grid: &[BeatgridMarker]) {
    w.i64_be(grid.len() as i64);
    for (i, marker) in grid.iter().enumerate() {
        // An unrepresentable gap is written as 0, which decode rejects.
        let beats_until_next = grid
            .get(i + 1)
            .map_or(Some(0), |next| beats_between(marker, next))
            .unwrap_or(0);
        w.f64_le(marker.sample_offset);
        w.i64_le(marker.index);
        w.i32_le(beats_until_next);
        w.i32_le(0);
    }
}

fn decode_beatgrid(r: &mut BlobReader<'_>) -> Result<Vec<BeatgridMarker>, CodecError> {
    let raw_count = r.i64_be()?;
    let count = r.count(raw_count, MARKER_LEN)?;

    let mut grid = Vec::with_capacity(count);
    let mut gaps = Vec::with_capacity(count);
    for _ in 0..count {
        let sample_offset = r.f64_le()?;
        let index = r.i64_le()?;
        gaps.push(r.i32_le()?);
        r.i32_le()?;
        grid.push(BeatgridMarker { index, sample_offset });
    }

    for (i, gap) in gaps.iter().enumerate() {
        let expected = match grid.get(i + 1) {
            None => 0,
            Some(next) => beats_between(&grid[i], next).ok_or_else(|| {
                CodecError::invalid(
                    KIND,
                    format!("marker {i} is too far from the next marker"),
                )
            })?,
        };
        if *gap != expected {
            return Err(CodecError::invalid(
                KIND,
                format!("marker {i} says {gap} beats to the next marker, grid implies {expected}"),
            ));
        }
    }
    Ok(grid)
}

impl BlobCodec for BeatData {
    const KIND: &'static str = KIND;

    fn encode(&self) -> Vec<u8> {
        let mut w = BlobWriter::with_capacity(
            HEADER_LEN
                + 16
                + MARKER_LEN * (self.default_beatgrid.len() + self.adjusted_beatgrid.len()),
        );
        w.f64_be(self.sampling.map_or(0.0, |s| s.sample_rate));
        w.f64_be(self.sampling.map_or(0.0, |s| s.sample_count as f64));
        w.bool(!self.default_beatgrid.is_empty() || !self.adjusted_beatgrid.is_empty());
        encode_beatgrid(&mut w, &self.default_beatgrid);
        encode_beatgrid(&mut w, &self.adjusted_beatgrid);
        envelope::compress(&w.into_inner())
    }

    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let raw = envelope::uncompress(data, KIND)?;
        if raw.is_empty() {
            return Ok(Self::default());
        }

        let mut r = BlobReader::new(&raw, KIND);
        let sample_rate = r.f64_be()?;
        let sample_count = r.f64_be()?;
        r.flag("beat grid set")?;
        let default_beatgrid = decode_beatgrid(&mut r)?;
        let adjusted_beatgrid = decode_beatgrid(&mut r)?;
        r.finish()?;

        Ok(Self {
            sampling: (sample_rate != 0.0 || sample_count != 0.0).then(|| SamplingInfo {
                sample_rate,
                sample_count: sample_count as i64,
            }),
            default_beatgrid,
            adjusted_beatgrid,
        })
    }

    fn default_value() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(first: f64) -> Vec<BeatgridMarker> {
        vec![
            BeatgridMarker { index: -4, sample_offset: first },
            BeatgridMarker { index: 812, sample_offset: first + 17_640_000.0 },
        ]
    }

    fn sample() -> BeatData {
        BeatData {
            sampling: Some(SamplingInfo { sample_rate: 44100.0, sample_count: 17_000_000 }),
            default_beatgrid: grid(-83_316.78),
            adjusted_beatgrid: grid(-80_000.0),
        }
    }

    #[test]
    fn test_round_trip() {
        let data = sample();
        assert_eq!(BeatData::decode(&data.encode()).unwrap(), data);
    }

    #[test]
    fn test_default_round_trip() {
        let d = BeatData::default_value();
        assert_eq!(BeatData::decode(&d.encode()).unwrap(), d);
    }

    #[test]
    fn test_layout() {
        let raw = envelope::uncompress(&sample().encode(), KIND).unwrap();
        assert_eq!(raw.len(), 17 + 2 * (8 + 2 * 24));
        assert_eq!(raw[16], 1);
        assert_eq!(&raw[17..25], &2i64.to_be_bytes());
        // beats until next marker, little-endian
        assert_eq!(&raw[25 + 16..25 + 20], &816i32.to_le_bytes());
    }

    #[test]
    fn test_inconsistent_gap_is_malformed() {
        let mut raw = envelope::uncompress(&sample().encode(), KIND).unwrap();
        raw[25 + 16] = 0;
        let err = BeatData::decode(&envelope::compress(&raw)).unwrap_err();
        assert!(matches!(err, CodecError::Invalid { .. }));
    }

    #[test]
    fn test_extreme_indices_are_malformed() {
        let data = BeatData {
            sampling: None,
            default_beatgrid: vec![
                BeatgridMarker { index: i64::MIN, sample_offset: 0.0 },
                BeatgridMarker { index: i64::MAX, sample_offset: 1.0 },
            ],
            adjusted_beatgrid: Vec::new(),
        };
        let err = BeatData::decode(&data.encode()).unwrap_err();
        assert!(matches!(err, CodecError::Invalid { .. }));
    }

    #[test]
    fn test_gap_beyond_i32_does_not_round_trip() {
        let data = BeatData {
            sampling: None,
            default_beatgrid: vec![
                BeatgridMarker { index: 0, sample_offset: 0.0 },
                BeatgridMarker { index: i32::MAX as i64 + 1, sample_offset: 1.0 },
            ],
            adjusted_beatgrid: Vec::new(),
        };
        assert!(BeatData::decode(&data.encode()).is_err());
    }

    #[test]
    fn test_truncated_grid_is_malformed() {
        let mut raw = envelope::uncompress(&sample().encode(), KIND).unwrap();
        raw.truncate(raw.len() - 1);
        assert!(BeatData::decode(&envelope::compress(&raw)).is_err());
    }

    #[test]
    fn test_trailing_bytes_are_malformed() {
        let mut raw = envelope::uncompress(&sample().encode(), KIND).unwrap();
        raw.push(0);
        assert_eq!(
            BeatData::decode(&envelope::compress(&raw)),
            Err(CodecError::TrailingBytes { kind: KIND, count: 1 })
        );
    }
}
