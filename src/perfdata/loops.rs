use super::bytes::{BlobReader, BlobWriter};
use super::types::{Loop, PadColor};
use super::{BlobCodec, CodecError, SLOT_COUNT};

const KIND: &str = "loops";
const UNSET_OFFSET: f64 = -1.0;
const MIN_LOOP_LEN: usize = 1 + 8 + 8 + 2 + 4;

/// Saved loops (`loops` column). Unlike the other kinds this blob is not
/// compressed and its integers are little-endian.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoopsData {
    pub loops: [Option<Loop>; SLOT_COUNT],
}

impl BlobCodec for LoopsData {
    const KIND: &'static str = KIND;

    fn encode(&self) -> Vec<u8> {
        let mut w = BlobWriter::with_capacity(8 + SLOT_COUNT * (MIN_LOOP_LEN + 16));
        w.i64_le(SLOT_COUNT as i64);
        for l in &self.loops {
            let (label, start, end, color) = match l {
                Some(l) => (
                    l.label.as_str(),
                    l.start_sample_offset,
                    l.end_sample_offset,
                    l.color,
                ),
                None => ("", UNSET_OFFSET, UNSET_OFFSET, PadColor::default()),
            };
            w.label(label);
            w.f64_le(start);
            w.f64_le(end);
            w.bool(l.is_some());
            w.bool(l.is_some());
            w.u8(color.a);
            w.u8(color.r);
            w.u8(color.g);
            w.u8(color.b);
        }
        w.into_inner()
    }

    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        if data.is_empty() {
            return Ok(Self::default());
        }

        let mut r = BlobReader::new(data, KIND);
        let raw_count = r.i64_le()?;
        let count = r.count(raw_count, MIN_LOOP_LEN)?;
        if count > SLOT_COUNT {
            return Err(CodecError::invalid(
                KIND,
                format!("{count} loops, at most {SLOT_COUNT} allowed"),
            ));
        }

        let mut loops: [Option<Loop>; SLOT_COUNT] = Default::default();
        for slot in loops.iter_mut().take(count) {
            let label = r.label()?;
            let start_sample_offset = r.f64_le()?;
            let end_sample_offset = r.f64_le()?;
            let start_set = r.flag("loop start set")?;
            let end_set = r.flag("loop end set")?;
            let color = PadColor {
                a: r.u8()?,
                r: r.u8()?,
                g: r.u8()?,
                b: r.u8()?,
            };
            if start_set && end_set {
                *slot = Some(Loop {
                    label,
                    start_sample_offset,
                    end_sample_offset,
                    color,
                });
            }
        }
        r.finish()?;

        Ok(Self { loops })
    }

    fn default_value() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LoopsData {
        let mut data = LoopsData::default();
        data.loops[2] = Some(Loop {
            label: "Break".to_string(),
            start_sample_offset: 100.0,
            end_sample_offset: 88_300.0,
            color: PadColor::new(0x20, 0xc6, 0x7c),
        });
        data
    }

    #[test]
    fn test_round_trip() {
        let data = sample();
        assert_eq!(LoopsData::decode(&data.encode()).unwrap(), data);
    }

    #[test]
    fn test_default_round_trip() {
        let d = LoopsData::default_value();
        assert_eq!(LoopsData::decode(&d.encode()).unwrap(), d);
    }

    #[test]
    fn test_layout_is_uncompressed_little_endian() {
        let blob = LoopsData::default().encode();
        assert_eq!(blob.len(), 8 + 8 * 23);
        assert_eq!(&blob[..8], &8i64.to_le_bytes());
        assert_eq!(&blob[9..17], &(-1.0f64).to_le_bytes());
        assert_eq!(&blob[25..27], &[0, 0]);
    }

    #[test]
    fn test_half_set_loop_decodes_as_unset() {
        let mut blob = LoopsData::default().encode();
        blob[25] = 1;
        let decoded = LoopsData::decode(&blob).unwrap();
        assert!(decoded.loops[0].is_none());
    }

    #[test]
    fn test_bad_flag_is_malformed() {
        let mut blob = LoopsData::default().encode();
        blob[26] = 7;
        assert!(matches!(LoopsData::decode(&blob), Err(CodecError::Invalid { .. })));
    }

    #[test]
    fn test_truncated_is_malformed() {
        let blob = sample().encode();
        assert!(LoopsData::decode(&blob[..blob.len() - 3]).is_err());
    }
}
