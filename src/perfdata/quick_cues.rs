use super::bytes::{BlobReader, BlobWriter};
use super::types::{HotCue, PadColor};
use super::{BlobCodec, CodecError, SLOT_COUNT, envelope};

const KIND: &str = "quick cues";
const UNSET_OFFSET: f64 = -1.0;
const MIN_CUE_LEN: usize = 1 + 8 + 4;

/// Hot cues and main cue positions (`quickCues` column).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuickCuesData {
    pub hot_cues: [Option<HotCue>; SLOT_COUNT],
    pub adjusted_main_cue: f64,
    pub default_main_cue: f64,
}

fn write_color(w: &mut BlobWriter, color: PadColor) {
    w.u8(color.a);
    w.u8(color.r);
    w.u8(color.g);
    w.u8(color.b);
}

fn read_color(r: &mut BlobReader<'_>) -> Result<PadColor, CodecError> {
    Ok(PadColor {
        a: r.u8()?,
        r: r.u8()?,
        g: r.u8()?,
        b: r.u8()?,
    })
}

impl BlobCodec for QuickCuesData {
    const KIND: &'static str = KIND;

    fn encode(&self) -> Vec<u8> {
        let mut w = BlobWriter::with_capacity(8 + SLOT_COUNT * (MIN_CUE_LEN + 16) + 17);
        w.i64_be(SLOT_COUNT as i64);
        for cue in &self.hot_cues {
            match cue {
                Some(cue) => {
                    w.label(&cue.label);
                    w.f64_be(cue.sample_offset);
                    write_color(&mut w, cue.color);
                }
                None => {
                    w.label("");
                    w.f64_be(UNSET_OFFSET);
                    write_color(&mut w, PadColor::default());
                }
            }
        }
        w.f64_be(self.adjusted_main_cue);
        w.bool(self.adjusted_main_cue != self.default_main_cue);
        w.f64_be(self.default_main_cue);
        envelope::compress(&w.into_inner())
    }

    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let raw = envelope::uncompress(data, KIND)?;
        if raw.is_empty() {
            return Ok(Self::default());
        }

        let mut r = BlobReader::new(&raw, KIND);
        let raw_count = r.i64_be()?;
        let count = r.count(raw_count, MIN_CUE_LEN)?;
        if count > SLOT_COUNT {
            return Err(CodecError::invalid(
                KIND,
                format!("{count} hot cues, at most {SLOT_COUNT} allowed"),
            ));
        }

        let mut hot_cues: [Option<HotCue>; SLOT_COUNT] = Default::default();
        for slot in hot_cues.iter_mut().take(count) {
            let label = r.label()?;
            let sample_offset = r.f64_be()?;
            let color = read_color(&mut r)?;
            if sample_offset != UNSET_OFFSET {
                *slot = Some(HotCue {
                    label,
                    sample_offset,
                    color,
                });
            }
        }

        let adjusted_main_cue = r.f64_be()?;
        r.flag("main cue adjusted")?;
        let default_main_cue = r.f64_be()?;
        r.finish()?;

        Ok(Self {
            hot_cues,
            adjusted_main_cue,
            default_main_cue,
        })
    }

    fn default_value() -> Self {
        Self::default()
    }
}
