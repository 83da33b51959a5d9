use super::bytes::{BlobReader, BlobWriter};
use super::types::{MusicalKey, SamplingInfo};
use super::{BlobCodec, CodecError, envelope};

const KIND: &str = "track data";
const UNCOMPRESSED_LEN: usize = 28;

/// Track-level analysis summary (`trackData` column).
///
/// Zero is the on-disk "unset" value for every field, so a sampling info
/// with a zero sample rate and sample count is indistinguishable from none.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackData {
    pub sampling: Option<SamplingInfo>,
    pub average_loudness: Option<f64>,
    pub key: Option<MusicalKey>,
}

impl BlobCodec for TrackData {
    const KIND: &'static str = KIND;

    fn encode(&self) -> Vec<u8> {
        let mut w = BlobWriter::with_capacity(UNCOMPRESSED_LEN);
        w.f64_be(self.sampling.map_or(0.0, |s| s.sample_rate));
        w.f64_be(self.sampling.map_or(0.0, |s| s.sample_count as f64));
        w.f64_be(self.average_loudness.unwrap_or(0.0));
        w.i32_be(self.key.map_or(0, MusicalKey::as_i32));
        envelope::compress(&w.into_inner())
    }

    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let raw = envelope::uncompress(data, KIND)?;
        if raw.is_empty() {
            return Ok(Self::default());
        }
        if raw.len() != UNCOMPRESSED_LEN {
            return Err(CodecError::invalid(
                KIND,
                format!("expected {UNCOMPRESSED_LEN} bytes, got {}", raw.len()),
            ));
        }

        let mut r = BlobReader::new(&raw, KIND);
        let sample_rate = r.f64_be()?;
        let sample_count = r.f64_be()?;
        let average_loudness = r.f64_be()?;
        let raw_key = r.i32_be()?;
        r.finish()?;

        let key = match raw_key {
            0 => None,
            k => Some(MusicalKey::from_i64(k as i64).ok_or_else(|| {
                CodecError::invalid(KIND, format!("key {k} is out of range"))
            })?),
        };

        Ok(Self {
            sampling: (sample_rate != 0.0 || sample_count != 0.0).then(|| SamplingInfo {
                sample_rate,
                sample_count: sample_count as i64,
            }),
            average_loudness: (average_loudness != 0.0).then_some(average_loudness),
            key,
        })
    }

    fn default_value() -> Self {
        Self::default()
    }
}
