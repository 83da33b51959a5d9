use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};

use super::CodecError;

/// Append-only writer for fixed-layout blobs.
pub(crate) struct BlobWriter {
    buf: Vec<u8>,
}

impl BlobWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn i32_be(&mut self, value: i32) {
        let mut b = [0u8; 4];
        BigEndian::write_i32(&mut b, value);
        self.buf.extend_from_slice(&b);
    }

    pub fn i32_le(&mut self, value: i32) {
        let mut b = [0u8; 4];
        LittleEndian::write_i32(&mut b, value);
        self.buf.extend_from_slice(&b);
    }

    pub fn i64_be(&mut self, value: i64) {
        let mut b = [0u8; 8];
        BigEndian::write_i64(&mut b, value);
        self.buf.extend_from_slice(&b);
    }

    pub fn i64_le(&mut self, value: i64) {
        let mut b = [0u8; 8];
        LittleEndian::write_i64(&mut b, value);
        self.buf.extend_from_slice(&b);
    }

    pub fn f64_be(&mut self, value: f64) {
        let mut b = [0u8; 8];
        BigEndian::write_f64(&mut b, value);
        self.buf.extend_from_slice(&b);
    }

    pub fn f64_le(&mut self, value: f64) {
        let mut b = [0u8; 8];
        LittleEndian::write_f64(&mut b, value);
        self.buf.extend_from_slice(&b);
    }

    /// Length-prefixed label. Labels longer than 255 bytes are cut at 255.
    pub fn label(&mut self, label: &str) {
        let bytes = label.as_bytes();
        let len = bytes.len().min(u8::MAX as usize);
        self.buf.push(len as u8);
        self.buf.extend_from_slice(&bytes[..len]);
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a blob that reports short reads as [`CodecError::Truncated`].
pub(crate) struct BlobReader<'a> {
    data: &'a [u8],
    kind: &'static str,
}

impl<'a> BlobReader<'a> {
    pub fn new(data: &'a [u8], kind: &'static str) -> Self {
        Self { data, kind }
    }

    fn truncated(&self) -> CodecError {
        CodecError::Truncated { kind: self.kind }
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    pub fn u8(&mut self) -> Result<u8, CodecError> {
        self.data.read_u8().map_err(|_| self.truncated())
    }

    /// A single byte that must be exactly 0 or 1.
    pub fn flag(&mut self, what: &str) -> Result<bool, CodecError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::invalid(
                self.kind,
                format!("{what} flag has value {other}"),
            )),
        }
    }

    pub fn i32_be(&mut self) -> Result<i32, CodecError> {
        self.data.read_i32::<BigEndian>().map_err(|_| self.truncated())
    }

    pub fn i32_le(&mut self) -> Result<i32, CodecError> {
        self.data.read_i32::<LittleEndian>().map_err(|_| self.truncated())
    }

    pub fn i64_be(&mut self) -> Result<i64, CodecError> {
        self.data.read_i64::<BigEndian>().map_err(|_| self.truncated())
    }

    pub fn i64_le(&mut self) -> Result<i64, CodecError> {
        self.data.read_i64::<LittleEndian>().map_err(|_| self.truncated())
    }

    pub fn f64_be(&mut self) -> Result<f64, CodecError> {
        self.data.read_f64::<BigEndian>().map_err(|_| self.truncated())
    }

    pub fn f64_le(&mut self) -> Result<f64, CodecError> {
        self.data.read_f64::<LittleEndian>().map_err(|_| self.truncated())
    }

    /// An element count that must fit in what is left of the blob.
    pub fn count(&mut self, raw: i64, element_size: usize) -> Result<usize, CodecError> {
        let count = usize::try_from(raw)
            .map_err(|_| CodecError::invalid(self.kind, format!("negative count {raw}")))?;
        match count.checked_mul(element_size) {
            Some(needed) if needed <= self.remaining() => Ok(count),
            _ => Err(self.truncated()),
        }
    }

    pub fn label(&mut self) -> Result<String, CodecError> {
        let len = self.u8()? as usize;
        if self.data.len() < len {
            return Err(self.truncated());
        }
        let (raw, rest) = self.data.split_at(len);
        self.data = rest;
        String::from_utf8(raw.to_vec())
            .map_err(|_| CodecError::invalid(self.kind, "label is not valid UTF-8"))
    }

    /// Succeeds only if every byte has been consumed.
    pub fn finish(self) -> Result<(), CodecError> {
        if self.data.is_empty() {
            Ok(())
        } else {
            Err(CodecError::TrailingBytes {
                kind: self.kind,
                count: self.data.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_reports_truncation() {
        let mut r = BlobReader::new(&[1, 2, 3], "test");
        assert_eq!(r.i32_be(), Err(CodecError::Truncated { kind: "test" }));
    }

    #[test]
    fn test_label_is_cut_at_255_bytes() {
        let mut w = BlobWriter::with_capacity(300);
        w.label(&"x".repeat(300));
        let buf = w.into_inner();
        assert_eq!(buf[0], 255);
        assert_eq!(buf.len(), 256);
    }

    #[test]
    fn test_flag_rejects_other_values() {
        let mut r = BlobReader::new(&[2], "test");
        assert!(matches!(r.flag("set"), Err(CodecError::Invalid { .. })));
    }

    #[test]
    fn test_count_must_fit_remaining_bytes() {
        let mut r = BlobReader::new(&[0; 10], "test");
        assert_eq!(r.count(2, 5), Ok(2));
        assert!(r.count(3, 5).is_err());
        assert!(r.count(-1, 5).is_err());
    }

    #[test]
    fn test_finish_rejects_trailing_bytes() {
        let mut r = BlobReader::new(&[0, 0], "test");
        r.u8().unwrap();
        assert_eq!(
            r.finish(),
            Err(CodecError::TrailingBytes { kind: "test", count: 1 })
        );
    }
}
