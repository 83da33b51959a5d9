//! The zlib envelope shared by most performance-data blobs: a 4-byte
//! big-endian uncompressed length followed by a zlib stream.

use byteorder::{BigEndian, ByteOrder};
use miniz_oxide::deflate::compress_to_vec_zlib;
use miniz_oxide::inflate::decompress_to_vec_zlib_with_limit;

use super::CodecError;

const HEADER_LEN: usize = 4;
const COMPRESSION_LEVEL: u8 = 6;

pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; HEADER_LEN];
    BigEndian::write_u32(&mut out, data.len() as u32);
    out.extend(compress_to_vec_zlib(data, COMPRESSION_LEVEL));
    out
}

/// Inverse of [`compress`]. An empty blob yields an empty buffer.
pub fn uncompress(data: &[u8], kind: &'static str) -> Result<Vec<u8>, CodecError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() < HEADER_LEN {
        return Err(CodecError::Envelope {
            kind,
            reason: format!("blob of {} bytes has no length header", data.len()),
        });
    }

    let expected = BigEndian::read_u32(&data[..HEADER_LEN]) as usize;
    let out = decompress_to_vec_zlib_with_limit(&data[HEADER_LEN..], expected).map_err(|e| {
        CodecError::Envelope {
            kind,
            reason: format!("{:?}", e.status),
        }
    })?;
    if out.len() != expected {
        return Err(CodecError::Envelope {
            kind,
            reason: format!("header says {expected} bytes, stream holds {}", out.len()),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_holds_uncompressed_length() {
        let blob = compress(&[7u8; 300]);
        assert_eq!(&blob[..4], &[0, 0, 1, 44]);
        assert_eq!(uncompress(&blob, "test").unwrap(), vec![7u8; 300]);
    }

    #[test]
    fn test_empty_blob_is_empty() {
        assert!(uncompress(&[], "test").unwrap().is_empty());
    }

    #[test]
    fn test_short_blob_is_rejected() {
        assert!(matches!(
            uncompress(&[0, 1], "test"),
            Err(CodecError::Envelope { .. })
        ));
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let mut blob = compress(&[1, 2, 3, 4]);
        blob[3] = 3;
        assert!(uncompress(&blob, "test").is_err());
    }

    #[test]
    fn test_garbage_stream_is_rejected() {
        assert!(uncompress(&[0, 0, 0, 4, 0xde, 0xad, 0xbe, 0xef], "test").is_err());
    }
}
