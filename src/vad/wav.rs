//! RIFF/WAVE header parsing and writing.
//!
//! The reader consumes the canonical prefix described in the external
//! interfaces section and leaves the input positioned at the first PCM
//! sample byte. All multi-byte fields are little-endian; they are decoded
//! explicitly (`u32::from_le_bytes`, ...) rather than by reinterpreting a
//! byte buffer as a wider integer type, so nothing here needs `unsafe`.

use std::io::{self, Read, Write};

use thiserror::Error;

/// Size in bytes of the canonical header this crate writes for clip files.
pub const HEADER_LEN: usize = 44;

/// Scratch buffer size used to drain `LIST` chunks. Any size works — the
/// bytes are discarded — this one is just large enough to avoid excessive
/// syscalls for typical LIST chunks without over-allocating.
const LIST_SCRATCH_LEN: usize = 256;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("malformed WAV header: {0}")]
    MalformedHeader(&'static str),
    #[error("unknown chunk id {0:?}")]
    UnknownChunk([u8; 4]),
    #[error("short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Immutable record of a parsed (or to-be-written) WAV stream, produced
/// exactly once per stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveFormat {
    pub format_code: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Total RIFF file size field as read from (or to be written to) the header.
    pub file_size: u32,
    /// Declared size of the `data` chunk.
    pub data_size: u32,
}

impl WaveFormat {
    /// Canonical mono/16-bit/16kHz format used for clip files.
    pub fn canonical(sample_rate: u32, data_size: u32) -> Self {
        let block_align = 2u16;
        WaveFormat {
            format_code: 1,
            channels: 1,
            sample_rate,
            avg_bytes_per_sec: sample_rate * block_align as u32,
            block_align,
            bits_per_sample: 16,
            file_size: HEADER_LEN as u32 - 8 + data_size,
            data_size,
        }
    }

}

fn read_exact_or(r: &mut impl Read, buf: &mut [u8]) -> Result<(), WavError> {
    let mut total = 0;
    while total < buf.len() {
        let n = r.read(&mut buf[total..])?;
        if n == 0 {
            return Err(WavError::ShortRead {
                expected: buf.len(),
                got: total,
            });
        }
        total += n;
    }
    Ok(())
}

fn tag4(r: &mut impl Read) -> Result<[u8; 4], WavError> {
    let mut buf = [0u8; 4];
    read_exact_or(r, &mut buf)?;
    Ok(buf)
}

fn u16le(r: &mut impl Read) -> Result<u16, WavError> {
    let mut buf = [0u8; 2];
    read_exact_or(r, &mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn u32le(r: &mut impl Read) -> Result<u32, WavError> {
    let mut buf = [0u8; 4];
    read_exact_or(r, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn expect_tag(r: &mut impl Read, expected: &'static [u8; 4], msg: &'static str) -> Result<(), WavError> {
    let got = tag4(r)?;
    if &got != expected {
        return Err(WavError::MalformedHeader(msg));
    }
    Ok(())
}

/// Consumes the RIFF/WAVE prefix from `r`, leaving it positioned at the
/// first PCM sample byte, and returns the parsed format.
pub fn read_header(r: &mut impl Read) -> Result<WaveFormat, WavError> {
    expect_tag(r, b"RIFF", "missing RIFF tag")?;
    let file_size = u32le(r)?;
    expect_tag(r, b"WAVE", "missing WAVE tag")?;
    expect_tag(r, b"fmt ", "missing fmt  tag")?;

    let fmt_chunk_size = u32le(r)?;
    if fmt_chunk_size != 16 {
        return Err(WavError::MalformedHeader("fmt chunk size must be 16"));
    }
    let format_code = u16le(r)?;
    let channels = u16le(r)?;
    let sample_rate = u32le(r)?;
    let avg_bytes_per_sec = u32le(r)?;
    let block_align = u16le(r)?;
    let bits_per_sample = u16le(r)?;

    let mut scratch = [0u8; LIST_SCRATCH_LEN];
    let data_size = loop {
        let id = tag4(r)?;
        let size = u32le(r)?;
        if &id == b"data" {
            break size;
        } else if &id == b"LIST" {
            let mut remaining = size as usize;
            while remaining > 0 {
                let take = remaining.min(scratch.len());
                read_exact_or(r, &mut scratch[..take])?;
                remaining -= take;
            }
        } else {
            return Err(WavError::UnknownChunk(id));
        }
    };

    Ok(WaveFormat {
        format_code,
        channels,
        sample_rate,
        avg_bytes_per_sec,
        block_align,
        bits_per_sample,
        file_size,
        data_size,
    })
}

/// Writes the fixed 44-byte canonical header for `format` to `w`.
pub fn write_header(w: &mut impl Write, format: &WaveFormat) -> Result<(), io::Error> {
    w.write_all(b"RIFF")?;
    w.write_all(&format.file_size.to_le_bytes())?;
    w.write_all(b"WAVE")?;
    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&format.format_code.to_le_bytes())?;
    w.write_all(&format.channels.to_le_bytes())?;
    w.write_all(&format.sample_rate.to_le_bytes())?;
    w.write_all(&format.avg_bytes_per_sec.to_le_bytes())?;
    w.write_all(&format.block_align.to_le_bytes())?;
    w.write_all(&format.bits_per_sample.to_le_bytes())?;
    w.write_all(b"data")?;
    w.write_all(&format.data_size.to_le_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_format() -> WaveFormat {
        WaveFormat::canonical(16000, 3200)
    }

    #[test]
    fn header_round_trip() {
        let format = sample_format();
        let mut buf = Vec::new();
        write_header(&mut buf, &format).unwrap();
        assert_eq!(buf.len(), HEADER_LEN);
        let mut cursor = Cursor::new(buf);
        let parsed = read_header(&mut cursor).unwrap();
        assert_eq!(parsed, format);
    }

    #[test]
    fn rejects_missing_riff_tag() {
        let mut buf = Vec::new();
        write_header(&mut buf, &sample_format()).unwrap();
        buf[0] = b'X';
        let mut cursor = Cursor::new(buf);
        assert!(matches!(
            read_header(&mut cursor),
            Err(WavError::MalformedHeader(_))
        ));
    }

    #[test]
    fn rejects_fmt_chunk_size_other_than_16() {
        let mut buf = Vec::new();
        write_header(&mut buf, &sample_format()).unwrap();
        buf[16..20].copy_from_slice(&18u32.to_le_bytes());
        let mut cursor = Cursor::new(buf);
        assert!(matches!(
            read_header(&mut cursor),
            Err(WavError::MalformedHeader(_))
        ));
    }

    #[test]
    fn drains_list_chunk_before_data() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&16000u32.to_le_bytes());
        buf.extend_from_slice(&32000u32.to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&16u16.to_le_bytes());
        buf.extend_from_slice(b"LIST");
        let list_payload = vec![0xAAu8; 513]; // larger than the drain scratch buffer
        buf.extend_from_slice(&(list_payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&list_payload);
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(&[1, 2, 3, 4]);

        let mut cursor = Cursor::new(buf);
        let format = read_header(&mut cursor).unwrap();
        assert_eq!(format.data_size, 4);
        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, vec![1, 2, 3, 4]);
    }

    #[test]
    fn unknown_chunk_is_fatal() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&16000u32.to_le_bytes());
        buf.extend_from_slice(&32000u32.to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&16u16.to_le_bytes());
        buf.extend_from_slice(b"xtra");
        buf.extend_from_slice(&0u32.to_le_bytes());

        let mut cursor = Cursor::new(buf);
        assert!(matches!(
            read_header(&mut cursor),
            Err(WavError::UnknownChunk(_))
        ));
    }

}
