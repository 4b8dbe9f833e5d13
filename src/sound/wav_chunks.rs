//! RIFF/WAVE chunk readers
//!
//! Each reader consumes one chunk from a [`RiffReader`] and produces an
//! immutable record of its header fields. All integers are little-endian.
//!
//! ```text
//! "RIFF" <u32 size> "WAVE"
//! "fmt " <u32 size> <u16 type> <u16 channels> <u32 rate> <u32 byte rate>
//!                   <u16 block align> <u16 bits> [extra bytes]
//! "fact" <u32 size> <u32 sample count>          (required for non-PCM)
//! "data" <u32 size> <payload>
//! ```

use std::io::{self, Read};

use super::decoder::{DecodeError, DecodeResult};

/// Four-character chunk identifier
pub type FourCC = [u8; 4];

pub const RIFF_ID: FourCC = *b"RIFF";
pub const WAVE_ID: FourCC = *b"WAVE";
pub const FMT_ID: FourCC = *b"fmt ";
pub const FACT_ID: FourCC = *b"fact";
pub const DATA_ID: FourCC = *b"data";

/// Uncompressed PCM compression code
pub const WAVE_FORMAT_PCM: u16 = 0x0001;
/// DVI/IMA ADPCM compression code
pub const WAVE_FORMAT_DVI_ADPCM: u16 = 0x0011;

const FMT_CORE_SIZE: u32 = 16;
const FACT_CORE_SIZE: u32 = 4;

fn tag_string(tag: &FourCC) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

/// Sequential little-endian reader that tracks its byte offset
pub struct RiffReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> RiffReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    fn read_array<const N: usize>(&mut self, what: &'static str) -> DecodeResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => DecodeError::Truncated(what),
            _ => DecodeError::Io(e),
        })?;
        self.position += N as u64;
        Ok(buf)
    }

    pub fn read_tag(&mut self, what: &'static str) -> DecodeResult<FourCC> {
        self.read_array::<4>(what)
    }

    pub fn read_le_u16(&mut self, what: &'static str) -> DecodeResult<u16> {
        Ok(u16::from_le_bytes(self.read_array(what)?))
    }

    pub fn read_le_u32(&mut self, what: &'static str) -> DecodeResult<u32> {
        Ok(u32::from_le_bytes(self.read_array(what)?))
    }

    /// Read exactly `len` bytes into a fresh buffer.
    ///
    /// The buffer grows with the data actually read, so a lying size field
    /// on a short stream fails as truncated instead of allocating up front.
    pub fn read_bytes(&mut self, len: usize, what: &'static str) -> DecodeResult<Vec<u8>> {
        let mut buf = Vec::new();
        let read = (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut buf)
            .map_err(DecodeError::Io)?;
        self.position += read as u64;
        if read < len {
            return Err(DecodeError::Truncated(what));
        }
        Ok(buf)
    }

    /// Discard `len` bytes
    pub fn skip(&mut self, len: u64, what: &'static str) -> DecodeResult<()> {
        let skipped = io::copy(&mut (&mut self.inner).take(len), &mut io::sink())
            .map_err(DecodeError::Io)?;
        self.position += skipped;
        if skipped < len {
            return Err(DecodeError::Truncated(what));
        }
        Ok(())
    }

    /// Read the next chunk header, requiring `expected` as its tag.
    ///
    /// With `skip_unknown` set, any chunk other than `fmt ` or `data` is
    /// stepped over first (`LIST`, `bext`, a `fact` on a PCM stream, ...).
    /// Returns the declared chunk size.
    pub fn expect_chunk(
        &mut self,
        expected: FourCC,
        what: &'static str,
        skip_unknown: bool,
    ) -> DecodeResult<u32> {
        loop {
            let tag = self.read_tag(what)?;
            let size = self.read_le_u32(what)?;
            if tag == expected {
                return Ok(size);
            }
            if skip_unknown && tag != FMT_ID && tag != DATA_ID {
                log::debug!("Skipping '{}' chunk ({} bytes)", tag_string(&tag), size);
                self.skip(size as u64 + (size as u64 & 1), what)?;
                continue;
            }
            return Err(DecodeError::UnexpectedChunk {
                expected: tag_string(&expected),
                found: tag_string(&tag),
            });
        }
    }
}

/// RIFF container header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiffHeader {
    /// File size minus the 8-byte RIFF preamble
    pub size: u32,
}

impl RiffHeader {
    pub fn parse<R: Read>(reader: &mut RiffReader<R>) -> DecodeResult<Self> {
        let size = reader.expect_chunk(RIFF_ID, "RIFF header", false)?;
        let format = reader.read_tag("RIFF header")?;
        if format != WAVE_ID {
            return Err(DecodeError::UnexpectedChunk {
                expected: tag_string(&WAVE_ID),
                found: tag_string(&format),
            });
        }
        Ok(Self { size })
    }
}

/// `fmt ` chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveFormat {
    /// Declared chunk size
    pub chunk_size: u32,
    /// Compression type code
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    /// Bits per sample as stored in the file
    pub bits_per_sample: u16,
    /// Format bytes past the 16-byte core (`cbSize` and codec fields)
    pub extra: Vec<u8>,
}

impl WaveFormat {
    pub fn parse<R: Read>(reader: &mut RiffReader<R>, skip_unknown: bool) -> DecodeResult<Self> {
        let chunk_size = reader.expect_chunk(FMT_ID, "fmt chunk", skip_unknown)?;
        if chunk_size < FMT_CORE_SIZE {
            return Err(DecodeError::InvalidData(format!(
                "fmt chunk too small: {} bytes",
                chunk_size
            )));
        }

        let audio_format = reader.read_le_u16("fmt chunk")?;
        let channels = reader.read_le_u16("fmt chunk")?;
        let sample_rate = reader.read_le_u32("fmt chunk")?;
        let byte_rate = reader.read_le_u32("fmt chunk")?;
        let block_align = reader.read_le_u16("fmt chunk")?;
        let bits_per_sample = reader.read_le_u16("fmt chunk")?;

        let extra = reader.read_bytes((chunk_size - FMT_CORE_SIZE) as usize, "fmt chunk")?;
        if chunk_size & 1 == 1 {
            reader.skip(1, "fmt chunk")?;
        }

        log::debug!(
            "fmt: type=0x{:04x} channels={} rate={} block_align={} bits={}",
            audio_format,
            channels,
            sample_rate,
            block_align,
            bits_per_sample
        );

        Ok(Self {
            chunk_size,
            audio_format,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            extra,
        })
    }

    pub fn is_pcm(&self) -> bool {
        self.audio_format == WAVE_FORMAT_PCM
    }
}

/// `fact` chunk, carried by compressed streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveFact {
    pub chunk_size: u32,
    /// Sample frames the encoder says the stream holds
    pub sample_count: u32,
}

impl WaveFact {
    pub fn parse<R: Read>(reader: &mut RiffReader<R>, skip_unknown: bool) -> DecodeResult<Self> {
        let chunk_size = reader.expect_chunk(FACT_ID, "fact chunk", skip_unknown)?;
        if chunk_size < FACT_CORE_SIZE {
            return Err(DecodeError::InvalidData(format!(
                "fact chunk too small: {} bytes",
                chunk_size
            )));
        }
        let sample_count = reader.read_le_u32("fact chunk")?;
        let rest = (chunk_size - FACT_CORE_SIZE) as u64 + (chunk_size as u64 & 1);
        reader.skip(rest, "fact chunk")?;
        Ok(Self {
            chunk_size,
            sample_count,
        })
    }
}

/// `data` chunk header; the payload follows it in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveData {
    /// Payload length in bytes
    pub sub_chunk_size: u32,
    /// Stream offset of the first payload byte
    pub position: u64,
}

impl WaveData {
    pub fn parse<R: Read>(reader: &mut RiffReader<R>, skip_unknown: bool) -> DecodeResult<Self> {
        let sub_chunk_size = reader.expect_chunk(DATA_ID, "data chunk", skip_unknown)?;
        Ok(Self {
            sub_chunk_size,
            position: reader.position(),
        })
    }
}
