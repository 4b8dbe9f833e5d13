//! Sample payload parsers
//!
//! Turns the raw `data` chunk payload into interleaved little-endian PCM.

use std::io::Read;

use super::adpcm;
use super::decoder::{DecodeError, DecodeResult};
use super::wav_chunks::{RiffReader, WaveFormat, WAVE_FORMAT_DVI_ADPCM, WAVE_FORMAT_PCM};

/// Payload encodings this crate can expand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavParser {
    /// Uncompressed PCM, copied through
    Pcm { bits_per_sample: u16 },
    /// DVI/IMA ADPCM, expanded to 16-bit PCM
    DviAdpcm,
}

impl WavParser {
    /// Select the parser for a `fmt ` chunk.
    pub fn for_format(format: &WaveFormat) -> DecodeResult<Self> {
        match format.audio_format {
            WAVE_FORMAT_PCM => match format.bits_per_sample {
                8 | 16 | 24 | 32 => Ok(WavParser::Pcm {
                    bits_per_sample: format.bits_per_sample,
                }),
                bits => Err(DecodeError::UnsupportedFormat(format!(
                    "{} bits per PCM sample",
                    bits
                ))),
            },
            other => Self::for_format_type(other),
        }
    }

    /// Map a compression type code to its parser.
    ///
    /// PCM resolved this way passes 16-bit samples through; use
    /// [`WavParser::for_format`] to honour the declared depth.
    pub fn for_format_type(code: u16) -> DecodeResult<Self> {
        match code {
            WAVE_FORMAT_PCM => Ok(WavParser::Pcm { bits_per_sample: 16 }),
            WAVE_FORMAT_DVI_ADPCM => Ok(WavParser::DviAdpcm),
            other => Err(DecodeError::UnsupportedFormat(format!(
                "compression type 0x{:04x}",
                other
            ))),
        }
    }

    /// Bit depth of the samples [`WavParser::parse`] produces
    pub fn bits_per_sample(&self) -> u16 {
        match self {
            WavParser::Pcm { bits_per_sample } => *bits_per_sample,
            WavParser::DviAdpcm => 16,
        }
    }

    /// Consume `size` payload bytes and return the decoded sample bytes.
    pub fn parse<R: Read>(
        &self,
        reader: &mut RiffReader<R>,
        size: usize,
        format: &WaveFormat,
    ) -> DecodeResult<Vec<u8>> {
        match self {
            WavParser::Pcm { .. } => reader.read_bytes(size, "data chunk"),
            WavParser::DviAdpcm => {
                let raw = reader.read_bytes(size, "data chunk")?;
                decode_dvi_adpcm(&raw, format)
            }
        }
    }
}

fn decode_dvi_adpcm(raw: &[u8], format: &WaveFormat) -> DecodeResult<Vec<u8>> {
    if format.bits_per_sample != 4 {
        return Err(DecodeError::InvalidBlock(format!(
            "{} bits per ADPCM code, expected 4",
            format.bits_per_sample
        )));
    }
    adpcm::validate_layout(format.channels, format.block_align)?;

    let channels = format.channels as usize;
    let block_align = format.block_align as usize;
    let blocks = raw.len().div_ceil(block_align);
    let mut out =
        Vec::with_capacity(blocks * adpcm::samples_per_block(block_align, channels) * channels * 2);

    for block in raw.chunks(block_align) {
        if block.len() < block_align {
            log::debug!(
                "Decoding short final ADPCM block ({} of {} bytes)",
                block.len(),
                block_align
            );
        }
        adpcm::decode_block(block, channels, &mut out)?;
    }
    Ok(out)
}
