//! WAV decoder implementation
//!
//! Decodes WAV (RIFF WAVE) audio files. Supports:
//! - 8, 16, 24 and 32-bit PCM
//! - DVI/IMA ADPCM, expanded to 16-bit PCM
//! - Any channel count and sample rate
//!
//! The whole payload is decoded when the decoder is built; afterwards the
//! decoder is only a cursor over that buffer.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use super::decoder::{DecodeError, DecodeResult, Decoder};
use super::formats::AudioFormat;
use super::wav_chunks::{RiffHeader, RiffReader, WaveData, WaveFact, WaveFormat};
use super::wav_parser::WavParser;
use crate::config::DecoderOptions;

/// Fully decoded WAVE stream with a read cursor
#[derive(Debug)]
pub struct WaveDecoder {
    header: RiffHeader,
    format: WaveFormat,
    fact: Option<WaveFact>,
    data: WaveData,
    /// Output format of `samples`
    audio_format: AudioFormat,
    /// Interleaved little-endian PCM
    samples: Vec<u8>,
    num_samples: usize,
    samples_left: usize,
}

impl WaveDecoder {
    /// Decode a WAVE stream with default options
    pub fn new<R: Read>(source: R) -> DecodeResult<Self> {
        Self::with_options(source, &DecoderOptions::default())
    }

    /// Decode a WAVE stream.
    ///
    /// Reads the RIFF header, `fmt `, `fact` (compressed streams only) and
    /// `data` chunks in that order and decodes the payload.
    pub fn with_options<R: Read>(source: R, options: &DecoderOptions) -> DecodeResult<Self> {
        let skip = options.skip_unknown_chunks;
        let mut reader = RiffReader::new(source);

        let header = RiffHeader::parse(&mut reader)?;
        let format = WaveFormat::parse(&mut reader, skip)?;
        let fact = if format.is_pcm() {
            None
        } else {
            Some(WaveFact::parse(&mut reader, skip)?)
        };
        let data = WaveData::parse(&mut reader, skip)?;

        let size = data.sub_chunk_size as usize;
        if let Some(limit) = options.max_data_bytes {
            if size > limit {
                return Err(DecodeError::InvalidData(format!(
                    "data chunk of {} bytes exceeds the {} byte limit",
                    size, limit
                )));
            }
        }

        let parser = WavParser::for_format(&format)?;
        if format.channels == 0 {
            return Err(DecodeError::InvalidData("zero channels".into()));
        }
        let samples = parser.parse(&mut reader, size, &format)?;

        let audio_format =
            AudioFormat::new(parser.bits_per_sample(), format.channels, format.sample_rate);
        let num_samples = samples.len() / audio_format.bytes_per_sample();

        if let Some(fact) = &fact {
            let frames = samples.len() / audio_format.bytes_per_frame();
            if fact.sample_count as usize != frames {
                log::warn!(
                    "fact chunk declares {} frames but {} were decoded",
                    fact.sample_count,
                    frames
                );
            }
        }

        log::info!(
            "Opened WAVE stream: {:?}, {} Hz, {} ch, {} bit, {} samples",
            parser,
            audio_format.sample_rate,
            audio_format.channels,
            audio_format.bits_per_sample,
            num_samples
        );

        Ok(Self {
            header,
            format,
            fact,
            data,
            audio_format,
            samples,
            num_samples,
            samples_left: num_samples,
        })
    }

    /// Open and decode a file with default options
    pub fn open(path: &Path) -> DecodeResult<Self> {
        Self::open_with_options(path, &DecoderOptions::default())
    }

    pub fn open_with_options(path: &Path, options: &DecoderOptions) -> DecodeResult<Self> {
        log::debug!("Opening {}", path.display());
        let file = File::open(path)?;
        Self::with_options(BufReader::new(file), options)
    }

    /// Decode an in-memory WAVE image
    pub fn from_bytes(bytes: &[u8]) -> DecodeResult<Self> {
        Self::new(bytes)
    }

    pub fn header(&self) -> &RiffHeader {
        &self.header
    }

    /// Parsed `fmt ` chunk, as declared in the file
    pub fn format(&self) -> &WaveFormat {
        &self.format
    }

    pub fn fact(&self) -> Option<&WaveFact> {
        self.fact.as_ref()
    }

    pub fn data(&self) -> &WaveData {
        &self.data
    }

    /// Total decoded samples, across all channels
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn samples_left(&self) -> usize {
        self.samples_left
    }

    /// Length of the whole stream
    pub fn duration(&self) -> Duration {
        self.samples_to_duration(self.num_samples)
    }

    fn samples_to_duration(&self, samples: usize) -> Duration {
        let rate = self.audio_format.samples_per_second();
        if rate == 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(samples as f64 / rate)
    }

    fn consumed(&self) -> usize {
        self.num_samples - self.samples_left
    }
}

impl Decoder for WaveDecoder {
    fn audio_format(&self) -> AudioFormat {
        self.audio_format
    }

    fn is_finished(&self) -> bool {
        self.samples_left == 0
    }

    fn position(&self) -> Duration {
        self.samples_to_duration(self.consumed())
    }

    fn has_position(&self) -> bool {
        true
    }

    fn get_samples(&mut self, samples: usize) -> (Vec<u8>, usize) {
        let count = samples.min(self.samples_left);
        let bytes_per_sample = self.audio_format.bytes_per_sample();
        let offset = self.consumed() * bytes_per_sample;
        let chunk = self.samples[offset..offset + count * bytes_per_sample].to_vec();
        self.samples_left -= count;
        (chunk, count)
    }

    fn try_seek(&mut self, time: Duration) -> bool {
        let target = (time.as_secs_f64() * self.audio_format.samples_per_second()).round();
        let offset = if target.is_finite() {
            (target as usize).min(self.num_samples)
        } else {
            self.num_samples
        };
        self.samples_left = self.num_samples - offset;
        log::debug!("Seek to {:?}: {} samples left", time, self.samples_left);
        true
    }
}
