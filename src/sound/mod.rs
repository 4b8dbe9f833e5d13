//! WAVE sound decoding
//!
//! # Architecture
//!
//! - `wav_chunks` reads the RIFF header and the `fmt `, `fact` and `data` chunks
//! - `wav_parser` selects a payload parser from the compression type
//! - `adpcm` expands DVI/IMA ADPCM blocks to 16-bit PCM
//! - `wav` ties them together into `WaveDecoder`, a cursor over the decoded
//!   samples that implements the `Decoder` trait

pub mod adpcm;
pub mod decoder;
pub mod formats;
pub mod wav;
pub mod wav_chunks;
pub mod wav_parser;

pub use decoder::{DecodeError, DecodeResult, Decoder};
pub use formats::AudioFormat;
pub use wav::WaveDecoder;
pub use wav_chunks::{RiffHeader, WaveData, WaveFact, WaveFormat};
pub use wav_parser::WavParser;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        let format = AudioFormat::new(WavParser::DviAdpcm.bits_per_sample(), 1, 22050);
        assert_eq!(format.bytes_per_sample(), 2);
        assert_eq!(WavParser::Pcm { bits_per_sample: 24 }.bits_per_sample(), 24);

        let err: DecodeResult<WaveDecoder> = WaveDecoder::from_bytes(b"RIFF");
        assert!(matches!(err, Err(DecodeError::Truncated(_))));
    }
}
