//! Pull-based decoder interface
//!
//! Defines the `Decoder` trait a playback pipeline uses to pull decoded PCM
//! out of an opened sound, and the error type shared by every decoder.

use std::time::Duration;

use super::formats::AudioFormat;

/// Error type for decoder construction
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Structurally invalid container data
    #[error("Invalid audio data: {0}")]
    InvalidData(String),

    /// A chunk tag did not match the one required at this point
    #[error("Unexpected chunk: expected {expected:?}, found {found:?}")]
    UnexpectedChunk { expected: String, found: String },

    /// The stream ended inside a chunk
    #[error("Truncated stream while reading {0}")]
    Truncated(&'static str),

    /// Compression type or sample layout this decoder cannot produce
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// ADPCM block layout that cannot be decoded
    #[error("Invalid ADPCM block: {0}")]
    InvalidBlock(String),

    /// I/O error while opening the source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for decoder operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Pull interface over a fully opened sound.
///
/// A "sample" here is a single channel value; one frame of stereo audio is
/// two samples. Once a decoder has been constructed none of these calls can
/// fail.
pub trait Decoder: Send {
    /// Output format of the bytes returned by [`Decoder::get_samples`]
    fn audio_format(&self) -> AudioFormat;

    /// Returns true once every sample has been handed out
    fn is_finished(&self) -> bool;

    /// Playback time of the read cursor
    fn position(&self) -> Duration;

    /// Whether [`Decoder::position`] is meaningful for this decoder
    fn has_position(&self) -> bool;

    /// Copy up to `samples` samples out of the decoder.
    ///
    /// Returns the copied bytes together with the number of samples they
    /// hold, which is less than requested at the end of the stream.
    fn get_samples(&mut self, samples: usize) -> (Vec<u8>, usize);

    /// Move the read cursor to `time`, clamping to the stream bounds.
    fn try_seek(&mut self, time: Duration) -> bool;
}
