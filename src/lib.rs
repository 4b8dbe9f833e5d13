// RIFF/WAVE decoding library

pub mod config;
pub mod logging;
pub mod sound;

pub use config::DecoderOptions;
pub use logging::LogLevel;
pub use sound::{DecodeError, Decoder, WaveDecoder};
