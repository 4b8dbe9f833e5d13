//! Audio output format description

/// Layout of the PCM bytes a decoder hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Bits per single-channel sample
    pub bits_per_sample: u16,
    /// Number of interleaved channels
    pub channels: u16,
    /// Frames per second
    pub sample_rate: u32,
}

impl AudioFormat {
    pub fn new(bits_per_sample: u16, channels: u16, sample_rate: u32) -> Self {
        Self {
            bits_per_sample,
            channels,
            sample_rate,
        }
    }

    /// Returns the number of bytes per single-channel sample
    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample / 8) as usize
    }

    /// Returns the number of bytes per frame (one sample for every channel)
    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_sample() * self.channels as usize
    }

    /// Samples consumed per second of playback, across all channels
    pub fn samples_per_second(&self) -> f64 {
        self.sample_rate as f64 * self.channels as f64
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::new(16, 2, 44100)
    }
}
