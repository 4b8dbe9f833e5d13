//! DVI/IMA ADPCM block decoder
//!
//! A WAVE IMA ADPCM block starts with one 4-byte header per channel:
//!
//! ```text
//! [2 bytes] initial predictor (i16, little-endian), also the first sample
//! [1 byte ] step table index (0..=88)
//! [1 byte ] reserved
//! ```
//!
//! followed by 4-bit codes. Channels take turns in 4-byte groups, eight codes
//! per group, low nibble first. Every code expands to one 16-bit sample.

use super::decoder::{DecodeError, DecodeResult};

/// Bytes of per-channel header at the start of every block
pub const BLOCK_HEADER_SIZE: usize = 4;

/// Bytes each channel contributes per interleave group
const GROUP_SIZE: usize = 4;

const MAX_STEP_INDEX: i32 = 88;

#[rustfmt::skip]
static STEP_TABLE: [i32; 89] = [
    7, 8, 9, 10, 11, 12, 13, 14,
    16, 17, 19, 21, 23, 25, 28, 31,
    34, 37, 41, 45, 50, 55, 60, 66,
    73, 80, 88, 97, 107, 118, 130, 143,
    157, 173, 190, 209, 230, 253, 279, 307,
    337, 371, 408, 449, 494, 544, 598, 658,
    724, 796, 876, 963, 1060, 1166, 1282, 1411,
    1552, 1707, 1878, 2066, 2272, 2499, 2749, 3024,
    3327, 3660, 4026, 4428, 4871, 5358, 5894, 6484,
    7132, 7845, 8630, 9493, 10442, 11487, 12635, 13899,
    15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794,
    32767,
];

#[rustfmt::skip]
static INDEX_TABLE: [i32; 16] = [
    -1, -1, -1, -1, 2, 4, 6, 8,
    -1, -1, -1, -1, 2, 4, 6, 8,
];

/// Predictor state of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    predictor: i32,
    step_index: i32,
}

impl ChannelState {
    pub fn new(predictor: i16, step_index: u8) -> DecodeResult<Self> {
        if step_index as i32 > MAX_STEP_INDEX {
            return Err(DecodeError::InvalidBlock(format!(
                "step index {} out of range",
                step_index
            )));
        }
        Ok(Self {
            predictor: predictor as i32,
            step_index: step_index as i32,
        })
    }

    /// Expand one 4-bit code into a sample and advance the state.
    pub fn expand(&mut self, code: u8) -> i16 {
        let code = code & 0x0f;
        let step = STEP_TABLE[self.step_index as usize];

        let mut diff = step >> 3;
        if code & 4 != 0 {
            diff += step;
        }
        if code & 2 != 0 {
            diff += step >> 1;
        }
        if code & 1 != 0 {
            diff += step >> 2;
        }

        if code & 8 != 0 {
            self.predictor -= diff;
        } else {
            self.predictor += diff;
        }
        self.predictor = self.predictor.clamp(i16::MIN as i32, i16::MAX as i32);

        self.step_index = (self.step_index + INDEX_TABLE[code as usize]).clamp(0, MAX_STEP_INDEX);

        self.predictor as i16
    }
}

/// Check that `block_align` describes a decodable block for `channels`.
pub fn validate_layout(channels: u16, block_align: u16) -> DecodeResult<()> {
    if channels == 0 {
        return Err(DecodeError::InvalidBlock("zero channels".into()));
    }
    let header = BLOCK_HEADER_SIZE * channels as usize;
    let block_align = block_align as usize;
    if block_align <= header {
        return Err(DecodeError::InvalidBlock(format!(
            "block align {} leaves no room for samples after {} header bytes",
            block_align, header
        )));
    }
    if (block_align - header) % (GROUP_SIZE * channels as usize) != 0 {
        return Err(DecodeError::InvalidBlock(format!(
            "block align {} does not hold whole {}-channel groups",
            block_align, channels
        )));
    }
    Ok(())
}

/// Samples per channel held by a block of `block_len` bytes.
pub fn samples_per_block(block_len: usize, channels: usize) -> usize {
    let header = BLOCK_HEADER_SIZE * channels;
    if block_len < header {
        return 0;
    }
    1 + (block_len - header) / (GROUP_SIZE * channels) * 8
}

/// Decode one block, appending interleaved 16-bit little-endian PCM to `out`.
///
/// A short final block is decoded up to its last whole group round.
pub fn decode_block(block: &[u8], channels: usize, out: &mut Vec<u8>) -> DecodeResult<usize> {
    let header_len = BLOCK_HEADER_SIZE * channels;
    if block.len() < header_len {
        return Err(DecodeError::InvalidBlock(format!(
            "block of {} bytes is shorter than its {}-byte header",
            block.len(),
            header_len
        )));
    }

    let mut states = Vec::with_capacity(channels);
    for header in block[..header_len].chunks_exact(BLOCK_HEADER_SIZE) {
        let predictor = i16::from_le_bytes([header[0], header[1]]);
        states.push(ChannelState::new(predictor, header[2])?);
    }

    let per_channel = samples_per_block(block.len(), channels);
    let rounds = (per_channel - 1) / 8;
    let mut decoded = vec![0i16; per_channel * channels];

    for (ch, state) in states.iter().enumerate() {
        decoded[ch] = state.predictor as i16;
    }

    let groups = &block[header_len..header_len + rounds * GROUP_SIZE * channels];
    for (g, group) in groups.chunks_exact(GROUP_SIZE).enumerate() {
        let round = g / channels;
        let ch = g % channels;
        let state = &mut states[ch];
        for (k, &byte) in group.iter().enumerate() {
            let frame = 1 + round * 8 + k * 2;
            decoded[frame * channels + ch] = state.expand(byte);
            decoded[(frame + 1) * channels + ch] = state.expand(byte >> 4);
        }
    }

    out.reserve(decoded.len() * 2);
    for sample in &decoded {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    Ok(decoded.len())
}
