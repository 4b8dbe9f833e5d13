//! WAVE decoder integration tests
//!
//! These tests build WAVE images in memory (and on disk for `open`) and drive
//! `WaveDecoder` through the public `Decoder` interface.

use std::io::Write;
use std::time::Duration;

use proptest::prelude::*;
use rstest::rstest;

use riffwave::config::DecoderOptions;
use riffwave::sound::{DecodeError, Decoder, WaveDecoder};

/// Builder for synthetic WAVE files
struct WavBuilder {
    audio_format: u16,
    channels: u16,
    sample_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
    fmt_extra: Vec<u8>,
    fact: Option<u32>,
    extra_chunks: Vec<([u8; 4], Vec<u8>)>,
    payload: Vec<u8>,
}

impl WavBuilder {
    fn pcm(channels: u16, sample_rate: u32, bits_per_sample: u16, payload: Vec<u8>) -> Self {
        Self {
            audio_format: 0x0001,
            channels,
            sample_rate,
            block_align: channels * bits_per_sample / 8,
            bits_per_sample,
            fmt_extra: Vec::new(),
            fact: None,
            extra_chunks: Vec::new(),
            payload,
        }
    }

    fn adpcm(channels: u16, sample_rate: u32, block_align: u16, payload: Vec<u8>) -> Self {
        let per_channel = 1 + (block_align as u32 - 4 * channels as u32) * 2 / channels as u32;
        let mut fmt_extra = Vec::new();
        fmt_extra.extend_from_slice(&2u16.to_le_bytes());
        fmt_extra.extend_from_slice(&(per_channel as u16).to_le_bytes());
        Self {
            audio_format: 0x0011,
            channels,
            sample_rate,
            block_align,
            bits_per_sample: 4,
            fmt_extra,
            fact: Some(per_channel * (payload.len() as u32 / block_align as u32)),
            extra_chunks: Vec::new(),
            payload,
        }
    }

    fn audio_format(mut self, code: u16) -> Self {
        self.audio_format = code;
        self
    }

    fn fact(mut self, fact: Option<u32>) -> Self {
        self.fact = fact;
        self
    }

    fn extra_chunk(mut self, id: &[u8; 4], body: &[u8]) -> Self {
        self.extra_chunks.push((*id, body.to_vec()));
        self
    }

    fn build(&self) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"WAVE");

        body.extend_from_slice(b"fmt ");
        body.extend_from_slice(&(16 + self.fmt_extra.len() as u32).to_le_bytes());
        body.extend_from_slice(&self.audio_format.to_le_bytes());
        body.extend_from_slice(&self.channels.to_le_bytes());
        body.extend_from_slice(&self.sample_rate.to_le_bytes());
        let byte_rate = self.sample_rate * self.block_align as u32;
        body.extend_from_slice(&byte_rate.to_le_bytes());
        body.extend_from_slice(&self.block_align.to_le_bytes());
        body.extend_from_slice(&self.bits_per_sample.to_le_bytes());
        body.extend_from_slice(&self.fmt_extra);

        for (id, chunk) in &self.extra_chunks {
            body.extend_from_slice(id);
            body.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
            body.extend_from_slice(chunk);
            if chunk.len() % 2 == 1 {
                body.push(0);
            }
        }

        if let Some(count) = self.fact {
            body.extend_from_slice(b"fact");
            body.extend_from_slice(&4u32.to_le_bytes());
            body.extend_from_slice(&count.to_le_bytes());
        }

        body.extend_from_slice(b"data");
        body.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        body.extend_from_slice(&self.payload);

        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(body.len() as u32).to_le_bytes());
        wav.extend_from_slice(&body);
        wav
    }
}

fn ramp(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 251) as u8).collect()
}

/// One mono ADPCM block: header then `groups` groups of silence codes
fn adpcm_block(predictor: i16, groups: usize) -> Vec<u8> {
    let mut block = Vec::new();
    block.extend_from_slice(&predictor.to_le_bytes());
    block.extend_from_slice(&[0, 0]);
    block.extend(std::iter::repeat(0x08).take(groups * 4));
    block
}

#[test]
fn test_pcm_example_exhausts_in_four_reads() {
    let wav = WavBuilder::pcm(1, 8000, 16, ramp(4000)).build();
    let mut decoder = WaveDecoder::from_bytes(&wav).unwrap();
    assert_eq!(decoder.num_samples(), 2000);

    for i in 0..4 {
        assert!(!decoder.is_finished(), "finished early at read {}", i);
        let (bytes, n) = decoder.get_samples(500);
        assert_eq!(n, 500);
        assert_eq!(bytes.len(), 1000);
    }
    assert!(decoder.is_finished());
    assert_eq!(decoder.position(), Duration::from_millis(250));
}

#[rstest]
#[case(1, 8)]
#[case(2, 8)]
#[case(1, 16)]
#[case(2, 16)]
#[case(2, 24)]
#[case(1, 32)]
fn test_pcm_sample_count(#[case] channels: u16, #[case] bits: u16) {
    let payload = ramp(channels as usize * bits as usize / 8 * 300);
    let wav = WavBuilder::pcm(channels, 11025, bits, payload.clone()).build();
    let decoder = WaveDecoder::from_bytes(&wav).unwrap();

    let format = decoder.audio_format();
    assert_eq!(format.bits_per_sample, bits);
    assert_eq!(format.channels, channels);
    assert_eq!(format.sample_rate, 11025);
    assert_eq!(decoder.num_samples(), payload.len() / (bits as usize / 8));
}

#[test]
fn test_adpcm_output_is_16_bit() {
    let mut payload = adpcm_block(1000, 8);
    payload.extend(adpcm_block(-1000, 8));
    let wav = WavBuilder::adpcm(1, 22050, 36, payload).build();
    let mut decoder = WaveDecoder::from_bytes(&wav).unwrap();

    assert_eq!(decoder.audio_format().bits_per_sample, 16);
    assert_eq!(decoder.format().bits_per_sample, 4);
    assert_eq!(decoder.fact().map(|f| f.sample_count), Some(130));
    assert_eq!(decoder.num_samples(), 130);

    let (bytes, n) = decoder.get_samples(1);
    assert_eq!(n, 1);
    assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), 1000);
}

#[test]
fn test_adpcm_stereo_sample_count() {
    let mut block = Vec::new();
    for predictor in [0i16, 0] {
        block.extend_from_slice(&predictor.to_le_bytes());
        block.extend_from_slice(&[0, 0]);
    }
    block.extend(std::iter::repeat(0u8).take(16));
    let wav = WavBuilder::adpcm(2, 8000, 24, block).build();
    let decoder = WaveDecoder::from_bytes(&wav).unwrap();

    // 1 header sample + 2 groups of 8 codes, per channel
    assert_eq!(decoder.num_samples(), 2 * 17);
    assert_eq!(decoder.audio_format().channels, 2);
}

#[test]
fn test_adpcm_fact_mismatch_uses_decoded_length() {
    let wav = WavBuilder::adpcm(1, 8000, 12, adpcm_block(0, 2))
        .fact(Some(9999))
        .build();
    let decoder = WaveDecoder::from_bytes(&wav).unwrap();
    assert_eq!(decoder.num_samples(), 17);
}

#[test]
fn test_adpcm_without_fact_fails() {
    let wav = WavBuilder::adpcm(1, 8000, 12, adpcm_block(0, 2))
        .fact(None)
        .build();
    assert!(matches!(
        WaveDecoder::from_bytes(&wav),
        Err(DecodeError::UnexpectedChunk { .. })
    ));
}

#[test]
fn test_adpcm_bad_block_align_fails() {
    let wav = WavBuilder::adpcm(2, 8000, 24, vec![0u8; 24]);
    let wav = WavBuilder {
        block_align: 10,
        ..wav
    }
    .build();
    assert!(matches!(
        WaveDecoder::from_bytes(&wav),
        Err(DecodeError::InvalidBlock(_))
    ));
}

#[test]
fn test_malformed_header_fails() {
    let mut wav = WavBuilder::pcm(1, 8000, 16, ramp(16)).build();
    wav[..4].copy_from_slice(b"RIFX");
    assert!(matches!(
        WaveDecoder::from_bytes(&wav),
        Err(DecodeError::UnexpectedChunk { .. })
    ));
}

#[rstest]
#[case(0x0002)]
#[case(0x0003)]
#[case(0x0007)]
#[case(0xfffe)]
fn test_unknown_compression_fails(#[case] code: u16) {
    let wav = WavBuilder::pcm(1, 8000, 16, ramp(16))
        .audio_format(code)
        .fact(Some(8))
        .build();
    assert!(matches!(
        WaveDecoder::from_bytes(&wav),
        Err(DecodeError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_truncated_payload_fails() {
    let wav = WavBuilder::pcm(1, 8000, 16, ramp(400)).build();
    assert!(matches!(
        WaveDecoder::from_bytes(&wav[..wav.len() - 10]),
        Err(DecodeError::Truncated(_))
    ));
}

#[test]
fn test_list_chunk_strict_and_skipped() {
    let wav = WavBuilder::pcm(2, 8000, 16, ramp(64))
        .extra_chunk(b"LIST", b"INFOISFT\x05\x00\x00\x00test\x00")
        .build();

    assert!(WaveDecoder::from_bytes(&wav).is_err());

    let options = DecoderOptions {
        skip_unknown_chunks: true,
        ..DecoderOptions::default()
    };
    let decoder = WaveDecoder::with_options(&wav[..], &options).unwrap();
    assert_eq!(decoder.num_samples(), 32);
}

#[test]
fn test_pcm_fact_chunk_strict_and_skipped() {
    let wav = WavBuilder::pcm(1, 8000, 16, ramp(64)).fact(Some(32)).build();

    assert!(matches!(
        WaveDecoder::from_bytes(&wav),
        Err(DecodeError::UnexpectedChunk { .. })
    ));

    let options = DecoderOptions {
        skip_unknown_chunks: true,
        ..DecoderOptions::default()
    };
    let mut decoder = WaveDecoder::with_options(&wav[..], &options).unwrap();
    assert!(decoder.fact().is_none());
    let (bytes, n) = decoder.get_samples(usize::MAX);
    assert_eq!(n, 32);
    assert_eq!(bytes, ramp(64));
}

#[test]
fn test_open_from_file() {
    let payload = ramp(200);
    let wav = WavBuilder::pcm(2, 44100, 16, payload.clone()).build();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&wav).unwrap();
    file.flush().unwrap();

    let mut decoder = WaveDecoder::open(file.path()).unwrap();
    let (bytes, n) = decoder.get_samples(usize::MAX);
    assert_eq!(n, 100);
    assert_eq!(bytes, payload);
}

#[test]
fn test_open_missing_file() {
    let result = WaveDecoder::open(std::path::Path::new("/nonexistent/missing.wav"));
    assert!(matches!(result, Err(DecodeError::Io(_))));
}

#[test]
fn test_finished_until_seek_backward() {
    let wav = WavBuilder::pcm(1, 100, 8, ramp(100)).build();
    let mut decoder = WaveDecoder::from_bytes(&wav).unwrap();

    decoder.get_samples(100);
    assert!(decoder.is_finished());
    decoder.get_samples(10);
    assert!(decoder.is_finished());

    assert!(decoder.try_seek(Duration::from_millis(500)));
    assert!(!decoder.is_finished());
    assert_eq!(decoder.samples_left(), 50);
}

proptest! {
    #[test]
    fn prop_pcm_reads_reproduce_payload(
        payload in proptest::collection::vec(any::<u8>(), 0..512),
        reads in proptest::collection::vec(1usize..64, 1..32),
    ) {
        let len = payload.len() / 2 * 2;
        let payload = payload[..len].to_vec();
        let wav = WavBuilder::pcm(1, 8000, 16, payload.clone()).build();
        let mut decoder = WaveDecoder::from_bytes(&wav).unwrap();

        let mut collected = Vec::new();
        let mut i = 0;
        while !decoder.is_finished() {
            let request = reads[i % reads.len()];
            let before = decoder.samples_left();
            let (bytes, n) = decoder.get_samples(request);
            prop_assert_eq!(n, request.min(before));
            prop_assert_eq!(bytes.len(), n * 2);
            prop_assert!(decoder.samples_left() <= decoder.num_samples());
            collected.extend(bytes);
            i += 1;
        }
        prop_assert_eq!(collected, payload);
    }

    #[test]
    fn prop_seek_is_idempotent(millis in 0u64..5000, channels in 1u16..3) {
        let wav = WavBuilder::pcm(channels, 1000, 16, vec![0u8; 4000]).build();
        let mut decoder = WaveDecoder::from_bytes(&wav).unwrap();
        let total = decoder.num_samples();
        let time = Duration::from_millis(millis);

        decoder.try_seek(time);
        let first = decoder.samples_left();
        decoder.get_samples(7);
        decoder.try_seek(time);
        prop_assert_eq!(decoder.samples_left(), first);

        let expected = ((millis as usize) * channels as usize).min(total);
        prop_assert_eq!(total - first, expected);
        prop_assert_eq!(
            decoder.position(),
            Duration::from_secs_f64(expected as f64 / (1000.0 * channels as f64))
        );
    }

    #[test]
    fn prop_seek_rounds_to_nearest_sample(
        micros in 0u64..2_000_000,
        rate in prop_oneof![Just(22050u32), Just(44100u32)],
        channels in 1u16..3,
    ) {
        let wav = WavBuilder::pcm(channels, rate, 16, vec![0u8; 100_000]).build();
        let mut decoder = WaveDecoder::from_bytes(&wav).unwrap();
        let total = decoder.num_samples();
        let time = Duration::from_micros(micros);

        decoder.try_seek(time);
        let first = decoder.samples_left();
        decoder.get_samples(5);
        decoder.try_seek(time);
        prop_assert_eq!(decoder.samples_left(), first);

        let exact = time.as_secs_f64() * rate as f64 * channels as f64;
        let expected = (exact.round() as usize).min(total);
        prop_assert_eq!(total - first, expected);
        if expected < total {
            prop_assert!((expected as f64 - exact).abs() <= 0.5);
        }
    }
}
