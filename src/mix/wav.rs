//! In-process mixer for WAV clips.
//!
//! Samples are accumulated as integers at 16-bit scale so the sum is exact and
//! independent of the order clips are added in. The output is 16-bit PCM;
//! samples beyond the 16-bit range are clamped, never rescaled. The timeline is
//! summed and written one chunk at a time, so memory follows the clips rather
//! than the track length.

use async_trait::async_trait;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{RedubError, Result};
use super::{AudioSegment, ClipSource, MixedTrack, TrackMixer};

/// Frames summed per output chunk
const CHUNK_FRAMES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct WavMixer;

impl WavMixer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TrackMixer for WavMixer {
    async fn mix(&self, segments: &[AudioSegment], output: &Path) -> Result<MixedTrack> {
        let segments = segments.to_vec();
        let output = output.to_path_buf();

        tokio::task::spawn_blocking(move || mix_wav(&segments, &output))
            .await
            .map_err(|e| RedubError::Mix(format!("Mixing task failed: {}", e)))?
    }
}

/// Decoded clip at 16-bit scale, interleaved
struct DecodedClip {
    sample_rate: u32,
    channels: u16,
    samples: Vec<i32>,
}

/// Mix WAV segments synchronously
pub fn mix_wav(segments: &[AudioSegment], output: &Path) -> Result<MixedTrack> {
    if segments.is_empty() {
        return Err(RedubError::NoSegments);
    }

    let clips = segments
        .iter()
        .map(|segment| decode(&segment.source).map(|clip| (segment.delay_ms(), clip)))
        .collect::<Result<Vec<_>>>()?;

    let (sample_rate, channels) = (clips[0].1.sample_rate, clips[0].1.channels);
    if let Some((_, odd)) = clips
        .iter()
        .find(|(_, clip)| clip.sample_rate != sample_rate || clip.channels != channels)
    {
        return Err(RedubError::Mix(format!(
            "Clips must share one format: {} Hz/{} ch vs {} Hz/{} ch",
            sample_rate, channels, odd.sample_rate, odd.channels
        )));
    }

    let channels_usize = usize::from(channels);
    let mut placed: Vec<(usize, &[i32])> = clips
        .iter()
        .map(|(delay_ms, clip)| {
            let offset_frames = (delay_ms * u64::from(sample_rate) / 1000) as usize;
            (offset_frames * channels_usize, clip.samples.as_slice())
        })
        .collect();

    let total_samples = placed
        .iter()
        .map(|(offset, samples)| offset + samples.len())
        .max()
        .unwrap_or(0);

    placed.sort_by_key(|(offset, _)| *offset);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(output, spec)?;

    let chunk_len = CHUNK_FRAMES * channels_usize;
    let mut buffer = vec![0i32; chunk_len];
    let mut chunk_start = 0;
    while chunk_start < total_samples {
        let chunk_end = (chunk_start + chunk_len).min(total_samples);
        let window = &mut buffer[..chunk_end - chunk_start];
        window.fill(0);

        for (offset, samples) in placed.iter().take_while(|(offset, _)| *offset < chunk_end) {
            let clip_end = offset + samples.len();
            if clip_end <= chunk_start {
                continue;
            }
            let from = chunk_start.max(*offset);
            let to = chunk_end.min(clip_end);
            let slots = &mut window[from - chunk_start..to - chunk_start];
            for (slot, sample) in slots.iter_mut().zip(&samples[from - offset..to - offset]) {
                *slot = slot.saturating_add(*sample);
            }
        }

        for sample in window.iter() {
            writer.write_sample((*sample).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16)?;
        }
        chunk_start = chunk_end;
    }
    writer.finalize()?;

    let total_frames = (total_samples / channels_usize) as u64;
    let duration_ms = (total_frames * 1000 + u64::from(sample_rate) / 2) / u64::from(sample_rate);

    info!("Mixed {} clips into {} ({} ms)", segments.len(), output.display(), duration_ms);

    Ok(MixedTrack {
        path: PathBuf::from(output),
        duration_ms,
        segment_count: segments.len(),
    })
}

fn decode(source: &ClipSource) -> Result<DecodedClip> {
    match source {
        ClipSource::File(path) => {
            debug!("Decoding clip {}", path.display());
            let reader = hound::WavReader::open(path)
                .map_err(|e| RedubError::Mix(format!("Failed to open {}: {}", path.display(), e)))?;
            read_clip(reader)
        }
        ClipSource::Memory(bytes) => {
            let reader = hound::WavReader::new(Cursor::new(bytes.clone()))
                .map_err(|e| RedubError::Mix(format!("Failed to parse in-memory clip: {}", e)))?;
            read_clip(reader)
        }
    }
}

fn read_clip<R: std::io::Read>(mut reader: hound::WavReader<R>) -> Result<DecodedClip> {
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i32))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| scale_to_16_bit(v, bits)))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok(DecodedClip {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        samples,
    })
}

fn scale_to_16_bit(sample: i32, bits: u16) -> i32 {
    match bits {
        0..=16 => sample << (16 - bits),
        _ => sample >> (bits - 16),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 8_000;

    fn write_clip(dir: &Path, name: &str, duration_ms: u32, value: i16) -> PathBuf {
        let path = dir.join(name);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..(RATE * duration_ms / 1000) {
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    fn read_samples(path: &Path) -> Vec<i16> {
        hound::WavReader::open(path)
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect()
    }

    #[test]
    fn duration_is_latest_clip_end() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_clip(dir.path(), "a.wav", 1_000, 100);
        let b = write_clip(dir.path(), "b.wav", 2_000, 200);

        let track = mix_wav(
            &[AudioSegment::from_file(a, 0, 0), AudioSegment::from_file(b, 500, 1)],
            &dir.path().join("mix.wav"),
        )
        .unwrap();

        assert_eq!(track.duration_ms, 2_500);
        assert_eq!(track.segment_count, 2);
        assert_eq!(read_samples(&track.path).len(), 20_000);
    }

    #[test]
    fn clips_are_delayed_and_summed_without_normalizing() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_clip(dir.path(), "a.wav", 1_000, 100);
        let b = write_clip(dir.path(), "b.wav", 1_000, 200);

        let track = mix_wav(
            &[AudioSegment::from_file(a, 0, 0), AudioSegment::from_file(b, 500, 1)],
            &dir.path().join("mix.wav"),
        )
        .unwrap();
        let samples = read_samples(&track.path);

        assert_eq!(samples[0], 100);
        assert_eq!(samples[3_999], 100);
        // overlap from 500 ms to 1000 ms
        assert_eq!(samples[4_000], 300);
        assert_eq!(samples[7_999], 300);
        assert_eq!(samples[8_000], 200);
        assert_eq!(samples.len(), 12_000);
    }

    #[test]
    fn silence_fills_gaps_and_loud_overlaps_clamp() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_clip(dir.path(), "a.wav", 500, 30_000);
        let b = write_clip(dir.path(), "b.wav", 500, 30_000);
        let c = write_clip(dir.path(), "c.wav", 100, 5);

        let track = mix_wav(
            &[
                AudioSegment::from_file(&a, 0, 0),
                AudioSegment::from_file(&b, 0, 1),
                AudioSegment::from_file(&c, 2_000, 2),
            ],
            &dir.path().join("mix.wav"),
        )
        .unwrap();
        let samples = read_samples(&track.path);

        assert_eq!(samples[0], i16::MAX);
        assert_eq!(samples[10_000], 0);
        assert_eq!(samples[16_000], 5);
        assert_eq!(track.duration_ms, 2_100);
    }

    #[test]
    fn clips_spanning_chunk_edges_are_summed() {
        let dir = tempfile::tempdir().unwrap();
        // 8 s at 8 kHz is frame 64000; the chunk edge sits at frame 65536
        let a = write_clip(dir.path(), "a.wav", 250, 100);
        let b = write_clip(dir.path(), "b.wav", 250, 50);

        let track = mix_wav(
            &[AudioSegment::from_file(&a, 8_000, 0), AudioSegment::from_file(&b, 8_100, 1)],
            &dir.path().join("mix.wav"),
        )
        .unwrap();
        let samples = read_samples(&track.path);

        assert_eq!(samples.len(), 64_800 + 2_000);
        assert_eq!(samples[63_999], 0);
        assert_eq!(samples[64_000], 100);
        assert_eq!(samples[64_799], 100);
        assert_eq!(samples[65_535], 150);
        assert_eq!(samples[65_536], 150);
        assert_eq!(samples[65_999], 150);
        assert_eq!(samples[66_000], 50);
        assert_eq!(samples[66_799], 50);
        assert_eq!(track.duration_ms, 8_350);
    }

    #[test]
    fn order_does_not_matter() {
        let dir = tempfile::tempdir().unwrap();
        let segments = vec![
            AudioSegment::from_file(write_clip(dir.path(), "a.wav", 700, 1_000), 0, 0),
            AudioSegment::from_file(write_clip(dir.path(), "b.wav", 900, -3_000), 400, 1),
            AudioSegment::from_file(write_clip(dir.path(), "c.wav", 300, 7), 1_300, 2),
        ];
        let mut reversed = segments.clone();
        reversed.reverse();

        let first = mix_wav(&segments, &dir.path().join("first.wav")).unwrap();
        let second = mix_wav(&reversed, &dir.path().join("second.wav")).unwrap();

        assert_eq!(first.duration_ms, second.duration_ms);
        assert_eq!(read_samples(&first.path), read_samples(&second.path));
    }

    #[test]
    fn negative_start_plays_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_clip(dir.path(), "a.wav", 250, 42);

        let track = mix_wav(&[AudioSegment::from_file(a, -1_000, 0)], &dir.path().join("mix.wav")).unwrap();
        assert_eq!(track.duration_ms, 250);
        assert_eq!(read_samples(&track.path)[0], 42);
    }

    #[test]
    fn in_memory_clips_mix_like_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_clip(dir.path(), "a.wav", 200, 9);
        let bytes = std::fs::read(&path).unwrap();

        let track = mix_wav(&[AudioSegment::from_bytes(bytes, 100, 0)], &dir.path().join("mix.wav")).unwrap();
        assert_eq!(track.duration_ms, 300);
    }

    #[test]
    fn empty_set_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = mix_wav(&[], &dir.path().join("mix.wav")).unwrap_err();
        assert!(matches!(err, RedubError::NoSegments));
        assert!(!dir.path().join("mix.wav").exists());
    }

    #[test]
    fn mismatched_formats_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_clip(dir.path(), "a.wav", 100, 1);

        let stereo = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&stereo, spec).unwrap();
        writer.write_sample(1i16).unwrap();
        writer.write_sample(1i16).unwrap();
        writer.finalize().unwrap();

        let err = mix_wav(
            &[AudioSegment::from_file(a, 0, 0), AudioSegment::from_file(stereo, 0, 1)],
            &dir.path().join("mix.wav"),
        )
        .unwrap_err();
        assert!(matches!(err, RedubError::Mix(_)));
    }

    #[tokio::test]
    async fn trait_object_mixes() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_clip(dir.path(), "a.wav", 1_000, 1);
        let mixer: Box<dyn TrackMixer> = Box::new(WavMixer::new());

        let track = mixer
            .mix(&[AudioSegment::from_file(a, 0, 0)], &dir.path().join("out/mix.wav"))
            .await
            .unwrap();
        assert_eq!(track.duration_ms, 1_000);
        assert!(track.path.exists());
    }
}
