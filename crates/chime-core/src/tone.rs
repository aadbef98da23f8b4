//! Alarm tone synthesis.
//!
//! Renders the high/low beep pattern to PCM and encodes it as WAV. Tone
//! synthesizer adapters without a native oscillator play the rendered tones,
//! and the embedded-media fallback loops the encoded pattern.

use std::f32::consts::TAU;
use std::io::Cursor;

use crate::alarm::{Tone, Waveform};
use crate::error::AudioError;
use crate::storage::ToneConfig;

/// Level the decay envelope ends at, relative to full scale.
const ENVELOPE_FLOOR: f32 = 0.001;

/// The two tones of one alarm beat: high first, then low.
pub fn alarm_tones(config: &ToneConfig) -> (Tone, Tone) {
    let tone = |frequency_hz| Tone {
        frequency_hz,
        duration_ms: config.duration_ms,
        gain: config.gain,
        waveform: Waveform::Square,
    };
    (tone(config.high_hz), tone(config.low_hz))
}

/// Longest stretch of audio ever rendered in one buffer.
const MAX_RENDER_MS: u64 = 10_000;
const MIN_SAMPLE_RATE: u32 = 8_000;
const MAX_SAMPLE_RATE: u32 = 192_000;

/// The rate actually used for a configured one.
fn output_rate(sample_rate: u32) -> u32 {
    sample_rate.clamp(MIN_SAMPLE_RATE, MAX_SAMPLE_RATE)
}

fn sample_count(ms: u64, sample_rate: u32) -> usize {
    let rate = u64::from(sample_rate.min(MAX_SAMPLE_RATE));
    (rate * ms.min(MAX_RENDER_MS) / 1000) as usize
}

/// Render one tone with an exponential decay from `gain` to near silence.
pub fn render(tone: &Tone, sample_rate: u32) -> Vec<i16> {
    let sample_rate = sample_rate.min(MAX_SAMPLE_RATE);
    let n = sample_count(tone.duration_ms, sample_rate);
    if n == 0 || sample_rate == 0 {
        return Vec::new();
    }
    let gain = tone.gain.clamp(0.0, 1.0);
    (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let phase = (t * tone.frequency_hz).fract();
            let raw = match tone.waveform {
                Waveform::Square => {
                    if phase < 0.5 {
                        1.0
                    } else {
                        -1.0
                    }
                }
                Waveform::Sine => (TAU * phase).sin(),
            };
            let envelope = if gain <= ENVELOPE_FLOOR {
                0.0
            } else {
                gain * (ENVELOPE_FLOOR / gain).powf(i as f32 / n as f32)
            };
            (raw * envelope * f32::from(i16::MAX)) as i16
        })
        .collect()
}

/// Encode mono 16-bit PCM as a WAV file in memory.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// One full beat of the alarm pattern as PCM: high tone, low tone after the
/// gap, silence until the next beat.
pub fn render_pattern(config: &ToneConfig) -> Vec<i16> {
    let (high, low) = alarm_tones(config);
    let rate = output_rate(config.sample_rate);
    let total_ms = config
        .interval_ms
        .max(config.gap_ms.saturating_add(config.duration_ms));
    let mut buffer = vec![0i16; sample_count(total_ms, rate)];

    let mut mix = |offset: usize, samples: Vec<i16>| {
        for (slot, s) in buffer.iter_mut().skip(offset).zip(samples) {
            *slot = slot.saturating_add(s);
        }
    };
    mix(0, render(&high, rate));
    mix(sample_count(config.gap_ms, rate), render(&low, rate));
    buffer
}

/// Minimal looping payload for the embedded-media fallback.
pub fn embedded_payload(config: &ToneConfig) -> Result<Vec<u8>, AudioError> {
    encode_wav(&render_pattern(config), output_rate(config.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_length_matches_duration() {
        let tone = Tone {
            frequency_hz: 1200.0,
            duration_ms: 400,
            gain: 0.5,
            waveform: Waveform::Square,
        };
        assert_eq!(render(&tone, 22_050).len(), 8_820);
    }

    #[test]
    fn square_wave_decays() {
        let tone = Tone {
            frequency_hz: 800.0,
            duration_ms: 400,
            gain: 0.5,
            waveform: Waveform::Square,
        };
        let samples = render(&tone, 8_000);
        let head = samples[..100].iter().map(|s| s.unsigned_abs()).max().unwrap();
        let tail = samples[samples.len() - 100..]
            .iter()
            .map(|s| s.unsigned_abs())
            .max()
            .unwrap();
        assert!(head > 10_000, "head amplitude {head}");
        assert!(tail < head / 10, "tail amplitude {tail}");
    }

    #[test]
    fn zero_gain_is_silent() {
        let tone = Tone {
            frequency_hz: 800.0,
            duration_ms: 10,
            gain: 0.0,
            waveform: Waveform::Sine,
        };
        assert!(render(&tone, 8_000).iter().all(|&s| s == 0));
    }

    #[test]
    fn pattern_spans_one_interval() {
        let config = ToneConfig::default();
        let pcm = render_pattern(&config);
        assert_eq!(pcm.len(), sample_count(1200, config.sample_rate));
        // The tail after both tones is silence.
        assert!(pcm[sample_count(900, config.sample_rate)..].iter().all(|&s| s == 0));
    }

    #[test]
    fn extreme_config_renders_a_bounded_payload() {
        let config = ToneConfig {
            gap_ms: u64::MAX,
            duration_ms: u64::MAX,
            interval_ms: u64::MAX,
            sample_rate: u32::MAX,
            ..ToneConfig::default()
        };
        let pcm = render_pattern(&config);
        assert_eq!(pcm.len(), sample_count(MAX_RENDER_MS, MAX_SAMPLE_RATE));

        let bytes = embedded_payload(&config).unwrap();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, MAX_SAMPLE_RATE);

        let silent = ToneConfig {
            sample_rate: 0,
            ..ToneConfig::default()
        };
        assert!(embedded_payload(&silent).is_ok());
    }

    #[test]
    fn embedded_payload_is_readable_wav() {
        let config = ToneConfig::default();
        let bytes = embedded_payload(&config).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, config.sample_rate);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len() as usize, render_pattern(&config).len());
    }
}
