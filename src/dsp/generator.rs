// Synth generator - renders one note into an audio stream
//
// A generation pass writes `frame_count` oscillator frames into a stream
// of fixed-size blocks, extending the stream first when it is too short.
// Phase is re-derived from the absolute written position after every
// block rather than accumulated, so a frequency change between passes
// does not compound phase error.

use crate::audio::stream::AudioStream;
use crate::audio::format::SampleFormat;
use crate::dsp::synth::{self, Oscillator};
use serde::{Deserialize, Serialize};

/// Authored phase re-alignment: after `frame_offset` frames since the
/// previous sync, force the oscillator phase to `phase`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncPoint {
    pub frame_offset: u64,
    pub phase: f64,
}

/// One generation pass worth of configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthParameters {
    pub samplerate: u32,
    pub buffer_size: usize,
    pub format: SampleFormat,
    pub oscillator: Oscillator,
    /// Base frequency in Hz before the note offset is applied.
    pub frequency: f64,
    /// Initial phase in samples.
    pub phase: f64,
    /// Linear gain, 0.0..=2.0.
    pub volume: f64,
    pub do_lfo: bool,
    pub lfo_oscillator: Oscillator,
    pub lfo_freq: f64,
    pub lfo_depth: f64,
    /// Pitch offset in cents, also fed to the amplitude LFO gain term.
    pub tuning: f64,
    pub do_fm_synth: bool,
    pub fm_lfo_oscillator: Oscillator,
    pub fm_lfo_frequency: f64,
    pub fm_lfo_depth: f64,
    /// Constant FM pitch offset in cents.
    pub fm_tuning: f64,
    pub frame_count: usize,
    /// Start offset in frames within the first written block.
    pub attack: usize,
    /// Start offset in whole buffers; the fractional part is ignored when
    /// positioning, matching the floor() placement of writes.
    pub delay: f64,
    pub loop_start: u64,
    pub loop_end: u64,
    pub sync_points: Vec<SyncPoint>,
}

impl Default for SynthParameters {
    fn default() -> Self {
        Self {
            samplerate: 44100,
            buffer_size: 1024,
            format: SampleFormat::F32,
            oscillator: Oscillator::Sin,
            frequency: 440.0,
            phase: 0.0,
            volume: 1.0,
            do_lfo: false,
            lfo_oscillator: Oscillator::Sin,
            lfo_freq: 6.0,
            lfo_depth: 0.0,
            tuning: 0.0,
            do_fm_synth: false,
            fm_lfo_oscillator: Oscillator::Sin,
            fm_lfo_frequency: 6.0,
            fm_lfo_depth: 0.0,
            fm_tuning: 0.0,
            frame_count: 0,
            attack: 0,
            delay: 0.0,
            loop_start: 0,
            loop_end: 0,
            sync_points: Vec::new(),
        }
    }
}

/// Renders oscillator waveforms into audio streams
#[derive(Debug, Clone, Default)]
pub struct SynthGenerator {
    pub params: SynthParameters,
}

impl SynthGenerator {
    pub fn new(params: SynthParameters) -> Self {
        Self { params }
    }

    /// Frame capacity the stream needs for this pass.
    fn requested_frame_count(&self) -> usize {
        let p = &self.params;
        let frames = p.delay.floor() as usize * p.buffer_size + p.attack + p.frame_count;
        (frames as f64 / p.buffer_size as f64).ceil() as usize * p.buffer_size
    }

    /// Generate `frame_count` frames of the configured oscillator for
    /// `note` (semitone offset against the 48-key reference) into
    /// `stream`, starting at frame `floor(delay) * buffer_size + attack`.
    /// The stream is extended with zero-filled blocks when too short.
    pub fn compute(&self, stream: &mut AudioStream, note: f64) {
        let p = &self.params;

        if p.frame_count == 0 || p.buffer_size == 0 {
            return;
        }

        let requested = self.requested_frame_count();
        if stream.frame_count() < requested {
            stream.resize_blocks(requested / p.buffer_size);
        }

        stream.loop_start = p.loop_start;
        stream.loop_end = p.loop_end;
        stream.last_frame = (p.attack + p.frame_count) as u64;

        let current_frequency = p.frequency * ((note + 48.0) / 12.0).exp2() * (p.tuning / 1200.0).exp2();
        if current_frequency <= 0.0 {
            log::warn!("synth generator: non-positive frequency, skipping pass");
            return;
        }

        let period = (p.samplerate as f64 / current_frequency).floor();

        let start_frame = p.delay.floor() as usize * p.buffer_size + p.attack;

        let mut written: usize = 0;
        let mut phase_anchor_frame: u64 = 0;
        let mut phase_anchor_value: f64 = p.phase;
        let mut sync_index: usize = 0;
        let mut last_sync: u64 = 0;

        while written < p.frame_count {
            let abs_frame = start_frame + written;
            let block_index = abs_frame / p.buffer_size;
            let local_start = abs_frame % p.buffer_size;
            let mut count = (p.buffer_size - local_start).min(p.frame_count - written);

            // shorten the write so the next one starts on the sync frame
            if !p.sync_points.is_empty() {
                let next_sync = last_sync + p.sync_points[sync_index].frame_offset;
                if (written as u64) < next_sync && (written + count) as u64 > next_sync {
                    count = (next_sync - written as u64) as usize;
                }
            }

            // phase for this block, relative to the last anchor
            let mut phase = phase_anchor_value + (written as u64 - phase_anchor_frame) as f64;
            if period >= 1.0 {
                phase %= period;
            }

            // a sync point reached by this block forces the phase now
            if !p.sync_points.is_empty() {
                let next_sync = last_sync + p.sync_points[sync_index].frame_offset;
                if written as u64 >= next_sync {
                    phase = p.sync_points[sync_index].phase;
                    phase_anchor_frame = written as u64;
                    phase_anchor_value = phase;
                    last_sync = next_sync;

                    sync_index += 1;
                    if sync_index >= p.sync_points.len()
                        || p.sync_points[sync_index].frame_offset == 0
                    {
                        sync_index = 0;
                    }
                }
            }

            let freq = if p.do_fm_synth {
                self.fm_frequency(current_frequency, abs_frame as f64)
            } else {
                current_frequency
            };

            let block = match stream.nth_block_mut(block_index) {
                Some(block) => block,
                None => break,
            };

            let mut view = block.range_mut(local_start, local_start + count);
            synth::add_oscillator(
                p.oscillator,
                &mut view,
                freq,
                phase,
                p.volume,
                p.samplerate,
                0,
                count,
            );

            if p.do_lfo {
                let mut view = block.range_mut(local_start, local_start + count);
                synth::apply_lfo(
                    &mut view,
                    p.lfo_oscillator,
                    p.lfo_freq,
                    0.0,
                    p.lfo_depth,
                    p.tuning,
                    p.samplerate,
                    written as u64,
                    count,
                );
            }

            written += count;
        }
    }

    /// Instantaneous frequency under FM: the carrier shifted by
    /// `fm_tuning` cents, modulated by the FM LFO sampled at the block
    /// start.
    fn fm_frequency(&self, current_frequency: f64, frame: f64) -> f64 {
        let p = &self.params;

        if p.fm_lfo_frequency <= 0.0 {
            log::warn!("synth generator: degenerate FM LFO frequency, carrier unmodulated");
            return current_frequency;
        }

        let carrier = current_frequency * (p.fm_tuning / 1200.0).exp2();
        let lfo = synth::lfo_value(p.fm_lfo_oscillator, frame, p.fm_lfo_frequency, p.samplerate);
        carrier * (1.0 + p.fm_lfo_depth * lfo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::format::SampleBlock;
    use crate::audio::stream::StreamConfig;
    use std::f64::consts::PI;

    const EPSILON: f64 = 1e-6;

    fn stream_with(buffer_size: usize) -> AudioStream {
        AudioStream::new(StreamConfig {
            samplerate: 44100,
            buffer_size,
            format: SampleFormat::F64,
        })
    }

    fn params(buffer_size: usize, frame_count: usize) -> SynthParameters {
        SynthParameters {
            buffer_size,
            frame_count,
            format: SampleFormat::F64,
            ..SynthParameters::default()
        }
    }

    fn collect_frames(stream: &AudioStream) -> Vec<f64> {
        let mut out = Vec::new();
        for b in 0..stream.length() {
            match stream.nth_block(b).unwrap() {
                SampleBlock::F64(v) => out.extend_from_slice(v),
                _ => panic!("wrong block format"),
            }
        }
        out
    }

    #[test]
    fn test_stream_extension() {
        let mut stream = stream_with(4);
        let generator = SynthGenerator::new(params(4, 8));

        generator.compute(&mut stream, -48.0);

        assert_eq!(stream.length(), 2);
        assert_eq!(stream.frame_count(), 8);
        assert_eq!(stream.last_frame, 8);
    }

    #[test]
    fn test_sin_440_end_to_end() {
        let mut stream = stream_with(4);
        let generator = SynthGenerator::new(params(4, 8));

        // note -48 leaves the configured 440 Hz untransposed
        generator.compute(&mut stream, -48.0);

        let frames = collect_frames(&stream);
        assert_eq!(frames.len(), 8);
        for (i, &s) in frames.iter().enumerate() {
            let expected = (i as f64 * 2.0 * PI * 440.0 / 44100.0).sin();
            assert!(
                (s - expected).abs() < 1e-3,
                "frame {}: {} vs {}",
                i,
                s,
                expected
            );
        }
    }

    #[test]
    fn test_deterministic_output() {
        let generator = SynthGenerator::new(SynthParameters {
            frequency: 220.0,
            do_fm_synth: true,
            fm_lfo_depth: 0.2,
            ..params(16, 64)
        });

        let mut first = stream_with(16);
        generator.compute(&mut first, -48.0);

        let mut second = stream_with(16);
        generator.compute(&mut second, -48.0);

        assert_eq!(collect_frames(&first), collect_frames(&second));
    }

    #[test]
    fn test_attack_offsets_write() {
        let mut stream = stream_with(8);
        let generator = SynthGenerator::new(SynthParameters {
            attack: 3,
            oscillator: Oscillator::Square,
            ..params(8, 4)
        });

        generator.compute(&mut stream, -48.0);

        let frames = collect_frames(&stream);
        assert_eq!(frames.len(), 8);
        assert!(frames[..3].iter().all(|&s| s == 0.0));
        assert!(frames[3..7].iter().all(|&s| s != 0.0));
        assert!(frames[7] == 0.0);
    }

    #[test]
    fn test_delay_offsets_write_by_whole_buffers() {
        let mut stream = stream_with(4);
        let generator = SynthGenerator::new(SynthParameters {
            delay: 2.7,
            oscillator: Oscillator::Square,
            ..params(4, 4)
        });

        generator.compute(&mut stream, -48.0);

        let frames = collect_frames(&stream);
        assert_eq!(frames.len(), 12);
        assert!(frames[..8].iter().all(|&s| s == 0.0));
        assert!(frames[8..].iter().all(|&s| s != 0.0));
    }

    #[test]
    fn test_zero_frame_count_is_noop() {
        let mut stream = stream_with(4);
        let generator = SynthGenerator::new(params(4, 0));

        generator.compute(&mut stream, -48.0);
        assert_eq!(stream.length(), 0);
    }

    #[test]
    fn test_existing_stream_not_shrunk() {
        let mut stream = stream_with(4);
        stream.resize_blocks(5);

        let generator = SynthGenerator::new(params(4, 8));
        generator.compute(&mut stream, -48.0);
        assert_eq!(stream.length(), 5);
    }

    #[test]
    fn test_sync_point_forces_phase() {
        // one sync point at frame 4 forcing phase back to 0 makes the
        // second half repeat the first half exactly
        let mut synced = stream_with(4);
        let generator = SynthGenerator::new(SynthParameters {
            sync_points: vec![SyncPoint {
                frame_offset: 4,
                phase: 0.0,
            }],
            ..params(4, 8)
        });
        generator.compute(&mut synced, -48.0);

        let frames = collect_frames(&synced);
        for i in 0..4 {
            assert!(
                (frames[i] - frames[i + 4]).abs() < EPSILON,
                "frame {}: {} vs {}",
                i,
                frames[i],
                frames[i + 4]
            );
        }
    }

    #[test]
    fn test_note_transposition() {
        // note -36 is one octave above the -48 reference
        let mut reference = stream_with(64);
        let generator = SynthGenerator::new(SynthParameters {
            frequency: 880.0,
            ..params(64, 64)
        });
        generator.compute(&mut reference, -48.0);

        let mut transposed = stream_with(64);
        let generator = SynthGenerator::new(SynthParameters {
            frequency: 440.0,
            ..params(64, 64)
        });
        generator.compute(&mut transposed, -36.0);

        let a = collect_frames(&reference);
        let b = collect_frames(&transposed);
        for i in 0..64 {
            assert!((a[i] - b[i]).abs() < EPSILON);
        }
    }

    #[test]
    fn test_fm_changes_output() {
        let mut plain = stream_with(64);
        SynthGenerator::new(params(64, 64)).compute(&mut plain, -48.0);

        let mut modulated = stream_with(64);
        SynthGenerator::new(SynthParameters {
            do_fm_synth: true,
            fm_lfo_frequency: 100.0,
            fm_lfo_depth: 0.5,
            ..params(64, 64)
        })
        .compute(&mut modulated, -48.0);

        assert_ne!(collect_frames(&plain), collect_frames(&modulated));
    }
}
