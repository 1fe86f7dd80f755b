// 2x alias pitch resampler
//
// Converts a block of frames at the root pitch (derived from base_key)
// to a new pitch derived from base_key + tuning, through an intermediate
// 2x-oversampled alias buffer. Pitching down interpolates between
// oversampled neighbors; pitching up copies by nearest index and wraps
// through a reset anchor once the mapped index runs past the buffer,
// trading a phase discontinuity for bounded index growth.

use crate::audio::format::{Buffer, BufferMut, Complex64, SampleBlock, SampleFormat};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Capacity of each alias scratch buffer, in oversampled frames.
pub const MAX_ALIAS_FRAMES: usize = 8192;

/// Vibrato LFO configuration for the resampler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VibratoConfig {
    pub enabled: bool,
    pub gain: f64,
    pub lfo_depth: f64,
    pub lfo_freq: f64,
    pub tuning: f64,
}

impl Default for VibratoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            gain: 1.0,
            lfo_depth: 1.0,
            lfo_freq: 8.172,
            tuning: 0.0,
        }
    }
}

// Linear combination support for the alias buffers. Integer formats go
// through f64 and truncate, like the per-format C-style fixed-point math
// elsewhere in the crate.
trait AliasSample: Copy + Default {
    fn weighted(self, w: f64) -> Self;
    fn plus(self, other: Self) -> Self;
}

macro_rules! impl_alias_sample_int {
    ($($t:ty),*) => {
        $(impl AliasSample for $t {
            fn weighted(self, w: f64) -> Self {
                (self as f64 * w) as $t
            }

            fn plus(self, other: Self) -> Self {
                self.wrapping_add(other)
            }
        })*
    };
}

impl_alias_sample_int!(i8, i16, i32, i64);

impl AliasSample for f32 {
    fn weighted(self, w: f64) -> Self {
        (self as f64 * w) as f32
    }

    fn plus(self, other: Self) -> Self {
        self + other
    }
}

impl AliasSample for f64 {
    fn weighted(self, w: f64) -> Self {
        self * w
    }

    fn plus(self, other: Self) -> Self {
        self + other
    }
}

impl AliasSample for Complex64 {
    fn weighted(self, w: f64) -> Self {
        self.scaled(w)
    }

    fn plus(self, other: Self) -> Self {
        self + other
    }
}

/// Per-chain-node pitch shifter with owned alias scratch buffers
#[derive(Debug)]
pub struct PitchAliasResampler {
    buffer_length: usize,
    format: SampleFormat,
    samplerate: u32,
    base_key: f64,
    tuning: f64,
    pub vibrato: VibratoConfig,
    frame_count: usize,
    offset: u64,
    alias_source: SampleBlock,
    alias_new_source: SampleBlock,
}

impl PitchAliasResampler {
    pub fn new(format: SampleFormat, samplerate: u32) -> Self {
        Self {
            buffer_length: 0,
            format,
            samplerate,
            base_key: 0.0,
            tuning: 0.0,
            vibrato: VibratoConfig::default(),
            frame_count: 0,
            offset: 0,
            alias_source: SampleBlock::zeroed(format, MAX_ALIAS_FRAMES),
            alias_new_source: SampleBlock::zeroed(format, MAX_ALIAS_FRAMES),
        }
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Change the sample format. Reallocates both alias scratch buffers.
    pub fn set_format(&mut self, format: SampleFormat) {
        if format != self.format {
            self.format = format;
            self.alias_source = SampleBlock::zeroed(format, MAX_ALIAS_FRAMES);
            self.alias_new_source = SampleBlock::zeroed(format, MAX_ALIAS_FRAMES);
        }
    }

    pub fn samplerate(&self) -> u32 {
        self.samplerate
    }

    pub fn set_samplerate(&mut self, samplerate: u32) {
        self.samplerate = samplerate;
    }

    pub fn buffer_length(&self) -> usize {
        self.buffer_length
    }

    pub fn set_buffer_length(&mut self, buffer_length: usize) {
        self.buffer_length = buffer_length;
    }

    /// Semitone of the source audio, 48.0 = A4 reference.
    pub fn base_key(&self) -> f64 {
        self.base_key
    }

    pub fn set_base_key(&mut self, base_key: f64) {
        self.base_key = base_key;
    }

    /// Target pitch offset in cents.
    pub fn tuning(&self) -> f64 {
        self.tuning
    }

    pub fn set_tuning(&mut self, tuning: f64) {
        self.tuning = tuning;
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn set_frame_count(&mut self, frame_count: usize) {
        self.frame_count = frame_count;
    }

    /// Running sample-time counter driving the vibrato LFO phase.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// Advance the vibrato phase by one processed block. Callers invoke
    /// this between `pitch()` calls for continuous vibrato.
    pub fn advance_offset(&mut self) {
        self.offset += self.buffer_length as u64;
    }

    /// Pitch-shift `source` into `destination`. Both views must match the
    /// configured format; a mismatch logs a warning and leaves the
    /// destination untouched. Empty buffers are a no-op.
    pub fn pitch(&mut self, source: Buffer<'_>, mut destination: BufferMut<'_>) {
        if source.is_empty() || destination.is_empty() || self.buffer_length == 0 {
            return;
        }

        if source.format() != self.format || destination.format() != self.format {
            log::warn!(
                "pitch alias resampler: unsupported format {} / {} (configured {})",
                source.format(),
                destination.format(),
                self.format
            );
            return;
        }

        let params = PitchParams {
            buffer_length: self
                .buffer_length
                .min(source.len())
                .min(destination.len()),
            samplerate: self.samplerate,
            base_key: self.base_key,
            tuning: self.tuning,
            vibrato: self.vibrato,
            offset: self.offset,
        };

        match (
            source,
            &mut destination,
            &mut self.alias_source,
            &mut self.alias_new_source,
        ) {
            (Buffer::S8(s), BufferMut::S8(d), SampleBlock::S8(a), SampleBlock::S8(b)) => {
                pitch_block(&params, s, d, a, b)
            }
            (Buffer::S16(s), BufferMut::S16(d), SampleBlock::S16(a), SampleBlock::S16(b)) => {
                pitch_block(&params, s, d, a, b)
            }
            (Buffer::S24(s), BufferMut::S24(d), SampleBlock::S24(a), SampleBlock::S24(b)) => {
                pitch_block(&params, s, d, a, b)
            }
            (Buffer::S32(s), BufferMut::S32(d), SampleBlock::S32(a), SampleBlock::S32(b)) => {
                pitch_block(&params, s, d, a, b)
            }
            (Buffer::S64(s), BufferMut::S64(d), SampleBlock::S64(a), SampleBlock::S64(b)) => {
                pitch_block(&params, s, d, a, b)
            }
            (Buffer::F32(s), BufferMut::F32(d), SampleBlock::F32(a), SampleBlock::F32(b)) => {
                pitch_block(&params, s, d, a, b)
            }
            (Buffer::F64(s), BufferMut::F64(d), SampleBlock::F64(a), SampleBlock::F64(b)) => {
                pitch_block(&params, s, d, a, b)
            }
            (
                Buffer::Complex(s),
                BufferMut::Complex(d),
                SampleBlock::Complex(a),
                SampleBlock::Complex(b),
            ) => pitch_block(&params, s, d, a, b),
            _ => {
                log::warn!(
                    "pitch alias resampler: scratch buffers out of sync with format {}",
                    self.format
                );
            }
        }
    }
}

struct PitchParams {
    buffer_length: usize,
    samplerate: u32,
    base_key: f64,
    tuning: f64,
    vibrato: VibratoConfig,
    offset: u64,
}

fn pitch_block<T: AliasSample>(
    params: &PitchParams,
    source: &[T],
    destination: &mut [T],
    alias_source: &mut [T],
    alias_new_source: &mut [T],
) {
    let buffer_length = params.buffer_length;
    let sr = params.samplerate as f64;

    let vibrato_gain = if params.vibrato.enabled {
        params.vibrato.gain
    } else {
        0.0
    };

    let root_pitch_hz = ((params.base_key - 48.0) / 12.0).exp2() * 440.0;

    let cap = (2 * buffer_length).min(MAX_ALIAS_FRAMES);

    // 2x linear-interpolation upsample. The final oversampled pair has no
    // right neighbor and keeps whatever the scratch buffer held.
    for i in 0..cap {
        let t = (i % 2) as f64 / 2.0;

        if i / 2 + 1 < buffer_length {
            alias_source[i] = source[i / 2]
                .plus(source[i / 2 + 1].weighted(t))
                .weighted(1.0 - t);
        }
    }

    let source_freq_period = 2.0 * sr / root_pitch_hz;

    // The vibrato LFO phase is sampled once per call; the caller advances
    // `offset` between calls.
    let vibrato_term = 100.0
        * vibrato_gain
        * (params.offset as f64 * 2.0 * PI * (params.vibrato.lfo_freq * (params.vibrato.tuning / 1200.0).exp2())
            / sr)
            .sin()
        * params.vibrato.lfo_depth;

    let new_pitch_hz =
        ((params.base_key - 48.0 + (params.tuning + vibrato_term) / 100.0) / 12.0).exp2() * 440.0;
    let new_source_freq_period = 2.0 * sr / new_pitch_hz;

    let mut reset_i: i64 = -1;

    for i in 0..cap {
        if source_freq_period < new_source_freq_period {
            // pitching down: interpolate between oversampled neighbors
            let t = (i % (source_freq_period as usize).max(1)) as f64 / new_source_freq_period;
            let j = (i as f64 * (source_freq_period / new_source_freq_period)).floor() as usize;

            if j < 2 * buffer_length {
                alias_new_source[i] = alias_source[i]
                    .weighted(1.0 - t)
                    .plus(alias_source[j.min(cap - 1)].weighted(t));
            }
        } else {
            // pitching up: nearest-index copy, wrapping through reset_i
            let pos = i as f64 * source_freq_period / new_source_freq_period;

            if pos < (2 * buffer_length) as f64 {
                alias_new_source[i] = alias_source[(pos.floor() as usize).min(cap - 1)];
            } else {
                if reset_i == -1 {
                    reset_i = i as i64;
                }

                if i as i64 - reset_i >= reset_i {
                    reset_i = i as i64;
                }

                let k = ((i as i64 - reset_i) as f64 * source_freq_period / new_source_freq_period)
                    .floor() as usize;
                alias_new_source[i] = alias_source[k.min(cap - 1)];
            }
        }
    }

    // downsample: every even-indexed oversampled value
    for i in 0..buffer_length {
        if 2 * i < cap {
            destination[i] = alias_new_source[2 * i];
        }
    }
}
