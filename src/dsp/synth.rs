// Oscillator block writers
//
// Each writer accumulates `n_frames` of a waveform into an existing
// buffer, starting at `offset`. Integer formats scale to their full-scale
// constants, accumulate in a wider type and truncate to the format's bit
// width. The formulas keep the classic fixed-point synth shapes, including
// the ceil-based phase folding of the sawtooth and triangle writers.

use crate::audio::format::{
    BufferMut, SCALE_S16, SCALE_S24, SCALE_S32, SCALE_S64, SCALE_S8,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Oscillator {
    Sin,
    Sawtooth,
    Triangle,
    Square,
    Impulse,
}

impl Default for Oscillator {
    fn default() -> Self {
        Oscillator::Sin
    }
}

/// Accumulate `value(i)` (a bipolar waveform sample, volume included)
/// into the buffer for `i` in `[offset, offset + n_frames)`.
fn add_block<F>(buf: &mut BufferMut<'_>, offset: usize, n_frames: usize, mut value: F)
where
    F: FnMut(usize) -> f64,
{
    let end = (offset + n_frames).min(buf.len());

    match buf {
        BufferMut::S8(b) => {
            for i in offset..end {
                b[i] = (b[i] as i16).wrapping_add((value(i) * SCALE_S8) as i16) as i8;
            }
        }
        BufferMut::S16(b) => {
            for i in offset..end {
                b[i] = (b[i] as i32).wrapping_add((value(i) * SCALE_S16) as i32) as i16;
            }
        }
        BufferMut::S24(b) => {
            for i in offset..end {
                b[i] = b[i].wrapping_add((value(i) * SCALE_S24) as i32) & 0xffffff;
            }
        }
        BufferMut::S32(b) => {
            for i in offset..end {
                b[i] = (b[i] as i64).wrapping_add((value(i) * SCALE_S32) as i64) as i32;
            }
        }
        BufferMut::S64(b) => {
            for i in offset..end {
                b[i] = b[i].wrapping_add((value(i) * SCALE_S64) as i64);
            }
        }
        BufferMut::F32(b) => {
            for i in offset..end {
                b[i] = (b[i] as f64 + value(i)) as f32;
            }
        }
        BufferMut::F64(b) => {
            for i in offset..end {
                b[i] += value(i);
            }
        }
        BufferMut::Complex(b) => {
            for i in offset..end {
                b[i].re += value(i);
            }
        }
    }
}

/// Multiply the first `n_frames` samples of the buffer by `gain(i)`.
/// Used by the amplitude LFO pass; `i` counts from 0 within the slice.
fn scale_block<F>(buf: &mut BufferMut<'_>, n_frames: usize, mut gain: F)
where
    F: FnMut(usize) -> f64,
{
    let end = n_frames.min(buf.len());

    match buf {
        BufferMut::S8(b) => {
            for i in 0..end {
                b[i] = (b[i] as f64 * gain(i)) as i16 as i8;
            }
        }
        BufferMut::S16(b) => {
            for i in 0..end {
                b[i] = (b[i] as f64 * gain(i)) as i32 as i16;
            }
        }
        BufferMut::S24(b) => {
            for i in 0..end {
                b[i] = ((b[i] as f64 * gain(i)) as i32) & 0xffffff;
            }
        }
        BufferMut::S32(b) => {
            for i in 0..end {
                b[i] = (b[i] as f64 * gain(i)) as i64 as i32;
            }
        }
        BufferMut::S64(b) => {
            for i in 0..end {
                b[i] = (b[i] as f64 * gain(i)) as i64;
            }
        }
        BufferMut::F32(b) => {
            for i in 0..end {
                b[i] = (b[i] as f64 * gain(i)) as f32;
            }
        }
        BufferMut::F64(b) => {
            for i in 0..end {
                b[i] *= gain(i);
            }
        }
        BufferMut::Complex(b) => {
            for i in 0..end {
                let g = gain(i);
                b[i] = b[i].scaled(g);
            }
        }
    }
}

pub fn add_sin(
    buf: &mut BufferMut<'_>,
    freq: f64,
    phase: f64,
    volume: f64,
    samplerate: u32,
    offset: usize,
    n_frames: usize,
) {
    if samplerate == 0 {
        return;
    }

    let sr = samplerate as f64;
    add_block(buf, offset, n_frames, |i| {
        ((i as f64 + phase) * 2.0 * PI * freq / sr).sin() * volume
    });
}

pub fn add_sawtooth(
    buf: &mut BufferMut<'_>,
    freq: f64,
    phase: f64,
    volume: f64,
    samplerate: u32,
    offset: usize,
    n_frames: usize,
) {
    if samplerate == 0 || freq <= 0.0 {
        return;
    }

    let sr = samplerate as f64;
    let folded = ((phase.ceil() as i64) % (freq.ceil() as i64).max(1)) as f64;
    let phase = (folded / freq).ceil() * (sr / freq).ceil();
    let period = ((sr / freq).ceil() as i64).max(1);

    add_block(buf, offset, n_frames, |i| {
        (((((i as f64 + phase).ceil() as i64) % period) as f64 * 2.0 * freq / sr) - 1.0) * volume
    });
}

pub fn add_triangle(
    buf: &mut BufferMut<'_>,
    freq: f64,
    phase: f64,
    volume: f64,
    samplerate: u32,
    offset: usize,
    n_frames: usize,
) {
    if samplerate == 0 || freq <= 0.0 {
        return;
    }

    let sr = samplerate as f64;
    let folded = ((phase.ceil() as i64) % (freq.ceil() as i64).max(1)) as f64;
    let phase = (folded / freq).ceil() * (sr / freq).ceil();

    add_block(buf, offset, n_frames, |i| {
        let p = (phase + i as f64) * freq / sr;
        (p * 2.0 - (p.trunc() / 2.0).trunc() * 2.0 - 1.0) * volume
    });
}

pub fn add_square(
    buf: &mut BufferMut<'_>,
    freq: f64,
    phase: f64,
    volume: f64,
    samplerate: u32,
    offset: usize,
    n_frames: usize,
) {
    if samplerate == 0 {
        return;
    }

    let sr = samplerate as f64;
    add_block(buf, offset, n_frames, |i| {
        if ((i as f64 + phase) * 2.0 * PI * freq / sr).sin() >= 0.0 {
            volume
        } else {
            -volume
        }
    });
}

pub fn add_impulse(
    buf: &mut BufferMut<'_>,
    freq: f64,
    phase: f64,
    volume: f64,
    samplerate: u32,
    offset: usize,
    n_frames: usize,
) {
    if samplerate == 0 {
        return;
    }

    let sr = samplerate as f64;
    let threshold = (2.0 * PI * 3.0 / 5.0).sin();

    add_block(buf, offset, n_frames, |i| {
        if ((i as f64 + phase) * 2.0 * PI * freq / sr).sin() >= threshold {
            volume
        } else {
            -volume
        }
    });
}

/// Dispatch one waveform write by oscillator kind.
pub fn add_oscillator(
    oscillator: Oscillator,
    buf: &mut BufferMut<'_>,
    freq: f64,
    phase: f64,
    volume: f64,
    samplerate: u32,
    offset: usize,
    n_frames: usize,
) {
    match oscillator {
        Oscillator::Sin => add_sin(buf, freq, phase, volume, samplerate, offset, n_frames),
        Oscillator::Sawtooth => add_sawtooth(buf, freq, phase, volume, samplerate, offset, n_frames),
        Oscillator::Triangle => add_triangle(buf, freq, phase, volume, samplerate, offset, n_frames),
        Oscillator::Square => add_square(buf, freq, phase, volume, samplerate, offset, n_frames),
        Oscillator::Impulse => add_impulse(buf, freq, phase, volume, samplerate, offset, n_frames),
    }
}

/// Normalized (volume 1.0) waveform sample at absolute frame `x`.
/// Shared by the FM and amplitude LFO paths.
pub(crate) fn lfo_value(oscillator: Oscillator, x: f64, freq: f64, samplerate: u32) -> f64 {
    if samplerate == 0 || freq <= 0.0 {
        return 0.0;
    }

    let sr = samplerate as f64;
    match oscillator {
        Oscillator::Sin => (x * 2.0 * PI * freq / sr).sin(),
        Oscillator::Sawtooth => {
            let period = ((sr / freq).ceil() as i64).max(1);
            ((x.ceil() as i64 % period) as f64 * 2.0 * freq / sr) - 1.0
        }
        Oscillator::Triangle => {
            let p = x * freq / sr;
            p * 2.0 - (p.trunc() / 2.0).trunc() * 2.0 - 1.0
        }
        Oscillator::Square => {
            if (x * 2.0 * PI * freq / sr).sin() >= 0.0 {
                1.0
            } else {
                -1.0
            }
        }
        Oscillator::Impulse => {
            if (x * 2.0 * PI * freq / sr).sin() >= (2.0 * PI * 3.0 / 5.0).sin() {
                1.0
            } else {
                -1.0
            }
        }
    }
}

/// Amplitude LFO pass over the first `n_frames` samples of the slice.
///
/// The gain at slice index `i` is `tuning / 1200 + wave(offset + i + phase)
/// * depth` where `offset` is the running absolute frame counter.
#[allow(clippy::too_many_arguments)]
pub fn apply_lfo(
    buf: &mut BufferMut<'_>,
    oscillator: Oscillator,
    freq: f64,
    phase: f64,
    depth: f64,
    tuning: f64,
    samplerate: u32,
    offset: u64,
    n_frames: usize,
) {
    if samplerate == 0 || freq <= 0.0 {
        return;
    }

    scale_block(buf, n_frames, |i| {
        tuning / 1200.0 + lfo_value(oscillator, offset as f64 + i as f64 + phase, freq, samplerate) * depth
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::format::Complex64;

    const SAMPLERATE: u32 = 44100;
    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_sin_matches_formula() {
        let mut buf = vec![0.0_f64; 64];
        add_sin(&mut BufferMut::F64(&mut buf), 440.0, 0.0, 1.0, SAMPLERATE, 0, 64);

        for (i, &s) in buf.iter().enumerate() {
            let expected = (i as f64 * 2.0 * PI * 440.0 / SAMPLERATE as f64).sin();
            assert!((s - expected).abs() < EPSILON, "frame {}: {} vs {}", i, s, expected);
        }
    }

    #[test]
    fn test_sin_accumulates() {
        let mut buf = vec![0.5_f64; 8];
        add_sin(&mut BufferMut::F64(&mut buf), 440.0, 0.0, 1.0, SAMPLERATE, 0, 8);
        assert!((buf[0] - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_offset_window_only_written() {
        let mut buf = vec![0.0_f64; 16];
        add_square(&mut BufferMut::F64(&mut buf), 440.0, 10.0, 1.0, SAMPLERATE, 4, 8);

        assert!(buf[..4].iter().all(|&s| s == 0.0));
        assert!(buf[4..12].iter().all(|&s| s != 0.0));
        assert!(buf[12..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_square_is_bipolar_full_scale() {
        let mut buf = vec![0.0_f64; 512];
        add_square(&mut BufferMut::F64(&mut buf), 440.0, 0.0, 0.8, SAMPLERATE, 0, 512);

        for &s in &buf {
            assert!((s - 0.8).abs() < EPSILON || (s + 0.8).abs() < EPSILON);
        }
    }

    #[test]
    fn test_sawtooth_range() {
        let mut buf = vec![0.0_f64; 2048];
        add_sawtooth(&mut BufferMut::F64(&mut buf), 440.0, 0.0, 1.0, SAMPLERATE, 0, 2048);

        for &s in &buf {
            assert!(s >= -1.0 - EPSILON && s <= 1.0 + EPSILON);
        }
    }

    #[test]
    fn test_triangle_range() {
        let mut buf = vec![0.0_f64; 2048];
        add_triangle(&mut BufferMut::F64(&mut buf), 440.0, 0.0, 1.0, SAMPLERATE, 0, 2048);

        for &s in &buf {
            assert!(s >= -1.0 - EPSILON && s <= 1.0 + EPSILON);
        }
    }

    #[test]
    fn test_impulse_is_two_level() {
        let mut buf = vec![0.0_f64; 1024];
        add_impulse(&mut BufferMut::F64(&mut buf), 440.0, 0.0, 1.0, SAMPLERATE, 0, 1024);

        let high = buf.iter().filter(|&&s| (s - 1.0).abs() < EPSILON).count();
        let low = buf.iter().filter(|&&s| (s + 1.0).abs() < EPSILON).count();
        assert_eq!(high + low, buf.len());
        // threshold sits below zero, so the high level dominates the cycle
        assert!(low > 0 && low < high);
    }

    #[test]
    fn test_s16_scaling() {
        let mut buf = vec![0_i16; 32];
        add_square(&mut BufferMut::S16(&mut buf), 440.0, 0.0, 1.0, SAMPLERATE, 0, 32);

        assert_eq!(buf[0], SCALE_S16 as i16);
    }

    #[test]
    fn test_complex_accumulates_real_part() {
        let mut buf = vec![Complex64::default(); 16];
        add_square(&mut BufferMut::Complex(&mut buf), 440.0, 0.0, 1.0, SAMPLERATE, 0, 16);

        assert!((buf[0].re - 1.0).abs() < EPSILON);
        assert_eq!(buf[0].im, 0.0);
    }

    #[test]
    fn test_zero_frames_is_noop() {
        let mut buf = vec![0.25_f64; 8];
        add_sin(&mut BufferMut::F64(&mut buf), 440.0, 0.0, 1.0, SAMPLERATE, 0, 0);
        assert!(buf.iter().all(|&s| (s - 0.25).abs() < EPSILON));
    }

    #[test]
    fn test_apply_lfo_unity_tuning_depth_zero() {
        // tuning of 1200 cents gives a gain baseline of 1.0
        let mut buf = vec![0.5_f64; 64];
        apply_lfo(
            &mut BufferMut::F64(&mut buf),
            Oscillator::Sin,
            6.0,
            0.0,
            0.0,
            1200.0,
            SAMPLERATE,
            0,
            64,
        );
        assert!(buf.iter().all(|&s| (s - 0.5).abs() < EPSILON));
    }

    #[test]
    fn test_apply_lfo_modulates() {
        let mut buf = vec![1.0_f64; 4096];
        apply_lfo(
            &mut BufferMut::F64(&mut buf),
            Oscillator::Sin,
            100.0,
            0.0,
            0.5,
            1200.0,
            SAMPLERATE,
            0,
            4096,
        );

        let min = buf.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = buf.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(min < 0.6 && max > 1.4);
    }
}
