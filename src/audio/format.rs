// Sample formats and typed buffer views
//
// The DSP routines operate on raw sample buffers in one of eight formats.
// Integer formats accumulate in a wider type and truncate to the format's
// bit width, matching classic fixed-point synth behavior. Complex buffers
// store interleaved (re, im) pairs; waveform writers accumulate into the
// real part.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Sample width of a raw audio buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
    S8,
    S16,
    S24,
    S32,
    S64,
    F32,
    F64,
    Complex,
}

impl SampleFormat {
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleFormat::S8 => 1,
            SampleFormat::S16 => 2,
            SampleFormat::S24 | SampleFormat::S32 | SampleFormat::F32 => 4,
            SampleFormat::S64 | SampleFormat::F64 => 8,
            SampleFormat::Complex => 16,
        }
    }
}

impl Default for SampleFormat {
    fn default() -> Self {
        SampleFormat::F32
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleFormat::S8 => "s8",
            SampleFormat::S16 => "s16",
            SampleFormat::S24 => "s24",
            SampleFormat::S32 => "s32",
            SampleFormat::S64 => "s64",
            SampleFormat::F32 => "f32",
            SampleFormat::F64 => "f64",
            SampleFormat::Complex => "complex",
        };
        write!(f, "{}", name)
    }
}

// Full-scale constants per integer format. S32 keeps the historical
// 214748363.0 constant rather than i32::MAX.
pub(crate) const SCALE_S8: f64 = 127.0;
pub(crate) const SCALE_S16: f64 = 32767.0;
pub(crate) const SCALE_S24: f64 = 8388607.0;
pub(crate) const SCALE_S32: f64 = 214748363.0;
pub(crate) const SCALE_S64: f64 = 9223372036854775807.0;

/// Complex sample value, interleaved re/im
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Complex64 {
    pub re: f64,
    pub im: f64,
}

impl Complex64 {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub fn scaled(self, w: f64) -> Self {
        Self {
            re: self.re * w,
            im: self.im * w,
        }
    }
}

impl Add for Complex64 {
    type Output = Complex64;

    fn add(self, other: Complex64) -> Complex64 {
        Complex64::new(self.re + other.re, self.im + other.im)
    }
}

impl AddAssign for Complex64 {
    fn add_assign(&mut self, other: Complex64) {
        self.re += other.re;
        self.im += other.im;
    }
}

/// Owned sample storage in one format
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBlock {
    S8(Vec<i8>),
    S16(Vec<i16>),
    S24(Vec<i32>),
    S32(Vec<i32>),
    S64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Complex(Vec<Complex64>),
}

impl SampleBlock {
    /// Allocate a zero-filled block of `len` samples.
    pub fn zeroed(format: SampleFormat, len: usize) -> Self {
        match format {
            SampleFormat::S8 => SampleBlock::S8(vec![0; len]),
            SampleFormat::S16 => SampleBlock::S16(vec![0; len]),
            SampleFormat::S24 => SampleBlock::S24(vec![0; len]),
            SampleFormat::S32 => SampleBlock::S32(vec![0; len]),
            SampleFormat::S64 => SampleBlock::S64(vec![0; len]),
            SampleFormat::F32 => SampleBlock::F32(vec![0.0; len]),
            SampleFormat::F64 => SampleBlock::F64(vec![0.0; len]),
            SampleFormat::Complex => SampleBlock::Complex(vec![Complex64::default(); len]),
        }
    }

    pub fn format(&self) -> SampleFormat {
        match self {
            SampleBlock::S8(_) => SampleFormat::S8,
            SampleBlock::S16(_) => SampleFormat::S16,
            SampleBlock::S24(_) => SampleFormat::S24,
            SampleBlock::S32(_) => SampleFormat::S32,
            SampleBlock::S64(_) => SampleFormat::S64,
            SampleBlock::F32(_) => SampleFormat::F32,
            SampleBlock::F64(_) => SampleFormat::F64,
            SampleBlock::Complex(_) => SampleFormat::Complex,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SampleBlock::S8(v) => v.len(),
            SampleBlock::S16(v) => v.len(),
            SampleBlock::S24(v) => v.len(),
            SampleBlock::S32(v) => v.len(),
            SampleBlock::S64(v) => v.len(),
            SampleBlock::F32(v) => v.len(),
            SampleBlock::F64(v) => v.len(),
            SampleBlock::Complex(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reset all samples to zero without reallocating.
    pub fn clear(&mut self) {
        match self {
            SampleBlock::S8(v) => v.fill(0),
            SampleBlock::S16(v) => v.fill(0),
            SampleBlock::S24(v) => v.fill(0),
            SampleBlock::S32(v) => v.fill(0),
            SampleBlock::S64(v) => v.fill(0),
            SampleBlock::F32(v) => v.fill(0.0),
            SampleBlock::F64(v) => v.fill(0.0),
            SampleBlock::Complex(v) => v.fill(Complex64::default()),
        }
    }

    pub fn as_buffer(&self) -> Buffer<'_> {
        match self {
            SampleBlock::S8(v) => Buffer::S8(v),
            SampleBlock::S16(v) => Buffer::S16(v),
            SampleBlock::S24(v) => Buffer::S24(v),
            SampleBlock::S32(v) => Buffer::S32(v),
            SampleBlock::S64(v) => Buffer::S64(v),
            SampleBlock::F32(v) => Buffer::F32(v),
            SampleBlock::F64(v) => Buffer::F64(v),
            SampleBlock::Complex(v) => Buffer::Complex(v),
        }
    }

    pub fn as_buffer_mut(&mut self) -> BufferMut<'_> {
        match self {
            SampleBlock::S8(v) => BufferMut::S8(v),
            SampleBlock::S16(v) => BufferMut::S16(v),
            SampleBlock::S24(v) => BufferMut::S24(v),
            SampleBlock::S32(v) => BufferMut::S32(v),
            SampleBlock::S64(v) => BufferMut::S64(v),
            SampleBlock::F32(v) => BufferMut::F32(v),
            SampleBlock::F64(v) => BufferMut::F64(v),
            SampleBlock::Complex(v) => BufferMut::Complex(v),
        }
    }

    /// Mutable view over the sample range `[start, end)`.
    pub fn range_mut(&mut self, start: usize, end: usize) -> BufferMut<'_> {
        match self {
            SampleBlock::S8(v) => BufferMut::S8(&mut v[start..end]),
            SampleBlock::S16(v) => BufferMut::S16(&mut v[start..end]),
            SampleBlock::S24(v) => BufferMut::S24(&mut v[start..end]),
            SampleBlock::S32(v) => BufferMut::S32(&mut v[start..end]),
            SampleBlock::S64(v) => BufferMut::S64(&mut v[start..end]),
            SampleBlock::F32(v) => BufferMut::F32(&mut v[start..end]),
            SampleBlock::F64(v) => BufferMut::F64(&mut v[start..end]),
            SampleBlock::Complex(v) => BufferMut::Complex(&mut v[start..end]),
        }
    }
}

/// Read-only view over a typed sample slice
#[derive(Debug, Clone, Copy)]
pub enum Buffer<'a> {
    S8(&'a [i8]),
    S16(&'a [i16]),
    S24(&'a [i32]),
    S32(&'a [i32]),
    S64(&'a [i64]),
    F32(&'a [f32]),
    F64(&'a [f64]),
    Complex(&'a [Complex64]),
}

impl<'a> Buffer<'a> {
    pub fn format(&self) -> SampleFormat {
        match self {
            Buffer::S8(_) => SampleFormat::S8,
            Buffer::S16(_) => SampleFormat::S16,
            Buffer::S24(_) => SampleFormat::S24,
            Buffer::S32(_) => SampleFormat::S32,
            Buffer::S64(_) => SampleFormat::S64,
            Buffer::F32(_) => SampleFormat::F32,
            Buffer::F64(_) => SampleFormat::F64,
            Buffer::Complex(_) => SampleFormat::Complex,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Buffer::S8(v) => v.len(),
            Buffer::S16(v) => v.len(),
            Buffer::S24(v) => v.len(),
            Buffer::S32(v) => v.len(),
            Buffer::S64(v) => v.len(),
            Buffer::F32(v) => v.len(),
            Buffer::F64(v) => v.len(),
            Buffer::Complex(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mutable view over a typed sample slice
#[derive(Debug)]
pub enum BufferMut<'a> {
    S8(&'a mut [i8]),
    S16(&'a mut [i16]),
    S24(&'a mut [i32]),
    S32(&'a mut [i32]),
    S64(&'a mut [i64]),
    F32(&'a mut [f32]),
    F64(&'a mut [f64]),
    Complex(&'a mut [Complex64]),
}

impl<'a> BufferMut<'a> {
    pub fn format(&self) -> SampleFormat {
        match self {
            BufferMut::S8(_) => SampleFormat::S8,
            BufferMut::S16(_) => SampleFormat::S16,
            BufferMut::S24(_) => SampleFormat::S24,
            BufferMut::S32(_) => SampleFormat::S32,
            BufferMut::S64(_) => SampleFormat::S64,
            BufferMut::F32(_) => SampleFormat::F32,
            BufferMut::F64(_) => SampleFormat::F64,
            BufferMut::Complex(_) => SampleFormat::Complex,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BufferMut::S8(v) => v.len(),
            BufferMut::S16(v) => v.len(),
            BufferMut::S24(v) => v.len(),
            BufferMut::S32(v) => v.len(),
            BufferMut::S64(v) => v.len(),
            BufferMut::F32(v) => v.len(),
            BufferMut::F64(v) => v.len(),
            BufferMut::Complex(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reborrow the view without consuming it.
    pub fn reborrow(&mut self) -> BufferMut<'_> {
        match self {
            BufferMut::S8(v) => BufferMut::S8(v),
            BufferMut::S16(v) => BufferMut::S16(v),
            BufferMut::S24(v) => BufferMut::S24(v),
            BufferMut::S32(v) => BufferMut::S32(v),
            BufferMut::S64(v) => BufferMut::S64(v),
            BufferMut::F32(v) => BufferMut::F32(v),
            BufferMut::F64(v) => BufferMut::F64(v),
            BufferMut::Complex(v) => BufferMut::Complex(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_per_sample() {
        assert_eq!(SampleFormat::S8.bytes_per_sample(), 1);
        assert_eq!(SampleFormat::S16.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::S24.bytes_per_sample(), 4);
        assert_eq!(SampleFormat::F64.bytes_per_sample(), 8);
        assert_eq!(SampleFormat::Complex.bytes_per_sample(), 16);
    }

    #[test]
    fn test_zeroed_block() {
        let block = SampleBlock::zeroed(SampleFormat::S16, 256);
        assert_eq!(block.format(), SampleFormat::S16);
        assert_eq!(block.len(), 256);

        let block = SampleBlock::zeroed(SampleFormat::Complex, 8);
        match block {
            SampleBlock::Complex(v) => {
                assert!(v.iter().all(|c| c.re == 0.0 && c.im == 0.0));
            }
            _ => panic!("wrong block variant"),
        }
    }

    #[test]
    fn test_block_clear() {
        let mut block = SampleBlock::F32(vec![1.0, -0.5, 0.25]);
        block.clear();
        match block {
            SampleBlock::F32(v) => assert_eq!(v, vec![0.0, 0.0, 0.0]),
            _ => panic!("wrong block variant"),
        }
    }

    #[test]
    fn test_complex_arithmetic() {
        let a = Complex64::new(1.0, 2.0);
        let b = Complex64::new(0.5, -1.0);

        let sum = a + b;
        assert_eq!(sum, Complex64::new(1.5, 1.0));

        let scaled = a.scaled(2.0);
        assert_eq!(scaled, Complex64::new(2.0, 4.0));
    }

    #[test]
    fn test_buffer_views_report_format() {
        let mut block = SampleBlock::zeroed(SampleFormat::S24, 16);
        assert_eq!(block.as_buffer().format(), SampleFormat::S24);
        assert_eq!(block.as_buffer_mut().format(), SampleFormat::S24);
        assert_eq!(block.as_buffer().len(), 16);
    }

    #[test]
    fn test_range_mut() {
        let mut block = SampleBlock::zeroed(SampleFormat::F64, 8);
        let view = block.range_mut(2, 6);
        assert_eq!(view.len(), 4);
    }
}
