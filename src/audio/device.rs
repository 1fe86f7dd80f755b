// Device driver seam
//
// Hardware backends (ALSA, OSS, CoreAudio) live outside this crate. The
// scheduler only needs a narrow read contract; a backend that cannot be
// opened or read maps to AudioError::DeviceUnavailable.

use crate::error::{AudioError, Result};

/// Narrow contract the tick scheduler drives a soundcard through.
///
/// Implementors are expected to expose an `open(device_name)`-style
/// constructor that fails with [`AudioError::DeviceUnavailable`] when the
/// backend cannot be reached.
pub trait AudioDevice: Send {
    /// Device name as given at open time.
    fn name(&self) -> &str;

    /// Read up to `buf.len()` frames into `buf`, returning the number of
    /// frames actually read. A failed read maps to `DeviceUnavailable`.
    fn read(&mut self, buf: &mut [f32]) -> Result<usize>;

    fn close(&mut self);
}

/// Always-silent device. Stands in for a not-yet-opened soundcard and
/// keeps tests free of real hardware.
pub struct NullDevice {
    name: String,
    closed: bool,
}

impl NullDevice {
    pub fn open(device_name: &str) -> Result<Self> {
        Ok(Self {
            name: device_name.to_string(),
            closed: false,
        })
    }
}

impl AudioDevice for NullDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buf: &mut [f32]) -> Result<usize> {
        if self.closed {
            return Err(AudioError::DeviceUnavailable {
                name: self.name.clone(),
            });
        }

        buf.fill(0.0);
        Ok(buf.len())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
