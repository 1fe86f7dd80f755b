// Error taxonomy for the engine core
//
// Only device-layer failures surface as Result errors: they represent
// external conditions that are recoverable by retry (unplugged device,
// busy device). DSP and index routines never fail; they return early and
// log a warning instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    /// The driver layer could not open or read the named device.
    #[error("audio device unavailable: {name}")]
    DeviceUnavailable { name: String },
}

pub type Result<T> = std::result::Result<T, AudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_unavailable_display() {
        let err = AudioError::DeviceUnavailable {
            name: "hw:0,0".to_string(),
        };
        assert_eq!(err.to_string(), "audio device unavailable: hw:0,0");
    }
}
