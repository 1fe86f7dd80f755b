// Audio primitives: formats, block streams, device seam

pub mod device;
pub mod format;
pub mod stream;

pub use device::{AudioDevice, NullDevice};
pub use format::{Buffer, BufferMut, Complex64, SampleBlock, SampleFormat};
pub use stream::{AudioStream, StreamConfig};
