// Tactus - Real-time audio sequencing and synthesis core

pub mod audio;
pub mod dsp;
pub mod error;
pub mod messaging;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use audio::device::{AudioDevice, NullDevice};
pub use audio::format::{Buffer, BufferMut, SampleBlock, SampleFormat};
pub use audio::stream::{AudioStream, StreamConfig};
pub use dsp::generator::{SynthGenerator, SynthParameters, SyncPoint};
pub use dsp::pitch::{PitchAliasResampler, VibratoConfig};
pub use dsp::synth::Oscillator;
pub use error::{AudioError, Result};
pub use messaging::channels::{create_command_channel, create_notification_channel};
pub use messaging::{EngineCommand, EngineNotification};
pub use sequencer::{Timestamp, TimestampMode};
pub use sequencer::events::{Event, EventBucket};
pub use sequencer::scheduler::{SchedulerConfig, TickScheduler};
