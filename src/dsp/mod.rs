// DSP module - oscillators, pitch shifting and note rendering

pub mod generator;
pub mod pitch;
pub mod synth;

pub use generator::{SynthGenerator, SynthParameters, SyncPoint};
pub use pitch::{PitchAliasResampler, VibratoConfig, MAX_ALIAS_FRAMES};
pub use synth::Oscillator;
