// Command types - Communication control surface → scheduler

/// Parameter change applied by the scheduler between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineCommand {
    SetBpm(f64),
    SetDelayFactor(f64),
    /// Jump the note offset to an absolute position.
    Seek(u64),
    Start,
    Stop,
}
