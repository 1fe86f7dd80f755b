// Sequencer module - musical time, event storage and tick scheduling

pub mod events;
pub mod scheduler;
pub mod timestamp;

pub use events::{
    add_bucket, find_near_timestamp, find_near_timestamp_extended, Event, EventBucket,
    DEFAULT_BUCKET_WIDTH,
};
pub use scheduler::{
    SchedulerConfig, TickScheduler, DEFAULT_BPM, DEFAULT_DELAY_FACTOR, DEFAULT_PERIOD,
};
pub use timestamp::{Timestamp, TimestampMode};
