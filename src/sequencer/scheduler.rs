// Tick scheduler - per-device delay counter and rotating buffers
//
// The device I/O loop drives this once per audio period. Each tic adds
// one period to a fractional delay accumulator; when a full tact worth
// of periods has elapsed the musical note offset advances and the
// residual fraction carries over, so non-integer periods-per-tact
// ratios never drift.
//
// Lock discipline: the device-wide state lock guards every counter and
// the active slot index; each of the four rotating buffers carries its
// own lock so a consumer copying out of slot K never blocks the
// producer filling slot K+1.

use crate::audio::device::AudioDevice;
use crate::audio::format::SampleFormat;
use crate::error::Result;
use crate::messaging::channels::{CommandConsumer, NotificationProducer};
use crate::messaging::command::EngineCommand;
use crate::messaging::notification::EngineNotification;
use ringbuf::traits::{Consumer, Producer};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// Length of the bounded tic counter, beats per modular period.
pub const DEFAULT_PERIOD: u32 = 64;

pub const DEFAULT_BPM: f64 = 120.0;

/// Tact segmentation factor, 1/4 by default.
pub const DEFAULT_DELAY_FACTOR: f64 = 0.25;

/// Device-level audio parameters the delay derivation reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub samplerate: u32,
    pub buffer_size: usize,
    pub format: SampleFormat,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            samplerate: 44100,
            buffer_size: 1024,
            format: SampleFormat::F32,
        }
    }
}

/// Counters and device handle guarded by the device-wide lock.
struct DeviceState {
    bpm: f64,
    delay_factor: f64,
    /// Periods per note offset advance, derived from bpm and config.
    delay: f64,
    delay_counter: f64,
    tact_counter: f64,
    tic_counter: u32,
    note_offset: u64,
    note_offset_absolute: u64,
    start_note_offset: u64,
    do_loop: bool,
    loop_left: u64,
    loop_right: u64,
    running: bool,
    active: usize,
    device: Option<Box<dyn AudioDevice>>,
}

/// Drives a device's note offset and rotating I/O buffers.
pub struct TickScheduler {
    config: SchedulerConfig,
    state: Mutex<DeviceState>,
    slots: [Mutex<Vec<f32>>; 4],
    notifier: Mutex<Option<NotificationProducer>>,
}

fn compute_delay(config: &SchedulerConfig, bpm: f64, delay_factor: f64) -> f64 {
    let periods_per_second = config.samplerate as f64 / config.buffer_size as f64;
    60.0 * (periods_per_second / bpm) * ((1.0 / 16.0) * (1.0 / delay_factor))
}

impl TickScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let delay = compute_delay(&config, DEFAULT_BPM, DEFAULT_DELAY_FACTOR);

        Self {
            config,
            state: Mutex::new(DeviceState {
                bpm: DEFAULT_BPM,
                delay_factor: DEFAULT_DELAY_FACTOR,
                delay,
                delay_counter: 0.0,
                tact_counter: 0.0,
                tic_counter: 0,
                note_offset: 0,
                note_offset_absolute: 0,
                start_note_offset: 0,
                do_loop: false,
                loop_left: 0,
                loop_right: 0,
                running: true,
                active: 0,
                device: None,
            }),
            slots: [
                Mutex::new(Vec::new()),
                Mutex::new(Vec::new()),
                Mutex::new(Vec::new()),
                Mutex::new(Vec::new()),
            ],
            notifier: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, DeviceState> {
        // a poisoned lock only means a panicking holder, the counters
        // stay usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn slot(&self, index: usize) -> MutexGuard<'_, Vec<f32>> {
        self.slots[index % 4].lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, notification: EngineNotification) {
        let mut notifier = self.notifier.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(producer) = notifier.as_mut() {
            if producer.try_push(notification).is_err() {
                log::warn!("notification channel full, dropping {:?}", notification);
            }
        }
    }

    /// Route notifications into the given producer half.
    pub fn register_notifier(&self, producer: NotificationProducer) {
        let mut notifier = self.notifier.lock().unwrap_or_else(|e| e.into_inner());
        *notifier = Some(producer);
    }

    /// Periods per note offset advance at the current bpm and
    /// delay factor.
    pub fn absolute_delay(&self) -> f64 {
        self.state().delay
    }

    pub fn bpm(&self) -> f64 {
        self.state().bpm
    }

    pub fn set_bpm(&self, bpm: f64) {
        if bpm <= 0.0 {
            log::warn!("ignoring non-positive bpm {}", bpm);
            return;
        }

        let mut state = self.state();
        state.bpm = bpm;
        state.delay = compute_delay(&self.config, bpm, state.delay_factor);
    }

    pub fn delay_factor(&self) -> f64 {
        self.state().delay_factor
    }

    pub fn set_delay_factor(&self, delay_factor: f64) {
        if delay_factor <= 0.0 {
            log::warn!("ignoring non-positive delay factor {}", delay_factor);
            return;
        }

        let mut state = self.state();
        state.delay_factor = delay_factor;
        state.delay = compute_delay(&self.config, state.bpm, delay_factor);
    }

    pub fn note_offset(&self) -> u64 {
        self.state().note_offset
    }

    pub fn set_note_offset(&self, note_offset: u64) {
        self.state().note_offset = note_offset;
    }

    pub fn note_offset_absolute(&self) -> u64 {
        self.state().note_offset_absolute
    }

    pub fn start_note_offset(&self) -> u64 {
        self.state().start_note_offset
    }

    pub fn set_start_note_offset(&self, start_note_offset: u64) {
        self.state().start_note_offset = start_note_offset;
    }

    pub fn delay_counter(&self) -> f64 {
        self.state().delay_counter
    }

    pub fn tact_counter(&self) -> f64 {
        self.state().tact_counter
    }

    /// Beat index within the modular period, 0..DEFAULT_PERIOD.
    pub fn tic_counter(&self) -> u32 {
        self.state().tic_counter
    }

    pub fn active_buffer(&self) -> usize {
        self.state().active
    }

    pub fn is_running(&self) -> bool {
        self.state().running
    }

    /// Wrap the note offset back to `loop_left` instead of reaching
    /// `loop_right`.
    pub fn set_loop(&self, loop_left: u64, loop_right: u64, enabled: bool) {
        let mut state = self.state();
        state.loop_left = loop_left;
        state.loop_right = loop_right;
        state.do_loop = enabled && loop_left < loop_right;
    }

    /// One audio period elapsed. Advances the note offset when the
    /// accumulated periods reach `delay`, carrying the fractional
    /// residual forward.
    pub fn tic(&self) {
        let advanced = {
            let mut state = self.state();
            if !state.running {
                return;
            }

            if state.delay_counter + 1.0 >= state.delay {
                if state.do_loop && state.note_offset + 1 == state.loop_right {
                    state.note_offset = state.loop_left;
                } else {
                    state.note_offset += 1;
                }
                state.note_offset_absolute += 1;
                state.delay_counter += 1.0 - state.delay;
                state.tact_counter += 1.0;

                Some(state.note_offset)
            } else {
                state.delay_counter += 1.0;
                None
            }
        };

        if let Some(note_offset) = advanced {
            self.offset_changed(note_offset);
        }
    }

    /// Bump the modular beat counter and tell observers about the new
    /// position. Called at most once per `tic`.
    pub fn offset_changed(&self, note_offset: u64) {
        {
            let mut state = self.state();
            state.tic_counter = (state.tic_counter + 1) % DEFAULT_PERIOD;
        }
        self.notify(EngineNotification::OffsetChanged(note_offset));
    }

    /// Rotate the active slot forward and clear the slot two behind
    /// the new one, leaving a one-period grace window for readers.
    pub fn switch_buffer_flag(&self) {
        let active = {
            let mut state = self.state();
            state.active = (state.active + 1) % 4;
            state.active
        };

        self.slot((active + 2) % 4).clear();
        self.notify(EngineNotification::BufferSwitched(active));
    }

    pub fn attach_device(&self, device: Box<dyn AudioDevice>) {
        self.state().device = Some(device);
    }

    pub fn detach_device(&self) {
        self.state().device = None;
    }

    /// Read one period from the attached device into the active slot.
    /// Without a device this is a no-op; a failed read leaves every
    /// counter untouched and surfaces the error to the caller.
    pub fn record(&self) -> Result<usize> {
        let mut state = self.state();
        let active = state.active;

        let device = match state.device.as_mut() {
            Some(device) => device,
            None => return Ok(0),
        };

        let mut slot = self.slot(active);
        slot.resize(self.config.buffer_size, 0.0);

        match device.read(&mut slot) {
            Ok(n) => Ok(n),
            Err(e) => {
                drop(slot);
                drop(state);
                self.notify(EngineNotification::DeviceLost);
                Err(e)
            }
        }
    }

    /// Copy of slot `index`'s current contents.
    pub fn buffer_contents(&self, index: usize) -> Vec<f32> {
        self.slot(index).clone()
    }

    pub fn buffer_len(&self, index: usize) -> usize {
        self.slot(index).len()
    }

    /// Note offset back to its start position, counters zeroed.
    pub fn reset(&self) {
        let mut state = self.state();
        state.note_offset = state.start_note_offset;
        state.delay_counter = 0.0;
        state.tact_counter = 0.0;
        state.tic_counter = 0;
    }

    /// Apply pending control commands, called before a tick.
    pub fn drain_commands(&self, consumer: &mut CommandConsumer) {
        while let Some(command) = consumer.try_pop() {
            match command {
                EngineCommand::SetBpm(bpm) => self.set_bpm(bpm),
                EngineCommand::SetDelayFactor(f) => self.set_delay_factor(f),
                EngineCommand::Seek(offset) => self.set_note_offset(offset),
                EngineCommand::Start => self.state().running = true,
                EngineCommand::Stop => {
                    self.state().running = false;
                    self.reset();
                }
            }
        }
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}
