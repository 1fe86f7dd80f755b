// Event buckets - time-bucketed event containers and index searches
//
// Buckets partition musical time into fixed-width windows keyed by an
// offset-mode timestamp. Lookups over a sorted bucket list use a
// three-probe narrowing search: probe the window start, end and
// midpoint each round, then discard the half the midpoint rules out.

use crate::sequencer::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// Width of one bucket in note offsets.
pub const DEFAULT_BUCKET_WIDTH: u64 = 1024;

/// A single sequenced event at position `x` with lane/value `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub x: u64,
    pub y: u32,
}

impl Event {
    pub fn new(x: u64, y: u32) -> Self {
        Self { x, y }
    }
}

/// Events falling into one bucket-width window of musical time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBucket {
    pub timestamp: Timestamp,
    pub control_name: Option<String>,
    events: Vec<Event>,
    selection: Vec<Event>,
}

impl EventBucket {
    pub fn new(offset: u64) -> Self {
        Self {
            timestamp: Timestamp::from_offset(offset),
            control_name: None,
            events: Vec::new(),
            selection: Vec::new(),
        }
    }

    pub fn with_control(offset: u64, control_name: &str) -> Self {
        Self {
            control_name: Some(control_name.to_string()),
            ..Self::new(offset)
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// True when `offset` falls inside this bucket's window.
    pub fn contains_offset(&self, offset: u64) -> bool {
        let start = self.timestamp.offset();
        offset >= start && offset < start + DEFAULT_BUCKET_WIDTH
    }

    /// Insert `event` keeping the list sorted by `x` then `y`. Equal
    /// keys keep insertion order.
    pub fn add_event(&mut self, event: Event) {
        let at = self
            .events
            .partition_point(|e| (e.x, e.y) <= (event.x, event.y));
        self.events.insert(at, event);
    }

    pub fn remove_event(&mut self, event: Event) -> bool {
        match self.events.iter().position(|e| *e == event) {
            Some(at) => {
                self.events.remove(at);
                true
            }
            None => false,
        }
    }

    /// Exact lookup by `x` with the same three-probe narrowing used for
    /// bucket lookup. With duplicate `x` values the last one wins.
    pub fn find_point(&self, x: u64) -> Option<&Event> {
        let mut start = 0_usize;
        let mut end = match self.events.len() {
            0 => return None,
            n => n - 1,
        };
        let mut found: Option<usize> = None;

        loop {
            if self.events[end].x == x {
                found = Some(end);
                break;
            }
            if self.events[start].x == x {
                // keep scanning forward, duplicates sit adjacent
                let mut at = start;
                while at + 1 <= end && self.events[at + 1].x == x {
                    at += 1;
                }
                found = Some(at);
                break;
            }

            let mid = start + (end - start) / 2;
            if self.events[mid].x == x {
                let mut at = mid;
                while at + 1 <= end && self.events[at + 1].x == x {
                    at += 1;
                }
                found = Some(at);
                break;
            }

            if end - start + 1 <= 3 {
                break;
            }

            if self.events[mid].x < x {
                start = mid + 1;
            } else {
                end = mid - 1;
            }
        }

        found.map(|at| &self.events[at])
    }

    /// All events with `x0 <= x <= x1` in ascending order. Reversed
    /// bounds are swapped first.
    pub fn find_region(&self, x0: u64, x1: u64) -> Vec<Event> {
        let (lo, hi) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };

        self.events
            .iter()
            .skip_while(|e| e.x < lo)
            .take_while(|e| e.x <= hi)
            .copied()
            .collect()
    }

    pub fn selection(&self) -> &[Event] {
        &self.selection
    }

    pub fn add_to_selection(&mut self, event: Event) {
        if !self.selection.contains(&event) {
            let at = self
                .selection
                .partition_point(|e| (e.x, e.y) <= (event.x, event.y));
            self.selection.insert(at, event);
        }
    }

    pub fn is_selected(&self, x: u64) -> bool {
        self.selection.iter().any(|e| e.x == x)
    }

    pub fn free_selection(&mut self) {
        self.selection.clear();
    }
}

/// Insert `bucket` into `list` keeping ascending timestamp order.
/// Equal offsets keep insertion order.
pub fn add_bucket(list: &mut Vec<EventBucket>, bucket: EventBucket) {
    let offset = bucket.timestamp.offset();
    let at = list.partition_point(|b| b.timestamp.offset() <= offset);
    list.insert(at, bucket);
}

/// Index of the bucket whose window contains the query offset.
///
/// Three candidates are probed each round, the window start, end and
/// midpoint, and the first containing candidate wins. On a miss the
/// midpoint ordering discards half the window; an equal midpoint only
/// advances the start, which still shrinks the window every round.
/// `None` as query matches the first bucket unconditionally.
pub fn find_near_timestamp(list: &[EventBucket], query: Option<&Timestamp>) -> Option<usize> {
    find_near_timestamp_filtered(list, query, None)
}

/// Same search, but a candidate must also carry `control_name` to match.
pub fn find_near_timestamp_extended(
    list: &[EventBucket],
    query: Option<&Timestamp>,
    control_name: &str,
) -> Option<usize> {
    find_near_timestamp_filtered(list, query, Some(control_name))
}

fn find_near_timestamp_filtered(
    list: &[EventBucket],
    query: Option<&Timestamp>,
    control_name: Option<&str>,
) -> Option<usize> {
    if list.is_empty() {
        return None;
    }

    let accepts = |index: usize| -> bool {
        match control_name {
            Some(name) => list[index].control_name.as_deref() == Some(name),
            None => true,
        }
    };

    let query = match query {
        Some(timestamp) => timestamp,
        None => {
            return match control_name {
                None => Some(0),
                Some(_) => (0..list.len()).find(|&i| accepts(i)),
            };
        }
    };
    let x = query.offset();

    let mut start = 0_usize;
    let mut end = list.len() - 1;

    loop {
        if accepts(start) && list[start].contains_offset(x) {
            return Some(start);
        }
        if accepts(end) && list[end].contains_offset(x) {
            return Some(end);
        }

        let mid = start + (end - start) / 2;
        if accepts(mid) && list[mid].contains_offset(x) {
            return Some(mid);
        }

        if end - start + 1 <= 3 {
            return None;
        }

        let mid_x = list[mid].timestamp.offset();
        if mid_x < x {
            start = mid + 1;
            end -= 1;
        } else if mid_x > x {
            start += 1;
            end = mid - 1;
        } else {
            start += 1;
        }
    }
}
