// Timestamp - positions event buckets in wall-clock or musical time

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

/// Which clock a timestamp refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampMode {
    /// Seconds since the Unix epoch.
    Unix,
    /// Musical position counted in note offsets.
    Offset,
}

/// A point in time, either wall-clock or musical.
///
/// Comparing timestamps of different modes is a caller error; the two
/// clocks are unrelated and the result would be meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timestamp {
    mode: TimestampMode,
    /// Marks a timestamp whose clock has drifted from the data it tags.
    pub outdated: bool,
    unix_time: i64,
    offset: u64,
}

impl Timestamp {
    pub fn from_unix(seconds: i64) -> Self {
        Self {
            mode: TimestampMode::Unix,
            outdated: false,
            unix_time: seconds,
            offset: 0,
        }
    }

    pub fn from_offset(offset: u64) -> Self {
        Self {
            mode: TimestampMode::Offset,
            outdated: false,
            unix_time: 0,
            offset,
        }
    }

    /// Wall-clock timestamp for the current moment.
    pub fn now() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Self::from_unix(seconds)
    }

    pub fn mode(&self) -> TimestampMode {
        self.mode
    }

    pub fn unix_time(&self) -> i64 {
        self.unix_time
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn set_unix_time(&mut self, seconds: i64) {
        self.unix_time = seconds;
    }

    pub fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// Order against `other` on the shared clock. Both timestamps must
    /// use the same mode; mixed-mode pairs compare as equal.
    pub fn compare(&self, other: &Timestamp) -> Ordering {
        if self.mode != other.mode {
            return Ordering::Equal;
        }

        match self.mode {
            TimestampMode::Unix => self.unix_time.cmp(&other.unix_time),
            TimestampMode::Offset => self.offset.cmp(&other.offset),
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_ordering() {
        let a = Timestamp::from_offset(1024);
        let b = Timestamp::from_offset(2048);

        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(b.compare(&a), Ordering::Greater);
        assert_eq!(a.compare(&a), Ordering::Equal);
    }

    #[test]
    fn test_unix_ordering() {
        let a = Timestamp::from_unix(1_700_000_000);
        let b = Timestamp::from_unix(1_700_000_001);

        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(b.compare(&b), Ordering::Equal);
    }

    #[test]
    fn test_now_is_unix_mode() {
        let t = Timestamp::now();
        assert_eq!(t.mode(), TimestampMode::Unix);
        assert!(t.unix_time() > 0);
    }

    #[test]
    fn test_mutators() {
        let mut t = Timestamp::from_offset(0);
        t.set_offset(4096);
        assert_eq!(t.offset(), 4096);

        let mut t = Timestamp::from_unix(0);
        t.set_unix_time(1_700_000_000);
        assert_eq!(t.unix_time(), 1_700_000_000);
    }

    #[test]
    fn test_serde_round_trip() {
        let t = Timestamp::from_offset(3072);
        let json = serde_json::to_string(&t).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
