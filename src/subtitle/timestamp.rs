use std::fmt;
use std::str::FromStr;

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// Separator between the start and end stamps of a timing line.
pub const ARROW: &str = " --> ";

/// A non-negative subtitle time in whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    /// Largest time the two-digit hour field can hold: `99:59:59,999`.
    pub const MAX: Timestamp = Timestamp(100 * MS_PER_HOUR - 1);

    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn from_hms(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Self {
        Self(hours * MS_PER_HOUR + minutes * MS_PER_MINUTE + seconds * MS_PER_SECOND + millis)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Add a signed offset, clamping at zero.
    pub fn offset(self, delta_ms: i64) -> Self {
        if delta_ms >= 0 {
            Self(self.0.saturating_add(delta_ms as u64))
        } else {
            Self(self.0.saturating_sub(delta_ms.unsigned_abs()))
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.0;
        write!(
            f,
            "{:02}:{:02}:{:02},{:03}",
            ms / MS_PER_HOUR,
            (ms % MS_PER_HOUR) / MS_PER_MINUTE,
            (ms % MS_PER_MINUTE) / MS_PER_SECOND,
            ms % MS_PER_SECOND
        )
    }
}

/// Rejected timestamp text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTimestamp;

impl FromStr for Timestamp {
    type Err = InvalidTimestamp;

    /// Accepts exactly `HH:MM:SS,mmm`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let b = s.as_bytes();
        if b.len() != 12 || b[2] != b':' || b[5] != b':' || b[8] != b',' {
            return Err(InvalidTimestamp);
        }

        let field = |range: std::ops::Range<usize>| -> Result<u64, InvalidTimestamp> {
            let digits = &b[range];
            if !digits.iter().all(u8::is_ascii_digit) {
                return Err(InvalidTimestamp);
            }
            Ok(digits.iter().fold(0, |acc, d| acc * 10 + u64::from(d - b'0')))
        };

        let hours = field(0..2)?;
        let minutes = field(3..5)?;
        let seconds = field(6..8)?;
        let millis = field(9..12)?;
        if minutes >= 60 || seconds >= 60 {
            return Err(InvalidTimestamp);
        }

        Ok(Self::from_hms(hours, minutes, seconds, millis))
    }
}

/// The `start --> end` pair carried by a timing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Timing {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Parse a timing line; surrounding whitespace is ignored.
    pub fn parse_line(line: &str) -> Option<Self> {
        let (start, end) = line.trim().split_once(ARROW)?;
        Some(Self {
            start: start.parse().ok()?,
            end: end.parse().ok()?,
        })
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.start, ARROW, self.end)
    }
}

/// Convert a signed number of seconds into a millisecond delta.
pub fn seconds_to_millis(seconds: f64) -> Option<i64> {
    if !seconds.is_finite() {
        return None;
    }
    let ms = (seconds * 1000.0).round();
    if ms.abs() > i64::MAX as f64 {
        return None;
    }
    Some(ms as i64)
}
