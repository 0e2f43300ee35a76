use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Seconds between the NTP epoch (1900) and the Unix epoch (1970).
pub const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

const MICROS_PER_SECOND: u64 = 1_000_000;

/// A (seconds, fraction) time tag.
///
/// # Examples
/// ```
/// use oscwire_core::OscTime;
///
/// let t = OscTime::from_micros(1_500_000);
/// assert_eq!(t.seconds, 1);
/// assert_eq!(t.fraction, 1 << 31);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OscTime {
    /// Whole seconds.
    pub seconds: u32,
    /// Fractional second in units of 1/2^32 s.
    pub fraction: u32,
}

impl OscTime {
    /// The special "immediately" time tag.
    pub const IMMEDIATELY: OscTime = OscTime {
        seconds: 0,
        fraction: 1,
    };

    pub const fn new(seconds: u32, fraction: u32) -> Self {
        Self { seconds, fraction }
    }

    /// Convert a microsecond count. Seconds wrap at `u32::MAX`.
    pub fn from_micros(micros: u64) -> Self {
        let sub = micros % MICROS_PER_SECOND;
        // 2^32 / 10^6 == 2^26 / 15625
        let fraction = ((1u64 << 26) * sub) / 15_625;
        Self {
            seconds: (micros / MICROS_PER_SECOND) as u32,
            fraction: fraction as u32,
        }
    }

    /// Time tag for a wall-clock instant, in NTP seconds.
    pub fn from_datetime(at: OffsetDateTime) -> Self {
        let unix = at.unix_timestamp().max(0) as u64;
        let micros = u64::from(at.microsecond());
        let mut t = Self::from_micros(micros);
        t.seconds = (unix + NTP_UNIX_OFFSET) as u32;
        t
    }

    /// Fractional part as microseconds (truncated).
    pub fn subsec_micros(&self) -> u32 {
        ((u64::from(self.fraction) * MICROS_PER_SECOND) >> 32) as u32
    }
}

/// Source of "now" for outgoing time tags.
pub trait TimeSource {
    fn now(&self) -> OscTime;
}

/// Wall clock backed by the system real-time clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> OscTime {
        OscTime::from_datetime(OffsetDateTime::now_utc())
    }
}

/// Clock that always returns the same time tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock(pub OscTime);

impl TimeSource for FixedClock {
    fn now(&self) -> OscTime {
        self.0
    }
}
