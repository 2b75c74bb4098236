use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Rem, RemAssign, Sub, SubAssign};
use std::time::{SystemTime, UNIX_EPOCH};

/// A signed nanosecond duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct TimeSpan(pub i64);

impl TimeSpan {
    pub const ZERO: TimeSpan = TimeSpan(0);

    pub const fn nanoseconds(n: i64) -> Self {
        TimeSpan(n)
    }

    pub const fn microseconds(n: i64) -> Self {
        TimeSpan(n * 1_000)
    }

    pub const fn milliseconds(n: i64) -> Self {
        TimeSpan(n * 1_000_000)
    }

    pub const fn seconds(n: i64) -> Self {
        TimeSpan(n * 1_000_000_000)
    }

    pub const fn nanos(self) -> i64 {
        self.0
    }

    pub fn as_duration(self) -> std::time::Duration {
        std::time::Duration::from_nanos(self.0.max(0) as u64)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// A nanosecond-precision point in time, relative to the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct TimeStamp(pub i64);

impl TimeStamp {
    pub const ZERO: TimeStamp = TimeStamp(0);

    pub fn now() -> Self {
        let dur = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        TimeStamp(dur.as_nanos() as i64)
    }

    pub const fn nanos(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// A half-open range `[start, end)` of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TimeRange {
    pub start: TimeStamp,
    pub end: TimeStamp,
}

impl TimeRange {
    pub fn new(start: TimeStamp, end: TimeStamp) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> TimeSpan {
        TimeSpan(self.end.0 - self.start.0)
    }

    pub fn contains(&self, ts: TimeStamp) -> bool {
        ts >= self.start && ts < self.end
    }
}

macro_rules! impl_time_arith {
    ($ty:ty) => {
        impl Add<TimeSpan> for $ty {
            type Output = $ty;
            fn add(self, rhs: TimeSpan) -> $ty {
                <$ty>::from(self.0 + rhs.0)
            }
        }
        impl Sub<TimeSpan> for $ty {
            type Output = $ty;
            fn sub(self, rhs: TimeSpan) -> $ty {
                <$ty>::from(self.0 - rhs.0)
            }
        }
        impl AddAssign<TimeSpan> for $ty {
            fn add_assign(&mut self, rhs: TimeSpan) {
                self.0 += rhs.0;
            }
        }
        impl SubAssign<TimeSpan> for $ty {
            fn sub_assign(&mut self, rhs: TimeSpan) {
                self.0 -= rhs.0;
            }
        }
    };
}

impl From<i64> for TimeStamp {
    fn from(v: i64) -> Self {
        TimeStamp(v)
    }
}
impl From<i64> for TimeSpan {
    fn from(v: i64) -> Self {
        TimeSpan(v)
    }
}

impl_time_arith!(TimeStamp);

impl Sub<TimeStamp> for TimeStamp {
    type Output = TimeSpan;
    fn sub(self, rhs: TimeStamp) -> TimeSpan {
        TimeSpan(self.0 - rhs.0)
    }
}

impl Add for TimeSpan {
    type Output = TimeSpan;
    fn add(self, rhs: TimeSpan) -> TimeSpan {
        TimeSpan(self.0 + rhs.0)
    }
}
impl Sub for TimeSpan {
    type Output = TimeSpan;
    fn sub(self, rhs: TimeSpan) -> TimeSpan {
        TimeSpan(self.0 - rhs.0)
    }
}
impl AddAssign for TimeSpan {
    fn add_assign(&mut self, rhs: TimeSpan) {
        self.0 += rhs.0;
    }
}
impl SubAssign for TimeSpan {
    fn sub_assign(&mut self, rhs: TimeSpan) {
        self.0 -= rhs.0;
    }
}
impl Mul<i64> for TimeSpan {
    type Output = TimeSpan;
    fn mul(self, rhs: i64) -> TimeSpan {
        TimeSpan(self.0 * rhs)
    }
}
impl MulAssign<i64> for TimeSpan {
    fn mul_assign(&mut self, rhs: i64) {
        self.0 *= rhs;
    }
}
impl Div<i64> for TimeSpan {
    type Output = TimeSpan;
    fn div(self, rhs: i64) -> TimeSpan {
        TimeSpan(self.0 / rhs)
    }
}
impl DivAssign<i64> for TimeSpan {
    fn div_assign(&mut self, rhs: i64) {
        self.0 /= rhs;
    }
}
impl Rem<i64> for TimeSpan {
    type Output = TimeSpan;
    fn rem(self, rhs: i64) -> TimeSpan {
        TimeSpan(self.0 % rhs)
    }
}
impl RemAssign<i64> for TimeSpan {
    fn rem_assign(&mut self, rhs: i64) {
        self.0 %= rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_plus_span() {
        let ts = TimeStamp(100) + TimeSpan::seconds(1);
        assert_eq!(ts, TimeStamp(100 + 1_000_000_000));
    }

    #[test]
    fn timestamp_minus_timestamp_is_span() {
        let diff = TimeStamp(2_000) - TimeStamp(500);
        assert_eq!(diff, TimeSpan(1_500));
    }

    #[test]
    fn range_contains_is_half_open() {
        let r = TimeRange::new(TimeStamp(0), TimeStamp(100));
        assert!(r.contains(TimeStamp(0)));
        assert!(!r.contains(TimeStamp(100)));
        assert_eq!(r.duration(), TimeSpan(100));
    }
}
