/// Zkvote timestamp.
///
/// Internally i64 microseconds from unix epoch.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Construct a new timestamp of "now".
    pub fn now() -> Self {
        std::time::SystemTime::now().into()
    }

    /// Construct a timestamp from i64 microseconds since unix epoch.
    pub fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Get the i64 microseconds since unix epoch.
    pub fn as_micros(&self) -> i64 {
        self.0
    }

    /// Time left until `self`, as seen from `now`. Zero if already past.
    pub fn remaining_from(&self, now: Timestamp) -> std::time::Duration {
        if self.0 <= now.0 {
            std::time::Duration::ZERO
        } else {
            std::time::Duration::from_micros((self.0 - now.0) as u64)
        }
    }
}

impl std::ops::Add<std::time::Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: std::time::Duration) -> Self::Output {
        Timestamp(self.0.saturating_add(rhs.as_micros() as i64))
    }
}

impl From<std::time::SystemTime> for Timestamp {
    fn from(t: std::time::SystemTime) -> Self {
        // clocks set before the epoch collapse to zero
        Self(
            t.duration_since(std::time::SystemTime::UNIX_EPOCH)
                .map(|d| d.as_micros() as i64)
                .unwrap_or(0),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[test]
    fn remaining_saturates_at_zero() {
        let t = Timestamp::from_micros(1_000);
        assert_eq!(
            Duration::from_micros(500),
            t.remaining_from(Timestamp::from_micros(500))
        );
        assert_eq!(Duration::ZERO, t.remaining_from(t));
        assert_eq!(
            Duration::ZERO,
            t.remaining_from(Timestamp::from_micros(2_000))
        );
    }

    #[test]
    fn add_duration() {
        let t = Timestamp::from_micros(10) + Duration::from_millis(1);
        assert_eq!(1_010, t.as_micros());
    }
}
