use chrono::NaiveDateTime;

use crate::models::Instant;

/// Process clock. The time sync machine is the only writer.
pub trait Clock {
    /// `None` until the clock has been set at least once.
    fn now(&self) -> Option<Instant>;
    fn set(&mut self, instant: Instant);
}

/// RTC emulation: remembers the last synced wall time and advances it with
/// the monotonic clock.
#[derive(Debug, Default)]
pub struct SystemClock {
    anchor: Option<(NaiveDateTime, std::time::Instant)>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Option<Instant> {
        let (wall, set_at) = self.anchor?;
        let drift = chrono::Duration::from_std(set_at.elapsed()).ok()?;
        wall.checked_add_signed(drift).map(Instant::from)
    }

    fn set(&mut self, instant: Instant) {
        match instant.to_naive() {
            Some(wall) => {
                self.anchor = Some((wall, std::time::Instant::now()));
                log::info!("Clock set to {}", instant);
            }
            None => log::warn!("Refusing to set clock to invalid instant {}", instant),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_clock_has_no_time() {
        assert_eq!(SystemClock::new().now(), None);
    }

    #[test]
    fn set_clock_reads_back_from_anchor() {
        let mut clock = SystemClock::new();
        let anchor = Instant::new(2025, 12, 31, 23, 59, 58);
        clock.set(anchor);
        let now = clock.now().expect("clock was set");
        assert!(now >= anchor);
        assert!(now <= Instant::new(2026, 1, 1, 0, 0, 30));
    }

    #[test]
    fn invalid_instant_does_not_replace_anchor() {
        let mut clock = SystemClock::new();
        clock.set(Instant::new(2024, 2, 30, 0, 0, 0));
        assert_eq!(clock.now(), None);
    }
}
