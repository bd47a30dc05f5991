use serde::{Deserialize, Serialize};

/// Calendar-aware elapsed time since a birth instant.
///
/// `days` is always reduced into `weeks` + `days` (0..=6). `degraded` marks
/// the simplified year-only result produced when the borrowing calculation
/// failed; only `years` is meaningful in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgeDuration {
    pub years: i32,
    pub months: i32,
    pub weeks: i32,
    pub days: i32,
    pub hours: i32,
    pub minutes: i32,
    pub seconds: i32,
    pub degraded: bool,
}

impl AgeDuration {
    pub fn degraded_years(years: i32) -> Self {
        Self {
            years,
            degraded: true,
            ..Self::default()
        }
    }

    /// Day count before the weeks/days reduction.
    pub fn total_days(&self) -> i32 {
        self.weeks * 7 + self.days
    }

    pub fn has_negative_field(&self) -> bool {
        [
            self.years,
            self.months,
            self.weeks,
            self.days,
            self.hours,
            self.minutes,
            self.seconds,
        ]
        .iter()
        .any(|v| *v < 0)
    }
}
