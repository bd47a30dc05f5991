use crate::error::{CalcError, TimeSyncError};
use crate::models::{AgeDuration, TimeSyncResult};

pub const CALCULATING: &str = "Calculating...";
pub const WAITING_FOR_TIME: &str = "Waiting for time...";
pub const CANNOT_CALCULATE: &str = "Cannot calculate";

pub fn format_age(age: &AgeDuration) -> String {
    if age.degraded || age.has_negative_field() {
        return CALCULATING.to_string();
    }
    format!(
        "{}y, {}mo, {}w, {}d, {}h, {}min, {}s",
        age.years, age.months, age.weeks, age.days, age.hours, age.minutes, age.seconds
    )
}

/// One person row: their age, or the reason there is none.
pub fn format_person_line(name: &str, age: Option<&Result<AgeDuration, CalcError>>) -> String {
    let body = match age {
        None => WAITING_FOR_TIME.to_string(),
        Some(Ok(age)) => format_age(age),
        Some(Err(CalcError::InvalidOrdering { .. })) => CANNOT_CALCULATE.to_string(),
        Some(Err(CalcError::UnexpectedCalculation(_))) => CALCULATING.to_string(),
    };
    format!("{}: {}", name, body)
}

pub fn format_status(connected: bool, battery_percent: Option<u8>) -> String {
    let wifi = if connected { "C" } else { "X" };
    match battery_percent {
        Some(pct) => format!("W:{} B:{}%", wifi, pct),
        None => format!("W:{} B:--", wifi),
    }
}

/// Header line 0, e.g. `May 24, 2025 @ 6:30PM CDT | W:C B:85%`.
pub fn format_header(sync: &TimeSyncResult, status: &str) -> String {
    // The fallback sentinel instant is never shown as if it were real time.
    let time = if sync.is_fallback {
        match &sync.failure {
            Some(TimeSyncError::NoNetwork) => "Time: No WiFi".to_string(),
            Some(TimeSyncError::ApiError(_)) => "Time: API Error".to_string(),
            None => "Time: Sync Failed".to_string(),
        }
    } else {
        match sync.instant.to_naive() {
            Some(dt) => format!("{} {}", dt.format("%b %-d, %Y @ %-I:%M%p"), sync.source_label),
            None => "Time: Sync Failed".to_string(),
        }
    };
    format!("{} | {}", time, status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Instant;

    fn sample_age() -> AgeDuration {
        AgeDuration {
            years: 26,
            months: 4,
            weeks: 3,
            days: 2,
            hours: 6,
            minutes: 18,
            seconds: 0,
            degraded: false,
        }
    }

    #[test]
    fn renders_all_units_in_order() {
        assert_eq!(format_age(&sample_age()), "26y, 4mo, 3w, 2d, 6h, 18min, 0s");
    }

    #[test]
    fn degraded_and_negative_render_placeholder() {
        assert_eq!(format_age(&AgeDuration::degraded_years(30)), CALCULATING);

        let negative = AgeDuration {
            years: -1,
            ..sample_age()
        };
        assert_eq!(format_age(&negative), CALCULATING);
    }

    #[test]
    fn person_line_variants() {
        assert_eq!(format_person_line("Ana", None), "Ana: Waiting for time...");

        let ordering = Err(CalcError::InvalidOrdering {
            birth: Instant::new(2025, 6, 1, 0, 0, 0),
            now: Instant::new(2025, 5, 1, 0, 0, 0),
        });
        assert_eq!(format_person_line("Ana", Some(&ordering)), "Ana: Cannot calculate");

        let ok = Ok(sample_age());
        assert!(format_person_line("Ana", Some(&ok)).starts_with("Ana: 26y"));
    }

    #[test]
    fn header_for_successful_sync() {
        let sync = TimeSyncResult::synced(Instant::new(2025, 5, 24, 18, 30, 0), "CDT");
        let status = format_status(true, Some(85));
        assert_eq!(format_header(&sync, &status), "May 24, 2025 @ 6:30PM CDT | W:C B:85%");

        let midnight = TimeSyncResult::synced(Instant::new(2025, 1, 3, 0, 5, 0), "CST");
        assert_eq!(
            format_header(&midnight, "W:C B:--"),
            "Jan 3, 2025 @ 12:05AM CST | W:C B:--"
        );
    }

    #[test]
    fn header_names_the_failure() {
        let offline = TimeSyncResult::fallback(TimeSyncError::NoNetwork);
        assert_eq!(
            format_header(&offline, &format_status(false, Some(0))),
            "Time: No WiFi | W:X B:0%"
        );

        let api = TimeSyncResult::fallback(TimeSyncError::ApiError("boom".to_string()));
        assert!(format_header(&api, "W:C B:--").starts_with("Time: API Error"));
    }

    #[test]
    fn fallback_sentinel_is_never_printed_as_a_date() {
        let sentinel = TimeSyncResult {
            failure: None,
            ..TimeSyncResult::fallback(TimeSyncError::NoNetwork)
        };
        assert!(sentinel.is_fallback);
        assert_eq!(format_header(&sentinel, "W:C B:--"), "Time: Sync Failed | W:C B:--");
    }
}
