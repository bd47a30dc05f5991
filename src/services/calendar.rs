//! Calendar arithmetic for elapsed-age display.
//!
//! Chrono has no year/month/day difference, so the borrow chain is done by
//! hand: seconds, minutes, hours, days, months, years, smallest first. A day
//! borrow takes the length of the month before `now`'s month.

use crate::error::CalcError;
use crate::models::{AgeDuration, Instant};

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Days in `month` of `year`. Months outside 1..=12 count as 31 days.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month > 1 {
        (year, month - 1)
    } else {
        (year - 1, 12)
    }
}

/// Elapsed calendar time from `birth` to `now`.
///
/// Fails with `InvalidOrdering` when `now`'s date precedes `birth`'s date.
/// `UnexpectedCalculation` is returned when the borrow chain cannot produce
/// an in-range result, which only happens for malformed instants.
pub fn elapsed(birth: &Instant, now: &Instant) -> Result<AgeDuration, CalcError> {
    if now.date_key() < birth.date_key() {
        return Err(CalcError::InvalidOrdering {
            birth: *birth,
            now: *now,
        });
    }
    if !(1..=12).contains(&now.month) {
        return Err(CalcError::UnexpectedCalculation(format!(
            "month {} out of range",
            now.month
        )));
    }

    let mut seconds = now.second as i32 - birth.second as i32;
    let mut minutes = now.minute as i32 - birth.minute as i32;
    let mut hours = now.hour as i32 - birth.hour as i32;
    let mut days = now.day as i32 - birth.day as i32;
    let mut months = now.month as i32 - birth.month as i32;
    let mut years = now.year - birth.year;

    if seconds < 0 {
        seconds += 60;
        minutes -= 1;
    }
    if minutes < 0 {
        minutes += 60;
        hours -= 1;
    }
    if hours < 0 {
        hours += 24;
        days -= 1;
    }

    // A single borrow can leave days negative when the previous month is
    // shorter than the birth day (born on the 31st, now early March), so
    // keep walking back month by month.
    let (mut borrow_year, mut borrow_month) = (now.year, now.month);
    while days < 0 {
        (borrow_year, borrow_month) = previous_month(borrow_year, borrow_month);
        days += days_in_month(borrow_year, borrow_month) as i32;
        months -= 1;
    }
    while months < 0 {
        months += 12;
        years -= 1;
    }

    let age = AgeDuration {
        years,
        months,
        weeks: days / 7,
        days: days % 7,
        hours,
        minutes,
        seconds,
        degraded: false,
    };

    if age.has_negative_field()
        || age.seconds >= 60
        || age.minutes >= 60
        || age.hours >= 24
        || age.months >= 12
    {
        return Err(CalcError::UnexpectedCalculation(format!(
            "borrow chain left out-of-range result {:?} for {} -> {}",
            age, birth, now
        )));
    }

    Ok(age)
}

/// Whole years only; used when the full calculation fails.
pub fn fallback_age(birth: &Instant, now: &Instant) -> AgeDuration {
    let mut years = now.year - birth.year;
    if (now.month, now.day) < (birth.month, birth.day) {
        years -= 1;
    }
    AgeDuration::degraded_years(years)
}

/// `elapsed` with unexpected failures absorbed into the degraded result.
/// Ordering errors still surface so callers can say why nothing is shown.
pub fn age_of(birth: &Instant, now: &Instant) -> Result<AgeDuration, CalcError> {
    match elapsed(birth, now) {
        Err(CalcError::UnexpectedCalculation(reason)) => {
            log::warn!("Detailed age calculation failed ({}), using yearly fallback", reason);
            Ok(fallback_age(birth, now))
        }
        other => other,
    }
}
