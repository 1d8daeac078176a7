use crate::prediction::types::{IntervalUnit, RefreshInterval};
use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use tracing::warn;

pub const FALLBACK_DELAY_MS: u64 = 60_000;
pub const MIN_FORWARD_DELAY_MS: u64 = 100;

/// Milliseconds until the next wall-clock boundary strictly after `now` whose
/// truncation to the interval unit is an exact multiple of the amount
/// (e.g. 15 minutes aligns to :00/:15/:30/:45).
pub fn resolve_next_delay_ms(interval: RefreshInterval, now: DateTime<Utc>) -> u64 {
    if interval.amount == 0 {
        warn!(
            unit = interval.unit.as_str(),
            "malformed refresh interval (amount 0); falling back to default delay"
        );
        return FALLBACK_DELAY_MS;
    }

    let Some(boundary) = next_boundary(interval, now) else {
        warn!(
            amount = interval.amount,
            unit = interval.unit.as_str(),
            "refresh interval boundary not resolvable; falling back to default delay"
        );
        return FALLBACK_DELAY_MS;
    };

    let delay_ms = (boundary - now).num_milliseconds();
    if delay_ms > 0 {
        return delay_ms as u64;
    }

    // Clock skew or rounding produced a stale boundary; take the one after it.
    if let Some(next) = next_boundary(interval, boundary) {
        let retry_ms = (next - now).num_milliseconds();
        if retry_ms > 0 {
            return retry_ms as u64;
        }
    }

    MIN_FORWARD_DELAY_MS
}

fn next_boundary(interval: RefreshInterval, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let amount = i64::from(interval.amount);
    match interval.unit {
        IntervalUnit::Minute => {
            let mut candidate = after.with_second(0)?.with_nanosecond(0)?;
            // Minute 0 of the next hour is a multiple of anything, so 61
            // single-minute steps always reach a boundary.
            for _ in 0..=61 {
                candidate += Duration::minutes(1);
                if candidate > after && i64::from(candidate.minute()) % amount == 0 {
                    return Some(candidate);
                }
            }
            None
        }
        IntervalUnit::Hour => {
            let mut candidate = after
                .with_minute(0)?
                .with_second(0)?
                .with_nanosecond(0)?;
            for _ in 0..=25 {
                candidate += Duration::hours(1);
                if candidate > after && i64::from(candidate.hour()) % amount == 0 {
                    return Some(candidate);
                }
            }
            None
        }
        IntervalUnit::Day => {
            // Aligned from the start of the current day in amount-day steps,
            // so the next boundary is always start-of-day + amount days.
            let start_of_day = Utc.from_utc_datetime(&after.date_naive().and_hms_opt(0, 0, 0)?);
            Some(start_of_day + Duration::days(amount))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, second)
            .single()
            .expect("test timestamp should be unambiguous")
    }

    fn minutes(amount: u32) -> RefreshInterval {
        RefreshInterval {
            amount,
            unit: IntervalUnit::Minute,
        }
    }

    #[test]
    fn fifteen_minutes_at_ten_oh_seven_resolves_to_eight_minutes() {
        let delay = resolve_next_delay_ms(minutes(15), at(10, 7, 0));
        assert_eq!(delay, 8 * 60_000);
    }

    #[test]
    fn partial_minute_is_subtracted_from_the_delay() {
        let delay = resolve_next_delay_ms(minutes(15), at(10, 7, 30));
        assert_eq!(delay, 7 * 60_000 + 30_000);
    }

    #[test]
    fn boundary_must_be_strictly_after_now() {
        let delay = resolve_next_delay_ms(minutes(15), at(10, 15, 0));
        assert_eq!(delay, 15 * 60_000);
    }

    #[test]
    fn non_divisor_minute_amount_wraps_at_the_hour() {
        // 7-minute alignment: :00 :07 .. :56, then minute 0 of the next hour.
        let delay = resolve_next_delay_ms(minutes(7), at(10, 58, 0));
        assert_eq!(delay, 2 * 60_000);
    }

    #[test]
    fn hour_alignment_targets_multiples_of_the_amount() {
        let interval = RefreshInterval {
            amount: 4,
            unit: IntervalUnit::Hour,
        };
        let delay = resolve_next_delay_ms(interval, at(10, 7, 0));
        assert_eq!(delay, (60 + 53) * 60_000);
    }

    #[test]
    fn single_day_resolves_to_next_midnight() {
        let interval = RefreshInterval {
            amount: 1,
            unit: IntervalUnit::Day,
        };
        let delay = resolve_next_delay_ms(interval, at(10, 7, 0));
        assert_eq!(delay, 24 * 3_600_000 - (10 * 60 + 7) * 60_000);
    }

    #[test]
    fn multi_day_steps_advance_from_start_of_current_day() {
        let interval = RefreshInterval {
            amount: 3,
            unit: IntervalUnit::Day,
        };
        let delay = resolve_next_delay_ms(interval, at(10, 7, 0));
        assert_eq!(delay, 3 * 86_400_000 - (10 * 60 + 7) * 60_000);
    }

    #[test]
    fn zero_amount_falls_back_to_default_delay() {
        let delay = resolve_next_delay_ms(minutes(0), at(10, 7, 0));
        assert_eq!(delay, FALLBACK_DELAY_MS);
    }

    #[test]
    fn oversized_amount_behaves_like_top_of_unit_alignment() {
        // minute-of-hour % 10_000 is only zero at minute 0.
        let delay = resolve_next_delay_ms(minutes(10_000), at(10, 58, 0));
        assert_eq!(delay, 2 * 60_000);
    }
}
