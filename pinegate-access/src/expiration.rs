//! Expiration date arithmetic
//!
//! Pure calendar math, no remote calls and no state. Month and year
//! additions clamp to the last day of the target month per chrono's
//! `checked_add_months` semantics (2024-01-31 plus one month is
//! 2024-02-29).

use chrono::{DateTime, Days, Months, Utc};
use pinegate_core::{validation_error, ExtensionUnit, PinegateResult};

/// Push `base` out by `count` units of calendar time.
///
/// `Lifetime` carries no count semantics and is handled by the mutation
/// service before any arithmetic; passing it here is a caller bug and is
/// rejected as a validation error rather than silently ignored.
pub fn extend(
    base: DateTime<Utc>,
    unit: ExtensionUnit,
    count: u32,
) -> PinegateResult<DateTime<Utc>> {
    let extended = match unit {
        ExtensionUnit::Year => count
            .checked_mul(12)
            .and_then(|months| base.checked_add_months(Months::new(months))),
        ExtensionUnit::Month => base.checked_add_months(Months::new(count)),
        ExtensionUnit::Week => base.checked_add_days(Days::new(u64::from(count) * 7)),
        ExtensionUnit::Day => base.checked_add_days(Days::new(u64::from(count))),
        ExtensionUnit::Lifetime => {
            return Err(validation_error!(
                "lifetime directives carry no finite extension",
                "unit",
                "expiration"
            ));
        }
    };

    extended.ok_or_else(|| {
        validation_error!(
            format!("extension overflows the calendar: {} x {:?}", count, unit),
            "count",
            "expiration"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_extend_zero_is_identity() {
        let base = ts("2024-06-15T12:30:00Z");
        for unit in [
            ExtensionUnit::Year,
            ExtensionUnit::Month,
            ExtensionUnit::Week,
            ExtensionUnit::Day,
        ] {
            assert_eq!(extend(base, unit, 0).unwrap(), base);
        }
    }

    #[test]
    fn test_extend_is_monotonic() {
        let base = ts("2024-06-15T12:30:00Z");
        for unit in [
            ExtensionUnit::Year,
            ExtensionUnit::Month,
            ExtensionUnit::Week,
            ExtensionUnit::Day,
        ] {
            for count in [1u32, 3, 12] {
                assert!(extend(base, unit, count).unwrap() >= base);
            }
        }
    }

    #[test]
    fn test_extend_additive_for_weeks_and_days() {
        let base = ts("2024-06-15T12:30:00Z");
        let once = extend(extend(base, ExtensionUnit::Day, 4).unwrap(), ExtensionUnit::Day, 3)
            .unwrap();
        assert_eq!(once, extend(base, ExtensionUnit::Day, 7).unwrap());

        let weeks = extend(
            extend(base, ExtensionUnit::Week, 1).unwrap(),
            ExtensionUnit::Week,
            2,
        )
        .unwrap();
        assert_eq!(weeks, extend(base, ExtensionUnit::Week, 3).unwrap());
    }

    // Month additivity holds away from month ends; clamping at month ends
    // is the documented exception (31 Jan + 1M + 1M = 29 Feb + 1M = 29 Mar,
    // while 31 Jan + 2M = 31 Mar).
    #[test]
    fn test_extend_month_additive_mid_month() {
        let base = ts("2024-06-15T00:00:00Z");
        let chained = extend(
            extend(base, ExtensionUnit::Month, 2).unwrap(),
            ExtensionUnit::Month,
            3,
        )
        .unwrap();
        assert_eq!(chained, extend(base, ExtensionUnit::Month, 5).unwrap());
    }

    #[test]
    fn test_extend_month_end_clamps_to_leap_february() {
        let base = ts("2024-01-31T00:00:00Z");
        let extended = extend(base, ExtensionUnit::Month, 1).unwrap();
        assert_eq!(extended, ts("2024-02-29T00:00:00Z"));
    }

    #[test]
    fn test_extend_year_across_leap_day() {
        let base = ts("2024-02-29T00:00:00Z");
        let extended = extend(base, ExtensionUnit::Year, 1).unwrap();
        assert_eq!(extended, ts("2025-02-28T00:00:00Z"));
    }

    #[test]
    fn test_extend_rejects_lifetime() {
        let base = ts("2024-06-15T00:00:00Z");
        assert!(extend(base, ExtensionUnit::Lifetime, 1).is_err());
    }
}
