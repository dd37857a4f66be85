//! Calendar arithmetic in the zone carried by a [`DateTime`].
//!
//! Weeks start on `first_day_of_week` (1 = Monday .. 7 = Sunday) and fiscal
//! years on `first_month_of_year` (1 = January .. 12 = December); quarters
//! are aligned on the fiscal year. Values out of range fall back to 1.

use chrono::{
    DateTime, Datelike, Days, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeDelta, TimeZone, Timelike,
};

use crate::TimeUnit;

pub(crate) fn normalize_first_day(first_day_of_week: u32) -> u32 {
    if (1..=7).contains(&first_day_of_week) {
        first_day_of_week
    } else {
        1
    }
}

pub(crate) fn normalize_first_month(first_month_of_year: u32) -> u32 {
    if (1..=12).contains(&first_month_of_year) {
        first_month_of_year
    } else {
        1
    }
}

/// Move `t` by `n` units. Seconds, minutes and hours are exact durations;
/// days and weeks keep the local wall-clock time; months, quarters and
/// years keep the day of month where it exists, otherwise the last day.
pub fn offset<Tz: TimeZone>(t: DateTime<Tz>, unit: TimeUnit, n: i32) -> Option<DateTime<Tz>> {
    let n64 = i64::from(n);
    match unit {
        TimeUnit::Second => t.checked_add_signed(TimeDelta::try_seconds(n64)?),
        TimeUnit::Minute => t.checked_add_signed(TimeDelta::try_minutes(n64)?),
        TimeUnit::Hour => t.checked_add_signed(TimeDelta::try_hours(n64)?),
        TimeUnit::Day => offset_days(&t, n64),
        TimeUnit::Week => offset_days(&t, n64.checked_mul(7)?),
        TimeUnit::Month => offset_months(&t, n),
        TimeUnit::Quarter => offset_months(&t, n.checked_mul(3)?),
        TimeUnit::Year => offset_months(&t, n.checked_mul(12)?),
    }
}

fn offset_days<Tz: TimeZone>(t: &DateTime<Tz>, days: i64) -> Option<DateTime<Tz>> {
    let naive = local_time(t)?.checked_add_signed(TimeDelta::try_days(days)?)?;
    localize(&t.timezone(), naive)
}

fn offset_months<Tz: TimeZone>(t: &DateTime<Tz>, months: i32) -> Option<DateTime<Tz>> {
    let naive = local_time(t)?;
    let shifted = if months >= 0 {
        naive.checked_add_months(Months::new(months.unsigned_abs()))?
    } else {
        naive.checked_sub_months(Months::new(months.unsigned_abs()))?
    };
    localize(&t.timezone(), shifted)
}

/// Start of the bucket containing `t`. `None` as unit leaves `t` untouched.
pub fn truncate_time<Tz: TimeZone>(
    t: DateTime<Tz>,
    unit: Option<TimeUnit>,
    first_day_of_week: u32,
    first_month_of_year: u32,
) -> Option<DateTime<Tz>> {
    let Some(unit) = unit else {
        return Some(t);
    };

    let local = local_time(&t)?;
    let nanos = TimeDelta::nanoseconds(i64::from(local.nanosecond()));
    let date = local.date();
    let start = match unit {
        // sub-day units subtract from the instant so that DST folds are left alone
        TimeUnit::Second => return t.checked_sub_signed(nanos),
        TimeUnit::Minute => {
            let elapsed = TimeDelta::seconds(i64::from(local.second())) + nanos;
            return t.checked_sub_signed(elapsed);
        }
        TimeUnit::Hour => {
            let elapsed =
                TimeDelta::seconds(i64::from(local.minute() * 60 + local.second())) + nanos;
            return t.checked_sub_signed(elapsed);
        }
        TimeUnit::Day => date,
        TimeUnit::Week => {
            let first_day = normalize_first_day(first_day_of_week);
            let weekday = date.weekday().number_from_monday();
            let back = (weekday + 7 - first_day) % 7;
            date.checked_sub_days(Days::new(u64::from(back)))?
        }
        TimeUnit::Month => date.with_day(1)?,
        TimeUnit::Quarter => {
            let first_month = normalize_first_month(first_month_of_year);
            let back = (3 + date.month() - first_month % 3) % 3;
            date.with_day(1)?.checked_sub_months(Months::new(back))?
        }
        TimeUnit::Year => {
            let first_month = normalize_first_month(first_month_of_year);
            let year = if date.month() >= first_month {
                date.year()
            } else {
                date.year() - 1
            };
            NaiveDate::from_ymd_opt(year, first_month, 1)?
        }
    };
    localize(&t.timezone(), start.and_time(NaiveTime::MIN))
}

/// `t` itself when it sits on a bucket boundary, otherwise the start of the
/// next bucket.
pub fn ceil_time<Tz: TimeZone>(
    t: DateTime<Tz>,
    unit: Option<TimeUnit>,
    first_day_of_week: u32,
    first_month_of_year: u32,
) -> Option<DateTime<Tz>> {
    let Some(unit) = unit else {
        return Some(t);
    };
    let truncated = truncate_time(t.clone(), Some(unit), first_day_of_week, first_month_of_year)?;
    if truncated == t {
        Some(t)
    } else {
        offset(truncated, unit, 1)
    }
}

// Wall-clock time of `t`, `None` when it lies past the range of `NaiveDateTime`.
fn local_time<Tz: TimeZone>(t: &DateTime<Tz>) -> Option<NaiveDateTime> {
    t.naive_utc().checked_add_offset(t.offset().fix())
}

// An ambiguous wall-clock time takes the earlier instant. One skipped by a
// DST jump is read with the offset in force before the jump, landing after it.
pub(crate) fn localize<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let before = naive.checked_sub_signed(TimeDelta::try_days(1)?)?;
            let offset = tz.offset_from_utc_datetime(&before).fix();
            let utc = naive
                .checked_sub_signed(TimeDelta::try_seconds(i64::from(offset.local_minus_utc()))?)?;
            Some(tz.from_utc_datetime(&utc))
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::{America::New_York, Pacific::Kiritimati};

    use super::{ceil_time, offset, truncate_time};
    use crate::TimeUnit;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    macro_rules! assert_truncate {
        ($t:literal, $unit:ident, $expect:literal) => {
            assert_truncate!($t, $unit, 1, 1, $expect)
        };
        ($t:literal, $unit:ident, $day:literal, $month:literal, $expect:literal) => {
            let got = truncate_time(utc($t), Some(TimeUnit::$unit), $day, $month).unwrap();
            assert_eq!(got, utc($expect), "truncating {} to {:?}", $t, TimeUnit::$unit);
        };
    }

    #[test]
    fn truncation() {
        assert_truncate!("2024-03-15T10:17:42.5Z", Second, "2024-03-15T10:17:42Z");
        assert_truncate!("2024-03-15T10:17:42Z", Minute, "2024-03-15T10:17:00Z");
        assert_truncate!("2024-03-15T10:17:42Z", Hour, "2024-03-15T10:00:00Z");
        assert_truncate!("2024-03-15T10:17:42Z", Day, "2024-03-15T00:00:00Z");
        // 2024-03-15 is a Friday
        assert_truncate!("2024-03-15T10:17:42Z", Week, "2024-03-11T00:00:00Z");
        assert_truncate!("2024-03-15T10:17:42Z", Week, 7, 1, "2024-03-10T00:00:00Z");
        assert_truncate!("2024-03-15T10:17:42Z", Week, 5, 1, "2024-03-15T00:00:00Z");
        assert_truncate!("2024-03-15T10:17:42Z", Week, 6, 1, "2024-03-09T00:00:00Z");
        assert_truncate!("2024-03-15T10:17:42Z", Month, "2024-03-01T00:00:00Z");
        assert_truncate!("2024-03-15T10:17:42Z", Quarter, "2024-01-01T00:00:00Z");
        assert_truncate!("2024-03-15T10:17:42Z", Quarter, 1, 2, "2024-02-01T00:00:00Z");
        assert_truncate!("2024-01-15T10:17:42Z", Quarter, 1, 2, "2023-11-01T00:00:00Z");
        assert_truncate!("2024-03-15T10:17:42Z", Year, "2024-01-01T00:00:00Z");
        assert_truncate!("2024-03-15T10:17:42Z", Year, 1, 4, "2023-04-01T00:00:00Z");
        assert_truncate!("2024-04-15T10:17:42Z", Year, 1, 4, "2024-04-01T00:00:00Z");
        // out of range settings fall back to Monday / January
        assert_truncate!("2024-03-15T10:17:42Z", Week, 0, 0, "2024-03-11T00:00:00Z");
        assert_truncate!("2024-03-15T10:17:42Z", Year, 9, 13, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn unspecified_unit_is_identity() {
        let t = utc("2024-03-15T10:17:42Z");
        assert_eq!(truncate_time(t, None, 1, 1), Some(t));
        assert_eq!(ceil_time(t, None, 1, 1), Some(t));
    }

    #[test]
    fn ceiling() {
        let t = utc("2024-03-15T10:17:42Z");
        assert_eq!(
            ceil_time(t, Some(TimeUnit::Day), 1, 1),
            Some(utc("2024-03-16T00:00:00Z"))
        );
        assert_eq!(
            ceil_time(t, Some(TimeUnit::Month), 1, 1),
            Some(utc("2024-04-01T00:00:00Z"))
        );

        let boundary = utc("2024-03-15T00:00:00Z");
        assert_eq!(ceil_time(boundary, Some(TimeUnit::Day), 1, 1), Some(boundary));
    }

    #[test]
    fn local_midnight() {
        let t = New_York.with_ymd_and_hms(2024, 3, 15, 22, 30, 0).unwrap();
        let day = truncate_time(t, Some(TimeUnit::Day), 1, 1).unwrap();
        assert_eq!(day, New_York.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
        assert_eq!(day.with_timezone(&Utc), utc("2024-03-15T04:00:00Z"));
    }

    #[test]
    fn offsets_across_dst() {
        // New York springs forward on 2024-03-10
        let before = New_York.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let next_day = offset(before, TimeUnit::Day, 1).unwrap();
        assert_eq!(next_day, New_York.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap());
        assert_eq!(next_day - before, chrono::TimeDelta::hours(23));

        let next_hours = offset(before, TimeUnit::Hour, 24).unwrap();
        assert_eq!(next_hours, New_York.with_ymd_and_hms(2024, 3, 10, 13, 0, 0).unwrap());

        // 02:30 does not exist that day
        let skipped = New_York.with_ymd_and_hms(2024, 3, 9, 2, 30, 0).unwrap();
        let moved = offset(skipped, TimeUnit::Day, 1).unwrap();
        assert_eq!(moved.with_timezone(&Utc), utc("2024-03-10T07:30:00Z"));
    }

    #[test]
    fn local_time_past_the_calendar() {
        // UTC+14 pushes the wall clock beyond the last representable date
        let t = DateTime::<Utc>::MAX_UTC.with_timezone(&Kiritimati);
        assert_eq!(truncate_time(t, Some(TimeUnit::Year), 1, 1), None);
        assert_eq!(truncate_time(t, Some(TimeUnit::Hour), 1, 1), None);
        assert_eq!(ceil_time(t, Some(TimeUnit::Day), 1, 1), None);
        assert_eq!(offset(t, TimeUnit::Day, -1), None);
        assert_eq!(offset(t, TimeUnit::Month, -1), None);
    }

    #[test]
    fn month_offsets_clamp() {
        let t = utc("2024-01-31T08:00:00Z");
        assert_eq!(offset(t, TimeUnit::Month, 1), Some(utc("2024-02-29T08:00:00Z")));
        assert_eq!(offset(t, TimeUnit::Quarter, -1), Some(utc("2023-10-31T08:00:00Z")));
        assert_eq!(offset(t, TimeUnit::Year, 1), Some(utc("2025-01-31T08:00:00Z")));
        assert_eq!(offset(t, TimeUnit::Week, -2), Some(utc("2024-01-17T08:00:00Z")));
    }
}
