use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, trace};

use crate::{
    datetime::{ceil_time, localize, normalize_first_day, normalize_first_month, truncate_time},
    types::{Anchor, RillTime, TimeAnchor},
    ResolveError, ResolveResult,
};

/// What an expression is resolved against: the current instant, the range
/// of the data and the calendar convention.
///
/// The default context has every instant at the Unix epoch, which resolves
/// `earliest`/`latest` to that degenerate instant rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolverContext {
    pub now: DateTime<Utc>,
    pub min_time: DateTime<Utc>,
    pub max_time: DateTime<Utc>,
    /// 1 = Monday .. 7 = Sunday
    pub first_day_of_week: u32,
    /// 1 = January .. 12 = December
    pub first_month_of_year: u32,
}

impl ResolverContext {
    /// A context where the data ends at `now`. Weeks start on Monday and
    /// years in January.
    pub fn new(now: DateTime<Utc>) -> ResolverContext {
        ResolverContext {
            now,
            min_time: now,
            max_time: now,
            first_day_of_week: 1,
            first_month_of_year: 1,
        }
    }

    #[must_use]
    pub fn with_min_time(mut self, min_time: DateTime<Utc>) -> ResolverContext {
        self.min_time = min_time;
        self
    }

    #[must_use]
    pub fn with_max_time(mut self, max_time: DateTime<Utc>) -> ResolverContext {
        self.max_time = max_time;
        self
    }

    #[must_use]
    pub fn with_first_day_of_week(mut self, first_day_of_week: u32) -> ResolverContext {
        self.first_day_of_week = normalize_first_day(first_day_of_week);
        self
    }

    #[must_use]
    pub fn with_first_month_of_year(mut self, first_month_of_year: u32) -> ResolverContext {
        self.first_month_of_year = normalize_first_month(first_month_of_year);
        self
    }
}

impl RillTime {
    /// Resolve into `(start, end)` instants in the expression's time zone.
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use rilltime::{parse, ResolverContext};
    ///
    /// let ctx = ResolverContext::new(Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap());
    /// let (start, end) = parse("-1d,0d").unwrap().resolve(&ctx).unwrap();
    ///
    /// assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap());
    /// assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
    /// ```
    ///
    /// The range is not reordered: an expression such as `P7D` whose start
    /// lies after its end resolves to an inverted range.
    pub fn resolve(&self, ctx: &ResolverContext) -> ResolveResult<(DateTime<Tz>, DateTime<Tz>)> {
        let mut shifted = *ctx;
        if let Some(as_of) = self.as_of() {
            shifted.now = self.shift(ctx, as_of, ctx.now)?;
            shifted.min_time = self.shift(ctx, as_of, ctx.min_time)?;
            shifted.max_time = self.shift(ctx, as_of, ctx.max_time)?;
            trace!(
                now = %shifted.now,
                min_time = %shifted.min_time,
                max_time = %shifted.max_time,
                "shifted resolver context"
            );
        }
        let ctx = &shifted;

        // a range ending at `latest` counts back from the data, not the clock
        let baseline = if self.end.anchor == Anchor::Latest {
            ctx.max_time
        } else {
            ctx.now
        };

        let start = self.modify(ctx, &self.start, baseline.with_timezone(&self.time_zone), true)?;
        let end = self.modify(ctx, &self.end, ctx.now.with_timezone(&self.time_zone), true)?;

        debug!(expr = %self, %start, %end, "resolved time range");
        Ok((start, end))
    }

    fn shift(
        &self,
        ctx: &ResolverContext,
        as_of: &TimeAnchor,
        t: DateTime<Utc>,
    ) -> ResolveResult<DateTime<Utc>> {
        let shifted = self.modify(ctx, as_of, t.with_timezone(&self.time_zone), false)?;
        Ok(shifted.with_timezone(&Utc))
    }

    /// Locate `anchor` relative to `t`. `add_offset` applies the "as of"
    /// shift to absolute anchors; it is off while computing that shift.
    fn modify(
        &self,
        ctx: &ResolverContext,
        anchor: &TimeAnchor,
        t: DateTime<Tz>,
        add_offset: bool,
    ) -> ResolveResult<DateTime<Tz>> {
        let tz = self.time_zone;
        let (mut t, mut unit, mut truncate) = match anchor.anchor {
            Anchor::Now => (ctx.now.with_timezone(&tz), self.grain, self.is_complete),
            Anchor::Earliest => (ctx.min_time.with_timezone(&tz), self.grain, true),
            Anchor::Latest => (ctx.max_time.with_timezone(&tz), self.grain, self.is_complete),
            Anchor::AbsoluteDate(date) => {
                let t = self.absolute(ctx, date.and_time(NaiveTime::MIN), add_offset)?;
                (t, None, true)
            }
            Anchor::AbsoluteTime(time) => (self.absolute(ctx, time, add_offset)?, None, true),
            Anchor::Grain(grain) => {
                let t = grain.offset(t).ok_or(ResolveError::OutOfRange)?;
                (t, Some(grain.unit), true)
            }
        };

        if let Some(offset) = anchor.offset {
            t = offset.offset(t).ok_or(ResolveError::OutOfRange)?;
        }
        if let Some(trunc) = anchor.trunc {
            unit = Some(trunc);
            truncate = true;
        }

        let (first_day, first_month) = (ctx.first_day_of_week, ctx.first_month_of_year);
        let t = if truncate {
            truncate_time(t, unit, first_day, first_month)
        } else {
            ceil_time(t, unit, first_day, first_month)
        };
        t.ok_or(ResolveError::OutOfRange)
    }

    // Absolute anchors are wall-clock times in the expression's zone.
    fn absolute(
        &self,
        ctx: &ResolverContext,
        local: NaiveDateTime,
        add_offset: bool,
    ) -> ResolveResult<DateTime<Tz>> {
        let t = localize(&self.time_zone, local).ok_or(ResolveError::OutOfRange)?;
        match self.as_of() {
            Some(as_of) if add_offset => self.modify(ctx, as_of, t, false),
            _ => Ok(t),
        }
    }
}
