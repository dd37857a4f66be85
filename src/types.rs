use core::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::{datetime, ParseError, ParseResult};

/// A calendar unit, as spelled by its single letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeUnit {
    /// `d` and `D` both spell a day.
    pub fn from_code(code: &str) -> Option<TimeUnit> {
        match code {
            "s" => Some(TimeUnit::Second),
            "m" => Some(TimeUnit::Minute),
            "h" => Some(TimeUnit::Hour),
            "d" | "D" => Some(TimeUnit::Day),
            "W" => Some(TimeUnit::Week),
            "M" => Some(TimeUnit::Month),
            "Q" => Some(TimeUnit::Quarter),
            "Y" => Some(TimeUnit::Year),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            TimeUnit::Second => 's',
            TimeUnit::Minute => 'm',
            TimeUnit::Hour => 'h',
            TimeUnit::Day => 'd',
            TimeUnit::Week => 'W',
            TimeUnit::Month => 'M',
            TimeUnit::Quarter => 'Q',
            TimeUnit::Year => 'Y',
        }
    }
}

/// A signed number of [`TimeUnit`]s, like `-7d`. A bare unit (`d`) has no
/// count and only selects a truncation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grain {
    pub num: Option<i32>,
    pub unit: TimeUnit,
}

impl Grain {
    pub fn new(num: Option<i32>, unit: TimeUnit) -> Grain {
        Grain { num, unit }
    }

    /// Shift `t` by this grain. Sub-day units move the instant, days and
    /// weeks move the local calendar date and the remaining units move
    /// calendar months.
    pub fn offset<Tz2: TimeZone>(&self, t: DateTime<Tz2>) -> Option<DateTime<Tz2>> {
        match self.num {
            Some(n) if n != 0 => datetime::offset(t, self.unit, n),
            _ => Some(t),
        }
    }
}

/// The point in time an anchor refers to, before any offset or truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Grain(Grain),
    AbsoluteDate(NaiveDate),
    AbsoluteTime(NaiveDateTime),
    Now,
    Latest,
    Earliest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAnchor {
    pub anchor: Anchor,
    /// Additional shift applied once the anchor is located, e.g. the `-1h` in `now-1h`.
    pub offset: Option<Grain>,
    /// Explicit truncation unit from a `/unit` suffix.
    pub trunc: Option<TimeUnit>,
}

impl TimeAnchor {
    pub fn new(anchor: Anchor) -> TimeAnchor {
        TimeAnchor {
            anchor,
            offset: None,
            trunc: None,
        }
    }

    pub fn now() -> TimeAnchor {
        TimeAnchor::new(Anchor::Now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifiers {
    /// `:d`, include the still filling bucket.
    Grain(Grain),
    /// `:|d|`, only complete buckets.
    CompleteGrain(Grain),
}

/// The `@` part of an expression: an "as of" shift and a time zone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AtModifiers {
    pub offset: Option<TimeAnchor>,
    pub time_zone: Option<String>,
}

/// A parsed time range expression.
///
/// Built by [`crate::parse`]; resolve it against a
/// [`ResolverContext`](crate::ResolverContext) with [`RillTime::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RillTime {
    pub(crate) start: TimeAnchor,
    pub(crate) end: TimeAnchor,
    pub(crate) modifiers: Option<Modifiers>,
    pub(crate) at_modifiers: Option<AtModifiers>,
    pub(crate) is_new_format: bool,
    pub(crate) grain: Option<TimeUnit>,
    pub(crate) is_complete: bool,
    pub(crate) time_zone: Tz,
}

impl RillTime {
    /// Derive the ambient grain and time zone. A missing end means `now`.
    pub(crate) fn new(
        start: TimeAnchor,
        end: Option<TimeAnchor>,
        modifiers: Option<Modifiers>,
        at_modifiers: Option<AtModifiers>,
    ) -> ParseResult<RillTime> {
        let (grain, is_complete) = match modifiers {
            Some(Modifiers::Grain(g)) => (Some(g.unit), false),
            Some(Modifiers::CompleteGrain(g)) => (Some(g.unit), true),
            None => (None, false),
        };

        let time_zone = match at_modifiers.as_ref().and_then(|at| at.time_zone.as_deref()) {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| ParseError::TimeZoneInvalid(name.to_owned()))?,
            None => Tz::UTC,
        };

        Ok(RillTime {
            start,
            end: end.unwrap_or_else(TimeAnchor::now),
            modifiers,
            at_modifiers,
            is_new_format: false,
            grain,
            is_complete,
            time_zone,
        })
    }

    pub fn start(&self) -> &TimeAnchor {
        &self.start
    }

    pub fn end(&self) -> &TimeAnchor {
        &self.end
    }

    pub fn modifiers(&self) -> Option<&Modifiers> {
        self.modifiers.as_ref()
    }

    pub fn at_modifiers(&self) -> Option<&AtModifiers> {
        self.at_modifiers.as_ref()
    }

    /// The ambient truncation unit, `None` when the expression has no modifiers.
    pub fn grain(&self) -> Option<TimeUnit> {
        self.grain
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// Whether the expression was read by the grammar rather than a legacy adapter.
    pub fn is_new_format(&self) -> bool {
        self.is_new_format
    }

    pub(crate) fn as_of(&self) -> Option<&TimeAnchor> {
        self.at_modifiers.as_ref().and_then(|at| at.offset.as_ref())
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl fmt::Display for Grain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.num {
            Some(n) => write!(f, "{n}{}", self.unit),
            None => write!(f, "{}", self.unit),
        }
    }
}

impl fmt::Display for TimeAnchor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.anchor {
            Anchor::Grain(g) => write!(f, "{g}")?,
            Anchor::AbsoluteDate(d) => write!(f, "{}", d.format("%Y-%m-%d"))?,
            Anchor::AbsoluteTime(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M"))?,
            Anchor::Now => f.write_str("now")?,
            Anchor::Latest => f.write_str("latest")?,
            Anchor::Earliest => f.write_str("earliest")?,
        }
        match self.offset {
            // signed so that `now+1h` does not print as `now1h`
            Some(Grain { num: Some(n), unit }) => write!(f, "{n:+}{unit}")?,
            Some(Grain { num: None, unit }) => write!(f, "{unit}")?,
            None => {}
        }
        if let Some(trunc) = self.trunc {
            write!(f, "/{trunc}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Modifiers::Grain(g) => write!(f, "{g}"),
            Modifiers::CompleteGrain(g) => write!(f, "|{g}|"),
        }
    }
}

impl fmt::Display for AtModifiers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(offset) = &self.offset {
            write!(f, "{offset}")?;
        }
        if let Some(tz) = &self.time_zone {
            write!(f, "{{{tz}}}")?;
        }
        Ok(())
    }
}

/// Prints the canonical expression, which parses back to the same value.
impl fmt::Display for RillTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{}", self.start, self.end)?;
        if let Some(modifiers) = &self.modifiers {
            write!(f, ":{modifiers}")?;
        }
        if let Some(at) = &self.at_modifiers {
            write!(f, "@{at}")?;
        }
        Ok(())
    }
}
