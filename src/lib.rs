//! ## Relative Time Ranges
//!
//! Dashboards, reports and alerts describe the window they aggregate over
//! with a short expression such as "the last seven days" or "month to date".
//! This crate parses those expressions and resolves them against the current
//! time and the time span of the underlying data, giving a `[start, end)`
//! pair of instants.
//!
//! ## Supported Formats
//!
//! The main syntax is a start anchor, an optional end anchor, optional
//! modifiers and an optional `@` part:
//!
//! ```text
//! -7d,now:|d|@-1W{America/New_York}
//! ```
//!
//! An anchor is `now`, `latest` (the last timestamp in the data), `earliest`
//! (the first one), a date `2024-03-01`, a date and time `2024-03-01 10:30`,
//! or a grain: an optional signed count and one of the units `s`, `m`, `h`,
//! `d` (or `D`), `W`, `M`, `Q`, `Y`. A grain moves the base time by that many
//! units and truncates the result to the unit, so `-7d` is midnight seven days
//! ago and `0M` the start of the current month. Any anchor may be followed by
//! a further offset (`now-1h`) and an explicit truncation (`latest/h`). The end
//! anchor defaults to `now`.
//!
//! After `:`, a bare grain such as `d` truncates `now` and `latest` *up* to the
//! next day so that the running day is included, while `|d|` truncates them
//! *down* so only complete days remain.
//!
//! After `@`, an anchor resolves the whole range "as of" that earlier time,
//! and `{Zone/Name}` does all calendar arithmetic in that IANA time zone
//! instead of UTC.
//!
//! Three older notations are also accepted:
//!
//! - `inf`, everything from `earliest` to `latest`;
//! - `rill-` macros: `rill-TD`, `rill-WTD`, `rill-MTD`, `rill-QTD`, `rill-YTD`
//!   for period to date and `rill-PDC`, `rill-PWC`, `rill-PMC`, `rill-PQC`,
//!   `rill-PYC` (or without the `C`) for the previous complete period;
//! - ISO 8601 durations like `P7D` or `PT12H`.
//!
//! ## API
//!
//! [`parse`] turns text into a [`RillTime`], which can then be resolved any
//! number of times with [`RillTime::resolve`] and a [`ResolverContext`].
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use rilltime::{parse, ResolverContext};
//!
//! let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
//! let ctx = ResolverContext::new(now).with_max_time(Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap());
//!
//! let (start, end) = parse("rill-TD").unwrap().resolve(&ctx).unwrap();
//! assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
//! assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap());
//! ```
//!
//! A [`RillTime`] prints as its canonical expression, so it can be stored
//! and parsed again later.
//!
//! There is a little command-line program `cli` in the `demos` folder which
//! can be used to play with these expressions.
#![warn(clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

pub mod datetime;
mod errors;
mod legacy;
mod parser;
mod resolve;
mod types;

use core::str::FromStr;

use tracing::debug;

pub use errors::{ParseError, ParseResult, ResolveError, ResolveResult, SyntaxError};
pub use legacy::{lookup_macro, parse_legacy};
pub use resolve::ResolverContext;
pub use types::{Anchor, AtModifiers, Grain, Modifiers, RillTime, TimeAnchor, TimeUnit};

/// Parse a time range expression in any of the supported notations.
///
/// ```
/// use rilltime::{parse, Anchor, TimeUnit};
///
/// let rt = parse("-7d,now:|d|").unwrap();
/// assert_eq!(rt.end().anchor, Anchor::Now);
/// assert_eq!(rt.grain(), Some(TimeUnit::Day));
/// assert!(rt.is_complete());
/// assert_eq!(rt.to_string(), "-7d,now:|d|");
/// ```
pub fn parse(text: &str) -> ParseResult<RillTime> {
    if let Some(rt) = parse_legacy(text, false)? {
        return Ok(rt);
    }

    let mut rt = parser::RillTimeParser::new(text).parse()?;
    rt.is_new_format = true;
    debug!(text, "parsed time range");
    Ok(rt)
}

impl FromStr for RillTime {
    type Err = ParseError;

    fn from_str(s: &str) -> ParseResult<RillTime> {
        parse(s)
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use crate::RillTime;

    impl Serialize for RillTime {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for RillTime {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<RillTime, D::Error> {
            struct Visitor;

            impl de::Visitor<'_> for Visitor {
                type Value = RillTime;

                fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                    f.write_str("a time range expression")
                }

                fn visit_str<E: de::Error>(self, value: &str) -> Result<RillTime, E> {
                    value.parse().map_err(de::Error::custom)
                }
            }

            deserializer.deserialize_str(Visitor)
        }
    }
}
