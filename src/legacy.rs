//! Older spellings of a time range that are still accepted: `inf`, the
//! `rill-` prefixed period macros and ISO 8601 durations.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::{
    types::{Anchor, Grain, RillTime, TimeAnchor, TimeUnit},
    ParseError, ParseResult, SyntaxError,
};

const MACRO_PREFIX: &str = "rill-";

// "PP" (period over period) is reserved and maps to nothing yet.
const MACROS: &[(&str, &str)] = &[
    ("TD", "0d,latest"),
    ("WTD", "0W,latest"),
    ("MTD", "0M,latest"),
    ("QTD", "0Q,latest"),
    ("YTD", "0Y,latest"),
    ("PDC", "-1d,0d"),
    ("PWC", "-1W,0W"),
    ("PMC", "-1M,0M"),
    ("PQC", "-1Q,0Q"),
    ("PYC", "-1Y,0Y"),
    ("PP", ""),
    ("PD", "-1d,0d"),
    ("PW", "-1W,0W"),
    ("PM", "-1M,0M"),
    ("PQ", "-1Q,0Q"),
    ("PY", "-1Y,0Y"),
];

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^P((?P<year>[0-9]+)Y)?((?P<month>[0-9]+)M)?((?P<week>[0-9]+)W)?((?P<day>[0-9]+)D)?(T((?P<hour>[0-9]+)H)?((?P<minute>[0-9]+)M)?((?P<second>[0-9]+)S)?)?$",
    )
    .expect("duration pattern is valid")
});

// capture names in the order they appear in the pattern
const DURATION_UNITS: &[(&str, TimeUnit)] = &[
    ("year", TimeUnit::Year),
    ("month", TimeUnit::Month),
    ("week", TimeUnit::Week),
    ("day", TimeUnit::Day),
    ("hour", TimeUnit::Hour),
    ("minute", TimeUnit::Minute),
    ("second", TimeUnit::Second),
];

/// The new format expression a `rill-` macro code stands for.
pub fn lookup_macro(code: &str) -> Option<&'static str> {
    MACROS
        .iter()
        .find(|(name, _)| *name == code)
        .map(|(_, expr)| *expr)
}

/// Try the legacy forms in order. `Ok(None)` means `text` is not a legacy
/// expression and should go to the grammar, unless `strict` is set, in which
/// case it is an error.
pub fn parse_legacy(text: &str, strict: bool) -> ParseResult<Option<RillTime>> {
    if text.eq_ignore_ascii_case("inf") {
        debug!(text, "parsed infinite time range");
        let rt = RillTime::new(
            TimeAnchor::new(Anchor::Earliest),
            Some(TimeAnchor::new(Anchor::Latest)),
            None,
            None,
        )?;
        return Ok(Some(rt));
    }

    if let Some(code) = text.strip_prefix(MACRO_PREFIX) {
        if let Some(expr) = lookup_macro(code) {
            // reserved codes have no expansion yet
            if expr.is_empty() {
                return Err(SyntaxError::new(code, MACRO_PREFIX.len()..text.len()).into());
            }
            debug!(text, expr, "expanding time range macro");
            return crate::parse(expr).map(Some);
        }
        if strict {
            return Err(ParseError::UnknownMacro(code.to_owned()));
        }
    }

    let Some(captures) = DURATION.captures(text) else {
        if strict {
            return Err(ParseError::InvalidDuration {
                text: text.to_owned(),
                component: text.to_owned(),
            });
        }
        return Ok(None);
    };

    // Only the last component survives, so "P1Y2M" means two months. Stored
    // expressions rely on this.
    let mut grain = None;
    let mut components = 0;
    for (name, unit) in DURATION_UNITS {
        let Some(m) = captures.name(name) else {
            continue;
        };
        let num = m
            .as_str()
            .parse::<i32>()
            .map_err(|_| ParseError::InvalidDuration {
                text: text.to_owned(),
                component: m.as_str().to_owned(),
            })?;
        grain = Some(Grain::new(Some(num), *unit));
        components += 1;
    }
    if components > 1 {
        warn!(text, "compound ISO 8601 duration only keeps its last component");
    }

    // a bare "P" or "PT" matches the pattern but names no unit
    let Some(grain) = grain else {
        return Err(ParseError::InvalidDuration {
            text: text.to_owned(),
            component: String::new(),
        });
    };

    debug!(text, %grain, "parsed ISO 8601 duration");
    RillTime::new(TimeAnchor::new(Anchor::Grain(grain)), None, None, None).map(Some)
}

#[cfg(test)]
mod tests {
    use super::{lookup_macro, parse_legacy, MACROS};
    use crate::types::{Anchor, Grain, TimeUnit};
    use crate::{ParseError, SyntaxError};

    macro_rules! assert_duration {
        ($s:literal, $num:literal, $unit:ident) => {
            let rt = parse_legacy($s, false).unwrap().expect($s);
            assert_eq!(
                rt.start().anchor,
                Anchor::Grain(Grain::new(Some($num), TimeUnit::$unit)),
                "parsing {:?}",
                $s
            );
            assert_eq!(rt.end().anchor, Anchor::Now);
        };
    }

    #[test]
    fn infinite() {
        for text in ["inf", "INF", "Inf"] {
            let rt = parse_legacy(text, false).unwrap().unwrap();
            assert_eq!(rt.start().anchor, Anchor::Earliest);
            assert_eq!(rt.end().anchor, Anchor::Latest);
            assert_eq!(rt.modifiers(), None);
        }
        assert_eq!(parse_legacy("infinity", false), Ok(None));
    }

    #[test]
    fn durations() {
        assert_duration!("P7D", 7, Day);
        assert_duration!("P2W", 2, Week);
        assert_duration!("P3M", 3, Month);
        assert_duration!("P1Y", 1, Year);
        assert_duration!("PT12H", 12, Hour);
        assert_duration!("PT30M", 30, Minute);
        assert_duration!("PT45S", 45, Second);
        // last component wins
        assert_duration!("P1Y2M", 2, Month);
        assert_duration!("P1DT6H", 6, Hour);
    }

    #[test]
    fn duration_errors() {
        assert_eq!(
            parse_legacy("P99999999999D", false),
            Err(ParseError::InvalidDuration {
                text: "P99999999999D".into(),
                component: "99999999999".into(),
            })
        );
        assert!(matches!(
            parse_legacy("PT", false),
            Err(ParseError::InvalidDuration { .. })
        ));
        assert!(matches!(
            parse_legacy("-7d,now", true),
            Err(ParseError::InvalidDuration { .. })
        ));
        assert_eq!(parse_legacy("-7d,now", false), Ok(None));
        assert_eq!(parse_legacy("p7d", false), Ok(None));
        // only ASCII digits count
        assert_eq!(parse_legacy("P\u{663}D", false), Ok(None));
        assert!(matches!(
            parse_legacy("P\u{663}D", true),
            Err(ParseError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn macros() {
        for (code, _) in MACROS.iter().filter(|(_, expr)| !expr.is_empty()) {
            let text = format!("rill-{code}");
            let rt = parse_legacy(&text, false).unwrap();
            assert!(rt.is_some(), "{text} should expand");
        }
        assert_eq!(lookup_macro("PDC"), Some("-1d,0d"));
        assert_eq!(lookup_macro("PD"), lookup_macro("PDC"));
        assert_eq!(lookup_macro("XYZ"), None);

        assert_eq!(parse_legacy("rill-XYZ", false), Ok(None));
        assert_eq!(
            parse_legacy("rill-XYZ", true),
            Err(ParseError::UnknownMacro("XYZ".into()))
        );
        // reserved, the error points at the code
        assert_eq!(
            parse_legacy("rill-PP", false),
            Err(ParseError::Syntax(SyntaxError {
                fragment: "PP".into(),
                span: 5..7,
            }))
        );
    }
}
