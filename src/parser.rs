use chrono::{NaiveDate, NaiveDateTime};
use logos::{Lexer, Logos};

use crate::{
    types::{Anchor, AtModifiers, Grain, Modifiers, RillTime, TimeAnchor, TimeUnit},
    ParseError, ParseResult, SyntaxError,
};

#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Tokens {
    // keywords are literal tokens, so they always win over the unit letters
    #[token("now")]
    Now,
    #[token("latest")]
    Latest,
    #[token("earliest")]
    Earliest,

    #[regex("[smhdDWQMY]", |lex| TimeUnit::from_code(lex.slice()))]
    Unit(TimeUnit),

    #[regex(r"\{[^}]+\}")]
    TimeZone,

    #[regex(r"[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9] [0-9][0-9]:[0-9][0-9]")]
    AbsoluteTime,
    #[regex(r"[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]")]
    AbsoluteDate,

    #[regex("[-+]?[0-9]+", |lex| lex.slice().parse::<i32>().ok())]
    Number(i32),

    // punctuation
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("@")]
    At,
    #[token("|")]
    Pipe,
    #[token("/")]
    Slash,
}

/// Recursive descent over
///
/// ```text
/// expr      := anchor (',' anchor)? (':' modifiers)? ('@' atmods)?
/// anchor    := (grain | date | datetime | now | latest | earliest) grain? ('/' unit)?
/// modifiers := grain | '|' grain '|'
/// atmods    := anchor? '{' zone '}'?
/// grain     := number? unit
/// ```
pub struct RillTimeParser<'a> {
    s: Lexer<'a, Tokens>,
}

impl<'a> RillTimeParser<'a> {
    pub fn new(text: &'a str) -> RillTimeParser<'a> {
        RillTimeParser {
            s: Tokens::lexer(text),
        }
    }

    fn next(&mut self) -> ParseResult<Option<Tokens>> {
        match self.s.next() {
            Some(Ok(t)) => Ok(Some(t)),
            Some(Err(())) => Err(self.unexpected()),
            None => Ok(None),
        }
    }

    fn expect_next(&mut self) -> ParseResult<Tokens> {
        self.next()?.ok_or_else(|| self.unexpected_end())
    }

    // unrecognised text peeks as `None`; the following `next` reports it
    fn peek(&self) -> Option<Tokens> {
        self.s.clone().next().and_then(Result::ok)
    }

    fn eat(&mut self, token: Tokens) -> bool {
        if self.peek() == Some(token) {
            self.s.next();
            true
        } else {
            false
        }
    }

    /// Points at the token the lexer returned last.
    fn unexpected(&self) -> ParseError {
        SyntaxError::new(self.s.slice(), self.s.span()).into()
    }

    fn unexpected_end(&self) -> ParseError {
        let len = self.s.source().len();
        SyntaxError::new("", len..len).into()
    }

    fn unit(&mut self) -> ParseResult<TimeUnit> {
        match self.expect_next()? {
            Tokens::Unit(unit) => Ok(unit),
            _ => Err(self.unexpected()),
        }
    }

    fn grain(&mut self) -> ParseResult<Grain> {
        match self.expect_next()? {
            Tokens::Number(n) => Ok(Grain::new(Some(n), self.unit()?)),
            Tokens::Unit(unit) => Ok(Grain::new(None, unit)),
            _ => Err(self.unexpected()),
        }
    }

    fn starts_grain(&self) -> bool {
        matches!(self.peek(), Some(Tokens::Number(_) | Tokens::Unit(_)))
    }

    fn starts_anchor(&self) -> bool {
        self.starts_grain()
            || matches!(
                self.peek(),
                Some(
                    Tokens::Now
                        | Tokens::Latest
                        | Tokens::Earliest
                        | Tokens::AbsoluteDate
                        | Tokens::AbsoluteTime
                )
            )
    }

    fn anchor(&mut self) -> ParseResult<TimeAnchor> {
        let anchor = if self.starts_grain() {
            Anchor::Grain(self.grain()?)
        } else {
            match self.expect_next()? {
                Tokens::Now => Anchor::Now,
                Tokens::Latest => Anchor::Latest,
                Tokens::Earliest => Anchor::Earliest,
                Tokens::AbsoluteDate => NaiveDate::parse_from_str(self.s.slice(), "%Y-%m-%d")
                    .map(Anchor::AbsoluteDate)
                    .map_err(|_| self.unexpected())?,
                Tokens::AbsoluteTime => {
                    NaiveDateTime::parse_from_str(self.s.slice(), "%Y-%m-%d %H:%M")
                        .map(Anchor::AbsoluteTime)
                        .map_err(|_| self.unexpected())?
                }
                _ => return Err(self.unexpected()),
            }
        };

        let offset = if self.starts_grain() {
            Some(self.grain()?)
        } else {
            None
        };
        let trunc = if self.eat(Tokens::Slash) {
            Some(self.unit()?)
        } else {
            None
        };

        Ok(TimeAnchor {
            anchor,
            offset,
            trunc,
        })
    }

    fn modifiers(&mut self) -> ParseResult<Modifiers> {
        if self.eat(Tokens::Pipe) {
            let grain = self.grain()?;
            match self.expect_next()? {
                Tokens::Pipe => Ok(Modifiers::CompleteGrain(grain)),
                _ => Err(self.unexpected()),
            }
        } else {
            Ok(Modifiers::Grain(self.grain()?))
        }
    }

    fn at_modifiers(&mut self) -> ParseResult<AtModifiers> {
        let offset = if self.starts_anchor() {
            Some(self.anchor()?)
        } else {
            None
        };
        let time_zone = if self.eat(Tokens::TimeZone) {
            let name = self.s.slice().trim_start_matches('{').trim_end_matches('}');
            Some(name.trim().to_owned())
        } else {
            None
        };
        Ok(AtModifiers { offset, time_zone })
    }

    pub fn parse(mut self) -> ParseResult<RillTime> {
        let start = self.anchor()?;
        let end = if self.eat(Tokens::Comma) {
            Some(self.anchor()?)
        } else {
            None
        };
        let modifiers = if self.eat(Tokens::Colon) {
            Some(self.modifiers()?)
        } else {
            None
        };
        let at_modifiers = if self.eat(Tokens::At) {
            Some(self.at_modifiers()?)
        } else {
            None
        };

        if self.next()?.is_some() {
            return Err(self.unexpected());
        }

        RillTime::new(start, end, modifiers, at_modifiers)
    }
}
