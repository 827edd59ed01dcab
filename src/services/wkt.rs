//! Well-known-text (WKT) geometry parser for region boundaries.
//!
//! Supports the two geometry types region datasets carry:
//! - `POLYGON ((x y, ...), (hole...))`
//! - `MULTIPOLYGON (((x y, ...)), ((x y, ...), (hole...)))`
//!
//! Coordinates are `longitude latitude`; a third/fourth ordinate (Z, M) is
//! accepted and dropped. An EWKT `SRID=nnnn;` prefix is skipped.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use thiserror::Error;

/// Minimum number of distinct vertices in a ring.
const MIN_RING_VERTICES: usize = 3;

/// Errors that can occur during WKT parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WktError {
    #[error("geometry text is empty")]
    Empty,
    #[error("unsupported geometry type '{0}'")]
    UnsupportedType(String),
    #[error("expected {expected} at offset {offset}")]
    Unexpected {
        expected: &'static str,
        offset: usize,
    },
    #[error("invalid coordinate value '{0}'")]
    InvalidNumber(String),
    #[error("ring has {0} distinct vertices, at least 3 required")]
    DegenerateRing(usize),
}

/// Parse a WKT polygon or multipolygon into a `MultiPolygon`.
///
/// A plain `POLYGON` becomes a multipolygon with one member.
pub fn parse_wkt(text: &str) -> Result<MultiPolygon<f64>, WktError> {
    let body = match text.trim_start().strip_prefix("SRID=") {
        Some(rest) => rest.split_once(';').map(|(_, wkt)| wkt).unwrap_or(""),
        None => text,
    };

    let mut cursor = Cursor::new(body);
    let tag = cursor.word().ok_or(WktError::Empty)?.to_ascii_uppercase();

    // Optional dimension marker, or EMPTY
    if let Some(modifier) = cursor.word() {
        match modifier.to_ascii_uppercase().as_str() {
            "Z" | "M" | "ZM" => {}
            "EMPTY" => return Err(WktError::Empty),
            _ => return Err(WktError::UnsupportedType(format!("{} {}", tag, modifier))),
        }
    }

    let multi = match tag.as_str() {
        "POLYGON" => MultiPolygon::new(vec![cursor.polygon()?]),
        "MULTIPOLYGON" => {
            cursor.expect('(', "'('")?;
            let mut polygons = vec![cursor.polygon()?];
            while cursor.eat(',') {
                polygons.push(cursor.polygon()?);
            }
            cursor.expect(')', "')'")?;
            MultiPolygon::new(polygons)
        }
        _ => return Err(WktError::UnsupportedType(tag)),
    };

    cursor.skip_ws();
    if !cursor.at_end() {
        return Err(WktError::Unexpected {
            expected: "end of geometry",
            offset: cursor.pos,
        });
    }

    Ok(multi)
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    /// Consume `ch` if it is the next non-whitespace character.
    fn eat(&mut self, ch: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ch: char, expected: &'static str) -> Result<(), WktError> {
        if self.eat(ch) {
            Ok(())
        } else {
            Err(WktError::Unexpected {
                expected,
                offset: self.pos,
            })
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        self.skip_ws();
        let text = self.text;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &text[start..self.pos]
    }

    fn word(&mut self) -> Option<&'a str> {
        let w = self.take_while(|c| c.is_ascii_alphabetic());
        (!w.is_empty()).then_some(w)
    }

    fn number(&mut self) -> Result<f64, WktError> {
        let raw = self.take_while(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| WktError::InvalidNumber(raw.to_string()))
    }

    fn starts_number(&mut self) -> bool {
        self.skip_ws();
        matches!(self.peek(), Some(c) if c.is_ascii_digit() || matches!(c, '+' | '-' | '.'))
    }

    /// `x y [z [m]]`
    fn coord(&mut self) -> Result<Coord<f64>, WktError> {
        if !self.starts_number() {
            return Err(WktError::Unexpected {
                expected: "coordinate",
                offset: self.pos,
            });
        }
        let x = self.number()?;
        if !self.starts_number() {
            return Err(WktError::Unexpected {
                expected: "second ordinate",
                offset: self.pos,
            });
        }
        let y = self.number()?;
        while self.starts_number() {
            self.number()?;
        }
        Ok(Coord { x, y })
    }

    /// `(coord, coord, ...)`
    fn ring(&mut self) -> Result<LineString<f64>, WktError> {
        self.expect('(', "'(' opening a ring")?;
        let mut coords = vec![self.coord()?];
        while self.eat(',') {
            coords.push(self.coord()?);
        }
        self.expect(')', "')' closing a ring")?;

        let distinct = if coords.len() > 1 && coords.first() == coords.last() {
            coords.len() - 1
        } else {
            coords.len()
        };
        if distinct < MIN_RING_VERTICES {
            return Err(WktError::DegenerateRing(distinct));
        }

        // LineString::new keeps the ring as given; Polygon::new closes it.
        Ok(LineString::new(coords))
    }

    /// `(exterior, hole, ...)`
    fn polygon(&mut self) -> Result<Polygon<f64>, WktError> {
        self.expect('(', "'(' opening a polygon")?;
        let exterior = self.ring()?;
        let mut holes = Vec::new();
        while self.eat(',') {
            holes.push(self.ring()?);
        }
        self.expect(')', "')' closing a polygon")?;
        Ok(Polygon::new(exterior, holes))
    }
}
