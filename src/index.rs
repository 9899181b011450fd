use std::fmt;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};
use std::str::FromStr;

use crate::error::RangeError;
use crate::float_range::FloatRange;

/// Slice bounds over logical indices, each optional.
///
/// Unset bounds default to `0`, the receiver's length and `1`. Negative
/// bounds count from the end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl Slice {
    #[inline]
    pub fn new(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Self { start, stop, step }
    }

    #[inline]
    pub fn with_step(self, step: isize) -> Self {
        Self {
            step: Some(step),
            ..self
        }
    }
}

impl From<Range<isize>> for Slice {
    fn from(r: Range<isize>) -> Self {
        Self::new(Some(r.start), Some(r.end), None)
    }
}

impl From<RangeFrom<isize>> for Slice {
    fn from(r: RangeFrom<isize>) -> Self {
        Self::new(Some(r.start), None, None)
    }
}

impl From<RangeTo<isize>> for Slice {
    fn from(r: RangeTo<isize>) -> Self {
        Self::new(None, Some(r.end), None)
    }
}

impl From<RangeFull> for Slice {
    fn from(_: RangeFull) -> Self {
        Self::default()
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |b: Option<isize>| b.map(|v| v.to_string()).unwrap_or_default();
        write!(f, "{}:{}", part(self.start), part(self.stop))?;
        if let Some(step) = self.step {
            write!(f, ":{step}")?;
        }
        Ok(())
    }
}

/// Argument to [`FloatRange::index`]: a single position or a slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeqIndex {
    Index(isize),
    Slice(Slice),
}

impl From<isize> for SeqIndex {
    fn from(i: isize) -> Self {
        SeqIndex::Index(i)
    }
}

impl From<Slice> for SeqIndex {
    fn from(s: Slice) -> Self {
        SeqIndex::Slice(s)
    }
}

impl fmt::Display for SeqIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeqIndex::Index(i) => write!(f, "{i}"),
            SeqIndex::Slice(s) => write!(f, "{s}"),
        }
    }
}

/// Parses `"3"`, `"-1"`, `"2:5"`, `"::2"` and the like.
///
/// ```rust
/// # use frange::{SeqIndex, Slice};
/// assert_eq!("-1".parse(), Ok(SeqIndex::Index(-1)));
/// assert_eq!("2:".parse(), Ok(SeqIndex::Slice(Slice::from(2..))));
/// assert!("1.5".parse::<SeqIndex>().is_err());
/// ```
impl FromStr for SeqIndex {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RangeError::InvalidIndexType(s.to_string());
        let text = s.trim();

        if !text.contains(':') {
            return text.parse().map(SeqIndex::Index).map_err(|_| invalid());
        }

        let parts: Vec<&str> = text.split(':').collect();
        if parts.len() > 3 {
            return Err(invalid());
        }
        let mut bounds = [None; 3];
        for (slot, part) in bounds.iter_mut().zip(&parts) {
            let part = part.trim();
            if !part.is_empty() {
                *slot = Some(part.parse::<isize>().map_err(|_| invalid())?);
            }
        }
        Ok(SeqIndex::Slice(Slice::new(bounds[0], bounds[1], bounds[2])))
    }
}

/// Result of [`FloatRange::index`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Indexed {
    Value(f64),
    Range(FloatRange),
}

impl Indexed {
    pub fn value(self) -> Option<f64> {
        match self {
            Indexed::Value(v) => Some(v),
            Indexed::Range(_) => None,
        }
    }

    pub fn range(self) -> Option<FloatRange> {
        match self {
            Indexed::Range(r) => Some(r),
            Indexed::Value(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index() {
        assert_eq!("3".parse(), Ok(SeqIndex::Index(3)));
        assert_eq!(" -10 ".parse(), Ok(SeqIndex::Index(-10)));
    }

    #[test]
    fn test_parse_slice() {
        assert_eq!(":".parse(), Ok(SeqIndex::Slice(Slice::default())));
        assert_eq!("2:5".parse(), Ok(SeqIndex::Slice(Slice::from(2..5))));
        assert_eq!(
            "::2".parse(),
            Ok(SeqIndex::Slice(Slice::new(None, None, Some(2))))
        );
        assert_eq!(
            "-3::-1".parse(),
            Ok(SeqIndex::Slice(Slice::from(-3..).with_step(-1)))
        );
        assert_eq!(
            "1:4:".parse(),
            Ok(SeqIndex::Slice(Slice::from(1..4)))
        );
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["", "abc", "1.5", "1:2:3:4", "a:b", "1:x"] {
            assert_eq!(
                bad.parse::<SeqIndex>(),
                Err(RangeError::InvalidIndexType(bad.to_string())),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_invalid_message_names_input() {
        let err = "abc".parse::<SeqIndex>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "frange indices must be integers or slices, not abc"
        );
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["4", "-2", "1:3", ":", "::2", "-3:-1:1"] {
            let idx: SeqIndex = text.parse().unwrap();
            assert_eq!(idx.to_string().parse::<SeqIndex>(), Ok(idx));
        }
        assert_eq!(Slice::from(2..5).to_string(), "2:5");
    }

    #[test]
    fn test_indexed_accessors() {
        let r = FloatRange::new(3.0, 0.0, 1.0);
        assert_eq!(Indexed::Value(1.0).value(), Some(1.0));
        assert_eq!(Indexed::Value(1.0).range(), None);
        assert_eq!(Indexed::Range(r).range(), Some(r));
    }
}
