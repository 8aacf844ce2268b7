//! Structured addressing for positions inside a form value.
//!
//! A path is an ordered list of segments. Keys address object members and
//! indices address rows of repeating values, so `contacts[0].phone` is
//! `[Key("contacts"), Index(0), Key("phone")]`. Prefix tests work on whole
//! segments, which keeps `address` from matching `address2`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    pub fn key(name: impl Into<String>) -> Self {
        Segment::Key(name.into())
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(key) => Some(key),
            Segment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Key(_) => None,
            Segment::Index(index) => Some(*index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("empty segment at offset {0}")]
    EmptySegment(usize),
    #[error("unterminated index starting at offset {0}")]
    UnterminatedIndex(usize),
    #[error("invalid index `{index}` at offset {offset}")]
    InvalidIndex { index: String, offset: usize },
    #[error("unexpected `{ch}` at offset {offset}")]
    Unexpected { ch: char, offset: usize },
}

/// Position of a node in the value tree. The root is the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Single-key path, the usual address of a top-level field.
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Key(name.into())],
        }
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn parse(source: &str) -> Result<Self, PathError> {
        source.parse()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn first(&self) -> Option<&Segment> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Key of the first segment, if the path starts with one.
    pub fn first_key(&self) -> Option<&str> {
        self.first().and_then(Segment::as_key)
    }

    pub fn parent(&self) -> Option<FieldPath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn with(&self, segment: Segment) -> Self {
        let mut next = self.clone();
        next.push(segment);
        next
    }

    pub fn child(&self, name: &str) -> Self {
        self.with(Segment::Key(name.to_string()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.with(Segment::Index(index))
    }

    pub fn join(&self, other: &FieldPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// True when `prefix` addresses this node or one of its ancestors.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Remainder of this path below `prefix`, `None` if `prefix` does not apply.
    pub fn strip_prefix(&self, prefix: &FieldPath) -> Option<FieldPath> {
        if !self.starts_with(prefix) {
            return None;
        }
        Some(Self {
            segments: self.segments[prefix.segments.len()..].to_vec(),
        })
    }

    /// Drops the first segment.
    pub fn tail(&self) -> FieldPath {
        Self {
            segments: self.segments.iter().skip(1).cloned().collect(),
        }
    }
}

impl From<Segment> for FieldPath {
    fn from(segment: Segment) -> Self {
        Self {
            segments: vec![segment],
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) => {
                    if position > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq)]
enum ParseState {
    Start,
    Key,
    AfterIndex,
    AfterDot,
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        let mut key = String::new();
        let mut state = ParseState::Start;
        let mut chars = source.char_indices().peekable();

        while let Some((offset, ch)) = chars.next() {
            match ch {
                '.' => match state {
                    ParseState::Key => {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                        state = ParseState::AfterDot;
                    }
                    ParseState::AfterIndex => state = ParseState::AfterDot,
                    ParseState::Start | ParseState::AfterDot => {
                        return Err(PathError::EmptySegment(offset));
                    }
                },
                '[' => {
                    match state {
                        ParseState::Key => segments.push(Segment::Key(std::mem::take(&mut key))),
                        ParseState::AfterDot => return Err(PathError::EmptySegment(offset)),
                        ParseState::Start | ParseState::AfterIndex => {}
                    }
                    let mut digits = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        digits.push(c);
                    }
                    if !closed {
                        return Err(PathError::UnterminatedIndex(offset));
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| PathError::InvalidIndex {
                            index: digits.clone(),
                            offset,
                        })?;
                    segments.push(Segment::Index(index));
                    state = ParseState::AfterIndex;
                }
                ']' => return Err(PathError::Unexpected { ch, offset }),
                _ => {
                    if state == ParseState::AfterIndex {
                        return Err(PathError::Unexpected { ch, offset });
                    }
                    key.push(ch);
                    state = ParseState::Key;
                }
            }
        }

        match state {
            ParseState::Key => segments.push(Segment::Key(key)),
            ParseState::AfterDot => return Err(PathError::EmptySegment(source.len())),
            ParseState::Start | ParseState::AfterIndex => {}
        }
        Ok(Self { segments })
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(source: &str) -> FieldPath {
        source.parse().expect("valid path")
    }

    #[test]
    fn parses_dotted_and_indexed_segments() {
        let parsed = path("contacts[0].phone");
        assert_eq!(
            parsed.segments(),
            &[
                Segment::key("contacts"),
                Segment::Index(0),
                Segment::key("phone")
            ]
        );
        assert_eq!(parsed.to_string(), "contacts[0].phone");
    }

    #[test]
    fn empty_string_is_root() {
        assert!(path("").is_root());
        assert_eq!(FieldPath::root().to_string(), "");
    }

    #[test]
    fn relative_index_continuation_parses() {
        let parsed = path("[2].name");
        assert_eq!(parsed.first(), Some(&Segment::Index(2)));
        assert_eq!(parsed.to_string(), "[2].name");
    }

    #[test]
    fn rejects_malformed_paths() {
        assert_eq!(FieldPath::parse("a..b"), Err(PathError::EmptySegment(2)));
        assert_eq!(FieldPath::parse(".a"), Err(PathError::EmptySegment(0)));
        assert_eq!(FieldPath::parse("a."), Err(PathError::EmptySegment(2)));
        assert!(matches!(
            FieldPath::parse("a[x]"),
            Err(PathError::InvalidIndex { .. })
        ));
        assert_eq!(FieldPath::parse("a[1"), Err(PathError::UnterminatedIndex(1)));
        assert!(matches!(
            FieldPath::parse("a[1]b"),
            Err(PathError::Unexpected { ch: 'b', .. })
        ));
    }

    #[test]
    fn prefix_matching_respects_segment_boundaries() {
        let address = path("address");
        assert!(path("address.street").starts_with(&address));
        assert!(path("address[1]").starts_with(&address));
        assert!(!path("address2").starts_with(&address));
        assert!(!path("address2.street").starts_with(&address));
    }

    #[test]
    fn strip_prefix_returns_remainder() {
        let full = path("contacts[3].phone");
        assert_eq!(
            full.strip_prefix(&path("contacts")),
            Some(path("[3].phone"))
        );
        assert_eq!(full.strip_prefix(&path("contacts[3].phone")), Some(FieldPath::root()));
        assert_eq!(full.strip_prefix(&path("contact")), None);
    }

    #[test]
    fn join_then_strip_is_identity() {
        let base = path("a.b");
        let rest = path("[4].c");
        let joined = base.join(&rest);
        assert_eq!(joined.to_string(), "a.b[4].c");
        assert_eq!(joined.strip_prefix(&base), Some(rest));
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&path("rows[1].x")).unwrap();
        assert_eq!(json, "\"rows[1].x\"");
        let back: FieldPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path("rows[1].x"));
    }
}
