//! The buffer/attribute format mini-language.
//!
//! A vertex format is a whitespace-separated sequence of tokens, each
//! matching `{1-4}{f|u|i}{1|2|4}?` — component count, numeric class, and an
//! optional byte width per component defaulting to 4. `"3f 3f 2f"` describes
//! an interleaved position+normal+uv buffer. An optional trailing `/i` marks
//! the whole group as advancing per draw-instance instead of per vertex.

use std::fmt;

use smallvec::SmallVec;

use super::errors::{Error, Result};

/// The numeric class of a vertex component.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum NumericKind {
    Float,
    Uint,
    Int,
}

impl NumericKind {
    fn symbol(self) -> char {
        match self {
            NumericKind::Float => 'f',
            NumericKind::Uint => 'u',
            NumericKind::Int => 'i',
        }
    }
}

/// One attribute's layout inside a vertex: component count, numeric class
/// and byte width per component. A format tag maps to exactly one such
/// triple; unknown tags are a hard error.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct AttributeFormat {
    pub components: u8,
    pub kind: NumericKind,
    pub width: u8,
}

impl AttributeFormat {
    pub fn new(components: u8, kind: NumericKind, width: u8) -> Self {
        AttributeFormat {
            components,
            kind,
            width,
        }
    }

    /// Parses a single token such as `"3f"` or `"1u1"`.
    pub fn parse(token: &str) -> Result<Self> {
        let malformed = || Error::MalformedFormat(token.into());
        let mut chars = token.chars();

        let components = match chars.next() {
            Some(c @ '1'..='4') => c as u8 - b'0',
            _ => return Err(malformed()),
        };

        let kind = match chars.next() {
            Some('f') => NumericKind::Float,
            Some('u') => NumericKind::Uint,
            Some('i') => NumericKind::Int,
            _ => return Err(malformed()),
        };

        let width = match chars.next() {
            None => 4,
            Some('1') => 1,
            Some('2') => 2,
            Some('4') => 4,
            Some(_) => return Err(malformed()),
        };

        if chars.next().is_some() {
            return Err(malformed());
        }

        Ok(AttributeFormat {
            components,
            kind,
            width,
        })
    }

    /// Total byte size of one attribute value.
    #[inline]
    pub fn bytes_total(&self) -> usize {
        self.components as usize * self.width as usize
    }
}

impl fmt::Display for AttributeFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}{}", self.components, self.kind.symbol(), self.width)
    }
}

/// An ordered list of attribute formats describing one interleaved buffer.
#[derive(Debug, PartialEq, Clone)]
pub struct VertexFormat {
    pub attributes: SmallVec<[AttributeFormat; 4]>,
    /// Attributes in this group advance once per draw-instance.
    pub per_instance: bool,
}

impl VertexFormat {
    /// Parses a format string like `"3f 3f 2f"` or `"4f/i"`.
    pub fn parse(s: &str) -> Result<Self> {
        let mut attributes = SmallVec::new();
        let mut per_instance = false;

        for token in s.split_whitespace() {
            let token = if token.ends_with("/i") {
                per_instance = true;
                &token[..token.len() - 2]
            } else {
                token
            };

            attributes.push(AttributeFormat::parse(token)?);
        }

        if attributes.is_empty() {
            return Err(Error::MalformedFormat(s.into()));
        }

        Ok(VertexFormat {
            attributes,
            per_instance,
        })
    }

    /// The byte size of one whole vertex in this format.
    pub fn vertex_size(&self) -> usize {
        self.attributes.iter().map(|v| v.bytes_total()).sum()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl fmt::Display for VertexFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, v) in self.attributes.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", v)?;
        }
        if self.per_instance {
            write!(f, "/i")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tokens() {
        let v = AttributeFormat::parse("3f").unwrap();
        assert_eq!(v, AttributeFormat::new(3, NumericKind::Float, 4));
        assert_eq!(v.bytes_total(), 12);

        let v = AttributeFormat::parse("1u1").unwrap();
        assert_eq!(v, AttributeFormat::new(1, NumericKind::Uint, 1));
        assert_eq!(v.bytes_total(), 1);

        let v = AttributeFormat::parse("2i2").unwrap();
        assert_eq!(v.bytes_total(), 4);
    }

    #[test]
    fn malformed_tokens() {
        for token in &["", "5f", "0f", "3x", "3f3", "3f8", "3f44", "f3"] {
            assert!(AttributeFormat::parse(token).is_err(), "{}", token);
        }
    }

    #[test]
    fn groups() {
        let v = VertexFormat::parse("3f 3f 2f").unwrap();
        assert_eq!(v.len(), 3);
        assert_eq!(v.vertex_size(), 32);
        assert!(!v.per_instance);

        let v = VertexFormat::parse("4f/i").unwrap();
        assert!(v.per_instance);
        assert_eq!(v.vertex_size(), 16);

        assert!(VertexFormat::parse("").is_err());
        assert!(VertexFormat::parse("3f 9f").is_err());
    }

    #[test]
    fn round_trip() {
        for s in &["3f 3f 2f", "1u1 2i2 4f", "3f4 2f2/i"] {
            let v = VertexFormat::parse(s).unwrap();
            let reparsed = VertexFormat::parse(&v.to_string()).unwrap();
            assert_eq!(v, reparsed);
            assert_eq!(v.vertex_size(), reparsed.vertex_size());
        }
    }
}
