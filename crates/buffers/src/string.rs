//! Byte strings as stored in ROOT buffers.

use std::borrow::Cow;
use std::fmt;

/// The payload of a ROOT string.
///
/// ROOT strings are raw bytes with no encoding guarantee, so this type keeps
/// the bytes untouched and only converts to text on demand. Decoding and
/// re-encoding a string therefore reproduces the original bytes exactly.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RootString(Vec<u8>);

impl RootString {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The string as UTF-8, if it is valid UTF-8.
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// The string as text, with invalid sequences replaced.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl fmt::Debug for RootString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_string_lossy(), f)
    }
}

impl fmt::Display for RootString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl AsRef<[u8]> for RootString {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for RootString {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for RootString {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&[u8]> for RootString {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for RootString {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl PartialEq<str> for RootString {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for RootString {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_invalid_utf8() {
        let s = RootString::from(vec![0x66, 0xff, 0x6f]);
        assert_eq!(s.as_bytes(), &[0x66, 0xff, 0x6f]);
        assert!(s.to_str().is_none());
        assert_eq!(s.to_string_lossy(), "f\u{fffd}o");
    }

    #[test]
    fn compares_with_str() {
        let s = RootString::from("my-name");
        assert_eq!(s, "my-name");
        assert_eq!(format!("{s}"), "my-name");
        assert_eq!(format!("{s:?}"), "\"my-name\"");
    }
}
