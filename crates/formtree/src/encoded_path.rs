//! String encoding of [`Path`]s.
//!
//! The encoding is the key type of the validation registry and the wire format
//! of external errors. Grammar:
//!
//! - the root path is `/`
//! - every other path is one `/`-prefixed segment per step
//! - an array step is a canonical decimal index (`0`, `17`, never `007`)
//! - an object step is the key with `~` written as `~0` and `/` as `~1`;
//!   keys that are empty or consist only of ASCII digits get a `~2` prefix
//!   so they never read as an index
//!
//! ```ignore
//! /                  -> []
//! /complex/0/inner   -> [key "complex", index 0, key "inner"]
//! /~2/a~1b           -> [key "", key "a/b"]
//! /~212              -> [key "12"]
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FormError;
use crate::path::{Path, PathStep};

const SEPARATOR: char = '/';
const ESCAPE: char = '~';
const KEY_MARKER: &str = "~2";

/// An encoded [`Path`]. Ordering and hashing follow the string form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EncodedPath(String);

impl EncodedPath {
    pub const ROOT: &'static str = "/";

    pub fn root() -> Self {
        EncodedPath(Self::ROOT.to_string())
    }

    pub fn encode(path: &Path) -> Self {
        if path.is_root() {
            return Self::root();
        }
        let mut out = String::new();
        for step in path.steps() {
            out.push(SEPARATOR);
            match step {
                PathStep::Array(index) => out.push_str(&index.to_string()),
                PathStep::Object(key) => encode_key(key, &mut out),
            }
        }
        EncodedPath(out)
    }

    /// Validate a wire string and wrap it.
    pub fn parse(input: &str) -> Result<Self, FormError> {
        let path = decode_str(input)?;
        Ok(Self::encode(&path))
    }

    /// Exact inverse of [`EncodedPath::encode`].
    pub fn decode(&self) -> Path {
        // Only constructed through `encode`/`parse`, so the grammar holds.
        decode_str(&self.0).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }

    /// True iff the decoded `prefix` is a structural prefix of this path.
    pub fn starts_with(&self, prefix: &EncodedPath) -> bool {
        if prefix.is_root() {
            return true;
        }
        match self.0.strip_prefix(prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with(SEPARATOR),
            None => false,
        }
    }
}

fn encode_key(key: &str, out: &mut String) {
    if key.is_empty() || key.bytes().all(|b| b.is_ascii_digit()) {
        out.push_str(KEY_MARKER);
    }
    for c in key.chars() {
        match c {
            ESCAPE => out.push_str("~0"),
            SEPARATOR => out.push_str("~1"),
            other => out.push(other),
        }
    }
}

fn decode_str(input: &str) -> Result<Path, FormError> {
    let invalid = |reason: &str| FormError::InvalidPath {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    if input == EncodedPath::ROOT {
        return Ok(Path::root());
    }
    let Some(body) = input.strip_prefix(SEPARATOR) else {
        return Err(invalid("path must start with '/'"));
    };

    body.split(SEPARATOR)
        .map(|segment| decode_segment(segment).map_err(|reason| invalid(&reason)))
        .collect::<Result<Vec<_>, _>>()
        .map(Path::new)
}

fn decode_segment(segment: &str) -> Result<PathStep, String> {
    if segment.is_empty() {
        return Err("empty segment (write an empty key as ~2)".to_string());
    }
    if segment.bytes().all(|b| b.is_ascii_digit()) {
        if segment.len() > 1 && segment.starts_with('0') {
            return Err(format!("index {segment} has leading zeros"));
        }
        return segment
            .parse::<usize>()
            .map(PathStep::Array)
            .map_err(|e| format!("index {segment}: {e}"));
    }

    let (marked, raw) = match segment.strip_prefix(KEY_MARKER) {
        Some(rest) => (true, rest),
        None => (false, segment),
    };

    let mut key = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != ESCAPE {
            key.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => key.push(ESCAPE),
            Some('1') => key.push(SEPARATOR),
            Some(other) => return Err(format!("unknown escape ~{other}")),
            None => return Err("dangling ~ at end of segment".to_string()),
        }
    }

    let needs_marker = key.is_empty() || key.bytes().all(|b| b.is_ascii_digit());
    if marked != needs_marker {
        return Err(format!("non-canonical key segment {segment:?}"));
    }
    Ok(PathStep::Object(key))
}

impl fmt::Display for EncodedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for EncodedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl FromStr for EncodedPath {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EncodedPath::parse(s)
    }
}

impl From<&Path> for EncodedPath {
    fn from(path: &Path) -> Self {
        EncodedPath::encode(path)
    }
}

impl From<Path> for EncodedPath {
    fn from(path: Path) -> Self {
        EncodedPath::encode(&path)
    }
}

impl Serialize for EncodedPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EncodedPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        EncodedPath::parse(&raw).map_err(serde::de::Error::custom)
    }
}
