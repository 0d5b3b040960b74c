//! Paths into nested form values.
//!
//! A [`Path`] is an immutable sequence of steps, each either an array index or
//! an object key. Paths compare structurally, step by step.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::encoded_path::EncodedPath;

/// A single directional step into a container.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathStep {
    Array(usize),
    Object(String),
}

impl PathStep {
    pub fn key(key: impl Into<String>) -> Self {
        PathStep::Object(key.into())
    }

    pub fn index(index: usize) -> Self {
        PathStep::Array(index)
    }

    /// Human-readable container kind this step expects.
    pub fn container_kind(&self) -> &'static str {
        match self {
            PathStep::Array(_) => "array",
            PathStep::Object(_) => "object",
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Array(index) => write!(f, "[{index}]"),
            PathStep::Object(key) => write!(f, ".{key}"),
        }
    }
}

/// Location of a node in a value tree. The empty path is the root.
///
/// Steps are shared behind an `Arc`, so cloning a path is cheap and
/// extending one never mutates the original.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Arc<[PathStep]>);

impl Path {
    pub fn root() -> Self {
        Path::default()
    }

    pub fn new(steps: impl Into<Vec<PathStep>>) -> Self {
        Path(steps.into().into())
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// New path with `step` appended.
    pub fn child(&self, step: PathStep) -> Self {
        let mut steps = self.0.to_vec();
        steps.push(step);
        Path::new(steps)
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(PathStep::Object(key.into()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(PathStep::Array(index))
    }

    /// True if `prefix` is a structural prefix of this path (including equality).
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Steps remaining after `prefix`, or `None` if `prefix` is not a prefix.
    pub fn strip_prefix(&self, prefix: &Path) -> Option<Path> {
        self.0
            .strip_prefix(&prefix.0[..])
            .map(|rest| Path::new(rest.to_vec()))
    }

    /// Split into the parent path and the final step.
    pub fn split_last(&self) -> Option<(Path, &PathStep)> {
        let (last, parent) = self.0.split_last()?;
        Some((Path::new(parent.to_vec()), last))
    }

    pub fn encode(&self) -> EncodedPath {
        EncodedPath::encode(self)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({})", self.encode())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl From<Vec<PathStep>> for Path {
    fn from(steps: Vec<PathStep>) -> Self {
        Path::new(steps)
    }
}

impl FromIterator<PathStep> for Path {
    fn from_iter<I: IntoIterator<Item = PathStep>>(iter: I) -> Self {
        Path::new(iter.into_iter().collect::<Vec<_>>())
    }
}

/// Borrow the child of `value` addressed by `step`, if the value has that shape.
pub fn value_child<'a>(value: &'a Value, step: &PathStep) -> Option<&'a Value> {
    match (value, step) {
        (Value::Array(items), PathStep::Array(index)) => items.get(*index),
        (Value::Object(map), PathStep::Object(key)) => map.get(key),
        _ => None,
    }
}

/// Borrow the sub-value at `path`, or `None` if the path leaves the value's shape.
pub fn value_at<'a>(value: &'a Value, path: &Path) -> Option<&'a Value> {
    path.steps()
        .iter()
        .try_fold(value, |current, step| value_child(current, step))
}
