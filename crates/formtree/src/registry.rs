//! Validation functions registered per path and field.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::encoded_path::EncodedPath;
use crate::error::{FormError, Result};

/// Identifies one mounted field. Ids grow monotonically, so ordering by id
/// is registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u64);

impl FieldId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A validator: given the value at its path, the error messages (empty = ok).
pub type Validation = Arc<dyn Fn(&Value) -> Vec<String> + Send + Sync>;

/// Wrap a closure as a [`Validation`].
pub fn validation(f: impl Fn(&Value) -> Vec<String> + Send + Sync + 'static) -> Validation {
    Arc::new(f)
}

/// Validator that never reports an error.
pub fn always_valid() -> Validation {
    validation(|_| Vec::new())
}

type Bucket = BTreeMap<FieldId, Validation>;

/// Path-bucketed store of validators. Each bucket holds the validators of
/// every field mounted at that path, in registration order.
#[derive(Default, Clone)]
pub struct ValidationRegistry {
    buckets: BTreeMap<EncodedPath, Bucket>,
    next_id: u64,
}

impl ValidationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: EncodedPath, validation: Validation) -> FieldId {
        let id = FieldId(self.next_id);
        self.next_id += 1;
        self.buckets.entry(path).or_default().insert(id, validation);
        id
    }

    /// Swap the validator of `field`, returning the previous one.
    pub fn replace(
        &mut self,
        path: &EncodedPath,
        field: FieldId,
        validation: Validation,
    ) -> Result<Validation> {
        let entry = self
            .buckets
            .get_mut(path)
            .ok_or_else(|| FormError::MissingRegistryBucket { path: path.clone() })?
            .get_mut(&field)
            .ok_or_else(|| FormError::MissingFieldEntry {
                path: path.clone(),
                field,
            })?;
        Ok(std::mem::replace(entry, validation))
    }

    /// Remove one field's validator; an emptied bucket is dropped.
    pub fn remove(&mut self, path: &EncodedPath, field: FieldId) -> Result<Validation> {
        let bucket = self
            .buckets
            .get_mut(path)
            .ok_or_else(|| FormError::MissingRegistryBucket { path: path.clone() })?;
        let removed = bucket.remove(&field).ok_or_else(|| FormError::MissingFieldEntry {
            path: path.clone(),
            field,
        })?;
        if bucket.is_empty() {
            self.buckets.remove(path);
        }
        Ok(removed)
    }

    pub fn contains(&self, path: &EncodedPath, field: FieldId) -> bool {
        self.buckets
            .get(path)
            .is_some_and(|bucket| bucket.contains_key(&field))
    }

    /// Validators at exactly `path`, in registration order.
    pub fn validations_at(&self, path: &EncodedPath) -> impl Iterator<Item = &Validation> {
        self.buckets.get(path).into_iter().flat_map(|bucket| bucket.values())
    }

    /// Run every validator at `path` against `value`, concatenating results.
    pub fn run_at(&self, path: &EncodedPath, value: &Value) -> Vec<String> {
        self.validations_at(path).flat_map(|f| f(value)).collect()
    }

    /// Paths with at least one validator at or below `prefix`.
    pub fn paths_under(&self, prefix: &EncodedPath) -> Vec<EncodedPath> {
        self.buckets
            .keys()
            .filter(|path| path.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Drop every validator strictly below `prefix`. Returns the removed ids.
    pub fn remove_descendants(&mut self, prefix: &EncodedPath) -> Vec<FieldId> {
        let doomed: Vec<EncodedPath> = self
            .buckets
            .keys()
            .filter(|path| *path != prefix && path.starts_with(prefix))
            .cloned()
            .collect();
        doomed
            .iter()
            .filter_map(|path| self.buckets.remove(path))
            .flat_map(|bucket| bucket.into_keys())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl fmt::Debug for ValidationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.buckets
                    .iter()
                    .map(|(path, bucket)| (path, bucket.keys().collect::<Vec<_>>())),
            )
            .finish()
    }
}
