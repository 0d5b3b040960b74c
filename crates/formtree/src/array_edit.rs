//! Array editing, both as plain slice utilities and as a staged edit of a
//! [`FormState`] array.
//!
//! The slice utilities panic on out-of-range indices, like `Vec::insert`.
//! [`ArrayEdit`] checks bounds and reports [`FormError::IndexOutOfBounds`]
//! instead, so it is what form-level code uses.

use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::error::{FormError, Result};
use crate::extras::Extras;
use crate::form_state::{ExtrasTree, FormState};
use crate::path::Path;
use crate::shaped_tree::ShapedTree;

/// Copy of `items` with `item` at `index`.
///
/// # Panics
///
/// If `index > items.len()`.
pub fn insert_at<T: Clone>(items: &[T], item: T, index: usize) -> Vec<T> {
    let mut out = items.to_vec();
    out.insert(index, item);
    out
}

/// Copy of `items` without the element at `index`.
///
/// # Panics
///
/// If `index >= items.len()`.
pub fn remove_at<T: Clone>(items: &[T], index: usize) -> Vec<T> {
    let mut out = items.to_vec();
    out.remove(index);
    out
}

/// Move one element. `to` indexes the array after the element was removed.
///
/// # Panics
///
/// If `from >= items.len()` or `to >= items.len()`.
pub fn move_from_to<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut out = items.to_vec();
    let item = out.remove(from);
    out.insert(to, item);
    out
}

/// A run of new items to insert before the element currently at the index.
pub type Span<T> = (usize, Vec<T>);

/// Insert several spans at once. Indices refer to the original array; spans
/// are applied in ascending index order, ties kept in the order given.
///
/// # Panics
///
/// If any index is greater than `items.len()`.
pub fn insert_spans<T: Clone>(items: &[T], spans: &[Span<T>]) -> Vec<T> {
    let mut ordered: Vec<&Span<T>> = spans.iter().collect();
    ordered.sort_by_key(|(index, _)| *index);

    let mut out = items.to_vec();
    let mut offset = 0;
    for (index, span) in ordered {
        assert!(*index <= items.len(), "span index {index} past end {}", items.len());
        let at = index + offset;
        out.splice(at..at, span.iter().cloned());
        offset += span.len();
    }
    out
}

/// Predicate for [`modify`]: `(item, index, array after insertion)`.
pub type FilterPredicate<'a, T> = &'a dyn Fn(&T, usize, &[T]) -> bool;

/// Combined insert-then-filter edit.
pub struct Modification<'a, T> {
    pub insert_spans: Option<Vec<Span<T>>>,
    pub filter_predicate: Option<FilterPredicate<'a, T>>,
}

impl<T> Default for Modification<'_, T> {
    fn default() -> Self {
        Self {
            insert_spans: None,
            filter_predicate: None,
        }
    }
}

/// Apply `modification`: spans are inserted first, then the predicate sees
/// each element of the post-insertion array.
pub fn modify<T: Clone>(items: &[T], modification: &Modification<'_, T>) -> Vec<T> {
    let inserted = match &modification.insert_spans {
        Some(spans) => insert_spans(items, spans),
        None => items.to_vec(),
    };
    match modification.filter_predicate {
        Some(keep) => inserted
            .iter()
            .enumerate()
            .filter(|(index, item)| keep(*item, *index, inserted.as_slice()))
            .map(|(_, item)| item.clone())
            .collect(),
        None => inserted,
    }
}

type Entry = (Value, Arc<ExtrasTree>);

/// Staged edit of an array node's value and subtree in lockstep.
///
/// The builder owns the child list; nothing is visible until [`ArrayEdit::commit`].
/// New items start with clean extras. The array node's own extras are kept.
pub struct ArrayEdit {
    path: Path,
    base: FormState,
    entries: Vec<Entry>,
}

impl ArrayEdit {
    /// Start editing the array node `state`, located at `path` (for errors).
    pub fn begin(state: &FormState, path: Path) -> Result<Self> {
        let (Value::Array(items), Some(children)) = (state.value(), state.tree().array_children())
        else {
            return Err(FormError::shape(
                &path,
                format!("expected an array, found {}", state.tree().kind()),
            ));
        };
        let entries = items.iter().cloned().zip(children.iter().cloned()).collect();
        Ok(Self {
            path,
            base: state.clone(),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn fresh_entry(value: Value) -> Entry {
        let tree = ShapedTree::from_value(&value, Extras::clean());
        (value, Arc::new(tree))
    }

    fn check(&self, index: usize, len: usize) -> Result<()> {
        if index < len {
            Ok(())
        } else {
            Err(FormError::IndexOutOfBounds {
                path: self.path.encode(),
                index,
                len: self.entries.len(),
            })
        }
    }

    pub fn insert(mut self, index: usize, value: Value) -> Result<Self> {
        self.check(index, self.entries.len() + 1)?;
        self.entries = insert_at(&self.entries, Self::fresh_entry(value), index);
        Ok(self)
    }

    pub fn remove(mut self, index: usize) -> Result<Self> {
        self.check(index, self.entries.len())?;
        self.entries = remove_at(&self.entries, index);
        Ok(self)
    }

    pub fn move_item(mut self, from: usize, to: usize) -> Result<Self> {
        self.check(from, self.entries.len())?;
        self.check(to, self.entries.len())?;
        self.entries = move_from_to(&self.entries, from, to);
        Ok(self)
    }

    pub fn insert_spans(mut self, spans: Vec<Span<Value>>) -> Result<Self> {
        for (index, _) in &spans {
            self.check(*index, self.entries.len() + 1)?;
        }
        let spans: Vec<Span<Entry>> = spans
            .into_iter()
            .map(|(index, values)| (index, values.into_iter().map(Self::fresh_entry).collect()))
            .collect();
        self.entries = insert_spans(&self.entries, &spans);
        Ok(self)
    }

    /// Keep the items for which `keep(value, index, all_values)` holds.
    pub fn filter(mut self, keep: impl Fn(&Value, usize, &[Value]) -> bool) -> Self {
        let values = self.staged_value();
        self.entries = self
            .entries
            .into_iter()
            .enumerate()
            .filter(|(index, (value, _))| keep(value, *index, values.as_slice()))
            .map(|(_, entry)| entry)
            .collect();
        self
    }

    /// The values as they stand in the staged array.
    pub fn staged_value(&self) -> Vec<Value> {
        self.entries.iter().map(|(value, _)| value.clone()).collect()
    }

    pub fn commit(self) -> Result<FormState> {
        trace!(path = %self.path, len = self.entries.len(), "commit array edit");
        let (values, children): (Vec<Value>, Vec<Arc<ExtrasTree>>) =
            self.entries.into_iter().unzip();
        let tree = self.base.tree().with_array_children(children)?;
        Ok(FormState::from_parts_unchecked(Value::Array(values), tree))
    }
}
