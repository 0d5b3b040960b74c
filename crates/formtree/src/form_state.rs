//! A value paired with its shaped tree of [`Extras`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{FormError, Result};
use crate::extras::Extras;
use crate::path::{value_child, Path, PathStep};
use crate::shaped_tree::ShapedTree;

pub type ExtrasTree = ShapedTree<Extras>;

/// A value together with a tree of extras shaped exactly like it.
///
/// Every operation returns a new snapshot. Retained copies never observe
/// later edits.
#[derive(Clone, Debug, PartialEq)]
pub struct FormState {
    value: Value,
    tree: ExtrasTree,
}

impl FormState {
    /// Clean extras everywhere (`client` pending, `external` unchecked).
    pub fn fresh(value: Value) -> Self {
        let tree = ShapedTree::from_value(&value, Extras::clean());
        Self { value, tree }
    }

    /// Like [`FormState::fresh`] but every node is already touched and changed.
    pub fn changed(value: Value) -> Self {
        let tree = ShapedTree::from_value(&value, Extras::changed());
        Self { value, tree }
    }

    /// Pair a value with an existing tree, checking that the shapes agree.
    pub fn from_parts(value: Value, tree: ExtrasTree) -> Result<Self> {
        if !tree.conforms_to(&value) {
            return Err(FormError::shape(
                Path::root(),
                format!("{} tree does not match value {value}", tree.kind()),
            ));
        }
        Ok(Self { value, tree })
    }

    pub(crate) fn from_parts_unchecked(value: Value, tree: ExtrasTree) -> Self {
        Self { value, tree }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn tree(&self) -> &ExtrasTree {
        &self.tree
    }

    pub fn into_parts(self) -> (Value, ExtrasTree) {
        (self.value, self.tree)
    }

    pub fn extras(&self) -> &Extras {
        self.tree.data()
    }

    /// Deserialize the current value into a typed model.
    pub fn value_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.value.clone())?)
    }

    pub fn map_root(&self, f: impl FnOnce(&Extras) -> Extras) -> Self {
        Self {
            value: self.value.clone(),
            tree: self.tree.map_root(f),
        }
    }

    /// Replace the value of this node after an edit.
    ///
    /// The node's own extras are kept. If the new value no longer has the
    /// tree's shape, the subtree below the node is rebuilt with clean extras.
    pub fn with_edited_value(&self, value: Value) -> Self {
        if self.tree.conforms_to(&value) {
            return Self {
                value,
                tree: self.tree.clone(),
            };
        }
        let root = self.extras().clone();
        let tree = ShapedTree::from_value(&value, Extras::clean()).map_root(|_| root);
        Self { value, tree }
    }

    pub fn child(&self, step: &PathStep) -> Result<FormState> {
        let at = Path::new(vec![step.clone()]);
        let value = value_child(&self.value, step).ok_or_else(|| {
            FormError::shape(&at, format!("value has no {} child {step}", step.container_kind()))
        })?;
        let tree = self.tree.navigate_down(step)?;
        Ok(FormState {
            value: value.clone(),
            tree: tree.clone(),
        })
    }

    pub fn object_child(&self, key: &str) -> Result<FormState> {
        self.child(&PathStep::Object(key.to_string()))
    }

    pub fn array_child(&self, index: usize) -> Result<FormState> {
        self.child(&PathStep::Array(index))
    }

    /// The independent sub-state at `path`.
    pub fn at_path(&self, path: &Path) -> Result<FormState> {
        let mut current = self.clone();
        for (depth, step) in path.steps().iter().enumerate() {
            current = current.child(step).map_err(|err| match err {
                FormError::ShapeMismatch { reason, .. } => FormError::ShapeMismatch {
                    path: Path::new(path.steps()[..=depth].to_vec()).encode(),
                    reason,
                },
                other => other,
            })?;
        }
        Ok(current)
    }

    /// Rebuild this state with one child replaced (value and subtree together).
    pub fn replace_child(&self, step: &PathStep, child: FormState) -> Result<FormState> {
        let at = Path::new(vec![step.clone()]);
        let (child_value, child_tree) = child.into_parts();
        let mut value = self.value.clone();
        match (&mut value, step) {
            (Value::Array(items), PathStep::Array(index)) if *index < items.len() => {
                items[*index] = child_value;
            }
            (Value::Array(items), PathStep::Array(index)) => {
                return Err(FormError::IndexOutOfBounds {
                    path: at.encode(),
                    index: *index,
                    len: items.len(),
                });
            }
            (Value::Object(map), PathStep::Object(key)) if map.contains_key(key) => {
                map.insert(key.clone(), child_value);
            }
            (other, step) => {
                return Err(FormError::shape(
                    &at,
                    format!("cannot replace {step} in value {other}"),
                ));
            }
        }
        let tree = self.tree.replace_child(step, Arc::new(child_tree))?;
        Ok(FormState { value, tree })
    }

    pub fn replace_object_child(&self, key: &str, child: FormState) -> Result<FormState> {
        self.replace_child(&PathStep::Object(key.to_string()), child)
    }

    pub fn replace_array_child(&self, index: usize, child: FormState) -> Result<FormState> {
        self.replace_child(&PathStep::Array(index), child)
    }

    /// Write `child` back at `path`, rebuilding every ancestor on the way up.
    pub fn replace_at_path(&self, path: &Path, child: FormState) -> Result<FormState> {
        match path.steps().split_first() {
            None => Ok(child),
            Some((first, rest)) => {
                let inner = self.child(first)?;
                let replaced = inner.replace_at_path(&Path::new(rest.to_vec()), child)?;
                self.replace_child(first, replaced)
            }
        }
    }

    /// Every node's client errors are empty or still pending.
    pub fn is_valid(&self) -> bool {
        self.tree
            .fold(&|extras: &Extras| extras.errors.client.is_passing(), &true, &|l, r| l && r)
    }

    /// Every node's external errors are empty or still unchecked.
    pub fn is_externally_valid(&self) -> bool {
        self.tree.fold(
            &|extras: &Extras| extras.errors.external.is_passing(),
            &true,
            &|l, r| l && r,
        )
    }

    /// Root client errors, then root external errors.
    pub fn flat_root_errors(&self) -> Vec<String> {
        self.extras().errors.flattened()
    }
}
