//! Trees that mirror the shape of a value while carrying per-node data.
//!
//! A [`ShapedTree`] never holds the value itself. Its tags and child
//! indices/keys match a companion [`Value`] exactly; every operation returns a
//! new tree that shares untouched subtrees with the old one through `Arc`.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{FormError, Result};
use crate::path::{Path, PathStep};

#[derive(Clone, Debug, PartialEq)]
pub enum ShapedTree<D> {
    Leaf {
        data: D,
    },
    Array {
        data: D,
        children: Vec<Arc<ShapedTree<D>>>,
    },
    Object {
        data: D,
        children: IndexMap<String, Arc<ShapedTree<D>>>,
    },
}

impl<D> ShapedTree<D> {
    /// Build a tree shaped like `value`, stamping every node with `data`.
    pub fn from_value(value: &Value, data: D) -> Self
    where
        D: Clone,
    {
        match value {
            Value::Array(items) => ShapedTree::Array {
                children: items
                    .iter()
                    .map(|item| Arc::new(ShapedTree::from_value(item, data.clone())))
                    .collect(),
                data,
            },
            Value::Object(map) => ShapedTree::Object {
                children: map
                    .iter()
                    .map(|(key, item)| {
                        (
                            key.clone(),
                            Arc::new(ShapedTree::from_value(item, data.clone())),
                        )
                    })
                    .collect(),
                data,
            },
            _ => ShapedTree::Leaf { data },
        }
    }

    pub fn data(&self) -> &D {
        match self {
            ShapedTree::Leaf { data }
            | ShapedTree::Array { data, .. }
            | ShapedTree::Object { data, .. } => data,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ShapedTree::Leaf { .. } => "leaf",
            ShapedTree::Array { .. } => "array",
            ShapedTree::Object { .. } => "object",
        }
    }

    pub fn array_children(&self) -> Option<&[Arc<ShapedTree<D>>]> {
        match self {
            ShapedTree::Array { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn object_children(&self) -> Option<&IndexMap<String, Arc<ShapedTree<D>>>> {
        match self {
            ShapedTree::Object { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Step into one child.
    pub fn navigate_down(&self, step: &PathStep) -> Result<&ShapedTree<D>> {
        self.child_or_err(step, &Path::new(vec![step.clone()]))
    }

    /// The subtree at `path`.
    pub fn get(&self, path: &Path) -> Result<&ShapedTree<D>> {
        let mut node = self;
        for (depth, step) in path.steps().iter().enumerate() {
            let reached = Path::new(path.steps()[..=depth].to_vec());
            node = node.child_or_err(step, &reached)?;
        }
        Ok(node)
    }

    fn child_or_err(&self, step: &PathStep, at: &Path) -> Result<&ShapedTree<D>> {
        match (self, step) {
            (ShapedTree::Array { children, .. }, PathStep::Array(index)) => children
                .get(*index)
                .map(Arc::as_ref)
                .ok_or_else(|| {
                    FormError::shape(
                        at,
                        format!(
                            "index {index} out of bounds, tree array has length {}",
                            children.len()
                        ),
                    )
                }),
            (ShapedTree::Object { children, .. }, PathStep::Object(key)) => children
                .get(key)
                .map(Arc::as_ref)
                .ok_or_else(|| {
                    FormError::shape(at, format!("key {key:?} missing from tree object"))
                }),
            (ShapedTree::Leaf { .. }, _) => Err(FormError::shape(
                at,
                "path continues past a leaf of the tree",
            )),
            (node, step) => Err(FormError::shape(
                at,
                format!(
                    "{} step taken into {} node",
                    step.container_kind(),
                    node.kind()
                ),
            )),
        }
    }

    /// Non-failing probe: can `path` be navigated in this tree?
    pub fn path_exists(&self, path: &Path) -> bool {
        self.get(path).is_ok()
    }

    /// True if the tree's tags and child indices/keys exactly match `value`.
    pub fn conforms_to(&self, value: &Value) -> bool {
        match (self, value) {
            (ShapedTree::Array { children, .. }, Value::Array(items)) => {
                children.len() == items.len()
                    && children
                        .iter()
                        .zip(items)
                        .all(|(child, item)| child.conforms_to(item))
            }
            (ShapedTree::Object { children, .. }, Value::Object(map)) => {
                children.len() == map.len()
                    && map.iter().all(|(key, item)| {
                        children
                            .get(key)
                            .is_some_and(|child| child.conforms_to(item))
                    })
            }
            (ShapedTree::Leaf { .. }, Value::Array(_) | Value::Object(_)) => false,
            (ShapedTree::Leaf { .. }, _) => true,
            _ => false,
        }
    }

    /// Replace the root data, sharing all children.
    pub fn map_root(&self, f: impl FnOnce(&D) -> D) -> Self {
        match self {
            ShapedTree::Leaf { data } => ShapedTree::Leaf { data: f(data) },
            ShapedTree::Array { data, children } => ShapedTree::Array {
                data: f(data),
                children: children.clone(),
            },
            ShapedTree::Object { data, children } => ShapedTree::Object {
                data: f(data),
                children: children.clone(),
            },
        }
    }

    /// Apply `updater` to the data at `path`; everything else is shared.
    pub fn update_at_path(&self, path: &Path, updater: impl FnOnce(&D) -> D) -> Result<Self>
    where
        D: Clone,
    {
        self.update_steps(path, 0, updater)
    }

    fn update_steps(&self, path: &Path, depth: usize, updater: impl FnOnce(&D) -> D) -> Result<Self>
    where
        D: Clone,
    {
        let Some(step) = path.steps().get(depth) else {
            return Ok(self.map_root(updater));
        };
        let reached = Path::new(path.steps()[..=depth].to_vec());
        let child = self.child_or_err(step, &reached)?;
        let updated = child.update_steps(path, depth + 1, updater)?;
        self.replace_child(step, Arc::new(updated))
            .map_err(|_| FormError::shape(&reached, "child vanished during update"))
    }

    /// Swap one child. The new child's shape is not checked against the old
    /// one; callers keep the companion value in step.
    pub(crate) fn replace_child(&self, step: &PathStep, child: Arc<ShapedTree<D>>) -> Result<Self>
    where
        D: Clone,
    {
        let at = Path::new(vec![step.clone()]);
        match (self, step) {
            (ShapedTree::Array { data, children }, PathStep::Array(index)) => {
                if *index >= children.len() {
                    return Err(FormError::IndexOutOfBounds {
                        path: at.encode(),
                        index: *index,
                        len: children.len(),
                    });
                }
                let mut children = children.clone();
                children[*index] = child;
                Ok(ShapedTree::Array {
                    data: data.clone(),
                    children,
                })
            }
            (ShapedTree::Object { data, children }, PathStep::Object(key)) => {
                if !children.contains_key(key) {
                    return Err(FormError::shape(
                        &at,
                        format!("key {key:?} missing from tree object"),
                    ));
                }
                let mut children = children.clone();
                children.insert(key.clone(), child);
                Ok(ShapedTree::Object {
                    data: data.clone(),
                    children,
                })
            }
            (node, step) => Err(FormError::shape(
                &at,
                format!(
                    "cannot replace {} child of {} node",
                    step.container_kind(),
                    node.kind()
                ),
            )),
        }
    }

    /// Swap the whole child list of an array node.
    pub(crate) fn with_array_children(&self, children: Vec<Arc<ShapedTree<D>>>) -> Result<Self>
    where
        D: Clone,
    {
        match self {
            ShapedTree::Array { data, .. } => Ok(ShapedTree::Array {
                data: data.clone(),
                children,
            }),
            node => Err(FormError::shape(
                Path::root(),
                format!("cannot set array children of {} node", node.kind()),
            )),
        }
    }

    /// Map every node's data; the shape is unchanged.
    pub fn map<E>(&self, f: &impl Fn(&D) -> E) -> ShapedTree<E> {
        match self {
            ShapedTree::Leaf { data } => ShapedTree::Leaf { data: f(data) },
            ShapedTree::Array { data, children } => ShapedTree::Array {
                data: f(data),
                children: children.iter().map(|c| Arc::new(c.map(f))).collect(),
            },
            ShapedTree::Object { data, children } => ShapedTree::Object {
                data: f(data),
                children: children
                    .iter()
                    .map(|(k, c)| (k.clone(), Arc::new(c.map(f))))
                    .collect(),
            },
        }
    }

    /// In-order reduction: the node itself, then its children in order.
    pub fn fold<A: Clone>(
        &self,
        f: &impl Fn(&D) -> A,
        identity: &A,
        combine: &impl Fn(A, A) -> A,
    ) -> A {
        let mut acc = combine(identity.clone(), f(self.data()));
        match self {
            ShapedTree::Leaf { .. } => {}
            ShapedTree::Array { children, .. } => {
                for child in children {
                    acc = combine(acc, child.fold(f, identity, combine));
                }
            }
            ShapedTree::Object { children, .. } => {
                for child in children.values() {
                    acc = combine(acc, child.fold(f, identity, combine));
                }
            }
        }
        acc
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.fold(&|_| 1usize, &0, &|a, b| a + b)
    }
}
