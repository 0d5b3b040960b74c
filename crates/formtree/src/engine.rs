//! Client validation: running registered validators and writing their
//! results into a [`FormState`].
//!
//! The engine owns the [`ValidationRegistry`] of one form session. Every
//! operation takes the current root state and returns the next one; nothing
//! is mutated in place except the engine's own bookkeeping.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{FormError, Result};
use crate::extras::{ExternalErrors, Extras};
use crate::form_state::FormState;
use crate::path::{value_at, Path};
use crate::registry::{FieldId, Validation, ValidationRegistry};

/// Returned by [`ValidationEngine::register_validation`]; identifies the
/// registration for later replace/unregister calls.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldHandle {
    id: FieldId,
    path: Path,
}

impl FieldHandle {
    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Clone, Debug, Default)]
pub struct ValidationEngine {
    registry: ValidationRegistry,
    initial_pass_done: bool,
    pending_custom_change: Option<Path>,
    /// Fields deregistered by a custom change; their handles are inert.
    retired: HashSet<FieldId>,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ValidationRegistry {
        &self.registry
    }

    pub fn is_initial_pass_done(&self) -> bool {
        self.initial_pass_done
    }

    pub fn pending_custom_change(&self) -> Option<&Path> {
        self.pending_custom_change.as_ref()
    }

    pub fn is_retired(&self, handle: &FieldHandle) -> bool {
        self.retired.contains(&handle.id)
    }

    /// Concatenated results of the validators registered at exactly `path`.
    pub fn validate_node_only(&self, path: &Path, value: &Value) -> Vec<String> {
        let errors = self.registry.run_at(&path.encode(), value);
        trace!(%path, errors = errors.len(), "validated node");
        errors
    }

    /// Revalidate every registered path at or below `prefix`.
    ///
    /// `subtree` is the state rooted at `prefix`. Only client errors and
    /// `succeeded` are written.
    pub fn validate_subtree(&self, prefix: &Path, subtree: &FormState) -> Result<FormState> {
        let mut tree = subtree.tree().clone();
        for encoded in self.registry.paths_under(&prefix.encode()) {
            let full = encoded.decode();
            let relative = full.strip_prefix(prefix).ok_or_else(|| {
                FormError::shape(&full, format!("registry path is not below {prefix}"))
            })?;
            let value = value_at(subtree.value(), &relative).ok_or_else(|| {
                FormError::shape(&full, "registered path is missing from the value")
            })?;
            let errors = self.registry.run_at(&encoded, value);
            trace!(path = %full, errors = errors.len(), "validated subtree node");
            tree = tree.update_at_path(&relative, |extras| {
                extras.clone().with_client_errors(errors)
            })?;
        }
        Ok(FormState::from_parts_unchecked(subtree.value().clone(), tree))
    }

    /// A single node was edited: rerun its own validators, reset its
    /// external errors to unchecked and mark it touched and changed.
    pub fn apply_change_to_node(&self, path: &Path, node: &FormState) -> FormState {
        let errors = self.validate_node_only(path, node.value());
        node.map_root(|extras| {
            let mut extras = extras.clone().with_client_errors(errors);
            extras.errors.external = ExternalErrors::Unchecked;
            extras.meta.touched = true;
            extras.meta.changed = true;
            extras
        })
    }

    /// The subtree at `path` was replaced by an unrelated value.
    ///
    /// Old extras are discarded, descendant validators are deregistered, and
    /// `path` becomes the pending custom-change path until
    /// [`ValidationEngine::settle_pending_validation`] runs.
    pub fn apply_custom_change_to_tree(&mut self, path: &Path, value: Value) -> Result<FormState> {
        if let Some(pending) = &self.pending_custom_change {
            return Err(FormError::ConcurrentCustomChange {
                pending: pending.encode(),
                requested: path.encode(),
            });
        }
        let changed = FormState::changed(value);
        let removed = self.registry.remove_descendants(&path.encode());
        debug!(%path, removed = removed.len(), "custom change deregistered descendants");
        self.retired.extend(removed);

        let validated = self.validate_subtree(path, &changed)?;
        self.pending_custom_change = Some(path.clone());
        debug!(%path, "pending custom change set");
        Ok(validated)
    }

    /// Register `validation` at `path`. After the initial pass the node's
    /// errors are recomputed immediately.
    pub fn register_validation(
        &mut self,
        path: Path,
        validation: Validation,
        root: &FormState,
    ) -> Result<(FieldHandle, FormState)> {
        let id = self.registry.insert(path.encode(), validation);
        debug!(%path, field = %id, "registered validation");
        let next = if self.initial_pass_done {
            match self.recompute_at(&path, root) {
                Ok(next) => next,
                Err(err) => {
                    self.registry.remove(&path.encode(), id)?;
                    return Err(err);
                }
            }
        } else {
            root.clone()
        };
        Ok((FieldHandle { id, path }, next))
    }

    /// Swap a field's validator. Skips the recompute when old and new
    /// validators agree on the current value.
    pub fn replace_validation(
        &mut self,
        handle: &FieldHandle,
        validation: Validation,
        root: &FormState,
    ) -> Result<FormState> {
        if self.retired.contains(&handle.id) {
            trace!(path = %handle.path, field = %handle.id, "replace on retired field ignored");
            return Ok(root.clone());
        }
        let old = self
            .registry
            .replace(&handle.path.encode(), handle.id, validation.clone())?;
        if !self.initial_pass_done {
            return Ok(root.clone());
        }
        let value = value_at(root.value(), &handle.path).ok_or_else(|| {
            FormError::shape(&handle.path, "replaced field is missing from the value")
        })?;
        if old(value) == validation(value) {
            debug!(path = %handle.path, field = %handle.id, "replace skipped, same errors");
            return Ok(root.clone());
        }
        self.recompute_at(&handle.path, root)
    }

    /// Remove a field's validator and recompute the remaining errors at its
    /// path. A path that is gone from the tree is skipped without error.
    pub fn unregister_validation(
        &mut self,
        handle: &FieldHandle,
        root: &FormState,
    ) -> Result<FormState> {
        if self.retired.remove(&handle.id) {
            trace!(path = %handle.path, field = %handle.id, "unregister on retired field ignored");
            return Ok(root.clone());
        }
        self.registry.remove(&handle.path.encode(), handle.id)?;
        debug!(path = %handle.path, field = %handle.id, "unregistered validation");
        if !root.tree().path_exists(&handle.path) {
            debug!(path = %handle.path, "unregistered path no longer in tree, skipping recompute");
            return Ok(root.clone());
        }
        if !self.initial_pass_done {
            return Ok(root.clone());
        }
        self.recompute_at(&handle.path, root)
    }

    /// The one-time full-tree pass run once the initial fields are mounted.
    pub fn complete_initial_validation(&mut self, root: &FormState) -> Result<FormState> {
        let validated = self.validate_subtree(&Path::root(), root)?;
        self.initial_pass_done = true;
        debug!(fields = self.registry.len(), "initial validation complete");
        Ok(validated)
    }

    /// Consume the pending custom-change path, revalidating its subtree now
    /// that the remounted fields have registered.
    pub fn settle_pending_validation(&mut self, root: &FormState) -> Result<FormState> {
        let Some(path) = self.pending_custom_change.clone() else {
            return Ok(root.clone());
        };
        let settled = if root.tree().path_exists(&path) {
            let subtree = root.at_path(&path)?;
            let validated = self.validate_subtree(&path, &subtree)?;
            root.replace_at_path(&path, validated)?
        } else {
            root.clone()
        };
        self.pending_custom_change = None;
        debug!(%path, "pending custom change cleared");
        Ok(settled)
    }

    /// Mark the node at `path` and all its ancestors touched and blurred.
    pub fn apply_blur(&self, path: &Path, root: &FormState) -> Result<FormState> {
        let mut tree = root.tree().clone();
        for depth in 0..=path.len() {
            let prefix = Path::new(path.steps()[..depth].to_vec());
            tree = tree.update_at_path(&prefix, |extras| extras.clone().set_blurred())?;
        }
        Ok(FormState::from_parts_unchecked(root.value().clone(), tree))
    }

    fn recompute_at(&self, path: &Path, root: &FormState) -> Result<FormState> {
        let value = value_at(root.value(), path)
            .ok_or_else(|| FormError::shape(path, "validated path is missing from the value"))?;
        let errors = self.validate_node_only(path, value);
        let tree = root
            .tree()
            .update_at_path(path, |extras: &Extras| extras.clone().with_client_errors(errors))?;
        Ok(FormState::from_parts_unchecked(root.value().clone(), tree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extras::{ClientErrors, Meta};
    use crate::registry::{always_valid, validation};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn says(msg: &'static str) -> Validation {
        validation(move |_| vec![msg.to_string()])
    }

    fn non_empty() -> Validation {
        validation(|v| match v.as_str() {
            Some("") => vec!["empty".to_string()],
            _ => vec![],
        })
    }

    fn client_at(state: &FormState, path: &Path) -> ClientErrors {
        state.at_path(path).unwrap().extras().errors.client.clone()
    }

    #[test]
    fn node_validation_concatenates_in_registration_order() {
        let mut engine = ValidationEngine::new();
        let state = FormState::fresh(json!({"x": 1}));
        let x = Path::root().key("x");
        let (_, state) = engine.register_validation(x.clone(), says("a"), &state).unwrap();
        let (_, state) = engine.register_validation(x.clone(), says("b"), &state).unwrap();

        assert_eq!(client_at(&state, &x), ClientErrors::Pending);
        let state = engine.complete_initial_validation(&state).unwrap();
        assert_eq!(client_at(&state, &x), ClientErrors::Checked(vec!["a".into(), "b".into()]));
        assert_eq!(client_at(&state, &Path::root()), ClientErrors::Pending);
        assert!(!state.is_valid());
    }

    #[test]
    fn change_resets_external_errors() {
        let engine = ValidationEngine::new();
        let node = FormState::fresh(json!("v"))
            .map_root(|e| e.clone().with_external_errors(vec!["old ext error".into()]));
        let changed = engine.apply_change_to_node(&Path::root(), &node);
        let extras = changed.extras();
        assert_eq!(extras.errors.external, ExternalErrors::Unchecked);
        assert_eq!(extras.errors.client, ClientErrors::Checked(vec![]));
        assert!(extras.meta.touched && extras.meta.changed && extras.meta.succeeded);
        assert!(!extras.meta.blurred);
    }

    #[test]
    fn register_after_initial_pass_recomputes_only_that_node() {
        let mut engine = ValidationEngine::new();
        let state = FormState::fresh(json!({"a": "", "b": ""}));
        let (_, state) = engine
            .register_validation(Path::root().key("a"), non_empty(), &state)
            .unwrap();
        let state = engine.complete_initial_validation(&state).unwrap();

        let (_, state) = engine
            .register_validation(Path::root().key("b"), non_empty(), &state)
            .unwrap();
        assert_eq!(
            client_at(&state, &Path::root().key("b")),
            ClientErrors::Checked(vec!["empty".into()])
        );
        assert_eq!(client_at(&state, &Path::root()), ClientErrors::Pending);
    }

    #[test]
    fn replace_skips_when_errors_match() {
        let mut engine = ValidationEngine::new();
        let x = Path::root().key("x");
        let state = FormState::fresh(json!({"x": 1}));
        let (handle, state) = engine.register_validation(x.clone(), says("a"), &state).unwrap();
        let state = engine.complete_initial_validation(&state).unwrap();

        let same = engine.replace_validation(&handle, says("a"), &state).unwrap();
        assert_eq!(same, state);

        let next = engine.replace_validation(&handle, always_valid(), &state).unwrap();
        assert_eq!(client_at(&next, &x), ClientErrors::Checked(vec![]));
        assert!(next.at_path(&x).unwrap().extras().meta.succeeded);
    }

    #[test]
    fn unregister_then_register_is_idempotent() {
        let mut engine = ValidationEngine::new();
        let x = Path::root().key("x");
        let state = FormState::fresh(json!({"x": ""}));
        let (handle, state) = engine.register_validation(x.clone(), non_empty(), &state).unwrap();
        let state = engine.complete_initial_validation(&state).unwrap();

        let removed = engine.unregister_validation(&handle, &state).unwrap();
        assert_eq!(client_at(&removed, &x), ClientErrors::Checked(vec![]));

        let (_, again) = engine.register_validation(x.clone(), non_empty(), &removed).unwrap();
        assert_eq!(client_at(&again, &x), client_at(&state, &x));
        assert!(matches!(
            engine.unregister_validation(&handle, &again),
            Err(FormError::MissingFieldEntry { .. })
        ));
    }

    #[test]
    fn unregister_on_removed_path_is_soft() {
        let mut engine = ValidationEngine::new();
        let item = Path::root().index(1);
        let state = FormState::fresh(json!(["a", "b"]));
        let (handle, state) = engine.register_validation(item, non_empty(), &state).unwrap();
        engine.complete_initial_validation(&state).unwrap();

        let shrunk = FormState::fresh(json!(["a"]));
        let after = engine.unregister_validation(&handle, &shrunk).unwrap();
        assert_eq!(after, shrunk);
        assert!(engine.registry().is_empty());
    }

    #[test]
    fn custom_change_discards_history_and_descendants() {
        let mut engine = ValidationEngine::new();
        let state = FormState::fresh(json!({"obj": {"a": 1, "b": 2}}));
        let obj = Path::root().key("obj");
        let (own, state) = engine.register_validation(obj.clone(), always_valid(), &state).unwrap();
        let (child, state) = engine
            .register_validation(obj.key("a"), says("stale"), &state)
            .unwrap();
        let state = engine.complete_initial_validation(&state).unwrap();

        let replaced = engine
            .apply_custom_change_to_tree(&obj, json!({"a": 9, "b": 9, "c": 9}))
            .unwrap();
        let every_node_changed = replaced.tree().fold(
            &|e: &Extras| {
                e.meta == Meta::CHANGED
                    || e.meta
                        == Meta {
                            succeeded: true,
                            ..Meta::CHANGED
                        }
            },
            &true,
            &|l, r| l && r,
        );
        assert!(every_node_changed);
        assert!(!replaced.object_child("c").unwrap().extras().meta.succeeded);
        assert_eq!(replaced.extras().errors.client, ClientErrors::Checked(vec![]));
        assert_eq!(engine.registry().len(), 1);
        assert!(engine.is_retired(&child));
        assert!(!engine.is_retired(&own));
        assert_eq!(engine.pending_custom_change(), Some(&obj));

        assert!(matches!(
            engine.apply_custom_change_to_tree(&Path::root(), json!(null)),
            Err(FormError::ConcurrentCustomChange { .. })
        ));

        // Retired handles are inert.
        let root = state.replace_at_path(&obj, replaced).unwrap();
        assert_eq!(engine.replace_validation(&child, says("x"), &root).unwrap(), root);
        assert_eq!(engine.unregister_validation(&child, &root).unwrap(), root);

        let settled = engine.settle_pending_validation(&root).unwrap();
        assert!(engine.pending_custom_change().is_none());
        assert_eq!(settled.value(), &json!({"obj": {"a": 9, "b": 9, "c": 9}}));
        assert!(engine.apply_custom_change_to_tree(&obj, json!([])).is_ok());
    }

    #[test]
    fn failed_settle_keeps_pending_path() {
        let mut engine = ValidationEngine::new();
        let obj = Path::root().key("obj");
        let state = FormState::fresh(json!({"obj": {"a": 1}}));
        let state = engine.complete_initial_validation(&state).unwrap();
        let replaced = engine
            .apply_custom_change_to_tree(&obj, json!({"b": 2}))
            .unwrap();
        // Registered against the old shape, so settling cannot find it.
        let (stale, _) = engine
            .register_validation(obj.key("a"), always_valid(), &state)
            .unwrap();
        let root = state.replace_at_path(&obj, replaced).unwrap();

        assert!(matches!(
            engine.settle_pending_validation(&root),
            Err(FormError::ShapeMismatch { .. })
        ));
        assert_eq!(engine.pending_custom_change(), Some(&obj));

        engine.unregister_validation(&stale, &root).unwrap();
        engine.settle_pending_validation(&root).unwrap();
        assert!(engine.pending_custom_change().is_none());
    }

    #[test]
    fn failed_register_leaves_registry_unchanged() {
        let mut engine = ValidationEngine::new();
        let state = FormState::fresh(json!({"x": 1}));
        let state = engine.complete_initial_validation(&state).unwrap();
        assert!(engine
            .register_validation(Path::root().key("missing"), always_valid(), &state)
            .is_err());
        assert!(engine.registry().is_empty());
    }

    #[test]
    fn blur_marks_node_and_ancestors() {
        let engine = ValidationEngine::new();
        let state = FormState::fresh(json!({"a": [{"b": 1}], "z": 0}));
        let path = Path::root().key("a").index(0).key("b");
        let blurred = engine.apply_blur(&path, &state).unwrap();
        for depth in 0..=path.len() {
            let at = Path::new(path.steps()[..depth].to_vec());
            let meta = blurred.at_path(&at).unwrap().extras().meta;
            assert!(meta.blurred && meta.touched, "{at}");
            assert!(!meta.changed);
        }
        assert!(!blurred.object_child("z").unwrap().extras().meta.blurred);
        assert!(engine.apply_blur(&Path::root().key("nope"), &state).is_err());
    }

    #[test]
    fn subtree_validation_uses_relative_paths() {
        let mut engine = ValidationEngine::new();
        let state = FormState::fresh(json!({"list": ["", "x"]}));
        let list = Path::root().key("list");
        let (_, state) = engine.register_validation(list.index(0), non_empty(), &state).unwrap();
        let (_, state) = engine.register_validation(list.index(1), non_empty(), &state).unwrap();

        let sub = state.at_path(&list).unwrap();
        let validated = engine.validate_subtree(&list, &sub).unwrap();
        assert_eq!(
            validated.array_child(0).unwrap().extras().errors.client,
            ClientErrors::Checked(vec!["empty".into()])
        );
        assert!(validated.array_child(1).unwrap().extras().meta.succeeded);

        let seeded = sub
            .replace_array_child(
                1,
                sub.array_child(1).unwrap().map_root(|e| {
                    let mut e = e.clone().with_external_errors(vec!["server".into()]);
                    e.meta.touched = true;
                    e
                }),
            )
            .unwrap();
        let revalidated = engine.validate_subtree(&list, &seeded).unwrap();
        let second = revalidated.array_child(1).unwrap().extras().clone();
        assert!(second.meta.touched && !second.meta.changed);
        assert_eq!(second.errors.external, ExternalErrors::Checked(vec!["server".into()]));
        assert_eq!(second.errors.client, ClientErrors::Checked(vec![]));

        let too_short = FormState::fresh(json!([""]));
        assert!(matches!(
            engine.validate_subtree(&list, &too_short),
            Err(FormError::ShapeMismatch { .. })
        ));
    }
}
