//! A form session: the root [`FormState`] plus everything needed to edit it.
//!
//! [`Form`] is what a rendering layer talks to. Fields register validators
//! when they mount, report edits and blurs by path, and read back an
//! [`AdditionalInfo`] bundle to decide what to display. Every edit is applied
//! synchronously; the new root state is available as soon as the call returns.
//!
//! An edit at a nested path travels upward. Each ancestor container gets the
//! rebuilt child, may turn the edit into a custom change through its hook,
//! and reruns its own validators.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::array_edit::{ArrayEdit, Modification, Span};
use crate::config::FormConfig;
use crate::encoded_path::EncodedPath;
use crate::engine::{FieldHandle, ValidationEngine};
use crate::error::{FormError, Result};
use crate::external::{reconcile_external_errors, ExternalErrorMap};
use crate::extras::{ClientErrors, ExternalErrors};
use crate::feedback::MetaForm;
use crate::form_state::FormState;
use crate::navigation::{DirtyFlag, DirtyTracker, NavigationDelegate, NavigationGuard};
use crate::path::Path;
use crate::registry::Validation;

/// `(old, new)` value of a container; `Some(replacement)` turns the edit
/// into a custom change of the whole container.
pub type CustomChange = Arc<dyn Fn(&Value, &Value) -> Option<Value> + Send + Sync>;

/// Replaces the built-in dirty flag with a judgement on the current value.
pub type CustomDirty = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    pub client: bool,
    pub external: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub value: Value,
    pub valid: Validity,
}

/// Read-only snapshot for rendering one field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    pub touched: bool,
    pub changed: bool,
    pub blurred: bool,
    pub should_show_errors: bool,
    pub unfiltered_errors: Vec<String>,
    /// Client validity of the field's whole subtree.
    pub valid: bool,
    pub async_validation_in_flight: bool,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorsInfo {
    pub should_show_errors: bool,
    pub client: ClientErrors,
    pub external: ExternalErrors,
    pub flattened: Vec<String>,
}

pub struct Form {
    state: FormState,
    engine: ValidationEngine,
    meta: MetaForm,
    config: FormConfig,
    external_errors: Option<ExternalErrorMap>,
    custom_changes: HashMap<EncodedPath, CustomChange>,
    custom_dirty: Option<CustomDirty>,
    edited_since_submit: bool,
    dirty: DirtyFlag,
    tracker: Option<DirtyTracker>,
    navigation: Option<(NavigationGuard, Arc<NavigationDelegate>)>,
}

impl Form {
    /// A fresh form. No external errors are known, so every node's external
    /// errors start as an empty list.
    pub fn new(initial_value: Value, config: FormConfig) -> Self {
        let (state, _) = reconcile_external_errors(None, &FormState::fresh(initial_value));
        Self {
            state,
            engine: ValidationEngine::new(),
            meta: MetaForm::default(),
            config,
            external_errors: None,
            custom_changes: HashMap::new(),
            custom_dirty: None,
            edited_since_submit: false,
            dirty: DirtyFlag::default(),
            tracker: None,
            navigation: None,
        }
    }

    pub fn from_serializable<T: Serialize>(model: &T, config: FormConfig) -> Result<Self> {
        Ok(Self::new(serde_json::to_value(model)?, config))
    }

    pub fn with_external_errors(mut self, errors: Option<ExternalErrorMap>) -> Self {
        self.set_external_errors(errors);
        self
    }

    pub fn with_custom_dirty(mut self, f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.custom_dirty = Some(Arc::new(f));
        self.refresh_dirty();
        self
    }

    /// Report this form's dirty state to `tracker` if `trace_dirty` is set.
    pub fn with_dirty_tracker(mut self, tracker: &DirtyTracker) -> Self {
        if !self.config.trace_dirty {
            debug!("trace_dirty is off, not registering with dirty tracker");
            return self;
        }
        self.detach_tracker();
        tracker.attach(self.dirty.clone());
        self.tracker = Some(tracker.clone());
        self
    }

    /// Register a navigation delegate that reports this form's dirty state.
    pub fn guard_navigation(
        &mut self,
        guard: &NavigationGuard,
        current_url: impl Into<String>,
    ) -> Arc<NavigationDelegate> {
        self.detach_navigation();
        let delegate = guard.register(
            NavigationDelegate::new(current_url)
                .with_confirm_on_same_page(self.config.confirm_on_same_page)
                .with_dirty_flag(self.dirty.clone()),
        );
        self.navigation = Some((guard.clone(), delegate.clone()));
        delegate
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn value(&self) -> &Value {
        self.state.value()
    }

    pub fn value_as<T: DeserializeOwned>(&self) -> Result<T> {
        self.state.value_as()
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn meta(&self) -> MetaForm {
        self.meta
    }

    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_valid()
    }

    pub fn is_dirty(&self) -> bool {
        match &self.custom_dirty {
            Some(custom) => custom(self.state.value()),
            None => self.edited_since_submit,
        }
    }

    pub fn register_field(&mut self, path: Path, validation: Validation) -> Result<FieldHandle> {
        let (handle, state) = self.engine.register_validation(path, validation, &self.state)?;
        self.state = state;
        Ok(handle)
    }

    pub fn replace_validation(
        &mut self,
        handle: &FieldHandle,
        validation: Validation,
    ) -> Result<()> {
        self.state = self.engine.replace_validation(handle, validation, &self.state)?;
        Ok(())
    }

    pub fn unregister_field(&mut self, handle: &FieldHandle) -> Result<()> {
        self.state = self.engine.unregister_validation(handle, &self.state)?;
        Ok(())
    }

    /// Run the one-time full validation pass after the initial fields mounted.
    pub fn finish_mount(&mut self) -> Result<()> {
        if self.engine.is_initial_pass_done() {
            trace!("initial validation already done");
            return Ok(());
        }
        self.state = self.engine.complete_initial_validation(&self.state)?;
        Ok(())
    }

    /// Revalidate after a custom change, once the fields of the new shape
    /// have registered.
    pub fn settle(&mut self) -> Result<()> {
        self.state = self.engine.settle_pending_validation(&self.state)?;
        Ok(())
    }

    pub fn set_custom_change(
        &mut self,
        path: &Path,
        hook: impl Fn(&Value, &Value) -> Option<Value> + Send + Sync + 'static,
    ) {
        self.custom_changes.insert(path.encode(), Arc::new(hook));
    }

    pub fn clear_custom_change(&mut self, path: &Path) {
        self.custom_changes.remove(&path.encode());
    }

    /// Edit the value at `path`.
    pub fn change(&mut self, path: &Path, value: Value) -> Result<()> {
        trace!(%path, "change");
        let edited = self.state.at_path(path)?.with_edited_value(value);
        let node = self.engine.apply_change_to_node(path, &edited);
        self.rollback_on_error(|form| form.propagate(path, node))
    }

    /// Mark the field at `path` and its ancestors blurred.
    pub fn blur(&mut self, path: &Path) -> Result<()> {
        self.state = self.engine.apply_blur(path, &self.state)?;
        Ok(())
    }

    pub fn add_field(&mut self, path: &Path, index: usize, value: Value) -> Result<()> {
        let edit = self.begin_array_edit(path)?.insert(index, value)?;
        self.apply_array_edit(path, edit)
    }

    pub fn remove_field(&mut self, path: &Path, index: usize) -> Result<()> {
        let edit = self.begin_array_edit(path)?.remove(index)?;
        self.apply_array_edit(path, edit)
    }

    pub fn move_field(&mut self, path: &Path, from: usize, to: usize) -> Result<()> {
        let edit = self.begin_array_edit(path)?.move_item(from, to)?;
        self.apply_array_edit(path, edit)
    }

    pub fn add_fields(&mut self, path: &Path, spans: Vec<Span<Value>>) -> Result<()> {
        let edit = self.begin_array_edit(path)?.insert_spans(spans)?;
        self.apply_array_edit(path, edit)
    }

    pub fn filter_fields(
        &mut self,
        path: &Path,
        keep: impl Fn(&Value, usize, &[Value]) -> bool,
    ) -> Result<()> {
        let edit = self.begin_array_edit(path)?.filter(keep);
        self.apply_array_edit(path, edit)
    }

    /// Insert spans, then filter the result.
    pub fn modify_fields(
        &mut self,
        path: &Path,
        modification: Modification<'_, Value>,
    ) -> Result<()> {
        let mut edit = self.begin_array_edit(path)?;
        if let Some(spans) = modification.insert_spans {
            edit = edit.insert_spans(spans)?;
        }
        if let Some(keep) = modification.filter_predicate {
            edit = edit.filter(keep);
        }
        self.apply_array_edit(path, edit)
    }

    /// Apply a new external-errors map. An identical map is not re-applied.
    /// Returns the keys that could not be matched to the current value.
    pub fn set_external_errors(&mut self, errors: Option<ExternalErrorMap>) -> Vec<FormError> {
        if errors == self.external_errors {
            trace!("external errors unchanged");
            return Vec::new();
        }
        let (state, skipped) = reconcile_external_errors(errors.as_ref(), &self.state);
        self.state = state;
        self.external_errors = errors;
        skipped
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        self.meta.submitted = true;
        self.edited_since_submit = false;
        self.refresh_dirty();
        let valid = Validity {
            client: self.state.is_valid(),
            external: self.state.is_externally_valid(),
        };
        debug!(client = valid.client, external = valid.external, "form submitted");
        SubmitOutcome {
            value: self.state.value().clone(),
            valid,
        }
    }

    pub fn should_show_errors(&self, path: &Path) -> Result<bool> {
        let node = self.state.at_path(path)?;
        Ok(self
            .config
            .feedback_strategy
            .should_show(&self.meta, &node.extras().meta))
    }

    pub fn additional_info(&self, path: &Path) -> Result<AdditionalInfo> {
        let node = self.state.at_path(path)?;
        let extras = node.extras();
        Ok(AdditionalInfo {
            touched: extras.meta.touched,
            changed: extras.meta.changed,
            blurred: extras.meta.blurred,
            should_show_errors: self.config.feedback_strategy.should_show(&self.meta, &extras.meta),
            unfiltered_errors: node.flat_root_errors(),
            valid: node.is_valid(),
            async_validation_in_flight: extras.meta.async_validation_in_flight,
            value: node.value().clone(),
        })
    }

    /// Errors at `path` the user should currently see.
    pub fn field_errors(&self, path: &Path) -> Result<Vec<String>> {
        let info = self.errors_info(path)?;
        Ok(if info.should_show_errors {
            info.flattened
        } else {
            Vec::new()
        })
    }

    pub fn errors_info(&self, path: &Path) -> Result<ErrorsInfo> {
        let node = self.state.at_path(path)?;
        let extras = node.extras();
        Ok(ErrorsInfo {
            should_show_errors: self.config.feedback_strategy.should_show(&self.meta, &extras.meta),
            client: extras.errors.client.clone(),
            external: extras.errors.external.clone(),
            flattened: extras.errors.flattened(),
        })
    }

    fn begin_array_edit(&self, path: &Path) -> Result<ArrayEdit> {
        ArrayEdit::begin(&self.state.at_path(path)?, path.clone())
    }

    fn apply_array_edit(&mut self, path: &Path, edit: ArrayEdit) -> Result<()> {
        let old = self.state.at_path(path)?;
        let staged = Value::Array(edit.staged_value());
        self.rollback_on_error(|form| {
            let node = match form.custom_value(path, old.value(), &staged) {
                Some(custom) => form.engine.apply_custom_change_to_tree(path, custom)?,
                None => form.engine.apply_change_to_node(path, &edit.commit()?),
            };
            form.propagate(path, node)
        })
    }

    /// Run an edit that may touch the engine at several levels. On error the
    /// engine is restored, so registry, retired handles and the pending
    /// custom change match the uncommitted state again.
    fn rollback_on_error(&mut self, edit: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        let saved = self.engine.clone();
        let result = edit(self);
        if let Err(err) = &result {
            debug!(%err, "edit failed, validation engine restored");
            self.engine = saved;
        }
        result
    }

    fn custom_value(&self, path: &Path, old: &Value, new: &Value) -> Option<Value> {
        let hook = self.custom_changes.get(&path.encode())?;
        let custom = hook(old, new);
        if custom.is_some() {
            debug!(%path, "custom change hook replaced value");
        }
        custom
    }

    /// Write `node` back at `path`, rebuilding and revalidating every
    /// ancestor, then commit the new root.
    fn propagate(&mut self, path: &Path, node: FormState) -> Result<()> {
        let mut node = node;
        let mut path = path.clone();
        while let Some((parent_path, step)) = path.split_last() {
            let step = step.clone();
            let old_parent = self.state.at_path(&parent_path)?;
            let parent = old_parent.replace_child(&step, node)?;
            node = match self.custom_value(&parent_path, old_parent.value(), parent.value()) {
                Some(custom) => self.engine.apply_custom_change_to_tree(&parent_path, custom)?,
                None => self.engine.apply_change_to_node(&parent_path, &parent),
            };
            path = parent_path;
        }
        self.state = node;
        self.meta.pristine = false;
        self.edited_since_submit = true;
        self.refresh_dirty();
        Ok(())
    }

    fn refresh_dirty(&self) {
        self.dirty.set(self.is_dirty());
    }

    fn detach_tracker(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            tracker.unregister(&self.dirty);
        }
    }

    fn detach_navigation(&mut self) {
        if let Some((guard, delegate)) = self.navigation.take() {
            guard.unregister(&delegate);
        }
    }
}

impl Drop for Form {
    fn drop(&mut self) {
        self.detach_tracker();
        self.detach_navigation();
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("value", self.state.value())
            .field("meta", &self.meta)
            .field("config", &self.config)
            .field("registry", self.engine.registry())
            .field("pending_custom_change", &self.engine.pending_custom_change())
            .field("dirty", &self.dirty.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackStrategy;
    use crate::registry::validation;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn required() -> Validation {
        validation(|v| match v {
            Value::String(s) if s.is_empty() => vec!["required".to_string()],
            _ => vec![],
        })
    }

    #[test]
    fn change_propagates_to_ancestors() {
        let mut form = Form::new(json!({"person": {"name": ""}}), FormConfig::default());
        let name = Path::root().key("person").key("name");
        form.register_field(name.clone(), required()).unwrap();
        form.finish_mount().unwrap();
        assert!(!form.is_valid());

        form.change(&name, json!("Ada")).unwrap();
        assert!(form.is_valid());
        assert_eq!(form.value(), &json!({"person": {"name": "Ada"}}));
        for path in [Path::root(), Path::root().key("person"), name.clone()] {
            let info = form.additional_info(&path).unwrap();
            assert!(info.touched && info.changed, "{path}");
        }
        assert!(!form.meta().pristine);
        assert!(form.is_dirty());
    }

    #[test]
    fn feedback_strategy_filters_field_errors() {
        let config = FormConfig {
            feedback_strategy: FeedbackStrategy::Touched.or(FeedbackStrategy::Submitted),
            ..FormConfig::default()
        };
        let mut form = Form::new(json!({"a": "", "b": ""}), config);
        let a = Path::root().key("a");
        let b = Path::root().key("b");
        form.register_field(a.clone(), required()).unwrap();
        form.register_field(b.clone(), required()).unwrap();
        form.finish_mount().unwrap();

        assert!(form.field_errors(&a).unwrap().is_empty());
        assert_eq!(form.additional_info(&a).unwrap().unfiltered_errors, vec!["required"]);

        form.blur(&a).unwrap();
        assert_eq!(form.field_errors(&a).unwrap(), vec!["required"]);
        assert!(form.field_errors(&b).unwrap().is_empty());
        assert!(form.meta().pristine);

        let outcome = form.submit();
        assert_eq!(outcome.valid, Validity { client: false, external: true });
        assert_eq!(form.field_errors(&b).unwrap(), vec!["required"]);
    }

    #[test]
    fn container_hook_turns_edit_into_custom_change() {
        let mut form = Form::new(json!({"pair": {"a": 1, "b": 2}}), FormConfig::default());
        let pair = Path::root().key("pair");
        let a = pair.key("a");
        let stale = form.register_field(a.clone(), validation(|_| vec![])).unwrap();
        form.finish_mount().unwrap();
        form.set_custom_change(&pair, |_, new| {
            (new["a"] == json!(9)).then(|| json!({"a": 9, "b": 9, "c": 9}))
        });

        form.change(&a, json!(9)).unwrap();
        assert_eq!(form.value(), &json!({"pair": {"a": 9, "b": 9, "c": 9}}));
        assert!(form.engine().is_retired(&stale));
        assert_eq!(form.engine().pending_custom_change(), Some(&pair));

        let c = form.additional_info(&pair.key("c")).unwrap();
        assert!(c.touched && c.changed);
        assert!(matches!(
            form.change(&pair.key("b"), json!(1)),
            Err(FormError::ConcurrentCustomChange { .. })
        ));

        form.unregister_field(&stale).unwrap();
        form.register_field(a.clone(), validation(|_| vec!["again".into()])).unwrap();
        form.settle().unwrap();
        assert_eq!(form.field_errors(&a).unwrap(), vec!["again"]);
        assert!(form.engine().pending_custom_change().is_none());
    }

    #[test]
    fn failed_nested_custom_change_leaves_engine_untouched() {
        let mut form = Form::new(json!({"outer": {"inner": {"a": 1}}}), FormConfig::default());
        let outer = Path::root().key("outer");
        let inner = outer.key("inner");
        let a = inner.key("a");
        let handle = form.register_field(a.clone(), validation(|_| vec![])).unwrap();
        form.finish_mount().unwrap();
        form.set_custom_change(&inner, |_, _| Some(json!({"a": 7})));
        form.set_custom_change(&outer, |_, _| Some(json!({"inner": {"a": 8}})));
        let before = form.state().clone();

        assert!(matches!(
            form.change(&a, json!(5)),
            Err(FormError::ConcurrentCustomChange { .. })
        ));
        assert_eq!(form.state(), &before);
        assert!(form.engine().pending_custom_change().is_none());
        assert_eq!(form.engine().registry().len(), 1);
        assert!(!form.engine().is_retired(&handle));

        form.clear_custom_change(&outer);
        form.change(&a, json!(5)).unwrap();
        assert_eq!(form.value(), &json!({"outer": {"inner": {"a": 7}}}));
        assert_eq!(form.engine().pending_custom_change(), Some(&inner));
        assert!(form.engine().is_retired(&handle));
    }

    #[test]
    fn failed_array_edit_leaves_engine_untouched() {
        let mut form = Form::new(json!({"group": {"list": [1]}}), FormConfig::default());
        let group = Path::root().key("group");
        let list = group.key("list");
        let handle = form.register_field(list.index(0), validation(|_| vec![])).unwrap();
        form.finish_mount().unwrap();
        form.set_custom_change(&list, |_, _| Some(json!([])));
        form.set_custom_change(&group, |_, _| Some(json!({"list": [0]})));

        assert!(form.add_field(&list, 1, json!(2)).is_err());
        assert_eq!(form.value(), &json!({"group": {"list": [1]}}));
        assert!(form.engine().pending_custom_change().is_none());
        assert!(!form.engine().is_retired(&handle));
        assert_eq!(form.engine().registry().len(), 1);
    }

    #[test]
    fn array_operations_keep_extras_aligned() {
        let mut form = Form::new(json!({"list": ["1", "2"]}), FormConfig::default());
        let list = Path::root().key("list");
        for index in 0..2 {
            form.register_field(list.index(index), required()).unwrap();
        }
        form.finish_mount().unwrap();
        form.blur(&list.index(1)).unwrap();

        form.remove_field(&list, 0).unwrap();
        form.add_field(&list, 0, json!("x")).unwrap();
        assert_eq!(form.value(), &json!({"list": ["x", "2"]}));
        assert!(!form.additional_info(&list.index(0)).unwrap().blurred);
        assert!(form.additional_info(&list.index(1)).unwrap().blurred);

        form.move_field(&list, 0, 1).unwrap();
        assert_eq!(form.value(), &json!({"list": ["2", "x"]}));

        form.add_fields(&list, vec![(0, vec![json!("a")]), (2, vec![json!("b")])]).unwrap();
        assert_eq!(form.value(), &json!({"list": ["a", "2", "x", "b"]}));

        form.filter_fields(&list, |v, _, _| v != &json!("x")).unwrap();
        assert_eq!(form.value(), &json!({"list": ["a", "2", "b"]}));

        let keep_first_two = |_: &Value, index: usize, _: &[Value]| index < 2;
        form.modify_fields(
            &list,
            Modification {
                insert_spans: Some(vec![(0, vec![json!("z")])]),
                filter_predicate: Some(&keep_first_two),
            },
        )
        .unwrap();
        assert_eq!(form.value(), &json!({"list": ["z", "a"]}));
        assert!(form.add_field(&list, 5, json!("far")).is_err());
        assert!(form.remove_field(&Path::root(), 0).is_err());
    }

    #[test]
    fn external_errors_reapply_only_on_change() {
        let mut errors = ExternalErrorMap::new();
        errors.insert("/x".into(), vec!["taken".into()]);
        let mut form = Form::new(json!({"x": 1}), FormConfig::default())
            .with_external_errors(Some(errors.clone()));
        let x = Path::root().key("x");
        assert_eq!(form.field_errors(&x).unwrap(), vec!["taken"]);

        form.change(&x, json!(2)).unwrap();
        assert_eq!(form.errors_info(&x).unwrap().external, ExternalErrors::Unchecked);

        assert!(form.set_external_errors(Some(errors.clone())).is_empty());
        assert_eq!(form.errors_info(&x).unwrap().external, ExternalErrors::Unchecked);

        errors.insert("/nope".into(), vec!["lost".into()]);
        let skipped = form.set_external_errors(Some(errors));
        assert_eq!(skipped.len(), 1);
        assert_eq!(form.field_errors(&x).unwrap(), vec!["taken"]);
        assert!(!form.submit().valid.external);
    }

    #[test]
    fn submit_resets_dirty() {
        let tracker = DirtyTracker::new();
        let config = FormConfig {
            trace_dirty: true,
            ..FormConfig::default()
        };
        let mut form = Form::new(json!("hello"), config).with_dirty_tracker(&tracker);
        assert_eq!(tracker.len(), 1);
        assert!(!tracker.is_dirty());

        form.change(&Path::root(), json!("world")).unwrap();
        assert!(tracker.is_dirty());

        let outcome = form.submit();
        assert_eq!(outcome.value, json!("world"));
        assert!(!tracker.is_dirty());

        drop(form);
        assert!(tracker.is_empty());
    }

    #[test]
    fn custom_dirty_overrides_flag() {
        let tracker = DirtyTracker::new();
        let config = FormConfig {
            trace_dirty: true,
            ..FormConfig::default()
        };
        let form = Form::new(json!(1), config)
            .with_custom_dirty(|_| true)
            .with_dirty_tracker(&tracker);
        assert!(form.is_dirty());
        assert!(tracker.is_dirty());

        let untraced = Form::new(json!(1), FormConfig::default()).with_dirty_tracker(&tracker);
        assert_eq!(tracker.len(), 1);
        drop(untraced);
    }

    #[test]
    fn navigation_guard_follows_dirty_state() {
        let guard = NavigationGuard::new();
        let mut form = Form::new(json!({"x": 1}), FormConfig::default());
        form.guard_navigation(&guard, "/edit");
        assert!(!guard.should_confirm(Some("/home")));

        form.change(&Path::root().key("x"), json!(2)).unwrap();
        assert!(guard.should_confirm(Some("/home")));
        assert!(!guard.should_confirm(Some("/edit")));

        drop(form);
        assert!(guard.is_empty());
    }

    #[test]
    fn typed_round_trip() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Login {
            user: String,
            remember: bool,
        }
        let mut form = Form::from_serializable(
            &Login { user: "ada".into(), remember: false },
            FormConfig::default(),
        )
        .unwrap();
        form.change(&Path::root().key("remember"), json!(true)).unwrap();
        assert_eq!(
            form.value_as::<Login>().unwrap(),
            Login { user: "ada".into(), remember: true }
        );
    }
}
