//! Reconciling externally supplied errors (e.g. from a server) into a
//! [`FormState`].
//!
//! The input is a flat map from encoded paths to error lists:
//!
//! ```ignore
//! { "/": ["form rejected"], "/items/0/name": ["taken"] }
//! ```
//!
//! Applying a map is a complete sweep: every node not named in it ends up
//! with an empty (checked) list of external errors.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{trace, warn};

use crate::encoded_path::EncodedPath;
use crate::error::FormError;
use crate::extras::Extras;
use crate::form_state::FormState;
use crate::path::{Path, PathStep};

/// Encoded path (wire string) to error messages.
pub type ExternalErrorMap = BTreeMap<String, Vec<String>>;

/// Resolve a wire path against `value`.
///
/// An index segment that meets an object is read as the object key with the
/// same decimal spelling.
pub fn resolve_path(input: &str, value: &Value) -> Result<Path, FormError> {
    let unresolvable = |reason: String| FormError::UnresolvableExternalErrorPath {
        path: input.to_string(),
        reason,
    };
    let parsed = EncodedPath::parse(input).map_err(|err| unresolvable(err.to_string()))?;

    let mut current = value;
    let mut steps = Vec::new();
    for step in parsed.decode().steps() {
        let (next, resolved) = match (current, step) {
            (Value::Array(items), PathStep::Array(index)) => {
                (items.get(*index), PathStep::Array(*index))
            }
            (Value::Object(map), PathStep::Object(key)) => (map.get(key), step.clone()),
            (Value::Object(map), PathStep::Array(index)) => {
                let key = index.to_string();
                (map.get(&key), PathStep::Object(key))
            }
            (other, step) => {
                return Err(unresolvable(format!(
                    "{} step {step} cannot enter {}",
                    step.container_kind(),
                    kind_of(other)
                )));
            }
        };
        current = next.ok_or_else(|| unresolvable(format!("no child {resolved}")))?;
        steps.push(resolved);
    }
    Ok(Path::new(steps))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
        _ => "a scalar",
    }
}

/// Write `errors` into the external slots of `state`.
///
/// `None` clears every node to an empty list. Keys that do not resolve against
/// the current value are skipped and returned alongside the new state.
pub fn reconcile_external_errors(
    errors: Option<&ExternalErrorMap>,
    state: &FormState,
) -> (FormState, Vec<FormError>) {
    let mut tree = state
        .tree()
        .map(&|extras: &Extras| extras.clone().with_external_errors(Vec::new()));
    let mut skipped = Vec::new();

    for (key, messages) in errors.into_iter().flatten() {
        let resolved = resolve_path(key, state.value()).and_then(|path| {
            tree.update_at_path(&path, |extras| {
                extras.clone().with_external_errors(messages.clone())
            })
        });
        match resolved {
            Ok(updated) => {
                trace!(path = %key, errors = messages.len(), "applied external errors");
                tree = updated;
            }
            Err(err) => {
                warn!(path = %key, error = %err, "skipping external errors for unresolvable path");
                skipped.push(err);
            }
        }
    }

    (FormState::from_parts_unchecked(state.value().clone(), tree), skipped)
}

/// [`reconcile_external_errors`] without the report of skipped keys.
pub fn apply_external_errors(errors: Option<&ExternalErrorMap>, state: &FormState) -> FormState {
    reconcile_external_errors(errors, state).0
}
