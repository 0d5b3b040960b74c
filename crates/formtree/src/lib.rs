//! Path-addressed validation state for nested form values.
//!
//! A form value is an arbitrary JSON-like tree. Next to it the crate keeps a
//! [`ShapedTree`] of [`Extras`] with exactly the same shape, holding client
//! errors, external errors and interaction metadata for every node. Edits
//! produce new snapshots that share unchanged subtrees.
//!
//! Validators are registered per path (see [`ValidationEngine`]); external
//! errors arrive as a flat map keyed by encoded paths such as
//! `/items/0/name` (see [`EncodedPath`]). The [`Form`] session ties both
//! together for a rendering layer.
//!
//! # Example
//!
//! ```ignore
//! use formtree::{validation, Form, FormConfig, Path};
//! use serde_json::json;
//!
//! let mut form = Form::new(json!({"name": ""}), FormConfig::default());
//! let name = Path::root().key("name");
//! form.register_field(name.clone(), validation(|v| {
//!     if v == "" { vec!["required".into()] } else { vec![] }
//! }))?;
//! form.finish_mount()?;
//! assert!(!form.is_valid());
//!
//! form.change(&name, json!("Ada"))?;
//! assert!(form.is_valid());
//! ```

pub mod array_edit;
pub mod config;
pub mod encoded_path;
pub mod engine;
pub mod error;
pub mod external;
pub mod extras;
pub mod feedback;
pub mod form;
pub mod form_state;
pub mod navigation;
pub mod path;
pub mod registry;
pub mod shaped_tree;

// Re-export main types
pub use array_edit::{ArrayEdit, Modification, Span};
pub use config::FormConfig;
pub use encoded_path::EncodedPath;
pub use engine::{FieldHandle, ValidationEngine};
pub use error::{FormError, Result};
pub use external::{apply_external_errors, reconcile_external_errors, ExternalErrorMap};
pub use extras::{ClientErrors, Errors, ExternalErrors, Extras, Meta};
pub use feedback::{FeedbackStrategy, MetaForm};
pub use form::{AdditionalInfo, CustomChange, ErrorsInfo, Form, SubmitOutcome, Validity};
pub use form_state::{ExtrasTree, FormState};
pub use navigation::{DirtyFlag, DirtyTracker, NavigationDelegate, NavigationGuard};
pub use path::{Path, PathStep};
pub use registry::{always_valid, validation, FieldId, Validation, ValidationRegistry};
pub use shaped_tree::ShapedTree;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
