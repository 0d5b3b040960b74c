//! When should a field's errors be shown to the user?
//!
//! A [`FeedbackStrategy`] looks at form-wide state ([`MetaForm`]) and the
//! field's own [`Meta`]. Strategies are plain data so they can be written in
//! a config file:
//!
//! ```ignore
//! feedback_strategy: Or(Touched, Submitted)
//! ```

use serde::{Deserialize, Serialize};

use crate::extras::Meta;

/// Form-wide state that strategies may consult.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaForm {
    /// No change has been made since the form was created.
    pub pristine: bool,
    pub submitted: bool,
}

impl Default for MetaForm {
    fn default() -> Self {
        Self {
            pristine: true,
            submitted: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackStrategy {
    #[default]
    Always,
    Touched,
    Blurred,
    Changed,
    ClientValidationSucceeded,
    Pristine,
    Submitted,
    And(Box<FeedbackStrategy>, Box<FeedbackStrategy>),
    Or(Box<FeedbackStrategy>, Box<FeedbackStrategy>),
    Not(Box<FeedbackStrategy>),
    /// At least one of the strategies holds. Empty never holds.
    Any(Vec<FeedbackStrategy>),
}

impl FeedbackStrategy {
    pub fn and(self, other: FeedbackStrategy) -> Self {
        FeedbackStrategy::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: FeedbackStrategy) -> Self {
        FeedbackStrategy::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        FeedbackStrategy::Not(Box::new(self))
    }

    pub fn should_show(&self, form: &MetaForm, field: &Meta) -> bool {
        match self {
            FeedbackStrategy::Always => true,
            FeedbackStrategy::Touched => field.touched,
            FeedbackStrategy::Blurred => field.blurred,
            FeedbackStrategy::Changed => field.changed,
            FeedbackStrategy::ClientValidationSucceeded => field.succeeded,
            FeedbackStrategy::Pristine => form.pristine,
            FeedbackStrategy::Submitted => form.submitted,
            FeedbackStrategy::And(a, b) => a.should_show(form, field) && b.should_show(form, field),
            FeedbackStrategy::Or(a, b) => a.should_show(form, field) || b.should_show(form, field),
            FeedbackStrategy::Not(inner) => !inner.should_show(form, field),
            FeedbackStrategy::Any(all) => all.iter().any(|s| s.should_show(form, field)),
        }
    }
}
