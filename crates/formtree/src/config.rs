//! Per-form configuration, stored as RON.
//!
//! ```ron
//! (
//!     feedback_strategy: Or(Touched, Submitted),
//!     trace_dirty: true,
//! )
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::feedback::FeedbackStrategy;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// When field errors are shown.
    pub feedback_strategy: FeedbackStrategy,
    /// Report the form's dirty state to a `DirtyTracker`.
    pub trace_dirty: bool,
    /// Navigation delegates confirm even when the URL does not change.
    pub confirm_on_same_page: bool,
}

impl FormConfig {
    pub fn from_ron_str(content: &str) -> Result<Self> {
        ron::from_str(content).context("Failed to parse form config RON")
    }

    /// Load from a file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read form config {}", path.display()))?;
        Self::from_ron_str(&content)
    }

    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("Failed to serialize form config")
    }
}
