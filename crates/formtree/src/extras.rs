//! Per-node payload: validation errors plus interaction metadata.

use serde::{Deserialize, Serialize};

/// Locally computed validation result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientErrors {
    /// No client validation has run for this node yet.
    #[default]
    Pending,
    Checked(Vec<String>),
}

impl ClientErrors {
    /// Pending counts as passing.
    pub fn is_passing(&self) -> bool {
        match self {
            ClientErrors::Pending => true,
            ClientErrors::Checked(errors) => errors.is_empty(),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        match self {
            ClientErrors::Pending => &[],
            ClientErrors::Checked(errors) => errors,
        }
    }
}

/// Errors supplied from outside the form (e.g. a server).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExternalErrors {
    /// No external-error pass has touched this node yet.
    #[default]
    Unchecked,
    Checked(Vec<String>),
}

impl ExternalErrors {
    /// Unchecked counts as passing.
    pub fn is_passing(&self) -> bool {
        match self {
            ExternalErrors::Unchecked => true,
            ExternalErrors::Checked(errors) => errors.is_empty(),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        match self {
            ExternalErrors::Unchecked => &[],
            ExternalErrors::Checked(errors) => errors,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Errors {
    pub client: ClientErrors,
    pub external: ExternalErrors,
}

impl Errors {
    /// Client errors (unless pending) followed by external errors (unless unchecked).
    pub fn flattened(&self) -> Vec<String> {
        self.client
            .as_slice()
            .iter()
            .chain(self.external.as_slice())
            .cloned()
            .collect()
    }
}

/// Interaction metadata of a single node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// A blur or a change happened.
    pub touched: bool,
    pub blurred: bool,
    pub changed: bool,
    /// Sticky: the node passed its client validation at least once.
    pub succeeded: bool,
    /// Reserved for an async validation layer; never set by the engine.
    pub async_validation_in_flight: bool,
}

impl Meta {
    pub const CLEAN: Meta = Meta {
        touched: false,
        blurred: false,
        changed: false,
        succeeded: false,
        async_validation_in_flight: false,
    };

    /// Meta of nodes whose history was discarded by a custom change.
    pub const CHANGED: Meta = Meta {
        touched: true,
        blurred: false,
        changed: true,
        succeeded: false,
        async_validation_in_flight: false,
    };
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extras {
    pub errors: Errors,
    pub meta: Meta,
}

impl Extras {
    pub fn clean() -> Self {
        Extras::default()
    }

    pub fn changed() -> Self {
        Extras {
            errors: Errors::default(),
            meta: Meta::CHANGED,
        }
    }

    /// Store a client validation result, keeping `succeeded` sticky.
    pub fn with_client_errors(mut self, errors: Vec<String>) -> Self {
        self.meta.succeeded |= errors.is_empty();
        self.errors.client = ClientErrors::Checked(errors);
        self
    }

    pub fn with_external_errors(mut self, errors: Vec<String>) -> Self {
        self.errors.external = ExternalErrors::Checked(errors);
        self
    }

    pub fn set_blurred(mut self) -> Self {
        self.meta.touched = true;
        self.meta.blurred = true;
        self
    }
}
