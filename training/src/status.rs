//! Model lifecycle status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a model is in its training lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Registered, no training data uploaded yet.
    #[default]
    Created,
    /// The service is checking the uploaded dataset.
    Validating,
    /// Dataset accepted; waiting for training to be started.
    Validated,
    /// The service is training the model.
    Training,
    /// Training finished; the model can serve requests.
    ReadyToUse,
    Errored,
    Deleted,
}

impl Status {
    /// Whether the service is working on this model and its progress has to
    /// be polled. Such models are listed in the pending store.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Validating | Self::Training)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Validating => "VALIDATING",
            Self::Validated => "VALIDATED",
            Self::Training => "TRAINING",
            Self::ReadyToUse => "READY_TO_USE",
            Self::Errored => "ERRORED",
            Self::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
