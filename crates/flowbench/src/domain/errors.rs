//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

type Cause = Box<dyn std::error::Error + Send + Sync>;

/// Failures produced by the document and plugin lifecycle.
///
/// Errors scoped to a single document or plugin never propagate to their
/// siblings; callers report them and keep going.
#[derive(Debug, Error)]
pub enum WorkbenchError {
    /// The serialized document could not be read or parsed. The open
    /// operation is aborted and no tab is created.
    #[error("failed to load document from {path}")]
    Load {
        path: PathBuf,
        #[source]
        source: Cause,
    },

    /// The document could not be written. The document stays open and keeps
    /// its dirty flag.
    #[error("failed to save document to {path}")]
    Save {
        path: PathBuf,
        #[source]
        source: Cause,
    },

    /// No surface was available to confirm unsaved changes. Callers must
    /// treat this as a cancelled close, never as permission to discard.
    #[error("no surface available to confirm unsaved changes")]
    PromptUnavailable,

    /// A plugin descriptor was malformed or referenced an unknown runtime
    /// kind. Discovery of sibling plugins continues.
    #[error("failed to load plugin '{plugin}': {reason}")]
    PluginLoad { plugin: String, reason: String },

    /// Pending edits were rejected while committing them into the backing
    /// model. The document stays dirty and the edits stay staged.
    #[error("pending edits rejected: {0}")]
    Validation(String),
}

impl WorkbenchError {
    pub fn load(path: impl Into<PathBuf>, source: impl Into<Cause>) -> Self {
        Self::Load {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn save(path: impl Into<PathBuf>, source: impl Into<Cause>) -> Self {
        Self::Save {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn plugin(plugin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PluginLoad {
            plugin: plugin.into(),
            reason: reason.into(),
        }
    }
}
