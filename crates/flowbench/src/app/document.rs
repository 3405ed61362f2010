//! A single open transformation or job.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::app::files::DocumentFiles;
use crate::app::prompt::ChangedPrompt;
use crate::domain::errors::WorkbenchError;
use crate::domain::model::{ChangeDecision, DocumentKind, Edit, EngineMeta};

/// An open editable unit bound to one UI tab.
///
/// The document owns its backing model exclusively; collaborators receive a
/// reference only for the duration of a call. The dirty flag is false right
/// after a successful save or load and is only raised by explicit mutation
/// signals from the editor.
#[derive(Debug)]
pub struct Document {
    meta: EngineMeta,
    dirty: bool,
    file_path: Option<PathBuf>,
    pending: Vec<Edit>,
}

impl Document {
    /// Fresh, never-saved document.
    pub fn new(meta: EngineMeta) -> Self {
        Self {
            meta,
            dirty: false,
            file_path: None,
            pending: Vec::new(),
        }
    }

    /// Document produced by a file strategy. Imported content counts as
    /// modified until it is explicitly saved.
    pub(crate) fn from_loaded(meta: EngineMeta, path: PathBuf, imported: bool) -> Self {
        Self {
            meta,
            dirty: imported,
            file_path: Some(path),
            pending: Vec::new(),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.meta.kind()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Tab label: the file name when the document is backed by one,
    /// otherwise the model name.
    pub fn label(&self) -> String {
        self.file_path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.meta.name().to_owned())
    }

    /// Borrow the opaque engine metadata for external collaborators.
    pub fn backing_model(&self) -> &EngineMeta {
        &self.meta
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Explicit mutation signal from the editor.
    pub fn mark_changed(&mut self) {
        self.dirty = true;
    }

    /// Stage an in-UI edit for the next [`Document::apply_changes`].
    pub fn stage_edit(&mut self, edit: Edit) {
        self.pending.push(edit);
        self.dirty = true;
    }

    pub fn pending_edits(&self) -> &[Edit] {
        &self.pending
    }

    /// Commit staged edits into the backing model.
    ///
    /// On validation failure nothing is committed: the edits stay staged and
    /// the document stays dirty.
    pub fn apply_changes(&mut self) -> Result<(), WorkbenchError> {
        for edit in &self.pending {
            validate_edit(edit)?;
        }
        for edit in self.pending.drain(..) {
            if edit.field == "name" {
                // Validated above to be a non-empty string.
                if let Value::String(name) = edit.value {
                    self.meta.set_name(name);
                }
            } else {
                self.meta.set_attribute(edit.field, edit.value);
            }
        }
        Ok(())
    }

    /// Decide whether the owning tab may close.
    ///
    /// A clean document closes immediately. Otherwise the user is asked once:
    /// Save commits and persists through the document's file strategy,
    /// Discard closes without saving, Cancel keeps the tab open. Validation
    /// and save failures are returned to the caller for display; the tab
    /// stays open and the dirty flag is untouched.
    pub fn can_close(
        &mut self,
        prompt: &mut dyn ChangedPrompt,
        files: &mut DocumentFiles,
    ) -> Result<bool, WorkbenchError> {
        if !self.dirty {
            return Ok(true);
        }

        let label = self.label();
        let decision = match prompt.ask(Some(&label)) {
            Ok(decision) => decision,
            Err(WorkbenchError::PromptUnavailable) => {
                tracing::warn!(document = %label, "no prompt surface; treating close as cancelled");
                return Ok(false);
            }
            Err(other) => return Err(other),
        };

        match decision {
            ChangeDecision::Cancel => Ok(false),
            ChangeDecision::Discard => Ok(true),
            ChangeDecision::Save => {
                self.apply_changes()?;
                files.save(self)?;
                Ok(true)
            }
        }
    }

    pub(crate) fn mark_saved(&mut self, path: PathBuf) {
        self.file_path = Some(path);
        self.dirty = false;
    }

    pub(crate) fn sync_name(&mut self, name: &str) {
        self.meta.set_name(name);
    }
}

fn validate_edit(edit: &Edit) -> Result<(), WorkbenchError> {
    if edit.field.trim().is_empty() {
        return Err(WorkbenchError::Validation(
            "edit targets an empty field name".into(),
        ));
    }
    if edit.field == "name" {
        match &edit.value {
            Value::String(name) if !name.trim().is_empty() => {}
            _ => {
                return Err(WorkbenchError::Validation(
                    "document name must be a non-empty string".into(),
                ));
            }
        }
    }
    Ok(())
}
