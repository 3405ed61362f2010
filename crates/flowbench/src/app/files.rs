//! Per-kind open/save strategies for documents.
//!
//! Serialized documents carry a single root node named after their kind;
//! a strategy only accepts files whose root node matches. Export saves
//! operate on a deep, independent copy of the model so they can never
//! mutate the live document.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::app::document::Document;
use crate::domain::errors::WorkbenchError;
use crate::domain::model::{DocumentKind, EngineMeta};
use crate::infra::recent::RecentFiles;

/// Open/save behavior that varies by document kind.
pub trait FileStrategy {
    fn kind(&self) -> DocumentKind;
    fn root_node(&self) -> &'static str;
    fn extension(&self) -> &'static str;

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(self.extension()))
    }
}

struct TransformationFile;

impl FileStrategy for TransformationFile {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Transformation
    }

    fn root_node(&self) -> &'static str {
        DocumentKind::Transformation.root_node()
    }

    fn extension(&self) -> &'static str {
        "tfm"
    }
}

struct JobFile;

impl FileStrategy for JobFile {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Job
    }

    fn root_node(&self) -> &'static str {
        DocumentKind::Job.root_node()
    }

    fn extension(&self) -> &'static str {
        "job"
    }
}

static TRANSFORMATION_FILE: TransformationFile = TransformationFile;
static JOB_FILE: JobFile = JobFile;

pub fn strategy_for_kind(kind: DocumentKind) -> &'static dyn FileStrategy {
    match kind {
        DocumentKind::Transformation => &TRANSFORMATION_FILE,
        DocumentKind::Job => &JOB_FILE,
    }
}

pub fn strategy_for_path(path: &Path) -> Option<&'static dyn FileStrategy> {
    [
        &TRANSFORMATION_FILE as &dyn FileStrategy,
        &JOB_FILE as &dyn FileStrategy,
    ]
    .into_iter()
    .find(|strategy| strategy.accepts(path))
}

/// On-disk document body nested under the kind's root node.
#[derive(Debug, Serialize, Deserialize)]
struct FileBody {
    name: String,
    #[serde(default)]
    attributes: Map<String, Value>,
}

/// Opens and saves documents, keeping the recently-used list current.
#[derive(Debug)]
pub struct DocumentFiles {
    recent: RecentFiles,
}

impl DocumentFiles {
    pub fn new(recent: RecentFiles) -> Self {
        Self { recent }
    }

    pub fn recent(&self) -> &RecentFiles {
        &self.recent
    }

    /// Open a serialized document.
    ///
    /// On any read or parse failure the open is aborted and no document is
    /// produced. Imported content stays marked as modified until it is
    /// explicitly saved; a plain open starts clean.
    pub fn open(&mut self, path: &Path, import: bool) -> Result<Document, WorkbenchError> {
        let strategy = strategy_for_path(path).ok_or_else(|| {
            WorkbenchError::load(path, format!("unrecognized file type: {}", path.display()))
        })?;

        let data = fs::read_to_string(path).map_err(|err| WorkbenchError::load(path, err))?;
        let meta = parse_document(&data, strategy).map_err(|reason| {
            WorkbenchError::load(path, reason)
        })?;

        if let Err(err) = self.recent.record(path) {
            tracing::warn!(error = %err, "could not update recently-used files");
        }

        Ok(Document::from_loaded(meta, path.to_path_buf(), import))
    }

    /// Save the live model back to the document's own file.
    pub fn save(&mut self, document: &mut Document) -> Result<(), WorkbenchError> {
        let path = document
            .file_path()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                WorkbenchError::save(
                    document.label(),
                    "document has no file path; save it from the host file dialog first",
                )
            })?;
        self.write_model(document.backing_model(), &path)?;
        document.mark_saved(path);
        Ok(())
    }

    /// Save the live model under a new path, syncing the document name to
    /// the new file stem.
    pub fn save_as(&mut self, document: &mut Document, path: PathBuf) -> Result<(), WorkbenchError> {
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            document.sync_name(stem);
        }
        self.write_model(document.backing_model(), &path)?;
        document.mark_saved(path);
        Ok(())
    }

    /// Export the document to `path` without touching the live model or its
    /// dirty flag. The export works on a deep copy.
    pub fn export(&self, document: &Document, path: &Path) -> Result<(), WorkbenchError> {
        let copy = document.backing_model().clone();
        write_serialized(&copy, path)
    }

    fn write_model(&mut self, model: &EngineMeta, path: &Path) -> Result<(), WorkbenchError> {
        write_serialized(model, path)?;
        if let Err(err) = self.recent.record(path) {
            tracing::warn!(error = %err, "could not update recently-used files");
        }
        Ok(())
    }
}

fn parse_document(data: &str, strategy: &dyn FileStrategy) -> Result<EngineMeta, String> {
    let value: Value =
        serde_json::from_str(data).map_err(|err| format!("invalid document: {err}"))?;
    let Value::Object(mut root) = value else {
        return Err("document root must be an object".into());
    };

    let Some(body) = root.remove(strategy.root_node()) else {
        let found = root.keys().next().cloned().unwrap_or_default();
        return Err(format!(
            "root node '{found}' does not match expected '{}'",
            strategy.root_node()
        ));
    };

    let body: FileBody =
        serde_json::from_value(body).map_err(|err| format!("invalid document body: {err}"))?;
    Ok(EngineMeta::with_attributes(
        body.name,
        strategy.kind(),
        body.attributes,
    ))
}

fn write_serialized(model: &EngineMeta, path: &Path) -> Result<(), WorkbenchError> {
    let strategy = strategy_for_kind(model.kind());
    let body = FileBody {
        name: model.name().to_owned(),
        attributes: model.attributes().clone(),
    };
    let document = json!({ strategy.root_node(): body });
    let data = serde_json::to_string_pretty(&document)
        .map_err(|err| WorkbenchError::save(path, err))?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| WorkbenchError::save(path, err))?;
    }
    fs::write(path, data).map_err(|err| WorkbenchError::save(path, err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn files() -> DocumentFiles {
        DocumentFiles::new(RecentFiles::ephemeral(5))
    }

    fn write_transformation(path: &Path, name: &str) {
        let body = json!({
            "transformation": {
                "name": name,
                "attributes": { "steps": [{ "type": "csv-input" }] }
            }
        });
        fs::write(path, serde_json::to_string_pretty(&body).unwrap()).unwrap();
    }

    #[test]
    fn open_produces_clean_document() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("etl1.tfm");
        write_transformation(&path, "etl1");

        let mut files = files();
        let document = files.open(&path, false).unwrap();
        assert_eq!(document.kind(), DocumentKind::Transformation);
        assert_eq!(document.backing_model().name(), "etl1");
        assert!(!document.has_unsaved_changes());
        assert_eq!(files.recent().entries()[0].path, path.display().to_string());
    }

    #[test]
    fn imported_document_counts_as_modified() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("etl1.tfm");
        write_transformation(&path, "etl1");

        let document = files().open(&path, true).unwrap();
        assert!(document.has_unsaved_changes());
    }

    #[test]
    fn root_node_mismatch_aborts_open() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("confused.tfm");
        fs::write(&path, r#"{ "job": { "name": "nightly" } }"#).unwrap();

        let result = files().open(&path, false);
        assert!(matches!(result, Err(WorkbenchError::Load { .. })));
    }

    #[test]
    fn unrecognized_extension_aborts_open() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("etl1.xyz");
        write_transformation(&path, "etl1");

        let result = files().open(&path, false);
        assert!(matches!(result, Err(WorkbenchError::Load { .. })));
    }

    #[test]
    fn save_clears_dirty_flag() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("etl1.tfm");
        write_transformation(&path, "etl1");

        let mut files = files();
        let mut document = files.open(&path, false).unwrap();
        document.mark_changed();

        files.save(&mut document).unwrap();
        assert!(!document.has_unsaved_changes());
    }

    #[test]
    fn failed_save_leaves_dirty_flag_untouched() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "a file, not a directory").unwrap();

        let meta = EngineMeta::new("etl1", DocumentKind::Transformation);
        let mut document = Document::new(meta);
        document.mark_changed();

        let mut files = files();
        // Parent of the target path is a regular file, so the write fails.
        let result = files.save_as(&mut document, blocker.join("etl1.tfm"));
        assert!(matches!(result, Err(WorkbenchError::Save { .. })));
        assert!(document.has_unsaved_changes());
    }

    #[test]
    fn save_as_syncs_document_name() {
        let temp = tempfile::tempdir().unwrap();
        let meta = EngineMeta::new("etl1", DocumentKind::Transformation);
        let mut document = Document::new(meta);
        document.mark_changed();

        let mut files = files();
        files
            .save_as(&mut document, temp.path().join("renamed.tfm"))
            .unwrap();
        assert_eq!(document.backing_model().name(), "renamed");
        assert_eq!(document.label(), "renamed.tfm");
        assert!(!document.has_unsaved_changes());
    }

    #[test]
    fn export_never_mutates_the_live_document() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("etl1.tfm");
        write_transformation(&path, "etl1");

        let mut files = files();
        let mut document = files.open(&path, false).unwrap();
        document.mark_changed();
        let before = document.backing_model().clone();

        let export_path = temp.path().join("exported.tfm");
        files.export(&document, &export_path).unwrap();

        assert!(document.has_unsaved_changes());
        assert_eq!(document.backing_model(), &before);

        // Mutating the live model after the export does not reach back into
        // the exported artifact.
        let exported_before = fs::read_to_string(&export_path).unwrap();
        document.stage_edit(crate::domain::model::Edit::new("name", json!("changed")));
        document.apply_changes().unwrap();
        let exported_after = fs::read_to_string(&export_path).unwrap();
        assert_eq!(exported_before, exported_after);
    }

    #[test]
    fn job_files_round_trip_through_their_own_root_node() {
        let temp = tempfile::tempdir().unwrap();
        let meta = EngineMeta::new("nightly", DocumentKind::Job);
        let mut document = Document::new(meta);
        document.mark_changed();

        let mut files = files();
        let path = temp.path().join("nightly.job");
        files.save_as(&mut document, path.clone()).unwrap();

        let reopened = files.open(&path, false).unwrap();
        assert_eq!(reopened.kind(), DocumentKind::Job);
        assert_eq!(reopened.backing_model().name(), "nightly");
    }
}
