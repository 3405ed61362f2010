//! End-to-end lifecycle coverage: open, edit, close, shutdown.

use std::fs;
use std::path::Path;

use serde_json::json;

use flowbench::app::context::{DESIGNER_PERSPECTIVE, Workbench};
use flowbench::app::prompt::ChangedPrompt;
use flowbench::domain::errors::WorkbenchError;
use flowbench::domain::model::{ChangeDecision, DocumentKind, Edit};
use flowbench::infra::config::Config;

/// Replays a fixed list of decisions, then reports the prompt as gone.
struct ScriptedPrompt {
    decisions: Vec<ChangeDecision>,
    asked: usize,
}

impl ScriptedPrompt {
    fn new(decisions: Vec<ChangeDecision>) -> Self {
        Self { decisions, asked: 0 }
    }
}

impl ChangedPrompt for ScriptedPrompt {
    fn ask(&mut self, _label: Option<&str>) -> Result<ChangeDecision, WorkbenchError> {
        let decision = self
            .decisions
            .get(self.asked)
            .copied()
            .ok_or(WorkbenchError::PromptUnavailable);
        self.asked += 1;
        decision
    }
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

fn workbench(root: &Path) -> Workbench {
    Workbench::with_config(root.to_path_buf(), Config::default(), None).unwrap()
}

#[test]
fn edited_document_survives_cancel_and_closes_on_save() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("etl1.tfm");
    write_transformation(&path, "etl1");

    let mut bench = workbench(temp.path());
    let handle = bench.open_document(&path, false).unwrap();
    assert!(!bench.tabs.lookup(handle).unwrap().has_unsaved_changes());

    let document = bench.tabs.lookup_mut(handle).unwrap();
    document.stage_edit(Edit::new("description", json!("loads the staging table")));
    assert!(document.has_unsaved_changes());

    // First close attempt: the user backs out, nothing is lost.
    let mut prompt = ScriptedPrompt::new(vec![ChangeDecision::Cancel]);
    assert!(!bench.close_tab(handle, &mut prompt).unwrap());
    assert!(bench.tabs.lookup(handle).is_some());
    assert_eq!(bench.tabs.lookup(handle).unwrap().pending_edits().len(), 1);

    // Second attempt: save-and-close commits the edit and persists it.
    let mut prompt = ScriptedPrompt::new(vec![ChangeDecision::Save]);
    assert!(bench.close_tab(handle, &mut prompt).unwrap());
    assert!(bench.tabs.is_empty());

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("loads the staging table"));
}

#[test]
fn shutdown_walks_every_tab_and_tears_down_perspectives() {
    let temp = tempfile::tempdir().unwrap();
    let first = temp.path().join("etl1.tfm");
    let second = temp.path().join("etl2.tfm");
    write_transformation(&first, "etl1");
    write_transformation(&second, "etl2");

    let mut bench = workbench(temp.path());
    let a = bench.open_document(&first, false).unwrap();
    let b = bench.open_document(&second, false).unwrap();
    bench.tabs.lookup_mut(a).unwrap().mark_changed();
    bench.tabs.lookup_mut(b).unwrap().mark_changed();
    assert_eq!(bench.perspectives.active_id(), Some(DESIGNER_PERSPECTIVE));

    // One decision per dirty tab.
    let mut prompt = ScriptedPrompt::new(vec![ChangeDecision::Discard, ChangeDecision::Save]);
    assert!(bench.request_shutdown(&mut prompt).unwrap());
    assert_eq!(prompt.asked, 2);
    assert!(bench.tabs.is_empty());
    assert_eq!(bench.perspectives.active_id(), None);
}

#[test]
fn shutdown_without_a_prompt_surface_keeps_dirty_tabs() {
    let temp = tempfile::tempdir().unwrap();
    let mut bench = workbench(temp.path());
    let handle = bench.new_document(DocumentKind::Transformation);
    bench.tabs.lookup_mut(handle).unwrap().mark_changed();

    // Empty script: the first ask already reports the prompt as gone.
    let mut prompt = ScriptedPrompt::new(vec![]);
    assert!(!bench.request_shutdown(&mut prompt).unwrap());
    assert_eq!(bench.tabs.len(), 1);
    assert_eq!(bench.perspectives.active_id(), Some(DESIGNER_PERSPECTIVE));
}

#[test]
fn opened_files_land_in_the_recently_used_list() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("etl1.tfm");
    write_transformation(&path, "etl1");

    let mut bench = workbench(temp.path());
    bench.open_document(&path, false).unwrap();

    let entries = bench.files.recent().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, path.display().to_string());
}
