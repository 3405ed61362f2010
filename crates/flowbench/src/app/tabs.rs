//! Mapping of UI tab handles to open documents.

use anyhow::{Result, bail};

use crate::app::document::Document;
use crate::app::files::DocumentFiles;
use crate::app::prompt::ChangedPrompt;
use crate::domain::errors::WorkbenchError;
use crate::domain::model::TabHandle;

/// One open tab bound to its document.
#[derive(Debug)]
pub struct TabEntry {
    handle: TabHandle,
    document: Document,
}

impl TabEntry {
    pub fn handle(&self) -> TabHandle {
        self.handle
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// Owns the open documents and enforces the close-confirmation protocol:
/// at most one changed-warning prompt per close invocation, and closing an
/// absent handle is a successful no-op.
#[derive(Debug, Default)]
pub struct TabRegistry {
    entries: Vec<TabEntry>,
    active: Option<TabHandle>,
    next_handle: u64,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document under a freshly allocated handle and focus it.
    pub fn insert(&mut self, document: Document) -> TabHandle {
        let handle = TabHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(TabEntry { handle, document });
        self.active = Some(handle);
        handle
    }

    /// Bind a document to a host-supplied handle. Handle uniqueness is
    /// enforced; rebinding an open handle is an error.
    pub fn register(&mut self, handle: TabHandle, document: Document) -> Result<()> {
        if self.position(handle).is_some() {
            bail!("tab handle {:?} is already registered", handle);
        }
        self.next_handle = self.next_handle.max(handle.0 + 1);
        self.entries.push(TabEntry { handle, document });
        Ok(())
    }

    pub fn lookup(&self, handle: TabHandle) -> Option<&Document> {
        self.position(handle)
            .map(|idx| &self.entries[idx].document)
    }

    pub fn lookup_mut(&mut self, handle: TabHandle) -> Option<&mut Document> {
        self.position(handle)
            .map(|idx| &mut self.entries[idx].document)
    }

    /// Document bound to the currently focused tab.
    pub fn active_document(&self) -> Option<&Document> {
        self.active.and_then(|handle| self.lookup(handle))
    }

    pub fn active_document_mut(&mut self) -> Option<&mut Document> {
        self.active.and_then(|handle| self.lookup_mut(handle))
    }

    pub fn active_handle(&self) -> Option<TabHandle> {
        self.active
    }

    /// Focus a tab. Returns false when the handle is unknown.
    pub fn focus(&mut self, handle: TabHandle) -> bool {
        if self.position(handle).is_some() {
            self.active = Some(handle);
            true
        } else {
            false
        }
    }

    /// Focus the neighboring tab, wrapping around the strip.
    pub fn focus_next(&mut self) {
        let Some(active) = self.active else {
            self.active = self.entries.first().map(TabEntry::handle);
            return;
        };
        if let Some(idx) = self.position(active) {
            let next = (idx + 1) % self.entries.len();
            self.active = Some(self.entries[next].handle);
        }
    }

    pub fn entries(&self) -> &[TabEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Close a tab, asking the document whether it may go away.
    ///
    /// Returns `Ok(true)` when the entry was removed (or was already
    /// absent), `Ok(false)` when the user kept the tab open, and `Err` when
    /// saving failed; the entry is retained in both non-closed cases.
    pub fn close(
        &mut self,
        handle: TabHandle,
        prompt: &mut dyn ChangedPrompt,
        files: &mut DocumentFiles,
    ) -> Result<bool, WorkbenchError> {
        let Some(idx) = self.position(handle) else {
            return Ok(true);
        };

        if !self.entries[idx].document.can_close(prompt, files)? {
            return Ok(false);
        }

        self.entries.remove(idx);
        if self.active == Some(handle) {
            let fallback = idx.min(self.entries.len().saturating_sub(1));
            self.active = self.entries.get(fallback).map(TabEntry::handle);
        }
        Ok(true)
    }

    /// Close every tab, stopping at the first one the user keeps open.
    /// Returns `Ok(true)` only when all tabs were closed.
    pub fn close_all(
        &mut self,
        prompt: &mut dyn ChangedPrompt,
        files: &mut DocumentFiles,
    ) -> Result<bool, WorkbenchError> {
        let handles: Vec<TabHandle> = self.entries.iter().map(TabEntry::handle).collect();
        for handle in handles {
            if !self.close(handle, prompt, files)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn position(&self, handle: TabHandle) -> Option<usize> {
        self.entries.iter().position(|entry| entry.handle == handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::app::prompt::testing::ScriptedPrompt;
    use crate::domain::model::{ChangeDecision, DocumentKind, EngineMeta};
    use crate::infra::recent::RecentFiles;

    fn files() -> DocumentFiles {
        DocumentFiles::new(RecentFiles::ephemeral(5))
    }

    fn document(name: &str) -> Document {
        Document::new(EngineMeta::new(name, DocumentKind::Transformation))
    }

    #[test]
    fn register_rejects_duplicate_handles() {
        let mut tabs = TabRegistry::new();
        tabs.register(TabHandle(7), document("a")).unwrap();
        assert!(tabs.register(TabHandle(7), document("b")).is_err());
        assert_eq!(tabs.len(), 1);
    }

    #[test]
    fn close_is_idempotent_and_prompts_at_most_once() {
        let mut tabs = TabRegistry::new();
        let handle = tabs.insert(document("a"));
        tabs.active_document_mut().unwrap().mark_changed();

        let mut prompt = ScriptedPrompt::new(vec![ChangeDecision::Discard]);
        let mut files = files();

        assert!(tabs.close(handle, &mut prompt, &mut files).unwrap());
        assert_eq!(prompt.asked, 1);

        // Second close of the now-absent handle: success, no prompt.
        assert!(tabs.close(handle, &mut prompt, &mut files).unwrap());
        assert_eq!(prompt.asked, 1);
    }

    #[test]
    fn cancelled_close_keeps_the_entry() {
        let mut tabs = TabRegistry::new();
        let handle = tabs.insert(document("a"));
        tabs.active_document_mut().unwrap().mark_changed();

        let mut prompt = ScriptedPrompt::new(vec![ChangeDecision::Cancel]);
        assert!(!tabs.close(handle, &mut prompt, &mut files()).unwrap());
        assert!(tabs.lookup(handle).is_some());
        assert_eq!(tabs.active_handle(), Some(handle));
    }

    #[test]
    fn closing_the_active_tab_moves_focus_to_a_neighbor() {
        let mut tabs = TabRegistry::new();
        let first = tabs.insert(document("a"));
        let second = tabs.insert(document("b"));
        tabs.focus(first);

        let mut prompt = ScriptedPrompt::new(vec![]);
        assert!(tabs.close(first, &mut prompt, &mut files()).unwrap());
        assert_eq!(tabs.active_handle(), Some(second));
    }

    #[test]
    fn close_all_stops_on_cancel() {
        let mut tabs = TabRegistry::new();
        let first = tabs.insert(document("a"));
        let second = tabs.insert(document("b"));
        tabs.lookup_mut(second).unwrap().mark_changed();

        let mut prompt = ScriptedPrompt::new(vec![ChangeDecision::Cancel]);
        assert!(!tabs.close_all(&mut prompt, &mut files()).unwrap());
        // The clean first tab is gone, the dirty second one survived.
        assert!(tabs.lookup(first).is_none());
        assert!(tabs.lookup(second).is_some());
    }

    #[test]
    fn focus_next_wraps_around() {
        let mut tabs = TabRegistry::new();
        let first = tabs.insert(document("a"));
        let second = tabs.insert(document("b"));

        assert_eq!(tabs.active_handle(), Some(second));
        tabs.focus_next();
        assert_eq!(tabs.active_handle(), Some(first));
        tabs.focus_next();
        assert_eq!(tabs.active_handle(), Some(second));
    }
}
