//! Explicitly constructed application context.
//!
//! There are no global singletons: the workbench owns one instance of each
//! registry and collaborators receive references through it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::files::DocumentFiles;
use crate::app::perspective::{Perspective, PerspectiveRegistry};
use crate::app::plugins::{OverlayContainer, PluginRegistry};
use crate::app::prompt::ChangedPrompt;
use crate::app::tabs::TabRegistry;
use crate::domain::errors::WorkbenchError;
use crate::domain::model::{DocumentKind, EngineMeta, LifecycleEvent, TabHandle};
use crate::infra::config::Config;
use crate::infra::messages::MessageCatalog;
use crate::infra::recent::RecentFiles;

/// Id of the built-in designer perspective.
pub const DESIGNER_PERSPECTIVE: &str = "designer";

const MESSAGE_BUNDLE_DIR: &str = ".flowbench/messages";

/// Everything the workbench needs to run, wired once at startup.
#[derive(Debug)]
pub struct Workbench {
    pub config: Config,
    pub messages: MessageCatalog,
    pub files: DocumentFiles,
    pub tabs: TabRegistry,
    pub perspectives: PerspectiveRegistry,
    pub plugins: PluginRegistry,
    pub host: OverlayContainer,
}

impl Workbench {
    /// Load configuration and wire the workbench rooted at the current
    /// working directory.
    pub fn bootstrap(plugin_dir_override: Option<PathBuf>) -> Result<Self> {
        let config = Config::load()?;
        let root = std::env::current_dir().context("unable to determine working directory")?;
        Self::with_config(root, config, plugin_dir_override)
    }

    /// Wire the workbench rooted at `root` with an already-loaded config.
    pub fn with_config(
        root: PathBuf,
        config: Config,
        plugin_dir_override: Option<PathBuf>,
    ) -> Result<Self> {
        let bundle_dir = root.join(MESSAGE_BUNDLE_DIR);
        let messages = MessageCatalog::load(
            bundle_dir.exists().then_some(bundle_dir.as_path()),
            &config.general.locale,
        )?;

        let recent = RecentFiles::load(&root, config.general.recent_capacity)?;
        let files = DocumentFiles::new(recent);

        let mut host = OverlayContainer::new();
        let mut perspectives = PerspectiveRegistry::new();
        let mut designer = Perspective::new(
            DESIGNER_PERSPECTIVE,
            messages.text("perspective.designer"),
        );
        designer.assign_region(host.allocate_region());
        perspectives.register(designer)?;

        let mut plugins = PluginRegistry::new();
        let plugin_dir = plugin_dir_override
            .unwrap_or_else(|| root.join(&config.plugins.dir));
        if plugin_dir.is_dir() {
            plugins.discover_and_load(&plugin_dir, &mut perspectives, &mut host, &messages)?;
        } else {
            tracing::debug!(dir = %plugin_dir.display(), "no plugin directory");
        }

        perspectives.activate(DESIGNER_PERSPECTIVE)?;
        plugins.broadcast(LifecycleEvent::Startup);
        plugins.broadcast(LifecycleEvent::MenusRefreshed);

        Ok(Self {
            config,
            messages,
            files,
            tabs: TabRegistry::new(),
            perspectives,
            plugins,
            host,
        })
    }

    /// Open a file into a new focused tab. On load failure no tab is
    /// created.
    pub fn open_document(
        &mut self,
        path: &Path,
        import: bool,
    ) -> Result<TabHandle, WorkbenchError> {
        let document = self.files.open(path, import)?;
        Ok(self.tabs.insert(document))
    }

    /// Start an empty untitled document of the given kind.
    pub fn new_document(&mut self, kind: DocumentKind) -> TabHandle {
        let name = self.messages.text("tab.untitled");
        let document = crate::app::document::Document::new(EngineMeta::new(name, kind));
        self.tabs.insert(document)
    }

    /// Close one tab through the confirmation protocol.
    pub fn close_tab(
        &mut self,
        handle: TabHandle,
        prompt: &mut dyn ChangedPrompt,
    ) -> Result<bool, WorkbenchError> {
        self.tabs.close(handle, prompt, &mut self.files)
    }

    /// Commit and save the focused document. Returns its label, or `None`
    /// when no tab is focused.
    pub fn save_active(&mut self) -> Result<Option<String>, WorkbenchError> {
        let Some(document) = self.tabs.active_document_mut() else {
            return Ok(None);
        };
        document.apply_changes()?;
        let label = document.label();
        self.files.save(document)?;
        Ok(Some(label))
    }

    /// Walk every open tab through the close protocol; when all agree,
    /// notify plugins and tear the perspectives down. Returns false when
    /// the user cancelled the shutdown.
    pub fn request_shutdown(
        &mut self,
        prompt: &mut dyn ChangedPrompt,
    ) -> Result<bool, WorkbenchError> {
        if !self.tabs.close_all(prompt, &mut self.files)? {
            return Ok(false);
        }
        self.plugins.broadcast(LifecycleEvent::Shutdown);
        self.perspectives.deactivate();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::app::prompt::testing::ScriptedPrompt;
    use crate::domain::model::ChangeDecision;

    fn workbench(root: &Path) -> Workbench {
        Workbench::with_config(root.to_path_buf(), Config::default(), None).unwrap()
    }

    #[test]
    fn bootstrap_activates_the_designer_perspective() {
        let temp = tempfile::tempdir().unwrap();
        let bench = workbench(temp.path());
        assert_eq!(bench.perspectives.active_id(), Some(DESIGNER_PERSPECTIVE));
    }

    #[test]
    fn failed_open_creates_no_tab() {
        let temp = tempfile::tempdir().unwrap();
        let mut bench = workbench(temp.path());
        let missing = temp.path().join("absent.tfm");

        assert!(bench.open_document(&missing, false).is_err());
        assert!(bench.tabs.is_empty());
    }

    #[test]
    fn shutdown_is_cancelled_by_a_kept_tab() {
        let temp = tempfile::tempdir().unwrap();
        let mut bench = workbench(temp.path());
        let handle = bench.new_document(DocumentKind::Transformation);
        bench.tabs.lookup_mut(handle).unwrap().mark_changed();

        let mut prompt = ScriptedPrompt::new(vec![ChangeDecision::Cancel]);
        assert!(!bench.request_shutdown(&mut prompt).unwrap());
        assert_eq!(bench.tabs.len(), 1);
        // The workbench is still up, so the active perspective survives.
        assert_eq!(bench.perspectives.active_id(), Some(DESIGNER_PERSPECTIVE));
    }

    #[test]
    fn shutdown_deactivates_perspectives_when_all_tabs_close() {
        let temp = tempfile::tempdir().unwrap();
        let mut bench = workbench(temp.path());
        bench.new_document(DocumentKind::Job);

        let mut prompt = ScriptedPrompt::new(vec![]);
        assert!(bench.request_shutdown(&mut prompt).unwrap());
        assert!(bench.tabs.is_empty());
        assert_eq!(bench.perspectives.active_id(), None);
    }
}
