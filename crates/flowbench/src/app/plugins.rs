//! Plugin discovery and wiring.
//!
//! Plugins are declared by a `plugin.toml` descriptor per subdirectory.
//! Runtime behavior is attached through factories registered under the
//! plugin's declared kind; there is no code scanning. One malformed plugin
//! never aborts discovery of its siblings.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};

use crate::app::perspective::{Perspective, PerspectiveListener, PerspectiveRegistry};
use crate::domain::errors::WorkbenchError;
use crate::domain::model::{HandlerBinding, LifecycleEvent, Overlay, UiRegion};
use crate::infra::manifest::{PLUGIN_MANIFEST, PluginManifest};
use crate::infra::messages::MessageCatalog;

/// Receives application-wide lifecycle notifications in registration order.
pub trait LifecycleListener {
    fn on_event(&self, event: LifecycleEvent);
}

/// Runtime hooks a factory builds for one plugin instance.
#[derive(Default)]
pub struct PluginRuntime {
    pub lifecycle: Option<Rc<dyn LifecycleListener>>,
    pub perspective_listener: Option<Rc<dyn PerspectiveListener>>,
}

/// Builds the runtime hooks for every plugin declaring the factory's kind.
pub type PluginFactory = Box<dyn Fn(&PluginManifest) -> PluginRuntime>;

/// Successfully loaded plugin.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    pub id: String,
    pub name: String,
    pub dir: PathBuf,
    pub overlays: Vec<Overlay>,
    pub handlers: Vec<HandlerBinding>,
    /// Id of the perspective the plugin contributed, if any.
    pub perspective: Option<String>,
    pub lifecycle: bool,
}

/// Host-owned container plugins merge their UI contributions into.
/// Later registrations with the same id/name override earlier ones.
#[derive(Debug, Default)]
pub struct OverlayContainer {
    overlays: Vec<Overlay>,
    handlers: HashMap<String, HandlerBinding>,
    next_region: u16,
}

impl OverlayContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_overlay(&mut self, overlay: Overlay) {
        if let Some(existing) = self
            .overlays
            .iter_mut()
            .find(|existing| existing.id == overlay.id)
        {
            *existing = overlay;
        } else {
            self.overlays.push(overlay);
        }
    }

    pub fn merge_handler(&mut self, binding: HandlerBinding) {
        self.handlers.insert(binding.name.clone(), binding);
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn handler(&self, name: &str) -> Option<&HandlerBinding> {
        self.handlers.get(name)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Hand out a fresh UI region for a perspective to dock into.
    pub fn allocate_region(&mut self) -> UiRegion {
        let region = UiRegion(self.next_region);
        self.next_region += 1;
        region
    }
}

/// Discovers plugin descriptors and wires their contributions into the
/// perspective registry and the host container.
pub struct PluginRegistry {
    factories: HashMap<String, PluginFactory>,
    descriptors: Vec<PluginDescriptor>,
    lifecycle: Vec<Rc<dyn LifecycleListener>>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            descriptors: Vec::new(),
            lifecycle: Vec::new(),
        }
    }

    /// Register the runtime factory for a plugin kind. A later factory for
    /// the same kind overrides the earlier one.
    pub fn register_factory(&mut self, kind: impl Into<String>, factory: PluginFactory) {
        self.factories.insert(kind.into(), factory);
    }

    pub fn descriptors(&self) -> &[PluginDescriptor] {
        &self.descriptors
    }

    /// Register a listener for lifecycle events outside of plugin
    /// discovery, e.g. host-internal services.
    pub fn add_lifecycle_listener(&mut self, listener: Rc<dyn LifecycleListener>) {
        self.lifecycle.push(listener);
    }

    /// Deliver an event to every lifecycle listener in registration order.
    pub fn broadcast(&self, event: LifecycleEvent) {
        for listener in &self.lifecycle {
            listener.on_event(event);
        }
    }

    /// Walk `dir` and load every subdirectory carrying a `plugin.toml`.
    ///
    /// A malformed descriptor is logged and skipped; sibling plugins still
    /// load. Subdirectories are visited in name order so wiring is
    /// deterministic.
    pub fn discover_and_load(
        &mut self,
        dir: &Path,
        perspectives: &mut PerspectiveRegistry,
        host: &mut OverlayContainer,
        messages: &MessageCatalog,
    ) -> Result<&[PluginDescriptor]> {
        let mut plugin_dirs: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("failed to read plugin directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_dir() && path.join(PLUGIN_MANIFEST).is_file())
            .collect();
        plugin_dirs.sort();

        for plugin_dir in plugin_dirs {
            match self.load_one(&plugin_dir, perspectives, host, messages) {
                Ok(descriptor) => {
                    tracing::info!(plugin = %descriptor.id, "loaded plugin");
                    self.descriptors.push(descriptor);
                }
                Err(err) => {
                    tracing::warn!(
                        dir = %plugin_dir.display(),
                        error = %err,
                        "skipping plugin"
                    );
                }
            }
        }

        Ok(&self.descriptors)
    }

    fn load_one(
        &mut self,
        dir: &Path,
        perspectives: &mut PerspectiveRegistry,
        host: &mut OverlayContainer,
        messages: &MessageCatalog,
    ) -> Result<PluginDescriptor, WorkbenchError> {
        let plugin_name = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let manifest = PluginManifest::load(dir)
            .map_err(|err| WorkbenchError::plugin(&plugin_name, format!("{err:#}")))?;

        let runtime = match &manifest.plugin.kind {
            Some(kind) => {
                let factory = self.factories.get(kind).ok_or_else(|| {
                    WorkbenchError::plugin(
                        &manifest.plugin.id,
                        format!("unknown plugin kind '{kind}'"),
                    )
                })?;
                factory(&manifest)
            }
            None => PluginRuntime::default(),
        };

        // Register the perspective before merging anything into the host so
        // a conflicting id leaves no half-wired plugin behind.
        let perspective_id = match &manifest.perspective {
            Some(section) => {
                let mut perspective =
                    Perspective::new(&section.id, messages.text(&section.display_name));
                perspective.assign_region(host.allocate_region());
                for overlay in &manifest.overlays {
                    perspective.add_overlay(overlay.clone());
                }
                for handler in &manifest.handlers {
                    perspective.add_handler(handler.clone());
                }
                if let Some(listener) = &runtime.perspective_listener {
                    perspective.add_listener(listener.clone());
                }
                perspectives.register(perspective).map_err(|err| {
                    WorkbenchError::plugin(&manifest.plugin.id, format!("{err:#}"))
                })?;
                Some(section.id.clone())
            }
            None => None,
        };

        for overlay in &manifest.overlays {
            host.merge_overlay(overlay.clone());
        }
        for handler in &manifest.handlers {
            host.merge_handler(handler.clone());
        }

        if manifest.plugin.lifecycle {
            match runtime.lifecycle {
                Some(listener) => self.lifecycle.push(listener),
                None => {
                    tracing::warn!(
                        plugin = %manifest.plugin.id,
                        "plugin requested lifecycle events but its factory provided no listener"
                    );
                }
            }
        }

        Ok(PluginDescriptor {
            id: manifest.plugin.id.clone(),
            name: manifest.plugin.name.clone(),
            dir: dir.to_path_buf(),
            overlays: manifest.overlays.clone(),
            handlers: manifest.handlers.clone(),
            perspective: perspective_id,
            lifecycle: manifest.plugin.lifecycle,
        })
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("descriptors", &self.descriptors.len())
            .field("lifecycle", &self.lifecycle.len())
            .finish()
    }
}
