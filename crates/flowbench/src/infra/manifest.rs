//! Plugin descriptor files.
//!
//! Each plugin directory carries one `plugin.toml` declaring its overlays,
//! event handlers, optional perspective, and optional lifecycle interest.
//! There is no code scanning; runtime behavior is attached by a factory
//! keyed on the declared `kind`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::domain::model::{HandlerBinding, Overlay};

/// Fixed descriptor filename looked up in every plugin subdirectory.
pub const PLUGIN_MANIFEST: &str = "plugin.toml";

/// Parsed plugin descriptor file.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginManifest {
    pub plugin: PluginSection,
    #[serde(default, rename = "overlay")]
    pub overlays: Vec<Overlay>,
    #[serde(default, rename = "handler")]
    pub handlers: Vec<HandlerBinding>,
    pub perspective: Option<PerspectiveSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PluginSection {
    pub id: String,
    pub name: String,
    /// Selects a registered runtime factory. Purely declarative plugins
    /// leave it unset.
    pub kind: Option<String>,
    /// Whether the plugin wants STARTUP/SHUTDOWN/REPOSITORY_*/MENUS_REFRESHED
    /// notifications. Requires `kind`.
    #[serde(default)]
    pub lifecycle: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerspectiveSection {
    pub id: String,
    /// Message-catalog key resolved for display.
    #[serde(rename = "display-name")]
    pub display_name: String,
}

impl PluginManifest {
    /// Load and validate the descriptor in `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(PLUGIN_MANIFEST);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed to read plugin descriptor {}", path.display()))?;
        let manifest: PluginManifest = toml::from_str(&data)
            .with_context(|| format!("malformed plugin descriptor {}", path.display()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        if self.plugin.id.trim().is_empty() {
            bail!("plugin id must not be empty");
        }
        if self.plugin.lifecycle && self.plugin.kind.is_none() {
            bail!("plugin '{}' requests lifecycle events but declares no kind", self.plugin.id);
        }
        if let Some(perspective) = &self.perspective
            && perspective.id.trim().is_empty()
        {
            bail!("plugin '{}' declares a perspective without an id", self.plugin.id);
        }
        Ok(())
    }
}
