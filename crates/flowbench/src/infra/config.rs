//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".flowbench/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub plugins: Plugins,
    #[serde(default)]
    pub keybindings: Keybindings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct General {
    #[serde(default = "General::default_locale")]
    pub locale: String,
    #[serde(default = "General::default_recent_capacity")]
    pub recent_capacity: usize,
}

impl General {
    fn default_locale() -> String {
        "en".into()
    }

    fn default_recent_capacity() -> usize {
        10
    }
}

impl Default for General {
    fn default() -> Self {
        Self {
            locale: Self::default_locale(),
            recent_capacity: Self::default_recent_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugins {
    #[serde(default = "Plugins::default_dir")]
    pub dir: String,
}

impl Plugins {
    fn default_dir() -> String {
        ".flowbench/plugins".into()
    }
}

impl Default for Plugins {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keybindings {
    #[serde(default = "Keybindings::default_save")]
    pub save: String,
    #[serde(default = "Keybindings::default_close_tab")]
    pub close_tab: String,
    #[serde(default = "Keybindings::default_quit")]
    pub quit: String,
    #[serde(default = "Keybindings::default_next_perspective")]
    pub next_perspective: String,
}

impl Keybindings {
    fn default_save() -> String {
        "ctrl+s".into()
    }

    fn default_close_tab() -> String {
        "ctrl+w".into()
    }

    fn default_quit() -> String {
        "ctrl+q".into()
    }

    fn default_next_perspective() -> String {
        "ctrl+p".into()
    }
}

impl Default for Keybindings {
    fn default() -> Self {
        Self {
            save: Self::default_save(),
            close_tab: Self::default_close_tab(),
            quit: Self::default_quit(),
            next_perspective: Self::default_next_perspective(),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    locale: Option<String>,
    plugin_dir: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            locale: env::var("FLOWBENCH_LOCALE").ok(),
            plugin_dir: env::var("FLOWBENCH_PLUGIN_DIR").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(locale: &str, plugin_dir: &str) -> Self {
        Self {
            locale: Some(locale.to_owned()),
            plugin_dir: Some(plugin_dir.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace
    /// config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            general: merge_general(self.general, other.general),
            plugins: merge_plugins(self.plugins, other.plugins),
            keybindings: merge_keybindings(self.keybindings, other.keybindings),
        }
    }
}

fn merge_general(base: General, overlay: General) -> General {
    General {
        locale: if overlay.locale != General::default_locale() {
            overlay.locale
        } else {
            base.locale
        },
        recent_capacity: if overlay.recent_capacity != General::default_recent_capacity() {
            overlay.recent_capacity
        } else {
            base.recent_capacity
        },
    }
}

fn merge_plugins(base: Plugins, overlay: Plugins) -> Plugins {
    Plugins {
        dir: if overlay.dir != Plugins::default_dir() {
            overlay.dir
        } else {
            base.dir
        },
    }
}

fn merge_keybindings(base: Keybindings, overlay: Keybindings) -> Keybindings {
    Keybindings {
        save: choose_keybinding(base.save, overlay.save, Keybindings::default_save),
        close_tab: choose_keybinding(
            base.close_tab,
            overlay.close_tab,
            Keybindings::default_close_tab,
        ),
        quit: choose_keybinding(base.quit, overlay.quit, Keybindings::default_quit),
        next_perspective: choose_keybinding(
            base.next_perspective,
            overlay.next_perspective,
            Keybindings::default_next_perspective,
        ),
    }
}

fn choose_keybinding(base: String, overlay: String, default_fn: fn() -> String) -> String {
    if overlay != default_fn() { overlay } else { base }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("flowbench/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    Ok(Some(cwd.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(locale) = env.locale {
        config.general.locale = locale;
    }
    if let Some(dir) = env.plugin_dir {
        config.plugins.dir = dir;
    }
    config
}
