//! Localized message bundles with locale fallback and interpolation.
//!
//! Lookup walks `locale` → base locale (`de-DE` → `de`) → `en`, returning
//! the key itself when no bundle provides it. Interpolation replaces
//! `{name}` tokens in a single pass; unknown tokens are left as-is.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;

static DEFAULT_MESSAGES: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/messages/en.toml"));

const DEFAULT_LOCALE: &str = "en";

type Bundle = HashMap<String, String>;

/// Locale-keyed string catalog backing every user-visible label.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    locale: String,
    bundles: HashMap<String, Bundle>,
}

impl MessageCatalog {
    /// Catalog containing only the embedded English bundle.
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self {
            locale: DEFAULT_LOCALE.to_owned(),
            bundles: HashMap::new(),
        };
        catalog
            .bundles
            .insert(DEFAULT_LOCALE.to_owned(), parse_bundle(&DEFAULT_MESSAGES)?);
        Ok(catalog)
    }

    /// Build the catalog for `locale`, merging `<locale>.toml` from the
    /// optional bundle directory over the embedded defaults.
    pub fn load(bundle_dir: Option<&Path>, locale: &str) -> Result<Self> {
        let mut catalog = Self::builtin()?;
        catalog.locale = locale.to_owned();

        if let Some(dir) = bundle_dir {
            for candidate in [base_locale(locale), Some(locale)].into_iter().flatten() {
                let path = dir.join(format!("{candidate}.toml"));
                if path.exists() {
                    let data = fs::read_to_string(&path).with_context(|| {
                        format!("failed to read message bundle {}", path.display())
                    })?;
                    catalog
                        .bundles
                        .entry(candidate.to_owned())
                        .or_default()
                        .extend(parse_bundle(&data)?);
                }
            }
        }

        Ok(catalog)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = locale.into();
    }

    /// Look up a key through the fallback chain.
    pub fn get(&self, key: &str) -> Option<&str> {
        for locale in self.fallback_chain() {
            if let Some(value) = self.bundles.get(locale).and_then(|bundle| bundle.get(key)) {
                return Some(value);
            }
        }
        None
    }

    /// Resolved text for a key, or the key itself when missing.
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(ToOwned::to_owned).unwrap_or_else(|| {
            tracing::debug!(key, "missing message key");
            key.to_owned()
        })
    }

    /// Resolve a key and substitute `{name}` tokens from `args`.
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.text(key);
        for (name, value) in args {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }

    fn fallback_chain(&self) -> impl Iterator<Item = &str> {
        let full = self.locale.as_str();
        let base = base_locale(full).filter(|base| *base != full);
        [Some(full), base, Some(DEFAULT_LOCALE)]
            .into_iter()
            .flatten()
    }
}

fn base_locale(locale: &str) -> Option<&str> {
    locale.split(['-', '_']).next().filter(|s| !s.is_empty())
}

fn parse_bundle(contents: &str) -> Result<Bundle> {
    toml::from_str(contents).context("failed to parse message bundle")
}
