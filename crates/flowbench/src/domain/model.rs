//! Domain models for documents, perspectives, and plugin contributions.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The two editable document kinds the workbench knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Transformation,
    Job,
}

impl DocumentKind {
    /// Stable identifier used in manifests and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Transformation => "transformation",
            DocumentKind::Job => "job",
        }
    }

    /// Root node name expected at the top of a serialized document.
    pub fn root_node(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the changed-warning prompt. Produced and consumed
/// synchronously within a single close operation, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDecision {
    Save,
    Discard,
    Cancel,
}

/// Application-wide notifications delivered to plugin lifecycle listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Startup,
    Shutdown,
    RepositoryConnected,
    RepositoryChanged,
    RepositoryDisconnected,
    MenusRefreshed,
}

/// Opaque handle binding a UI tab to its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabHandle(pub u64);

/// Handle to a host-owned UI region. The workbench hands these out and
/// perspectives return them unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiRegion(pub u16);

/// Engine metadata backing an open document.
///
/// The workbench treats the attribute map as opaque engine state; it only
/// tracks the document name and never interprets the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineMeta {
    name: String,
    kind: DocumentKind,
    attributes: Map<String, Value>,
}

impl EngineMeta {
    pub fn new(name: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            attributes: Map::new(),
        }
    }

    pub fn with_attributes(
        name: impl Into<String>,
        kind: DocumentKind,
        attributes: Map<String, Value>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            attributes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), value);
    }
}

/// A single staged editor mutation waiting to be committed into the
/// backing model.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub field: String,
    pub value: Value,
}

impl Edit {
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

/// A declarative UI modification merged into the host's UI tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    pub id: String,
    pub source: String,
}

/// Named event handler contributed by a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerBinding {
    pub name: String,
    pub entry: String,
}
