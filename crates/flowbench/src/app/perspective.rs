//! Perspectives: full-screen UI modes with their own listeners, overlays,
//! and event handlers.

use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Result, bail};

use crate::domain::model::{HandlerBinding, Overlay, UiRegion};

/// Notified when its perspective flips between INACTIVE and ACTIVE.
pub trait PerspectiveListener {
    fn on_activation(&self) {}
    fn on_deactivation(&self) {}
}

/// A distinct full-screen UI mode. At most one perspective is active across
/// the whole registry at any time.
pub struct Perspective {
    id: String,
    display_name: String,
    active: bool,
    region: Option<UiRegion>,
    listeners: Vec<Rc<dyn PerspectiveListener>>,
    overlays: Vec<Overlay>,
    handlers: HashMap<String, HandlerBinding>,
}

impl Perspective {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            active: false,
            region: None,
            listeners: Vec::new(),
            overlays: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Store the host-assigned region. It is handed back unmodified from
    /// [`Perspective::ui_region`].
    pub fn assign_region(&mut self, region: UiRegion) {
        self.region = Some(region);
    }

    pub fn ui_region(&self) -> Option<UiRegion> {
        self.region
    }

    /// Register a listener. Registration is idempotent: adding the same
    /// listener object twice is a no-op.
    pub fn add_listener(&mut self, listener: Rc<dyn PerspectiveListener>) {
        let known = self
            .listeners
            .iter()
            .any(|existing| Rc::ptr_eq(existing, &listener));
        if !known {
            self.listeners.push(listener);
        }
    }

    /// Unregister a listener. Returns false when it was not registered.
    pub fn remove_listener(&mut self, listener: &Rc<dyn PerspectiveListener>) -> bool {
        let before = self.listeners.len();
        self.listeners
            .retain(|existing| !Rc::ptr_eq(existing, listener));
        self.listeners.len() != before
    }

    /// Add an overlay, replacing any earlier overlay with the same id at
    /// its position in the sequence.
    pub fn add_overlay(&mut self, overlay: Overlay) {
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

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    /// Add a named handler; a later binding with the same name wins.
    pub fn add_handler(&mut self, binding: HandlerBinding) {
        self.handlers.insert(binding.name.clone(), binding);
    }

    pub fn handler(&self, name: &str) -> Option<&HandlerBinding> {
        self.handlers.get(name)
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
        for listener in &self.listeners {
            if active {
                listener.on_activation();
            } else {
                listener.on_deactivation();
            }
        }
    }
}

impl std::fmt::Debug for Perspective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Perspective")
            .field("id", &self.id)
            .field("active", &self.active)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

/// Tracks installed perspectives and enforces the single-active invariant:
/// the outgoing perspective is fully deactivated (all listeners notified in
/// registration order) before the incoming one is activated.
#[derive(Debug, Default)]
pub struct PerspectiveRegistry {
    perspectives: Vec<Perspective>,
    active: Option<String>,
}

impl PerspectiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a perspective. Two perspectives claiming the same id is a
    /// wiring conflict and is rejected.
    pub fn register(&mut self, perspective: Perspective) -> Result<()> {
        if self.get(perspective.id()).is_some() {
            bail!("perspective '{}' is already registered", perspective.id());
        }
        self.perspectives.push(perspective);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Perspective> {
        self.perspectives.iter().find(|p| p.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Perspective> {
        self.perspectives.iter_mut().find(|p| p.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Perspective> {
        self.perspectives.iter()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&Perspective> {
        self.active.as_deref().and_then(|id| {
            self.perspectives.iter().find(|p| p.id() == id)
        })
    }

    /// Switch to the named perspective. Activating the already-active
    /// perspective is a no-op.
    pub fn activate(&mut self, id: &str) -> Result<()> {
        if self.active.as_deref() == Some(id) {
            return Ok(());
        }
        if self.get(id).is_none() {
            bail!("unknown perspective '{id}'");
        }

        if let Some(current) = self.active.take()
            && let Some(outgoing) = self.get_mut(&current)
        {
            outgoing.set_active(false);
        }

        if let Some(incoming) = self.get_mut(id) {
            incoming.set_active(true);
        }
        self.active = Some(id.to_owned());
        Ok(())
    }

    /// Switch to the next installed perspective in registration order.
    pub fn activate_next(&mut self) -> Result<()> {
        if self.perspectives.is_empty() {
            return Ok(());
        }
        let next = match self.active.as_deref() {
            Some(current) => {
                let idx = self
                    .perspectives
                    .iter()
                    .position(|p| p.id() == current)
                    .unwrap_or(0);
                let next_idx = (idx + 1) % self.perspectives.len();
                self.perspectives[next_idx].id().to_owned()
            }
            None => self.perspectives[0].id().to_owned(),
        };
        self.activate(&next)
    }

    /// Deactivate the active perspective, if any. Used at shutdown.
    pub fn deactivate(&mut self) {
        if let Some(current) = self.active.take()
            && let Some(outgoing) = self.get_mut(&current)
        {
            outgoing.set_active(false);
        }
    }
}
