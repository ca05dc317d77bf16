//! Page input events and the listener registry.
//!
//! Listeners carry no callbacks. A registration records that some owner
//! (a picker or editor session) is subscribed to a kind of event, so
//! teardown can be verified: after a session stops, `count_for(owner)` must
//! be zero. Dispatch itself is done by the host that owns the sessions.

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    MouseMove,
    MouseOver,
    MouseOut,
    MouseDown,
    MouseUp,
    Click,
    ContextMenu,
    KeyDown,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::MouseMove => "mousemove",
            EventKind::MouseOver => "mouseover",
            EventKind::MouseOut => "mouseout",
            EventKind::MouseDown => "mousedown",
            EventKind::MouseUp => "mouseup",
            EventKind::Click => "click",
            EventKind::ContextMenu => "contextmenu",
            EventKind::KeyDown => "keydown",
        }
    }
}

/// One input event delivered to the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomEvent {
    pub kind: EventKind,
    /// Element the event was dispatched on, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<NodeId>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Key name for keyboard events (`"Escape"`, `"Enter"`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl DomEvent {
    pub fn pointer(kind: EventKind, target: Option<NodeId>, x: f64, y: f64) -> Self {
        Self {
            kind,
            target,
            x,
            y,
            key: None,
        }
    }

    pub fn click(target: NodeId) -> Self {
        Self::pointer(EventKind::Click, Some(target), 0.0, 0.0)
    }

    pub fn key(key: impl Into<String>) -> Self {
        Self {
            kind: EventKind::KeyDown,
            target: None,
            x: 0.0,
            y: 0.0,
            key: Some(key.into()),
        }
    }

    pub fn is_key(&self, name: &str) -> bool {
        self.kind == EventKind::KeyDown && self.key.as_deref() == Some(name)
    }
}

/// What the handling session asked the page to do with an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutcome {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl EventOutcome {
    pub fn ignored() -> Self {
        Self::default()
    }

    /// The event was fully consumed by a tool.
    pub fn consumed() -> Self {
        Self {
            prevent_default: true,
            stop_propagation: true,
        }
    }

    pub fn is_consumed(&self) -> bool {
        self.prevent_default && self.stop_propagation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    pub id: ListenerId,
    pub owner: String,
    pub kind: EventKind,
    pub capture: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<Listener>,
}

impl ListenerRegistry {
    pub fn add(&mut self, owner: &str, kind: EventKind, capture: bool) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push(Listener {
            id,
            owner: owner.to_string(),
            kind,
            capture,
        });
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    /// Drop every registration made by `owner`; returns how many were removed.
    pub fn remove_owner(&mut self, owner: &str) -> usize {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.owner != owner);
        before - self.listeners.len()
    }

    pub fn count(&self) -> usize {
        self.listeners.len()
    }

    pub fn count_for(&self, owner: &str) -> usize {
        self.listeners
            .iter()
            .filter(|listener| listener.owner == owner)
            .count()
    }

    pub fn has(&self, owner: &str, kind: EventKind) -> bool {
        self.listeners
            .iter()
            .any(|listener| listener.owner == owner && listener.kind == kind)
    }

    pub fn owners(&self) -> Vec<String> {
        let mut owners: Vec<String> = Vec::new();
        for listener in &self.listeners {
            if !owners.contains(&listener.owner) {
                owners.push(listener.owner.clone());
            }
        }
        owners
    }

    pub fn iter(&self) -> impl Iterator<Item = &Listener> {
        self.listeners.iter()
    }
}
