//! Layout boxes and hit-testing.
//!
//! The page model has no layout engine. Hosts feed element boxes through
//! [`Document::set_layout`] and hit-testing uses whatever boxes are known.

use serde::{Deserialize, Serialize};

use crate::node::{Document, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

impl Document {
    /// Topmost element under a point.
    ///
    /// Elements without a box, hidden with `display: none`, or with
    /// `pointer-events: none` are transparent. Among hits the one latest in
    /// document order wins, which stands in for paint order.
    pub fn element_from_point(&self, x: f64, y: f64) -> Option<NodeId> {
        self.all_elements()
            .into_iter()
            .filter(|id| {
                self.layout(*id)
                    .is_some_and(|rect| !rect.is_empty() && rect.contains(x, y))
            })
            .filter(|id| !self.pointer_events_disabled(*id) && !self.is_display_none(*id))
            .last()
    }
}
