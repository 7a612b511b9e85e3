//! Scroll anchoring.
//!
//! Tracks whether the reader is following the newest messages.  While
//! anchored, every timeline change scrolls to the new bottom; once the
//! reader scrolls up past the threshold the viewport is left alone and a
//! jump-to-bottom affordance is shown instead.

use roomline_shared::constants::DEFAULT_NEAR_BOTTOM_THRESHOLD;

/// Geometry of the message list viewport, in the renderer's distance units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Distance scrolled from the top.
    pub offset: f64,
    /// Visible height.
    pub viewport_height: f64,
    /// Total height of the content.
    pub content_height: f64,
}

impl Viewport {
    pub fn distance_from_bottom(&self) -> f64 {
        (self.content_height - self.viewport_height - self.offset).max(0.0)
    }
}

/// What the renderer should do with the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollCommand {
    ScrollToBottom,
    Hold,
}

#[derive(Debug, Clone)]
pub struct ScrollAnchor {
    threshold: f64,
    anchored: bool,
    show_jump: bool,
}

impl ScrollAnchor {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            anchored: true,
            show_jump: false,
        }
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn shows_jump_affordance(&self) -> bool {
        self.show_jump
    }

    /// Record a scroll event. Returns the new anchored state.
    pub fn on_scroll(&mut self, viewport: Viewport) -> bool {
        self.anchored = viewport.distance_from_bottom() < self.threshold;
        self.show_jump = !self.anchored;
        self.anchored
    }

    /// React to a change of the merged timeline.
    pub fn on_timeline_changed(&mut self) -> ScrollCommand {
        if self.anchored {
            ScrollCommand::ScrollToBottom
        } else {
            self.show_jump = true;
            ScrollCommand::Hold
        }
    }

    /// Explicit "scroll to bottom": always scrolls and re-anchors.
    pub fn jump_to_bottom(&mut self) -> ScrollCommand {
        self.anchored = true;
        self.show_jump = false;
        ScrollCommand::ScrollToBottom
    }

    pub fn reset(&mut self) {
        self.anchored = true;
        self.show_jump = false;
    }
}

impl Default for ScrollAnchor {
    fn default() -> Self {
        Self::new(DEFAULT_NEAR_BOTTOM_THRESHOLD)
    }
}
