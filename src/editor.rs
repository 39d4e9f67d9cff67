// Phase 9: interactive box editor: pointer drags -> masks or erasures

use tracing::debug;

use crate::mask::{MaskKind, Rect};
use crate::session::Session;

/// Rectangles with a side shorter than this (raster px) are discarded.
pub const MIN_BOX_SIZE: f64 = 11.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    /// A finished drag adds a box mask.
    #[default]
    Mask,
    /// A finished drag deletes every mask it fully encloses.
    Erase,
}

/// The drawing surface: raster size versus its on-screen size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub raster_width: f64,
    pub raster_height: f64,
    pub display_width: f64,
    pub display_height: f64,
}

impl Surface {
    pub fn new(raster_width: f64, raster_height: f64, display_width: f64, display_height: f64) -> Self {
        Self {
            raster_width,
            raster_height,
            display_width,
            display_height,
        }
    }

    /// Display point -> raster point, clamped to the surface.
    pub fn to_raster(&self, x: f64, y: f64) -> (f64, f64) {
        let ratio = |raster: f64, display: f64| {
            if display > 0.0 { raster / display } else { 1.0 }
        };
        let x = x.clamp(0.0, self.display_width.max(0.0));
        let y = y.clamp(0.0, self.display_height.max(0.0));
        (
            x * ratio(self.raster_width, self.display_width),
            y * ratio(self.raster_height, self.display_height),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// Too small, or no drag was in progress.
    Discarded,
    Added(String),
    Erased(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Dragging {
        anchor: (f64, f64),
        current: (f64, f64),
    },
}

/// `Idle -> Dragging -> Idle`. The preview rectangle is never stored.
#[derive(Debug, Clone)]
pub struct BoxEditor {
    mode: EditMode,
    state: DragState,
}

impl Default for BoxEditor {
    fn default() -> Self {
        Self::new(EditMode::Mask)
    }
}

impl BoxEditor {
    pub fn new(mode: EditMode) -> Self {
        Self {
            mode,
            state: DragState::Idle,
        }
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        self.mode = mode;
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn drag_start(&mut self, surface: &Surface, x: f64, y: f64) {
        let anchor = surface.to_raster(x, y);
        self.state = DragState::Dragging {
            anchor,
            current: anchor,
        };
    }

    /// Update the drag; returns the preview rectangle.
    pub fn drag_move(&mut self, surface: &Surface, x: f64, y: f64) -> Option<Rect> {
        if let DragState::Dragging { current, .. } = &mut self.state {
            *current = surface.to_raster(x, y);
        }
        self.preview()
    }

    pub fn preview(&self) -> Option<Rect> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging { anchor, current } => {
                Some(Rect::from_corners(anchor.0, anchor.1, current.0, current.1))
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Finish the drag on the session's current page and close the task.
    pub fn drag_end(
        &mut self,
        surface: &Surface,
        x: f64,
        y: f64,
        session: &mut Session,
    ) -> crate::error::Result<EditOutcome> {
        self.drag_move(surface, x, y);
        let rect = self.preview();
        self.state = DragState::Idle;

        let Some(rect) = rect else {
            return Ok(EditOutcome::Discarded);
        };
        if rect.width < MIN_BOX_SIZE || rect.height < MIN_BOX_SIZE {
            debug!(width = rect.width, height = rect.height, "drag too small, discarded");
            return Ok(EditOutcome::Discarded);
        }

        let page = session.current_page();
        let outcome = match self.mode {
            EditMode::Mask => EditOutcome::Added(session.add_mask(page, rect, MaskKind::Box)?),
            EditMode::Erase => EditOutcome::Erased(session.delete_masks_in_rect(page, rect)?),
        };
        session.end_task();
        Ok(outcome)
    }
}
