//! Horizontal drag/swipe gesture tracking

/// Displacement a drag has to exceed before it changes the track
pub const DRAG_THRESHOLD: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragOutcome {
    /// Dragged right, towards the previous track
    Previous,
    /// Dragged left, towards the next track
    Next,
    Stay,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureState {
    pub is_dragging: bool,
    pub drag_start_x: f64,
    pub drag_translate_x: f64,
}

impl GestureState {
    pub fn begin(&mut self, x: f64) {
        self.is_dragging = true;
        self.drag_start_x = x;
        self.drag_translate_x = 0.0;
    }

    /// Follow the pointer. Never decides anything, that waits for `finish`.
    pub fn move_to(&mut self, x: f64) {
        if self.is_dragging {
            self.drag_translate_x = x - self.drag_start_x;
        }
    }

    /// End the drag and reset to neutral
    pub fn finish(&mut self) -> DragOutcome {
        let was_dragging = self.is_dragging;
        let displacement = self.drag_translate_x;
        *self = GestureState::default();

        if !was_dragging {
            DragOutcome::Stay
        } else if displacement > DRAG_THRESHOLD {
            DragOutcome::Previous
        } else if displacement < -DRAG_THRESHOLD {
            DragOutcome::Next
        } else {
            DragOutcome::Stay
        }
    }
}
