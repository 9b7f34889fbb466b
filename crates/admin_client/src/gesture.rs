//! Pointer-drag reordering of list rows.
//!
//! A press only arms a drag when it lands on a row's handle, and the drag
//! starts once the pointer has moved past [`DRAG_THRESHOLD_PX`], so clicks
//! on the handle or into the text field never reorder anything. On release
//! the pointer position relative to the target row's vertical midpoint picks
//! the insertion side, and the gesture resolves to a single `from -> to` move.

/// Movement in pixels before a pressed handle becomes a drag.
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRegion {
    Handle,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBounds {
    pub top: f64,
    pub height: f64,
}

impl RowBounds {
    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropSide {
    Before,
    After,
}

impl DropSide {
    pub fn for_pointer(pointer_y: f64, target: RowBounds) -> Self {
        if pointer_y < target.midpoint() {
            DropSide::Before
        } else {
            DropSide::After
        }
    }
}

/// A reorder in list positions, both taken before the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropMove {
    pub from: usize,
    pub to: usize,
}

impl DropMove {
    /// `None` when dropping the row back where it already is.
    pub fn resolve(from: usize, target: usize, side: DropSide) -> Option<Self> {
        let insert_at = match side {
            DropSide::Before => target,
            DropSide::After => target + 1,
        };
        // Removing `from` first shifts every later slot up by one.
        let to = if insert_at > from {
            insert_at - 1
        } else {
            insert_at
        };
        (to != from).then_some(Self { from, to })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum GestureState {
    #[default]
    Idle,
    Pending {
        row: usize,
        start_x: f64,
        start_y: f64,
    },
    Dragging {
        row: usize,
    },
}

#[derive(Debug, Default)]
pub struct DragGesture {
    state: GestureState,
}

impl DragGesture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the press armed a drag.
    pub fn press(&mut self, row: usize, region: RowRegion, x: f64, y: f64) -> bool {
        if region != RowRegion::Handle {
            self.state = GestureState::Idle;
            return false;
        }
        self.state = GestureState::Pending {
            row,
            start_x: x,
            start_y: y,
        };
        true
    }

    /// Returns whether a drag is in progress after this movement.
    pub fn motion(&mut self, x: f64, y: f64) -> bool {
        if let GestureState::Pending {
            row,
            start_x,
            start_y,
        } = self.state
        {
            if (x - start_x).abs() > DRAG_THRESHOLD_PX || (y - start_y).abs() > DRAG_THRESHOLD_PX {
                self.state = GestureState::Dragging { row };
            }
        }
        self.is_dragging()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    pub fn dragging_row(&self) -> Option<usize> {
        match self.state {
            GestureState::Dragging { row } => Some(row),
            _ => None,
        }
    }

    /// Ends the gesture. `target` is the row under the pointer, if any.
    pub fn release(&mut self, target: Option<(usize, RowBounds)>, pointer_y: f64) -> Option<DropMove> {
        let state = std::mem::take(&mut self.state);
        let GestureState::Dragging { row } = state else {
            return None;
        };
        let (target_row, bounds) = target?;
        DropMove::resolve(row, target_row, DropSide::for_pointer(pointer_y, bounds))
    }
}
