//! Edge detection for the scrollable user table.
//!
//! Cursor movement is clamped to the rows that exist. Moving into the last
//! row, or trying to move past it, touches the bottom edge; trying to move
//! above the first row touches the top edge.
use super::view::Edge;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Movement {
    pub index: usize,
    pub edge: Option<Edge>,
}

/// Move `selected` by `delta` rows within a table of `len` rows.
pub fn move_selection(selected: usize, len: usize, delta: isize) -> Movement {
    if len == 0 {
        let edge = match delta {
            d if d > 0 => Some(Edge::Bottom),
            d if d < 0 => Some(Edge::Top),
            _ => None,
        };
        return Movement { index: 0, edge };
    }
    let last = len - 1;
    let current = selected.min(last);
    let index = if delta < 0 {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize).min(last)
    };
    let edge = if delta < 0 && current == 0 {
        Some(Edge::Top)
    } else if delta > 0 && index == last {
        Some(Edge::Bottom)
    } else {
        None
    };
    Movement { index, edge }
}

/// Jump straight to the first (`to_end == false`) or last row.
pub fn jump(len: usize, to_end: bool) -> Movement {
    if to_end {
        Movement {
            index: len.saturating_sub(1),
            edge: Some(Edge::Bottom),
        }
    } else {
        Movement {
            index: 0,
            edge: Some(Edge::Top),
        }
    }
}
