//! Keyboard movement between treemap cells.
//!
//! Cells carry no adjacency pointers and the tiler that produced them is not
//! kept, so the arrangement of siblings is inferred from their rectangles.

use indextree::NodeId;

use crate::geometry::Coord;
use crate::treemap::Treemap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    In,
    Out,
}

/// Axis along which a cell's children are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Fewer than two children, orientation is not meaningful.
    None,
    /// Left to right.
    Horizontal,
    /// Top to bottom.
    Vertical,
}

pub fn orientation<T: Coord>(tm: &Treemap<T>, id: NodeId) -> Orientation {
    let mut children = tm.children(id);
    let (Some(a), Some(b)) = (children.next(), children.next()) else {
        return Orientation::None;
    };
    let (Some(a), Some(b)) = (tm.get(a), tm.get(b)) else {
        return Orientation::None;
    };

    let diff = b.rect.x.lo.to_f64() - a.rect.x.lo.to_f64();
    if diff.abs() < 1e-9 {
        Orientation::Vertical
    } else {
        Orientation::Horizontal
    }
}

/// Returns the cell adjacent to `id` in `direction`, stepping up the tree if
/// necessary. Returns `id` itself when there is nowhere to go.
pub fn navigate<T: Coord>(tm: &Treemap<T>, id: NodeId, direction: Direction) -> NodeId {
    let destination = match direction {
        Direction::Left => step(tm, id, Orientation::Horizontal, Sibling::Prev),
        Direction::Right => step(tm, id, Orientation::Horizontal, Sibling::Next),
        Direction::Up => step(tm, id, Orientation::Vertical, Sibling::Prev),
        Direction::Down => step(tm, id, Orientation::Vertical, Sibling::Next),
        Direction::In => tm.children(id).next(),
        Direction::Out => tm.parent(id),
    };
    destination.unwrap_or(id)
}

#[derive(Debug, Clone, Copy)]
enum Sibling {
    Prev,
    Next,
}

// The orientation of `id`'s own children decides whether to look among its
// siblings or climb. This only lines up with the siblings' real arrangement
// for alternating tilers.
fn step<T: Coord>(tm: &Treemap<T>, id: NodeId, axis: Orientation, which: Sibling) -> Option<NodeId> {
    let parent = tm.parent(id)?;

    let own = orientation(tm, id);
    if own == axis {
        adjacent_sibling(tm, id, axis, which).or_else(|| step(tm, parent, axis, which))
    } else if own != Orientation::None {
        adjacent_sibling(tm, id, axis, which)
    } else if orientation(tm, parent) == axis {
        adjacent_sibling(tm, id, axis, which)
    } else {
        step(tm, parent, axis, which)
    }
}

/// Siblings only count as neighbours along the axis their parent used.
fn adjacent_sibling<T: Coord>(
    tm: &Treemap<T>,
    id: NodeId,
    axis: Orientation,
    which: Sibling,
) -> Option<NodeId> {
    let parent = tm.parent(id)?;
    if orientation(tm, parent) != axis {
        return None;
    }

    let siblings: Vec<NodeId> = tm.children(parent).collect();
    let idx = siblings.iter().position(|&s| s == id)?;
    match which {
        Sibling::Prev => idx.checked_sub(1).map(|i| siblings[i]),
        Sibling::Next => siblings.get(idx + 1).copied(),
    }
}
