//! Tiling strategies: how a rectangle is divided among weighted children.

use indextree::NodeId;

use crate::geometry::{Interval, Point, R2Rect};
use crate::tree::FileTree;

/// Tiles narrower or shorter than this are too small to be meaningfully
/// represented on their own and go to the spillage region instead.
pub const MINIMUM_WIDTH: f64 = 7.0;
pub const MINIMUM_HEIGHT: f64 = 3.0;

/// A child of the tiled node together with the area allotted to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub node: NodeId,
    pub rect: R2Rect,
}

/// Divides a rectangle into adjoining tiles, one per visible child, with
/// areas proportional to the children's sizes.
pub trait Tiler: Send + Sync {
    fn tile(&self, rect: R2Rect, tree: &FileTree, node: NodeId, depth: usize) -> (Vec<Tile>, R2Rect);
}

impl<T: Tiler + ?Sized> Tiler for Box<T> {
    fn tile(&self, rect: R2Rect, tree: &FileTree, node: NodeId, depth: usize) -> (Vec<Tile>, R2Rect) {
        (**self).tile(rect, tree, node, depth)
    }
}

/// Zero-size spillage in the far (bottom right) corner.
pub fn corner_spillage(rect: R2Rect) -> R2Rect {
    R2Rect::from_point(rect.hi())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

fn split(rect: R2Rect, tree: &FileTree, node: NodeId, axis: Axis) -> (Vec<Tile>, R2Rect) {
    let mut tiles = Vec::new();
    let mut spillage = corner_spillage(rect);

    let total_weight = tree.get(node).map(|record| record.size as f64).unwrap_or(0.0);
    let (extent, minimum) = match axis {
        Axis::X => (rect.width(), MINIMUM_WIDTH),
        Axis::Y => (rect.height(), MINIMUM_HEIGHT),
    };
    let mut next_lo = match axis {
        Axis::X => rect.x.lo,
        Axis::Y => rect.y.lo,
    };

    for child in tree.children(node) {
        let weight = tree.get(child).map(|record| record.size as f64).unwrap_or(0.0);
        let weight_factor = if total_weight > 0.0 {
            weight / total_weight
        } else {
            0.0
        };
        let delta = weight_factor * extent;

        if delta < minimum {
            // too small to show, grow spillage from the far edge
            match axis {
                Axis::X => {
                    spillage.x.lo -= delta;
                    spillage.y = rect.y;
                }
                Axis::Y => {
                    spillage.y.lo -= delta;
                    spillage.x = rect.x;
                }
            }
            continue;
        }

        let candidate = match axis {
            Axis::X => R2Rect {
                x: Interval::new(next_lo, next_lo + delta),
                y: rect.y,
            },
            Axis::Y => R2Rect {
                x: rect.x,
                y: Interval::new(next_lo, next_lo + delta),
            },
        };
        next_lo += delta;
        tiles.push(Tile {
            node: child,
            rect: candidate,
        });
    }

    (tiles, spillage)
}

/// Side-by-side columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerticalSplit;

impl Tiler for VerticalSplit {
    fn tile(&self, rect: R2Rect, tree: &FileTree, node: NodeId, _depth: usize) -> (Vec<Tile>, R2Rect) {
        split(rect, tree, node, Axis::X)
    }
}

/// Stacked rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct HorizontalSplit;

impl Tiler for HorizontalSplit {
    fn tile(&self, rect: R2Rect, tree: &FileTree, node: NodeId, _depth: usize) -> (Vec<Tile>, R2Rect) {
        split(rect, tree, node, Axis::Y)
    }
}

/// Alternates between [`HorizontalSplit`] on even depths and
/// [`VerticalSplit`] on odd depths.
#[derive(Debug, Clone, Copy, Default)]
pub struct SliceAndDice;

impl Tiler for SliceAndDice {
    fn tile(&self, rect: R2Rect, tree: &FileTree, node: NodeId, depth: usize) -> (Vec<Tile>, R2Rect) {
        if depth % 2 == 0 {
            HorizontalSplit.tile(rect, tree, node, depth)
        } else {
            VerticalSplit.tile(rect, tree, node, depth)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Insets {
    pub fn uniform(amount: f64) -> Self {
        Self {
            top: amount,
            right: amount,
            bottom: amount,
            left: amount,
        }
    }
}

/// Shrinks the rectangle before handing it to the wrapped tiler.
pub struct Padding<T> {
    tiler: T,
    insets: Insets,
}

impl<T: Tiler> Padding<T> {
    pub fn new(tiler: T, insets: Insets) -> Self {
        Self { tiler, insets }
    }

    /// Returns an empty rectangle when the insets would leave a negative
    /// extent on either axis.
    fn pad(&self, rect: R2Rect) -> R2Rect {
        let x = Interval::new(rect.x.lo + self.insets.left, rect.x.hi - self.insets.right);
        let y = Interval::new(rect.y.lo + self.insets.top, rect.y.hi - self.insets.bottom);
        if x.length() < 0.0 || y.length() < 0.0 {
            return R2Rect::from_point(Point::new(rect.x.lo, rect.y.lo));
        }
        R2Rect { x, y }
    }
}

impl<T: Tiler> Tiler for Padding<T> {
    fn tile(&self, rect: R2Rect, tree: &FileTree, node: NodeId, depth: usize) -> (Vec<Tile>, R2Rect) {
        self.tiler.tile(self.pad(rect), tree, node, depth)
    }
}

pub fn with_padding<T: Tiler>(tiler: T, insets: Insets) -> Padding<T> {
    Padding::new(tiler, insets)
}
