use indextree::{Arena, NodeEdge, NodeId};
use std::collections::HashMap;

use crate::error::TreemapError;
use crate::geometry::{Coord, R2Rect, Rect, Z2Rect};
use crate::tiling::{corner_spillage, Tiler};
use crate::tree::{FileRecord, FileTree};

/// One laid-out file: its rectangle and the region holding children that
/// were too small to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell<T> {
    pub file: FileRecord,
    pub rect: Rect<T>,
    pub spillage: Rect<T>,
}

/// Immutable tree of rectangles mirroring a (possibly depth-capped) subtree
/// of a [`FileTree`].
///
/// A treemap is never modified after it is built. Node ids are only valid
/// for the treemap they came from; look nodes up again by path after a
/// rebuild.
#[derive(Debug, Clone)]
pub struct Treemap<T> {
    arena: Arena<Cell<T>>,
    root: NodeId,
}

pub type R2Treemap = Treemap<f64>;
pub type Z2Treemap = Treemap<i32>;

impl R2Treemap {
    /// Lay out the subtree under `root` inside `rect`.
    ///
    /// `max_depth` of 0 means unlimited. The root sits at depth 1, so a
    /// `max_depth` of 1 produces a lone root cell.
    pub fn new(
        tree: &FileTree,
        root: NodeId,
        rect: R2Rect,
        tiler: &dyn Tiler,
        max_depth: usize,
    ) -> Option<Self> {
        let mut arena = Arena::new();
        let root = build(&mut arena, None, tree, root, rect, tiler, max_depth, 1)?;
        Some(Self { arena, root })
    }

    /// Snap every rectangle onto the terminal cell grid.
    ///
    /// The result has the same shape, but fresh node ids.
    pub fn to_device(&self) -> Z2Treemap {
        self.map_rects(|rect| rect.snap_round())
    }
}

#[allow(clippy::too_many_arguments)]
fn build(
    arena: &mut Arena<Cell<f64>>,
    parent: Option<NodeId>,
    tree: &FileTree,
    file_id: NodeId,
    rect: R2Rect,
    tiler: &dyn Tiler,
    max_depth: usize,
    depth: usize,
) -> Option<NodeId> {
    let file = tree.get(file_id)?.clone();
    let id = arena.new_node(Cell {
        file,
        rect,
        spillage: corner_spillage(rect),
    });
    if let Some(parent) = parent {
        parent.append(id, arena);
    }

    if !tree.has_children(file_id) {
        return Some(id);
    }

    // depth cap hides the whole subtree
    if max_depth == 0 || depth < max_depth {
        let (tiles, spillage) = tiler.tile(rect, tree, file_id, depth);
        for tile in tiles {
            build(arena, Some(id), tree, tile.node, tile.rect, tiler, max_depth, depth + 1);
        }
        if let Some(node) = arena.get_mut(id) {
            node.get_mut().spillage = spillage;
        }
    }

    Some(id)
}

impl<T: Coord> Treemap<T> {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Cell<T>> {
        self.arena.get(id).map(|node| node.get())
    }

    pub fn path(&self, id: NodeId) -> &str {
        self.get(id).map(|cell| cell.file.path.as_str()).unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|node| node.parent())
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn find_node(&self, path: &str) -> Result<NodeId, TreemapError> {
        self.find_node_from(self.root, path)
    }

    /// Walk down from `from`, at each level entering the first child whose
    /// path is a string prefix of `path`.
    pub fn find_node_from(&self, from: NodeId, path: &str) -> Result<NodeId, TreemapError> {
        let mut current = from;
        loop {
            if self.path(current) == path {
                return Ok(current);
            }
            match self
                .children(current)
                .find(|&child| path.starts_with(self.path(child)))
            {
                Some(child) => current = child,
                None => return Err(TreemapError::NodeNotFound(path.to_string())),
            }
        }
    }

    /// All cells in pre-order, paired with their depth below the root.
    pub fn cells(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::with_capacity(self.len());
        let mut depth = 0usize;
        for edge in self.root.traverse(&self.arena) {
            match edge {
                NodeEdge::Start(id) => {
                    out.push((id, depth));
                    depth += 1;
                }
                NodeEdge::End(_) => depth = depth.saturating_sub(1),
            }
        }
        out
    }

    pub fn map_rects<U: Coord>(&self, f: impl Fn(Rect<T>) -> Rect<U>) -> Treemap<U> {
        let mut arena = Arena::with_capacity(self.len());
        let mut mapped: HashMap<NodeId, NodeId> = HashMap::with_capacity(self.len());

        for id in self.root.descendants(&self.arena) {
            let Some(cell) = self.get(id) else {
                continue;
            };
            let new_id = arena.new_node(Cell {
                file: cell.file.clone(),
                rect: f(cell.rect),
                spillage: f(cell.spillage),
            });
            if let Some(parent) = self.parent(id).and_then(|p| mapped.get(&p).copied()) {
                parent.append(new_id, &mut arena);
            }
            mapped.insert(id, new_id);
        }

        let root = mapped
            .get(&self.root)
            .copied()
            .unwrap_or_else(|| arena.new_node(Cell {
                file: FileRecord::default(),
                rect: Rect::default(),
                spillage: Rect::default(),
            }));
        Treemap { arena, root }
    }
}

impl Z2Treemap {
    pub fn rect(&self, id: NodeId) -> Z2Rect {
        self.get(id).map(|cell| cell.rect).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::tiling::{SliceAndDice, VerticalSplit};

    fn rect(w: f64, h: f64) -> R2Rect {
        R2Rect::new(0.0, 0.0, w, h)
    }

    fn two_files() -> FileTree {
        let mut tree = FileTree::new();
        tree.insert(FileRecord::dir("root")).unwrap();
        tree.insert(FileRecord::file("root/a", 1)).unwrap();
        tree.insert(FileRecord::file("root/b", 1)).unwrap();
        tree
    }

    fn deep_tree() -> FileTree {
        let mut tree = FileTree::new();
        tree.insert(FileRecord::dir("r")).unwrap();
        tree.insert(FileRecord::dir("r/a")).unwrap();
        tree.insert(FileRecord::dir("r/a/b")).unwrap();
        tree.insert(FileRecord::file("r/a/b/c", 10)).unwrap();
        tree.insert(FileRecord::file("r/z", 10)).unwrap();
        tree
    }

    #[test]
    fn test_no_children_is_leaf() {
        let mut tree = FileTree::new();
        let root = tree.insert(FileRecord::file("lonely", 5)).unwrap();

        let tm = R2Treemap::new(&tree, root, rect(40.0, 40.0), &VerticalSplit, 0).unwrap();
        assert!(tm.get(tm.root()).unwrap().rect.approx_eq(&rect(40.0, 40.0)));
        assert_eq!(tm.child_count(tm.root()), 0);
        assert_eq!(tm.len(), 1);
    }

    #[test]
    fn test_splits_correctly() {
        let tree = two_files();
        let tm = R2Treemap::new(&tree, tree.root().unwrap(), rect(40.0, 40.0), &VerticalSplit, 0).unwrap();

        let children: Vec<_> = tm.children(tm.root()).collect();
        assert_eq!(children.len(), 2);
        assert!(tm.get(children[0]).unwrap().rect.approx_eq(&R2Rect::new(0.0, 0.0, 20.0, 40.0)));
        assert!(tm.get(children[1]).unwrap().rect.approx_eq(&R2Rect::new(20.0, 0.0, 20.0, 40.0)));
        assert_eq!(tm.parent(children[0]), Some(tm.root()));
    }

    #[test]
    fn test_max_depth_one_hides_all_children() {
        let tree = deep_tree();
        let tm = R2Treemap::new(&tree, tree.root().unwrap(), rect(200.0, 200.0), &SliceAndDice, 1).unwrap();

        assert_eq!(tm.child_count(tm.root()), 0);
        assert_eq!(tm.len(), 1);
    }

    #[test]
    fn test_max_depth_truncates_lower_levels() {
        let tree = deep_tree();
        let tm = R2Treemap::new(&tree, tree.root().unwrap(), rect(200.0, 200.0), &SliceAndDice, 2).unwrap();

        assert!(tm.find_node("r/a").is_ok());
        assert!(tm.find_node("r/z").is_ok());
        assert!(tm.find_node("r/a/b").is_err());

        let unlimited = R2Treemap::new(&tree, tree.root().unwrap(), rect(200.0, 200.0), &SliceAndDice, 0).unwrap();
        assert!(unlimited.find_node("r/a/b/c").is_ok());
    }

    #[test]
    fn test_find_node() {
        let tree = deep_tree();
        let tm = R2Treemap::new(&tree, tree.root().unwrap(), rect(200.0, 200.0), &SliceAndDice, 0).unwrap();

        let inner = tm.find_node("r/a/b").unwrap();
        assert_eq!(tm.path(inner), "r/a/b");
        let leaf = tm.find_node("r/a/b/c").unwrap();
        assert_eq!(tm.parent(leaf), Some(inner));
        assert_eq!(tm.find_node("r").unwrap(), tm.root());
        assert!(matches!(
            tm.find_node("r/i_am_not_in_tree"),
            Err(TreemapError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_find_node_matches_raw_string_prefix() {
        let mut tree = FileTree::new();
        tree.insert(FileRecord::dir("r")).unwrap();
        tree.insert(FileRecord::file("r/foo", 10)).unwrap();
        tree.insert(FileRecord::file("r/foo2", 10)).unwrap();
        let tm = R2Treemap::new(&tree, tree.root().unwrap(), rect(100.0, 100.0), &VerticalSplit, 0).unwrap();

        // "r/foo" comes first and is a string prefix of "r/foo2"
        assert!(tm.find_node("r/foo2").is_err());
        assert!(tm.find_node("r/foo").is_ok());
    }

    #[test]
    fn test_selection_survives_rebuild() {
        let tree = deep_tree();
        let viewport = rect(120.0, 40.0);
        let first = R2Treemap::new(&tree, tree.root().unwrap(), viewport, &SliceAndDice, 0).unwrap();
        let selected = first.find_node("r/a/b").unwrap();

        let second = R2Treemap::new(&tree, tree.root().unwrap(), viewport, &SliceAndDice, 0).unwrap();
        let resolved = second.find_node(first.path(selected)).unwrap();
        assert_eq!(second.path(resolved), first.path(selected));
    }

    #[test]
    fn test_spillage_recorded_on_cell() {
        let mut tree = FileTree::new();
        tree.insert(FileRecord::dir("r")).unwrap();
        tree.insert(FileRecord::file("r/big", 95)).unwrap();
        tree.insert(FileRecord::file("r/tiny", 5)).unwrap();
        let tm = R2Treemap::new(&tree, tree.root().unwrap(), rect(100.0, 10.0), &VerticalSplit, 0).unwrap();

        let root = tm.get(tm.root()).unwrap();
        assert_eq!(tm.child_count(tm.root()), 1);
        assert!(root.spillage.approx_eq(&R2Rect::new(95.0, 0.0, 5.0, 10.0)));
    }

    #[test]
    fn test_cells_are_preorder_with_depth() {
        let tree = deep_tree();
        let tm = R2Treemap::new(&tree, tree.root().unwrap(), rect(200.0, 200.0), &SliceAndDice, 0).unwrap();

        let cells: Vec<(&str, usize)> = tm.cells().into_iter().map(|(id, d)| (tm.path(id), d)).collect();
        assert_eq!(
            cells,
            vec![("r", 0), ("r/a", 1), ("r/a/b", 2), ("r/a/b/c", 3), ("r/z", 1)]
        );
    }

    #[test]
    fn test_to_device_keeps_shape() {
        let tree = two_files();
        let tm = R2Treemap::new(&tree, tree.root().unwrap(), rect(41.0, 9.0), &VerticalSplit, 0).unwrap();
        let device = tm.to_device();

        assert_eq!(device.len(), tm.len());
        let second = device.find_node("root/b").unwrap();
        assert_eq!(device.rect(second), Z2Rect::from_points(Point::new(20, 0), Point::new(41, 9)));
    }
}
