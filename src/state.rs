use indextree::NodeId;
use log::{debug, warn};
use std::sync::Arc;

use crate::error::Error;
use crate::geometry::Point;
use crate::navigation::{navigate, Direction};
use crate::treemap::R2Treemap;

/// Snapshot of everything the renderer needs. Replaced wholesale on every
/// tick; `selection` and `zoom` refer to nodes of `treemap`.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub treemap: Option<Arc<R2Treemap>>,
    pub selection: Option<NodeId>,
    pub zoom: Option<NodeId>,
    pub quit: bool,
    /// 0 means unlimited.
    pub max_depth: usize,
    pub treemap_size: Point<i32>,
    pub app_size: Point<i32>,
    pub total_files: usize,
    pub is_walking_files: bool,
    pub pause: bool,
}

impl State {
    pub fn selected_path(&self) -> Option<&str> {
        let treemap = self.treemap.as_deref()?;
        self.selection.map(|id| treemap.path(id))
    }

    pub fn zoom_path(&self) -> Option<&str> {
        let treemap = self.treemap.as_deref()?;
        self.zoom.map(|id| treemap.path(id))
    }
}

/// Side effect for the renderer to perform once after applying a
/// [`StateEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    None,
    Refresh,
    Background,
    Resize,
}

#[derive(Debug)]
pub struct StateEvent {
    pub state: State,
    pub action: Action,
    pub errors: Vec<Error>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Refresh,
    SendToBackground,
    /// Forces a tick without changing anything.
    WakeUp,
    IncreaseMaxDepth,
    DecreaseMaxDepth,
    Resize {
        app_size: Point<i32>,
        treemap_size: Point<i32>,
    },
    Select(String),
    Deselect,
    Navigate(Direction),
    TogglePause,
    ZoomIn,
    ZoomOut,
}

impl Command {
    pub fn execute(self, mut state: State) -> (State, Action) {
        debug!("Executing command {self:?}");
        let mut action = Action::None;

        match self {
            Command::Quit => state.quit = true,
            Command::Refresh => action = Action::Refresh,
            Command::SendToBackground => action = Action::Background,
            Command::WakeUp => {}
            Command::IncreaseMaxDepth => state.max_depth += 1,
            Command::DecreaseMaxDepth => state.max_depth = state.max_depth.saturating_sub(1),
            Command::Resize {
                app_size,
                treemap_size,
            } => {
                debug!(
                    "Treemap area resized to ({}, {})",
                    treemap_size.x, treemap_size.y
                );
                state.app_size = app_size;
                state.treemap_size = treemap_size;
                action = Action::Resize;
            }
            Command::Select(path) => {
                let found = state
                    .treemap
                    .as_deref()
                    .map(|treemap| treemap.find_node(&path));
                match found {
                    Some(Ok(id)) => state.selection = Some(id),
                    Some(Err(err)) => warn!("Select: {err}"),
                    None => warn!("Select {path}: no treemap yet"),
                }
            }
            Command::Deselect => state.selection = None,
            Command::Navigate(direction) => {
                if let Some(treemap) = state.treemap.as_deref() {
                    state.selection = match state.selection {
                        None if direction == Direction::Out => None,
                        None => Some(treemap.root()),
                        // stepping out of the root leaves exploration
                        Some(id) if direction == Direction::Out && id == treemap.root() => None,
                        Some(id) => Some(navigate(treemap, id, direction)),
                    };
                }
            }
            Command::TogglePause => state.pause = !state.pause,
            Command::ZoomIn => state.zoom = state.selection,
            Command::ZoomOut => {
                if let Some(zoom) = state.zoom {
                    state.selection = Some(zoom);
                    state.zoom = state.treemap.as_deref().and_then(|treemap| treemap.parent(zoom));
                }
            }
        }

        (state, action)
    }
}
