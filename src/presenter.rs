use crossbeam_channel::{never, select, Receiver, Sender};
use log::{debug, info, warn};
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use crate::cancel::{self, CancelFlag, SendError};
use crate::error::Error;
use crate::geometry::{Point, R2Rect};
use crate::state::{Action, Command, State, StateEvent};
use crate::tiling::Tiler;
use crate::tree::FileTree;
use crate::treemap::R2Treemap;
use crate::walker::FileEvent;

/// How long the last state event may wait for the renderer to pick it up.
pub const FINAL_EVENT_GRACE: Duration = Duration::from_millis(500);

/// Owns the file hierarchy and the current [`State`], and turns incoming
/// file events and commands into a stream of state events.
///
/// Every tick handles at most one inbound event, lays the treemap out from
/// scratch, and publishes the result. Publishing blocks until the renderer
/// takes it.
pub struct Presenter {
    cancel: CancelFlag,
    shutdown: Option<Box<dyn FnOnce() + Send>>,
    file_events: Option<Receiver<FileEvent>>,
    commands: Receiver<Command>,
    state_events: Option<Sender<StateEvent>>,
    tiler: Box<dyn Tiler>,
    tree: FileTree,
    state: State,
}

impl Presenter {
    pub fn new(
        cancel: CancelFlag,
        shutdown: Box<dyn FnOnce() + Send>,
        file_events: Receiver<FileEvent>,
        commands: Receiver<Command>,
        state_events: Sender<StateEvent>,
        initial: State,
        tiler: Box<dyn Tiler>,
    ) -> Self {
        Self {
            cancel,
            shutdown: Some(shutdown),
            file_events: Some(file_events),
            commands,
            state_events: Some(state_events),
            tiler,
            tree: FileTree::new(),
            state: initial,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn run(&mut self) {
        info!("Presenter started");
        while !self.state.quit {
            self.tick();
        }
        info!("Presenter stopped");
    }

    pub fn tick(&mut self) {
        let (action, errors) = self.poll();
        self.rebuild();

        if !self.state.quit {
            let event = StateEvent {
                state: self.state.clone(),
                action,
                errors,
            };
            let sent = match &self.state_events {
                Some(tx) => cancel::send(&self.cancel, tx, event),
                None => Err(SendError::Disconnected(event)),
            };
            match sent {
                Ok(()) => debug!("Sent state event"),
                Err(SendError::Cancelled(event)) => {
                    debug!("Cancelled while sending state event");
                    self.state.quit = true;
                    self.finish(event.action, event.errors);
                }
                Err(SendError::Disconnected(event)) => {
                    info!("Renderer hung up");
                    self.state_events = None;
                    self.state.quit = true;
                    self.finish(event.action, event.errors);
                }
            }
        } else {
            self.finish(action, errors);
        }
    }

    fn poll(&mut self) -> (Action, Vec<Error>) {
        let mut action = Action::None;
        let mut errors = Vec::new();

        let cancelled = self.cancel.done().clone();
        let commands = self.commands.clone();
        let files = match &self.file_events {
            Some(rx) if !self.state.pause => rx.clone(),
            _ => never(),
        };

        select! {
            recv(cancelled) -> _ => {
                debug!("Presenter cancelled");
                self.state.quit = true;
            }
            recv(commands) -> msg => match msg {
                Ok(cmd) => {
                    let (state, next) = cmd.execute(mem::take(&mut self.state));
                    self.state = state;
                    action = next;
                }
                Err(_) => {
                    debug!("Command channel closed");
                    self.commands = never();
                }
            },
            recv(files) -> msg => match msg {
                Ok(FileEvent::File(record)) => {
                    if let Err(err) = self.tree.insert(record) {
                        warn!("Rejected file event: {err}");
                        errors.push(err.into());
                    }
                }
                Ok(FileEvent::Error(err)) => {
                    warn!("Walker reported: {err}");
                    errors.push(err.into());
                }
                Err(_) => {
                    info!("File event stream closed after {} files", self.tree.len());
                    self.file_events = None;
                    self.state.is_walking_files = false;
                }
            },
        }

        (action, errors)
    }

    /// Lay the visible subtree out again and carry selection and zoom over
    /// to the new treemap by path.
    fn rebuild(&mut self) {
        let Some(tree_root) = self.tree.root() else {
            return;
        };

        let selected = self.state.selected_path().map(str::to_owned);
        let zoomed = self.state.zoom_path().map(str::to_owned);

        let layout_root = zoomed
            .as_deref()
            .and_then(|path| self.tree.find(path))
            .unwrap_or(tree_root);
        let viewport = R2Rect::from_points(Point::new(0.0, 0.0), self.state.treemap_size.to_r2());

        let Some(treemap) = R2Treemap::new(
            &self.tree,
            layout_root,
            viewport,
            &*self.tiler,
            self.state.max_depth,
        ) else {
            return;
        };

        let descendants = |id| treemap.get(id).map_or(0, |cell| cell.file.num_descendants);

        self.state.selection = None;
        self.state.total_files = descendants(treemap.root());
        if let Some(path) = selected {
            match treemap.find_node(&path) {
                Ok(id) => {
                    self.state.selection = Some(id);
                    self.state.total_files = descendants(id);
                }
                Err(err) => debug!("Dropping selection: {err}"),
            }
        }

        self.state.zoom = None;
        if let Some(path) = zoomed {
            match treemap.find_node(&path) {
                Ok(id) => self.state.zoom = Some(id),
                Err(err) => debug!("Dropping zoom: {err}"),
            }
        }

        self.state.treemap = Some(Arc::new(treemap));
    }

    /// Publish the final state, close the outbound stream and run the
    /// shutdown callback. Runs once.
    fn finish(&mut self, action: Action, errors: Vec<Error>) {
        if let Some(tx) = self.state_events.take() {
            let event = StateEvent {
                state: self.state.clone(),
                action,
                errors,
            };
            match cancel::send_within(&tx, event, FINAL_EVENT_GRACE) {
                Ok(()) => debug!("Sent final state event"),
                Err(SendError::Cancelled(_)) => debug!("Final state event timed out"),
                Err(SendError::Disconnected(_)) => debug!("Final state event not delivered, renderer gone"),
            }
        }

        if let Some(shutdown) = self.shutdown.take() {
            info!("Presenter shutting down");
            shutdown();
        }
    }
}
