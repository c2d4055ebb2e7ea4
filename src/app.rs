use crossbeam_channel::{never, select, Receiver, RecvError, Sender};
use crossterm::event::{Event, MouseButton, MouseEvent, MouseEventKind};
use log::{debug, info, warn};
use ratatui::layout::Rect as UiRect;
use ratatui::Frame;
use std::collections::VecDeque;

use crate::cancel::CancelFlag;
use crate::geometry::Point;
use crate::render::{cell_at, keymap, Areas, StatusBar, TitleBar, TreemapWidget};
use crate::spinner::Spinner;
use crate::state::{Action, Command, State, StateEvent};
use crate::treemap::Z2Treemap;

/// What the terminal loop should do after one [`App::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing visible changed.
    Idle,
    /// Perform the action, then draw.
    Redraw(Action),
    Quit,
}

/// Renderer side of the pipeline. Receives state events and raw terminal
/// events, forwards commands to the presenter.
///
/// Commands are queued locally and offered to the presenter in the same
/// `select!` that listens for state events, so a presenter blocked on
/// publishing never waits on us while we wait on it.
pub struct App {
    cancel: CancelFlag,
    state_events: Receiver<StateEvent>,
    terminal_events: Receiver<Event>,
    commands: Sender<Command>,
    pending: VecDeque<Command>,
    state: State,
    device: Option<Z2Treemap>,
    spinner: Spinner,
    last_error: Option<String>,
    areas: Areas,
}

impl App {
    pub fn new(
        cancel: CancelFlag,
        state_events: Receiver<StateEvent>,
        terminal_events: Receiver<Event>,
        commands: Sender<Command>,
    ) -> Self {
        Self {
            cancel,
            state_events,
            terminal_events,
            commands,
            pending: VecDeque::new(),
            state: State::default(),
            device: None,
            spinner: Spinner::new(),
            last_error: None,
            areas: Areas::split(UiRect::default()),
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn queue(&mut self, cmd: Command) {
        self.pending.push_back(cmd);
    }

    /// Record the new terminal size and tell the presenter about it.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.areas = Areas::split(UiRect::new(0, 0, width, height));
        let treemap = self.areas.treemap;
        self.queue(Command::Resize {
            app_size: Point::new(width as i32, height as i32),
            treemap_size: Point::new(treemap.width as i32, treemap.height as i32),
        });
    }

    /// Wait for and handle one event.
    pub fn step(&mut self) -> Step {
        let cancelled = self.cancel.done().clone();
        let state_events = self.state_events.clone();
        let terminal_events = self.terminal_events.clone();

        match self.pending.front().cloned() {
            Some(cmd) => {
                let commands = self.commands.clone();
                select! {
                    recv(cancelled) -> _ => Step::Quit,
                    send(commands, cmd) -> res => {
                        if res.is_err() {
                            debug!("Presenter gone, dropping {} commands", self.pending.len());
                            self.pending.clear();
                        } else {
                            self.pending.pop_front();
                        }
                        Step::Idle
                    }
                    recv(state_events) -> msg => self.on_state_event(msg),
                    recv(terminal_events) -> msg => self.on_terminal_event(msg),
                }
            }
            None => select! {
                recv(cancelled) -> _ => Step::Quit,
                recv(state_events) -> msg => self.on_state_event(msg),
                recv(terminal_events) -> msg => self.on_terminal_event(msg),
            },
        }
    }

    fn on_state_event(&mut self, msg: Result<StateEvent, RecvError>) -> Step {
        let Ok(event) = msg else {
            info!("State event stream closed");
            return Step::Quit;
        };

        for err in &event.errors {
            warn!("{err}");
        }
        if let Some(err) = event.errors.last() {
            self.last_error = Some(err.to_string());
        }

        if event.state.quit {
            info!("Got final state event");
            return Step::Quit;
        }

        self.device = event.state.treemap.as_deref().map(|tm| tm.to_device());
        self.spinner.tick();
        self.state = event.state;
        Step::Redraw(event.action)
    }

    fn on_terminal_event(&mut self, msg: Result<Event, RecvError>) -> Step {
        let Ok(event) = msg else {
            debug!("Terminal input closed");
            self.terminal_events = never();
            return Step::Idle;
        };

        match event {
            Event::Key(key) => {
                if let Some(cmd) = keymap(key) {
                    self.queue(cmd);
                }
            }
            Event::Mouse(mouse) => self.on_mouse(mouse),
            Event::Resize(width, height) => self.resize(width, height),
            Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
        }
        Step::Idle
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }

        let (col, row) = (mouse.column, mouse.row);
        if contains(self.areas.status, col, row) {
            self.queue(Command::Deselect);
            return;
        }

        let area = self.areas.treemap;
        if !contains(area, col, row) {
            return;
        }
        let Some(device) = &self.device else {
            return;
        };
        let x = (col - area.x) as i32;
        let y = (row - area.y) as i32;
        if let Some(id) = cell_at(device, x, y) {
            let path = device.path(id).to_string();
            self.queue(Command::Select(path));
        }
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        self.areas = Areas::split(frame.area());

        frame.render_widget(TitleBar::new(&self.state, &self.spinner), self.areas.title);
        if let Some(device) = &self.device {
            frame.render_widget(
                TreemapWidget::new(device, self.state.selected_path()),
                self.areas.treemap,
            );
        }
        frame.render_widget(StatusBar::new(self.last_error.as_deref()), self.areas.status);
    }
}

fn contains(rect: UiRect, x: u16, y: u16) -> bool {
    x >= rect.x
        && x < rect.x.saturating_add(rect.width)
        && y >= rect.y
        && y < rect.y.saturating_add(rect.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, WalkError};
    use crate::geometry::R2Rect;
    use crate::tiling::VerticalSplit;
    use crate::tree::{FileRecord, FileTree};
    use crate::treemap::R2Treemap;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::path::PathBuf;
    use std::sync::Arc;

    struct Harness {
        app: App,
        state_events: Sender<StateEvent>,
        terminal_events: Sender<Event>,
        commands: Receiver<Command>,
        cancel: CancelFlag,
    }

    fn harness() -> Harness {
        let (state_tx, state_rx) = crossbeam_channel::unbounded();
        let (term_tx, term_rx) = crossbeam_channel::unbounded();
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let cancel = CancelFlag::new();
        Harness {
            app: App::new(cancel.clone(), state_rx, term_rx, cmd_tx),
            state_events: state_tx,
            terminal_events: term_tx,
            commands: cmd_rx,
            cancel,
        }
    }

    fn state(width: f64, height: f64) -> State {
        let mut tree = FileTree::new();
        tree.insert(FileRecord::dir("r")).unwrap();
        tree.insert(FileRecord::file("r/a", 30)).unwrap();
        tree.insert(FileRecord::file("r/b", 10)).unwrap();
        let treemap = R2Treemap::new(
            &tree,
            tree.root().unwrap(),
            R2Rect::new(0.0, 0.0, width, height),
            &VerticalSplit,
            0,
        )
        .unwrap();
        State {
            treemap: Some(Arc::new(treemap)),
            total_files: 2,
            ..State::default()
        }
    }

    fn event(state: State, action: Action) -> StateEvent {
        StateEvent {
            state,
            action,
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_key_press_is_forwarded() {
        let mut h = harness();
        h.terminal_events
            .send(Event::Key(KeyEvent::new(KeyCode::Char('+'), KeyModifiers::NONE)))
            .unwrap();

        assert_eq!(h.app.step(), Step::Idle);
        assert_eq!(h.app.step(), Step::Idle);
        assert_eq!(h.commands.try_recv(), Ok(Command::IncreaseMaxDepth));
    }

    #[test]
    fn test_resize_is_forwarded_with_treemap_area() {
        let mut h = harness();
        h.terminal_events.send(Event::Resize(80, 24)).unwrap();
        h.app.step();
        h.app.step();
        assert_eq!(
            h.commands.try_recv(),
            Ok(Command::Resize {
                app_size: Point::new(80, 24),
                treemap_size: Point::new(80, 22),
            })
        );
    }

    #[test]
    fn test_state_event_redraws_with_action() {
        let mut h = harness();
        h.state_events.send(event(state(40.0, 10.0), Action::Refresh)).unwrap();
        assert_eq!(h.app.step(), Step::Redraw(Action::Refresh));
        assert_eq!(h.app.state().total_files, 2);
    }

    #[test]
    fn test_quit_and_closed_stream_end_the_loop() {
        let mut h = harness();
        let quit = State {
            quit: true,
            ..State::default()
        };
        h.state_events.send(event(quit, Action::None)).unwrap();
        assert_eq!(h.app.step(), Step::Quit);

        let mut h = harness();
        drop(h.state_events);
        assert_eq!(h.app.step(), Step::Quit);
    }

    #[test]
    fn test_cancel_ends_the_loop() {
        let mut h = harness();
        h.cancel.cancel();
        assert_eq!(h.app.step(), Step::Quit);
    }

    #[test]
    fn test_click_selects_cell_and_status_bar_deselects() {
        let mut h = harness();
        h.app.resize(40, 12);
        h.app.step();
        h.commands.try_recv().unwrap();

        h.state_events.send(event(state(40.0, 10.0), Action::None)).unwrap();
        h.app.step();

        let click = |column, row| {
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                modifiers: KeyModifiers::NONE,
            })
        };
        h.terminal_events.send(click(35, 5)).unwrap();
        h.app.step();
        h.app.step();
        assert_eq!(h.commands.try_recv(), Ok(Command::Select("r/b".into())));

        h.terminal_events.send(click(3, 11)).unwrap();
        h.app.step();
        h.app.step();
        assert_eq!(h.commands.try_recv(), Ok(Command::Deselect));
    }

    #[test]
    fn test_draw_shows_title_treemap_and_error() {
        let mut h = harness();
        let mut ev = event(state(40.0, 10.0), Action::None);
        ev.errors.push(Error::Walk(WalkError::NotADirectory(PathBuf::from("x"))));
        h.state_events.send(ev).unwrap();
        h.app.step();

        let mut terminal = Terminal::new(TestBackend::new(120, 12)).unwrap();
        terminal.draw(|frame| h.app.draw(frame)).unwrap();

        let buf = terminal.backend().buffer();
        let line = |y: u16| -> String { (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect() };
        assert!(line(0).starts_with(" r 40B (2 files)"), "{}", line(0));
        assert!(line(1).starts_with("┌a 30B"), "{}", line(1));
        assert!(line(11).starts_with(" x: not a directory"), "{}", line(11));
    }
}
