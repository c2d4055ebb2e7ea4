//! Terminal widgets and input decoding.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use indextree::NodeId;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect as UiRect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Widget;

use crate::geometry::Z2Rect;
use crate::humanize::humanize_iec;
use crate::navigation::Direction;
use crate::spinner::Spinner;
use crate::state::{Command, State};
use crate::treemap::{Cell, Z2Treemap};

const BACKGROUND: Color = Color::Rgb(18, 18, 20);
const BORDER: Color = Color::Rgb(224, 224, 224);
const BORDER_SELECTED: Color = Color::Rgb(246, 211, 101);
const SPILLAGE: Color = Color::Rgb(80, 80, 84);

const HELP: &str =
    "<←↓↑→/hjkl> navigate | <enter/bs> down/up | <io> zoom | <+-> depth | <space> pause | <q> quit ";

/// Screen regions: title bar, treemap, status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Areas {
    pub title: UiRect,
    pub treemap: UiRect,
    pub status: UiRect,
}

impl Areas {
    pub fn split(area: UiRect) -> Self {
        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);
        Self {
            title: rows[0],
            treemap: rows[1],
            status: rows[2],
        }
    }
}

/// Map a key press to the command it triggers.
pub fn keymap(key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Command::Quit),
            KeyCode::Char('l') => Some(Command::Refresh),
            KeyCode::Char('z') => Some(Command::SendToBackground),
            _ => None,
        };
    }

    let cmd = match key.code {
        KeyCode::Char('h') | KeyCode::Left => Command::Navigate(Direction::Left),
        KeyCode::Char('j') | KeyCode::Down => Command::Navigate(Direction::Down),
        KeyCode::Char('k') | KeyCode::Up => Command::Navigate(Direction::Up),
        KeyCode::Char('l') | KeyCode::Right => Command::Navigate(Direction::Right),
        KeyCode::Enter => Command::Navigate(Direction::In),
        KeyCode::Backspace => Command::Navigate(Direction::Out),
        KeyCode::Char('+') => Command::IncreaseMaxDepth,
        KeyCode::Char('-') => Command::DecreaseMaxDepth,
        KeyCode::Char('i') => Command::ZoomIn,
        KeyCode::Char('o') => Command::ZoomOut,
        KeyCode::Char(' ') => Command::TogglePause,
        KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}

/// Deepest cell containing the point, in treemap-local cell coordinates.
pub fn cell_at(tm: &Z2Treemap, x: i32, y: i32) -> Option<NodeId> {
    let mut current = tm.root();
    if !tm.rect(current).contains_point(x, y) {
        return None;
    }
    while let Some(child) = tm
        .children(current)
        .find(|&child| tm.rect(child).contains_point(x, y))
    {
        current = child;
    }
    Some(current)
}

/// Name part and size part of a cell's label. The size is dropped when it
/// does not fit in `width` next to the name.
pub fn label(cell: &Cell<i32>, is_root: bool, is_selected: bool, width: usize) -> (String, Option<String>) {
    let mut name = if is_root {
        cell.file.path.clone()
    } else {
        cell.file.name().to_string()
    };
    if cell.file.is_dir && !name.ends_with('/') {
        name.push('/');
    }
    if is_selected {
        name.insert_str(0, "* ");
    }

    let size = format!(" {}", humanize_iec(cell.file.size));
    let name_width = name.chars().count();
    if name_width > width {
        return (name.chars().take(width).collect(), None);
    }
    if name_width + size.chars().count() > width {
        return (name, None);
    }
    (name, Some(size))
}

fn cell_color(cell: &Cell<i32>, total: i64) -> Color {
    let ratio = if total <= 0 {
        0.0
    } else {
        (cell.file.size as f32 / total as f32).clamp(0.0, 1.0)
    };

    if cell.file.is_dir {
        Color::Rgb(
            (35.0 + ratio * 65.0) as u8,
            (95.0 + ratio * 95.0) as u8,
            (145.0 + ratio * 85.0) as u8,
        )
    } else {
        Color::Rgb(
            (55.0 + ratio * 120.0) as u8,
            (85.0 + ratio * 95.0) as u8,
            (95.0 + ratio * 70.0) as u8,
        )
    }
}

/// Clip a device rectangle to `area`, returning inclusive corners.
fn clip(rect: Z2Rect, area: UiRect) -> Option<(u16, u16, u16, u16)> {
    if !rect.has_area() || area.width == 0 || area.height == 0 {
        return None;
    }
    let left = area.x as i32;
    let top = area.y as i32;
    let right = left + area.width as i32 - 1;
    let bottom = top + area.height as i32 - 1;

    let x0 = (left + rect.x.lo).max(left);
    let y0 = (top + rect.y.lo).max(top);
    let x1 = (left + rect.x.hi - 1).min(right);
    let y1 = (top + rect.y.hi - 1).min(bottom);
    if x1 < x0 || y1 < y0 {
        return None;
    }
    Some((x0 as u16, y0 as u16, x1 as u16, y1 as u16))
}

pub struct TreemapWidget<'a> {
    treemap: &'a Z2Treemap,
    selection: Option<&'a str>,
}

impl<'a> TreemapWidget<'a> {
    pub fn new(treemap: &'a Z2Treemap, selection: Option<&'a str>) -> Self {
        Self { treemap, selection }
    }

    fn draw_box(&self, corners: (u16, u16, u16, u16), style: Style, buf: &mut Buffer) {
        let (x0, y0, x1, y1) = corners;
        for y in y0..=y1 {
            for x in x0..=x1 {
                buf[(x, y)].set_char(' ').set_style(style);
            }
        }

        for x in x0..=x1 {
            buf[(x, y0)].set_char('─').set_style(style);
            buf[(x, y1)].set_char('─').set_style(style);
        }
        for y in y0..=y1 {
            buf[(x0, y)].set_char('│').set_style(style);
            buf[(x1, y)].set_char('│').set_style(style);
        }
        buf[(x1, y1)].set_char('┘').set_style(style);
        buf[(x0, y1)].set_char('└').set_style(style);
        buf[(x0, y0)].set_char('┌').set_style(style);
        buf[(x1, y0)].set_char('┐').set_style(style);
    }
}

impl Widget for TreemapWidget<'_> {
    fn render(self, area: UiRect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        for y in area.y..area.y.saturating_add(area.height) {
            for x in area.x..area.x.saturating_add(area.width) {
                buf[(x, y)]
                    .set_char(' ')
                    .set_style(Style::default().bg(BACKGROUND));
            }
        }

        let root = self.treemap.root();
        let total = self.treemap.get(root).map_or(0, |cell| cell.file.size);

        for (id, _) in self.treemap.cells() {
            let Some(cell) = self.treemap.get(id) else {
                continue;
            };
            let Some(corners) = clip(cell.rect, area) else {
                continue;
            };
            let (x0, y0, x1, _) = corners;

            let is_selected = self.selection == Some(cell.file.path.as_str());
            let bg = cell_color(cell, total);
            let fg = if is_selected { BORDER_SELECTED } else { BORDER };
            self.draw_box(corners, Style::default().bg(bg).fg(fg), buf);

            if let Some((sx0, sy0, sx1, sy1)) = clip(cell.spillage, area) {
                for y in sy0..=sy1 {
                    for x in sx0..=sx1 {
                        buf[(x, y)]
                            .set_char('░')
                            .set_style(Style::default().fg(SPILLAGE).bg(bg));
                    }
                }
            }

            let width = x1.saturating_sub(x0).saturating_sub(1) as usize;
            if width == 0 {
                continue;
            }
            let (name, size) = label(cell, id == root, is_selected, width);
            let mut name_style = Style::default().fg(Color::White).bg(bg).add_modifier(Modifier::BOLD);
            if is_selected {
                name_style = name_style.bg(Color::Blue);
            } else if cell.file.is_dir {
                name_style = name_style.fg(Color::LightBlue);
            }
            let (next_x, _) = buf.set_stringn(x0 + 1, y0, &name, width, name_style);
            if let Some(size) = size {
                let rest = width.saturating_sub((next_x - x0 - 1) as usize);
                buf.set_stringn(next_x, y0, &size, rest, Style::default().fg(Color::White).bg(bg));
            }
        }
    }
}

/// Top line: focused path, its size, file count, walk spinner and depth.
pub struct TitleBar<'a> {
    state: &'a State,
    spinner: &'a Spinner,
}

impl<'a> TitleBar<'a> {
    pub fn new(state: &'a State, spinner: &'a Spinner) -> Self {
        Self { state, spinner }
    }

    pub fn text(&self) -> String {
        let (path, size) = self
            .state
            .treemap
            .as_deref()
            .and_then(|tm| tm.get(tm.root()))
            .map_or(("", 0), |cell| (cell.file.path.as_str(), cell.file.size));

        let mut text = format!(" {path} {} ({} files)", humanize_iec(size), self.state.total_files);
        if self.state.is_walking_files {
            text.push(' ');
            text.push_str(self.spinner.frame());
        }
        text.push_str(&format!(" ({})", self.state.max_depth));
        if self.state.pause {
            text.push_str(" [paused]");
        }
        text
    }
}

impl Widget for TitleBar<'_> {
    fn render(self, area: UiRect, buf: &mut Buffer) {
        let style = Style::default().bg(Color::Green).fg(Color::Black);
        buf.set_style(area, style);
        buf.set_stringn(area.x, area.y, self.text(), area.width as usize, style);
    }
}

/// Bottom line: the latest error on the left, key help on the right.
pub struct StatusBar<'a> {
    error: Option<&'a str>,
}

impl<'a> StatusBar<'a> {
    pub fn new(error: Option<&'a str>) -> Self {
        Self { error }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: UiRect, buf: &mut Buffer) {
        let style = Style::default().bg(Color::Blue).fg(Color::White);
        buf.set_style(area, style);

        let help_width = HELP.chars().count() as u16;
        let mut help_x = area.x;
        if help_width < area.width {
            help_x = area.x + area.width - help_width;
        }

        if let Some(error) = self.error {
            let room = help_x.saturating_sub(area.x).saturating_sub(1) as usize;
            buf.set_stringn(area.x, area.y, format!(" {error}"), room, style.fg(Color::LightRed));
        }
        buf.set_stringn(help_x, area.y, HELP, area.width as usize, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::R2Rect;
    use crate::tiling::VerticalSplit;
    use crate::tree::{FileRecord, FileTree};
    use crate::treemap::R2Treemap;

    fn device_treemap() -> Z2Treemap {
        let mut tree = FileTree::new();
        tree.insert(FileRecord::dir("r")).unwrap();
        tree.insert(FileRecord::file("r/a", 3 * 1024)).unwrap();
        tree.insert(FileRecord::file("r/b", 1024)).unwrap();
        R2Treemap::new(&tree, tree.root().unwrap(), R2Rect::new(0.0, 0.0, 40.0, 10.0), &VerticalSplit, 0)
            .unwrap()
            .to_device()
    }

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_keymap() {
        assert_eq!(keymap(key(KeyCode::Char('h'))), Some(Command::Navigate(Direction::Left)));
        assert_eq!(keymap(key(KeyCode::Down)), Some(Command::Navigate(Direction::Down)));
        assert_eq!(keymap(key(KeyCode::Enter)), Some(Command::Navigate(Direction::In)));
        assert_eq!(keymap(key(KeyCode::Backspace)), Some(Command::Navigate(Direction::Out)));
        assert_eq!(keymap(key(KeyCode::Char('+'))), Some(Command::IncreaseMaxDepth));
        assert_eq!(keymap(key(KeyCode::Char('o'))), Some(Command::ZoomOut));
        assert_eq!(keymap(key(KeyCode::Char(' '))), Some(Command::TogglePause));
        assert_eq!(keymap(key(KeyCode::Esc)), Some(Command::Quit));
        assert_eq!(keymap(key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_keymap_control_keys() {
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
        assert_eq!(keymap(ctrl('c')), Some(Command::Quit));
        assert_eq!(keymap(ctrl('l')), Some(Command::Refresh));
        assert_eq!(keymap(ctrl('z')), Some(Command::SendToBackground));
        assert_eq!(keymap(ctrl('h')), None);
    }

    #[test]
    fn test_keymap_ignores_release() {
        let mut event = key(KeyCode::Char('q'));
        event.kind = KeyEventKind::Release;
        assert_eq!(keymap(event), None);
    }

    #[test]
    fn test_cell_at_finds_deepest() {
        let tm = device_treemap();
        assert_eq!(tm.path(cell_at(&tm, 5, 5).unwrap()), "r/a");
        assert_eq!(tm.path(cell_at(&tm, 35, 5).unwrap()), "r/b");
        assert_eq!(cell_at(&tm, 40, 5), None);
        assert_eq!(cell_at(&tm, -1, 0), None);
    }

    #[test]
    fn test_label() {
        let tm = device_treemap();
        let root = tm.get(tm.root()).unwrap();
        assert_eq!(label(root, true, false, 20), ("r/".to_string(), Some(" 4.0K".to_string())));

        let a = tm.get(tm.find_node("r/a").unwrap()).unwrap();
        assert_eq!(label(a, false, true, 20), ("* a".to_string(), Some(" 3.0K".to_string())));
        assert_eq!(label(a, false, false, 3), ("a".to_string(), None));
        assert_eq!(label(a, false, true, 2), ("* ".to_string(), None));
    }

    #[test]
    fn test_treemap_widget_draws_boxes_and_labels() {
        let tm = device_treemap();
        let area = UiRect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        TreemapWidget::new(&tm, Some("r/b")).render(area, &mut buf);

        let top = row(&buf, 0);
        assert!(top.starts_with("┌a 3.0K"), "{top}");
        assert!(top.contains("┌* b 1.0K"), "{top}");
        assert_eq!(buf[(0, 9)].symbol(), "└");
        assert_eq!(buf[(39, 9)].symbol(), "┘");
        assert_eq!(buf[(30, 0)].fg, BORDER_SELECTED);
    }

    #[test]
    fn test_title_bar_text() {
        let mut tree = FileTree::new();
        tree.insert(FileRecord::dir("r")).unwrap();
        tree.insert(FileRecord::file("r/a", 2048)).unwrap();
        let treemap = R2Treemap::new(&tree, tree.root().unwrap(), R2Rect::new(0.0, 0.0, 10.0, 10.0), &VerticalSplit, 0)
            .unwrap();
        let state = State {
            treemap: Some(std::sync::Arc::new(treemap)),
            total_files: 1,
            max_depth: 2,
            ..State::default()
        };
        let spinner = Spinner::new();
        assert_eq!(TitleBar::new(&state, &spinner).text(), " r 2.0K (1 files) (2)");

        let state = State {
            is_walking_files: true,
            pause: true,
            ..state
        };
        assert_eq!(TitleBar::new(&state, &spinner).text(), " r 2.0K (1 files)     (2) [paused]");
    }

    #[test]
    fn test_status_bar_shows_error_and_help() {
        let area = UiRect::new(0, 0, 160, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new(Some("boom")).render(area, &mut buf);

        let text = row(&buf, 0);
        assert!(text.starts_with(" boom"));
        assert!(text.trim_end().ends_with("<q> quit"));
    }
}
