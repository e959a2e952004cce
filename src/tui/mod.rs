mod export;
mod form;
mod help;
mod state;

use crate::map::canvas::{CanvasBackend, CanvasMap};
use crate::map::{MapHandle, MapSyncController, SurfaceId};
use crate::model::{AppConfig, MarkerIcon, Notice};
use crate::orchestrator::{UiCommand, ViewController};
use crate::storage::{FileStorage, LocalStorage};
use crate::store::MarkerStore;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use form::FormAction;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Terminal,
};
use state::{Tab, UiState};
use std::{io, time::Duration, time::Instant};

const MAP_SURFACE: SurfaceId = SurfaceId("map");

type View<S> = ViewController<S, CanvasBackend>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Run the TUI until the user quits. The map is released on every exit path.
pub fn run(cfg: AppConfig, store: MarkerStore<FileStorage>) -> Result<()> {
    let maps = MapSyncController::new(cfg.view, cfg.tiles.clone(), MarkerIcon::default());
    let mut view = ViewController::new(store, maps, CanvasBackend::default(), cfg.policy);
    view.mount(MAP_SURFACE).context("mount map")?;

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let res = Terminal::new(CrosstermBackend::new(stdout))
        .context("create terminal")
        .and_then(|mut terminal| {
            terminal.clear().ok();
            event_loop(&mut terminal, &mut view, cfg.tick_rate)
        });

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    view.unmount();
    res
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    view: &mut View<FileStorage>,
    tick_rate: Duration,
) -> Result<()> {
    let mut state = UiState::default();
    let mut last_draw: Option<Instant> = None;

    loop {
        if let Err(e) = view.refresh() {
            tracing::warn!(error = %e, "map sync failed");
            state.notice = Some(Notice::Error(format!("Map sync failed: {e}")));
        }

        if last_draw.map_or(true, |t| t.elapsed() >= tick_rate) {
            terminal
                .draw(|f| draw(f.area(), f, view, &state))
                .context("draw frame")?;
            last_draw = Some(Instant::now());
        }

        // Short poll keeps redraws on schedule.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(view, &mut state, k) == Flow::Quit {
                    return Ok(());
                }
                last_draw = None;
            }
        }
    }
}

fn canvas_mut<S: LocalStorage>(view: &mut View<S>) -> Option<&mut CanvasMap> {
    view.map_mut().and_then(MapHandle::widget_mut)
}

fn handle_key<S: LocalStorage>(view: &mut View<S>, state: &mut UiState, k: KeyEvent) -> Flow {
    if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
        return Flow::Quit;
    }

    if view.form_open() {
        match state.form.input(k) {
            FormAction::Edited => {}
            FormAction::Cancel => {
                view.handle(UiCommand::CloseForm);
            }
            FormAction::Submit(submission) => {
                if let Some(out) = view.handle(UiCommand::Submit(submission)) {
                    if out.accepted() {
                        state.form.reset();
                        state.selected = view.markers().len().saturating_sub(1);
                    }
                    state.notice = Some(out.notice);
                }
            }
        }
        return Flow::Continue;
    }

    match k.code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Tab => state.tab = state.tab.next(),
        KeyCode::Char('?') => state.tab = Tab::Help,
        KeyCode::Char('a') | KeyCode::Char('n') => {
            state.notice = None;
            view.handle(UiCommand::OpenForm);
        }
        code => match state.tab {
            Tab::Map => map_key(view, code),
            Tab::Markers => markers_key(view, state, code),
            Tab::Help => {}
        },
    }
    Flow::Continue
}

fn map_key<S: LocalStorage>(view: &mut View<S>, code: KeyCode) {
    let Some(map) = canvas_mut(view) else {
        return;
    };
    match code {
        KeyCode::Up | KeyCode::Char('k') => map.pan(1, 0),
        KeyCode::Down | KeyCode::Char('j') => map.pan(-1, 0),
        KeyCode::Left | KeyCode::Char('h') => map.pan(0, -1),
        KeyCode::Right | KeyCode::Char('l') => map.pan(0, 1),
        KeyCode::Char('+') | KeyCode::Char('=') => map.zoom_in(),
        KeyCode::Char('-') => map.zoom_out(),
        KeyCode::Char('0') => map.reset_view(),
        _ => {}
    }
}

fn markers_key<S: LocalStorage>(view: &mut View<S>, state: &mut UiState, code: KeyCode) {
    let len = view.markers().len();
    state.clamp_selection(len);
    match code {
        KeyCode::Up | KeyCode::Char('k') => state.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => state.select_next(len),
        KeyCode::Enter => {
            let Some(at) = view.markers().get(state.selected).map(|m| m.coordinates) else {
                return;
            };
            if let Some(map) = canvas_mut(view) {
                map.focus(at);
                state.tab = Tab::Map;
            }
        }
        KeyCode::Char('y') => {
            let Some(m) = view.markers().get(state.selected) else {
                return;
            };
            let text = m.coordinates.to_string();
            state.notice = Some(match export::copy_to_clipboard(&text) {
                Ok(()) => Notice::Info(format!("✓ Copied to clipboard: {text}")),
                Err(e) => Notice::Error(format!("Clipboard copy failed: {e:#}")),
            });
        }
        KeyCode::Char('e') => {
            let res = export::export_markers_json(view.markers());
            record_export(state, "JSON", res);
        }
        KeyCode::Char('c') => {
            let res = export::export_markers_csv(view.markers());
            record_export(state, "CSV", res);
        }
        _ => {}
    }
}

fn record_export(state: &mut UiState, kind: &str, res: Result<std::path::PathBuf>) {
    state.notice = Some(match res {
        Ok(p) => Notice::Info(format!("Exported {kind}: {}", p.display())),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), kind, "export failed");
            Notice::Error(format!("{kind} export failed: {e:#}"))
        }
    });
}

fn draw<S: LocalStorage>(area: Rect, f: &mut ratatui::Frame, view: &View<S>, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let tabs = Tabs::new(Tab::TITLES.iter().map(|t| Line::from(*t)).collect::<Vec<_>>())
        .select(state.tab.index())
        .block(Block::default().borders(Borders::ALL).title("map-markers"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        Tab::Map => draw_map(chunks[1], f, view, state),
        Tab::Markers => draw_markers(chunks[1], f, view, state),
        Tab::Help => help::draw_help(chunks[1], f),
    }

    draw_status(chunks[2], f, state);

    if view.form_open() {
        form::draw_form(area, f, &state.form, state.notice.as_ref());
    }
}

fn draw_map<S: LocalStorage>(area: Rect, f: &mut ratatui::Frame, view: &View<S>, state: &UiState) {
    match view.map().and_then(MapHandle::widget) {
        Some(map) => map.render(f, area, Some(state.selected)),
        None => f.render_widget(
            Paragraph::new("Map is not available.")
                .block(Block::default().borders(Borders::ALL).title("Map")),
            area,
        ),
    }
}

fn draw_markers<S: LocalStorage>(
    area: Rect,
    f: &mut ratatui::Frame,
    view: &View<S>,
    state: &UiState,
) {
    let markers = view.markers();
    let total = markers.len();
    let selected = state.selected.min(total.saturating_sub(1));
    // Borders plus the header and spacer lines.
    let max_items = (area.height as usize).saturating_sub(4);
    let start = state::window_start(selected, max_items);

    let mut lines: Vec<Line> = vec![
        Line::from(vec![
            Span::raw(format!("Markers ({}/{}) - ", selected + 1, total)),
            Span::styled("↑/↓/j/k", Style::default().fg(Color::Magenta)),
            Span::raw(": navigate, "),
            Span::styled("enter", Style::default().fg(Color::Magenta)),
            Span::raw(": show on map, "),
            Span::styled("y", Style::default().fg(Color::Magenta)),
            Span::raw(": copy coordinates, "),
            Span::styled("e", Style::default().fg(Color::Magenta)),
            Span::raw(": export JSON, "),
            Span::styled("c", Style::default().fg(Color::Magenta)),
            Span::raw(": export CSV"),
        ]),
        Line::from(""),
    ];

    let width = total.to_string().len();
    for (idx, m) in markers.iter().enumerate().skip(start).take(max_items) {
        let row = format!(
            "{:>width$}. {:<32} {:>11.6} {:>11.6}",
            idx + 1,
            m.name,
            m.coordinates.lat,
            m.coordinates.lon,
        );
        let style = if idx == selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(row, style)));
    }

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Markers"));
    f.render_widget(p, area);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let line = match &state.notice {
        Some(Notice::Error(text)) => Line::from(Span::styled(
            text.as_str(),
            Style::default().fg(Color::Red),
        )),
        Some(Notice::Info(text)) => Line::from(Span::styled(
            text.as_str(),
            Style::default().fg(Color::Green),
        )),
        None => Line::from(vec![
            Span::styled("a", Style::default().fg(Color::Magenta)),
            Span::raw(" add marker  "),
            Span::styled("?", Style::default().fg(Color::Magenta)),
            Span::raw(" help  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" quit"),
        ]),
    };
    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapState;
    use crate::model::{MapView, Marker, TileLayer};
    use crate::storage::memory::MemoryStorage;
    use crate::store::{default_markers, DEFAULT_STORAGE_KEY};
    use crate::validate::CoordinatePolicy;

    fn view() -> View<MemoryStorage> {
        let store = MarkerStore::open(
            MemoryStorage::default(),
            DEFAULT_STORAGE_KEY,
            default_markers(),
        );
        let maps = MapSyncController::new(
            MapView::default(),
            TileLayer::default(),
            MarkerIcon::default(),
        );
        let mut v = ViewController::new(
            store,
            maps,
            CanvasBackend::default(),
            CoordinatePolicy::Strict,
        );
        v.mount(MAP_SURFACE).unwrap();
        v
    }

    fn press(v: &mut View<MemoryStorage>, s: &mut UiState, code: KeyCode) -> Flow {
        handle_key(v, s, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(v: &mut View<MemoryStorage>, s: &mut UiState, text: &str) {
        for c in text.chars() {
            press(v, s, KeyCode::Char(c));
        }
    }

    fn canvas(v: &View<MemoryStorage>) -> &CanvasMap {
        v.map().and_then(MapHandle::widget).unwrap()
    }

    #[test]
    fn form_submission_adds_marker_to_map() {
        let mut v = view();
        let mut s = UiState::default();
        press(&mut v, &mut s, KeyCode::Char('a'));
        assert!(v.form_open());

        type_str(&mut v, &mut s, "Test Point");
        press(&mut v, &mut s, KeyCode::Tab);
        type_str(&mut v, &mut s, "47.0");
        press(&mut v, &mut s, KeyCode::Tab);
        type_str(&mut v, &mut s, "39.0");
        press(&mut v, &mut s, KeyCode::Enter);

        assert!(!v.form_open());
        assert_eq!(v.markers().last(), Some(&Marker::new("Test Point", 47.0, 39.0)));
        assert_eq!(s.selected, 5);
        assert_eq!(s.form, form::FormState::default());
        assert!(matches!(s.notice, Some(Notice::Info(_))));

        let placed = canvas(&v).markers();
        assert_eq!(placed.len(), 6);
        assert_eq!(placed[5].popup, "Test Point");
    }

    #[test]
    fn rejected_submission_keeps_input() {
        let mut v = view();
        let mut s = UiState::default();
        press(&mut v, &mut s, KeyCode::Char('n'));
        type_str(&mut v, &mut s, "Bad");
        press(&mut v, &mut s, KeyCode::Tab);
        type_str(&mut v, &mut s, "abc");
        press(&mut v, &mut s, KeyCode::Enter);

        assert!(v.form_open());
        assert_eq!(s.form.name, "Bad");
        assert_eq!(s.form.latitude, "abc");
        assert!(s.notice.as_ref().is_some_and(Notice::is_error));
        assert_eq!(v.markers().len(), 5);

        // 'q' is text while the form is open
        assert_eq!(press(&mut v, &mut s, KeyCode::Char('q')), Flow::Continue);
        press(&mut v, &mut s, KeyCode::Esc);
        assert!(!v.form_open());
        assert_eq!(press(&mut v, &mut s, KeyCode::Char('q')), Flow::Quit);
    }

    #[test]
    fn ctrl_c_quits_from_anywhere() {
        let mut v = view();
        let mut s = UiState::default();
        press(&mut v, &mut s, KeyCode::Char('a'));
        let flow = handle_key(
            &mut v,
            &mut s,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert_eq!(flow, Flow::Quit);
    }

    #[test]
    fn map_keys_move_the_view() {
        let mut v = view();
        let mut s = UiState::default();
        let home = canvas(&v).view();
        press(&mut v, &mut s, KeyCode::Char('+'));
        press(&mut v, &mut s, KeyCode::Char('l'));
        assert_eq!(canvas(&v).view().zoom, home.zoom + 1);
        assert!(canvas(&v).view().center.lon > home.center.lon);
        press(&mut v, &mut s, KeyCode::Char('0'));
        assert_eq!(canvas(&v).view(), home);
    }

    #[test]
    fn enter_on_markers_tab_focuses_selection() {
        let mut v = view();
        let mut s = UiState::default();
        press(&mut v, &mut s, KeyCode::Tab);
        assert_eq!(s.tab, Tab::Markers);
        press(&mut v, &mut s, KeyCode::Down);
        press(&mut v, &mut s, KeyCode::Down);
        press(&mut v, &mut s, KeyCode::Enter);

        assert_eq!(s.tab, Tab::Map);
        let target = v.markers().get(2).unwrap().coordinates;
        assert_eq!(canvas(&v).view().center, target);
    }

    #[test]
    fn unmounted_view_ignores_map_keys() {
        let mut v = view();
        let mut s = UiState::default();
        v.unmount();
        assert_eq!(v.map_state(), MapState::TornDown);
        assert_eq!(press(&mut v, &mut s, KeyCode::Char('+')), Flow::Continue);
    }
}
