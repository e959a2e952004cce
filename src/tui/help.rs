use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn keybind(keys: &[&'static str], action: &'static str) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    let mut width = 0;
    for (i, k) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" / "));
            width += 3;
        }
        spans.push(Span::styled(*k, Style::default().fg(Color::Magenta)));
        width += k.chars().count();
    }
    spans.push(Span::raw(" ".repeat(14usize.saturating_sub(width))));
    spans.push(Span::raw(action));
    Line::from(spans)
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        keybind(&["q", "Ctrl-C"], "Quit"),
        keybind(&["a", "n"], "Add a marker"),
        keybind(&["tab"], "Switch tabs"),
        keybind(&["?"], "Show this help"),
        Line::from(""),
        Line::from("Map tab:"),
        keybind(&["←↑↓→", "hjkl"], "Pan"),
        keybind(&["+", "-"], "Zoom in / out"),
        keybind(&["0"], "Reset view"),
        Line::from(""),
        Line::from("Markers tab:"),
        keybind(&["↑/↓", "j/k"], "Navigate"),
        keybind(&["enter"], "Show selected on map"),
        keybind(&["y"], "Copy selected coordinates"),
        keybind(&["e"], "Export all as JSON"),
        keybind(&["c"], "Export all as CSV"),
        Line::from(""),
        Line::from("Add marker form:"),
        keybind(&["tab", "shift-tab"], "Next / previous field"),
        keybind(&["enter"], "Add"),
        keybind(&["esc"], "Close without adding"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
