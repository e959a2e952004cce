//! Terminal map collaborator drawn on a ratatui canvas.
//!
//! The base layer is ratatui's built-in world map; the configured tile layer is
//! shown as the map source in the block title.

use super::{InstanceId, MapBackend, MapError, MapWidget, SurfaceId};
use crate::model::{Coordinates, MapView, MarkerIcon, TileLayer};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Map, MapResolution, Points},
        Block, Borders,
    },
    Frame,
};

/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;
/// Fraction of the visible span moved by one pan step.
const PAN_FRACTION: f64 = 0.125;

#[derive(Debug, Default)]
pub struct CanvasBackend {
    created: u64,
}

impl MapBackend for CanvasBackend {
    type Widget = CanvasMap;

    fn create(
        &mut self,
        surface: SurfaceId,
        view: MapView,
        tiles: &TileLayer,
    ) -> Result<CanvasMap, MapError> {
        if !view.center.is_finite() {
            return Err(MapError::Create(surface));
        }
        self.created += 1;
        Ok(CanvasMap {
            id: InstanceId(self.created),
            home: view,
            view: MapView {
                zoom: view.zoom.clamp(1, tiles.max_zoom.max(1)),
                ..view
            },
            tiles: tiles.clone(),
            markers: Vec::new(),
            released: false,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMarker {
    pub at: Coordinates,
    pub icon: MarkerIcon,
    pub popup: String,
}

#[derive(Debug)]
pub struct CanvasMap {
    id: InstanceId,
    home: MapView,
    view: MapView,
    tiles: TileLayer,
    markers: Vec<PlacedMarker>,
    released: bool,
}

impl MapWidget for CanvasMap {
    fn instance(&self) -> InstanceId {
        self.id
    }

    fn place_marker(
        &mut self,
        at: Coordinates,
        icon: MarkerIcon,
        popup: &str,
    ) -> Result<(), MapError> {
        if self.released || !at.is_finite() {
            return Err(MapError::Placement {
                at,
                popup: popup.to_string(),
            });
        }
        self.markers.push(PlacedMarker {
            at,
            icon,
            popup: popup.to_string(),
        });
        Ok(())
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
    }

    fn release(&mut self) {
        self.markers = Vec::new();
        self.released = true;
    }
}

impl CanvasMap {
    pub fn view(&self) -> MapView {
        self.view
    }

    pub fn markers(&self) -> &[PlacedMarker] {
        &self.markers
    }

    /// Longitude span visible at the current zoom.
    fn lon_span(&self) -> f64 {
        360.0 / 2f64.powi(i32::from(self.view.zoom) - 1)
    }

    /// `(x_bounds, y_bounds)` as `([lon_min, lon_max], [lat_min, lat_max])` for an area.
    pub fn bounds(&self, width: u16, height: u16) -> ([f64; 2], [f64; 2]) {
        let lon_span = self.lon_span();
        let w = f64::from(width.max(1));
        let h = f64::from(height.max(1));
        let lat_scale = self.view.center.lat.to_radians().cos().abs().max(0.01);
        let lat_span = (lon_span * lat_scale * h * CELL_ASPECT / w).min(180.0);
        let c = self.view.center;
        (
            [c.lon - lon_span / 2.0, c.lon + lon_span / 2.0],
            [c.lat - lat_span / 2.0, c.lat + lat_span / 2.0],
        )
    }

    pub fn zoom_in(&mut self) {
        self.view.zoom = self.view.zoom.saturating_add(1).min(self.tiles.max_zoom.max(1));
    }

    pub fn zoom_out(&mut self) {
        self.view.zoom = self.view.zoom.saturating_sub(1).max(1);
    }

    /// Move the center by whole pan steps; positive `north`/`east` go up/right.
    pub fn pan(&mut self, north: i32, east: i32) {
        let step = self.lon_span() * PAN_FRACTION;
        let c = &mut self.view.center;
        c.lat = (c.lat + f64::from(north) * step).clamp(-90.0, 90.0);
        c.lon = (c.lon + f64::from(east) * step).clamp(-180.0, 180.0);
    }

    pub fn reset_view(&mut self) {
        self.view = self.home;
    }

    /// Center on a coordinate, keeping the zoom.
    pub fn focus(&mut self, at: Coordinates) {
        self.view.center = at;
    }

    /// Draw the map into `area`; `selected` popups are highlighted.
    pub fn render(&self, f: &mut Frame, area: Rect, selected: Option<usize>) {
        let inner_w = area.width.saturating_sub(2);
        let inner_h = area.height.saturating_sub(2);
        let (x_bounds, y_bounds) = self.bounds(inner_w, inner_h);

        let title = Line::from(vec![
            Span::raw(format!(
                "Map ({:.4}, {:.4} z{}) ",
                self.view.center.lat, self.view.center.lon, self.view.zoom
            )),
            Span::styled(
                format!("{} markers", self.markers.len()),
                Style::default().fg(Color::Green),
            ),
        ]);
        let source = Line::from(Span::styled(
            format!(" {} | {} ", self.tiles.attribution, self.tiles.url_template),
            Style::default().fg(Color::DarkGray),
        ))
        .right_aligned();

        let canvas = Canvas::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .title_bottom(source),
            )
            .marker(symbols::Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(|ctx| {
                ctx.draw(&Map {
                    resolution: MapResolution::High,
                    color: Color::DarkGray,
                });
                ctx.layer();
                ctx.draw(&Points {
                    coords: &[(self.view.center.lon, self.view.center.lat)],
                    color: Color::Blue,
                });
                for (idx, m) in self.markers.iter().enumerate() {
                    let is_selected = selected == Some(idx);
                    let style = if is_selected {
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::REVERSED)
                    } else {
                        Style::default().fg(Color::Gray)
                    };
                    ctx.print(
                        m.at.lon,
                        m.at.lat,
                        Line::from(vec![
                            Span::styled(m.icon.glyph.to_string(), Style::default().fg(Color::Red)),
                            Span::styled(format!(" {}", m.popup), style),
                        ]),
                    );
                }
            });
        f.render_widget(canvas, area);
    }
}
