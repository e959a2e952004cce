//! Text listing builder for CLI output.

use crate::model::MarkerCollection;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Numbered listing in collection order.
pub(crate) fn build_text_summary(markers: &MarkerCollection) -> TextSummary {
    let mut lines = Vec::with_capacity(markers.len() + 1);
    lines.push(format!("Markers: {}", markers.len()));
    let width = markers.len().to_string().len();
    for (idx, m) in markers.iter().enumerate() {
        lines.push(format!(
            "{:>width$}. {:<32} {:>11.6} {:>11.6}",
            idx + 1,
            m.name,
            m.coordinates.lat,
            m.coordinates.lon,
        ));
    }
    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Marker;

    #[test]
    fn lists_markers_in_order() {
        let markers = crate::store::default_markers()
            .appended(Marker::new("Test Point", 47.0, 39.0))
            .unwrap();
        let summary = build_text_summary(&markers);
        assert_eq!(summary.lines.len(), 7);
        assert_eq!(summary.lines[0], "Markers: 6");
        assert!(summary.lines[1].starts_with("1. Аквапарк \"H2O\""));
        assert!(summary.lines[6].starts_with("6. Test Point"));
        assert!(summary.lines[6].ends_with("  47.000000   39.000000"));
    }
}
