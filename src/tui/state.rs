use super::form::FormState;
use crate::model::Notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Map,
    Markers,
    Help,
}

impl Tab {
    pub const TITLES: [&'static str; 3] = ["Map", "Markers", "Help"];

    pub fn index(self) -> usize {
        match self {
            Tab::Map => 0,
            Tab::Markers => 1,
            Tab::Help => 2,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Tab::Map => Tab::Markers,
            Tab::Markers => Tab::Help,
            Tab::Help => Tab::Map,
        }
    }
}

#[derive(Debug, Default)]
pub struct UiState {
    pub tab: Tab,
    /// Last notice from a submission, export or clipboard action.
    pub notice: Option<Notice>,
    /// Index into the marker collection highlighted on the Markers tab.
    pub selected: usize,
    pub form: FormState,
}

impl UiState {
    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self, len: usize) {
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    /// Keep the selection inside a collection of `len` markers.
    pub fn clamp_selection(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

/// First list row to show so that `selected` stays within `max_items` visible rows.
pub fn window_start(selected: usize, max_items: usize) -> usize {
    let max_items = max_items.max(1);
    if selected >= max_items {
        selected + 1 - max_items
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn tabs_cycle() {
        let mut tab = Tab::default();
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(tab.index());
            tab = tab.next();
        }
        assert_eq!(seen, vec![0, 1, 2, 0]);
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut s = UiState::default();
        s.select_prev();
        assert_eq!(s.selected, 0);
        for _ in 0..10 {
            s.select_next(3);
        }
        assert_eq!(s.selected, 2);
        s.clamp_selection(1);
        assert_eq!(s.selected, 0);
        s.select_next(0);
        assert_eq!(s.selected, 0);
    }

    #[rstest]
    #[case(0, 5, 0)]
    #[case(4, 5, 0)]
    #[case(5, 5, 1)]
    #[case(9, 5, 5)]
    #[case(3, 0, 3)]
    fn window_follows_selection(
        #[case] selected: usize,
        #[case] max_items: usize,
        #[case] start: usize,
    ) {
        assert_eq!(window_start(selected, max_items), start);
    }
}
