//! Toggle State
//! User-controlled view parameters, held as a plain value and passed into the selector.

use crate::data::record::Quarter;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Summary,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitMode {
    Absolute,
    #[default]
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Season {
    #[default]
    Winter,
    Summer,
}

impl Season {
    pub fn quarters(&self) -> [Quarter; 2] {
        match self {
            Season::Winter => [Quarter::Q1, Quarter::Q4],
            Season::Summer => [Quarter::Q2, Quarter::Q3],
        }
    }

    pub fn contains(&self, quarter: Quarter) -> bool {
        self.quarters().contains(&quarter)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Season::Winter => "Winter (Q4 → Q1)",
            Season::Summer => "Summer (Q2 → Q3)",
        }
    }
}

/// Resolved toggle state for one chart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToggleState {
    view_mode: ViewMode,
    pub show_sources: bool,
    pub show_forecasts: bool,
    pub unit_mode: UnitMode,
    pub season: Option<Season>,
    pub selected_series: BTreeSet<String>,
    pub show_bands: bool,
}

impl ToggleState {
    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// Switch view mode. `Detail` turns sources and forecasts on, `Summary` turns
    /// both off, whatever they were before.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
        let detail = mode == ViewMode::Detail;
        self.show_sources = detail;
        self.show_forecasts = detail;
    }

    #[cfg(test)]
    pub fn with_view_mode(mut self, mode: ViewMode) -> Self {
        self.set_view_mode(mode);
        self
    }

    pub fn with_season(mut self, season: Season) -> Self {
        self.season = Some(season);
        self
    }

    #[cfg(test)]
    pub fn with_unit_mode(mut self, unit_mode: UnitMode) -> Self {
        self.unit_mode = unit_mode;
        self
    }

    pub fn with_series<I, S>(mut self, series: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_series = series.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_selected(&self, field: &str) -> bool {
        self.selected_series.contains(field)
    }

    /// Flip one series in or out of the selection.
    pub fn toggle_series(&mut self, field: &str) {
        if !self.selected_series.remove(field) {
            self.selected_series.insert(field.to_string());
        }
    }

    /// Full set becomes empty; anything else becomes the full set.
    pub fn toggle_all_series(&mut self, all: &[String]) {
        if all.iter().all(|f| self.selected_series.contains(f)) {
            self.selected_series.clear();
        } else {
            self.selected_series = all.iter().cloned().collect();
        }
    }
}
