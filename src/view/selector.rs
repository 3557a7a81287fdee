//! View Selector
//! Resolves toggle state into the exact rows and columns a chart plots.

use super::toggles::{ToggleState, UnitMode};
use crate::data::record::Record;

/// Condition under which a column group is plotted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnGate {
    Always,
    Sources,
    Forecasts,
    Unit(UnitMode),
    /// Each field individually, by series selection.
    Selectable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnGroup {
    pub gate: ColumnGate,
    pub fields: Vec<String>,
    /// Suffixes of companion fields (e.g. `_yoy`) carried alongside each active
    /// field but not plotted.
    pub companions: Vec<String>,
}

impl ColumnGroup {
    pub fn new(gate: ColumnGate, fields: &[&str]) -> Self {
        Self {
            gate,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            companions: Vec::new(),
        }
    }

    pub fn with_companion(mut self, suffix: &str) -> Self {
        self.companions.push(suffix.to_string());
        self
    }

    fn is_active(&self, state: &ToggleState, field: &str) -> bool {
        match self.gate {
            ColumnGate::Always => true,
            ColumnGate::Sources => state.show_sources,
            ColumnGate::Forecasts => state.show_forecasts,
            ColumnGate::Unit(mode) => state.unit_mode == mode,
            ColumnGate::Selectable => state.is_selected(field),
        }
    }
}

/// Column groups and row rules of one chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSpec {
    pub groups: Vec<ColumnGroup>,
    /// Last period with actual (non-forecast) data.
    pub actual_cutoff: Option<f64>,
    /// Keyed by composite quarter labels and split by season.
    pub seasonal: bool,
}

impl ViewSpec {
    pub fn has_gate(&self, gate: ColumnGate) -> bool {
        self.groups.iter().any(|g| g.gate == gate)
    }

    /// Every field of the selectable groups, in declared order.
    pub fn selectable_fields(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter(|g| g.gate == ColumnGate::Selectable)
            .flat_map(|g| g.fields.iter().cloned())
            .collect()
    }

    /// Gate of the group a field belongs to and its position within that group.
    pub fn locate(&self, field: &str) -> Option<(ColumnGate, usize)> {
        self.groups.iter().find_map(|g| {
            g.fields
                .iter()
                .position(|f| f == field)
                .map(|pos| (g.gate, pos))
        })
    }

    /// Initial toggle state for this view.
    pub fn default_toggles(&self) -> ToggleState {
        let mut state = ToggleState::default().with_series(self.selectable_fields());
        if self.seasonal {
            state = state.with_season(Default::default());
        }
        state
    }
}

/// Rows and plotted columns for one render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

pub struct ViewSelector;

impl ViewSelector {
    /// Plotted columns, in declared group order.
    pub fn active_columns(spec: &ViewSpec, state: &ToggleState) -> Vec<String> {
        spec.groups
            .iter()
            .flat_map(move |g| {
                g.fields
                    .iter()
                    .filter(move |f| g.is_active(state, f))
                    .cloned()
            })
            .collect()
    }

    /// Whether a record survives the row rules of the current state.
    pub fn row_visible(spec: &ViewSpec, state: &ToggleState, record: &Record) -> bool {
        // Sources alone truncate to actuals; sources with forecasts show everything.
        if state.show_sources && !state.show_forecasts {
            if let Some(cutoff) = spec.actual_cutoff {
                if !record.period.year().is_some_and(|y| y <= cutoff) {
                    return false;
                }
            }
        }

        if let Some(season) = state.season {
            if !record.period.quarter().is_some_and(|q| season.contains(q)) {
                return false;
            }
        }

        true
    }

    /// Reduce a record sequence to what the chart plots. Order is preserved and the
    /// input is not modified.
    pub fn apply(records: &[Record], spec: &ViewSpec, state: &ToggleState) -> FilteredView {
        let columns = Self::active_columns(spec, state);
        let active = &columns;
        let companions: Vec<String> = spec
            .groups
            .iter()
            .flat_map(move |g| {
                g.fields
                    .iter()
                    .filter(move |f| active.contains(f))
                    .flat_map(move |f| g.companions.iter().map(move |s| format!("{f}{s}")))
            })
            .collect();

        let records = records
            .iter()
            .filter(|r| Self::row_visible(spec, state, r))
            .map(|r| {
                let mut projected = Record::new(r.period.clone());
                for column in &columns {
                    projected.insert(column.clone(), r.get(column).clone());
                }
                for companion in &companions {
                    if let Some(value) = r.fields.get(companion) {
                        projected.insert(companion.clone(), value.clone());
                    }
                }
                projected
            })
            .collect();

        FilteredView { columns, records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::{Period, Value};
    use crate::view::toggles::{Season, ViewMode};
    use proptest::prelude::*;

    fn year_records(years: std::ops::RangeInclusive<i32>) -> Vec<Record> {
        years
            .map(|y| {
                let mut r = Record::new(Period::Year(y as f64));
                r.insert("Actual", Value::Number(y as f64));
                r.insert("Coal", Value::Number(1.0));
                r.insert("Coal_yoy", Value::Text("–".to_string()));
                r.insert("IEA", Value::Number(2.0));
                r
            })
            .collect()
    }

    fn forecast_spec() -> ViewSpec {
        ViewSpec {
            groups: vec![
                ColumnGroup::new(ColumnGate::Always, &["Actual"]),
                ColumnGroup::new(ColumnGate::Forecasts, &["IEA"]),
                ColumnGroup::new(ColumnGate::Sources, &["Coal"]).with_companion("_yoy"),
            ],
            actual_cutoff: Some(2025.0),
            seasonal: false,
        }
    }

    fn years(view: &FilteredView) -> Vec<f64> {
        view.records.iter().filter_map(|r| r.period.year()).collect()
    }

    #[test]
    fn sources_alone_truncate_to_cutoff() {
        let records = year_records(2023..=2028);
        let mut state = ToggleState::default();
        state.show_sources = true;

        let view = ViewSelector::apply(&records, &forecast_spec(), &state);
        assert_eq!(years(&view), vec![2023.0, 2024.0, 2025.0]);
        assert_eq!(view.columns, vec!["Actual", "Coal"]);
        assert!(view.records[0].fields.contains_key("Coal_yoy"));
        assert!(!view.records[0].fields.contains_key("IEA"));
    }

    #[test]
    fn sources_with_forecasts_show_full_range() {
        let records = year_records(2023..=2028);
        let state = ToggleState::default().with_view_mode(ViewMode::Detail);

        let view = ViewSelector::apply(&records, &forecast_spec(), &state);
        assert_eq!(view.records.len(), 6);
        assert_eq!(view.columns, vec!["Actual", "IEA", "Coal"]);
    }

    #[test]
    fn forecasts_alone_gate_columns_only() {
        let records = year_records(2023..=2028);
        let mut state = ToggleState::default();
        state.show_forecasts = true;

        let view = ViewSelector::apply(&records, &forecast_spec(), &state);
        assert_eq!(view.records.len(), 6);
        assert_eq!(view.columns, vec!["Actual", "IEA"]);
        assert!(!view.records[0].fields.contains_key("Coal_yoy"));
    }

    #[test]
    fn unit_mode_selects_group() {
        let spec = ViewSpec {
            groups: vec![
                ColumnGroup::new(ColumnGate::Unit(UnitMode::Absolute), &["Coal_TWh"]),
                ColumnGroup::new(ColumnGate::Unit(UnitMode::Percent), &["Coal_pct"]),
            ],
            ..Default::default()
        };
        let records = year_records(2020..=2021);

        let abs = ToggleState::default().with_unit_mode(UnitMode::Absolute);
        let pct = ToggleState::default().with_unit_mode(UnitMode::Percent);
        assert_eq!(ViewSelector::apply(&records, &spec, &abs).columns, vec!["Coal_TWh"]);
        let view = ViewSelector::apply(&records, &spec, &pct);
        assert_eq!(view.columns, vec!["Coal_pct"]);
        assert_eq!(view.records.len(), 2);
        assert!(view.records[0].get("Coal_pct").is_missing());
    }

    #[test]
    fn winter_keeps_q1_and_q4() {
        let records: Vec<Record> = ["2023 Q1", "2023 Q2", "2023 Q3", "2023 Q4"]
            .iter()
            .map(|l| Record::new(Period::Label(l.to_string())))
            .collect();
        let spec = ViewSpec {
            seasonal: true,
            ..Default::default()
        };

        let winter = ViewSelector::apply(&records, &spec, &spec.default_toggles());
        let labels: Vec<_> = winter.records.iter().map(|r| r.period.clone()).collect();
        assert_eq!(
            labels,
            vec![
                Period::Label("2023 Q1".to_string()),
                Period::Label("2023 Q4".to_string())
            ]
        );

        let summer = ViewSelector::apply(
            &records,
            &spec,
            &ToggleState::default().with_season(Season::Summer),
        );
        assert_eq!(summer.records.len(), 2);
        assert_eq!(summer.records[0].period, Period::Label("2023 Q2".to_string()));
    }

    #[test]
    fn selection_keeps_declared_order() {
        let spec = ViewSpec {
            groups: vec![ColumnGroup::new(
                ColumnGate::Selectable,
                &["Coal", "Gas", "Wind"],
            )],
            ..Default::default()
        };
        let state = ToggleState::default().with_series(["Wind", "Coal"]);
        assert_eq!(ViewSelector::active_columns(&spec, &state), vec!["Coal", "Wind"]);
        assert_eq!(spec.locate("Wind"), Some((ColumnGate::Selectable, 2)));
        assert_eq!(spec.locate("Hydro"), None);
        assert_eq!(spec.default_toggles().selected_series.len(), 3);
    }

    prop_compose! {
        fn arb_state()(
            detail in any::<bool>(),
            sources in any::<bool>(),
            forecasts in any::<bool>(),
            percent in any::<bool>(),
            season in prop::option::of(any::<bool>()),
            coal in any::<bool>(),
        ) -> ToggleState {
            let mode = if detail { ViewMode::Detail } else { ViewMode::Summary };
            let mut state = ToggleState::default().with_view_mode(mode);
            state.show_sources = sources;
            state.show_forecasts = forecasts;
            state.unit_mode = if percent { UnitMode::Percent } else { UnitMode::Absolute };
            state.season = season.map(|w| if w { Season::Winter } else { Season::Summer });
            if coal {
                state.selected_series.insert("Coal".to_string());
            }
            state
        }
    }

    proptest! {
        #[test]
        fn filter_is_idempotent(
            state in arb_state(),
            start in 2010i32..2030,
            len in 0i32..12,
            quarters in any::<bool>(),
        ) {
            let records: Vec<Record> = if quarters {
                (0..len)
                    .map(|i| {
                        let label = format!("{} Q{}", start + i / 4, i % 4 + 1);
                        let mut r = Record::new(Period::Label(label));
                        r.insert("Coal", Value::Number(i as f64));
                        r
                    })
                    .collect()
            } else {
                year_records(start..=start + len)
            };
            let mut spec = forecast_spec();
            spec.groups.push(ColumnGroup::new(ColumnGate::Selectable, &["Coal"]));
            spec.groups.push(ColumnGroup::new(ColumnGate::Unit(UnitMode::Percent), &["Actual"]));

            let once = ViewSelector::apply(&records, &spec, &state);
            let twice = ViewSelector::apply(&once.records, &spec, &state);
            prop_assert_eq!(&once, &twice);
            prop_assert!(once.records.len() <= records.len());
        }
    }
}
