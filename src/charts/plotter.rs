//! Chart Plotter Module
//! Draws filtered views as interactive egui_plot charts.

use crate::data::{Band, DatasetSpec, Period, Record, YOY_SUFFIX};
use crate::view::{ColumnGate, FilteredView, ToggleState, UnitMode};
use egui::{Align2, Color32};
use egui_plot::{
    Bar, BarChart, Legend, Line, LineStyle, Plot, PlotPoint, PlotPoints, PlotUi, Polygon, Text,
    VLine,
};
use std::collections::HashMap;

/// Series palette
pub const PALETTE: [Color32; 8] = [
    Color32::from_rgb(102, 187, 106), // Green
    Color32::from_rgb(255, 167, 38),  // Orange
    Color32::from_rgb(255, 235, 59),  // Yellow
    Color32::from_rgb(141, 110, 99),  // Brown
    Color32::from_rgb(66, 165, 245),  // Blue
    Color32::from_rgb(174, 213, 129), // Light Green
    Color32::from_rgb(255, 112, 67),  // Deep Orange
    Color32::from_rgb(38, 198, 218),  // Cyan
];

/// Headline series: actual, mean, then the two band edges.
pub const CORE_COLORS: [Color32; 4] = [
    Color32::from_rgb(36, 161, 72),
    Color32::from_rgb(0, 105, 180),
    Color32::from_rgb(255, 105, 180),
    Color32::from_rgb(255, 105, 180),
];

pub const AGENCY_COLOR: Color32 = Color32::from_black_alpha(77);
pub const MARKER_COLOR: Color32 = Color32::from_gray(77);
pub const BAND_FILL: Color32 = Color32::from_rgba_premultiplied(0, 8, 13, 18);

const PLOT_HEIGHT: f32 = 380.0;

/// X coordinate of each record: the year for year-keyed rows, the row index for
/// composite labels.
pub fn x_positions(records: &[Record]) -> Vec<f64> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| match r.period {
            Period::Year(y) => y,
            Period::Label(_) => i as f64,
        })
        .collect()
}

/// Contiguous runs of present values; a missing value breaks the line.
pub fn segments(xs: &[f64], records: &[Record], column: &str) -> Vec<Vec<[f64; 2]>> {
    let mut runs = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    for (x, record) in xs.iter().zip(records) {
        match record.number(column) {
            Some(y) => current.push([*x, y]),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Cumulative layer tops for a stacked chart. Rows with any missing member are
/// left out of every layer.
pub fn stacked(xs: &[f64], records: &[Record], columns: &[String]) -> Vec<Vec<[f64; 2]>> {
    let mut layers = vec![Vec::new(); columns.len()];
    for (x, record) in xs.iter().zip(records) {
        let Some(values) = columns
            .iter()
            .map(|c| record.number(c))
            .collect::<Option<Vec<f64>>>()
        else {
            continue;
        };
        let mut top = 0.0;
        for (layer, value) in layers.iter_mut().zip(values) {
            top += value;
            layer.push([*x, top]);
        }
    }
    layers
}

/// Hover text lookup built once per filtered view.
#[derive(Debug, Clone, Default)]
pub struct HoverTable {
    xs: Vec<f64>,
    axis: Vec<String>,
    by_index: bool,
    values: HashMap<String, Vec<Option<f64>>>,
    yoy: HashMap<String, Vec<Option<String>>>,
    percent: bool,
    unit: String,
}

impl HoverTable {
    pub fn new(spec: &DatasetSpec, view: &FilteredView, state: &ToggleState) -> Self {
        let xs = x_positions(&view.records);
        let mut values = HashMap::new();
        let mut yoy = HashMap::new();
        for column in &view.columns {
            let name = spec.display_name(column);
            let companion = format!("{column}{YOY_SUFFIX}");
            yoy.insert(
                name.clone(),
                view.records
                    .iter()
                    .map(|r| r.get(&companion).as_text().map(str::to_string))
                    .collect(),
            );
            values.insert(
                name,
                view.records.iter().map(|r| r.number(column)).collect(),
            );
        }

        Self {
            by_index: view
                .records
                .first()
                .is_some_and(|r| matches!(r.period, Period::Label(_))),
            axis: view.records.iter().map(|r| r.period.axis_label()).collect(),
            xs,
            values,
            yoy,
            percent: spec.view.has_gate(ColumnGate::Unit(UnitMode::Percent))
                && state.unit_mode == UnitMode::Percent,
            unit: spec.unit.to_string(),
        }
    }

    pub fn is_percent(&self) -> bool {
        self.percent
    }

    fn nearest(&self, x: f64) -> Option<usize> {
        self.xs.iter().position(|v| (v - x).abs() < 0.5)
    }

    pub fn format_value(&self, value: f64) -> String {
        if self.percent {
            format!("{:.1}%", value * 100.0)
        } else {
            format!("{:.1} {}", value, self.unit)
        }
    }

    /// Tick label for an x grid mark; blank between periods.
    pub fn axis_label(&self, value: f64) -> String {
        let rounded = value.round();
        if (value - rounded).abs() > 1e-6 {
            return String::new();
        }
        if self.by_index {
            if rounded < 0.0 {
                return String::new();
            }
            self.axis.get(rounded as usize).cloned().unwrap_or_default()
        } else {
            format!("{:.0}", rounded)
        }
    }

    /// Hover text for a series at a plot point. Shows the record's own value rather
    /// than the stacked height, plus the year-over-year delta when there is one.
    pub fn label(&self, name: &str, point: &PlotPoint) -> String {
        let Some(idx) = self.nearest(point.x) else {
            return String::new();
        };
        let period = &self.axis[idx];
        if name.is_empty() {
            return period.clone();
        }

        let value = self
            .values
            .get(name)
            .and_then(|v| v[idx])
            .unwrap_or(point.y);
        let mut text = format!("{}\n{}: {}", period, name, self.format_value(value));
        if let Some(Some(delta)) = self.yoy.get(name).map(|v| &v[idx]) {
            text.push_str(&format!(" (YoY: {})", delta));
        }
        text
    }
}

/// Creates energy time-series charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Color, width and style for a series by its column group.
    pub fn series_style(spec: &DatasetSpec, column: &str) -> (Color32, f32, LineStyle) {
        match spec.view.locate(column) {
            Some((ColumnGate::Always, i)) => {
                let style = if i >= 2 {
                    LineStyle::dashed_loose()
                } else {
                    LineStyle::Solid
                };
                (CORE_COLORS[i % CORE_COLORS.len()], 3.0, style)
            }
            Some((ColumnGate::Forecasts, _)) => (AGENCY_COLOR, 1.5, LineStyle::Solid),
            Some((ColumnGate::Sources, i)) => {
                (PALETTE[i % PALETTE.len()], 2.0, LineStyle::dashed_dense())
            }
            Some((_, i)) => (PALETTE[i % PALETTE.len()], 2.0, LineStyle::Solid),
            None => (Color32::GRAY, 1.5, LineStyle::Solid),
        }
    }

    fn plot(id: String, hover: &HoverTable) -> Plot<'_> {
        let ticks = hover.clone();
        let tooltips = hover.clone();
        let mut plot = Plot::new(id)
            .height(PLOT_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_formatter(move |mark, _range| ticks.axis_label(mark.value))
            .label_formatter(move |name, point| tooltips.label(name, point));
        if hover.is_percent() {
            plot = plot
                .include_y(0.0)
                .include_y(1.0)
                .y_axis_formatter(|mark, _range| format!("{:.0}%", mark.value * 100.0));
        } else {
            plot = plot.y_axis_label(hover.unit.clone());
        }
        plot
    }

    /// Multi-series line chart, one line per plotted column.
    pub fn draw_line_chart(
        ui: &mut egui::Ui,
        spec: &DatasetSpec,
        view: &FilteredView,
        hover: &HoverTable,
    ) {
        let xs = x_positions(&view.records);
        Self::plot(format!("line_{:?}", spec.id), hover).show(ui, |plot_ui| {
            for column in &view.columns {
                let (color, width, style) = Self::series_style(spec, column);
                let name = spec.display_name(column);
                for run in segments(&xs, &view.records, column) {
                    plot_ui.line(
                        Line::new(PlotPoints::from_iter(run.iter().copied()))
                            .name(&name)
                            .color(color)
                            .width(width)
                            .style(style),
                    );
                }
            }
        });
    }

    /// Stacked area chart with optional overlay bands and labelled markers.
    pub fn draw_stacked_area(
        ui: &mut egui::Ui,
        spec: &DatasetSpec,
        view: &FilteredView,
        state: &ToggleState,
        bands: &[Band],
        hover: &HoverTable,
    ) {
        let xs = x_positions(&view.records);
        let layers = stacked(&xs, &view.records, &view.columns);
        let top = if hover.is_percent() {
            1.0
        } else {
            layers
                .last()
                .map(|l| l.iter().map(|p| p[1]).fold(0.0, f64::max))
                .unwrap_or(0.0)
        };

        Self::plot(format!("area_{:?}", spec.id), hover).show(ui, |plot_ui| {
            if state.show_bands && spec.overlay_bands {
                Self::draw_bands(plot_ui, bands, top);
            }

            // Top layer first so lower layers paint over its fill.
            for (i, layer) in layers.iter().enumerate().rev() {
                let color = PALETTE[i % PALETTE.len()];
                plot_ui.line(
                    Line::new(PlotPoints::from_iter(layer.iter().copied()))
                        .name(spec.display_name(&view.columns[i]))
                        .color(color)
                        .fill(0.0_f32)
                        .width(1.5),
                );
            }

            for marker in &spec.markers {
                plot_ui.vline(
                    VLine::new(marker.at)
                        .color(MARKER_COLOR)
                        .style(LineStyle::dashed_dense()),
                );
                plot_ui.text(
                    Text::new(PlotPoint::new(marker.at, top), marker.label.as_str())
                        .color(MARKER_COLOR)
                        .anchor(Align2::CENTER_BOTTOM),
                );
            }
        });
    }

    fn draw_bands(plot_ui: &mut PlotUi, bands: &[Band], top: f64) {
        for band in bands {
            let outline = vec![
                [band.start, 0.0],
                [band.end, 0.0],
                [band.end, top],
                [band.start, top],
            ];
            plot_ui.polygon(
                Polygon::new(PlotPoints::from_iter(outline))
                    .fill_color(BAND_FILL)
                    .name(band.label.as_deref().unwrap_or("Incentive window")),
            );
        }
    }

    /// Stacked bar chart; a missing value contributes an empty segment.
    pub fn draw_stacked_bars(
        ui: &mut egui::Ui,
        spec: &DatasetSpec,
        view: &FilteredView,
        hover: &HoverTable,
    ) {
        let xs = x_positions(&view.records);
        Self::plot(format!("bars_{:?}", spec.id), hover).show(ui, |plot_ui| {
            let mut charts: Vec<BarChart> = Vec::new();
            for column in &view.columns {
                let (color, _, _) = Self::series_style(spec, column);
                let bars: Vec<Bar> = xs
                    .iter()
                    .zip(&view.records)
                    .map(|(x, r)| Bar::new(*x, r.number(column).unwrap_or(0.0)).width(0.6))
                    .collect();
                let below: Vec<&BarChart> = charts.iter().collect();
                let chart = BarChart::new(bars)
                    .name(spec.display_name(column))
                    .color(color)
                    .stack_on(&below);
                charts.push(chart);
            }
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::data::catalog::spec;
    use crate::data::record::Value;
    use crate::data::DatasetId;
    use crate::view::ViewSelector;

    fn record(period: Period, fields: &[(&str, Value)]) -> Record {
        let mut r = Record::new(period);
        for (k, v) in fields {
            r.insert(*k, v.clone());
        }
        r
    }

    #[test]
    fn missing_values_break_lines() {
        let records = vec![
            record(Period::Year(2020.0), &[("Coal", Value::Number(1.0))]),
            record(Period::Year(2021.0), &[("Coal", Value::Missing)]),
            record(Period::Year(2022.0), &[("Coal", Value::Number(3.0))]),
            record(Period::Year(2023.0), &[("Coal", Value::Number(4.0))]),
        ];
        let xs = x_positions(&records);
        assert_eq!(
            segments(&xs, &records, "Coal"),
            vec![vec![[2020.0, 1.0]], vec![[2022.0, 3.0], [2023.0, 4.0]]]
        );
    }

    #[test]
    fn labels_plot_by_index() {
        let records = vec![
            record(Period::Label("2023 Q1".into()), &[]),
            record(Period::Label("2023 Q4".into()), &[]),
        ];
        assert_eq!(x_positions(&records), vec![0.0, 1.0]);
    }

    #[test]
    fn stacking_accumulates_and_skips_gaps() {
        let records = vec![
            record(
                Period::Year(2020.0),
                &[("A", Value::Number(1.0)), ("B", Value::Number(2.0))],
            ),
            record(
                Period::Year(2021.0),
                &[("A", Value::Number(1.0)), ("B", Value::Missing)],
            ),
        ];
        let xs = x_positions(&records);
        let columns = vec!["A".to_string(), "B".to_string()];
        assert_eq!(
            stacked(&xs, &records, &columns),
            vec![vec![[2020.0, 1.0]], vec![[2020.0, 3.0]]]
        );
    }

    #[test]
    fn hover_shows_value_and_yoy() {
        let spec = spec(DatasetId::DemandForecast, &DashboardConfig::default());
        let records = vec![
            record(
                Period::Year(2024.0),
                &[
                    ("Coal_TWh", Value::Number(240.0)),
                    ("Coal_TWh_yoy", Value::Text("–".into())),
                ],
            ),
            record(
                Period::Year(2025.0),
                &[
                    ("Coal_TWh", Value::Number(264.0)),
                    ("Coal_TWh_yoy", Value::Text("10.0%".into())),
                ],
            ),
        ];
        let state = ToggleState::default().with_view_mode(crate::view::ViewMode::Detail);
        let view = ViewSelector::apply(&records, &spec.view, &state);
        let hover = HoverTable::new(&spec, &view, &state);

        assert_eq!(
            hover.label("Coal", &PlotPoint::new(2025.0, 0.0)),
            "2025\nCoal: 264.0 TWh (YoY: 10.0%)"
        );
        assert_eq!(hover.label("", &PlotPoint::new(2024.1, 0.0)), "2024");
        assert_eq!(hover.label("Coal", &PlotPoint::new(1990.0, 0.0)), "");
        assert_eq!(hover.axis_label(2024.0), "2024");
        assert_eq!(hover.axis_label(2024.5), "");
    }

    #[test]
    fn percent_mode_formats_shares() {
        let spec = spec(DatasetId::FossilToClean, &DashboardConfig::default());
        let records = vec![record(
            Period::Year(2022.0),
            &[("Coal_pct", Value::Number(0.4))],
        )];
        let state = spec.view.default_toggles();
        let view = ViewSelector::apply(&records, &spec.view, &state);
        let hover = HoverTable::new(&spec, &view, &state);
        assert!(hover.is_percent());
        assert_eq!(
            hover.label("Coal", &PlotPoint::new(2022.0, 0.9)),
            "2022\nCoal: 40.0%"
        );
    }

    #[test]
    fn quarter_ticks_use_labels() {
        let spec = spec(DatasetId::SeasonalSources, &DashboardConfig::default());
        let records = vec![
            record(Period::Label("2023 Q1".into()), &[]),
            record(Period::Label("2023 Q4".into()), &[]),
        ];
        let state = spec.view.default_toggles();
        let view = ViewSelector::apply(&records, &spec.view, &state);
        let hover = HoverTable::new(&spec, &view, &state);
        assert_eq!(hover.axis_label(1.0), "Q4 2023");
        assert_eq!(hover.axis_label(2.0), "");
        assert_eq!(hover.axis_label(-1.0), "");
    }
}
