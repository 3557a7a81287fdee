//! Chart Viewer Widget
//! One card per dataset: title, toggles, load status and the chart itself.
//! The filtered view is recomputed only when the data or the toggles change.

use crate::charts::{ChartPlotter, HoverTable};
use crate::data::{Band, ChartKind, Dataset, DatasetId, DatasetSpec, LoadSlot, LoadStatus};
use crate::gui::ControlPanel;
use crate::view::{FilteredView, ToggleState, ViewSelector};
use egui::{Color32, RichText};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

const CARD_SPACING: f32 = 15.0;

/// Filter output for one card, keyed by the data and toggles it was computed from.
struct CachedView {
    data: Arc<Dataset>,
    state: ToggleState,
    view: FilteredView,
    hover: HoverTable,
}

/// Actions triggered from a chart card
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CardAction {
    None,
    Reload(DatasetId),
    Cancel(DatasetId),
}

pub struct ChartViewer {
    toggles: BTreeMap<DatasetId, ToggleState>,
    cache: BTreeMap<DatasetId, CachedView>,
}

impl ChartViewer {
    pub fn new(specs: &[DatasetSpec]) -> Self {
        Self {
            toggles: specs
                .iter()
                .map(|s| (s.id, s.view.default_toggles()))
                .collect(),
            cache: BTreeMap::new(),
        }
    }

    fn refresh(&mut self, spec: &DatasetSpec, data: Arc<Dataset>, state: &ToggleState) {
        let fresh = self
            .cache
            .get(&spec.id)
            .is_some_and(|c| Arc::ptr_eq(&c.data, &data) && c.state == *state);
        if fresh {
            return;
        }

        let view = ViewSelector::apply(&data.records, &spec.view, state);
        debug!(
            dataset = ?spec.id,
            rows = view.records.len(),
            columns = view.columns.len(),
            "filtered view rebuilt"
        );
        let hover = HoverTable::new(spec, &view, state);
        self.cache.insert(
            spec.id,
            CachedView {
                data,
                state: state.clone(),
                view,
                hover,
            },
        );
    }

    /// Draw one dataset's card.
    pub fn show_card(
        &mut self,
        ui: &mut egui::Ui,
        spec: &DatasetSpec,
        slot: &LoadSlot<Dataset>,
        bands: &LoadSlot<Vec<Band>>,
    ) -> CardAction {
        let mut action = CardAction::None;

        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, Color32::from_gray(90)))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.label(RichText::new(spec.title).size(18.0).strong());
                ui.label(RichText::new(spec.caption).size(12.0).color(Color32::GRAY));
                ui.add_space(8.0);

                let state = self
                    .toggles
                    .entry(spec.id)
                    .or_insert_with(|| spec.view.default_toggles());
                ControlPanel::show_toggles(ui, spec, state, bands.error());
                let state = state.clone();
                ui.add_space(8.0);

                if slot.is_loading() {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading…");
                        if ui.small_button("Cancel").clicked() {
                            action = CardAction::Cancel(spec.id);
                        }
                    });
                } else if let Some(error) = slot.error() {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(format!("⚠ {}", error))
                                .color(Color32::from_rgb(220, 53, 69)),
                        );
                        if ui.small_button("Retry").clicked() {
                            action = CardAction::Reload(spec.id);
                        }
                    });
                } else if *slot.status() == LoadStatus::Ready && slot.data().is_empty() {
                    ui.label(RichText::new("No rows").color(Color32::GRAY));
                }

                self.refresh(spec, slot.data(), &state);
                let Some(cached) = self.cache.get(&spec.id) else {
                    return;
                };

                match spec.chart {
                    ChartKind::Line => {
                        ChartPlotter::draw_line_chart(ui, spec, &cached.view, &cached.hover)
                    }
                    ChartKind::StackedArea => ChartPlotter::draw_stacked_area(
                        ui,
                        spec,
                        &cached.view,
                        &cached.state,
                        &bands.data(),
                        &cached.hover,
                    ),
                    ChartKind::LineAndStackedBar => {
                        ui.columns(2, |cols| {
                            ChartPlotter::draw_line_chart(
                                &mut cols[0],
                                spec,
                                &cached.view,
                                &cached.hover,
                            );
                            ChartPlotter::draw_stacked_bars(
                                &mut cols[1],
                                spec,
                                &cached.view,
                                &cached.hover,
                            );
                        });
                    }
                }
            });

        ui.add_space(CARD_SPACING);
        action
    }
}
