//! Control Panel Widget
//! Left side panel with the data source controls, plus the per-chart toggle row.

use crate::data::{DatasetSpec, LoadStatus};
use crate::view::{ColumnGate, Season, ToggleState, UnitMode, ViewMode};
use egui::{Color32, RichText};
use std::path::Path;

/// Left side control panel with data folder selection and load status.
#[derive(Default)]
pub struct ControlPanel;

impl ControlPanel {
    pub fn new() -> Self {
        Self
    }

    /// Draw the control panel
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        data_dir: &Path,
        statuses: &[(&str, LoadStatus)],
    ) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("⚡ Energy Dashboard")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Demand, supply mix and forecasts")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Folder").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(data_dir.display().to_string())
                            .size(12.0)
                            .color(if data_dir.is_dir() {
                                Color32::WHITE
                            } else {
                                Color32::GRAY
                            }),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseFolder;
                        }
                    });
                });
            });

        ui.add_space(10.0);

        ui.vertical_centered(|ui| {
            let busy = statuses.iter().any(|(_, s)| *s == LoadStatus::Loading);
            ui.add_enabled_ui(!busy, |ui| {
                let button = egui::Button::new(RichText::new("⟳ Reload All").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ReloadAll;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        ui.label(RichText::new("📊 Datasets").size(14.0).strong());
        ui.add_space(5.0);

        for (title, status) in statuses {
            let color = match status {
                LoadStatus::Ready => Color32::from_rgb(40, 167, 69),
                LoadStatus::Failed(_) => Color32::from_rgb(220, 53, 69),
                LoadStatus::Idle | LoadStatus::Loading => Color32::GRAY,
            };
            ui.label(RichText::new(*title).size(12.0));
            ui.label(RichText::new(status_label(status)).size(11.0).color(color));
            ui.add_space(4.0);
        }

        action
    }

    /// Draw the toggle controls one chart offers. Only controls whose column groups
    /// exist in the chart's view are shown.
    pub fn show_toggles(
        ui: &mut egui::Ui,
        spec: &DatasetSpec,
        state: &mut ToggleState,
        bands_error: Option<&str>,
    ) {
        let view = &spec.view;
        let has_sources = view.has_gate(ColumnGate::Sources);
        let has_forecasts = view.has_gate(ColumnGate::Forecasts);

        ui.horizontal_wrapped(|ui| {
            if has_sources || has_forecasts {
                for (mode, label) in [(ViewMode::Summary, "Summary"), (ViewMode::Detail, "Detail")] {
                    if ui.selectable_label(state.view_mode() == mode, label).clicked() {
                        state.set_view_mode(mode);
                    }
                }
                ui.separator();
            }
            if has_sources {
                ui.checkbox(&mut state.show_sources, "Sources");
            }
            if has_forecasts {
                ui.checkbox(&mut state.show_forecasts, "Forecasts");
            }
            if view.has_gate(ColumnGate::Unit(UnitMode::Percent)) {
                ui.radio_value(&mut state.unit_mode, UnitMode::Absolute, spec.unit);
                ui.radio_value(&mut state.unit_mode, UnitMode::Percent, "% share");
            }
            if spec.overlay_bands {
                ui.checkbox(&mut state.show_bands, "Incentive windows");
                if let Some(error) = bands_error {
                    ui.label(
                        RichText::new(format!("⚠ {}", error))
                            .size(11.0)
                            .color(Color32::from_rgb(220, 53, 69)),
                    );
                }
            }
        });

        if view.seasonal {
            ui.horizontal(|ui| {
                for season in [Season::Winter, Season::Summer] {
                    if ui
                        .selectable_label(state.season == Some(season), season.label())
                        .clicked()
                    {
                        state.season = Some(season);
                    }
                }
            });
        }

        let all = view.selectable_fields();
        if !all.is_empty() {
            ui.horizontal_wrapped(|ui| {
                for field in &all {
                    let mut on = state.is_selected(field);
                    if ui.checkbox(&mut on, spec.display_name(field)).changed() {
                        state.toggle_series(field);
                    }
                }
                if ui.small_button("Toggle All").clicked() {
                    state.toggle_all_series(&all);
                }
            });
        }
    }
}

/// Side-panel status word. The error text itself is shown on the dataset's card.
fn status_label(status: &LoadStatus) -> &'static str {
    match status {
        LoadStatus::Idle => "idle",
        LoadStatus::Loading => "loading…",
        LoadStatus::Ready => "ready",
        LoadStatus::Failed(_) => "failed",
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseFolder,
    ReloadAll,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_status_row_omits_error_text() {
        let status = LoadStatus::Failed("Failed to read chart2.csv: not found".to_string());
        assert_eq!(status_label(&status), "failed");
        assert!(!status_label(&status).contains("chart2.csv"));
    }

    #[test]
    fn status_words() {
        assert_eq!(status_label(&LoadStatus::Idle), "idle");
        assert_eq!(status_label(&LoadStatus::Loading), "loading…");
        assert_eq!(status_label(&LoadStatus::Ready), "ready");
    }
}
