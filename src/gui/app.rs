//! Energy Dashboard Main Application
//! Main window with control panel and chart cards. Dataset loads run on a
//! background thread and are applied as they arrive.

use crate::config::DashboardConfig;
use crate::data::annotation::load_bands;
use crate::data::catalog::{catalog, INCENTIVES_FILE};
use crate::data::{
    Band, Dataset, DatasetId, DatasetSpec, DatasetStore, LoadSlot, LoadTicket, LoaderError,
};
use crate::gui::{CardAction, ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use tracing::info;

/// Loading result from background thread
enum LoadResult {
    Dataset {
        id: DatasetId,
        ticket: LoadTicket,
        result: Result<Dataset, LoaderError>,
    },
    Bands {
        ticket: LoadTicket,
        result: Result<Vec<Band>, LoaderError>,
    },
}

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    specs: Vec<DatasetSpec>,
    store: DatasetStore,
    bands: LoadSlot<Vec<Band>>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    load_tx: Sender<LoadResult>,
    load_rx: Receiver<LoadResult>,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let specs = catalog(&config);
        let (load_tx, load_rx) = channel();
        let mut app = Self {
            chart_viewer: ChartViewer::new(&specs),
            config,
            specs,
            store: DatasetStore::new(),
            bands: LoadSlot::new(),
            control_panel: ControlPanel::new(),
            load_tx,
            load_rx,
        };
        app.start_load_all();
        app
    }

    /// Load every dataset and the overlay bands. Datasets load in parallel; each
    /// result is sent back as soon as it is ready.
    fn start_load_all(&mut self) {
        let jobs: Vec<(DatasetSpec, LoadTicket)> = self
            .specs
            .iter()
            .map(|spec| (spec.clone(), self.store.begin(spec.id)))
            .collect();
        let bands_ticket = self.bands.begin();
        let data_dir = self.config.data_dir.clone();
        let tx = self.load_tx.clone();
        info!(data_dir = %data_dir.display(), datasets = jobs.len(), "loading all datasets");

        thread::spawn(move || {
            let result = load_bands(&data_dir.join(INCENTIVES_FILE));
            let _ = tx.send(LoadResult::Bands {
                ticket: bands_ticket,
                result,
            });

            jobs.into_par_iter()
                .for_each_with(tx, |tx, (spec, ticket)| {
                    let result = spec.load(&data_dir);
                    let _ = tx.send(LoadResult::Dataset {
                        id: spec.id,
                        ticket,
                        result,
                    });
                });
        });
    }

    /// Reload one dataset. Any load of it still in flight becomes stale.
    fn start_load(&mut self, id: DatasetId) {
        let Some(spec) = self.specs.iter().find(|s| s.id == id).cloned() else {
            return;
        };
        let ticket = self.store.begin(id);
        let data_dir = self.config.data_dir.clone();
        let tx = self.load_tx.clone();
        info!(dataset = ?id, "reloading dataset");

        thread::spawn(move || {
            let result = spec.load(&data_dir);
            let _ = tx.send(LoadResult::Dataset { id, ticket, result });
        });
    }

    /// Handle data folder selection
    fn handle_browse_folder(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_directory(&self.config.data_dir)
            .pick_folder()
        {
            self.set_data_dir(path);
        }
    }

    fn set_data_dir(&mut self, path: PathBuf) {
        info!(data_dir = %path.display(), "data folder changed");
        self.config.data_dir = path;
        self.start_load_all();
    }

    /// Apply finished loads. Stale results are dropped by the store.
    fn check_load_results(&mut self) {
        while let Ok(result) = self.load_rx.try_recv() {
            match result {
                LoadResult::Dataset { id, ticket, result } => {
                    if let Ok(dataset) = &result {
                        info!(dataset = ?id, records = dataset.len(), "dataset loaded");
                    }
                    self.store.complete(id, ticket, result);
                }
                LoadResult::Bands { ticket, result } => {
                    self.bands.complete(ticket, result);
                }
            }
        }
    }

    fn is_loading(&self) -> bool {
        self.store.any_loading() || self.bands.is_loading()
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading() {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        let statuses: Vec<(&str, _)> = self
            .specs
            .iter()
            .filter_map(|spec| {
                self.store
                    .slot(spec.id)
                    .map(|slot| (spec.title, slot.status().clone()))
            })
            .collect();
        let action = SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .show(ui, |ui| {
                        self.control_panel
                            .show(ui, &self.config.data_dir, &statuses)
                    })
                    .inner
            })
            .inner;

        match action {
            ControlPanelAction::BrowseFolder => self.handle_browse_folder(),
            ControlPanelAction::ReloadAll => {
                if !self.is_loading() {
                    self.start_load_all();
                }
            }
            ControlPanelAction::None => {}
        }

        // Central panel - one card per dataset
        let mut card_actions = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for spec in &self.specs {
                        let Some(slot) = self.store.slot(spec.id) else {
                            continue;
                        };
                        card_actions.push(
                            self.chart_viewer
                                .show_card(ui, spec, slot, &self.bands),
                        );
                    }
                });
        });

        for action in card_actions {
            match action {
                CardAction::Reload(id) => self.start_load(id),
                CardAction::Cancel(id) => self.store.detach(id),
                CardAction::None => {}
            }
        }
    }
}
