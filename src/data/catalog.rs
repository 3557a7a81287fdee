//! Dataset Catalog
//! The chart datasets: where they live, how they parse, what they derive and how
//! their columns are gated.

use super::annotation::Marker;
use super::loader::{DataLoader, LoaderError, ParseOptions, PeriodColumn, ZeroPolicy};
use super::processor::{DataProcessor, Transform, TransformConfig, YOY_SUFFIX};
use super::record::Dataset;
use crate::config::DashboardConfig;
use crate::view::{ColumnGate, ColumnGroup, UnitMode, ViewSpec};
use std::path::{Path, PathBuf};

/// Interval dataset used for overlay bands.
pub const INCENTIVES_FILE: &str = "incentives.csv";

const DEMAND_AGENCIES: [&str; 11] = [
    "LBNL_high",
    "BCG",
    "EPRI_higher",
    "Jeffries",
    "Goldman_Sachs",
    "McKinsey",
    "IEA",
    "S_P",
    "IEA_2025",
    "EPRI_moderate",
    "EPRI_low",
];

const DEMAND_SOURCES: [&str; 8] = [
    "Coal_TWh",
    "Natural_Gas_TWh",
    "Petroleum_TWh",
    "Nuclear_TWh",
    "Hydro_TWh",
    "Solar_TWh",
    "Wind_TWh",
    "Other_TWh",
];

/// Source columns already reported as annual totals.
const DEMAND_UNSCALED: [&str; 4] = ["Solar_TWh", "Other_TWh", "Nuclear_TWh", "Natural_Gas_TWh"];

const MIX_SOURCES: [&str; 5] = ["Coal", "Gas", "Nuclear", "Solar", "Wind"];
const SEASONAL_SOURCES: [&str; 5] = ["Coal", "Gas", "Wind", "Solar", "Nuclear"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatasetId {
    DemandForecast,
    FossilToClean,
    SeasonalSources,
    DataCenterDemand,
}

impl DatasetId {
    /// Dashboard order.
    pub const ALL: [DatasetId; 4] = [
        DatasetId::FossilToClean,
        DatasetId::SeasonalSources,
        DatasetId::DemandForecast,
        DatasetId::DataCenterDemand,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    StackedArea,
    /// Line and stacked bar side by side over the same rows.
    LineAndStackedBar,
}

/// Everything the pipeline and the chart need to know about one dataset.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    pub id: DatasetId,
    pub title: &'static str,
    pub caption: &'static str,
    pub file_name: &'static str,
    pub parse: ParseOptions,
    pub transforms: TransformConfig,
    pub view: ViewSpec,
    pub chart: ChartKind,
    /// Axis unit for absolute values.
    pub unit: &'static str,
    pub labels: &'static [(&'static str, &'static str)],
    pub markers: Vec<Marker>,
    /// Whether the incentive bands can be overlaid.
    pub overlay_bands: bool,
}

impl DatasetSpec {
    pub fn path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.file_name)
    }

    /// Parse and normalize raw CSV text.
    pub fn build(&self, text: &str) -> Result<Dataset, LoaderError> {
        let parsed = DataLoader::parse(text, &self.parse)?;
        Ok(DataProcessor::normalize(&parsed, &self.transforms))
    }

    /// Read, parse and normalize the dataset from the data directory.
    pub fn load(&self, data_dir: &Path) -> Result<Dataset, LoaderError> {
        let text = DataLoader::read_text(&self.path(data_dir))?;
        self.build(&text)
    }

    /// Legend name of a field.
    pub fn display_name(&self, field: &str) -> String {
        self.labels
            .iter()
            .find(|(key, _)| *key == field)
            .map(|(_, label)| label.to_string())
            .unwrap_or_else(|| default_label(field))
    }
}

/// `Natural_Gas_TWh` → `Natural Gas`, `Coal_pct` → `Coal`.
fn default_label(field: &str) -> String {
    field
        .trim_end_matches("_TWh")
        .trim_end_matches("_pct")
        .replace('_', " ")
}

fn names(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

fn suffixed(fields: &[&str], suffix: &str) -> Vec<String> {
    fields.iter().map(|f| format!("{f}{suffix}")).collect()
}

fn group(gate: ColumnGate, fields: Vec<String>) -> ColumnGroup {
    ColumnGroup {
        gate,
        fields,
        companions: Vec::new(),
    }
}

/// All chart datasets, in dashboard order.
pub fn catalog(config: &DashboardConfig) -> Vec<DatasetSpec> {
    DatasetId::ALL.iter().map(|id| spec(*id, config)).collect()
}

/// One dataset's definition, with any zero-as-missing fields configured for its
/// file taking the place of the built-in zero policy.
pub fn spec(id: DatasetId, config: &DashboardConfig) -> DatasetSpec {
    let mut spec = builtin(id, config);
    if let Some(fields) = config.zero_as_missing.get(spec.file_name) {
        spec.parse.zero_policy = ZeroPolicy::Fields(fields.clone());
    }
    spec
}

fn builtin(id: DatasetId, config: &DashboardConfig) -> DatasetSpec {
    match id {
        DatasetId::DemandForecast => DatasetSpec {
            id,
            title: "Electricity Demand Forecast vs Actual (2013–2030)",
            caption: "Actual demand against the forecast band, with source actuals and agency forecasts.",
            file_name: "jtx_data.csv",
            parse: ParseOptions {
                period: PeriodColumn::Year("Year".to_string()),
                zero_policy: ZeroPolicy::All,
            },
            transforms: TransformConfig::new(vec![
                Transform::Scale {
                    factor: 24.0,
                    fields: names(&DEMAND_SOURCES),
                    exclude: names(&DEMAND_UNSCALED),
                    suffix: None,
                },
                Transform::YoyPercent {
                    fields: names(&DEMAND_SOURCES),
                },
            ])
            .with_placeholder(config.placeholder.clone()),
            view: ViewSpec {
                groups: vec![
                    ColumnGroup::new(
                        ColumnGate::Always,
                        &[
                            "Actual_Demand_TWh",
                            "Forecast_Demand_TWh",
                            "Forecast_Lower_TWh",
                            "Forecast_Upper_TWh",
                        ],
                    ),
                    ColumnGroup::new(ColumnGate::Forecasts, &DEMAND_AGENCIES),
                    ColumnGroup::new(ColumnGate::Sources, &DEMAND_SOURCES)
                        .with_companion(YOY_SUFFIX),
                ],
                actual_cutoff: Some(config.actual_cutoff),
                seasonal: false,
            },
            chart: ChartKind::Line,
            unit: "TWh",
            labels: &[
                ("Actual_Demand_TWh", "Actual Demand"),
                ("Forecast_Demand_TWh", "Forecast Mean"),
                ("Forecast_Lower_TWh", "Forecast -10%"),
                ("Forecast_Upper_TWh", "Forecast +10%"),
                ("LBNL_high", "LBNL High"),
                ("EPRI_higher", "EPRI Higher"),
                ("Goldman_Sachs", "Goldman Sachs"),
                ("S_P", "S&P"),
                ("IEA_2025", "IEA 2025"),
                ("EPRI_moderate", "EPRI Moderate"),
                ("EPRI_low", "EPRI Low"),
            ],
            markers: Vec::new(),
            overlay_bands: false,
        },
        DatasetId::FossilToClean => DatasetSpec {
            id,
            title: "Fossil to Clean Electricity Mix",
            caption: "Coal declines while clean energy nears 40% by 2024, driven by solar and wind growth.",
            file_name: "chart2.csv",
            parse: ParseOptions {
                period: PeriodColumn::Year("Year".to_string()),
                zero_policy: ZeroPolicy::Keep,
            },
            transforms: TransformConfig::new(vec![
                Transform::Scale {
                    factor: 1e-6,
                    fields: names(&MIX_SOURCES),
                    exclude: Vec::new(),
                    suffix: Some("_TWh".to_string()),
                },
                Transform::PercentOfTotal {
                    group: names(&MIX_SOURCES),
                    suffix: "_pct".to_string(),
                },
            ])
            .with_placeholder(config.placeholder.clone()),
            view: ViewSpec {
                groups: vec![
                    group(
                        ColumnGate::Unit(UnitMode::Absolute),
                        suffixed(&MIX_SOURCES, "_TWh"),
                    ),
                    group(
                        ColumnGate::Unit(UnitMode::Percent),
                        suffixed(&MIX_SOURCES, "_pct"),
                    ),
                ],
                actual_cutoff: None,
                seasonal: false,
            },
            chart: ChartKind::StackedArea,
            unit: "TWh",
            labels: &[],
            markers: vec![
                Marker::new(2022.0, "IRA Passed"),
                Marker::new(2024.0, "Clean > 40%"),
            ],
            overlay_bands: true,
        },
        DatasetId::SeasonalSources => DatasetSpec {
            id,
            title: "Seasonal Electricity Generation",
            caption: "Solar drops in winter while gas dominates and wind slightly rises.",
            file_name: "chart6_winter_sources.csv",
            parse: ParseOptions {
                period: PeriodColumn::Label("Label".to_string()),
                zero_policy: ZeroPolicy::Keep,
            },
            transforms: TransformConfig::default().with_placeholder(config.placeholder.clone()),
            view: ViewSpec {
                groups: vec![ColumnGroup::new(ColumnGate::Selectable, &SEASONAL_SOURCES)],
                actual_cutoff: None,
                seasonal: true,
            },
            chart: ChartKind::LineAndStackedBar,
            unit: "MWh",
            labels: &[],
            markers: Vec::new(),
            overlay_bands: false,
        },
        DatasetId::DataCenterDemand => DatasetSpec {
            id,
            title: "Data Center (DC) Electricity Demand vs Total (2014–2030)",
            caption: "DC demand forecast band against total U.S. demand.",
            file_name: "chart7_final_data_cleaned_FIXED.csv",
            parse: ParseOptions {
                period: PeriodColumn::Year("Year".to_string()),
                zero_policy: ZeroPolicy::Keep,
            },
            transforms: TransformConfig::default().with_placeholder(config.placeholder.clone()),
            view: ViewSpec {
                groups: vec![
                    ColumnGroup::new(
                        ColumnGate::Always,
                        &["Total_Demand", "DC_Mean", "DC_Upper", "DC_Lower"],
                    ),
                    ColumnGroup::new(
                        ColumnGate::Sources,
                        &["Coal", "Gas", "Nuclear", "Hydro", "Solar"],
                    ),
                    ColumnGroup::new(ColumnGate::Forecasts, &["EIA", "IEA", "BCG"]),
                ],
                actual_cutoff: None,
                seasonal: false,
            },
            chart: ChartKind::Line,
            unit: "TWh",
            labels: &[
                ("Total_Demand", "Total U.S. Demand"),
                ("DC_Mean", "DC Forecast Mean"),
                ("DC_Upper", "DC Forecast +10%"),
                ("DC_Lower", "DC Forecast -10%"),
                ("EIA", "EIA Forecast"),
                ("IEA", "IEA Forecast"),
                ("BCG", "BCG Forecast"),
            ],
            markers: Vec::new(),
            overlay_bands: false,
        },
    }
}
