//! CSV Data Loader Module
//! Reads raw CSV text with Polars and coerces cells into typed records.

use super::record::{Dataset, Period, Record, Value};
use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace, warn};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read {path}: {source}")]
    Transport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Missing or empty header line")]
    MalformedHeader,
    #[error("Period column '{0}' not found in header")]
    MissingPeriodColumn(String),
}

/// Which column keys the time axis, and how.
#[derive(Debug, Clone, PartialEq)]
pub enum PeriodColumn {
    /// Numeric year. Rows without a finite year are dropped.
    Year(String),
    /// Composite `"<year> <quarter>"` label, retained as text.
    Label(String),
}

impl PeriodColumn {
    pub fn name(&self) -> &str {
        match self {
            PeriodColumn::Year(name) | PeriodColumn::Label(name) => name,
        }
    }
}

/// Whether a numeric zero means "no data" for a field.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ZeroPolicy {
    /// Zero is a true zero everywhere.
    #[default]
    Keep,
    /// Zero is missing for every field.
    All,
    /// Zero is missing only for the listed fields.
    Fields(Vec<String>),
}

impl ZeroPolicy {
    pub fn applies_to(&self, field: &str) -> bool {
        match self {
            ZeroPolicy::Keep => false,
            ZeroPolicy::All => true,
            ZeroPolicy::Fields(fields) => fields.iter().any(|f| f == field),
        }
    }
}

/// Per-dataset parse configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    pub period: PeriodColumn,
    pub zero_policy: ZeroPolicy,
}

/// Header names plus raw string cells, column-major as Polars hands them over.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    columns: Vec<Vec<Option<String>>>,
    height: usize,
}

impl RawTable {
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn position(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Raw cell, `None` for blank or absent trailing cells.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.columns
            .get(col)
            .and_then(|c| c.get(row))
            .and_then(|v| v.as_deref())
    }

    /// One row as (column name, raw cell) pairs in header order.
    pub fn raw_row(&self, row: usize) -> Vec<(&str, Option<&str>)> {
        self.headers
            .iter()
            .enumerate()
            .map(|(col, h)| (h.as_str(), self.cell(row, col)))
            .collect()
    }
}

/// Reads CSV resources and turns them into typed datasets.
pub struct DataLoader;

impl DataLoader {
    /// Read the full text of a CSV resource.
    pub fn read_text(path: &Path) -> Result<String, LoaderError> {
        std::fs::read_to_string(path).map_err(|source| LoaderError::Transport {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Split raw CSV text into header names and string cells.
    ///
    /// Every column is read as a string so coercion stays under our control.
    /// Short rows leave trailing cells empty; long rows are truncated.
    pub fn read_table(text: &str) -> Result<RawTable, LoaderError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let header_line = text.lines().next().unwrap_or_default();
        if header_line.split(',').all(|h| h.trim().trim_matches('"').trim().is_empty()) {
            return Err(LoaderError::MalformedHeader);
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .map_parse_options(|opts| opts.with_truncate_ragged_lines(true))
            .into_reader_with_file_handle(Cursor::new(text.as_bytes().to_vec()))
            .finish()?;

        let mut headers = Vec::with_capacity(df.width());
        let mut columns = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            headers.push(column.name().as_str().trim().to_string());
            let cells: Vec<Option<String>> = column
                .as_materialized_series()
                .str()?
                .into_iter()
                .map(|v| v.map(str::to_owned))
                .collect();
            columns.push(cells);
        }

        Ok(RawTable {
            headers,
            columns,
            height: df.height(),
        })
    }

    /// Parse raw CSV text into an ordered dataset.
    pub fn parse(text: &str, options: &ParseOptions) -> Result<Dataset, LoaderError> {
        let table = Self::read_table(text)?;
        let period_name = options.period.name();
        let period_idx = table
            .position(period_name)
            .ok_or_else(|| LoaderError::MissingPeriodColumn(period_name.to_string()))?;

        let mut records = Vec::with_capacity(table.height());
        let mut dropped = 0usize;

        for row in 0..table.height() {
            let Some(period) = Self::period_of(&options.period, table.cell(row, period_idx))
            else {
                trace!(row = ?table.raw_row(row), "row has no period key");
                dropped += 1;
                continue;
            };

            let mut record = Record::new(period);
            for (col, header) in table.headers.iter().enumerate() {
                let value = if col == period_idx {
                    match &record.period {
                        Period::Year(y) => Value::Number(*y),
                        Period::Label(label) => Value::Text(label.clone()),
                    }
                } else {
                    Self::coerce_cell(
                        table.cell(row, col),
                        options.zero_policy.applies_to(header),
                    )
                };
                record.insert(header.clone(), value);
            }
            records.push(record);
        }

        if dropped > 0 {
            debug!(dropped, column = period_name, "dropped rows without a period key");
        }
        let missing = records
            .iter()
            .flat_map(|r| r.fields.values())
            .filter(|v| v.is_missing())
            .count();
        debug!(records = records.len(), missing, "coerced cells");

        if matches!(options.period, PeriodColumn::Year(_)) {
            Self::order_by_year(&mut records);
        }

        Ok(Dataset {
            columns: table.headers,
            records,
        })
    }

    /// Coerce one raw cell. Thousands separators are stripped first; anything that
    /// is not a finite decimal becomes missing.
    pub fn coerce_cell(raw: Option<&str>, zero_as_missing: bool) -> Value {
        let Some(raw) = raw else {
            return Value::Missing;
        };
        let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
        match cleaned.parse::<f64>() {
            Ok(v) if v.is_finite() => {
                if zero_as_missing && v == 0.0 {
                    Value::Missing
                } else {
                    Value::Number(v)
                }
            }
            _ => Value::Missing,
        }
    }

    fn period_of(column: &PeriodColumn, raw: Option<&str>) -> Option<Period> {
        match column {
            PeriodColumn::Year(_) => Self::coerce_cell(raw, false)
                .as_number()
                .map(Period::Year),
            PeriodColumn::Label(_) => raw
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Period::Label(s.to_string())),
        }
    }

    /// Ascending by year, first occurrence wins on duplicates.
    fn order_by_year(records: &mut Vec<Record>) {
        let sorted = records
            .windows(2)
            .all(|w| Period::cmp_years(&w[0].period, &w[1].period).is_le());
        if !sorted {
            warn!("period keys out of order; sorting ascending");
            records.sort_by(|a, b| Period::cmp_years(&a.period, &b.period));
        }

        let before = records.len();
        records.dedup_by(|later, earlier| later.period == earlier.period);
        if records.len() < before {
            warn!(
                duplicates = before - records.len(),
                "duplicate period keys; keeping first occurrence"
            );
        }
    }
}
