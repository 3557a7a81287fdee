//! Overlay annotations: labelled markers and shaded intervals on the period axis.

use super::loader::{DataLoader, LoaderError};
use std::path::Path;
use tracing::debug;

/// A labelled point on the period axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub at: f64,
    pub label: String,
}

impl Marker {
    pub fn new(at: f64, label: impl Into<String>) -> Self {
        Self {
            at,
            label: label.into(),
        }
    }
}

/// A shaded interval on the period axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub start: f64,
    pub end: f64,
    pub label: Option<String>,
}

/// Parse the interval dataset. Rows lacking either bound are skipped; reversed
/// bounds are swapped.
pub fn parse_bands(text: &str) -> Result<Vec<Band>, LoaderError> {
    let table = DataLoader::read_table(text)?;
    let start_col = table.position("start");
    let end_col = table.position("end");
    let label_col = table.position("label");

    let mut bands = Vec::new();
    for row in 0..table.height() {
        let bound = |col: Option<usize>| {
            col.and_then(|c| DataLoader::coerce_cell(table.cell(row, c), false).as_number())
        };
        let (Some(start), Some(end)) = (bound(start_col), bound(end_col)) else {
            continue;
        };
        let label = label_col
            .and_then(|c| table.cell(row, c))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        bands.push(Band {
            start: start.min(end),
            end: start.max(end),
            label,
        });
    }

    debug!(bands = bands.len(), "parsed overlay bands");
    Ok(bands)
}

pub fn load_bands(path: &Path) -> Result<Vec<Band>, LoaderError> {
    let text = DataLoader::read_text(path)?;
    parse_bands(&text)
}
