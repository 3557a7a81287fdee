//! Record Model
//! Typed rows produced by the loader and consumed by the processor and view filter.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

static MISSING: Value = Value::Missing;

/// A single cell after coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    /// Absent from computation. Serializes as `null`.
    Missing,
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

/// Quarter token of a composite period label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    /// Exact token match, `"Q1"`..`"Q4"`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Q1" => Some(Quarter::Q1),
            "Q2" => Some(Quarter::Q2),
            "Q3" => Some(Quarter::Q3),
            "Q4" => Some(Quarter::Q4),
            _ => None,
        }
    }
}

/// Time-axis key of a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Period {
    Year(f64),
    /// Composite `"<year> <quarter>"` label, kept verbatim (trimmed).
    Label(String),
}

impl Period {
    /// Split a composite label on whitespace into its year and quarter tokens.
    pub fn label_parts(&self) -> Option<(&str, &str)> {
        let Period::Label(label) = self else {
            return None;
        };
        let mut parts = label.split_whitespace();
        let year = parts.next()?;
        let quarter = parts.next()?;
        Some((year, quarter))
    }

    /// Quarter of a composite label, if the quarter token is one of `Q1`..`Q4`.
    pub fn quarter(&self) -> Option<Quarter> {
        self.label_parts()
            .and_then(|(_, quarter)| Quarter::from_token(quarter))
    }

    /// Numeric year of the period, for either key kind.
    pub fn year(&self) -> Option<f64> {
        match self {
            Period::Year(y) => Some(*y),
            Period::Label(_) => self
                .label_parts()
                .and_then(|(year, _)| year.parse::<f64>().ok())
                .filter(|y| y.is_finite()),
        }
    }

    /// Axis label: `"2023"` for years, `"Q4 2023"` for composite labels.
    pub fn axis_label(&self) -> String {
        match self {
            Period::Year(y) => format!("{}", y),
            Period::Label(label) => match self.label_parts() {
                Some((year, quarter)) => format!("{} {}", quarter, year),
                None => label.clone(),
            },
        }
    }

    pub(crate) fn cmp_years(a: &Period, b: &Period) -> Ordering {
        match (a.year(), b.year()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        }
    }
}

/// One typed row keyed by its period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub period: Period,
    pub fields: HashMap<String, Value>,
}

impl Record {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            fields: HashMap::new(),
        }
    }

    /// Field value, `Missing` when the key is absent.
    pub fn get(&self, key: &str) -> &Value {
        self.fields.get(key).unwrap_or(&MISSING)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).as_number()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }
}

/// Ordered record sequence plus its column order (header order, then derived fields).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}
