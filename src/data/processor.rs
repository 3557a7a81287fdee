//! Data Processor Module
//! Unit conversion and derived fields (percent shares, year-over-year deltas).

use super::record::{Dataset, Record, Value};

/// Suffix of the text field written by a year-over-year transform.
pub const YOY_SUFFIX: &str = "_yoy";

/// Placeholder for an undefined year-over-year delta.
pub const DEFAULT_PLACEHOLDER: &str = "–";

/// One per-field transform.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// Multiply `fields` (minus `exclude`) by `factor`. With a suffix the result is
    /// written to `<field><suffix>` and excluded fields are copied across unscaled;
    /// without one the fields are rewritten in place.
    Scale {
        factor: f64,
        fields: Vec<String>,
        exclude: Vec<String>,
        suffix: Option<String>,
    },
    /// Each member divided by the group sum, written to `<field><suffix>`.
    PercentOfTotal { group: Vec<String>, suffix: String },
    /// Percent change against the preceding record, written to `<field>_yoy` as text.
    YoyPercent { fields: Vec<String> },
}

impl Transform {
    fn is_scale(&self) -> bool {
        matches!(self, Transform::Scale { .. })
    }

    /// Columns this transform adds to a dataset.
    pub fn output_columns(&self) -> Vec<String> {
        match self {
            Transform::Scale {
                fields,
                suffix: Some(suffix),
                ..
            } => fields.iter().map(|f| format!("{f}{suffix}")).collect(),
            Transform::Scale { suffix: None, .. } => Vec::new(),
            Transform::PercentOfTotal { group, suffix } => {
                group.iter().map(|f| format!("{f}{suffix}")).collect()
            }
            Transform::YoyPercent { fields } => {
                fields.iter().map(|f| format!("{f}{YOY_SUFFIX}")).collect()
            }
        }
    }
}

/// Ordered transform list for one dataset. Scale steps always run first so that
/// derivations see the converted magnitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformConfig {
    steps: Vec<Transform>,
    placeholder: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl TransformConfig {
    pub fn new(steps: Vec<Transform>) -> Self {
        let (mut ordered, derived): (Vec<_>, Vec<_>) =
            steps.into_iter().partition(Transform::is_scale);
        ordered.extend(derived);
        Self {
            steps: ordered,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn steps(&self) -> &[Transform] {
        &self.steps
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }
}

/// Applies transform configurations to parsed datasets.
pub struct DataProcessor;

impl DataProcessor {
    /// Build the augmented dataset. Output is one-to-one with the input records and
    /// in the same order; the input is left untouched.
    pub fn normalize(dataset: &Dataset, config: &TransformConfig) -> Dataset {
        let mut out = dataset.clone();

        for step in config.steps() {
            match step {
                Transform::Scale {
                    factor,
                    fields,
                    exclude,
                    suffix,
                } => {
                    for record in &mut out.records {
                        Self::apply_scale(record, *factor, fields, exclude, suffix.as_deref());
                    }
                }
                Transform::PercentOfTotal { group, suffix } => {
                    for record in &mut out.records {
                        Self::apply_percent_of_total(record, group, suffix);
                    }
                }
                Transform::YoyPercent { fields } => {
                    Self::apply_yoy(&mut out.records, fields, config.placeholder());
                }
            }

            for column in step.output_columns() {
                if !out.has_column(&column) {
                    out.columns.push(column);
                }
            }
        }

        out
    }

    pub fn scale_value(value: &Value, factor: f64) -> Value {
        match value {
            Value::Number(v) => Value::Number(v * factor),
            other => other.clone(),
        }
    }

    /// Shares of the group total, `None` for every member when a member is missing
    /// or the total is zero.
    pub fn shares(values: &[Option<f64>]) -> Option<Vec<f64>> {
        let values: Vec<f64> = values.iter().copied().collect::<Option<_>>()?;
        let total: f64 = values.iter().sum();
        if total == 0.0 || !total.is_finite() {
            return None;
        }
        Some(values.iter().map(|v| v / total).collect())
    }

    /// `((current - previous) / previous) * 100`, undefined without both values or
    /// with a zero previous.
    pub fn yoy_percent(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
        let (current, previous) = (current?, previous?);
        if previous == 0.0 {
            return None;
        }
        Some((current - previous) / previous * 100.0)
    }

    pub fn format_percent(pct: f64) -> String {
        format!("{:.1}%", pct)
    }

    fn apply_scale(
        record: &mut Record,
        factor: f64,
        fields: &[String],
        exclude: &[String],
        suffix: Option<&str>,
    ) {
        for field in fields {
            let excluded = exclude.contains(field);
            let source = record.get(field);
            let value = if excluded {
                source.clone()
            } else {
                Self::scale_value(source, factor)
            };
            match suffix {
                Some(suffix) => record.insert(format!("{field}{suffix}"), value),
                None if !excluded => record.insert(field.clone(), value),
                None => {}
            }
        }
    }

    fn apply_percent_of_total(record: &mut Record, group: &[String], suffix: &str) {
        let values: Vec<Option<f64>> = group.iter().map(|f| record.number(f)).collect();
        let shares = Self::shares(&values);
        for (i, field) in group.iter().enumerate() {
            let value = shares
                .as_ref()
                .map(|s| Value::Number(s[i]))
                .unwrap_or(Value::Missing);
            record.insert(format!("{field}{suffix}"), value);
        }
    }

    fn apply_yoy(records: &mut [Record], fields: &[String], placeholder: &str) {
        for field in fields {
            let series: Vec<Option<f64>> = records.iter().map(|r| r.number(field)).collect();
            for (i, record) in records.iter_mut().enumerate() {
                let previous = i.checked_sub(1).and_then(|p| series[p]);
                let text = Self::yoy_percent(series[i], previous)
                    .map(Self::format_percent)
                    .unwrap_or_else(|| placeholder.to_string());
                record.insert(format!("{field}{YOY_SUFFIX}"), Value::Text(text));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::Period;

    fn dataset(rows: &[(f64, &[(&str, Value)])]) -> Dataset {
        let mut columns = vec!["Year".to_string()];
        let records = rows
            .iter()
            .map(|(year, fields)| {
                let mut r = Record::new(Period::Year(*year));
                r.insert("Year", Value::Number(*year));
                for (k, v) in fields.iter() {
                    if !columns.iter().any(|c| c == k) {
                        columns.push(k.to_string());
                    }
                    r.insert(*k, v.clone());
                }
                r
            })
            .collect();
        Dataset { columns, records }
    }

    fn names(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn scale_skips_excluded_fields() {
        let ds = dataset(&[(
            2020.0,
            &[("Coal", Value::Number(10.0)), ("Solar", Value::Number(10.0))],
        )]);
        let config = TransformConfig::new(vec![Transform::Scale {
            factor: 24.0,
            fields: names(&["Coal", "Solar"]),
            exclude: names(&["Solar"]),
            suffix: None,
        }]);

        let out = DataProcessor::normalize(&ds, &config);
        assert_eq!(out.records[0].number("Coal"), Some(240.0));
        assert_eq!(out.records[0].number("Solar"), Some(10.0));
        assert_eq!(ds.records[0].number("Coal"), Some(10.0));
    }

    #[test]
    fn scale_with_suffix_adds_columns() {
        let ds = dataset(&[(2020.0, &[("Coal", Value::Number(2_000_000.0))])]);
        let config = TransformConfig::new(vec![Transform::Scale {
            factor: 1e-6,
            fields: names(&["Coal"]),
            exclude: Vec::new(),
            suffix: Some("_TWh".to_string()),
        }]);

        let out = DataProcessor::normalize(&ds, &config);
        assert_eq!(out.records[0].number("Coal"), Some(2_000_000.0));
        assert_eq!(out.records[0].number("Coal_TWh"), Some(2.0));
        assert_eq!(out.columns, names(&["Year", "Coal", "Coal_TWh"]));
    }

    #[test]
    fn yoy_formats_one_decimal() {
        let ds = dataset(&[
            (2020.0, &[("Coal", Value::Number(100.0))]),
            (2021.0, &[("Coal", Value::Number(110.0))]),
        ]);
        let config = TransformConfig::new(vec![Transform::YoyPercent {
            fields: names(&["Coal"]),
        }]);

        let out = DataProcessor::normalize(&ds, &config);
        assert_eq!(out.records[0].get("Coal_yoy"), &Value::Text("–".to_string()));
        assert_eq!(out.records[1].get("Coal_yoy"), &Value::Text("10.0%".to_string()));
    }

    #[test]
    fn yoy_guards_missing_and_zero_previous() {
        let ds = dataset(&[
            (2019.0, &[("Coal", Value::Number(0.0))]),
            (2020.0, &[("Coal", Value::Number(50.0))]),
            (2021.0, &[("Coal", Value::Missing)]),
            (2022.0, &[("Coal", Value::Number(80.0))]),
        ]);
        let config = TransformConfig::new(vec![Transform::YoyPercent {
            fields: names(&["Coal"]),
        }])
        .with_placeholder("n/a");

        let out = DataProcessor::normalize(&ds, &config);
        let yoy: Vec<_> = out
            .records
            .iter()
            .map(|r| r.get("Coal_yoy").as_text().unwrap().to_string())
            .collect();
        assert_eq!(yoy, vec!["n/a", "n/a", "n/a", "n/a"]);
    }

    #[test]
    fn percent_of_total_divides_by_group_sum() {
        let ds = dataset(&[(
            2020.0,
            &[("Coal", Value::Number(1.0)), ("Gas", Value::Number(3.0))],
        )]);
        let config = TransformConfig::new(vec![Transform::PercentOfTotal {
            group: names(&["Coal", "Gas"]),
            suffix: "_pct".to_string(),
        }]);

        let out = DataProcessor::normalize(&ds, &config);
        assert_eq!(out.records[0].number("Coal_pct"), Some(0.25));
        assert_eq!(out.records[0].number("Gas_pct"), Some(0.75));
    }

    #[test]
    fn percent_of_zero_total_is_missing() {
        let ds = dataset(&[
            (
                2020.0,
                &[("Coal", Value::Number(0.0)), ("Gas", Value::Number(0.0))],
            ),
            (
                2021.0,
                &[("Coal", Value::Number(5.0)), ("Gas", Value::Missing)],
            ),
        ]);
        let config = TransformConfig::new(vec![Transform::PercentOfTotal {
            group: names(&["Coal", "Gas"]),
            suffix: "_pct".to_string(),
        }]);

        let out = DataProcessor::normalize(&ds, &config);
        for record in &out.records {
            assert!(record.get("Coal_pct").is_missing());
            assert!(record.get("Gas_pct").is_missing());
        }
    }

    #[test]
    fn scale_runs_before_derivations() {
        let ds = dataset(&[
            (
                2020.0,
                &[("Coal", Value::Number(1.0)), ("Gas", Value::Number(1.0))],
            ),
        ]);
        // Listed out of order on purpose.
        let config = TransformConfig::new(vec![
            Transform::PercentOfTotal {
                group: names(&["Coal", "Gas"]),
                suffix: "_pct".to_string(),
            },
            Transform::Scale {
                factor: 3.0,
                fields: names(&["Coal"]),
                exclude: Vec::new(),
                suffix: None,
            },
        ]);

        assert!(matches!(config.steps()[0], Transform::Scale { .. }));
        let out = DataProcessor::normalize(&ds, &config);
        assert_eq!(out.records[0].number("Coal_pct"), Some(0.75));
    }

    #[test]
    fn yoy_sees_scaled_values() {
        let ds = dataset(&[
            (2020.0, &[("Coal", Value::Number(1.0))]),
            (2021.0, &[("Coal", Value::Number(2.0))]),
        ]);
        let config = TransformConfig::new(vec![
            Transform::YoyPercent {
                fields: names(&["Coal"]),
            },
            Transform::Scale {
                factor: 24.0,
                fields: names(&["Coal"]),
                exclude: Vec::new(),
                suffix: None,
            },
        ]);

        let out = DataProcessor::normalize(&ds, &config);
        assert_eq!(out.records[1].number("Coal"), Some(48.0));
        assert_eq!(out.records[1].get("Coal_yoy"), &Value::Text("100.0%".to_string()));
        assert_eq!(out.len(), ds.len());
    }
}
