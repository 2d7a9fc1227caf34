//! Data models for Wunderground processing
//!
//! This module contains the tagged cell value produced by field coercion and
//! the column-oriented dataset builder that one station's combine run owns
//! from ingestion through serialization.

use chrono::NaiveDateTime;
use std::collections::HashMap;

// =============================================================================
// Cell Values
// =============================================================================

/// A raw CSV cell after coercion to its most specific usable type.
///
/// Numeric-looking cells become `Number`; everything else stays a trimmed
/// `Text`. Missing samples are represented by the empty-string sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Coerce a raw cell to a trimmed string or a floating-point number.
    ///
    /// Failure to parse as a number is an expected, silent branch.
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(number) => CellValue::Number(number),
            Err(_) => CellValue::Text(trimmed.to_string()),
        }
    }

    /// Numeric-test predicate, independent of coercion
    pub fn is_numeric(raw: &str) -> bool {
        raw.trim().parse::<f64>().is_ok()
    }

    /// The empty-string sentinel used to pad short columns
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    /// Whether this cell carries a number
    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }

    /// The numeric value, if this cell carries one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(number) => Some(*number),
            CellValue::Text(_) => None,
        }
    }

    /// The text value, if this cell carries one
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Number(_) => None,
            CellValue::Text(text) => Some(text),
        }
    }
}

// =============================================================================
// Station Dataset Builder
// =============================================================================

/// Column-oriented storage for one station's accepted observation rows.
///
/// The builder is created from the discovered field set and threaded through
/// ingestion, ordering, and serialization for exactly one station run.
/// Invariant on exit from ingestion: every column has the same length as the
/// time axis.
#[derive(Debug, Clone)]
pub struct StationDataset {
    station_id: String,
    time_field: String,
    field_order: Vec<String>,
    columns: HashMap<String, Vec<CellValue>>,
    timestamps: Vec<NaiveDateTime>,
}

impl StationDataset {
    /// Create an empty dataset for the discovered field set.
    ///
    /// `time_field` is the UTC timestamp field name; `field_names` come from
    /// schema discovery in header order.
    pub fn new(
        station_id: impl Into<String>,
        time_field: impl Into<String>,
        field_names: &[String],
    ) -> Self {
        let mut field_order: Vec<String> = Vec::with_capacity(field_names.len());
        for name in field_names {
            if !field_order.contains(name) {
                field_order.push(name.clone());
            }
        }
        let columns = field_order
            .iter()
            .map(|name| (name.clone(), Vec::new()))
            .collect();
        Self {
            station_id: station_id.into(),
            time_field: time_field.into(),
            field_order,
            columns,
            timestamps: Vec::new(),
        }
    }

    /// Station identifier this dataset belongs to
    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    /// Name of the UTC timestamp field
    pub fn time_field(&self) -> &str {
        &self.time_field
    }

    /// Discovered field names in header order, duplicates removed
    pub fn field_order(&self) -> &[String] {
        &self.field_order
    }

    /// Parsed UTC timestamps, one per accepted row
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// A column by field name
    pub fn column(&self, name: &str) -> Option<&[CellValue]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Number of accepted observation rows
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether no rows were accepted
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Append one accepted row.
    ///
    /// Fields not in the discovered schema are ignored. A column that missed
    /// earlier rows is padded with empty-string sentinels up to the current
    /// row count before the new value lands, so all columns stay
    /// index-aligned with the time axis.
    pub fn append_row<'a, I>(&mut self, timestamp: NaiveDateTime, fields: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let aligned_len = self.timestamps.len();
        for (name, raw) in fields {
            if let Some(column) = self.columns.get_mut(name) {
                if column.len() < aligned_len {
                    column.resize(aligned_len, CellValue::empty());
                }
                column.push(CellValue::coerce(raw));
            }
        }
        self.timestamps.push(timestamp);
    }

    /// Final alignment pass: pad every column to the time axis length
    pub fn align_columns(&mut self) {
        let target = self.timestamps.len();
        for column in self.columns.values_mut() {
            if column.len() < target {
                column.resize(target, CellValue::empty());
            }
        }
    }

    /// Whether the time axis is pairwise non-decreasing
    pub fn is_chronological(&self) -> bool {
        self.timestamps.windows(2).all(|pair| pair[0] <= pair[1])
    }

    /// Restore chronological order if any inversion exists.
    ///
    /// Computes the stable sort permutation of the time axis and applies that
    /// exact permutation to every column and to the time axis itself, so rows
    /// with identical timestamps retain their original relative order and the
    /// sorted time axis is authoritative afterwards.
    pub fn sort_chronologically(&mut self) {
        if self.is_chronological() {
            return;
        }
        let mut order: Vec<usize> = (0..self.timestamps.len()).collect();
        order.sort_by_key(|&index| self.timestamps[index]);
        for column in self.columns.values_mut() {
            *column = order.iter().map(|&index| column[index].clone()).collect();
        }
        self.timestamps = order.iter().map(|&index| self.timestamps[index]).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 7, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn coerce_parses_numbers_and_trims_text() {
        assert_eq!(CellValue::coerce(" 12.5 "), CellValue::Number(12.5));
        assert_eq!(CellValue::coerce("-999"), CellValue::Number(-999.0));
        assert_eq!(CellValue::coerce(" Rain "), CellValue::Text("Rain".to_string()));
        assert_eq!(CellValue::coerce(""), CellValue::Text(String::new()));
    }

    #[test]
    fn numeric_predicate_is_independent_of_coercion() {
        assert!(CellValue::is_numeric("3.14"));
        assert!(CellValue::is_numeric(" -7 "));
        assert!(!CellValue::is_numeric("N/A"));
        assert!(!CellValue::is_numeric(""));
    }

    #[test]
    fn append_row_keeps_columns_aligned() {
        let fields = vec!["Time".to_string(), "TemperatureC".to_string(), "DateUTC".to_string()];
        let mut dataset = StationDataset::new("ITEST1", "DateUTC", &fields);

        dataset.append_row(
            timestamp(10, 0),
            vec![
                ("Time", "2014-07-01 12:00:00"),
                ("TemperatureC", "18.3"),
                ("DateUTC", "2014-07-01 10:00:00"),
            ],
        );
        // Second row misses TemperatureC entirely
        dataset.append_row(
            timestamp(10, 5),
            vec![
                ("Time", "2014-07-01 12:05:00"),
                ("DateUTC", "2014-07-01 10:05:00"),
            ],
        );
        // Third row has it again; the column must catch up first
        dataset.append_row(
            timestamp(10, 10),
            vec![
                ("Time", "2014-07-01 12:10:00"),
                ("TemperatureC", "18.5"),
                ("DateUTC", "2014-07-01 10:10:00"),
            ],
        );
        dataset.align_columns();

        for name in dataset.field_order() {
            assert_eq!(dataset.column(name).unwrap().len(), dataset.len());
        }
        let temperature = dataset.column("TemperatureC").unwrap();
        assert_eq!(temperature[0], CellValue::Number(18.3));
        assert_eq!(temperature[1], CellValue::empty());
        assert_eq!(temperature[2], CellValue::Number(18.5));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let fields = vec!["DateUTC".to_string()];
        let mut dataset = StationDataset::new("ITEST1", "DateUTC", &fields);
        dataset.append_row(
            timestamp(10, 0),
            vec![("DateUTC", "2014-07-01 10:00:00"), ("Bogus", "1.0")],
        );
        assert!(dataset.column("Bogus").is_none());
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn sort_is_stable_for_equal_timestamps() {
        let fields = vec!["DateUTC".to_string(), "Conditions".to_string()];
        let mut dataset = StationDataset::new("ITEST1", "DateUTC", &fields);
        dataset.append_row(timestamp(11, 0), vec![("DateUTC", "x"), ("Conditions", "late")]);
        dataset.append_row(timestamp(10, 0), vec![("DateUTC", "x"), ("Conditions", "first")]);
        dataset.append_row(timestamp(10, 0), vec![("DateUTC", "x"), ("Conditions", "second")]);

        assert!(!dataset.is_chronological());
        dataset.sort_chronologically();
        assert!(dataset.is_chronological());

        let conditions = dataset.column("Conditions").unwrap();
        assert_eq!(conditions[0], CellValue::Text("first".to_string()));
        assert_eq!(conditions[1], CellValue::Text("second".to_string()));
        assert_eq!(conditions[2], CellValue::Text("late".to_string()));
        assert_eq!(
            dataset.timestamps(),
            &[timestamp(10, 0), timestamp(10, 0), timestamp(11, 0)]
        );
    }

    #[test]
    fn sort_permutes_every_column_identically() {
        let fields = vec!["DateUTC".to_string(), "TemperatureC".to_string(), "Humidity".to_string()];
        let mut dataset = StationDataset::new("ITEST1", "DateUTC", &fields);
        dataset.append_row(
            timestamp(10, 10),
            vec![("DateUTC", "c"), ("TemperatureC", "3.0"), ("Humidity", "30")],
        );
        dataset.append_row(
            timestamp(10, 0),
            vec![("DateUTC", "a"), ("TemperatureC", "1.0"), ("Humidity", "10")],
        );
        dataset.append_row(
            timestamp(10, 5),
            vec![("DateUTC", "b"), ("TemperatureC", "2.0"), ("Humidity", "20")],
        );
        dataset.sort_chronologically();

        let temperature = dataset.column("TemperatureC").unwrap();
        let humidity = dataset.column("Humidity").unwrap();
        assert_eq!(
            temperature,
            &[CellValue::Number(1.0), CellValue::Number(2.0), CellValue::Number(3.0)]
        );
        assert_eq!(
            humidity,
            &[CellValue::Number(10.0), CellValue::Number(20.0), CellValue::Number(30.0)]
        );
        // The time axis itself ends up sorted, not merely checked
        let utc = dataset.column("DateUTC").unwrap();
        assert_eq!(
            utc,
            &[
                CellValue::Text("a".to_string()),
                CellValue::Text("b".to_string()),
                CellValue::Text("c".to_string())
            ]
        );
    }

    #[test]
    fn sort_tolerates_zero_and_one_rows() {
        let fields = vec!["DateUTC".to_string()];
        let mut empty = StationDataset::new("ITEST1", "DateUTC", &fields);
        assert!(empty.is_chronological());
        empty.sort_chronologically();
        assert!(empty.is_empty());

        let mut single = StationDataset::new("ITEST1", "DateUTC", &fields);
        single.append_row(timestamp(10, 0), vec![("DateUTC", "a")]);
        assert!(single.is_chronological());
        single.sort_chronologically();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn duplicate_field_names_collapse_to_one_column() {
        let fields = vec!["DateUTC".to_string(), "Humidity".to_string(), "Humidity".to_string()];
        let dataset = StationDataset::new("ITEST1", "DateUTC", &fields);
        assert_eq!(dataset.field_order().len(), 2);
    }
}
