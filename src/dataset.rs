//! The indicator dataset, pivoted to one row per (country, year).
//!
//! The source CSV is in long format (`Economy,Year,Indicator,Value`). Pivoting
//! sorts rows by (country, year) and indicator columns by name; a row or column
//! exists only if at least one value was observed for it. Only the pivot's row
//! index and column names are kept: node features come from the graph artifact,
//! and these rows supply the country labels and the node order per year.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::DatasetError;
use crate::graph::year_index::YearOffsetTable;

pub type DatasetResult<T> = std::result::Result<T, DatasetError>;

/// Column holding the country name.
pub const COUNTRY_COLUMN: &str = "Economy";
/// Column holding the observation year.
pub const YEAR_COLUMN: &str = "Year";
const INDICATOR_COLUMN: &str = "Indicator";
const VALUE_COLUMN: &str = "Value";

/// Index entry of one pivoted row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PivotRow {
    pub country: String,
    pub year: i32,
}

/// Row index and column names of the pivoted dataset.
#[derive(Debug, Clone, Default)]
pub struct PivotTable {
    rows: Vec<PivotRow>,
    indicators: Vec<String>,
    /// Row positions per year, in row order.
    by_year: BTreeMap<i32, Vec<usize>>,
}

impl PivotTable {
    /// Pivot observations `(country, year, indicator, value)`. Observations
    /// with a missing value do not create rows or columns.
    pub fn from_observations<I, S>(observations: I) -> Self
    where
        I: IntoIterator<Item = (S, i32, S, Option<f64>)>,
        S: Into<String>,
    {
        let mut rows = BTreeSet::new();
        let mut indicators = BTreeSet::new();
        for (country, year, indicator, value) in observations {
            if value.is_some_and(|v| !v.is_nan()) {
                rows.insert(PivotRow {
                    country: country.into(),
                    year,
                });
                indicators.insert(indicator.into());
            }
        }

        let rows: Vec<PivotRow> = rows.into_iter().collect();
        let mut by_year: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (pos, row) in rows.iter().enumerate() {
            by_year.entry(row.year).or_default().push(pos);
        }
        Self {
            rows,
            indicators: indicators.into_iter().collect(),
            by_year,
        }
    }

    /// Parse long-format CSV with a header row.
    pub fn from_reader<R: Read>(reader: R) -> DatasetResult<Self> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|e| DatasetError::Read {
                path: "<reader>".into(),
                message: e.to_string(),
            })?
            .clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(DatasetError::MissingColumn { column: name })
        };
        let country_col = column(COUNTRY_COLUMN)?;
        let year_col = column(YEAR_COLUMN)?;
        let indicator_col = column(INDICATOR_COLUMN)?;
        let value_col = column(VALUE_COLUMN)?;

        let mut observations = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| DatasetError::Read {
                path: "<reader>".into(),
                message: e.to_string(),
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let field = |idx: usize| record.get(idx).unwrap_or("").trim();

            let year = parse_year(field(year_col)).ok_or_else(|| DatasetError::InvalidValue {
                line,
                message: format!("year `{}` is not an integer", field(year_col)),
            })?;
            let raw_value = field(value_col);
            let value = if raw_value.is_empty() {
                None
            } else {
                Some(raw_value.parse::<f64>().map_err(|_| DatasetError::InvalidValue {
                    line,
                    message: format!("value `{raw_value}` is not a number"),
                })?)
            };
            observations.push((
                field(country_col).to_string(),
                year,
                field(indicator_col).to_string(),
                value,
            ));
        }
        Ok(Self::from_observations(observations))
    }

    /// Load and pivot a long-format CSV file.
    pub fn load(path: &Path) -> DatasetResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| DatasetError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let table = Self::from_reader(file).map_err(|e| match e {
            DatasetError::Read { message, .. } => DatasetError::Read {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;
        tracing::info!(
            path = %path.display(),
            rows = table.rows.len(),
            indicators = table.indicators.len(),
            years = table.by_year.len(),
            "loaded dataset"
        );
        Ok(table)
    }

    pub fn rows(&self) -> &[PivotRow] {
        &self.rows
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    /// Column list of the pivoted frame: country, year, then indicators.
    pub fn columns(&self) -> Vec<String> {
        [COUNTRY_COLUMN.to_string(), YEAR_COLUMN.to_string()]
            .into_iter()
            .chain(self.indicators.iter().cloned())
            .collect()
    }

    pub fn years(&self) -> Vec<i32> {
        self.by_year.keys().copied().collect()
    }

    /// Countries observed in `year`, in row order.
    pub fn countries_for_year(&self, year: i32) -> Vec<&str> {
        self.by_year
            .get(&year)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&pos| self.rows[pos].country.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Position of `country` among the rows of `year` (exact match).
    pub fn position_in_year(&self, country: &str, year: i32) -> Option<usize> {
        self.by_year
            .get(&year)?
            .iter()
            .position(|&pos| self.rows[pos].country == country)
    }

    /// Year offset table packing each year's rows contiguously.
    pub fn year_offsets(&self) -> YearOffsetTable {
        YearOffsetTable::from_years(self.rows.iter().map(|r| r.year))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn parse_year(raw: &str) -> Option<i32> {
    raw.parse::<i32>().ok().or_else(|| {
        let value = raw.parse::<f64>().ok()?;
        (value.fract() == 0.0 && value.abs() < i32::MAX as f64).then_some(value as i32)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Economy,Year,Indicator,Value
France,2015,Internet users,80.5
Brazil,2014,Internet users,54.5
France,2014,Internet users,78.0
Brazil,2015,Internet users,58.3
Brazil,2015,Broadband,12.1
Chad,2015,Broadband,
France,2014,Broadband,40.0
";

    #[test]
    fn rows_sorted_by_country_then_year() {
        let table = PivotTable::from_reader(CSV.as_bytes()).unwrap();
        let rows: Vec<(&str, i32)> = table
            .rows()
            .iter()
            .map(|r| (r.country.as_str(), r.year))
            .collect();
        assert_eq!(
            rows,
            vec![("Brazil", 2014), ("Brazil", 2015), ("France", 2014), ("France", 2015)]
        );
    }

    #[test]
    fn missing_values_create_no_rows() {
        let table = PivotTable::from_reader(CSV.as_bytes()).unwrap();
        assert!(table.countries_for_year(2015).iter().all(|c| *c != "Chad"));
    }

    #[test]
    fn indicator_columns_sorted() {
        let table = PivotTable::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.indicators(), ["Broadband", "Internet users"]);
        assert_eq!(table.columns()[..2], ["Economy", "Year"]);
    }

    #[test]
    fn countries_and_positions_per_year() {
        let table = PivotTable::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.countries_for_year(2014), vec!["Brazil", "France"]);
        assert_eq!(table.position_in_year("France", 2015), Some(1));
        assert_eq!(table.position_in_year("Chad", 2015), None);
        assert!(table.countries_for_year(1990).is_empty());
    }

    #[test]
    fn offsets_follow_row_counts() {
        let table = PivotTable::from_reader(CSV.as_bytes()).unwrap();
        let offsets = table.year_offsets();
        assert_eq!(offsets.range_for_year(2014).unwrap(), 0..2);
        assert_eq!(offsets.range_for_year(2015).unwrap(), 2..4);
        offsets.validate(table.len()).unwrap();
    }

    #[test]
    fn float_years_are_accepted() {
        let csv = "Economy,Year,Indicator,Value\nPeru,2016.0,X,1\n";
        let table = PivotTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.years(), vec![2016]);
    }

    #[test]
    fn bad_value_reports_line() {
        let csv = "Economy,Year,Indicator,Value\nPeru,2016,X,1\nPeru,2017,X,abc\n";
        let err = PivotTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidValue { line: 3, .. }));
    }

    #[test]
    fn missing_column_is_reported() {
        let csv = "Country,Year,Indicator,Value\n";
        let err = PivotTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn { column: "Economy" }));
    }
}
