//! Wide price and return matrices.
//!
//! Both matrices are polars DataFrames with a string `date` column in ISO
//! format and one nullable `f64` column per symbol. Rows are sorted by date,
//! dates are unique and no row is entirely missing.

use crate::{Result, RiskError, TimeSeries};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Name of the date column in every matrix.
pub const DATE_COLUMN: &str = "date";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single symbol's column of nullable values.
pub type SymbolColumn = (String, Vec<Option<f64>>);

/// Price matrix: symbol columns of prices indexed by date.
#[derive(Debug, Clone)]
pub struct PriceMatrix {
    frame: DataFrame,
}

/// Return matrix: symbol columns of periodic returns indexed by date.
#[derive(Debug, Clone)]
pub struct ReturnMatrix {
    frame: DataFrame,
}

impl PriceMatrix {
    /// Build a matrix from per-symbol observations.
    ///
    /// Dates are the union across symbols. A symbol listed twice keeps its
    /// first entry, and within a symbol the first observation for a date wins.
    /// Non-finite prices are treated as missing.
    pub fn from_observations<I, S>(observations: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<(NaiveDate, f64)>)>,
        S: Into<String>,
    {
        let mut per_symbol: Vec<(String, BTreeMap<NaiveDate, f64>)> = Vec::new();
        for (symbol, points) in observations {
            let symbol = symbol.into();
            if per_symbol.iter().any(|(s, _)| *s == symbol) {
                continue;
            }
            let mut by_date = BTreeMap::new();
            for (date, price) in points.into_iter().filter(|(_, p)| p.is_finite()) {
                by_date.entry(date).or_insert(price);
            }
            per_symbol.push((symbol, by_date));
        }

        let dates: Vec<NaiveDate> = per_symbol
            .iter()
            .flat_map(|(_, m)| m.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let columns = per_symbol
            .into_iter()
            .map(|(symbol, by_date)| {
                let values = dates.iter().map(|d| by_date.get(d).copied()).collect();
                (symbol, values)
            })
            .collect();

        Self::from_columns(dates, columns)
    }

    /// Build a matrix from a date index and aligned symbol columns.
    ///
    /// Duplicate dates keep their first row; rows are then sorted by date and
    /// rows with no observation at all are dropped.
    pub fn from_columns(dates: Vec<NaiveDate>, columns: Vec<SymbolColumn>) -> Result<Self> {
        Ok(Self {
            frame: ingest(dates, columns)?,
        })
    }

    /// Wrap a DataFrame supplied by a tabular collaborator.
    ///
    /// The frame must carry a `date` column (string or date typed); every
    /// other column is read as a price column.
    pub fn from_frame(frame: &DataFrame) -> Result<Self> {
        let (dates, columns) = extract(frame)?;
        Self::from_columns(dates, columns)
    }

    /// Fill each symbol's gaps with its last observed price.
    ///
    /// Leading gaps stay missing.
    pub fn forward_fill(&self) -> Result<Self> {
        let (dates, columns) = extract(&self.frame)?;
        let filled = columns
            .into_iter()
            .map(|(symbol, values)| {
                let values = values
                    .into_iter()
                    .scan(None, |last, v| {
                        if v.is_some() {
                            *last = v;
                        }
                        Some(*last)
                    })
                    .collect();
                (symbol, values)
            })
            .collect();
        Self::from_columns(dates, filled)
    }

    /// Underlying DataFrame.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Symbols in column order.
    pub fn symbols(&self) -> Vec<String> {
        symbols(&self.frame)
    }

    /// Date index.
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        dates(&self.frame)
    }

    /// Prices for `symbol`, `None` where missing.
    pub fn column(&self, symbol: &str) -> Result<Vec<Option<f64>>> {
        column_values(&self.frame, symbol)
    }

    /// Number of dates.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Whether the matrix has no rows or no symbols.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0 || self.symbols().is_empty()
    }
}

impl ReturnMatrix {
    /// Build a matrix from a date index and aligned symbol columns.
    pub fn from_columns(dates: Vec<NaiveDate>, columns: Vec<SymbolColumn>) -> Result<Self> {
        Ok(Self {
            frame: ingest(dates, columns)?,
        })
    }

    /// Wrap a DataFrame with a `date` column and one return column per symbol.
    pub fn from_frame(frame: &DataFrame) -> Result<Self> {
        let (dates, columns) = extract(frame)?;
        Self::from_columns(dates, columns)
    }

    /// Matrix with no rows and no symbols.
    pub fn empty() -> Result<Self> {
        Self::from_columns(Vec::new(), Vec::new())
    }

    /// Underlying DataFrame.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Symbols in column order.
    pub fn symbols(&self) -> Vec<String> {
        symbols(&self.frame)
    }

    /// Date index.
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        dates(&self.frame)
    }

    /// Returns for `symbol`, `None` where missing.
    pub fn column(&self, symbol: &str) -> Result<Vec<Option<f64>>> {
        column_values(&self.frame, symbol)
    }

    /// Returns for `symbol` as a series; missing entries become NaN.
    pub fn series(&self, symbol: &str) -> Result<TimeSeries> {
        let values = self
            .column(symbol)?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        TimeSeries::new(symbol, self.dates()?, values)
    }

    /// Number of dates.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Whether the matrix has no rows or no symbols.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0 || self.symbols().is_empty()
    }
}

fn ingest(dates: Vec<NaiveDate>, columns: Vec<SymbolColumn>) -> Result<DataFrame> {
    if let Some((symbol, values)) = columns.iter().find(|(_, v)| v.len() != dates.len()) {
        return Err(RiskError::InvalidInput(format!(
            "column {symbol} has {} values for {} dates",
            values.len(),
            dates.len()
        )));
    }

    // Stable sort keeps the first row for each duplicated date in front.
    let mut order: Vec<usize> = (0..dates.len()).collect();
    order.sort_by_key(|&i| dates[i]);
    order.dedup_by_key(|i| dates[*i]);
    order.retain(|&i| {
        columns
            .iter()
            .any(|(_, values)| values[i].is_some_and(f64::is_finite))
    });

    let kept_dates: Vec<NaiveDate> = order.iter().map(|&i| dates[i]).collect();
    let kept_columns: Vec<SymbolColumn> = columns
        .into_iter()
        .map(|(symbol, values)| {
            let values = order
                .iter()
                .map(|&i| values[i].filter(|v| v.is_finite()))
                .collect();
            (symbol, values)
        })
        .collect();

    build_frame(&kept_dates, &kept_columns)
}

pub(crate) fn build_frame(dates: &[NaiveDate], columns: &[SymbolColumn]) -> Result<DataFrame> {
    let date_strings: Vec<String> = dates
        .iter()
        .map(|d| d.format(DATE_FORMAT).to_string())
        .collect();

    let mut frame_columns = Vec::with_capacity(columns.len() + 1);
    frame_columns.push(Column::new(DATE_COLUMN.into(), date_strings));
    for (symbol, values) in columns {
        if symbol == DATE_COLUMN {
            return Err(RiskError::InvalidInput(format!(
                "symbol may not be named '{DATE_COLUMN}'"
            )));
        }
        frame_columns.push(Column::new(symbol.as_str().into(), values.as_slice()));
    }

    Ok(DataFrame::new(frame_columns)?)
}

fn extract(frame: &DataFrame) -> Result<(Vec<NaiveDate>, Vec<SymbolColumn>)> {
    let dates = dates(frame)?;
    let columns = symbols(frame)
        .into_iter()
        .map(|symbol| {
            let values = column_values(frame, &symbol)?;
            Ok((symbol, values))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((dates, columns))
}

fn symbols(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != DATE_COLUMN)
        .map(|name| name.to_string())
        .collect()
}

pub(crate) fn dates(frame: &DataFrame) -> Result<Vec<NaiveDate>> {
    let column = frame
        .column(DATE_COLUMN)
        .map_err(|_| RiskError::MissingColumn(DATE_COLUMN.to_string()))?
        .cast(&DataType::String)?;

    column
        .str()?
        .into_iter()
        .map(|raw| {
            let raw = raw.ok_or_else(|| RiskError::InvalidInput("null date".to_string()))?;
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map_err(|e| RiskError::InvalidInput(format!("bad date '{raw}': {e}")))
        })
        .collect()
}

pub(crate) fn column_values(frame: &DataFrame, symbol: &str) -> Result<Vec<Option<f64>>> {
    let column = frame
        .column(symbol)
        .map_err(|_| RiskError::MissingColumn(symbol.to_string()))?
        .cast(&DataType::Float64)?;

    Ok(column.f64()?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_from_observations_unions_dates() {
        let prices = PriceMatrix::from_observations([
            ("AAA", vec![(day(2), 10.0), (day(3), 11.0)]),
            ("BBB", vec![(day(1), 20.0), (day(3), 21.0)]),
        ])
        .unwrap();

        assert_eq!(prices.symbols(), vec!["AAA", "BBB"]);
        assert_eq!(prices.dates().unwrap(), vec![day(1), day(2), day(3)]);
        assert_eq!(prices.column("AAA").unwrap(), vec![None, Some(10.0), Some(11.0)]);
        assert_eq!(prices.column("BBB").unwrap(), vec![Some(20.0), None, Some(21.0)]);
    }

    #[test]
    fn test_duplicate_dates_keep_first() {
        let prices = PriceMatrix::from_observations([(
            "AAA",
            vec![(day(1), 10.0), (day(1), 99.0), (day(2), 11.0)],
        )])
        .unwrap();
        assert_eq!(prices.column("AAA").unwrap(), vec![Some(10.0), Some(11.0)]);

        let prices = PriceMatrix::from_columns(
            vec![day(2), day(1), day(2)],
            vec![("AAA".to_string(), vec![Some(5.0), Some(4.0), Some(6.0)])],
        )
        .unwrap();
        assert_eq!(prices.dates().unwrap(), vec![day(1), day(2)]);
        assert_eq!(prices.column("AAA").unwrap(), vec![Some(4.0), Some(5.0)]);
    }

    #[test]
    fn test_all_missing_rows_dropped() {
        let prices = PriceMatrix::from_columns(
            vec![day(1), day(2), day(3)],
            vec![
                ("AAA".to_string(), vec![Some(1.0), None, Some(1.1)]),
                ("BBB".to_string(), vec![Some(2.0), None, None]),
            ],
        )
        .unwrap();
        assert_eq!(prices.height(), 2);
        assert_eq!(prices.column("BBB").unwrap(), vec![Some(2.0), None]);
    }

    #[test]
    fn test_forward_fill() {
        let prices = PriceMatrix::from_columns(
            vec![day(1), day(2), day(3)],
            vec![
                ("AAA".to_string(), vec![None, Some(1.0), Some(1.1)]),
                ("BBB".to_string(), vec![Some(2.0), None, Some(2.2)]),
            ],
        )
        .unwrap()
        .forward_fill()
        .unwrap();

        assert_eq!(prices.column("AAA").unwrap(), vec![None, Some(1.0), Some(1.1)]);
        assert_eq!(prices.column("BBB").unwrap(), vec![Some(2.0), Some(2.0), Some(2.2)]);
    }

    #[test]
    fn test_from_frame_requires_date_column() {
        let df = df!["AAA" => [1.0, 2.0]].unwrap();
        assert!(matches!(
            PriceMatrix::from_frame(&df),
            Err(RiskError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_from_frame_sorts_by_date() {
        let df = df![
            "date" => ["2024-01-02", "2024-01-01"],
            "AAA" => [11.0, 10.0],
        ]
        .unwrap();
        let prices = PriceMatrix::from_frame(&df).unwrap();
        assert_eq!(prices.dates().unwrap(), vec![day(1), day(2)]);
        assert_eq!(prices.column("AAA").unwrap(), vec![Some(10.0), Some(11.0)]);
    }

    #[test]
    fn test_empty_matrix() {
        let prices = PriceMatrix::from_observations(Vec::<(String, Vec<(NaiveDate, f64)>)>::new())
            .unwrap();
        assert!(prices.is_empty());
        assert_eq!(prices.height(), 0);
    }
}
