use std::path::Path;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::DataPaths;
use crate::errors::AppError;
use crate::models::{DataSource, Dataset, Observation};

const FAO_ITEM: &str = "Maize (corn)";
const FAO_ELEMENT: &str = "Producer Price (LCU/tonne)";
const FAO_ANNUAL: &str = "Annual value";

#[derive(Debug, Deserialize)]
struct ProcessedRow {
    #[serde(default)]
    ds: String,
    #[serde(default)]
    y: String,
}

#[derive(Debug, Deserialize)]
struct FaoRow {
    #[serde(rename = "Iso3", default)]
    iso3: String,
    #[serde(rename = "Item", default)]
    item: String,
    #[serde(rename = "Element", default)]
    element: String,
    #[serde(rename = "Months", default)]
    months: String,
    #[serde(rename = "StartDate", default)]
    start_date: String,
    #[serde(rename = "Value", default)]
    value: String,
}

/// Load the price history, preferring the processed file over the raw FAO export.
pub fn load_dataset(paths: &DataPaths) -> Result<Dataset, AppError> {
    if paths.processed.exists() {
        match load_processed(&paths.processed)? {
            Some(observations) => {
                info!(
                    "Loaded {} observations from processed CSV {}",
                    observations.len(),
                    paths.processed.display()
                );
                return finish(observations, DataSource::Processed(paths.processed.clone()));
            }
            None => warn!(
                "Processed CSV {} has no ds/y columns, falling back to raw FAO data",
                paths.processed.display()
            ),
        }
    }

    if paths.raw.exists() {
        let observations = load_raw_fao(&paths.raw)?;
        info!(
            "Loaded {} maize observations from raw FAO CSV {}",
            observations.len(),
            paths.raw.display()
        );
        return finish(observations, DataSource::RawFao(paths.raw.clone()));
    }

    Err(AppError::DataNotFound {
        processed: paths.processed.clone(),
        raw: paths.raw.clone(),
    })
}

fn finish(mut observations: Vec<Observation>, source: DataSource) -> Result<Dataset, AppError> {
    observations.sort_by_key(|o| o.ds);
    if observations.len() < 2 {
        return Err(AppError::InsufficientData {
            needed: 2,
            got: observations.len(),
        });
    }
    Ok(Dataset { observations, source })
}

/// Returns `None` when the file lacks the `ds`/`y` columns.
pub fn load_processed(path: &Path) -> Result<Option<Vec<Observation>>, AppError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?;
    // Exact names, matching the serde field names of `ProcessedRow`
    let has_columns = headers.iter().any(|h| h == "ds") && headers.iter().any(|h| h == "y");
    if !has_columns {
        return Ok(None);
    }

    let mut observations = Vec::new();
    let mut dropped = 0usize;
    for result in reader.deserialize::<ProcessedRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping unreadable row in {}: {}", path.display(), e);
                dropped += 1;
                continue;
            }
        };
        match (parse_date(&row.ds), parse_number(&row.y)) {
            (Some(ds), Some(y)) => observations.push(Observation { ds, y }),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!("Dropped {} rows with missing date or price", dropped);
    }
    Ok(Some(observations))
}

pub fn load_raw_fao(path: &Path) -> Result<Vec<Observation>, AppError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut observations = Vec::new();
    for result in reader.deserialize::<FaoRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping unreadable row in {}: {}", path.display(), e);
                continue;
            }
        };
        // HXL hashtag row
        if row.iso3.starts_with('#') {
            continue;
        }
        if row.item != FAO_ITEM || row.element != FAO_ELEMENT || row.months == FAO_ANNUAL {
            continue;
        }
        if let (Some(ds), Some(y)) = (parse_date(&row.start_date), parse_number(&row.value)) {
            observations.push(Observation { ds, y });
        }
    }

    Ok(observations)
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    // Drop a time part such as "2015-01-01 00:00:00" or "2015-01-01T00:00:00"
    let date_part = s.split(|c| c == ' ' || c == 'T').next().unwrap_or(s);

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d/%m/%Y"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", date_part), "%Y-%m-%d"))
        .ok()
}

pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2015, 3, 1).unwrap();
        assert_eq!(parse_date("2015-03-01"), Some(expected));
        assert_eq!(parse_date("2015-03-01 00:00:00"), Some(expected));
        assert_eq!(parse_date("2015-03"), Some(expected));
        assert_eq!(parse_date("01/03/2015"), Some(expected));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 152000.5 "), Some(152000.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("abc"), None);
    }
}
