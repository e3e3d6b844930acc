use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// One monthly producer price, FCFA per tonne.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub ds: NaiveDate,
    pub y: f64,
}

/// Which input file the dataset was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum DataSource {
    Processed(PathBuf),
    RawFao(PathBuf),
}

impl DataSource {
    pub fn path(&self) -> &PathBuf {
        match self {
            DataSource::Processed(path) | DataSource::RawFao(path) => path,
        }
    }
}

/// Historical series, sorted ascending by date with no missing values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub observations: Vec<Observation>,
    pub source: DataSource,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.ds)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.ds)
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.ds).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.y).collect()
    }
}
