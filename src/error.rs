use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading the listings dataset
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open dataset '{path}'")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read CSV header")]
    Header(#[source] csv::Error),

    #[error("dataset is missing required column '{0}'")]
    MissingColumn(String),

    #[error("invalid listing at row {row}")]
    Record {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("dataset contains no listings")]
    Empty,
}

/// Invalid filter selections
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("price range is inverted (min {min} > max {max})")]
    InvertedPriceRange { min: f64, max: f64 },

    #[error("price bound must be a finite number, got {0}")]
    NonFinitePrice(f64),
}
