use std::path::PathBuf;
use thiserror::Error;

/// Failure while reading one of the two input tables. Fatal at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed table {path:?}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("Column '{column}' not found in {path:?}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Unsupported customer table format: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("Customer table {0:?} has no rows")]
    Empty(PathBuf),

    #[error("Province '{province}' listed twice in {path:?}")]
    DuplicateProvince { path: PathBuf, province: String },
}

/// Rejected filter update. The previous selection stays in place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{variable}' is not an option for the {dimension} selector")]
    UnknownVariable { dimension: String, variable: String },

    #[error("Age range minimum {min} is greater than maximum {max}")]
    InvertedAgeRange { min: u32, max: u32 },

    #[error("Age range {min}..={max} is outside the data bounds {lower}..={upper}")]
    AgeOutOfBounds {
        min: u32,
        max: u32,
        lower: u32,
        upper: u32,
    },
}

/// Chart binding requested on data it cannot be drawn from.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecError {
    #[error("Variable '{0}' is not present in the summary")]
    UnknownVariable(String),

    #[error("Variable '{variable}' is not a finite number for '{category}'")]
    NotNumeric { variable: String, category: String },

    #[error("Marker size for '{category}' is negative ({value})")]
    NegativeSize { category: String, value: f64 },
}

/// A customer province with no coordinate entry, raised only under strict joining.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Provinces missing from the coordinate table: {}", .provinces.join(", "))]
pub struct JoinError {
    pub provinces: Vec<String>,
}
