use crate::config::InputConfig;
use crate::error::LoadError;
use crate::types::{CustomerRecord, ProvinceCoordinate};
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

const COORDINATE_COLUMNS: [&str; 3] = ["province", "longitude", "latitude"];

/// Both input tables, immutable after load.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub customers: Vec<CustomerRecord>,
    pub coordinates: Vec<ProvinceCoordinate>,
}

impl Dataset {
    /// Smallest and largest customer age.
    pub fn age_bounds(&self) -> (u32, u32) {
        let min = self.customers.iter().map(|c| c.age).min().unwrap_or(0);
        let max = self.customers.iter().map(|c| c.age).max().unwrap_or(0);
        (min, max)
    }
}

pub fn load_data(input: &InputConfig) -> Result<Dataset, LoadError> {
    info!(path = ?input.customers, "Loading customer table");
    let customers = load_customers(&input.customers)?;
    info!(rows = customers.len(), "Loaded customer table");

    info!(path = ?input.coordinates, "Loading province coordinates");
    let coordinates = load_coordinates(&input.coordinates)?;
    info!(provinces = coordinates.len(), "Loaded province coordinates");

    Ok(Dataset {
        customers,
        coordinates,
    })
}

pub fn load_customers(path: &Path) -> Result<Vec<CustomerRecord>, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;

    let customers = match extension.as_str() {
        "json" => load_customers_json(path)?,
        "csv" => load_customers_csv(path)?,
        _ => return Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    };

    if customers.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    Ok(customers)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn malformed(path: &Path, message: impl ToString) -> LoadError {
    LoadError::Malformed {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn require_columns(path: &Path, headers: &StringRecord, columns: &[&str]) -> Result<(), LoadError> {
    for column in columns {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

fn load_customers_csv(path: &Path) -> Result<Vec<CustomerRecord>, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(open(path)?);
    let headers = rdr.headers().map_err(|e| malformed(path, e))?.clone();
    require_columns(path, &headers, &CustomerRecord::COLUMNS)?;

    let mut customers = Vec::new();
    for result in rdr.deserialize::<CustomerRecord>() {
        customers.push(result.map_err(|e| malformed(path, e))?);
    }
    debug!(rows = customers.len(), "Parsed customer CSV");
    Ok(customers)
}

// A JSON array of row objects, one object per customer.
fn load_customers_json(path: &Path) -> Result<Vec<CustomerRecord>, LoadError> {
    let reader = BufReader::new(open(path)?);
    let rows: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_reader(reader).map_err(|e| malformed(path, e))?;

    let mut customers = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        if let Some(column) = CustomerRecord::COLUMNS
            .iter()
            .find(|column| !row.contains_key(**column))
        {
            return Err(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }
        let record: CustomerRecord = serde_json::from_value(serde_json::Value::Object(row))
            .map_err(|e| malformed(path, format!("row {}: {}", index, e)))?;
        customers.push(record);
    }
    debug!(rows = customers.len(), "Parsed customer JSON");
    Ok(customers)
}

#[derive(Debug, Deserialize)]
struct CoordinateRow {
    province: String,
    longitude: f64,
    latitude: f64,
}

pub fn load_coordinates(path: &Path) -> Result<Vec<ProvinceCoordinate>, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(open(path)?);
    let headers = rdr.headers().map_err(|e| malformed(path, e))?.clone();
    require_columns(path, &headers, &COORDINATE_COLUMNS)?;

    let mut seen = HashSet::new();
    let mut coordinates = Vec::new();
    for result in rdr.deserialize::<CoordinateRow>() {
        let row = result.map_err(|e| malformed(path, e))?;
        if !seen.insert(row.province.clone()) {
            return Err(LoadError::DuplicateProvince {
                path: path.to_path_buf(),
                province: row.province,
            });
        }
        coordinates.push(ProvinceCoordinate::new(row.province, row.latitude, row.longitude));
    }
    Ok(coordinates)
}
