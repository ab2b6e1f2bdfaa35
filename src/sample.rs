//! Dummy customer data for trying the dashboard without real records.

use crate::types::{CustomerRecord, ProvinceCoordinate};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

// (province, latitude, longitude)
const PROVINCES: &[(&str, f64, f64)] = &[
    ("Aceh", 4.695, 96.749),
    ("Sumatera Utara", 2.115, 99.545),
    ("Sumatera Barat", -0.740, 100.800),
    ("Riau", 0.293, 101.707),
    ("Jambi", -1.610, 103.613),
    ("Sumatera Selatan", -3.319, 103.914),
    ("Bengkulu", -3.793, 102.266),
    ("Lampung", -4.559, 105.406),
    ("Kepulauan Bangka Belitung", -2.741, 106.441),
    ("Kepulauan Riau", 3.946, 108.142),
    ("DKI Jakarta", -6.209, 106.846),
    ("Jawa Barat", -7.091, 107.669),
    ("Jawa Tengah", -7.151, 110.140),
    ("DI Yogyakarta", -7.875, 110.426),
    ("Jawa Timur", -7.536, 112.238),
    ("Banten", -6.406, 106.064),
    ("Bali", -8.340, 115.092),
    ("Nusa Tenggara Barat", -8.653, 117.362),
    ("Nusa Tenggara Timur", -8.657, 121.079),
    ("Kalimantan Barat", -0.279, 111.476),
    ("Kalimantan Tengah", -1.681, 113.382),
    ("Kalimantan Selatan", -3.093, 115.284),
    ("Kalimantan Timur", 0.539, 116.419),
    ("Kalimantan Utara", 3.073, 116.041),
    ("Sulawesi Utara", 0.625, 123.975),
    ("Sulawesi Tengah", -1.430, 121.446),
    ("Sulawesi Selatan", -3.669, 119.974),
    ("Sulawesi Tenggara", -4.145, 122.175),
    ("Gorontalo", 0.700, 122.447),
    ("Sulawesi Barat", -2.844, 119.232),
    ("Maluku", -3.238, 130.145),
    ("Maluku Utara", 1.571, 127.809),
    ("Papua Barat", -1.336, 133.175),
    ("Papua", -4.270, 138.080),
];

const PROFESSIONS: &[&str] = &[
    "Artist",
    "Doctor",
    "Engineer",
    "Entertainment",
    "Executive",
    "Healthcare",
    "Homemaker",
    "Lawyer",
    "Marketing",
];

const GENDERS: &[&str] = &["Male", "Female"];

const REFERENCE_YEAR: u32 = 2023;
const MIN_AGE: u32 = 18;
const MAX_AGE: u32 = 75;

pub fn generation_for_birth_year(year: u32) -> &'static str {
    match year {
        0..=1964 => "Baby Boomers",
        1965..=1980 => "Gen X",
        1981..=1996 => "Millenials",
        _ => "Gen Z",
    }
}

pub fn coordinates() -> Vec<ProvinceCoordinate> {
    PROVINCES
        .iter()
        .map(|(name, lat, lon)| ProvinceCoordinate::new(*name, *lat, *lon))
        .collect()
}

/// `rows` random customers; the same seed always yields the same table.
pub fn generate_customers(rows: usize, seed: u64) -> Vec<CustomerRecord> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..rows)
        .map(|_| {
            let age = rng.gen_range(MIN_AGE..=MAX_AGE);
            let province = PROVINCES[rng.gen_range(0..PROVINCES.len())].0;
            let profession = PROFESSIONS[rng.gen_range(0..PROFESSIONS.len())];
            let gender = GENDERS[rng.gen_range(0..GENDERS.len())];
            // whole thousands of rupiah
            let income = (rng.gen_range(10_000_000.0..250_000_000.0_f64) / 1000.0).round() * 1000.0;

            CustomerRecord {
                province: province.to_string(),
                generation: generation_for_birth_year(REFERENCE_YEAR - age).to_string(),
                profession: profession.to_string(),
                gender: gender.to_string(),
                age,
                annual_income: income,
                spending_score: rng.gen_range(1..=100) as f64,
            }
        })
        .collect()
}

/// Writes `customers.json` and `coordinate.csv` into `dir`.
pub fn write_sample(dir: &Path, rows: usize, seed: u64) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {:?}", dir))?;

    let customers_path = dir.join("customers.json");
    let customers = generate_customers(rows, seed);
    let file = File::create(&customers_path)
        .with_context(|| format!("Failed to create {:?}", customers_path))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer(&mut out, &customers)
        .with_context(|| "Failed to write customer table")?;
    out.flush()?;
    info!(path = ?customers_path, rows, "Customer table written");

    let coordinates_path = dir.join("coordinate.csv");
    let mut writer = csv::Writer::from_path(&coordinates_path)
        .with_context(|| format!("Failed to create {:?}", coordinates_path))?;
    writer.write_record(["province", "longitude", "latitude"])?;
    for coord in coordinates() {
        writer.write_record([
            coord.province.clone(),
            coord.longitude().to_string(),
            coord.latitude().to_string(),
        ])?;
    }
    writer.flush()?;
    info!(path = ?coordinates_path, provinces = PROVINCES.len(), "Coordinate table written");

    Ok((customers_path, coordinates_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{load_coordinates, load_customers};

    #[test]
    fn test_generation_boundaries() {
        assert_eq!(generation_for_birth_year(1964), "Baby Boomers");
        assert_eq!(generation_for_birth_year(1965), "Gen X");
        assert_eq!(generation_for_birth_year(1996), "Millenials");
        assert_eq!(generation_for_birth_year(1997), "Gen Z");
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        assert_eq!(generate_customers(50, 7), generate_customers(50, 7));
        assert_ne!(generate_customers(50, 7), generate_customers(50, 8));
    }

    #[test]
    fn test_generated_values_in_range() {
        for c in generate_customers(200, 1) {
            assert!((MIN_AGE..=MAX_AGE).contains(&c.age));
            assert!((1.0..=100.0).contains(&c.spending_score));
            assert!(PROVINCES.iter().any(|(p, _, _)| *p == c.province));
        }
    }

    #[test]
    fn test_written_sample_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let (customers_path, coordinates_path) = write_sample(dir.path(), 25, 3).unwrap();

        assert_eq!(load_customers(&customers_path).unwrap().len(), 25);
        let coords = load_coordinates(&coordinates_path).unwrap();
        assert_eq!(coords.len(), PROVINCES.len());
        assert_eq!(coords[16].province, "Bali");
        assert_eq!(coords[16].latitude(), -8.340);
    }
}
