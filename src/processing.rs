use crate::error::JoinError;
use crate::types::{AgeRange, CustomerRecord, Dimension, Measure, ProvinceCoordinate, COUNT_VARIABLE};
use geo::Point;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Rounds to two decimal places, ties to the even neighbour.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Count and rounded measure means for one dimension value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub category: String,
    pub count: usize,
    // aligned with DimensionSummary::measures
    pub averages: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionSummary {
    pub dimension: Dimension,
    #[serde(skip)]
    pub measures: Vec<Measure>,
    pub rows: Vec<SummaryRow>,
}

impl DimensionSummary {
    pub fn total_count(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }

    /// Variable names of the long form: `Count` followed by one `Average <Measure>` per measure.
    pub fn variables(&self) -> Vec<String> {
        variable_names(&self.measures)
    }

    pub fn row(&self, category: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.category == category)
    }

    pub fn to_long_form(&self) -> LongFormSummary {
        LongFormSummary {
            dimension: self.dimension,
            rows: self
                .rows
                .iter()
                .flat_map(|row| melt(row, &self.measures))
                .collect(),
        }
    }
}

fn variable_names(measures: &[Measure]) -> Vec<String> {
    std::iter::once(COUNT_VARIABLE.to_string())
        .chain(measures.iter().map(|m| m.average_label().to_string()))
        .collect()
}

fn melt(row: &SummaryRow, measures: &[Measure]) -> Vec<LongFormRow> {
    let mut out = Vec::with_capacity(measures.len() + 1);
    out.push(LongFormRow {
        category: row.category.clone(),
        variable: COUNT_VARIABLE.to_string(),
        value: row.count as f64,
    });
    for (measure, average) in measures.iter().zip(&row.averages) {
        out.push(LongFormRow {
            category: row.category.clone(),
            variable: measure.average_label().to_string(),
            value: *average,
        });
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongFormRow {
    pub category: String,
    pub variable: String,
    pub value: f64,
}

/// One row per (dimension value, variable) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongFormSummary {
    pub dimension: Dimension,
    pub rows: Vec<LongFormRow>,
}

impl LongFormSummary {
    /// Distinct variable names in first-seen order; these are the dropdown options.
    pub fn variables(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|r| seen.insert(r.variable.as_str()))
            .map(|r| r.variable.clone())
            .collect()
    }

    pub fn values_for<'a>(&'a self, variable: &'a str) -> impl Iterator<Item = &'a LongFormRow> + 'a {
        self.rows.iter().filter(move |r| r.variable == variable)
    }

    pub fn value(&self, category: &str, variable: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.category == category && r.variable == variable)
            .map(|r| r.value)
    }
}

/// Groups `records` by `dimension`, counting rows and averaging each measure.
///
/// Rows come out in the order their dimension value is first seen. Only observed
/// values produce rows, so every row has a count of at least one.
pub fn summarize<'a, I>(records: I, dimension: Dimension, measures: &[Measure]) -> DimensionSummary
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, (usize, Vec<f64>)> = HashMap::new();

    for record in records {
        let key = record.category(dimension);
        if !groups.contains_key(key) {
            order.push(key.to_string());
        }
        let entry = groups
            .entry(key.to_string())
            .or_insert_with(|| (0, vec![0.0; measures.len()]));
        entry.0 += 1;
        for (sum, measure) in entry.1.iter_mut().zip(measures) {
            *sum += record.measure(*measure);
        }
    }

    let rows = order
        .into_iter()
        .filter_map(|category| {
            let (count, sums) = groups.remove(&category)?;
            let averages = sums.iter().map(|sum| round2(sum / count as f64)).collect();
            Some(SummaryRow {
                category,
                count,
                averages,
            })
        })
        .collect::<Vec<_>>();

    debug!(%dimension, groups = rows.len(), "Summarized dimension");

    DimensionSummary {
        dimension,
        measures: measures.to_vec(),
        rows,
    }
}

/// Summary of a dimension using that dimension's own measures.
pub fn summarize_dimension(records: &[CustomerRecord], dimension: Dimension) -> DimensionSummary {
    summarize(records, dimension, dimension.measures())
}

pub fn filter_by_age(records: &[CustomerRecord], range: AgeRange) -> Vec<&CustomerRecord> {
    records.iter().filter(|r| range.contains(r.age)).collect()
}

/// Gender summary over customers whose age lies in `range`, inclusive.
pub fn summarize_gender(records: &[CustomerRecord], range: AgeRange) -> DimensionSummary {
    summarize(
        filter_by_age(records, range),
        Dimension::Gender,
        Dimension::Gender.measures(),
    )
}

/// How to treat customer provinces without a coordinate entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinPolicy {
    /// Drop the province from the map and report it.
    #[default]
    Lenient,
    /// Fail with a [`JoinError`].
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapRow {
    pub province: String,
    pub latitude: f64,
    pub longitude: f64,
    pub count: usize,
    pub averages: Vec<f64>,
}

impl MapRow {
    pub fn location(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Province summary joined with coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSummary {
    #[serde(skip)]
    pub measures: Vec<Measure>,
    pub rows: Vec<MapRow>,
    /// Customer provinces with no coordinate entry.
    pub unmatched_customers: Vec<String>,
    /// Coordinate entries with no customers.
    pub unmatched_coordinates: Vec<String>,
}

impl MapSummary {
    pub fn variables(&self) -> Vec<String> {
        variable_names(&self.measures)
    }

    pub fn average(&self, row: &MapRow, measure: Measure) -> Option<f64> {
        let index = self.measures.iter().position(|m| *m == measure)?;
        row.averages.get(index).copied()
    }

    /// Value of `variable` for `row`, matching the long-form variable names.
    pub fn value(&self, row: &MapRow, variable: &str) -> Option<f64> {
        if variable == COUNT_VARIABLE {
            return Some(row.count as f64);
        }
        let index = self
            .measures
            .iter()
            .position(|m| m.average_label() == variable)?;
        row.averages.get(index).copied()
    }

    pub fn to_long_form(&self) -> LongFormSummary {
        LongFormSummary {
            dimension: Dimension::Province,
            rows: self
                .rows
                .iter()
                .flat_map(|row| {
                    melt(
                        &SummaryRow {
                            category: row.province.clone(),
                            count: row.count,
                            averages: row.averages.clone(),
                        },
                        &self.measures,
                    )
                })
                .collect(),
        }
    }
}

/// Inner-joins a province summary with the coordinate table by province name.
///
/// Provinces found in only one of the two tables never reach the map. Under
/// [`JoinPolicy::Strict`] a customer province without coordinates is an error.
pub fn join_coordinates(
    summary: &DimensionSummary,
    coordinates: &[ProvinceCoordinate],
    policy: JoinPolicy,
) -> Result<MapSummary, JoinError> {
    let lookup: HashMap<&str, &ProvinceCoordinate> = coordinates
        .iter()
        .map(|c| (c.province.as_str(), c))
        .collect();

    let mut rows = Vec::with_capacity(summary.rows.len());
    let mut unmatched_customers = Vec::new();

    for row in &summary.rows {
        match lookup.get(row.category.as_str()) {
            Some(coord) => rows.push(MapRow {
                province: row.category.clone(),
                latitude: coord.latitude(),
                longitude: coord.longitude(),
                count: row.count,
                averages: row.averages.clone(),
            }),
            None => unmatched_customers.push(row.category.clone()),
        }
    }

    if !unmatched_customers.is_empty() {
        if policy == JoinPolicy::Strict {
            return Err(JoinError {
                provinces: unmatched_customers,
            });
        }
        warn!(
            provinces = ?unmatched_customers,
            "Customer provinces without coordinates dropped from the map"
        );
    }

    let unmatched_coordinates: Vec<String> = coordinates
        .iter()
        .filter(|c| summary.row(&c.province).is_none())
        .map(|c| c.province.clone())
        .collect();
    if !unmatched_coordinates.is_empty() {
        warn!(
            provinces = ?unmatched_coordinates,
            "Provinces without customers left off the map"
        );
    }

    Ok(MapSummary {
        measures: summary.measures.clone(),
        rows,
        unmatched_customers,
        unmatched_coordinates,
    })
}
