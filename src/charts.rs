//! Binding of summaries to chart specifications.
//!
//! Specs are plain serializable data; the page hands them to plotly.js as-is.

use crate::error::SpecError;
use crate::processing::{LongFormSummary, MapSummary};
use crate::types::{Measure, COUNT_VARIABLE};
use geo::{BoundingRect, MultiPoint};
use serde::Serialize;

pub const MAP_STYLE: &str = "carto-positron";
pub const DEFAULT_ZOOM: u8 = 3;
/// Diameter in pixels of the largest marker.
pub const MARKER_SIZE_MAX: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverField {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub province: String,
    pub latitude: f64,
    pub longitude: f64,
    pub size: f64,
    pub hover: Vec<HoverField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSpec {
    pub title: String,
    pub size_variable: String,
    pub style: String,
    pub zoom: u8,
    pub center: LatLon,
    /// plotly `marker.sizeref` for area-scaled markers.
    pub sizeref: f64,
    pub markers: Vec<MapMarker>,
}

impl MapSpec {
    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }
}

/// Binds province coordinates as marker positions and `size_variable` as marker size.
pub fn build_map_spec(map: &MapSummary, size_variable: &str) -> Result<MapSpec, SpecError> {
    if !map.variables().iter().any(|v| v == size_variable) {
        return Err(SpecError::UnknownVariable(size_variable.to_string()));
    }

    let mut markers = Vec::with_capacity(map.rows.len());
    for row in &map.rows {
        let size = map
            .value(row, size_variable)
            .ok_or_else(|| SpecError::UnknownVariable(size_variable.to_string()))?;
        if !size.is_finite() {
            return Err(SpecError::NotNumeric {
                variable: size_variable.to_string(),
                category: row.province.clone(),
            });
        }
        if size < 0.0 {
            return Err(SpecError::NegativeSize {
                category: row.province.clone(),
                value: size,
            });
        }

        let mut hover = vec![HoverField {
            label: COUNT_VARIABLE.to_string(),
            value: row.count as f64,
        }];
        if let Some(score) = map.average(row, Measure::SpendingScore) {
            hover.push(HoverField {
                label: Measure::SpendingScore.average_label().to_string(),
                value: score,
            });
        }

        markers.push(MapMarker {
            province: row.province.clone(),
            latitude: row.latitude,
            longitude: row.longitude,
            size,
            hover,
        });
    }

    let largest = markers.iter().map(|m| m.size).fold(0.0, f64::max);
    let sizeref = if largest > 0.0 {
        2.0 * largest / MARKER_SIZE_MAX.powi(2)
    } else {
        1.0
    };

    Ok(MapSpec {
        title: "Customer Info Based on Region".to_string(),
        size_variable: size_variable.to_string(),
        style: MAP_STYLE.to_string(),
        zoom: DEFAULT_ZOOM,
        center: map_center(&markers),
        sizeref,
        markers,
    })
}

fn map_center(markers: &[MapMarker]) -> LatLon {
    let points: MultiPoint<f64> = markers
        .iter()
        .map(|m| (m.longitude, m.latitude))
        .collect::<Vec<_>>()
        .into();
    match points.bounding_rect() {
        Some(rect) => {
            let c = rect.center();
            LatLon { lat: c.y, lon: c.x }
        }
        None => LatLon { lat: 0.0, lon: 0.0 },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    /// Categories along x, values up the y axis.
    #[serde(rename = "v")]
    Vertical,
    /// Categories along y, values along the x axis.
    #[serde(rename = "h")]
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sort {
    #[default]
    Source,
    Ascending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSpec {
    pub title: String,
    pub orientation: Orientation,
    pub category_label: String,
    pub value_label: String,
    pub categories: Vec<String>,
    pub values: Vec<f64>,
}

impl BarSpec {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Binds the values of `variable` against the summary's dimension values.
pub fn build_bar_spec(
    summary: &LongFormSummary,
    orientation: Orientation,
    variable: &str,
    sort: Sort,
) -> Result<BarSpec, SpecError> {
    if !summary.variables().iter().any(|v| v == variable) && !summary.rows.is_empty() {
        return Err(SpecError::UnknownVariable(variable.to_string()));
    }

    let mut bars: Vec<(String, f64)> = Vec::new();
    for row in summary.values_for(variable) {
        if !row.value.is_finite() {
            return Err(SpecError::NotNumeric {
                variable: variable.to_string(),
                category: row.category.clone(),
            });
        }
        bars.push((row.category.clone(), row.value));
    }

    if sort == Sort::Ascending {
        bars.sort_by(|a, b| a.1.total_cmp(&b.1));
    }

    let (categories, values) = bars.into_iter().unzip();
    Ok(BarSpec {
        title: format!(
            "Customer {} Based on {}",
            variable,
            summary.dimension.label()
        ),
        orientation,
        category_label: summary.dimension.label().to_string(),
        value_label: variable.to_string(),
        categories,
        values,
    })
}
