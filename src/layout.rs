//! Fixed two-column grid of the dashboard page.

use crate::charts::{BarSpec, MapSpec};
use crate::config::DashboardConfig;
use crate::error::SpecError;
use crate::state::Selection;
use crate::types::{AgeRange, Dimension};
use serde::Serialize;
use std::collections::HashMap;

pub const COLUMNS_PER_ROW: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Empty,
    Selector {
        dimension: Dimension,
        label: String,
        options: Vec<String>,
        selected: String,
    },
    AgeSlider {
        label: String,
        bounds: AgeRange,
        value: AgeRange,
    },
    Map {
        spec: MapSpec,
    },
    Bar {
        spec: BarSpec,
    },
    /// Shown in place of a chart that could not be bound.
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub heading: Option<String>,
    pub content: Content,
}

impl Region {
    fn new(content: Content) -> Self {
        Self {
            heading: None,
            content,
        }
    }

    fn map(result: Result<MapSpec, SpecError>) -> Self {
        match result {
            Ok(spec) => Self {
                heading: Some(spec.title.clone()),
                content: Content::Map { spec },
            },
            Err(e) => Self::error(e),
        }
    }

    fn bar(result: Result<BarSpec, SpecError>) -> Self {
        match result {
            Ok(spec) => Self {
                heading: Some(spec.title.clone()),
                content: Content::Bar { spec },
            },
            Err(e) => Self::error(e),
        }
    }

    fn error(e: SpecError) -> Self {
        Self::new(Content::Error {
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Row {
    Columns { columns: Vec<Region> },
    Divider,
}

impl Row {
    fn columns(left: Region, right: Region) -> Self {
        Row::Columns {
            columns: vec![left, right],
        }
    }
}

/// Everything the page needs to draw one state of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub description: String,
    pub footer: String,
    pub selection: Selection,
    pub rows: Vec<Row>,
}

/// Bound charts for one recomputation.
#[derive(Debug, Clone)]
pub struct Panels {
    pub map: Result<MapSpec, SpecError>,
    pub generation: Result<BarSpec, SpecError>,
    pub gender: Result<BarSpec, SpecError>,
    pub profession: Result<BarSpec, SpecError>,
}

pub fn compose(
    settings: &DashboardConfig,
    selection: &Selection,
    age_bounds: AgeRange,
    options: &HashMap<Dimension, Vec<String>>,
    panels: Panels,
) -> DashboardView {
    let selector = |dimension: Dimension, label: &str| {
        Region::new(Content::Selector {
            dimension,
            label: label.to_string(),
            options: options.get(&dimension).cloned().unwrap_or_default(),
            selected: selection.variable(dimension).to_string(),
        })
    };

    let rows = vec![
        Row::columns(
            selector(Dimension::Province, "Marker Size by:"),
            selector(Dimension::Generation, "Show by:"),
        ),
        Row::columns(Region::map(panels.map), Region::bar(panels.generation)),
        Row::Divider,
        Row::columns(
            Region::new(Content::AgeSlider {
                label: "Select age range".to_string(),
                bounds: age_bounds,
                value: selection.age_range,
            }),
            selector(Dimension::Profession, "Show by:"),
        ),
        Row::columns(
            selector(Dimension::Gender, "Show by:"),
            Region::new(Content::Empty),
        ),
        Row::columns(Region::bar(panels.gender), Region::bar(panels.profession)),
    ];

    DashboardView {
        title: settings.title.clone(),
        description: settings.description.clone(),
        footer: settings.footer.clone(),
        selection: selection.clone(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::Orientation;

    fn bar(title: &str) -> BarSpec {
        BarSpec {
            title: title.to_string(),
            orientation: Orientation::Vertical,
            category_label: "Generation".to_string(),
            value_label: "Count".to_string(),
            categories: vec!["Gen Z".to_string()],
            values: vec![3.0],
        }
    }

    fn selection() -> Selection {
        Selection {
            province: "Count".to_string(),
            generation: "Count".to_string(),
            profession: "Average Annual Income".to_string(),
            gender: "Count".to_string(),
            age_range: AgeRange::new(35, 50),
        }
    }

    fn view(map: Result<MapSpec, SpecError>) -> DashboardView {
        let options = HashMap::from([(
            Dimension::Profession,
            vec!["Count".to_string(), "Average Annual Income".to_string()],
        )]);
        compose(
            &DashboardConfig::default(),
            &selection(),
            AgeRange::new(18, 70),
            &options,
            Panels {
                map,
                generation: Ok(bar("Customer Count Based on Generation")),
                gender: Ok(bar("gender")),
                profession: Ok(bar("profession")),
            },
        )
    }

    #[test]
    fn test_every_row_has_two_columns() {
        let view = view(Err(SpecError::UnknownVariable("x".to_string())));
        let mut dividers = 0;
        for row in &view.rows {
            match row {
                Row::Columns { columns } => assert_eq!(columns.len(), COLUMNS_PER_ROW),
                Row::Divider => dividers += 1,
            }
        }
        assert_eq!(dividers, 1);
        assert_eq!(view.rows.len(), 6);
    }

    #[test]
    fn test_failed_chart_becomes_inline_error() {
        let view = view(Err(SpecError::UnknownVariable("Province".to_string())));
        let Row::Columns { columns } = &view.rows[1] else {
            panic!("expected columns");
        };
        assert_eq!(columns[0].heading, None);
        assert_eq!(
            columns[0].content,
            Content::Error {
                message: "Variable 'Province' is not present in the summary".to_string()
            }
        );
        assert_eq!(
            columns[1].heading.as_deref(),
            Some("Customer Count Based on Generation")
        );
    }

    #[test]
    fn test_selectors_carry_options_and_selection() {
        let view = view(Err(SpecError::UnknownVariable("x".to_string())));
        let Row::Columns { columns } = &view.rows[3] else {
            panic!("expected columns");
        };
        match &columns[0].content {
            Content::AgeSlider { bounds, value, .. } => {
                assert_eq!(*bounds, AgeRange::new(18, 70));
                assert_eq!(*value, AgeRange::new(35, 50));
            }
            other => panic!("expected slider, got {:?}", other),
        }
        match &columns[1].content {
            Content::Selector {
                options, selected, ..
            } => {
                assert_eq!(options.len(), 2);
                assert_eq!(selected, "Average Annual Income");
            }
            other => panic!("expected selector, got {:?}", other),
        }
    }

    #[test]
    fn test_view_json_shape() {
        let json = serde_json::to_value(view(Err(SpecError::UnknownVariable("x".into())))).unwrap();
        assert_eq!(json["rows"][2]["kind"], "divider");
        assert_eq!(json["rows"][0]["columns"][0]["content"]["type"], "selector");
        assert_eq!(json["rows"][0]["columns"][0]["content"]["dimension"], "province");
        assert_eq!(json["title"], "Customer Demography Dashboard");
    }
}
