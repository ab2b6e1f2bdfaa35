use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One customer row. Field names follow the column names of the input tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub province: String,
    pub generation: String,
    #[serde(rename = "Profession")]
    pub profession: String,
    pub gender: String,
    pub age: u32,
    #[serde(rename = "Annual_Income")]
    pub annual_income: f64,
    #[serde(rename = "Spending_Score")]
    pub spending_score: f64,
}

impl CustomerRecord {
    pub const COLUMNS: [&'static str; 7] = [
        "province",
        "generation",
        "Profession",
        "gender",
        "age",
        "Annual_Income",
        "Spending_Score",
    ];

    pub fn category(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Province => &self.province,
            Dimension::Generation => &self.generation,
            Dimension::Profession => &self.profession,
            Dimension::Gender => &self.gender,
        }
    }

    pub fn measure(&self, measure: Measure) -> f64 {
        match measure {
            Measure::SpendingScore => self.spending_score,
            Measure::AnnualIncome => self.annual_income,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceCoordinate {
    pub province: String,
    // x = longitude, y = latitude
    pub location: Point<f64>,
}

impl ProvinceCoordinate {
    pub fn new(province: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            province: province.into(),
            location: Point::new(longitude, latitude),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.location.y()
    }

    pub fn longitude(&self) -> f64 {
        self.location.x()
    }
}

/// Categorical column customers are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Province,
    Generation,
    Profession,
    Gender,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Province,
        Dimension::Generation,
        Dimension::Profession,
        Dimension::Gender,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Dimension::Province => "province",
            Dimension::Generation => "generation",
            Dimension::Profession => "Profession",
            Dimension::Gender => "gender",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Province => "Province",
            Dimension::Generation => "Generation",
            Dimension::Profession => "Profession",
            Dimension::Gender => "Gender",
        }
    }

    /// Measures averaged for this dimension's chart, in column order.
    pub fn measures(self) -> &'static [Measure] {
        match self {
            Dimension::Province | Dimension::Gender => &[Measure::SpendingScore],
            Dimension::Generation | Dimension::Profession => {
                &[Measure::SpendingScore, Measure::AnnualIncome]
            }
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    SpendingScore,
    AnnualIncome,
}

impl Measure {
    pub fn column(self) -> &'static str {
        match self {
            Measure::SpendingScore => "Spending_Score",
            Measure::AnnualIncome => "Annual_Income",
        }
    }

    /// Variable name of the rounded mean in the long-form summary.
    pub fn average_label(self) -> &'static str {
        match self {
            Measure::SpendingScore => "Average Spending Score",
            Measure::AnnualIncome => "Average Annual Income",
        }
    }
}

pub const COUNT_VARIABLE: &str = "Count";

/// Closed age interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl AgeRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, age: u32) -> bool {
        (self.min..=self.max).contains(&age)
    }
}
