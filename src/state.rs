//! Per-session widget state.
//!
//! A [`FilterState`] is owned by exactly one session. Updates are validated
//! before anything is written, so a rejected update leaves the previous
//! selection untouched, and renderers only ever read an owned [`Selection`]
//! snapshot.

use crate::error::ValidationError;
use crate::types::{AgeRange, Dimension, COUNT_VARIABLE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Current value of every dashboard control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Map marker size variable.
    pub province: String,
    pub generation: String,
    pub profession: String,
    pub gender: String,
    pub age_range: AgeRange,
}

impl Selection {
    pub fn variable(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Province => &self.province,
            Dimension::Generation => &self.generation,
            Dimension::Profession => &self.profession,
            Dimension::Gender => &self.gender,
        }
    }

    fn variable_mut(&mut self, dimension: Dimension) -> &mut String {
        match dimension {
            Dimension::Province => &mut self.province,
            Dimension::Generation => &mut self.generation,
            Dimension::Profession => &mut self.profession,
            Dimension::Gender => &mut self.gender,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterState {
    options: HashMap<Dimension, Vec<String>>,
    age_bounds: AgeRange,
    selection: Selection,
}

impl FilterState {
    /// Builds the default state: the first option of every selector, and
    /// `default_age` clamped into `age_bounds`.
    pub fn new(
        options: HashMap<Dimension, Vec<String>>,
        age_bounds: AgeRange,
        default_age: AgeRange,
    ) -> Self {
        let first = |dimension: Dimension| {
            options
                .get(&dimension)
                .and_then(|o| o.first())
                .cloned()
                .unwrap_or_else(|| COUNT_VARIABLE.to_string())
        };

        let selection = Selection {
            province: first(Dimension::Province),
            generation: first(Dimension::Generation),
            profession: first(Dimension::Profession),
            gender: first(Dimension::Gender),
            age_range: clamp_range(default_age, age_bounds),
        };

        Self {
            options,
            age_bounds,
            selection,
        }
    }

    pub fn options(&self, dimension: Dimension) -> &[String] {
        self.options
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn age_bounds(&self) -> AgeRange {
        self.age_bounds
    }

    /// Replaces the selected variable of one selector.
    pub fn update(&mut self, dimension: Dimension, variable: &str) -> Result<(), ValidationError> {
        if !self.options(dimension).iter().any(|o| o == variable) {
            return Err(ValidationError::UnknownVariable {
                dimension: dimension.to_string(),
                variable: variable.to_string(),
            });
        }
        debug!(%dimension, variable, "Selector updated");
        *self.selection.variable_mut(dimension) = variable.to_string();
        Ok(())
    }

    pub fn update_age_range(&mut self, min: u32, max: u32) -> Result<(), ValidationError> {
        if min > max {
            return Err(ValidationError::InvertedAgeRange { min, max });
        }
        let bounds = self.age_bounds;
        if min < bounds.min || max > bounds.max {
            return Err(ValidationError::AgeOutOfBounds {
                min,
                max,
                lower: bounds.min,
                upper: bounds.max,
            });
        }
        debug!(min, max, "Age range updated");
        self.selection.age_range = AgeRange::new(min, max);
        Ok(())
    }

    pub fn snapshot(&self) -> Selection {
        self.selection.clone()
    }
}

fn clamp_range(range: AgeRange, bounds: AgeRange) -> AgeRange {
    let min = range.min.clamp(bounds.min, bounds.max);
    let max = range.max.clamp(bounds.min, bounds.max);
    if min > max {
        bounds
    } else {
        AgeRange::new(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> HashMap<Dimension, Vec<String>> {
        let two = vec!["Count".to_string(), "Average Spending Score".to_string()];
        let three = vec![
            "Count".to_string(),
            "Average Spending Score".to_string(),
            "Average Annual Income".to_string(),
        ];
        HashMap::from([
            (Dimension::Province, two.clone()),
            (Dimension::Generation, three.clone()),
            (Dimension::Profession, three),
            (Dimension::Gender, two),
        ])
    }

    fn state() -> FilterState {
        FilterState::new(options(), AgeRange::new(18, 70), AgeRange::new(35, 50))
    }

    #[test]
    fn test_defaults() {
        let selection = state().snapshot();
        for dimension in Dimension::ALL {
            assert_eq!(selection.variable(dimension), "Count");
        }
        assert_eq!(selection.age_range, AgeRange::new(35, 50));
    }

    #[test]
    fn test_default_age_clamped_into_bounds() {
        let s = FilterState::new(options(), AgeRange::new(40, 45), AgeRange::new(35, 50));
        assert_eq!(s.snapshot().age_range, AgeRange::new(40, 45));

        let s = FilterState::new(options(), AgeRange::new(60, 80), AgeRange::new(35, 50));
        assert_eq!(s.snapshot().age_range, AgeRange::new(60, 60));
    }

    #[test]
    fn test_update_variable() {
        let mut s = state();
        s.update(Dimension::Profession, "Average Annual Income").unwrap();

        let selection = s.snapshot();
        assert_eq!(selection.profession, "Average Annual Income");
        assert_eq!(selection.generation, "Count");
    }

    #[test]
    fn test_unknown_variable_keeps_prior_state() {
        let mut s = state();
        s.update(Dimension::Gender, "Average Spending Score").unwrap();
        let before = s.snapshot();

        let err = s.update(Dimension::Gender, "Average Annual Income").unwrap_err();
        assert!(matches!(err, ValidationError::UnknownVariable { .. }));
        assert_eq!(s.snapshot(), before);
    }

    #[test]
    fn test_update_age_range() {
        let mut s = state();
        s.update_age_range(20, 30).unwrap();
        assert_eq!(s.snapshot().age_range, AgeRange::new(20, 30));

        s.update_age_range(25, 25).unwrap();
        assert_eq!(s.snapshot().age_range, AgeRange::new(25, 25));
    }

    #[test]
    fn test_inverted_age_range_rejected() {
        let mut s = state();
        assert_eq!(
            s.update_age_range(50, 40),
            Err(ValidationError::InvertedAgeRange { min: 50, max: 40 })
        );
        assert_eq!(s.snapshot().age_range, AgeRange::new(35, 50));
    }

    #[test]
    fn test_age_range_outside_bounds_rejected() {
        let mut s = state();
        assert!(matches!(
            s.update_age_range(10, 30),
            Err(ValidationError::AgeOutOfBounds { .. })
        ));
        assert!(s.update_age_range(30, 71).is_err());
        assert_eq!(s.snapshot().age_range, AgeRange::new(35, 50));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut s = state();
        let before = s.snapshot();
        s.update(Dimension::Province, "Average Spending Score").unwrap();

        assert_eq!(before.province, "Count");
        assert_eq!(s.snapshot().province, "Average Spending Score");
    }
}
