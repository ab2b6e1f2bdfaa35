use crate::charts::{build_bar_spec, build_map_spec, Orientation, Sort};
use crate::config::DashboardConfig;
use crate::data::Dataset;
use crate::error::JoinError;
use crate::layout::{compose, DashboardView, Panels};
use crate::processing::{
    join_coordinates, summarize_dimension, summarize_gender, DimensionSummary, JoinPolicy,
    MapSummary,
};
use crate::state::{FilterState, Selection};
use crate::types::{AgeRange, CustomerRecord, Dimension};
use std::collections::HashMap;
use tracing::{info, warn};

/// Loaded data plus the summaries that do not depend on any filter.
pub struct Dashboard {
    customers: Vec<CustomerRecord>,
    map: MapSummary,
    generation: DimensionSummary,
    profession: DimensionSummary,
    options: HashMap<Dimension, Vec<String>>,
    age_bounds: AgeRange,
    settings: DashboardConfig,
}

impl Dashboard {
    pub fn new(
        dataset: Dataset,
        settings: DashboardConfig,
        policy: JoinPolicy,
    ) -> Result<Self, JoinError> {
        let (min_age, max_age) = dataset.age_bounds();
        let province = summarize_dimension(&dataset.customers, Dimension::Province);
        let map = join_coordinates(&province, &dataset.coordinates, policy)?;
        let generation = summarize_dimension(&dataset.customers, Dimension::Generation);
        let profession = summarize_dimension(&dataset.customers, Dimension::Profession);
        // Built from the measure list so the options stay fixed even when the age filter
        // leaves no customers.
        let gender = summarize_gender(&[], AgeRange::new(min_age, max_age));

        let options = HashMap::from([
            (Dimension::Province, map.variables()),
            (Dimension::Generation, generation.variables()),
            (Dimension::Profession, profession.variables()),
            (Dimension::Gender, gender.variables()),
        ]);

        info!(
            customers = dataset.customers.len(),
            provinces = map.rows.len(),
            generations = generation.rows.len(),
            professions = profession.rows.len(),
            min_age,
            max_age,
            "Dashboard ready"
        );

        Ok(Self {
            customers: dataset.customers,
            map,
            generation,
            profession,
            options,
            age_bounds: AgeRange::new(min_age, max_age),
            settings,
        })
    }

    pub fn map_summary(&self) -> &MapSummary {
        &self.map
    }

    pub fn age_bounds(&self) -> AgeRange {
        self.age_bounds
    }

    pub fn options(&self) -> &HashMap<Dimension, Vec<String>> {
        &self.options
    }

    /// Fresh filter state with every control at its default.
    pub fn new_session(&self) -> FilterState {
        let [min, max] = self.settings.default_age_range;
        FilterState::new(
            self.options.clone(),
            self.age_bounds,
            AgeRange::new(min.min(max), max.max(min)),
        )
    }

    /// Recomputes the whole view for `selection`.
    pub fn render(&self, selection: &Selection) -> DashboardView {
        let range = selection.age_range;

        let map = build_map_spec(&self.map, &selection.province)
            .map(|spec| spec.with_zoom(self.settings.map_zoom));

        let generation = build_bar_spec(
            &self.generation.to_long_form(),
            Orientation::Vertical,
            &selection.generation,
            Sort::Source,
        );

        let gender = build_bar_spec(
            &summarize_gender(&self.customers, range).to_long_form(),
            Orientation::Horizontal,
            &selection.gender,
            Sort::Source,
        )
        .map(|spec| {
            spec.with_title(format!(
                "Customer {} Based on Gender, Age {} to {}",
                selection.gender, range.min, range.max
            ))
        });

        let profession = build_bar_spec(
            &self.profession.to_long_form(),
            Orientation::Horizontal,
            &selection.profession,
            Sort::Ascending,
        );

        if let Err(e) = &map {
            warn!(chart = "map", error = %e, "Chart could not be bound");
        }
        for (chart, result) in [
            ("generation", &generation),
            ("gender", &gender),
            ("profession", &profession),
        ] {
            if let Err(e) = result {
                warn!(chart, error = %e, "Chart could not be bound");
            }
        }

        compose(
            &self.settings,
            selection,
            self.age_bounds,
            &self.options,
            Panels {
                map,
                generation,
                gender,
                profession,
            },
        )
    }
}
