use crate::processing::MapSummary;
use crate::types::COUNT_VARIABLE;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

/// Map markers as GeoJSON points, with the province summary as properties.
pub fn map_feature_collection(map: &MapSummary) -> FeatureCollection {
    let features = map
        .rows
        .iter()
        .map(|row| {
            let mut properties = JsonObject::new();
            properties.insert("province".to_string(), row.province.clone().into());
            properties.insert(COUNT_VARIABLE.to_string(), row.count.into());
            for (measure, average) in map.measures.iter().zip(&row.averages) {
                properties.insert(measure.average_label().to_string(), (*average).into());
            }

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![row.longitude, row.latitude]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::MapRow;
    use crate::types::Measure;
    use geojson::GeoJson;

    #[test]
    fn test_feature_per_province() {
        let map = MapSummary {
            measures: vec![Measure::SpendingScore],
            rows: vec![MapRow {
                province: "Bali".to_string(),
                latitude: -8.4,
                longitude: 115.2,
                count: 12,
                averages: vec![55.25],
            }],
            unmatched_customers: vec![],
            unmatched_coordinates: vec![],
        };

        let collection = map_feature_collection(&map);
        assert_eq!(collection.features.len(), 1);

        let feature = &collection.features[0];
        assert_eq!(feature.property("province").unwrap(), "Bali");
        assert_eq!(feature.property("Count").unwrap(), 12);
        assert_eq!(feature.property("Average Spending Score").unwrap(), 55.25);
        match &feature.geometry.as_ref().unwrap().value {
            Value::Point(coords) => assert_eq!(coords, &vec![115.2, -8.4]),
            other => panic!("expected point, got {:?}", other),
        }

        let text = GeoJson::from(collection).to_string();
        assert!(text.contains("FeatureCollection"));
    }
}
