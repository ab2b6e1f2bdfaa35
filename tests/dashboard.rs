use customer_demography::charts::build_map_spec;
use customer_demography::config::AppConfig;
use customer_demography::dashboard::Dashboard;
use customer_demography::data::load_data;
use customer_demography::layout::{Content, Row};
use customer_demography::processing::{join_coordinates, summarize_dimension, JoinPolicy};
use customer_demography::types::Dimension;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn scenario() -> (TempDir, AppConfig) {
    let dir = tempfile::tempdir().unwrap();
    let customers = write(
        &dir,
        "customers.json",
        r#"[
            {"province": "A", "generation": "Gen Z", "Profession": "Artist", "gender": "Female",
             "age": 24, "Annual_Income": 100.0, "Spending_Score": 50},
            {"province": "A", "generation": "Gen X", "Profession": "Doctor", "gender": "Male",
             "age": 41, "Annual_Income": 300.0, "Spending_Score": 70},
            {"province": "B", "generation": "Gen X", "Profession": "Lawyer", "gender": "Female",
             "age": 48, "Annual_Income": 200.0, "Spending_Score": 90}
        ]"#,
    );
    let coordinates = write(&dir, "coordinate.csv", "province,longitude,latitude\nA,1,1\nB,2,2\n");

    let mut config_file = NamedTempFile::new_in(dir.path()).unwrap();
    write!(
        config_file,
        "[input]\ncustomers = {:?}\ncoordinates = {:?}\n",
        customers.to_str().unwrap(),
        coordinates.to_str().unwrap()
    )
    .unwrap();
    let config = AppConfig::load_from_file(config_file.path()).unwrap();
    (dir, config)
}

#[test]
fn test_province_scenario_end_to_end() {
    let (_dir, config) = scenario();
    let dataset = load_data(&config.input).unwrap();

    let province = summarize_dimension(&dataset.customers, Dimension::Province);
    let a = province.row("A").unwrap();
    assert_eq!((a.count, a.averages[0]), (2, 60.0));
    let b = province.row("B").unwrap();
    assert_eq!((b.count, b.averages[0]), (1, 90.0));

    let map = join_coordinates(&province, &dataset.coordinates, JoinPolicy::Lenient).unwrap();
    let provinces: Vec<_> = map.rows.iter().map(|r| r.province.as_str()).collect();
    assert_eq!(provinces, vec!["A", "B"]);
    assert!(map.unmatched_customers.is_empty());
    assert!(map.unmatched_coordinates.is_empty());

    let spec = build_map_spec(&map, "Average Spending Score").unwrap();
    assert_eq!(spec.markers[0].latitude, 1.0);
    assert_eq!(spec.markers[1].size, 90.0);
}

#[test]
fn test_session_flow_recomputes_gender_chart() {
    let (_dir, config) = scenario();
    let dataset = load_data(&config.input).unwrap();
    let dashboard = Dashboard::new(dataset, config.dashboard.clone(), JoinPolicy::Lenient).unwrap();

    let mut state = dashboard.new_session();
    // data bounds are 24..=48, so the default 35..=50 is clamped
    assert_eq!(state.snapshot().age_range.max, 48);

    let gender_values = |state: &customer_demography::state::FilterState| {
        let view = dashboard.render(&state.snapshot());
        match &view.rows[5] {
            Row::Columns { columns } => match &columns[0].content {
                Content::Bar { spec } => (spec.categories.clone(), spec.values.clone()),
                other => panic!("expected bar, got {:?}", other),
            },
            Row::Divider => panic!("unexpected divider"),
        }
    };

    assert_eq!(
        gender_values(&state),
        (vec!["Male".to_string(), "Female".to_string()], vec![1.0, 1.0])
    );

    state.update_age_range(24, 30).unwrap();
    assert_eq!(gender_values(&state), (vec!["Female".to_string()], vec![1.0]));

    assert!(state.update_age_range(30, 24).is_err());
    assert_eq!(gender_values(&state), (vec!["Female".to_string()], vec![1.0]));
}

#[test]
fn test_coordinate_only_province_left_off_map() {
    let (dir, mut config) = scenario();
    config.input.coordinates = write(
        &dir,
        "more.csv",
        "province,longitude,latitude\nA,1,1\nB,2,2\nC,3,3\n",
    );
    let dataset = load_data(&config.input).unwrap();
    let dashboard = Dashboard::new(dataset, config.dashboard.clone(), JoinPolicy::Strict).unwrap();

    let map = dashboard.map_summary();
    assert_eq!(map.rows.len(), 2);
    assert_eq!(map.unmatched_coordinates, vec!["C"]);
}
