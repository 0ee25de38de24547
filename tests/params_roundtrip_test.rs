use float_cmp::approx_eq;
use sighthound_estimator::core::calc::compute_scenario_results;
use sighthound_estimator::core::params::{
    build_search_from_params, ensure_print_mode, mode_switch_url, normalize_params,
    read_params_from_query, Mode,
};
use sighthound_estimator::domain::model::{BreakEven, Scenario};
use url::Url;

#[test]
fn test_canonical_query_survives_a_round_trip() {
    let queries = [
        "cameras=50&hasSmartCameras=1&software=both&todaySoftware=60",
        "cameras=12&smartCost=2500.5&ipCost=199&billing=yearly&hasExistingCameras=1",
        "cameras=7&expandBreakdown=1",
        "",
    ];

    for query in queries {
        let params = normalize_params(&read_params_from_query(query));
        let search = build_search_from_params(&params);
        let again = normalize_params(&read_params_from_query(&search));
        assert_eq!(params, again, "query {:?}", query);
        assert_eq!(search, build_search_from_params(&again));
    }
}

#[test]
fn test_legacy_keys_normalize_to_canonical_encoding() {
    let params = normalize_params(&read_params_from_query("cameras=8&smart=1800&dumb=120&scenario=a"));
    assert_eq!(params.scenario(), Scenario::A);
    assert_eq!(
        build_search_from_params(&params),
        "cameras=8&smartCost=1800&ipCost=120&hasSmartCameras=1"
    );
}

#[test]
fn test_fifty_camera_replacement() {
    let params = normalize_params(&read_params_from_query(
        "cameras=50&hasSmartCameras=1&software=both&todaySoftware=60",
    ));
    let results = compute_scenario_results(&params);

    assert_eq!(results.nodes_needed(), 13);
    assert!(approx_eq!(f64, results.hardware.today_total, 150_000.0));
    assert!(approx_eq!(f64, results.hardware.sighthound_total, 58_000.0));
    assert!(approx_eq!(f64, results.hardware.percent_reduction, 92_000.0 / 150_000.0 * 100.0, epsilon = 1e-9));
    assert!(approx_eq!(f64, results.software.monthly_total, 2_750.0));
    assert_eq!(results.roi.break_even, BreakEven::LowerFromDayOne);
}

#[test]
fn test_break_even_month_and_projection() {
    let params = normalize_params(&read_params_from_query(
        "cameras=10&smartCost=500&hasSmartCameras=1&software=lpr&todaySoftware=80",
    ));
    let roi = compute_scenario_results(&params).roi;

    assert_eq!(roi.break_even, BreakEven::AtMonth(16));
    assert_eq!(roi.headline, "Break-even in 16 months");
    assert_eq!(roi.max_months, 24);
    assert_eq!(roi.data_points.len(), 25);

    let at_break_even = roi.data_points[16];
    assert!(at_break_even.sighthound <= at_break_even.today);
    let before = roi.data_points[15];
    assert!(before.sighthound > before.today);
}

#[test]
fn test_mode_links_keep_calculator_state() {
    let current = Url::parse(
        "https://estimator.example.com/index.html?utm_source=mail&cameras=20&software=mmcg",
    )
    .unwrap();

    let live = mode_switch_url(&current, Mode::Live).unwrap();
    assert_eq!(live.path(), "/live.html");
    assert!(live.as_str().contains("cameras=20"));

    let print = ensure_print_mode(current.as_str()).unwrap();
    assert!(print.ends_with("print=1"));
    assert_eq!(ensure_print_mode(&print).unwrap(), print);
}
