//! Pricing formulas for the hardware/software comparison.
//!
//! Every function here is pure: it takes normalized [`EstimateParams`] and
//! returns plain result structs. Text labels live next to the numbers because
//! the report, the terminal summary and the JSON export all share them.

use crate::core::format::{format_count, format_currency};
use crate::domain::model::{
    BreakEven, Breakdown, DataPoint, EstimateParams, HardwareSummary, RoiProjection, Scenario,
    ScenarioLabels, ScenarioResults, SoftwareSelection, SoftwareSummary,
};

pub const CAMERAS_PER_NODE: u32 = 4;
pub const NODE_COST: f64 = 3500.0;
pub const DEFAULT_SMART_COST: f64 = 3000.0;
pub const DEFAULT_IP_COST: f64 = 250.0;
pub const ROI_HORIZON_MONTHS: u32 = 60;
const MIN_CHART_MONTHS: u32 = 24;

const SINGLE_SERVICE_RATE: f64 = 30.0;
const BUNDLE_RATE: f64 = 55.0;

const HEADLINE_DAY_ONE: &str = "Lower cost from day one";
const SUBTEXT_DAY_ONE: &str = "Total cost is lower immediately and stays lower over time.";
const HEADLINE_NO_BREAK_EVEN: &str = "No break-even within 60 months";
const SUBTEXT_NO_BREAK_EVEN: &str =
    "Based on your inputs, current setup remains lower cost over this timeframe.";
const SUBTEXT_BREAK_EVEN: &str = "After this point, Sighthound's total cost remains lower over time.";

pub fn nodes_needed(cameras: u32) -> u32 {
    cameras.div_ceil(CAMERAS_PER_NODE)
}

pub fn selection_rate(selection: SoftwareSelection) -> f64 {
    match selection {
        SoftwareSelection::None => 0.0,
        SoftwareSelection::Lpr | SoftwareSelection::Mmcg => SINGLE_SERVICE_RATE,
        SoftwareSelection::Both => BUNDLE_RATE,
    }
}

/// Monthly software price per camera for a raw selection string.
/// Unrecognized selections are priced as a single service.
pub fn software_price_per_camera(selection_raw: &str) -> f64 {
    SoftwareSelection::parse(selection_raw)
        .map(selection_rate)
        .unwrap_or(SINGLE_SERVICE_RATE)
}

pub fn derive_scenario(params: &EstimateParams) -> Scenario {
    if params.has_smart_cameras {
        Scenario::A
    } else if params.has_existing_cameras {
        Scenario::B
    } else {
        Scenario::C
    }
}

fn scenario_labels(scenario: Scenario, savings: f64) -> ScenarioLabels {
    match scenario {
        Scenario::A => ScenarioLabels {
            today_label: "Today \u{2013} smart AI cameras".to_string(),
            sighthound_label: "With Sighthound Compute Hardware".to_string(),
            primary_label: if savings >= 0.0 {
                "Savings vs today".to_string()
            } else {
                "Extra cost vs today".to_string()
            },
            cost_per_camera_label: "Cost per camera (hardware only)".to_string(),
            deployment_intro:
                "A quick breakdown of Compute Nodes required, cost reduction, and cost per camera."
                    .to_string(),
        },
        Scenario::B => ScenarioLabels {
            today_label: "Existing camera hardware".to_string(),
            sighthound_label: "Upfront node cost".to_string(),
            primary_label: String::new(),
            cost_per_camera_label: "Effective per-camera enablement cost (hardware only)"
                .to_string(),
            deployment_intro: "How many Compute Nodes you need and the effective hardware cost to enable analytics on existing cameras.".to_string(),
        },
        Scenario::C => ScenarioLabels {
            today_label: "Existing camera hardware".to_string(),
            sighthound_label: "New deployment hardware cost (nodes + cameras)".to_string(),
            primary_label: String::new(),
            cost_per_camera_label: "Cost per camera (hardware only)".to_string(),
            deployment_intro: "How many Compute Nodes you need and the average hardware cost per camera for this deployment.".to_string(),
        },
    }
}

pub fn compute_hardware(params: &EstimateParams) -> HardwareSummary {
    let scenario = derive_scenario(params);
    let cameras = params.cameras;
    let cams = f64::from(cameras);
    let nodes = nodes_needed(cameras);

    // 「今天」一律以智慧攝影機計價；情境 B 沿用既有攝影機，不計攝影機硬體
    let today_total = cams * params.smart_cost;
    let camera_hardware = match scenario {
        Scenario::B => 0.0,
        Scenario::A | Scenario::C => cams * params.ip_cost,
    };
    let sighthound_total = f64::from(nodes) * NODE_COST + camera_hardware;

    let (savings, percent_reduction, cost_per_camera_before, cost_per_camera_after) =
        if cameras > 0 {
            let savings = today_total - sighthound_total;
            let percent = if today_total == 0.0 {
                0.0
            } else {
                savings / today_total * 100.0
            };
            (savings, percent, today_total / cams, sighthound_total / cams)
        } else {
            (0.0, 0.0, 0.0, 0.0)
        };

    HardwareSummary {
        scenario,
        cameras,
        nodes_needed: nodes,
        today_total,
        sighthound_total,
        savings,
        percent_reduction,
        cost_per_camera_before,
        cost_per_camera_after,
        labels: scenario_labels(scenario, savings),
    }
}

pub fn compute_software(params: &EstimateParams, cameras: u32) -> SoftwareSummary {
    let monthly_per_camera = selection_rate(params.software);
    let monthly_total = if cameras > 0 {
        f64::from(cameras) * monthly_per_camera
    } else {
        0.0
    };
    let yearly_total = monthly_total * 12.0;

    let software_line = if monthly_total > 0.0 {
        match params.billing {
            crate::domain::model::Billing::Yearly => format!(
                "Your software costs: {} x {} per camera per year = {} per year.",
                format_count(cameras),
                format_currency(yearly_total / f64::from(cameras)),
                format_currency(yearly_total)
            ),
            crate::domain::model::Billing::Monthly => format!(
                "Your software costs: {} x {} per camera per month = {} per month.",
                format_count(cameras),
                format_currency(monthly_per_camera),
                format_currency(monthly_total)
            ),
        }
    } else {
        "Your software costs are calculated per camera per month and shown separately from hardware."
            .to_string()
    };

    SoftwareSummary {
        selection: params.software,
        billing: params.billing,
        monthly_per_camera,
        monthly_total,
        yearly_total,
        software_line,
    }
}

/// Classifies the break-even month from the hardware gap and the monthly
/// software gap between the status quo and the new system.
pub fn classify_break_even(hardware_diff: f64, software_diff: f64) -> BreakEven {
    if software_diff == 0.0 {
        // 兩條線平行：只比較硬體
        return if hardware_diff <= 0.0 {
            BreakEven::LowerFromDayOne
        } else {
            BreakEven::NoneWithinHorizon
        };
    }

    let m = hardware_diff / software_diff;
    if m <= 0.0 {
        BreakEven::LowerFromDayOne
    } else if m > f64::from(ROI_HORIZON_MONTHS) {
        BreakEven::NoneWithinHorizon
    } else {
        BreakEven::AtMonth(m.ceil() as u32)
    }
}

/// Months plotted for a given outcome.
pub fn chart_horizon(break_even: BreakEven) -> u32 {
    match break_even {
        BreakEven::AtMonth(month) => {
            let stretched = (f64::from(month) * 1.5).ceil() as u32;
            stretched.max(MIN_CHART_MONTHS).min(ROI_HORIZON_MONTHS)
        }
        _ => ROI_HORIZON_MONTHS,
    }
}

pub fn compute_roi(
    params: &EstimateParams,
    hardware: &HardwareSummary,
    software: &SoftwareSummary,
) -> RoiProjection {
    let applicable = hardware.scenario == Scenario::A
        && software.selection != SoftwareSelection::None
        && hardware.cameras > 0;

    if !applicable {
        return RoiProjection {
            applicable: false,
            break_even: BreakEven::NotApplicable,
            headline: String::new(),
            subtext: String::new(),
            max_months: ROI_HORIZON_MONTHS,
            data_points: Vec::new(),
        };
    }

    let today_software_monthly = params.today_software * f64::from(hardware.cameras);
    let sighthound_software_monthly = software.monthly_total;

    let break_even = classify_break_even(
        hardware.sighthound_total - hardware.today_total,
        today_software_monthly - sighthound_software_monthly,
    );

    let (headline, subtext) = match break_even {
        BreakEven::AtMonth(month) => (
            format!("Break-even in {} months", month),
            SUBTEXT_BREAK_EVEN.to_string(),
        ),
        BreakEven::LowerFromDayOne => (HEADLINE_DAY_ONE.to_string(), SUBTEXT_DAY_ONE.to_string()),
        _ => (
            HEADLINE_NO_BREAK_EVEN.to_string(),
            SUBTEXT_NO_BREAK_EVEN.to_string(),
        ),
    };

    let max_months = chart_horizon(break_even);
    let data_points = (0..=max_months)
        .map(|month| {
            let m = f64::from(month);
            DataPoint {
                month,
                today: hardware.today_total + today_software_monthly * m,
                sighthound: hardware.sighthound_total + sighthound_software_monthly * m,
            }
        })
        .collect();

    RoiProjection {
        applicable: true,
        break_even,
        headline,
        subtext,
        max_months,
        data_points,
    }
}

fn breakdown_lines(params: &EstimateParams, hardware: &HardwareSummary, software: &SoftwareSummary) -> Breakdown {
    let cams = hardware.cameras;

    let today_line = match hardware.scenario {
        Scenario::A => format!(
            "Cameras: {} x {} = {}",
            format_count(cams),
            format_currency(params.smart_cost),
            format_currency(f64::from(cams) * params.smart_cost)
        ),
        Scenario::B => {
            "Existing cameras: already installed (no new camera hardware cost modeled here)."
                .to_string()
        }
        Scenario::C => "No existing cameras (new deployment).".to_string(),
    };

    let nodes = hardware.nodes_needed;
    let nodes_line = format!(
        "Compute Nodes: {} x {} = {}",
        format_count(nodes),
        format_currency(NODE_COST),
        format_currency(f64::from(nodes) * NODE_COST)
    );

    let cameras_line = match hardware.scenario {
        Scenario::B => format!("Reusing existing cameras: {}", format_currency(0.0)),
        Scenario::A | Scenario::C => format!(
            "Standard IP cameras: {} x {} = {}",
            format_count(cams),
            format_currency(params.ip_cost),
            format_currency(f64::from(cams) * params.ip_cost)
        ),
    };

    Breakdown {
        today_line,
        nodes_line,
        cameras_line,
        software_line: software.software_line.clone(),
    }
}

pub fn compute_scenario_results(params: &EstimateParams) -> ScenarioResults {
    let hardware = compute_hardware(params);
    let software = compute_software(params, hardware.cameras);
    let roi = compute_roi(params, &hardware, &software);
    let breakdown = breakdown_lines(params, &hardware, &software);

    tracing::debug!(
        scenario = %hardware.scenario,
        cameras = hardware.cameras,
        nodes = hardware.nodes_needed,
        "Computed scenario results"
    );

    ScenarioResults {
        params: params.clone(),
        hardware,
        software,
        roi,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Billing;
    use float_cmp::approx_eq;

    fn params(cameras: u32, scenario: Scenario) -> EstimateParams {
        let mut p = EstimateParams {
            cameras,
            ..EstimateParams::default()
        };
        p.set_scenario(scenario);
        p
    }

    #[test]
    fn test_nodes_needed() {
        assert_eq!(nodes_needed(0), 0);
        assert_eq!(nodes_needed(1), 1);
        assert_eq!(nodes_needed(4), 1);
        assert_eq!(nodes_needed(5), 2);
        assert_eq!(nodes_needed(50), 13);
        assert_eq!(nodes_needed(10_000), 2_500);
    }

    #[test]
    fn test_software_price_per_camera() {
        assert_eq!(software_price_per_camera("none"), 0.0);
        assert_eq!(software_price_per_camera("lpr"), 30.0);
        assert_eq!(software_price_per_camera("MMCG"), 30.0);
        assert_eq!(software_price_per_camera("both"), 55.0);
        assert_eq!(software_price_per_camera("everything"), 30.0);
        assert_eq!(software_price_per_camera(""), 30.0);
    }

    #[test]
    fn test_derive_scenario_prefers_smart_flag() {
        let mut p = EstimateParams::default();
        assert_eq!(derive_scenario(&p), Scenario::C);
        p.has_existing_cameras = true;
        assert_eq!(derive_scenario(&p), Scenario::B);
        p.has_smart_cameras = true;
        assert_eq!(derive_scenario(&p), Scenario::A);
    }

    #[test]
    fn test_replacement_example_fifty_cameras() {
        let hw = compute_hardware(&params(50, Scenario::A));

        assert_eq!(hw.nodes_needed, 13);
        assert!(approx_eq!(f64, hw.today_total, 150_000.0));
        assert!(approx_eq!(f64, hw.sighthound_total, 58_000.0));
        assert!(approx_eq!(f64, hw.savings, 92_000.0));
        assert!((hw.percent_reduction - 61.333).abs() < 0.01);
        assert!(approx_eq!(f64, hw.cost_per_camera_before, 3000.0));
        assert!(approx_eq!(f64, hw.cost_per_camera_after, 1160.0));
        assert_eq!(hw.labels.primary_label, "Savings vs today");
    }

    #[test]
    fn test_reuse_scenario_has_no_camera_hardware() {
        let hw = compute_hardware(&params(50, Scenario::B));
        assert!(approx_eq!(f64, hw.sighthound_total, 13.0 * 3500.0));
        assert!(approx_eq!(f64, hw.today_total, 150_000.0));
        assert_eq!(hw.labels.sighthound_label, "Upfront node cost");
    }

    #[test]
    fn test_new_deployment_counts_nodes_and_cameras() {
        let mut p = params(7, Scenario::C);
        p.ip_cost = 400.0;
        let hw = compute_hardware(&p);
        assert_eq!(hw.nodes_needed, 2);
        assert!(approx_eq!(f64, hw.sighthound_total, 7000.0 + 2800.0));
    }

    #[test]
    fn test_zero_cameras() {
        let hw = compute_hardware(&params(0, Scenario::A));
        assert_eq!(hw.nodes_needed, 0);
        assert_eq!(hw.today_total, 0.0);
        assert_eq!(hw.sighthound_total, 0.0);
        assert_eq!(hw.savings, 0.0);
        assert_eq!(hw.percent_reduction, 0.0);
        assert_eq!(hw.cost_per_camera_after, 0.0);
    }

    #[test]
    fn test_zero_smart_cost_has_zero_percent() {
        let mut p = params(8, Scenario::A);
        p.smart_cost = 0.0;
        let hw = compute_hardware(&p);
        assert_eq!(hw.today_total, 0.0);
        assert_eq!(hw.percent_reduction, 0.0);
        assert!(hw.savings < 0.0);
        assert_eq!(hw.labels.primary_label, "Extra cost vs today");
    }

    #[test]
    fn test_software_totals_and_lines() {
        let mut p = params(50, Scenario::A);
        p.software = SoftwareSelection::Both;
        let sw = compute_software(&p, 50);
        assert!(approx_eq!(f64, sw.monthly_total, 2750.0));
        assert!(approx_eq!(f64, sw.yearly_total, 33_000.0));
        assert_eq!(
            sw.software_line,
            "Your software costs: 50 x $55.00 per camera per month = $2,750.00 per month."
        );

        p.billing = Billing::Yearly;
        let sw = compute_software(&p, 50);
        assert_eq!(
            sw.software_line,
            "Your software costs: 50 x $660.00 per camera per year = $33,000.00 per year."
        );

        p.software = SoftwareSelection::None;
        let sw = compute_software(&p, 50);
        assert_eq!(sw.monthly_total, 0.0);
        assert!(sw.software_line.starts_with("Your software costs are calculated"));
    }

    #[test]
    fn test_classify_break_even() {
        assert_eq!(classify_break_even(-10.0, 0.0), BreakEven::LowerFromDayOne);
        assert_eq!(classify_break_even(0.0, 0.0), BreakEven::LowerFromDayOne);
        assert_eq!(classify_break_even(10.0, 0.0), BreakEven::NoneWithinHorizon);
        assert_eq!(classify_break_even(-1000.0, 100.0), BreakEven::LowerFromDayOne);
        assert_eq!(classify_break_even(1000.0, 100.0), BreakEven::AtMonth(10));
        assert_eq!(classify_break_even(1050.0, 100.0), BreakEven::AtMonth(11));
        assert_eq!(classify_break_even(6000.0, 100.0), BreakEven::AtMonth(60));
        assert_eq!(classify_break_even(6001.0, 100.0), BreakEven::NoneWithinHorizon);
        // 負的軟體差額且硬體較貴：m 為負，視為第一天即較低
        assert_eq!(classify_break_even(1000.0, -100.0), BreakEven::LowerFromDayOne);
    }

    #[test]
    fn test_chart_horizon() {
        assert_eq!(chart_horizon(BreakEven::AtMonth(4)), 24);
        assert_eq!(chart_horizon(BreakEven::AtMonth(20)), 30);
        assert_eq!(chart_horizon(BreakEven::AtMonth(50)), 60);
        assert_eq!(chart_horizon(BreakEven::LowerFromDayOne), 60);
    }

    #[test]
    fn test_roi_not_applicable_outside_replacement() {
        let mut p = params(50, Scenario::B);
        p.software = SoftwareSelection::Both;
        let results = compute_scenario_results(&p);
        assert!(!results.roi.applicable);
        assert!(results.roi.data_points.is_empty());
        assert_eq!(results.roi.break_even, BreakEven::NotApplicable);

        let mut p = params(50, Scenario::A);
        p.software = SoftwareSelection::None;
        assert!(!compute_scenario_results(&p).roi.applicable);
    }

    #[test]
    fn test_roi_lower_from_day_one() {
        let mut p = params(50, Scenario::A);
        p.software = SoftwareSelection::Lpr;
        p.today_software = 30.0;
        let roi = compute_scenario_results(&p).roi;
        assert!(roi.applicable);
        assert_eq!(roi.break_even, BreakEven::LowerFromDayOne);
        assert_eq!(roi.headline, "Lower cost from day one");
        assert_eq!(roi.max_months, 60);
        assert_eq!(roi.data_points.len(), 61);
        assert!(approx_eq!(f64, roi.data_points[0].today, 150_000.0));
        assert!(approx_eq!(f64, roi.data_points[0].sighthound, 58_000.0));
    }

    #[test]
    fn test_roi_break_even_month() {
        // 硬體較貴（智慧攝影機很便宜），但目前軟體費用較高
        let mut p = params(10, Scenario::A);
        p.smart_cost = 500.0;
        p.software = SoftwareSelection::Lpr;
        p.today_software = 80.0;
        let results = compute_scenario_results(&p);
        // hardware: today 5000, sighthound 3*3500 + 10*250 = 13000, diff 8000
        // software: today 800/mo, sighthound 300/mo, diff 500 → m = 16
        assert_eq!(results.roi.break_even, BreakEven::AtMonth(16));
        assert_eq!(results.roi.break_even_month(), Some(16));
        assert_eq!(results.roi.headline, "Break-even in 16 months");
        assert_eq!(results.roi.max_months, 24);
        let at_break_even = results.roi.data_points[16];
        assert!(approx_eq!(f64, at_break_even.today, at_break_even.sighthound));
    }

    #[test]
    fn test_breakdown_lines() {
        let results = compute_scenario_results(&params(50, Scenario::A));
        assert_eq!(results.breakdown.today_line, "Cameras: 50 x $3,000.00 = $150,000.00");
        assert_eq!(results.breakdown.nodes_line, "Compute Nodes: 13 x $3,500.00 = $45,500.00");
        assert_eq!(
            results.breakdown.cameras_line,
            "Standard IP cameras: 50 x $250.00 = $12,500.00"
        );

        let results = compute_scenario_results(&params(50, Scenario::B));
        assert_eq!(results.breakdown.cameras_line, "Reusing existing cameras: $0.00");
    }
}
