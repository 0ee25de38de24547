//! Printable view of an estimate.
//!
//! The report holds display-ready strings only; the PDF adapter and the
//! terminal summary both read from it.

use crate::core::calc::compute_scenario_results;
use crate::core::format::{format_count, format_currency, format_percent};
use crate::domain::model::{EstimateParams, Scenario, ScenarioResults};
use chrono::NaiveDate;
use serde::Serialize;

pub const REPORT_TITLE: &str = "Hardware savings estimate";
const PLACEHOLDER: &str = "\u{2014}";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsSection {
    pub label: String,
    pub value: String,
    pub percent_reduction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateReport {
    pub title: String,
    pub generated_on: NaiveDate,
    pub scenario_label: String,
    pub deployment_intro: String,
    pub cameras: String,
    /// Only shown for smart-camera replacement.
    pub smart_cost: Option<String>,
    pub ip_cost: String,
    pub software_selection: String,
    pub billing: String,
    pub today_label: String,
    pub today_total: String,
    pub sighthound_label: String,
    pub sighthound_total: String,
    pub savings: Option<SavingsSection>,
    pub nodes: String,
    pub cost_per_camera_label: String,
    pub cost_per_camera_before: String,
    pub cost_per_camera_after: String,
    pub software_monthly: String,
    pub software_yearly: String,
    pub breakdown: Vec<String>,
    pub show_breakdown: bool,
    pub roi_headline: Option<String>,
    pub roi_subtext: Option<String>,
}

fn scenario_label(scenario: Scenario) -> &'static str {
    match scenario {
        Scenario::A => "Scenario A: smart cameras today",
        Scenario::B => "Scenario B: existing standard IP cameras",
        Scenario::C => "Scenario C: new deployment",
    }
}

impl EstimateReport {
    pub fn from_params(params: &EstimateParams, generated_on: NaiveDate) -> Self {
        Self::from_results(&compute_scenario_results(params), generated_on)
    }

    pub fn from_results(results: &ScenarioResults, generated_on: NaiveDate) -> Self {
        let hw = &results.hardware;
        let sw = &results.software;
        let params = &results.params;
        let scenario = results.scenario();

        let (today_label, today_total, sighthound_label) = match scenario {
            Scenario::A => (
                hw.labels.today_label.clone(),
                format_currency(hw.today_total),
                hw.labels.sighthound_label.clone(),
            ),
            Scenario::B => (
                "Existing camera hardware".to_string(),
                "Already installed".to_string(),
                "Upfront node cost".to_string(),
            ),
            Scenario::C => (
                "No current cameras (new deployment)".to_string(),
                PLACEHOLDER.to_string(),
                "New deployment hardware cost (nodes + cameras)".to_string(),
            ),
        };

        let savings = (scenario == Scenario::A).then(|| SavingsSection {
            label: hw.labels.primary_label.clone(),
            value: format_currency(hw.savings.abs()),
            percent_reduction: format_percent(hw.percent_reduction),
        });

        let cost_per_camera_before = if scenario == Scenario::A {
            format_currency(hw.cost_per_camera_before)
        } else {
            PLACEHOLDER.to_string()
        };

        let roi = &results.roi;
        let (roi_headline, roi_subtext) = if roi.applicable {
            (Some(roi.headline.clone()), Some(roi.subtext.clone()))
        } else {
            (None, None)
        };

        Self {
            title: REPORT_TITLE.to_string(),
            generated_on,
            scenario_label: scenario_label(scenario).to_string(),
            deployment_intro: hw.labels.deployment_intro.clone(),
            cameras: format_count(hw.cameras),
            smart_cost: (scenario == Scenario::A).then(|| format_currency(params.smart_cost)),
            ip_cost: format_currency(params.ip_cost),
            software_selection: sw.selection.label().to_string(),
            billing: sw.billing.label().to_string(),
            today_label,
            today_total,
            sighthound_label,
            sighthound_total: format_currency(hw.sighthound_total),
            savings,
            nodes: hw.nodes_needed.to_string(),
            cost_per_camera_label: hw.labels.cost_per_camera_label.clone(),
            cost_per_camera_before,
            cost_per_camera_after: format_currency(hw.cost_per_camera_after),
            software_monthly: format_currency(sw.monthly_total),
            software_yearly: format_currency(sw.yearly_total),
            breakdown: vec![
                results.breakdown.today_line.clone(),
                results.breakdown.nodes_line.clone(),
                results.breakdown.cameras_line.clone(),
                results.breakdown.software_line.clone(),
            ],
            show_breakdown: params.expand_breakdown,
            roi_headline,
            roi_subtext,
        }
    }

    /// Label/value rows of the input snapshot.
    pub fn input_rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Scenario", self.scenario_label.clone()),
            ("Cameras", self.cameras.clone()),
        ];
        if let Some(smart_cost) = &self.smart_cost {
            rows.push(("Smart camera cost", smart_cost.clone()));
        }
        rows.push(("IP camera cost", self.ip_cost.clone()));
        rows.push(("Software", self.software_selection.clone()));
        rows.push(("Billing", self.billing.clone()));
        rows
    }

    /// Label/value rows of the result cards.
    pub fn result_rows(&self) -> Vec<(String, String)> {
        let mut rows = vec![
            (self.today_label.clone(), self.today_total.clone()),
            (self.sighthound_label.clone(), self.sighthound_total.clone()),
        ];
        if let Some(savings) = &self.savings {
            rows.push((savings.label.clone(), savings.value.clone()));
            rows.push(("Cost reduction".to_string(), savings.percent_reduction.clone()));
        }
        rows.push(("Compute Nodes needed".to_string(), self.nodes.clone()));
        rows.push((
            format!("{} (before)", self.cost_per_camera_label),
            self.cost_per_camera_before.clone(),
        ));
        rows.push((
            format!("{} (after)", self.cost_per_camera_label),
            self.cost_per_camera_after.clone(),
        ));
        rows.push(("Software per month".to_string(), self.software_monthly.clone()));
        rows.push(("Software per year".to_string(), self.software_yearly.clone()));
        rows
    }

    /// Plain-text rendering for terminals.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{} ({})\n", self.title, self.generated_on));
        out.push_str(&format!("{}\n\n", self.deployment_intro));

        for (label, value) in self.input_rows() {
            out.push_str(&format!("  {:<22} {}\n", label, value));
        }
        out.push('\n');
        for (label, value) in self.result_rows() {
            out.push_str(&format!("  {:<56} {}\n", label, value));
        }

        if let Some(headline) = &self.roi_headline {
            out.push('\n');
            out.push_str(headline);
            out.push('\n');
            if let Some(subtext) = &self.roi_subtext {
                out.push_str(subtext);
                out.push('\n');
            }
        }

        if self.show_breakdown {
            out.push_str("\nBreakdown\n");
            for line in &self.breakdown {
                out.push_str(&format!("  {}\n", line));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::{normalize_params, read_params_from_query};

    fn report(query: &str) -> EstimateReport {
        let params = normalize_params(&read_params_from_query(query));
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        EstimateReport::from_params(&params, date)
    }

    #[test]
    fn test_replacement_report() {
        let r = report("cameras=50&hasSmartCameras=1&software=both&billing=yearly&todaySoftware=60");
        assert_eq!(r.title, "Hardware savings estimate");
        assert_eq!(r.scenario_label, "Scenario A: smart cameras today");
        assert_eq!(r.smart_cost.as_deref(), Some("$3,000.00"));
        assert_eq!(r.today_total, "$150,000.00");
        assert_eq!(r.sighthound_total, "$58,000.00");
        let savings = r.savings.as_ref().unwrap();
        assert_eq!(savings.label, "Savings vs today");
        assert_eq!(savings.value, "$92,000.00");
        assert_eq!(savings.percent_reduction, "61.3%");
        assert_eq!(r.nodes, "13");
        assert_eq!(r.software_selection, "LPR + MMCG (bundle)");
        assert_eq!(r.billing, "Yearly");
        assert_eq!(r.software_yearly, "$33,000.00");
        assert_eq!(r.roi_headline.as_deref(), Some("Lower cost from day one"));
    }

    #[test]
    fn test_extra_cost_shows_absolute_value() {
        let r = report("cameras=4&smartCost=100&hasSmartCameras=1");
        let savings = r.savings.unwrap();
        assert_eq!(savings.label, "Extra cost vs today");
        // today 400, sighthound 3500 + 1000 = 4500
        assert_eq!(savings.value, "$4,100.00");
    }

    #[test]
    fn test_reuse_report_hides_comparison() {
        let r = report("cameras=10&hasExistingCameras=1");
        assert_eq!(r.today_total, "Already installed");
        assert_eq!(r.sighthound_label, "Upfront node cost");
        assert!(r.savings.is_none());
        assert!(r.smart_cost.is_none());
        assert_eq!(r.cost_per_camera_before, "\u{2014}");
        assert!(r.roi_headline.is_none());
    }

    #[test]
    fn test_new_deployment_report() {
        let r = report("cameras=3");
        assert_eq!(r.today_label, "No current cameras (new deployment)");
        assert_eq!(r.today_total, "\u{2014}");
        assert_eq!(r.software_selection, "None");
        assert_eq!(r.billing, "Monthly");
    }

    #[test]
    fn test_text_rendering_respects_breakdown_flag() {
        let collapsed = report("cameras=50&hasSmartCameras=1").to_text();
        assert!(collapsed.contains("Hardware savings estimate (2026-10-18)"));
        assert!(!collapsed.contains("Breakdown"));

        let expanded = report("cameras=50&hasSmartCameras=1&expandBreakdown=1").to_text();
        assert!(expanded.contains("Breakdown"));
        assert!(expanded.contains("Compute Nodes: 13 x $3,500.00 = $45,500.00"));
    }
}
