use serde::{Deserialize, Serialize};
use std::fmt;

/// 部署情境：A 替換既有智慧攝影機、B 沿用既有 IP 攝影機、C 全新部署
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    A,
    B,
    C,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::A => "a",
            Scenario::B => "b",
            Scenario::C => "c",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "a" => Some(Scenario::A),
            "b" => Some(Scenario::B),
            "c" => Some(Scenario::C),
            _ => None,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoftwareSelection {
    #[default]
    None,
    Lpr,
    Mmcg,
    Both,
}

impl SoftwareSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoftwareSelection::None => "none",
            SoftwareSelection::Lpr => "lpr",
            SoftwareSelection::Mmcg => "mmcg",
            SoftwareSelection::Both => "both",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" => Some(SoftwareSelection::None),
            "lpr" => Some(SoftwareSelection::Lpr),
            "mmcg" => Some(SoftwareSelection::Mmcg),
            "both" => Some(SoftwareSelection::Both),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SoftwareSelection::None => "None",
            SoftwareSelection::Lpr => "LPR only",
            SoftwareSelection::Mmcg => "MMCG only",
            SoftwareSelection::Both => "LPR + MMCG (bundle)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Billing {
    #[default]
    Monthly,
    Yearly,
}

impl Billing {
    /// Only `yearly` (any case) selects yearly billing.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("yearly") {
            Billing::Yearly
        } else {
            Billing::Monthly
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Billing::Monthly => "monthly",
            Billing::Yearly => "yearly",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Billing::Monthly => "Monthly",
            Billing::Yearly => "Yearly",
        }
    }
}

/// Normalized calculator parameters, the only state that survives in the URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateParams {
    pub cameras: u32,
    pub smart_cost: f64,
    pub ip_cost: f64,
    pub software: SoftwareSelection,
    pub billing: Billing,
    pub has_smart_cameras: bool,
    pub has_existing_cameras: bool,
    pub today_software: f64,
    pub expand_breakdown: bool,
}

impl Default for EstimateParams {
    fn default() -> Self {
        Self {
            cameras: 0,
            smart_cost: crate::core::calc::DEFAULT_SMART_COST,
            ip_cost: crate::core::calc::DEFAULT_IP_COST,
            software: SoftwareSelection::None,
            billing: Billing::Monthly,
            has_smart_cameras: false,
            has_existing_cameras: false,
            today_software: 0.0,
            expand_breakdown: false,
        }
    }
}

impl EstimateParams {
    pub fn scenario(&self) -> Scenario {
        crate::core::calc::derive_scenario(self)
    }

    /// 依情境設定兩個旗標
    pub fn set_scenario(&mut self, scenario: Scenario) {
        self.has_smart_cameras = scenario == Scenario::A;
        self.has_existing_cameras = scenario == Scenario::B;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioLabels {
    pub today_label: String,
    pub sighthound_label: String,
    pub primary_label: String,
    pub cost_per_camera_label: String,
    pub deployment_intro: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareSummary {
    pub scenario: Scenario,
    pub cameras: u32,
    pub nodes_needed: u32,
    pub today_total: f64,
    pub sighthound_total: f64,
    pub savings: f64,
    pub percent_reduction: f64,
    pub cost_per_camera_before: f64,
    pub cost_per_camera_after: f64,
    pub labels: ScenarioLabels,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareSummary {
    pub selection: SoftwareSelection,
    pub billing: Billing,
    pub monthly_per_camera: f64,
    pub monthly_total: f64,
    pub yearly_total: f64,
    pub software_line: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub month: u32,
    pub today: f64,
    pub sighthound: f64,
}

/// Outcome of the break-even search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "month", rename_all = "camelCase")]
pub enum BreakEven {
    NotApplicable,
    LowerFromDayOne,
    AtMonth(u32),
    NoneWithinHorizon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiProjection {
    pub applicable: bool,
    pub break_even: BreakEven,
    pub headline: String,
    pub subtext: String,
    pub max_months: u32,
    pub data_points: Vec<DataPoint>,
}

impl RoiProjection {
    pub fn break_even_month(&self) -> Option<u32> {
        match self.break_even {
            BreakEven::AtMonth(m) => Some(m),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub today_line: String,
    pub nodes_line: String,
    pub cameras_line: String,
    pub software_line: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResults {
    pub params: EstimateParams,
    pub hardware: HardwareSummary,
    pub software: SoftwareSummary,
    pub roi: RoiProjection,
    pub breakdown: Breakdown,
}

impl ScenarioResults {
    pub fn scenario(&self) -> Scenario {
        self.hardware.scenario
    }

    pub fn nodes_needed(&self) -> u32 {
        self.hardware.nodes_needed
    }
}

/// 一份輸出檔案（檔名與內容）
#[derive(Debug, Clone)]
pub struct Artifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct RenderedEstimate {
    pub results: ScenarioResults,
    pub canonical_query: String,
    /// Shareable URL (or `?query` when no base URL was given).
    pub estimate_url: String,
    pub artifacts: Vec<Artifact>,
}
