//! Query-string codec for [`EstimateParams`].
//!
//! Reading is lenient (unknown keys are ignored, bad numbers fall back to
//! defaults, legacy `smart`/`dumb`/`scenario` keys are still understood) and
//! writing is canonical: fixed key order with default values omitted, so
//! `normalize(read(build(p))) == p`.

use crate::core::calc::{DEFAULT_IP_COST, DEFAULT_SMART_COST};
use crate::domain::model::{Billing, EstimateParams, Scenario, SoftwareSelection};
use crate::utils::error::Result;
use std::collections::BTreeMap;
use url::form_urlencoded;
use url::Url;

pub const PARAM_CAMERAS: &str = "cameras";
pub const PARAM_SMART_COST: &str = "smartCost";
pub const PARAM_IP_COST: &str = "ipCost";
pub const PARAM_SOFTWARE: &str = "software";
pub const PARAM_BILLING: &str = "billing";
pub const PARAM_HAS_SMART: &str = "hasSmartCameras";
pub const PARAM_HAS_EXISTING: &str = "hasExistingCameras";
pub const PARAM_TODAY_SOFTWARE: &str = "todaySoftware";
pub const PARAM_EXPAND_BREAKDOWN: &str = "expandBreakdown";
pub const PARAM_PRINT: &str = "print";

// 舊版頁面使用的鍵
const LEGACY_SMART: &str = "smart";
const LEGACY_DUMB: &str = "dumb";
const LEGACY_SCENARIO: &str = "scenario";

/// Every key owned by the calculator, in canonical order.
pub const CALCULATOR_KEYS: [&str; 12] = [
    PARAM_CAMERAS,
    PARAM_SMART_COST,
    PARAM_IP_COST,
    PARAM_SOFTWARE,
    PARAM_BILLING,
    PARAM_HAS_SMART,
    PARAM_HAS_EXISTING,
    PARAM_TODAY_SOFTWARE,
    PARAM_EXPAND_BREAKDOWN,
    LEGACY_SMART,
    LEGACY_DUMB,
    LEGACY_SCENARIO,
];

/// Raw query values before normalization. The first occurrence of a key wins.
pub type RawParams = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Guided,
    Live,
}

impl Mode {
    pub fn page(&self) -> &'static str {
        match self {
            Mode::Guided => "index.html",
            Mode::Live => "live.html",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "guided" => Some(Mode::Guided),
            "live" => Some(Mode::Live),
            _ => None,
        }
    }
}

pub fn read_params_from_query(search: &str) -> RawParams {
    let search = search.strip_prefix('?').unwrap_or(search);
    collect_pairs(form_urlencoded::parse(search.as_bytes()))
}

pub fn read_params_from_url(url: &Url) -> RawParams {
    collect_pairs(url.query_pairs())
}

fn collect_pairs<'a, I>(pairs: I) -> RawParams
where
    I: Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
{
    let mut raw = RawParams::new();
    for (key, value) in pairs {
        if key == PARAM_PRINT {
            continue;
        }
        raw.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }
    raw
}

/// Accepts either a full estimator URL or a bare query string.
pub fn parse_estimate_source(source: &str) -> Result<(Option<Url>, RawParams)> {
    let source = source.trim();
    if source.contains("://") {
        let url = Url::parse(source)?;
        let raw = read_params_from_url(&url);
        Ok((Some(url), raw))
    } else {
        Ok((None, read_params_from_query(source)))
    }
}

fn first_present<'a>(raw: &'a RawParams, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn to_non_negative_int(value: Option<&str>) -> u32 {
    match value.and_then(parse_finite) {
        Some(n) if n > f64::from(u32::MAX) => {
            tracing::warn!(
                "Camera count {} exceeds the supported maximum, clamping to {}",
                n,
                u32::MAX
            );
            u32::MAX
        }
        Some(n) if n >= 0.0 => n.floor() as u32,
        _ => 0,
    }
}

fn to_non_negative_number(value: Option<&str>, fallback: f64) -> f64 {
    match value.and_then(parse_finite) {
        Some(n) if n >= 0.0 => n,
        _ => fallback,
    }
}

fn to_flag(value: Option<&str>) -> bool {
    match value {
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => true,
            other => parse_finite(other).map(|n| n != 0.0).unwrap_or(false),
        },
        None => false,
    }
}

pub fn normalize_params(raw: &RawParams) -> EstimateParams {
    let software = match first_present(raw, &[PARAM_SOFTWARE]) {
        None => SoftwareSelection::None,
        Some(value) => SoftwareSelection::parse(value).unwrap_or_else(|| {
            tracing::warn!(
                "Unrecognized software selection '{}', using single-service pricing",
                value
            );
            SoftwareSelection::Lpr
        }),
    };

    let mut params = EstimateParams {
        cameras: to_non_negative_int(first_present(raw, &[PARAM_CAMERAS])),
        smart_cost: to_non_negative_number(
            first_present(raw, &[PARAM_SMART_COST, LEGACY_SMART]),
            DEFAULT_SMART_COST,
        ),
        ip_cost: to_non_negative_number(
            first_present(raw, &[PARAM_IP_COST, LEGACY_DUMB]),
            DEFAULT_IP_COST,
        ),
        software,
        billing: first_present(raw, &[PARAM_BILLING])
            .map(Billing::parse)
            .unwrap_or_default(),
        has_smart_cameras: to_flag(first_present(raw, &[PARAM_HAS_SMART])),
        has_existing_cameras: to_flag(first_present(raw, &[PARAM_HAS_EXISTING])),
        today_software: to_non_negative_number(first_present(raw, &[PARAM_TODAY_SOFTWARE]), 0.0),
        expand_breakdown: to_flag(first_present(raw, &[PARAM_EXPAND_BREAKDOWN])),
    };

    // 沒有明確旗標時才採用舊版 scenario 參數
    let has_flags = raw.contains_key(PARAM_HAS_SMART) || raw.contains_key(PARAM_HAS_EXISTING);
    if !has_flags {
        if let Some(scenario) = first_present(raw, &[LEGACY_SCENARIO]).and_then(Scenario::parse) {
            params.set_scenario(scenario);
        }
    }

    params
}

/// Flattens normalized params back into raw pairs (canonical keys only).
pub fn params_to_raw(params: &EstimateParams) -> RawParams {
    canonical_pairs(params)
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn canonical_pairs(params: &EstimateParams) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if params.cameras > 0 {
        pairs.push((PARAM_CAMERAS, params.cameras.to_string()));
    }
    if params.smart_cost != DEFAULT_SMART_COST {
        pairs.push((PARAM_SMART_COST, params.smart_cost.to_string()));
    }
    if params.ip_cost != DEFAULT_IP_COST {
        pairs.push((PARAM_IP_COST, params.ip_cost.to_string()));
    }
    if params.software != SoftwareSelection::None {
        pairs.push((PARAM_SOFTWARE, params.software.as_str().to_string()));
    }
    if params.billing != Billing::Monthly {
        pairs.push((PARAM_BILLING, params.billing.as_str().to_string()));
    }
    if params.has_smart_cameras {
        pairs.push((PARAM_HAS_SMART, "1".to_string()));
    }
    if params.has_existing_cameras {
        pairs.push((PARAM_HAS_EXISTING, "1".to_string()));
    }
    if params.today_software > 0.0 {
        pairs.push((PARAM_TODAY_SOFTWARE, params.today_software.to_string()));
    }
    if params.expand_breakdown {
        pairs.push((PARAM_EXPAND_BREAKDOWN, "1".to_string()));
    }
    pairs
}

pub fn build_search_from_params(params: &EstimateParams) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in canonical_pairs(params) {
        serializer.append_pair(key, &value);
    }
    serializer.finish()
}

/// Replaces the calculator keys of `url` with the canonical encoding of
/// `params`, keeping every other query pair in place.
pub fn apply_params_to_url(url: &mut Url, params: &EstimateParams) {
    let foreign: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !CALCULATOR_KEYS.contains(&&**k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let canonical = canonical_pairs(params);

    if foreign.is_empty() && canonical.is_empty() {
        url.set_query(None);
        return;
    }

    let mut query = url.query_pairs_mut();
    query.clear();
    for (key, value) in &foreign {
        query.append_pair(key, value);
    }
    for (key, value) in &canonical {
        query.append_pair(key, value);
    }
}

/// Builds a link to `target_page` (absolute or relative to `current`) that
/// carries the calculator state of `current`. Falls back to `target_page`
/// unchanged when it cannot be resolved.
pub fn build_share_url(target_page: &str, current: &Url) -> String {
    let resolved = if target_page.is_empty() {
        Ok(current.clone())
    } else {
        current.join(target_page)
    };

    match resolved {
        Ok(mut url) => {
            let params = normalize_params(&read_params_from_url(current));
            apply_params_to_url(&mut url, &params);
            url.to_string()
        }
        Err(e) => {
            tracing::debug!("Could not resolve share target '{}': {}", target_page, e);
            target_page.to_string()
        }
    }
}

/// Adds `print=1` so the estimator page renders its printable view.
pub fn ensure_print_mode(url_str: &str) -> Result<String> {
    let mut url = Url::parse(url_str)?;
    let already = url
        .query_pairs()
        .any(|(k, v)| k == PARAM_PRINT && v == "1");
    if !already {
        let others: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != PARAM_PRINT)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let mut query = url.query_pairs_mut();
        query.clear();
        for (key, value) in &others {
            query.append_pair(key, value);
        }
        query.append_pair(PARAM_PRINT, "1");
    }
    Ok(url.to_string())
}

pub fn is_print_mode(url: &Url) -> bool {
    url.query_pairs().any(|(k, v)| k == PARAM_PRINT && v == "1")
}

/// URL of the other calculator page, keeping canonical state and fragment.
pub fn mode_switch_url(current: &Url, mode: Mode) -> Result<Url> {
    let params = normalize_params(&read_params_from_url(current));
    let mut target = current.join(mode.page())?;
    let search = build_search_from_params(&params);
    target.set_query(if search.is_empty() { None } else { Some(&search) });
    target.set_fragment(current.fragment());
    Ok(target)
}
