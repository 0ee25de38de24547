//! Break-even chart.
//!
//! [`ChartGeometry`] lays the projection out in an abstract pixel space with
//! the origin at the top-left corner. The SVG renderer below and the PDF
//! adapter both draw from the same geometry.

use crate::core::format::format_axis_currency;
use crate::domain::model::RoiProjection;
use std::fmt::Write;

pub const TODAY_COLOR: &str = "#64748b";
pub const SIGHTHOUND_COLOR: &str = "#0ea5e9";
pub const BREAK_EVEN_COLOR: &str = "#10b981";
pub const GRID_COLOR: &str = "#e2e8f0";
pub const AXIS_COLOR: &str = "#94a3b8";
pub const TEXT_COLOR: &str = "#475569";

pub const DEFAULT_WIDTH: f64 = 640.0;
pub const DEFAULT_HEIGHT: f64 = 320.0;
pub const Y_AXIS_LABEL: &str = "Cumulative total cost (USD)";

const YEAR_MARKERS: [u32; 3] = [12, 36, 60];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

pub const PADDING: Padding = Padding {
    top: 20.0,
    right: 20.0,
    bottom: 40.0,
    left: 70.0,
};

#[derive(Debug, Clone, PartialEq)]
pub struct GridLine {
    pub position: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakEvenMarker {
    pub month: u32,
    pub x: f64,
    pub y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartGeometry {
    pub width: f64,
    pub height: f64,
    pub max_months: u32,
    /// Top of the cost axis (110% of the largest plotted value).
    pub max_cost: f64,
    /// Horizontal lines; `position` is a y coordinate.
    pub cost_grid: Vec<GridLine>,
    /// Vertical year lines; `position` is an x coordinate.
    pub year_grid: Vec<GridLine>,
    pub today_line: Vec<(f64, f64)>,
    pub sighthound_line: Vec<(f64, f64)>,
    pub break_even: Option<BreakEvenMarker>,
}

impl ChartGeometry {
    /// Returns `None` when there is nothing to plot.
    pub fn compute(roi: &RoiProjection, width: f64, height: f64) -> Option<Self> {
        if !roi.applicable || roi.data_points.is_empty() || roi.max_months == 0 {
            return None;
        }

        let chart_width = width - PADDING.left - PADDING.right;
        let chart_height = height - PADDING.top - PADDING.bottom;
        let max_months = roi.max_months;

        let peak = roi
            .data_points
            .iter()
            .map(|p| p.today.max(p.sighthound))
            .fold(0.0_f64, f64::max);
        let max_cost = if peak > 0.0 { peak * 1.1 } else { 1.0 };

        let x_scale = |month: f64| PADDING.left + month / f64::from(max_months) * chart_width;
        let y_scale = |cost: f64| PADDING.top + chart_height - cost / max_cost * chart_height;

        let step = cost_step(max_cost);
        let cost_grid = (0u32..)
            .map(|i| f64::from(i) * step)
            .take_while(|c| *c <= max_cost)
            .map(|c| GridLine {
                position: y_scale(c),
                label: format_axis_currency(c),
            })
            .collect();

        let year_grid = YEAR_MARKERS
            .iter()
            .filter(|m| **m <= max_months)
            .map(|m| GridLine {
                position: x_scale(f64::from(*m)),
                label: format!("Year {}", m / 12),
            })
            .collect();

        let today_line = roi
            .data_points
            .iter()
            .map(|p| (x_scale(f64::from(p.month)), y_scale(p.today)))
            .collect();
        let sighthound_line = roi
            .data_points
            .iter()
            .map(|p| (x_scale(f64::from(p.month)), y_scale(p.sighthound)))
            .collect();

        let break_even = roi
            .break_even_month()
            .filter(|m| *m <= max_months)
            .and_then(|month| {
                let point = roi
                    .data_points
                    .iter()
                    .find(|p| p.month == month)
                    .or_else(|| roi.data_points.last())?;
                Some(BreakEvenMarker {
                    month,
                    x: x_scale(f64::from(month)),
                    y: y_scale(point.sighthound),
                    label: format!("{} mo", month),
                })
            });

        Some(Self {
            width,
            height,
            max_months,
            max_cost,
            cost_grid,
            year_grid,
            today_line,
            sighthound_line,
            break_even,
        })
    }

    pub fn plot_left(&self) -> f64 {
        PADDING.left
    }

    pub fn plot_right(&self) -> f64 {
        self.width - PADDING.right
    }

    pub fn plot_top(&self) -> f64 {
        PADDING.top
    }

    pub fn plot_bottom(&self) -> f64 {
        self.height - PADDING.bottom
    }

    pub fn legend_y(&self) -> f64 {
        self.height - 10.0
    }
}

/// Decade step below the axis maximum, halved when it would give fewer
/// than three lines.
pub fn cost_step(max_cost: f64) -> f64 {
    let step = 10f64.powi(max_cost.log10().floor() as i32);
    if max_cost / step < 3.0 {
        step / 2.0
    } else {
        step
    }
}

fn polyline_points(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{:.2},{:.2}", x, y))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_break_even_svg(roi: &RoiProjection) -> Option<String> {
    render_break_even_svg_sized(roi, DEFAULT_WIDTH, DEFAULT_HEIGHT)
}

pub fn render_break_even_svg_sized(roi: &RoiProjection, width: f64, height: f64) -> Option<String> {
    let geo = ChartGeometry::compute(roi, width, height)?;
    let mut svg = String::new();

    // write! 到 String 不會失敗
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="system-ui, sans-serif" font-size="11">"#,
        w = width,
        h = height
    );
    let _ = writeln!(svg, r##"<rect width="{}" height="{}" fill="#ffffff"/>"##, width, height);

    for line in &geo.cost_grid {
        let _ = writeln!(
            svg,
            r#"<line x1="{:.2}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="{}" stroke-width="1"/>"#,
            geo.plot_left(),
            geo.plot_right(),
            GRID_COLOR,
            y = line.position
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" fill="{}" text-anchor="end" dominant-baseline="middle">{}</text>"#,
            geo.plot_left() - 8.0,
            line.position,
            AXIS_COLOR,
            line.label
        );
    }

    for line in &geo.year_grid {
        let _ = writeln!(
            svg,
            r#"<line x1="{x:.2}" y1="{:.2}" x2="{x:.2}" y2="{:.2}" stroke="{}" stroke-width="1"/>"#,
            geo.plot_top(),
            geo.plot_bottom(),
            GRID_COLOR,
            x = line.position
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" fill="{}" text-anchor="middle" dominant-baseline="hanging">{}</text>"#,
            line.position,
            geo.plot_bottom() + 8.0,
            AXIS_COLOR,
            line.label
        );
    }

    let _ = writeln!(
        svg,
        r#"<polyline points="{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}" fill="none" stroke="{}" stroke-width="1"/>"#,
        geo.plot_left(),
        geo.plot_top(),
        geo.plot_left(),
        geo.plot_bottom(),
        geo.plot_right(),
        geo.plot_bottom(),
        AXIS_COLOR
    );

    let mid_y = (geo.plot_top() + geo.plot_bottom()) / 2.0;
    let _ = writeln!(
        svg,
        r#"<text x="15" y="{:.2}" fill="{}" text-anchor="middle" transform="rotate(-90 15 {:.2})">{}</text>"#,
        mid_y, TEXT_COLOR, mid_y, Y_AXIS_LABEL
    );

    let _ = writeln!(
        svg,
        r#"<polyline class="today" points="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
        polyline_points(&geo.today_line),
        TODAY_COLOR
    );
    let _ = writeln!(
        svg,
        r#"<polyline class="sighthound" points="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
        polyline_points(&geo.sighthound_line),
        SIGHTHOUND_COLOR
    );

    if let Some(marker) = &geo.break_even {
        let _ = writeln!(
            svg,
            r#"<line class="break-even" x1="{x:.2}" y1="{:.2}" x2="{x:.2}" y2="{:.2}" stroke="{}" stroke-width="1" stroke-dasharray="4 4"/>"#,
            geo.plot_top(),
            geo.plot_bottom(),
            BREAK_EVEN_COLOR,
            x = marker.x
        );
        let _ = writeln!(
            svg,
            r#"<circle cx="{:.2}" cy="{:.2}" r="6" fill="{}"/>"#,
            marker.x, marker.y, BREAK_EVEN_COLOR
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" fill="{}" font-weight="bold" text-anchor="middle">{}</text>"#,
            marker.x,
            marker.y - 10.0,
            BREAK_EVEN_COLOR,
            marker.label
        );
    }

    let legend_y = geo.legend_y();
    for (offset, color, label) in [
        (0.0, TODAY_COLOR, "Today"),
        (80.0, SIGHTHOUND_COLOR, "Sighthound"),
    ] {
        let x = geo.plot_left() + offset;
        let _ = writeln!(
            svg,
            r#"<line x1="{:.2}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="{}" stroke-width="2"/>"#,
            x,
            x + 20.0,
            color,
            y = legend_y
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" fill="{}" dominant-baseline="middle">{}</text>"#,
            x + 25.0,
            legend_y,
            TEXT_COLOR,
            label
        );
    }

    svg.push_str("</svg>\n");
    Some(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calc::compute_scenario_results;
    use crate::domain::model::{EstimateParams, Scenario, SoftwareSelection};

    fn break_even_params() -> EstimateParams {
        let mut p = EstimateParams {
            cameras: 10,
            smart_cost: 500.0,
            software: SoftwareSelection::Lpr,
            today_software: 80.0,
            ..EstimateParams::default()
        };
        p.set_scenario(Scenario::A);
        p
    }

    #[test]
    fn test_cost_step() {
        assert_eq!(cost_step(5_000.0), 1_000.0);
        assert_eq!(cost_step(25_000.0), 5_000.0);
        assert_eq!(cost_step(165_000.0), 50_000.0);
        assert_eq!(cost_step(400_000.0), 100_000.0);
    }

    #[test]
    fn test_geometry_for_break_even() {
        let roi = compute_scenario_results(&break_even_params()).roi;
        let geo = ChartGeometry::compute(&roi, 640.0, 320.0).unwrap();

        assert_eq!(geo.max_months, 24);
        assert_eq!(geo.today_line.len(), 25);
        // 24 個月內只有第一年標記
        assert_eq!(geo.year_grid.len(), 1);
        assert_eq!(geo.year_grid[0].label, "Year 1");
        assert_eq!(geo.cost_grid[0].label, "$0");
        assert_eq!(geo.cost_grid[0].position, geo.plot_bottom());

        let marker = geo.break_even.unwrap();
        assert_eq!(marker.month, 16);
        assert_eq!(marker.label, "16 mo");
        assert!((marker.x - (70.0 + 16.0 / 24.0 * 550.0)).abs() < 1e-9);
    }

    #[test]
    fn test_lines_stay_inside_plot_area() {
        let roi = compute_scenario_results(&break_even_params()).roi;
        let geo = ChartGeometry::compute(&roi, 640.0, 320.0).unwrap();
        for (x, y) in geo.today_line.iter().chain(geo.sighthound_line.iter()) {
            assert!(*x >= geo.plot_left() && *x <= geo.plot_right());
            assert!(*y >= geo.plot_top() && *y <= geo.plot_bottom());
        }
    }

    #[test]
    fn test_svg_contains_series_and_marker() {
        let roi = compute_scenario_results(&break_even_params()).roi;
        let svg = render_break_even_svg(&roi).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"class="today""#));
        assert!(svg.contains(r#"class="sighthound""#));
        assert!(svg.contains("16 mo"));
        assert!(svg.contains("stroke-dasharray=\"4 4\""));
        assert!(svg.contains("Cumulative total cost (USD)"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_day_one_chart_has_no_marker() {
        let mut p = break_even_params();
        p.smart_cost = 3000.0;
        let roi = compute_scenario_results(&p).roi;
        let svg = render_break_even_svg(&roi).unwrap();
        assert!(!svg.contains("break-even"));
        assert!(svg.contains("Year 5"));
    }

    #[test]
    fn test_not_applicable_renders_nothing() {
        let mut p = break_even_params();
        p.set_scenario(Scenario::B);
        let roi = compute_scenario_results(&p).roi;
        assert!(render_break_even_svg(&roi).is_none());
    }
}
