//! Native PDF export of an [`EstimateReport`].
//!
//! Layout is top-down in millimetres; [`PageWriter`] flips coordinates into
//! PDF user space and starts a new page when a block would not fit.

use crate::adapters::chart::{
    ChartGeometry, AXIS_COLOR, BREAK_EVEN_COLOR, DEFAULT_HEIGHT, DEFAULT_WIDTH, GRID_COLOR,
    SIGHTHOUND_COLOR, TEXT_COLOR, TODAY_COLOR, Y_AXIS_LABEL,
};
use crate::core::report::EstimateReport;
use crate::domain::model::RoiProjection;
use crate::domain::ports::PageSize;
use crate::utils::error::{EstimatorError, Result};
use printpdf::{BuiltinFont, Mm, Op, PdfDocument, PdfPage, Point, Pt, TextItem};

/// 0.5 in
pub const MARGIN_MM: f32 = 12.7;
const LINE_MM: f32 = 5.5;
const BODY_PT: f32 = 10.0;
const SMALL_PT: f32 = 8.0;
const TITLE_PT: f32 = 18.0;
const HEADING_PT: f32 = 12.0;
const CHART_HEIGHT_MM: f32 = 85.0;

fn hex_color(hex: &str) -> printpdf::Color {
    let channel = |i: usize| {
        u8::from_str_radix(hex.get(i..i + 2).unwrap_or("00"), 16).unwrap_or(0) as f32 / 255.0
    };
    printpdf::Color::Rgb(printpdf::Rgb::new(channel(1), channel(3), channel(5), None))
}

/// Rough Helvetica advance width, used for wrapping and right alignment.
fn text_width_mm(text: &str, size_pt: f32) -> f32 {
    let em = text.chars().count() as f32 * 0.5;
    em * size_pt * 25.4 / 72.0
}

fn wrap_text(text: &str, max_width_mm: f32, size_pt: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if !current.is_empty() && text_width_mm(&candidate, size_pt) > max_width_mm {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct PageWriter {
    width: f32,
    height: f32,
    pages: Vec<Vec<Op>>,
    ops: Vec<Op>,
    /// Distance from the top edge.
    cursor: f32,
}

impl PageWriter {
    fn new(page_size: PageSize) -> Self {
        let (width, height) = page_size.dimensions_mm();
        Self {
            width,
            height,
            pages: Vec::new(),
            ops: Vec::new(),
            cursor: MARGIN_MM,
        }
    }

    fn content_width(&self) -> f32 {
        self.width - 2.0 * MARGIN_MM
    }

    fn point(&self, x: f32, y_from_top: f32) -> Point {
        Point::new(Mm(x), Mm(self.height - y_from_top))
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.cursor + needed > self.height - MARGIN_MM && !self.ops.is_empty() {
            self.pages.push(std::mem::take(&mut self.ops));
            self.cursor = MARGIN_MM;
        }
    }

    fn text_at(&mut self, x: f32, y_from_top: f32, size_pt: f32, bold: bool, color: &str, text: &str) {
        let font = if bold {
            BuiltinFont::HelveticaBold
        } else {
            BuiltinFont::Helvetica
        };
        let pos = self.point(x, y_from_top);
        self.ops.push(Op::SetFillColor {
            col: hex_color(color),
        });
        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextCursor { pos });
        self.ops.push(Op::SetFont {
            font: printpdf::PdfFontHandle::Builtin(font),
            size: Pt(size_pt),
        });
        self.ops.push(Op::ShowText {
            items: vec![TextItem::Text(text.to_string())],
        });
        self.ops.push(Op::EndTextSection);
    }

    fn line(&mut self, points: &[(f32, f32)], color: &str, thickness_pt: f32) {
        if points.len() < 2 {
            return;
        }
        let line_points = points
            .iter()
            .map(|(x, y)| printpdf::LinePoint {
                p: self.point(*x, *y),
                bezier: false,
            })
            .collect();
        self.ops.push(Op::SetOutlineColor {
            col: hex_color(color),
        });
        self.ops.push(Op::SetOutlineThickness {
            pt: Pt(thickness_pt),
        });
        self.ops.push(Op::DrawLine {
            line: printpdf::Line {
                points: line_points,
                is_closed: false,
            },
        });
    }

    fn heading(&mut self, text: &str) {
        self.ensure_space(LINE_MM * 2.0);
        self.cursor += LINE_MM * 1.5;
        self.text_at(MARGIN_MM, self.cursor, HEADING_PT, true, TEXT_COLOR, text);
        self.cursor += 2.0;
        let y = self.cursor;
        self.line(
            &[(MARGIN_MM, y), (self.width - MARGIN_MM, y)],
            GRID_COLOR,
            0.75,
        );
    }

    fn paragraph(&mut self, text: &str, size_pt: f32) {
        for line in wrap_text(text, self.content_width(), size_pt) {
            self.ensure_space(LINE_MM);
            self.cursor += LINE_MM;
            self.text_at(MARGIN_MM, self.cursor, size_pt, false, TEXT_COLOR, &line);
        }
    }

    fn row(&mut self, label: &str, value: &str) {
        self.ensure_space(LINE_MM);
        self.cursor += LINE_MM;
        self.text_at(MARGIN_MM, self.cursor, BODY_PT, false, TEXT_COLOR, label);
        let value_x = self.width - MARGIN_MM - text_width_mm(value, BODY_PT);
        self.text_at(value_x, self.cursor, BODY_PT, true, TEXT_COLOR, value);
    }

    fn chart(&mut self, geo: &ChartGeometry) {
        self.ensure_space(CHART_HEIGHT_MM + LINE_MM);
        self.cursor += LINE_MM;
        let left = MARGIN_MM;
        let top = self.cursor;
        let scale = (self.content_width() / geo.width as f32).min(CHART_HEIGHT_MM / geo.height as f32);
        let map = |(x, y): (f64, f64)| (left + x as f32 * scale, top + y as f32 * scale);

        for grid in &geo.cost_grid {
            let a = map((geo.plot_left(), grid.position));
            let b = map((geo.plot_right(), grid.position));
            self.line(&[a, b], GRID_COLOR, 0.5);
            let label_x = a.0 - 2.0 - text_width_mm(&grid.label, SMALL_PT);
            self.text_at(label_x, a.1 + 1.0, SMALL_PT, false, AXIS_COLOR, &grid.label);
        }
        for grid in &geo.year_grid {
            let a = map((grid.position, geo.plot_top()));
            let b = map((grid.position, geo.plot_bottom()));
            self.line(&[a, b], GRID_COLOR, 0.5);
            let label_x = a.0 - text_width_mm(&grid.label, SMALL_PT) / 2.0;
            self.text_at(label_x, b.1 + 4.0, SMALL_PT, false, AXIS_COLOR, &grid.label);
        }

        let axes = [
            map((geo.plot_left(), geo.plot_top())),
            map((geo.plot_left(), geo.plot_bottom())),
            map((geo.plot_right(), geo.plot_bottom())),
        ];
        self.line(&axes, AXIS_COLOR, 0.75);

        let today: Vec<_> = geo.today_line.iter().copied().map(map).collect();
        let sighthound: Vec<_> = geo.sighthound_line.iter().copied().map(map).collect();
        self.line(&today, TODAY_COLOR, 1.5);
        self.line(&sighthound, SIGHTHOUND_COLOR, 1.5);

        if let Some(marker) = &geo.break_even {
            // 虛線以短線段繪製
            let (x, y_top) = map((marker.x, geo.plot_top()));
            let (_, y_bottom) = map((marker.x, geo.plot_bottom()));
            let dash = 4.0 * scale;
            let mut y = y_top;
            while y < y_bottom {
                let end = (y + dash).min(y_bottom);
                self.line(&[(x, y), (x, end)], BREAK_EVEN_COLOR, 0.75);
                y += dash * 2.0;
            }
            let (mx, my) = map((marker.x, marker.y));
            let r = 6.0 * scale;
            self.line(&[(mx - r, my), (mx + r, my)], BREAK_EVEN_COLOR, 2.5);
            self.line(&[(mx, my - r), (mx, my + r)], BREAK_EVEN_COLOR, 2.5);
            let label_x = mx - text_width_mm(&marker.label, SMALL_PT) / 2.0;
            self.text_at(label_x, my - r - 1.5, SMALL_PT, true, BREAK_EVEN_COLOR, &marker.label);
        }

        let (legend_x, legend_y) = map((geo.plot_left(), geo.legend_y()));
        for (offset, color, label) in [(0.0, TODAY_COLOR, "Today"), (80.0, SIGHTHOUND_COLOR, "Sighthound")] {
            let x = legend_x + offset as f32 * scale;
            self.line(&[(x, legend_y), (x + 20.0 * scale, legend_y)], color, 1.5);
            self.text_at(x + 25.0 * scale, legend_y + 1.0, SMALL_PT, false, TEXT_COLOR, label);
        }

        let (_, axis_label_y) = map((0.0, geo.plot_top()));
        self.text_at(left, axis_label_y - 2.0, SMALL_PT, false, TEXT_COLOR, Y_AXIS_LABEL);

        self.cursor = top + geo.height as f32 * scale;
    }

    fn finish(mut self) -> Vec<Vec<Op>> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(std::mem::take(&mut self.ops));
        }
        self.pages
    }
}

/// Renders the estimate as a one- or two-page PDF.
pub fn render_estimate_pdf(
    report: &EstimateReport,
    roi: &RoiProjection,
    page_size: PageSize,
    estimate_url: Option<&str>,
) -> Result<Vec<u8>> {
    let mut writer = PageWriter::new(page_size);

    writer.cursor += 6.0;
    writer.text_at(MARGIN_MM, writer.cursor, TITLE_PT, true, TEXT_COLOR, &report.title);
    writer.cursor += 2.0;
    writer.paragraph(&format!("Prepared {}", report.generated_on.format("%B %-d, %Y")), SMALL_PT);
    writer.paragraph(&report.deployment_intro, BODY_PT);

    writer.heading("Inputs");
    for (label, value) in report.input_rows() {
        writer.row(label, &value);
    }

    writer.heading("Hardware and software costs");
    for (label, value) in report.result_rows() {
        writer.row(&label, &value);
    }

    if let Some(headline) = &report.roi_headline {
        writer.heading(headline);
        if let Some(subtext) = &report.roi_subtext {
            writer.paragraph(subtext, BODY_PT);
        }
        if let Some(geo) = ChartGeometry::compute(roi, DEFAULT_WIDTH, DEFAULT_HEIGHT) {
            writer.chart(&geo);
        }
    }

    if report.show_breakdown {
        writer.heading("Breakdown");
        for line in &report.breakdown {
            writer.paragraph(line, BODY_PT);
        }
    }

    if let Some(url) = estimate_url {
        writer.heading("Estimate link");
        writer.paragraph(url, SMALL_PT);
    }

    let (width, height) = (writer.width, writer.height);
    let pages = writer.finish();
    let page_count = pages.len();

    let mut doc = PdfDocument::new(&report.title);
    let layer = printpdf::Layer::new("Layer 1");
    let layer_id = doc.add_layer(&layer);
    for page_ops in pages {
        let mut ops = Vec::with_capacity(page_ops.len() + 2);
        ops.push(Op::BeginLayer {
            layer_id: layer_id.clone(),
        });
        ops.extend(page_ops);
        ops.push(Op::EndLayer);
        doc.pages.push(PdfPage::new(Mm(width), Mm(height), ops));
    }

    let opts = printpdf::serialize::PdfSaveOptions::default();
    let mut warnings = Vec::new();
    let mut buf: Vec<u8> = Vec::new();
    doc.save_writer(&mut buf, &opts, &mut warnings);

    if buf.is_empty() {
        return Err(EstimatorError::PdfError {
            message: "PDF serializer produced no output".to_string(),
        });
    }
    if !warnings.is_empty() {
        tracing::debug!("PDF serializer reported {} warnings", warnings.len());
    }
    tracing::debug!("Rendered PDF: {} page(s), {} bytes", page_count, buf.len());
    Ok(buf)
}
