//! Paginated consumption report
//!
//! Landscape letter pages laid out top-down with a moving cursor. Text uses
//! the standard Helvetica faces, so strings are folded to ASCII first.

use std::path::Path;

use fleetfuel_domain::model::VehicleRecord;
use fleetfuel_types::{Error, Result, VehicleStatus};
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};
use tracing::info;

use crate::report::{ReportSummary, StatusCount};

const PAGE_WIDTH: f32 = 792.0;
const PAGE_HEIGHT: f32 = 612.0;
const MARGIN: f32 = 40.0;
const FOOTER_Y: f32 = 22.0;

const CHART_COLOR: u32 = 0x009999;
const TABLE_HEADER_COLOR: u32 = 0x006778;

const REGULAR: Name<'static> = Name(b"F1");
const BOLD: Name<'static> = Name(b"F2");

/// Replace accented letters by their base letter and anything else non-ASCII by '?'
fn ascii_fold(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'Á' | 'À' | 'Ä' | 'Â' => 'A',
            'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
            'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            'ñ' => 'n',
            'Ñ' => 'N',
            'ç' => 'c',
            'Ç' => 'C',
            c if c.is_ascii() => c,
            _ => '?',
        })
        .collect()
}

/// Rough Helvetica advance width
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.52
}

/// Greedy word wrap by estimated width
fn wrap(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };
        if !line.is_empty() && text_width(&candidate, size) > max_width {
            lines.push(std::mem::take(&mut line));
            line = word.to_string();
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn rgb(color: u32) -> (f32, f32, f32) {
    let channel = |shift: u32| ((color >> shift) & 0xFF) as f32 / 255.0;
    (channel(16), channel(8), channel(0))
}

fn fmt_number(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "-".to_string())
}

/// Page content accumulator with a top-down cursor
struct Layout {
    pages: Vec<Content>,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Content::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn content(&mut self) -> &mut Content {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Content::new());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Start a new page unless `height` still fits above the bottom margin
    fn ensure_space(&mut self, height: f32) -> bool {
        if self.y - height < MARGIN {
            self.new_page();
            true
        } else {
            false
        }
    }

    fn text_at(&mut self, x: f32, y: f32, size: f32, bold: bool, text: &str, color: u32) {
        let (r, g, b) = rgb(color);
        let folded = ascii_fold(text);
        let content = self.content();
        content.begin_text();
        content.set_fill_rgb(r, g, b);
        content.set_font(if bold { BOLD } else { REGULAR }, size);
        content.next_line(x, y);
        content.show(Str(folded.as_bytes()));
        content.end_text();
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: u32) {
        let (r, g, b) = rgb(color);
        let content = self.content();
        content.set_fill_rgb(r, g, b);
        content.rect(x, y, width, height);
        content.fill_nonzero();
    }

    fn line(&mut self, size: f32, bold: bool, text: &str) {
        self.ensure_space(size * 1.5);
        self.y -= size * 1.2;
        let y = self.y;
        self.text_at(MARGIN, y, size, bold, text, 0x000000);
        self.y -= size * 0.3;
    }

    fn paragraph(&mut self, size: f32, text: &str) {
        for line in wrap(text, size, PAGE_WIDTH - 2.0 * MARGIN) {
            self.line(size, false, &line);
        }
        self.y -= size * 0.5;
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }
}

fn status_count(summary: &ReportSummary, status: VehicleStatus) -> usize {
    summary
        .status_summary
        .iter()
        .find(|s| s.status == status)
        .map(|s| s.count)
        .unwrap_or(0)
}

fn write_cover(layout: &mut Layout, summary: &ReportSummary) {
    let kpis = &summary.kpis;

    layout.line(22.0, true, "Fuel consumption control");
    layout.line(
        10.0,
        false,
        &format!(
            "Generated {} by {} - tolerance +/-{:.0}%",
            summary.generated_at.format("%Y-%m-%d %H:%M"),
            summary.generated_by,
            summary.tolerance * 100.0
        ),
    );
    layout.gap(8.0);
    layout.paragraph(
        11.0,
        "This report summarises fleet fuel consumption for the analysed period. Actual \
         consumption of each vehicle is compared with the theoretical rate of its model and \
         every vehicle is assigned an operational status.",
    );

    layout.line(13.0, true, "Key indicators");
    let bullets = [
        format!("- Vehicles analysed: {}", kpis.total),
        format!("- NORMAL: {} ({:.1}%)", kpis.normal, kpis.pct_normal),
        format!(
            "- A AUDITAR: {} ({:.1}%)",
            kpis.needs_audit,
            kpis.pct(kpis.needs_audit)
        ),
        format!(
            "- DUDOSO: {} ({:.1}%)",
            kpis.suspicious,
            kpis.pct(kpis.suspicious)
        ),
        format!("- SIN DATOS: {} ({:.1}%)", kpis.no_data, kpis.pct(kpis.no_data)),
        format!(
            "- FALTA CARGA / ERROR DE KM / SIN MOVIMIENTO: {} / {} / {}",
            status_count(summary, VehicleStatus::MissingFuelLoad),
            status_count(summary, VehicleStatus::DistanceError),
            status_count(summary, VehicleStatus::NoMovement)
        ),
    ];
    for bullet in &bullets {
        layout.line(10.0, false, bullet);
    }
    layout.gap(10.0);

    write_bar_chart(layout, &summary.status_distribution);

    layout.line(13.0, true, "Status summary");
    if summary.status_summary.is_empty() {
        layout.line(10.0, false, "No vehicles in the filtered set.");
    }
    for entry in &summary.status_summary {
        layout.line(
            10.0,
            false,
            &format!("{}: {}", entry.status.label(), entry.count),
        );
    }
}

/// Vertical bars in distribution order, count above, label below
fn write_bar_chart(layout: &mut Layout, distribution: &[StatusCount]) {
    const CHART_HEIGHT: f32 = 120.0;
    const BAR_WIDTH: f32 = 60.0;
    const BAR_GAP: f32 = 30.0;

    let Some(max) = distribution.iter().map(|s| s.count).max().filter(|m| *m > 0) else {
        return;
    };

    layout.line(13.0, true, "Vehicles by status");
    layout.ensure_space(CHART_HEIGHT + 40.0);
    let base = layout.y - CHART_HEIGHT - 14.0;

    for (idx, entry) in distribution.iter().enumerate() {
        let x = MARGIN + 10.0 + idx as f32 * (BAR_WIDTH + BAR_GAP);
        let height = CHART_HEIGHT * entry.count as f32 / max as f32;
        layout.fill_rect(x, base, BAR_WIDTH, height, CHART_COLOR);

        let count = entry.count.to_string();
        let count_x = x + (BAR_WIDTH - text_width(&count, 9.0)) / 2.0;
        layout.text_at(count_x, base + height + 3.0, 9.0, true, &count, 0x000000);

        let label = entry.status.label();
        let label_x = x + (BAR_WIDTH - text_width(label, 7.0)) / 2.0;
        layout.text_at(label_x.max(x - BAR_GAP / 2.0), base - 10.0, 7.0, false, label, 0x000000);
    }

    layout.y = base - 24.0;
}

const TABLE_COLUMNS: [(&str, f32); 11] = [
    ("", 14.0),
    ("Patente", 60.0),
    ("Modelo", 110.0),
    ("Km", 60.0),
    ("Litros", 60.0),
    ("Real L/100", 60.0),
    ("Teor. L/100", 60.0),
    ("Esperados", 60.0),
    ("Desvio L", 60.0),
    ("Desvio %", 50.0),
    ("Estado", 96.0),
];
const ROW_HEIGHT: f32 = 14.0;
const TABLE_FONT: f32 = 8.0;

fn write_table_header(layout: &mut Layout) {
    let width: f32 = TABLE_COLUMNS.iter().map(|(_, w)| w).sum();
    layout.y -= ROW_HEIGHT;
    let y = layout.y;
    layout.fill_rect(MARGIN, y, width, ROW_HEIGHT, TABLE_HEADER_COLOR);

    let mut x = MARGIN;
    for (title, column_width) in TABLE_COLUMNS {
        layout.text_at(x + 3.0, y + 4.0, TABLE_FONT, true, title, 0xFFFFFF);
        x += column_width;
    }
}

fn table_cells(record: &VehicleRecord) -> [String; 10] {
    let metrics = &record.metrics;
    [
        record.identifier.clone(),
        record.model.clone().unwrap_or_else(|| "-".to_string()),
        fmt_number(Some(record.distance_km), 2),
        fmt_number(Some(record.liters), 2),
        fmt_number(metrics.actual_rate, 2),
        fmt_number(record.theoretical_rate, 2),
        fmt_number(metrics.expected_liters, 2),
        fmt_number(metrics.deviation_liters, 2),
        fmt_number(metrics.deviation_ratio.map(|r| r * 100.0), 1),
        record.status.label().to_string(),
    ]
}

/// Detail table, header repeated on every page it spans
fn write_detail_table(layout: &mut Layout, records: &[VehicleRecord]) {
    layout.ensure_space(ROW_HEIGHT * 3.0);
    write_table_header(layout);

    for record in records {
        if layout.ensure_space(ROW_HEIGHT) {
            write_table_header(layout);
        }
        layout.y -= ROW_HEIGHT;
        let y = layout.y;

        layout.fill_rect(MARGIN + 3.0, y + 3.0, 8.0, 8.0, record.status.color_rgb());

        let mut x = MARGIN + TABLE_COLUMNS[0].1;
        for (cell, (_, column_width)) in table_cells(record).iter().zip(&TABLE_COLUMNS[1..]) {
            let max_chars = ((column_width - 6.0) / (TABLE_FONT * 0.52)) as usize;
            let shown: String = cell.chars().take(max_chars).collect();
            layout.text_at(x + 3.0, y + 4.0, TABLE_FONT, false, &shown, 0x000000);
            x += column_width;
        }
    }
}

fn write_detail_pages(layout: &mut Layout, records: &[VehicleRecord], summary: &ReportSummary) {
    layout.new_page();

    layout.line(
        14.0,
        true,
        &format!("Top {} deviations (A AUDITAR)", summary.top_deviations.len()),
    );
    if summary.top_deviations.is_empty() {
        layout.line(10.0, false, "No vehicles in A AUDITAR.");
    }
    for (idx, record) in summary.top_deviations.iter().enumerate() {
        let metrics = &record.metrics;
        layout.line(
            10.0,
            false,
            &format!(
                "{}. {} ({}) - deviation {} liters ({} / {} L/100km)",
                idx + 1,
                record.identifier,
                record.model.as_deref().unwrap_or("-"),
                fmt_number(metrics.deviation_liters, 1),
                fmt_number(metrics.actual_rate, 1),
                fmt_number(record.theoretical_rate, 1)
            ),
        );
    }
    layout.gap(8.0);

    layout.line(14.0, true, "Recommendations");
    for recommendation in &summary.recommendations {
        layout.paragraph(10.0, &format!("- {}", recommendation));
    }
    layout.gap(8.0);

    layout.line(14.0, true, "Vehicle detail");
    write_detail_table(layout, records);
}

fn write_narrative(layout: &mut Layout, summary: &ReportSummary) {
    layout.new_page();
    layout.line(16.0, true, "Executive analysis");
    layout.gap(6.0);
    for paragraph in &summary.narrative {
        layout.paragraph(11.0, paragraph);
    }
}

fn write_footers(layout: &mut Layout, summary: &ReportSummary) {
    let total = layout.pages.len();
    let stamp = summary.generated_at.format("%Y-%m-%d %H:%M").to_string();
    for idx in 0..total {
        let text = format!(
            "Fleet fuel consumption control - {} - {} - page {}/{}",
            summary.generated_by,
            stamp,
            idx + 1,
            total
        );
        let (r, g, b) = rgb(0x666666);
        let folded = ascii_fold(&text);
        let content = &mut layout.pages[idx];
        content.begin_text();
        content.set_fill_rgb(r, g, b);
        content.set_font(REGULAR, 8.0);
        content.next_line(MARGIN, FOOTER_Y);
        content.show(Str(folded.as_bytes()));
        content.end_text();
    }
}

/// Render the report to PDF bytes
pub fn render_consumption_pdf(records: &[VehicleRecord], summary: &ReportSummary) -> Vec<u8> {
    let mut layout = Layout::new();
    write_cover(&mut layout, summary);
    write_detail_pages(&mut layout, records, summary);
    write_narrative(&mut layout, summary);
    write_footers(&mut layout, summary);

    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let regular_id = Ref::new(3);
    let bold_id = Ref::new(4);
    let first_page = 5;

    let page_count = layout.pages.len() as i32;
    let page_ids: Vec<Ref> = (0..page_count).map(|i| Ref::new(first_page + 2 * i)).collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().copied())
        .count(page_count);
    pdf.type1_font(regular_id).base_font(Name(b"Helvetica"));
    pdf.type1_font(bold_id).base_font(Name(b"Helvetica-Bold"));

    for (page_id, content) in page_ids.iter().zip(layout.pages) {
        let content_id = Ref::new(page_id.get() + 1);

        let mut page = pdf.page(*page_id);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
        page.parent(page_tree_id);
        page.contents(content_id);
        let mut resources = page.resources();
        let mut fonts = resources.fonts();
        fonts.pair(REGULAR, regular_id);
        fonts.pair(BOLD, bold_id);
        fonts.finish();
        resources.finish();
        page.finish();

        pdf.stream(content_id, &content.finish());
    }

    pdf.finish()
}

/// Write the report to a `.pdf` file
pub fn export_consumption_pdf(
    records: &[VehicleRecord],
    summary: &ReportSummary,
    output_path: &Path,
) -> Result<()> {
    let bytes = render_consumption_pdf(records, summary);
    std::fs::write(output_path, &bytes)
        .map_err(|e| Error::Document(format!("{}: {}", output_path.display(), e)))?;
    info!(path = %output_path.display(), bytes = bytes.len(), "pdf report written");
    Ok(())
}
