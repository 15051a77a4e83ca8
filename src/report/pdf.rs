use printpdf::{BuiltinFont, Mm, PdfDocument, Pt};

use super::ReportContext;
use crate::error::{DashboardError, Result};

/// A4 in points.
const PAGE_WIDTH_PT: f32 = 595.28;
const PAGE_HEIGHT_PT: f32 = 841.89;

const MARGIN_X: f32 = 40.0;
const INDENT_X: f32 = 60.0;
const LINE_STEP: f32 = 20.0;

/// One positioned string; `y` is measured up from the bottom of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
}

fn item(text: impl Into<String>, x: f32, y: f32, size: f32, bold: bool) -> TextItem {
    TextItem {
        text: text.into(),
        x,
        y,
        size,
        bold,
    }
}

/// Fixed-coordinate layout of the single report page. Content that runs
/// past the bottom edge is not paginated.
pub fn layout(ctx: &ReportContext) -> Vec<TextItem> {
    let h = PAGE_HEIGHT_PT;
    let [organization, directorate, department, date] = ctx.letterhead_lines();

    let mut items = vec![
        item(organization, MARGIN_X, h - 50.0, 16.0, true),
        item(directorate, MARGIN_X, h - 70.0, 12.0, false),
        item(department, MARGIN_X, h - 90.0, 12.0, false),
        item(date, MARGIN_X, h - 110.0, 12.0, false),
        item(format!("{} Dashboard Report", ctx.code), MARGIN_X, h - 150.0, 14.0, true),
    ];

    let mut y = h - 180.0;
    items.push(item("Filters Used:", MARGIN_X, y, 11.0, false));
    for line in ctx.filter_lines() {
        y -= LINE_STEP;
        // Built-in Helvetica has no bullet glyph.
        items.push(item(format!("- {line}"), INDENT_X, y, 11.0, false));
    }

    y -= 2.0 * LINE_STEP;
    items.push(item("Summary:", MARGIN_X, y, 11.0, false));
    for line in ctx.summary_lines() {
        y -= LINE_STEP;
        items.push(item(format!("- {line}"), INDENT_X, y, 11.0, false));
    }

    items
}

fn pdf_err(e: printpdf::Error) -> DashboardError {
    DashboardError::Export(format!("pdf: {e}"))
}

/// Render [`layout`] onto one A4 page.
pub fn write_report(ctx: &ReportContext) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        &ctx.title,
        Mm::from(Pt(PAGE_WIDTH_PT)),
        Mm::from(Pt(PAGE_HEIGHT_PT)),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_err)?;

    let canvas = doc.get_page(page).get_layer(layer);
    for t in layout(ctx) {
        let font = if t.bold { &bold } else { &regular };
        canvas.use_text(
            t.text,
            t.size,
            Mm::from(Pt(t.x)),
            Mm::from(Pt(t.y)),
            font,
        );
    }

    doc.save_to_bytes().map_err(pdf_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_context;

    #[test]
    fn layout_matches_fixed_coordinates() {
        let items = layout(&sample_context());
        assert_eq!(items[0].text, "EGYPTAIR M&E");
        assert!(items[0].bold);
        assert_eq!(items[0].y, PAGE_HEIGHT_PT - 50.0);
        assert_eq!(items[3].text, "Date: 2026-03-09");
        assert_eq!(items[4].text, "CAN Dashboard Report");

        let filters = items.iter().position(|i| i.text == "Filters Used:").unwrap();
        assert_eq!(items[filters].y, PAGE_HEIGHT_PT - 180.0);
        assert_eq!(items[filters + 1].text, "- Years: 2023, 2024");
        assert_eq!(items[filters + 1].x, INDENT_X);

        let summary = items.iter().position(|i| i.text == "Summary:").unwrap();
        assert!((items[summary].y - (PAGE_HEIGHT_PT - 260.0)).abs() < 1e-3);
        assert_eq!(items.last().unwrap().text, "- Unique ATA Chapters: 2");
    }

    #[test]
    fn produces_a_pdf() {
        let bytes = write_report(&sample_context()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
