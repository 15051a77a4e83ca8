use std::io::Cursor;

use docx_rs::{Docx, Paragraph, Run};

use super::ReportContext;
use crate::error::{DashboardError, Result};

/// Sizes are in half-points.
const HEADING_SIZE: usize = 32;
const TITLE_SIZE: usize = 28;

const BULLET: &str = "  • ";

fn text(s: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(s))
}

fn bold(s: &str, size: usize) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(s).bold().size(size))
}

/// Letterhead, report title, filters used and summary figures.
pub fn write_report(ctx: &ReportContext) -> Result<Vec<u8>> {
    let [organization, directorate, department, date] = ctx.letterhead_lines();

    let mut doc = Docx::new()
        .add_paragraph(bold(&organization, HEADING_SIZE))
        .add_paragraph(text(&directorate))
        .add_paragraph(text(&department))
        .add_paragraph(text(&date))
        .add_paragraph(bold(&ctx.title, TITLE_SIZE))
        .add_paragraph(text("Filters Used:"));

    for line in ctx.filter_lines() {
        doc = doc.add_paragraph(text(&format!("{BULLET}{line}")));
    }

    doc = doc.add_paragraph(text("")).add_paragraph(text("Summary Data:"));
    for line in ctx.summary_lines() {
        doc = doc.add_paragraph(text(&format!("{BULLET}{line}")));
    }

    let mut buf = Cursor::new(Vec::new());
    doc.build()
        .pack(&mut buf)
        .map_err(|e| DashboardError::Export(format!("docx: {e}")))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_context;

    #[test]
    fn produces_a_zip_package() {
        let bytes = write_report(&sample_context()).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn document_reads_back() {
        let bytes = write_report(&sample_context()).unwrap();
        let doc = docx_rs::read_docx(&bytes).unwrap();
        // letterhead (4) + title + "Filters Used:" + 2 filters + blank + "Summary Data:" + 2 summary
        assert!(doc.document.children.len() >= 12);
    }
}
