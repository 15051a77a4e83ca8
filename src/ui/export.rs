use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::report::{self, ExportFormat, Letterhead, ReportContext};
use crate::state::DatasetView;

// ---------------------------------------------------------------------------
// Save dialog
// ---------------------------------------------------------------------------

/// Render the current view in `format`, ask where to save it and write it.
/// Returns the status line to show.
pub fn run(
    format: ExportFormat,
    view: &DatasetView,
    letterhead: &Letterhead,
    today: NaiveDate,
) -> String {
    let prepared = prepare(format, view, letterhead, today);
    let (file_name, bytes) = match prepared {
        Ok(p) => p,
        Err(e) => {
            log::error!("Export failed: {e:#}");
            return format!("Export failed: {e:#}");
        }
    };

    let Some(path) = save_dialog(format, &file_name) else {
        return "Export cancelled".to_string();
    };

    match write_bytes(&path, &bytes) {
        Ok(()) => {
            log::info!("Saved {} as {}", path.display(), format.mime_type());
            format!("Saved {}", path.display())
        }
        Err(e) => {
            log::error!("Export failed: {e:#}");
            format!("Export failed: {e:#}")
        }
    }
}

/// Default file name and encoded bytes for the current view.
fn prepare(
    format: ExportFormat,
    view: &DatasetView,
    letterhead: &Letterhead,
    today: NaiveDate,
) -> Result<(String, Vec<u8>)> {
    let ctx = ReportContext::build(
        &view.schema,
        letterhead,
        &view.criteria(),
        &view.filtered,
        today,
    )
    .context("summarising filtered data")?;
    // The spreadsheet is the table as shown; reports summarise every filtered row.
    let rows = match format {
        ExportFormat::Spreadsheet => &view.displayed,
        ExportFormat::Word | ExportFormat::Pdf => &view.filtered,
    };
    let bytes = report::export(format, rows, &ctx)
        .with_context(|| format!("rendering {}", format.button_label()))?;
    Ok((format.file_name(&ctx), bytes))
}

fn save_dialog(format: ExportFormat, file_name: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(format.button_label())
        .set_file_name(file_name)
        .add_filter(format.extension(), &[format.extension()])
        .save_file()
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}
