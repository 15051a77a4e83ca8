/// Report export: the filtered table as a workbook, and a letterhead
/// summary as a Word document or a one-page PDF.
///
/// All three are built fully in memory; the caller decides where the
/// bytes go.
pub mod docx;
pub mod pdf;
pub mod xlsx;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::DatasetSchema;
use crate::data::aggregate::distinct_count;
use crate::data::filter::{FilterCriteria, FlagMode};
use crate::data::model::Table;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Letterhead
// ---------------------------------------------------------------------------

/// Fixed header printed on every report and on the dashboard itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letterhead {
    pub organization: String,
    pub directorate: String,
    pub department: String,
}

impl Default for Letterhead {
    fn default() -> Self {
        Self {
            organization: "EGYPTAIR M&E".into(),
            directorate: "Technical Services Directorate".into(),
            department: "Reliability Department".into(),
        }
    }
}

impl Letterhead {
    /// File-name prefix, e.g. "EGYPTAIR" from "EGYPTAIR M&E".
    pub fn short_name(&self) -> &str {
        self.organization
            .split_whitespace()
            .next()
            .unwrap_or("Report")
    }
}

/// `Date: YYYY-MM-DD`
pub fn date_line(date: NaiveDate) -> String {
    format!("Date: {}", date.format("%Y-%m-%d"))
}

// ---------------------------------------------------------------------------
// Export formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Spreadsheet,
    Word,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [
        ExportFormat::Spreadsheet,
        ExportFormat::Word,
        ExportFormat::Pdf,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => "xlsx",
            ExportFormat::Word => "docx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Word => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn button_label(self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => "Download Filtered Data as Excel",
            ExportFormat::Word => "Download Word Report",
            ExportFormat::Pdf => "Download Report as PDF",
        }
    }

    /// Fixed download name, e.g. `Filtered_CAN_Data.xlsx` or `EGYPTAIR_SAN_Report.pdf`.
    pub fn file_name(self, ctx: &ReportContext) -> String {
        match self {
            ExportFormat::Spreadsheet => format!("Filtered_{}_Data.xlsx", ctx.code),
            other => format!(
                "{}_{}_Report.{}",
                ctx.letterhead.short_name(),
                ctx.code,
                other.extension()
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Report content
// ---------------------------------------------------------------------------

/// Everything a report states besides the table itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContext {
    pub letterhead: Letterhead,
    pub code: String,
    pub title: String,
    /// Active filters as label → selected values, in panel order.
    pub filters: Vec<(String, Vec<String>)>,
    pub total_records: usize,
    pub group_label: String,
    pub distinct_groups: usize,
    pub date: NaiveDate,
}

impl ReportContext {
    /// Summarise `filtered` under the selections in `criteria`.
    pub fn build(
        schema: &DatasetSchema,
        letterhead: &Letterhead,
        criteria: &FilterCriteria,
        filtered: &Table,
        date: NaiveDate,
    ) -> Result<Self> {
        let mut filters: Vec<(String, Vec<String>)> = schema
            .filters
            .iter()
            .map(|f| {
                let values = criteria
                    .selections
                    .get(&f.column)
                    .map(|set| set.iter().map(|v| v.to_string()).collect())
                    .unwrap_or_default();
                (f.label.clone(), values)
            })
            .collect();

        if let Some(flag) = &criteria.flag {
            if flag.mode != FlagMode::ShowAll {
                filters.push((flag.column.clone(), vec![flag.mode.label(&flag.column)]));
            }
        }

        Ok(Self {
            letterhead: letterhead.clone(),
            code: schema.code.clone(),
            title: schema.report_title(),
            filters,
            total_records: filtered.len(),
            group_label: schema.group_label.clone(),
            distinct_groups: distinct_count(filtered, &schema.group_by)?,
            date,
        })
    }

    /// The three letterhead lines plus the date line.
    pub fn letterhead_lines(&self) -> [String; 4] {
        [
            self.letterhead.organization.clone(),
            self.letterhead.directorate.clone(),
            self.letterhead.department.clone(),
            date_line(self.date),
        ]
    }

    /// One line per active filter, e.g. `Years: 2023, 2024`.
    pub fn filter_lines(&self) -> Vec<String> {
        self.filters
            .iter()
            .map(|(label, values)| format!("{label}: {}", values.join(", ")))
            .collect()
    }

    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("Total Records: {}", self.total_records),
            format!("Unique {}: {}", self.group_label, self.distinct_groups),
        ]
    }
}

/// Render `filtered` in the requested format.
pub fn export(format: ExportFormat, filtered: &Table, ctx: &ReportContext) -> Result<Vec<u8>> {
    let bytes = match format {
        ExportFormat::Spreadsheet => xlsx::write_table(filtered, &format!("Filtered {}", ctx.code))?,
        ExportFormat::Word => docx::write_report(ctx)?,
        ExportFormat::Pdf => pdf::write_report(ctx)?,
    };
    log::info!(
        "Exported {} ({} bytes, {} rows)",
        format.file_name(ctx),
        bytes.len(),
        filtered.len()
    );
    Ok(bytes)
}
