use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use fleet_reliability::config::DatasetSchema;
use fleet_reliability::data::aggregate::{aggregate, AggregateSpec, Metric, SortOrder, TopN};
use fleet_reliability::data::filter::{self, FilterCriteria};
use fleet_reliability::data::loader::{load_file, load_workbook_bytes};
use fleet_reliability::data::model::CellValue;
use fleet_reliability::data::threshold::{count_exceeding, exceedance_by_group};
use fleet_reliability::report::{self, ExportFormat, Letterhead, ReportContext};
use fleet_reliability::state::{ChartControls, DatasetView};
use fleet_reliability::ui::dashboard::chart_series;

const CAN_CSV: &str = "\
YEAR,QUARTER NO,A/C TYPE, ATA ,P/N,NO OF REMOVAL,REMOVAL RATE,REMOVAL ALERT,Unnamed: 8
2023,1,A320,21,PN-100,5,10,8,
2024,2,A320,21,PN-100,3,5,8,note
2024,3,B777,32,PN-200,2,9,9,
2022,4,A330,49,PN-300,7,0.5,1,
";

fn write_csv(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    std::fs::write(&path, CAN_CSV).unwrap();
    path
}

fn years(values: &[i64]) -> BTreeSet<CellValue> {
    values.iter().map(|&y| CellValue::Integer(y)).collect()
}

#[test]
fn load_filter_aggregate_threshold_export() {
    let path = write_csv("fleet_reliability_pipeline.csv");
    let table = load_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(
        table.columns,
        vec!["YEAR", "QUARTER NO", "A/C TYPE", "ATA", "P/N", "NO OF REMOVAL", "REMOVAL RATE", "REMOVAL ALERT"]
    );
    assert_eq!(table.len(), 4);

    let criteria = FilterCriteria::default().with_selection("YEAR", years(&[2023, 2024]));
    let filtered = filter::apply(&table, &criteria).unwrap();
    assert_eq!(filtered.len(), 3);
    assert_eq!(filter::apply(&filtered, &criteria).unwrap(), filtered);

    let sums = aggregate(
        &filtered,
        &AggregateSpec {
            group_by: "ATA".into(),
            metric: Metric::Sum("NO OF REMOVAL".into()),
            order: SortOrder::Descending,
            limit: TopN::All,
        },
    )
    .unwrap();
    let pairs: Vec<(CellValue, f64)> = sums.iter().map(|r| (r.key.clone(), r.value)).collect();
    assert_eq!(
        pairs,
        vec![(CellValue::Integer(21), 8.0), (CellValue::Integer(32), 2.0)]
    );

    assert_eq!(count_exceeding(&filtered, "REMOVAL RATE", "REMOVAL ALERT").unwrap(), 1);
    let groups = exceedance_by_group(&filtered, "ATA", "REMOVAL RATE", "REMOVAL ALERT").unwrap();
    assert_eq!(groups[0].exceed_count, 1);
    assert_eq!(groups[0].percentage, 50.0);
    assert_eq!(groups[1].percentage, 0.0);

    let schema = DatasetSchema::component_alerts();
    let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
    let ctx = ReportContext::build(&schema, &Letterhead::default(), &criteria, &filtered, date)
        .unwrap();
    assert_eq!(ctx.summary_lines()[0], "Total Records: 3");
    assert_eq!(ctx.summary_lines()[1], "Unique ATA Chapters: 2");

    let bytes = report::export(ExportFormat::Spreadsheet, &filtered, &ctx).unwrap();
    let back = load_workbook_bytes(&bytes).unwrap();
    assert_eq!(back.columns, filtered.columns);
    assert_eq!(back.len(), filtered.len());

    for format in [ExportFormat::Word, ExportFormat::Pdf] {
        let bytes = report::export(format, &filtered, &ctx).unwrap();
        assert!(!bytes.is_empty(), "{format:?} produced no bytes");
    }
}

#[test]
fn zero_years_selected_leaves_nothing_to_chart() {
    let path = write_csv("fleet_reliability_zero_years.csv");
    let table = load_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let mut view = DatasetView::new(DatasetSchema::component_alerts());
    view.set_table(table);
    assert_eq!(view.filtered.len(), 4);

    view.select_none("YEAR");
    assert!(view.filtered.is_empty());
    assert_eq!(view.filtered.columns.len(), 8);

    for chart in &view.schema.charts {
        let series =
            chart_series(&view.filtered, &view.schema, chart, ChartControls::default()).unwrap();
        assert!(series.is_empty(), "{} should have no groups", chart.title);
    }
}
