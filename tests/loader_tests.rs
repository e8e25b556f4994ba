//! Tests for loading gene tables from XLSX and delimited sources.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod fixtures;

use fcheat::loader::load_table;
use fcheat::{Delimiter, ErrorKind, HeatmapError, SheetSelection, SpreadsheetSource};
use fixtures::{gene_sheet, gene_xlsx, CellValue, SheetBuilder, XlsxBuilder};
use test_case::test_case;

fn load_default(xlsx: Vec<u8>, role: &str) -> fcheat::Result<fcheat::GeneTable> {
    let mut source = SpreadsheetSource::from_xlsx(xlsx).unwrap();
    load_table(&mut source, &SheetSelection::Default, role)
}

#[test]
fn test_loads_default_sheet() {
    let xlsx = gene_xlsx(&[("G1", Some("ABC1"), 2.5), ("G2", None, -1.25)]);
    let table = load_default(xlsx, "first").unwrap();
    assert_eq!(table.role, "first");
    assert_eq!(table.fold_change_columns, vec!["logFC"]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.records[0].gene_symbol.as_deref(), Some("ABC1"));
    assert_eq!(table.records[1].gene_symbol, None);
    assert_eq!(table.records[1].fold_changes, vec![Some(-1.25)]);
}

#[test]
fn test_default_sheet_is_preferred_over_first() {
    let xlsx = XlsxBuilder::new()
        .sheet(gene_sheet("Summary", &[("S1", None, 9.0)]))
        .sheet(gene_sheet("sigDEG_FC1", &[("G1", None, 1.0)]))
        .build();
    let table = load_default(xlsx, "first").unwrap();
    assert_eq!(table.records[0].gene_id, "G1");
}

#[test]
fn test_missing_default_sheet_falls_back_to_first() {
    let xlsx = XlsxBuilder::new()
        .sheet(gene_sheet("Results", &[("G7", Some("XYZ"), 3.0)]))
        .sheet(SheetBuilder::new("Notes").header(&["note"]))
        .build();
    let table = load_default(xlsx, "first").unwrap();
    assert_eq!(table.records[0].gene_id, "G7");
}

#[test]
fn test_named_sheet_must_exist() {
    let mut source = SpreadsheetSource::from_xlsx(gene_xlsx(&[("G1", None, 1.0)])).unwrap();
    let err = load_table(
        &mut source,
        &SheetSelection::Named("Missing".into()),
        "first",
    )
    .unwrap_err();
    assert!(matches!(err, HeatmapError::SheetNotFound(_)));
    assert_eq!(err.to_string(), "Worksheet Missing not found");
}

#[test]
fn test_sheet_names_in_workbook_order() {
    let xlsx = XlsxBuilder::new()
        .sheet(gene_sheet("b", &[]))
        .sheet(gene_sheet("a", &[]))
        .build();
    let source = SpreadsheetSource::from_xlsx(xlsx).unwrap();
    assert_eq!(source.sheet_names(), ["b", "a"]);
}

#[test_case(&["gene_symbol", "logFC"], "first" ; "no gene id")]
#[test_case(&["gene_id", "logFC"], "second" ; "no gene symbol")]
#[test_case(&["gene_id", "gene_symbol", "padj"], "root" ; "no fold change")]
fn test_missing_column_names_role(header: &[&str], role: &str) {
    let xlsx = XlsxBuilder::new()
        .sheet(SheetBuilder::new("sigDEG_FC1").header(header))
        .build();
    let err = load_default(xlsx, role).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::MissingColumn));
    let message = err.to_string();
    let expected_role = format!("in {}{} file", role[..1].to_uppercase(), &role[1..]);
    assert!(message.contains(&expected_role), "{message}");
    assert!(message.contains("{gene_id, gene_symbol, logFC*}"), "{message}");
}

#[test]
fn test_empty_sheet_is_missing_columns() {
    let xlsx = XlsxBuilder::new()
        .sheet(SheetBuilder::new("sigDEG_FC1"))
        .build();
    let err = load_default(xlsx, "first").unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::MissingColumn));
}

#[test]
fn test_extra_columns_are_dropped_and_logfc_prefix_kept() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("sigDEG_FC1")
                .header(&["padj", "gene_id", "logFC_leaf", "gene_symbol", "logFC"])
                .row(vec![
                    0.01.into(),
                    "G1".into(),
                    1.5.into(),
                    "ABC".into(),
                    (-2).into(),
                ]),
        )
        .build();
    let table = load_default(xlsx, "first").unwrap();
    assert_eq!(table.fold_change_columns, vec!["logFC_leaf", "logFC"]);
    assert_eq!(table.records[0].fold_changes, vec![Some(1.5), Some(-2.0)]);
    assert_eq!(table.primary_column(), Some("logFC"));
}

#[test]
fn test_inline_strings_and_bad_values() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("sigDEG_FC1")
                .header(&["gene_id", "gene_symbol", "logFC"])
                .row(vec![
                    CellValue::InlineString("G1".into()),
                    CellValue::InlineString("  ".into()),
                    CellValue::Error("#N/A".into()),
                ])
                .row(vec!["G2".into(), "B".into(), "n/a".into()])
                .row(vec!["G3".into(), "C".into(), "0.75".into()]),
        )
        .build();
    let table = load_default(xlsx, "first").unwrap();
    assert_eq!(table.records[0].gene_id, "G1");
    assert_eq!(table.records[0].gene_symbol, None);
    assert_eq!(table.records[0].fold_changes, vec![None]);
    assert_eq!(table.records[1].fold_changes, vec![None]);
    assert_eq!(table.records[2].fold_changes, vec![Some(0.75)]);
}

#[test]
fn test_rows_without_gene_id_are_skipped() {
    let xlsx = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("sigDEG_FC1")
                .header(&["gene_id", "gene_symbol", "logFC"])
                .gene("G1", None, 1.0)
                .blank_row()
                .row(vec![CellValue::Empty, "ORPHAN".into(), 4.0.into()])
                .gene("G2", None, 2.0),
        )
        .build();
    let table = load_default(xlsx, "first").unwrap();
    let ids: Vec<&str> = table.records.iter().map(|r| r.gene_id.as_str()).collect();
    assert_eq!(ids, vec!["G1", "G2"]);
}

#[test]
fn test_delimited_sources() {
    let tsv = b"gene_id\tgene_symbol\tlogFC\nG1\tA\t1.5\n";
    let mut source = SpreadsheetSource::from_delimited(tsv, Delimiter::Tab);
    assert_eq!(source.sheet_names(), ["TSV"]);
    let table = load_table(&mut source, &SheetSelection::Default, "first").unwrap();
    assert_eq!(table.records[0].fold_changes, vec![Some(1.5)]);

    let csv = fixtures::gene_csv(&[("G1", Some("A"), -0.5)]);
    let mut source = SpreadsheetSource::from_delimited(&csv, Delimiter::Comma);
    let table = load_table(&mut source, &SheetSelection::Default, "first").unwrap();
    assert_eq!(table.records[0].gene_symbol.as_deref(), Some("A"));
}

#[test]
fn test_corrupt_xlsx_is_a_hard_failure() {
    let err = SpreadsheetSource::from_xlsx(b"not a zip".to_vec()).unwrap_err();
    assert!(matches!(err, HeatmapError::Zip(_)));
    assert!(!err.is_recoverable());
}
