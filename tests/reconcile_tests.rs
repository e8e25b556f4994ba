//! Tests for merging tables and deriving the color scale.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod fixtures;

use fcheat::loader::load_table;
use fcheat::pipeline::prepare;
use fcheat::range::{color_scale, RangeOverride};
use fcheat::reconcile::reconcile;
use fcheat::{
    ColorRamp, ErrorKind, GeneTable, HeatmapRequest, InputSource, SheetSelection,
    SpreadsheetSource,
};
use fixtures::gene_xlsx;
use test_case::test_case;

fn table(role: &str, genes: &[(&str, Option<&str>, f64)]) -> GeneTable {
    let mut source = SpreadsheetSource::from_xlsx(gene_xlsx(genes)).unwrap();
    load_table(&mut source, &SheetSelection::Default, role).unwrap()
}

#[test]
fn test_left_join_keeps_every_first_row_in_order() {
    let a = table(
        "first",
        &[("G1", Some("A"), 1.0), ("G2", None, 2.0), ("G3", Some("C"), 3.0)],
    );
    let b = table("second", &[("G9", None, 9.0), ("G2", None, -4.0)]);
    let merged = reconcile(&a, Some(&b)).unwrap();

    let ids: Vec<&str> = merged.rows.iter().map(|r| r.gene_id()).collect();
    assert_eq!(ids, vec!["G1", "G2", "G3"]);
    let b_values: Vec<Option<f64>> = merged.rows.iter().map(|r| r.fold_change_b()).collect();
    assert_eq!(b_values, vec![Some(0.0), Some(-4.0), Some(0.0)]);
    assert_eq!(merged.column_a, "logFC_first");
    assert_eq!(merged.column_b.as_deref(), Some("logFC_second"));
}

#[test]
fn test_join_key_includes_symbol() {
    let a = table("first", &[("G1", Some("A"), 1.0), ("G2", None, 2.0)]);
    let b = table("second", &[("G1", Some("B"), 5.0), ("G2", Some("X"), 6.0)]);
    let merged = reconcile(&a, Some(&b)).unwrap();
    assert!(merged
        .rows
        .iter()
        .all(|r| r.fold_change_b() == Some(0.0)));
}

#[test]
fn test_missing_first_values_are_imputed_in_dual_mode() {
    let csv = b"gene_id,gene_symbol,logFC\nG1,A,\nG2,B,oops\n";
    let mut source =
        SpreadsheetSource::from_delimited(csv, fcheat::Delimiter::Comma);
    let a = load_table(&mut source, &SheetSelection::Default, "first").unwrap();
    let b = table("second", &[("G1", Some("A"), 2.0)]);
    let merged = reconcile(&a, Some(&b)).unwrap();
    assert_eq!(merged.rows[0].fold_change_a(), 0.0);
    assert_eq!(merged.rows[1].fold_change_a(), 0.0);
    assert_eq!(merged.rows[0].fold_change_b(), Some(2.0));

    // Imputation happens before the range is derived, so the auto range
    // sees the zeros and never the second table's value.
    let request = HeatmapRequest::new(InputSource::Delimited {
        data: csv.to_vec(),
        delimiter: fcheat::Delimiter::Comma,
    })
    .with_second(InputSource::Delimited {
        data: b"gene_id,gene_symbol,logFC\nG1,A,2\nG2,B,-6\n".to_vec(),
        delimiter: fcheat::Delimiter::Comma,
    });
    let (table, scale, matrix) = prepare(&request).unwrap();
    assert!(table.is_dual());
    assert_eq!((scale.vmin, scale.vmax), (0.0, 0.0));
    assert_eq!(matrix.columns[0].values, vec![0.0, 0.0]);
    assert_eq!(matrix.columns[1].values, vec![2.0, -6.0]);
}

#[test]
fn test_single_mode_passes_values_through() {
    let a = table("leaf", &[("G1", Some("A"), -1.5), ("G2", None, 0.25)]);
    let reconciled = reconcile(&a, None).unwrap();
    assert!(!reconciled.is_dual());
    assert_eq!(reconciled.column_a, "logFC_leaf");
    assert_eq!(reconciled.rows[0].gene_name(), "G1 - A");
    assert_eq!(reconciled.rows[1].gene_name(), "G2");
    assert_eq!(reconciled.rows[1].fold_change_b(), None);
}

#[test]
fn test_identical_roles_cannot_merge() {
    let a = table("first", &[("G1", None, 1.0)]);
    let err = reconcile(&a, Some(&a)).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::MergeFailure));
}

#[test]
fn test_auto_range_uses_first_table_only() {
    let a = table(
        "first",
        &[("G1", None, -3.0), ("G2", None, 5.0), ("G3", None, 0.0)],
    );
    let b = table("second", &[("G1", None, 40.0)]);
    let merged = reconcile(&a, Some(&b)).unwrap();
    let scale = color_scale(&merged, RangeOverride::default(), ColorRamp::default());
    assert_eq!((scale.vmin, scale.vmax), (-5.0, 5.0));
    assert_eq!(scale.center, 0.0);
}

#[test_case(Some(-2.0), Some(2.0), (-2.0, 2.0) ; "both supplied")]
#[test_case(Some(-1.0), None, (-1.0, 5.0) ; "only vmin")]
#[test_case(None, Some(8.0), (-5.0, 8.0) ; "only vmax")]
#[test_case(Some(0.0), Some(0.0), (-5.0, 5.0) ; "zero means unset")]
#[test_case(Some(0.0), Some(3.0), (-5.0, 3.0) ; "zero vmin only")]
fn test_range_overrides(vmin: Option<f64>, vmax: Option<f64>, expected: (f64, f64)) {
    let a = table("first", &[("G1", None, -3.0), ("G2", None, 5.0)]);
    let reconciled = reconcile(&a, None).unwrap();
    let scale = color_scale(
        &reconciled,
        RangeOverride::new(vmin, vmax),
        ColorRamp::default(),
    );
    assert_eq!((scale.vmin, scale.vmax), expected);
}

#[test]
fn test_all_missing_reference_gives_zero_range() {
    let csv = b"gene_id,gene_symbol,logFC\nG1,A,\n";
    let mut source =
        SpreadsheetSource::from_delimited(csv, fcheat::Delimiter::Comma);
    let a = load_table(&mut source, &SheetSelection::Default, "first").unwrap();
    let reconciled = reconcile(&a, None).unwrap();
    let scale = color_scale(&reconciled, RangeOverride::default(), ColorRamp::default());
    assert_eq!((scale.vmin, scale.vmax), (0.0, 0.0));
    assert_eq!(scale.position(1.0), Some(0.5));
}
