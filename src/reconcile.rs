//! Reconciler - merges one or two gene tables into a gene-indexed table.
//!
//! With a second table, rows are left-joined on `(gene_id, gene_symbol)`
//! anchored on the first table, and every fold change the join leaves
//! absent becomes exactly `0.0`. With one table the primary fold-change
//! column passes through unchanged.

use std::collections::HashMap;

use crate::error::{HeatmapError, Result};
use crate::types::{GeneTable, ReconciledRow, ReconciledTable, FOLD_CHANGE_PREFIX};

/// Value written wherever the merge found no fold change.
pub const IMPUTED_FOLD_CHANGE: f64 = 0.0;

/// Output column name for a table role, e.g. `logFC_first`.
pub fn fold_change_column(role: &str) -> String {
    format!("{FOLD_CHANGE_PREFIX}_{role}")
}

type JoinKey<'a> = (&'a str, Option<&'a str>);

/// Reconcile `first` with an optional `second` table.
pub fn reconcile(first: &GeneTable, second: Option<&GeneTable>) -> Result<ReconciledTable> {
    match second {
        Some(second) => merge(first, second),
        None => pass_through(first),
    }
}

fn primary_index(table: &GeneTable) -> Result<usize> {
    table.primary_column_index().ok_or_else(|| {
        HeatmapError::MergeFailure(format!(
            "table '{}' has no {FOLD_CHANGE_PREFIX} column to merge",
            table.role
        ))
    })
}

fn merge(first: &GeneTable, second: &GeneTable) -> Result<ReconciledTable> {
    if first.role == second.role {
        return Err(HeatmapError::MergeFailure(format!(
            "both tables use the role '{}'; merged columns would collide",
            first.role
        )));
    }
    let a_idx = primary_index(first)?;
    let b_idx = primary_index(second)?;

    // Later rows overwrite earlier ones on a repeated key
    let mut lookup: HashMap<JoinKey<'_>, Option<f64>> = HashMap::with_capacity(second.len());
    for record in &second.records {
        let value = record.fold_changes.get(b_idx).copied().flatten();
        lookup.insert(
            (record.gene_id.as_str(), record.gene_symbol.as_deref()),
            value,
        );
    }

    let mut matched = 0usize;
    let rows: Vec<ReconciledRow> = first
        .records
        .iter()
        .map(|record| {
            let key = (record.gene_id.as_str(), record.gene_symbol.as_deref());
            let b = lookup.get(&key).copied();
            if b.is_some() {
                matched += 1;
            }
            let a = record
                .fold_changes
                .get(a_idx)
                .copied()
                .flatten()
                .filter(|v| !v.is_nan())
                .unwrap_or(IMPUTED_FOLD_CHANGE);
            let b = b
                .flatten()
                .filter(|v| !v.is_nan())
                .unwrap_or(IMPUTED_FOLD_CHANGE);
            ReconciledRow::new(record.gene_id.clone(), record.gene_symbol.clone(), a, Some(b))
        })
        .collect();

    tracing::info!(
        first = %first.role,
        second = %second.role,
        rows = rows.len(),
        matched,
        dropped_second_only = second.len().saturating_sub(matched),
        "merged tables"
    );

    Ok(ReconciledTable {
        role_a: first.role.clone(),
        role_b: Some(second.role.clone()),
        column_a: fold_change_column(&first.role),
        column_b: Some(fold_change_column(&second.role)),
        rows,
    })
}

fn pass_through(table: &GeneTable) -> Result<ReconciledTable> {
    let idx = primary_index(table)?;
    let rows: Vec<ReconciledRow> = table
        .records
        .iter()
        .map(|record| {
            let a = record.fold_changes.get(idx).copied().flatten().unwrap_or(f64::NAN);
            ReconciledRow::new(record.gene_id.clone(), record.gene_symbol.clone(), a, None)
        })
        .collect();

    tracing::info!(role = %table.role, rows = rows.len(), "single table, no merge");

    Ok(ReconciledTable {
        role_a: table.role.clone(),
        role_b: None,
        column_a: fold_change_column(&table.role),
        column_b: None,
        rows,
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::GeneRecord;

    fn record(id: &str, symbol: Option<&str>, fc: Option<f64>) -> GeneRecord {
        GeneRecord {
            gene_id: id.to_string(),
            gene_symbol: symbol.map(ToString::to_string),
            fold_changes: vec![fc],
        }
    }

    fn table(role: &str, records: Vec<GeneRecord>) -> GeneTable {
        GeneTable {
            role: role.to_string(),
            fold_change_columns: vec!["logFC".to_string()],
            records,
        }
    }

    #[test]
    fn test_left_join_is_anchored_on_first_table() {
        let first = table(
            "first",
            vec![
                record("G1", Some("A"), Some(1.0)),
                record("G2", None, Some(-2.0)),
                record("G3", Some("C"), Some(3.0)),
            ],
        );
        let second = table(
            "second",
            vec![
                record("G3", Some("C"), Some(0.5)),
                record("G9", Some("Z"), Some(9.0)),
                record("G2", None, Some(4.0)),
            ],
        );
        let merged = reconcile(&first, Some(&second)).unwrap();
        let ids: Vec<_> = merged.rows.iter().map(ReconciledRow::gene_id).collect();
        assert_eq!(ids, vec!["G1", "G2", "G3"]);
        assert_eq!(merged.rows[0].fold_change_b(), Some(0.0));
        assert_eq!(merged.rows[1].fold_change_b(), Some(4.0));
        assert_eq!(merged.rows[2].fold_change_b(), Some(0.5));
        assert_eq!(merged.column_a, "logFC_first");
        assert_eq!(merged.column_b.as_deref(), Some("logFC_second"));
    }

    #[test]
    fn test_join_key_includes_symbol() {
        let first = table("first", vec![record("G1", Some("A"), Some(1.0))]);
        let second = table("second", vec![record("G1", Some("B"), Some(5.0))]);
        let merged = reconcile(&first, Some(&second)).unwrap();
        assert_eq!(merged.rows[0].fold_change_b(), Some(0.0));
    }

    #[test]
    fn test_absent_values_imputed_with_zero() {
        let first = table("leaf", vec![record("G1", None, None)]);
        let second = table("root", vec![record("G1", None, None)]);
        let merged = reconcile(&first, Some(&second)).unwrap();
        assert_eq!(merged.rows[0].fold_change_a(), 0.0);
        assert_eq!(merged.rows[0].fold_change_b(), Some(0.0));
    }

    #[test]
    fn test_duplicate_key_in_second_table_last_wins() {
        let first = table("first", vec![record("G1", None, Some(1.0))]);
        let second = table(
            "second",
            vec![record("G1", None, Some(2.0)), record("G1", None, Some(3.0))],
        );
        let merged = reconcile(&first, Some(&second)).unwrap();
        assert_eq!(merged.rows[0].fold_change_b(), Some(3.0));
    }

    #[test]
    fn test_single_table_passes_through() {
        let only = table(
            "guided",
            vec![record("G1", Some("A"), Some(1.5)), record("G2", None, None)],
        );
        let out = reconcile(&only, None).unwrap();
        assert!(!out.is_dual());
        assert_eq!(out.rows[0].fold_change_a(), 1.5);
        assert!(out.rows[1].fold_change_a().is_nan());
        assert_eq!(out.rows[0].gene_name(), "G1 - A");
        assert_eq!(out.column_a, "logFC_guided");
    }

    #[test]
    fn test_merge_failure_without_fold_change_column() {
        let mut first = table("first", vec![record("G1", None, Some(1.0))]);
        first.fold_change_columns.clear();
        let second = table("second", Vec::new());
        let err = reconcile(&first, Some(&second)).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::MergeFailure));
    }

    #[test]
    fn test_merge_failure_on_identical_roles() {
        let first = table("first", Vec::new());
        let err = reconcile(&first, Some(&first.clone())).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::MergeFailure));
    }
}
