//! Matrix assembler - column order, row sort, labels and canvas size.

use std::cmp::Ordering;

use crate::types::{
    CanvasSize, ColumnOrder, HeatmapMatrix, MatrixColumn, ReconciledTable, SortOrder,
};

/// Fixed canvas width in inches.
pub const CANVAS_WIDTH_IN: f64 = 6.0;
/// Canvas height bounds in inches.
pub const CANVAS_MIN_HEIGHT_IN: f64 = 6.0;
pub const CANVAS_MAX_HEIGHT_IN: f64 = 10.0;
/// Height per gene row in inches before clamping.
pub const ROW_HEIGHT_IN: f64 = 0.15;

/// How to lay out the matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyOptions {
    pub order: ColumnOrder,
    pub sort: SortOrder,
    /// Custom column labels in display order. Used only when there is one
    /// per column and none is blank.
    pub labels: Vec<String>,
}

/// Canvas size for `rows` genes: fixed width, height
/// `clamp(rows * 0.15, 6, 10)`.
pub fn canvas_size(rows: usize) -> CanvasSize {
    #[allow(clippy::cast_precision_loss)]
    let height = (rows as f64 * ROW_HEIGHT_IN).clamp(CANVAS_MIN_HEIGHT_IN, CANVAS_MAX_HEIGHT_IN);
    CanvasSize {
        width_in: CANVAS_WIDTH_IN,
        height_in: height,
    }
}

/// Descending order with NaN last.
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Build the heatmap matrix from a reconciled table.
pub fn assemble(table: &ReconciledTable, options: &AssemblyOptions) -> HeatmapMatrix {
    let first = MatrixColumn {
        label: table.column_a.clone(),
        values: table.rows.iter().map(|r| r.fold_change_a()).collect(),
    };
    let mut columns = vec![first];
    if let Some(column_b) = &table.column_b {
        let second = MatrixColumn {
            label: column_b.clone(),
            values: table
                .rows
                .iter()
                .map(|r| r.fold_change_b().unwrap_or(f64::NAN))
                .collect(),
        };
        match options.order {
            ColumnOrder::FirstSecond => columns.push(second),
            ColumnOrder::SecondFirst => columns.insert(0, second),
        }
    }
    let default_labels: Vec<String> = columns.iter().map(|c| c.label.clone()).collect();

    let custom_complete = options.labels.len() == columns.len()
        && options.labels.iter().all(|l| !l.trim().is_empty());
    if custom_complete {
        for (column, label) in columns.iter_mut().zip(&options.labels) {
            column.label.clone_from(label);
        }
    } else if !options.labels.is_empty() {
        tracing::debug!(
            supplied = options.labels.len(),
            expected = columns.len(),
            "custom labels incomplete, using defaults"
        );
    }

    let mut order: Vec<usize> = (0..table.rows.len()).collect();
    let sort_column = match &options.sort {
        SortOrder::Original => None,
        SortOrder::DescendingFirst => Some(0),
        SortOrder::DescendingBy(label) => {
            let found = columns
                .iter()
                .position(|c| &c.label == label)
                .or_else(|| default_labels.iter().position(|l| l == label));
            if found.is_none() {
                tracing::warn!(label = %label, "sort column not found, keeping original order");
            }
            found
        }
    };
    if let Some(values) = sort_column
        .and_then(|idx| columns.get(idx))
        .map(|c| c.values.clone())
    {
        // sort_by is stable, ties keep reconciliation order
        order.sort_by(|&a, &b| {
            let va = values.get(a).copied().unwrap_or(f64::NAN);
            let vb = values.get(b).copied().unwrap_or(f64::NAN);
            descending(va, vb)
        });
        for column in &mut columns {
            column.values = order
                .iter()
                .map(|&i| column.values.get(i).copied().unwrap_or(f64::NAN))
                .collect();
        }
    }

    let row_index: Vec<String> = order
        .iter()
        .filter_map(|&i| table.rows.get(i))
        .map(|r| r.gene_name().to_string())
        .collect();

    let canvas = canvas_size(row_index.len());
    tracing::info!(
        rows = row_index.len(),
        columns = columns.len(),
        height_in = canvas.height_in,
        "assembled matrix"
    );

    HeatmapMatrix {
        row_index,
        columns,
        canvas,
    }
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
    use crate::types::ReconciledRow;
    use test_case::test_case;

    fn dual() -> ReconciledTable {
        ReconciledTable {
            role_a: "leaf".into(),
            role_b: Some("root".into()),
            column_a: "logFC_leaf".into(),
            column_b: Some("logFC_root".into()),
            rows: vec![
                ReconciledRow::new("G1".into(), None, 1.0, Some(-1.0)),
                ReconciledRow::new("G2".into(), Some("B".into()), 3.0, Some(0.0)),
                ReconciledRow::new("G3".into(), None, 1.0, Some(2.0)),
            ],
        }
    }

    #[test]
    fn test_flip_reorders_columns_without_changing_values() {
        let options = AssemblyOptions {
            sort: SortOrder::Original,
            ..AssemblyOptions::default()
        };
        let straight = assemble(&dual(), &options);
        let flipped = assemble(
            &dual(),
            &AssemblyOptions {
                order: ColumnOrder::SecondFirst,
                ..options
            },
        );
        assert_eq!(straight.labels(), vec!["logFC_leaf", "logFC_root"]);
        assert_eq!(flipped.labels(), vec!["logFC_root", "logFC_leaf"]);
        assert_eq!(straight.columns[0], flipped.columns[1]);
        assert_eq!(straight.columns[1], flipped.columns[0]);
        assert_eq!(straight.row_index, flipped.row_index);
    }

    #[test]
    fn test_sort_descending_by_first_displayed_column_is_stable() {
        let matrix = assemble(&dual(), &AssemblyOptions::default());
        assert_eq!(matrix.row_index, vec!["G2 - B", "G1", "G3"]);
        assert_eq!(matrix.columns[1].values, vec![0.0, -1.0, 2.0]);

        let flipped = assemble(
            &dual(),
            &AssemblyOptions {
                order: ColumnOrder::SecondFirst,
                ..AssemblyOptions::default()
            },
        );
        assert_eq!(flipped.row_index, vec!["G3", "G2 - B", "G1"]);
    }

    #[test]
    fn test_sort_by_label_and_nan_last() {
        let table = ReconciledTable {
            role_a: "guided".into(),
            role_b: None,
            column_a: "logFC_guided".into(),
            column_b: None,
            rows: vec![
                ReconciledRow::new("G1".into(), None, f64::NAN, None),
                ReconciledRow::new("G2".into(), None, -1.0, None),
                ReconciledRow::new("G3".into(), None, 4.0, None),
            ],
        };
        let matrix = assemble(
            &table,
            &AssemblyOptions {
                sort: SortOrder::DescendingBy("logFC_guided".into()),
                ..AssemblyOptions::default()
            },
        );
        assert_eq!(matrix.column_count(), 1);
        assert_eq!(matrix.row_index, vec!["G3", "G2", "G1"]);
        assert!(matrix.value(2, 0).unwrap().is_nan());
    }

    #[test]
    fn test_custom_labels_need_every_slot() {
        let partial = AssemblyOptions {
            labels: vec!["Leaf".into(), " ".into()],
            ..AssemblyOptions::default()
        };
        assert_eq!(assemble(&dual(), &partial).labels(), vec!["logFC_leaf", "logFC_root"]);

        let full = AssemblyOptions {
            labels: vec!["Leaf".into(), "Root".into()],
            ..AssemblyOptions::default()
        };
        assert_eq!(assemble(&dual(), &full).labels(), vec!["Leaf", "Root"]);
    }

    #[test_case(0, 6.0 ; "empty clamps to minimum")]
    #[test_case(50, 7.5 ; "proportional")]
    #[test_case(1000, 10.0 ; "large clamps to maximum")]
    fn test_canvas_size(rows: usize, height: f64) {
        let canvas = canvas_size(rows);
        assert_eq!(canvas.width_in, 6.0);
        assert!((canvas.height_in - height).abs() < 1e-9);
    }
}
