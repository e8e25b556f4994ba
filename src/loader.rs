//! Table loader - reads one sheet and keeps the gene id, symbol and
//! fold-change columns.

use crate::error::{HeatmapError, Result};
use crate::parser::{SheetSelection, SpreadsheetSource};
use crate::types::{
    CellValue, GeneRecord, GeneTable, SheetGrid, FOLD_CHANGE_PREFIX, GENE_ID, GENE_SYMBOL,
};

/// Column set reported when a table fails validation.
pub const REQUIRED_COLUMNS: [&str; 3] = [GENE_ID, GENE_SYMBOL, "logFC*"];

/// Load the selected sheet of `source` as the table playing `role`.
///
/// Fails with [`HeatmapError::MissingColumn`] naming `role` when the sheet
/// lacks `gene_id`, `gene_symbol` or any `logFC`-prefixed column.
pub fn load_table(
    source: &mut SpreadsheetSource,
    selection: &SheetSelection,
    role: &str,
) -> Result<GeneTable> {
    let grid = source.select(selection)?;
    let table = table_from_grid(&grid, role)?;
    tracing::info!(
        role,
        sheet = %grid.name,
        rows = table.len(),
        fold_change_columns = table.fold_change_columns.len(),
        "loaded table"
    );
    Ok(table)
}

/// Filter a parsed sheet down to a [`GeneTable`].
pub fn table_from_grid(grid: &SheetGrid, role: &str) -> Result<GeneTable> {
    let Some((header, rows)) = grid.header_and_rows() else {
        return Err(HeatmapError::missing_column(role, &REQUIRED_COLUMNS));
    };

    let id_col = header.iter().position(|h| h == GENE_ID);
    let symbol_col = header.iter().position(|h| h == GENE_SYMBOL);
    let fold_change_cols: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .filter(|(_, h)| h.starts_with(FOLD_CHANGE_PREFIX))
        .map(|(idx, h)| (idx, h.clone()))
        .collect();

    let (Some(id_col), Some(symbol_col)) = (id_col, symbol_col) else {
        return Err(HeatmapError::missing_column(role, &REQUIRED_COLUMNS));
    };
    if fold_change_cols.is_empty() {
        return Err(HeatmapError::missing_column(role, &REQUIRED_COLUMNS));
    }

    let mut records = Vec::with_capacity(rows.len());
    for (offset, row) in rows.iter().enumerate() {
        let gene_id = row
            .get(id_col)
            .and_then(Option::as_ref)
            .map(CellValue::to_text)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if gene_id.is_empty() {
            tracing::debug!(role, row = offset + 1, "skipping row without gene_id");
            continue;
        }

        let gene_symbol = row
            .get(symbol_col)
            .and_then(Option::as_ref)
            .map(CellValue::to_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let fold_changes = fold_change_cols
            .iter()
            .map(|(idx, name)| {
                fold_change_value(row.get(*idx).and_then(Option::as_ref), name, &gene_id)
            })
            .collect();

        records.push(GeneRecord {
            gene_id,
            gene_symbol,
            fold_changes,
        });
    }

    Ok(GeneTable {
        role: role.to_string(),
        fold_change_columns: fold_change_cols.into_iter().map(|(_, name)| name).collect(),
        records,
    })
}

fn fold_change_value(cell: Option<&CellValue>, column: &str, gene_id: &str) -> Option<f64> {
    let cell = cell?;
    if cell.is_blank() {
        return None;
    }
    let value = cell.as_number();
    if value.is_none() {
        tracing::warn!(
            gene_id,
            column,
            value = %cell.to_text(),
            "non-numeric fold change treated as absent"
        );
    }
    value
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
    use crate::csv::Delimiter;
    use crate::error::ErrorKind;
    use test_case::test_case;

    fn load(csv: &str, role: &str) -> Result<GeneTable> {
        let mut source = SpreadsheetSource::from_delimited(csv.as_bytes(), Delimiter::Comma);
        load_table(&mut source, &SheetSelection::Default, role)
    }

    #[test]
    fn test_keeps_only_required_columns() {
        let table = load(
            "gene_id,gene_symbol,pvalue,logFC,logFC_se\nG1,A,0.01,1.5,0.2\nG2,,0.2,-3,0.1\n",
            "first",
        )
        .unwrap();
        assert_eq!(table.fold_change_columns, vec!["logFC", "logFC_se"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].gene_symbol.as_deref(), Some("A"));
        assert_eq!(table.records[1].gene_symbol, None);
        assert_eq!(table.records[1].fold_changes, vec![Some(-3.0), Some(0.1)]);
    }

    #[test_case("gene_symbol,logFC\nA,1\n" ; "no gene_id")]
    #[test_case("gene_id,logFC\nG1,1\n" ; "no gene_symbol")]
    #[test_case("gene_id,gene_symbol,FC\nG1,A,1\n" ; "no logFC column")]
    #[test_case("" ; "empty sheet")]
    fn test_missing_column_names_role(csv: &str) {
        let err = load(csv, "leaf").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::MissingColumn));
        assert!(err.to_string().contains("Leaf file"), "{err}");
    }

    #[test]
    fn test_blank_ids_skipped_and_text_fold_change_absent() {
        let table = load("gene_id,gene_symbol,logFC\n,X,1\nG1,A,NA\n101,B,2\n", "first").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].fold_changes, vec![None]);
        assert_eq!(table.records[1].gene_id, "101");
    }

    #[test]
    fn test_missing_named_sheet_is_hard_error() {
        let mut source = SpreadsheetSource::from_delimited(b"gene_id\n", Delimiter::Comma);
        let err = load_table(&mut source, &SheetSelection::Named("sigDEG_FC2".into()), "first")
            .unwrap_err();
        assert!(matches!(err, HeatmapError::SheetNotFound(_)));
        assert_eq!(err.kind(), None);
    }
}
