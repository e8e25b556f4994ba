use serde::{Deserialize, Serialize};

/// Column holding the stable gene identifier.
pub const GENE_ID: &str = "gene_id";
/// Column holding the human-readable gene symbol.
pub const GENE_SYMBOL: &str = "gene_symbol";
/// Prefix shared by every fold-change column.
pub const FOLD_CHANGE_PREFIX: &str = "logFC";

/// One gene row of a loaded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneRecord {
    pub gene_id: String,
    /// `None` when the cell is empty or blank.
    pub gene_symbol: Option<String>,
    /// Values aligned with [`GeneTable::fold_change_columns`].
    pub fold_changes: Vec<Option<f64>>,
}

/// A sheet filtered down to `gene_id`, `gene_symbol` and the `logFC*` columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneTable {
    /// Role name of the table ("first", "second", "leaf", ...).
    pub role: String,
    pub fold_change_columns: Vec<String>,
    pub records: Vec<GeneRecord>,
}

impl GeneTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the primary fold-change column: exactly `logFC` if present,
    /// otherwise the first `logFC`-prefixed column.
    pub fn primary_column_index(&self) -> Option<usize> {
        self.fold_change_columns
            .iter()
            .position(|c| c == FOLD_CHANGE_PREFIX)
            .or_else(|| (!self.fold_change_columns.is_empty()).then_some(0))
    }

    /// Name of the primary fold-change column.
    pub fn primary_column(&self) -> Option<&str> {
        self.primary_column_index()
            .and_then(|idx| self.fold_change_columns.get(idx))
            .map(String::as_str)
    }
}

/// Display label for a gene: `"{id} - {symbol}"`, or just the id when the
/// symbol is missing or blank.
pub fn gene_name(gene_id: &str, gene_symbol: Option<&str>) -> String {
    match gene_symbol {
        Some(symbol) if !symbol.trim().is_empty() => format!("{gene_id} - {symbol}"),
        _ => gene_id.to_string(),
    }
}

/// A merged gene row. The display name is derived from id and symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledRow {
    gene_id: String,
    gene_symbol: Option<String>,
    fold_change_a: f64,
    fold_change_b: Option<f64>,
    gene_name: String,
}

impl ReconciledRow {
    pub fn new(
        gene_id: String,
        gene_symbol: Option<String>,
        fold_change_a: f64,
        fold_change_b: Option<f64>,
    ) -> Self {
        let gene_name = gene_name(&gene_id, gene_symbol.as_deref());
        Self {
            gene_id,
            gene_symbol,
            fold_change_a,
            fold_change_b,
            gene_name,
        }
    }

    pub fn gene_id(&self) -> &str {
        &self.gene_id
    }

    pub fn gene_symbol(&self) -> Option<&str> {
        self.gene_symbol.as_deref()
    }

    /// Fold change from the first (reference) table. NaN when absent in
    /// single-table mode.
    pub fn fold_change_a(&self) -> f64 {
        self.fold_change_a
    }

    /// Fold change from the second table; `None` in single-table mode.
    pub fn fold_change_b(&self) -> Option<f64> {
        self.fold_change_b
    }

    pub fn gene_name(&self) -> &str {
        &self.gene_name
    }
}

/// Output of the reconciler, keyed by `gene_name` in row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledTable {
    /// Role of the first (reference) table.
    pub role_a: String,
    /// Role of the second table, if one was merged.
    pub role_b: Option<String>,
    /// Output column name for side A, e.g. `logFC_first`.
    pub column_a: String,
    /// Output column name for side B, e.g. `logFC_second`.
    pub column_b: Option<String>,
    pub rows: Vec<ReconciledRow>,
}

impl ReconciledTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when a second table was merged in.
    pub fn is_dual(&self) -> bool {
        self.column_b.is_some()
    }

    /// The reference column: side A's fold changes in row order.
    pub fn reference_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(ReconciledRow::fold_change_a)
    }

    /// Render as tab-separated text with a header line.
    pub fn to_tsv(&self) -> String {
        let mut out = format!("gene_name\t{GENE_ID}\t{GENE_SYMBOL}\t{}", self.column_a);
        if let Some(column_b) = &self.column_b {
            out.push('\t');
            out.push_str(column_b);
        }
        out.push('\n');
        for row in &self.rows {
            out.push_str(&format!(
                "{}\t{}\t{}\t{}",
                row.gene_name(),
                row.gene_id(),
                row.gene_symbol().unwrap_or(""),
                row.fold_change_a()
            ));
            if let Some(b) = row.fold_change_b() {
                out.push_str(&format!("\t{b}"));
            }
            out.push('\n');
        }
        out
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
    use test_case::test_case;

    #[test_case("G1", None, "G1" ; "missing symbol")]
    #[test_case("G1", Some(""), "G1" ; "empty symbol")]
    #[test_case("G1", Some("   "), "G1" ; "blank symbol")]
    #[test_case("G1", Some("SYM"), "G1 - SYM" ; "with symbol")]
    fn test_gene_name(id: &str, symbol: Option<&str>, expected: &str) {
        assert_eq!(gene_name(id, symbol), expected);
    }

    #[test]
    fn test_reconciled_row_derives_name() {
        let row = ReconciledRow::new("ENSG1".into(), Some("TP53".into()), 1.5, Some(0.0));
        assert_eq!(row.gene_name(), "ENSG1 - TP53");
        assert_eq!(row.fold_change_b(), Some(0.0));
    }

    fn table(columns: &[&str]) -> GeneTable {
        GeneTable {
            role: "first".into(),
            fold_change_columns: columns.iter().map(ToString::to_string).collect(),
            records: Vec::new(),
        }
    }

    #[test]
    fn test_primary_column_prefers_exact_name() {
        assert_eq!(table(&["logFC_raw", "logFC"]).primary_column(), Some("logFC"));
        assert_eq!(table(&["logFC_raw", "logFC2"]).primary_column(), Some("logFC_raw"));
        assert_eq!(table(&[]).primary_column(), None);
    }

    #[test]
    fn test_to_tsv_single_table() {
        let t = ReconciledTable {
            role_a: "guided".into(),
            role_b: None,
            column_a: "logFC_guided".into(),
            column_b: None,
            rows: vec![ReconciledRow::new("G1".into(), None, -2.0, None)],
        };
        assert_eq!(
            t.to_tsv(),
            "gene_name\tgene_id\tgene_symbol\tlogFC_guided\nG1\tG1\t\t-2\n"
        );
    }
}
