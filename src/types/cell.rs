use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A raw cell value as stored in the source document.
///
/// Styles and number formats are not applied: a date-formatted cell is a
/// `Number`, a formula cell carries its cached result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "camelCase")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Error(String),
}

impl CellValue {
    /// Display text of the value. Integral numbers print without a fraction.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) | Self::Error(s) => s.clone(),
            Self::Number(n) => format_number(*n),
            Self::Boolean(true) => "TRUE".to_string(),
            Self::Boolean(false) => "FALSE".to_string(),
        }
    }

    /// Numeric reading of the value; numeric-looking text is accepted.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            Self::Boolean(_) | Self::Error(_) => None,
        }
    }

    /// True for text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

/// Format a number the way a spreadsheet shows an unformatted value.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

/// Cell with position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellData {
    pub r: u32, // row (0-indexed)
    pub c: u32, // col (0-indexed)
    pub value: CellValue,
}

/// One worksheet's cells, sparse and in document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetGrid {
    pub name: String,
    pub cells: Vec<CellData>,
}

/// Header names plus dense data rows, `None` marking an empty cell.
pub type HeaderAndRows = (Vec<String>, Vec<Vec<Option<CellValue>>>);

impl SheetGrid {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Split the grid into a header row and dense data rows.
    ///
    /// The first row holding any cell is the header. Blank header cells are
    /// named `Unnamed: {col}`; repeated names get `.1`, `.2`, ... suffixes in
    /// order of appearance. Rows are as wide as the header's last non-blank
    /// cell; values further right are dropped. Returns `None` for an empty
    /// sheet.
    pub fn header_and_rows(&self) -> Option<HeaderAndRows> {
        let mut by_row: BTreeMap<u32, Vec<&CellData>> = BTreeMap::new();
        for cell in &self.cells {
            by_row.entry(cell.r).or_default().push(cell);
        }

        let (&header_row, header_cells) = by_row.iter().next()?;
        let width = header_cells
            .iter()
            .filter(|cell| !cell.value.is_blank())
            .map(|cell| cell.c as usize + 1)
            .max()
            .unwrap_or(0);
        let mut raw_header: Vec<Option<String>> = vec![None; width];
        for cell in header_cells {
            if let Some(slot) = raw_header.get_mut(cell.c as usize) {
                if !cell.value.is_blank() {
                    *slot = Some(cell.value.to_text());
                }
            }
        }
        let header = dedupe_header(raw_header);

        let last_row = by_row.keys().next_back().copied().unwrap_or(header_row);
        let mut rows = Vec::new();
        for r in header_row.saturating_add(1)..=last_row {
            let mut row: Vec<Option<CellValue>> = vec![None; width];
            if let Some(cells) = by_row.get(&r) {
                for cell in cells {
                    if let Some(slot) = row.get_mut(cell.c as usize) {
                        *slot = Some(cell.value.clone());
                    }
                }
            }
            rows.push(row);
        }

        Some((header, rows))
    }
}

fn dedupe_header(raw: Vec<Option<String>>) -> Vec<String> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    let mut names = Vec::with_capacity(raw.len());
    for (idx, name) in raw.into_iter().enumerate() {
        let base = name.unwrap_or_else(|| format!("Unnamed: {idx}"));
        let count = seen.entry(base.clone()).or_insert(0);
        if *count == 0 {
            names.push(base);
        } else {
            names.push(format!("{base}.{count}"));
        }
        *count += 1;
    }
    names
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

    fn cell(r: u32, c: u32, value: CellValue) -> CellData {
        CellData { r, c, value }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234.0), "1234");
        assert_eq!(format_number(-2.5), "-2.5");
        assert_eq!(format_number(0.125), "0.125");
    }

    #[test]
    fn test_as_number_accepts_numeric_text() {
        assert_eq!(CellValue::Text(" 1.5 ".into()).as_number(), Some(1.5));
        assert_eq!(CellValue::Text("NA".into()).as_number(), None);
        assert_eq!(CellValue::Boolean(true).as_number(), None);
    }

    #[test]
    fn test_header_and_rows_fills_gaps() {
        let mut grid = SheetGrid::new("s");
        grid.cells = vec![
            cell(1, 0, CellValue::Text("gene_id".into())),
            cell(1, 2, CellValue::Text("logFC".into())),
            cell(2, 0, CellValue::Text("G1".into())),
            cell(2, 2, CellValue::Number(1.0)),
            cell(4, 0, CellValue::Text("G2".into())),
        ];
        let (header, rows) = grid.header_and_rows().unwrap();
        assert_eq!(header, vec!["gene_id", "Unnamed: 1", "logFC"]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][2], Some(CellValue::Number(1.0)));
        assert!(rows[1].iter().all(Option::is_none));
        assert_eq!(rows[2][0], Some(CellValue::Text("G2".into())));
    }

    #[test]
    fn test_stray_far_right_value_does_not_widen_rows() {
        let mut grid = SheetGrid::new("s");
        grid.cells = vec![
            cell(0, 0, CellValue::Text("gene_id".into())),
            cell(0, 1, CellValue::Text("logFC".into())),
            cell(0, 5, CellValue::Text(String::new())),
            cell(1, 0, CellValue::Text("G1".into())),
            cell(1, 1, CellValue::Number(2.0)),
            cell(2, 16_383, CellValue::Number(9.0)),
        ];
        let (header, rows) = grid.header_and_rows().unwrap();
        assert_eq!(header, vec!["gene_id", "logFC"]);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.len() == 2));
        assert_eq!(rows[0][1], Some(CellValue::Number(2.0)));
        assert!(rows[1].iter().all(Option::is_none));
    }

    #[test]
    fn test_duplicate_headers_are_mangled() {
        let mut grid = SheetGrid::new("s");
        grid.cells = vec![
            cell(0, 0, CellValue::Text("logFC".into())),
            cell(0, 1, CellValue::Text("logFC".into())),
            cell(0, 2, CellValue::Text("logFC".into())),
        ];
        let (header, rows) = grid.header_and_rows().unwrap();
        assert_eq!(header, vec!["logFC", "logFC.1", "logFC.2"]);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_empty_grid_has_no_header() {
        assert!(SheetGrid::new("empty").header_and_rows().is_none());
    }
}
