//! Minimal CSV/TSV parser that produces a single [`SheetGrid`].

use crate::types::{CellData, CellValue, SheetGrid};

/// Delimiter for parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    fn separator(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Tab => '\t',
        }
    }

    /// Name of the single sheet a delimited file exposes.
    pub fn sheet_name(self) -> &'static str {
        match self {
            Self::Comma => "CSV",
            Self::Tab => "TSV",
        }
    }
}

/// Parse CSV/TSV bytes into a grid.
///
/// Empty lines are skipped but keep their row number, so the header is
/// still the first non-empty row. Fields are trimmed; numeric fields become
/// [`CellValue::Number`].
pub(crate) fn parse_delimited(data: &[u8], delim: Delimiter) -> SheetGrid {
    let raw = String::from_utf8_lossy(data);
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw.as_ref());
    let sep = delim.separator();

    let mut sheet = SheetGrid::new(delim.sheet_name());

    for (row_idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = u32::try_from(row_idx).unwrap_or(u32::MAX);
        for (col_idx, field) in split_csv_line(line, sep).into_iter().enumerate() {
            let col = u32::try_from(col_idx).unwrap_or(u32::MAX);
            let value = field.trim();
            if value.is_empty() {
                continue;
            }

            let value = match value.parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::Text(value.to_string()),
            };

            sheet.cells.push(CellData {
                r: row,
                c: col,
                value,
            });
        }
    }

    sheet
}

/// Split a CSV line respecting quoted fields.
fn split_csv_line(line: &str, sep: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    // Escaped quote
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == sep {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;

    fn value_at(sheet: &SheetGrid, r: u32, c: u32) -> Option<&CellValue> {
        sheet
            .cells
            .iter()
            .find(|cell| cell.r == r && cell.c == c)
            .map(|cell| &cell.value)
    }

    #[test]
    fn test_parse_csv_basic() {
        let data = b"gene_id,gene_symbol,logFC\nENSG1,TP53,1.5\nENSG2,,-2";
        let sheet = parse_delimited(data, Delimiter::Comma);
        assert_eq!(sheet.name, "CSV");
        assert_eq!(
            value_at(&sheet, 1, 1),
            Some(&CellValue::Text("TP53".into()))
        );
        assert_eq!(value_at(&sheet, 1, 2), Some(&CellValue::Number(1.5)));
        // Empty symbol leaves no cell behind
        assert_eq!(value_at(&sheet, 2, 1), None);
    }

    #[test]
    fn test_parse_tsv() {
        let data = b"A\tB\n1\t2";
        let sheet = parse_delimited(data, Delimiter::Tab);
        assert_eq!(sheet.name, "TSV");
        assert_eq!(sheet.cells.len(), 4);
    }

    #[test]
    fn test_quoted_csv() {
        let data = b"\"Hello, World\",42\n\"She said \"\"hi\"\"\",0";
        let sheet = parse_delimited(data, Delimiter::Comma);
        assert_eq!(
            value_at(&sheet, 0, 0),
            Some(&CellValue::Text("Hello, World".into()))
        );
        assert_eq!(
            value_at(&sheet, 1, 0),
            Some(&CellValue::Text("She said \"hi\"".into()))
        );
    }

    #[test]
    fn test_bom_and_blank_lines() {
        let data = "\u{feff}\n\ngene_id\nG1\n".as_bytes();
        let sheet = parse_delimited(data, Delimiter::Comma);
        let (header, rows) = sheet.header_and_rows().unwrap();
        assert_eq!(header, vec!["gene_id"]);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_empty_csv() {
        let sheet = parse_delimited(b"", Delimiter::Comma);
        assert!(sheet.is_empty());
    }
}
