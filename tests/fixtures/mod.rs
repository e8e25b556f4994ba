//! Test fixtures for generating differential-expression workbooks in memory.
//!
//! # Example
//!
//! ```rust,ignore
//! use fixtures::{SheetBuilder, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .sheet(
//!         SheetBuilder::new("sigDEG_FC1")
//!             .header(&["gene_id", "gene_symbol", "logFC"])
//!             .gene("G1", Some("ABC1"), 2.5),
//!     )
//!     .build();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

// ============================================================================
// Cell Value
// ============================================================================

/// A cell value that can be added to a sheet.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// A shared string.
    String(String),
    Number(f64),
    /// An error value (e.g., "#N/A").
    Error(String),
    /// A string stored inline instead of in the shared-string table.
    InlineString(String),
    Empty,
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

/// A cell in the sheet.
#[derive(Debug, Clone)]
pub struct CellEntry {
    pub col: u32,
    pub row: u32,
    pub value: CellValue,
}

/// Builder for a single worksheet. Rows are appended top to bottom.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    next_row: u32,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: Vec::new(),
            next_row: 1,
        }
    }

    /// Append a row of values starting at column A.
    #[must_use]
    pub fn row(mut self, values: Vec<CellValue>) -> Self {
        let row = self.next_row;
        for (i, value) in values.into_iter().enumerate() {
            self.cells.push(CellEntry {
                col: i as u32 + 1,
                row,
                value,
            });
        }
        self.next_row += 1;
        self
    }

    /// Append a header row of shared strings.
    #[must_use]
    pub fn header(self, names: &[&str]) -> Self {
        self.row(names.iter().map(|n| CellValue::from(*n)).collect())
    }

    /// Append a `gene_id, gene_symbol, logFC` row.
    #[must_use]
    pub fn gene(self, id: &str, symbol: Option<&str>, fold_change: f64) -> Self {
        let symbol = symbol.map_or(CellValue::Empty, CellValue::from);
        self.row(vec![id.into(), symbol, fold_change.into()])
    }

    /// Skip a row, leaving it absent from the sheet data.
    #[must_use]
    pub fn blank_row(mut self) -> Self {
        self.next_row += 1;
        self
    }
}

/// A three-column gene sheet built from `(id, symbol, logFC)` triples.
pub fn gene_sheet(name: &str, genes: &[(&str, Option<&str>, f64)]) -> SheetBuilder {
    genes.iter().fold(
        SheetBuilder::new(name).header(&["gene_id", "gene_symbol", "logFC"]),
        |sheet, (id, symbol, fc)| sheet.gene(id, *symbol, *fc),
    )
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for creating complete XLSX files.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut shared_strings: Vec<String> = Vec::new();
        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let CellValue::String(ref s) = cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(generate_content_types(self.sheets.len()).as_bytes())
            .unwrap();

        zip.start_file("_rels/.rels", options).unwrap();
        zip.write_all(generate_rels().as_bytes()).unwrap();

        zip.start_file("xl/_rels/workbook.xml.rels", options)
            .unwrap();
        zip.write_all(generate_workbook_rels(self.sheets.len()).as_bytes())
            .unwrap();

        zip.start_file("xl/workbook.xml", options).unwrap();
        zip.write_all(generate_workbook(&self.sheets).as_bytes())
            .unwrap();

        if !shared_strings.is_empty() {
            zip.start_file("xl/sharedStrings.xml", options).unwrap();
            zip.write_all(generate_shared_strings(&shared_strings).as_bytes())
                .unwrap();
        }

        for (i, sheet) in self.sheets.iter().enumerate() {
            let path = format!("xl/worksheets/sheet{}.xml", i + 1);
            zip.start_file(&path, options).unwrap();
            zip.write_all(generate_sheet_xml(sheet, &shared_strings).as_bytes())
                .unwrap();
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}

// ============================================================================
// XML Generation
// ============================================================================

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn generate_content_types(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn generate_rels() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    xml.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#);
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        sheet_count + 1
    ));
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets>");
    xml.push_str("</workbook>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
        strings.len(),
        strings.len()
    ));
    for s in strings {
        xml.push_str(&format!(
            r#"<si><t xml:space="preserve">{}</t></si>"#,
            escape_xml(s)
        ));
    }
    xml.push_str("</sst>");
    xml
}

fn col_num_to_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

fn generate_sheet_xml(sheet: &SheetBuilder, shared_strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );
    xml.push_str("<sheetData>");

    let mut rows: std::collections::BTreeMap<u32, Vec<&CellEntry>> =
        std::collections::BTreeMap::new();
    for cell in &sheet.cells {
        rows.entry(cell.row).or_default().push(cell);
    }

    for (row_num, cells) in rows {
        xml.push_str(&format!(r#"<row r="{row_num}">"#));
        for cell in cells {
            let cell_ref = format!("{}{}", col_num_to_letter(cell.col), cell.row);
            match &cell.value {
                CellValue::String(s) => {
                    let idx = shared_strings.iter().position(|x| x == s).unwrap_or(0);
                    xml.push_str(&format!(r#"<c r="{cell_ref}" t="s"><v>{idx}</v></c>"#));
                }
                CellValue::Number(n) => {
                    xml.push_str(&format!(r#"<c r="{cell_ref}"><v>{n}</v></c>"#));
                }
                CellValue::Error(e) => {
                    xml.push_str(&format!(
                        r#"<c r="{cell_ref}" t="e"><v>{}</v></c>"#,
                        escape_xml(e)
                    ));
                }
                CellValue::InlineString(s) => {
                    xml.push_str(&format!(
                        r#"<c r="{cell_ref}" t="inlineStr"><is><t>{}</t></is></c>"#,
                        escape_xml(s)
                    ));
                }
                CellValue::Empty => {
                    xml.push_str(&format!(r#"<c r="{cell_ref}"/>"#));
                }
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData>");
    xml.push_str("</worksheet>");
    xml
}

// ============================================================================
// Convenience Functions
// ============================================================================

/// A one-sheet workbook named `sigDEG_FC1`.
#[must_use]
pub fn gene_xlsx(genes: &[(&str, Option<&str>, f64)]) -> Vec<u8> {
    XlsxBuilder::new()
        .sheet(gene_sheet("sigDEG_FC1", genes))
        .build()
}

/// CSV text for `(id, symbol, logFC)` triples.
#[must_use]
pub fn gene_csv(genes: &[(&str, Option<&str>, f64)]) -> Vec<u8> {
    let mut text = String::from("gene_id,gene_symbol,logFC\n");
    for (id, symbol, fc) in genes {
        text.push_str(&format!("{id},{},{fc}\n", symbol.unwrap_or("")));
    }
    text.into_bytes()
}
