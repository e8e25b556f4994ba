//! Worksheet parsing - reads one sheet's `<sheetData>` into a [`SheetGrid`].

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::error::Result;
use crate::types::{CellData, CellValue, SheetGrid};
use crate::xml_helpers::text_string;

/// Sheet metadata from workbook.xml
#[derive(Debug, Clone)]
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

pub(super) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    if seen {
        Some(num)
    } else {
        None
    }
}

/// Turn the raw `<v>`/`<t>` text of a cell into a typed value.
pub(super) fn resolve_cell_value(
    raw_value: Option<String>,
    cell_type: CellTypeTag,
    shared_strings: &[String],
) -> Option<CellValue> {
    let raw = raw_value?;
    let value = match cell_type {
        CellTypeTag::Shared => {
            let idx = parse_u32_bytes(raw.trim().as_bytes())?;
            CellValue::Text(shared_strings.get(idx as usize)?.clone())
        }
        CellTypeTag::Str | CellTypeTag::Inline => CellValue::Text(raw),
        CellTypeTag::Bool => match raw.trim() {
            "1" | "true" => CellValue::Boolean(true),
            "0" | "false" => CellValue::Boolean(false),
            _ => CellValue::Text(raw),
        },
        CellTypeTag::Error => CellValue::Error(raw),
        CellTypeTag::Default => match raw.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::Text(raw),
        },
    };
    Some(value)
}

/// Parse a single worksheet
pub(super) fn parse_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    shared_strings: &[String],
) -> Result<SheetGrid> {
    let file = archive.by_name(&info.path)?;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut sheet = SheetGrid::new(info.name.clone());

    let mut buf = Vec::new();
    let mut cell_buf = Vec::new();
    let mut text_buf = Vec::new();
    // 1-based row from <row r>, next 0-based column for cells without `r`
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 0;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(_) | Event::Empty(_))) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start_event = matches!(event, Event::Start(_));

                match e.local_name().as_ref() {
                    b"row" => {
                        let explicit = e
                            .attributes()
                            .flatten()
                            .find(|attr| attr.key.as_ref() == b"r")
                            .and_then(|attr| parse_u32_bytes(&attr.value));
                        current_row = explicit.unwrap_or(current_row.saturating_add(1));
                        next_col = 0;
                    }

                    b"c" => {
                        let mut position: Option<(u32, u32)> = None;
                        let mut cell_type = CellTypeTag::Default;

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => position = parse_cell_ref_bytes(&attr.value),
                                b"t" => cell_type = parse_cell_type_tag(&attr.value),
                                _ => {}
                            }
                        }
                        let (col, row) = position
                            .unwrap_or((next_col, current_row.saturating_sub(1)));
                        next_col = col.saturating_add(1);

                        // Empty/self-closing cells like <c r="A1"/> have no child elements
                        let mut value: Option<String> = None;
                        if is_start_event {
                            loop {
                                cell_buf.clear();
                                match xml.read_event_into(&mut cell_buf) {
                                    Ok(Event::Start(ref inner)) => {
                                        let inner_name = inner.local_name();
                                        let inner_name = inner_name.as_ref();

                                        if inner_name == b"v" || inner_name == b"t" {
                                            text_buf.clear();
                                            if let Ok(Event::Text(text)) =
                                                xml.read_event_into(&mut text_buf)
                                            {
                                                value = text_string(&text);
                                            }
                                        } else if inner_name == b"is" {
                                            // Inline string container <is><t>text</t></is>,
                                            // possibly split into rich-text runs
                                            let mut inline = String::new();
                                            loop {
                                                text_buf.clear();
                                                match xml.read_event_into(&mut text_buf) {
                                                    Ok(Event::Text(ref text)) => {
                                                        if let Some(s) = text_string(text) {
                                                            inline.push_str(&s);
                                                        }
                                                    }
                                                    Ok(Event::End(ref is_inner)) => {
                                                        if is_inner.local_name().as_ref() == b"is" {
                                                            break;
                                                        }
                                                    }
                                                    Ok(Event::Eof) | Err(_) => break,
                                                    _ => {}
                                                }
                                            }
                                            value = Some(inline);
                                        }
                                    }
                                    Ok(Event::End(ref inner)) => {
                                        if inner.local_name().as_ref() == b"c" {
                                            break;
                                        }
                                    }
                                    Ok(Event::Eof) | Err(_) => break,
                                    _ => {}
                                }
                            }
                        }

                        if let Some(cell_value) =
                            resolve_cell_value(value, cell_type, shared_strings)
                        {
                            sheet.cells.push(CellData {
                                r: row,
                                c: col,
                                value: cell_value,
                            });
                        }
                    }

                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheet)
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
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn parse_xml(sheet_xml: &str, shared: &[String]) -> SheetGrid {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("xl/worksheets/sheet1.xml", FileOptions::default())
            .unwrap();
        zip.write_all(sheet_xml.as_bytes()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let info = SheetInfo {
            name: "S".into(),
            path: "xl/worksheets/sheet1.xml".into(),
        };
        parse_sheet(&mut archive, &info, shared).unwrap()
    }

    #[test]
    fn test_cell_kinds() {
        let shared = vec!["gene_id".to_string()];
        let grid = parse_xml(
            r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1"><v>-1.25</v></c><c r="C1" t="b"><v>1</v></c><c r="D1" t="e"><v>#N/A</v></c><c r="E1" t="inlineStr"><is><r><t>log</t></r><r><t>FC</t></r></is></c><c r="F1" t="str"><f>A1</f><v>x &amp; y</v></c><c r="G1" s="3"/></row></sheetData></worksheet>"#,
            &shared,
        );
        let values: Vec<_> = grid.cells.iter().map(|c| c.value.clone()).collect();
        assert_eq!(
            values,
            vec![
                CellValue::Text("gene_id".into()),
                CellValue::Number(-1.25),
                CellValue::Boolean(true),
                CellValue::Error("#N/A".into()),
                CellValue::Text("logFC".into()),
                CellValue::Text("x & y".into()),
            ]
        );
        assert_eq!(grid.cells[4].c, 4);
    }

    #[test]
    fn test_cells_without_reference_follow_row_position() {
        let grid = parse_xml(
            r#"<worksheet><sheetData><row r="3"><c><v>1</v></c><c><v>2</v></c></row><row><c><v>3</v></c></row></sheetData></worksheet>"#,
            &[],
        );
        let positions: Vec<_> = grid.cells.iter().map(|c| (c.r, c.c)).collect();
        assert_eq!(positions, vec![(2, 0), (2, 1), (3, 0)]);
    }

    #[test]
    fn test_out_of_range_shared_string_is_dropped() {
        let grid = parse_xml(
            r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>9</v></c></row></sheetData></worksheet>"#,
            &[],
        );
        assert!(grid.is_empty());
    }
}
