//! Spreadsheet reader
//!
//! Opens XLSX packages and delimited text files and exposes their sheets as
//! [`SheetGrid`]s. XLSX sheets are parsed lazily, one at a time, on request.

mod relationships;
mod worksheet;

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use zip::ZipArchive;

use crate::csv::{parse_delimited, Delimiter};
use crate::error::{HeatmapError, Result};
use crate::types::SheetGrid;

use relationships::{get_sheet_info, parse_shared_strings, parse_workbook_relationships};
use worksheet::{parse_sheet, SheetInfo};

/// Sheet read when the caller does not name one.
pub const DEFAULT_SHEET: &str = "sigDEG_FC1";

/// Which sheet of a source to load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SheetSelection {
    /// [`DEFAULT_SHEET`] when present, otherwise the first sheet.
    #[default]
    Default,
    Named(String),
    Index(usize),
}

impl SheetSelection {
    /// Resolve against a sheet list, returning the sheet's position.
    pub fn resolve(&self, sheet_names: &[String]) -> Result<usize> {
        match self {
            Self::Default => {
                if let Some(idx) = sheet_names.iter().position(|n| n == DEFAULT_SHEET) {
                    return Ok(idx);
                }
                if sheet_names.is_empty() {
                    return Err(HeatmapError::SheetNotFound(DEFAULT_SHEET.to_string()));
                }
                tracing::debug!(
                    fallback = %sheet_names.first().map(String::as_str).unwrap_or_default(),
                    "sheet {DEFAULT_SHEET} not present, using first sheet"
                );
                Ok(0)
            }
            Self::Named(name) => sheet_names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| HeatmapError::SheetNotFound(name.clone())),
            Self::Index(idx) => {
                if *idx < sheet_names.len() {
                    Ok(*idx)
                } else {
                    Err(HeatmapError::SheetNotFound(format!("index {idx}")))
                }
            }
        }
    }
}

impl From<Option<String>> for SheetSelection {
    fn from(name: Option<String>) -> Self {
        name.map_or(Self::Default, Self::Named)
    }
}

enum Backing {
    Xlsx {
        archive: ZipArchive<Cursor<Vec<u8>>>,
        sheets: Vec<SheetInfo>,
        shared_strings: Vec<String>,
    },
    Delimited(SheetGrid),
}

/// An opened spreadsheet document.
pub struct SpreadsheetSource {
    backing: Backing,
    sheet_names: Vec<String>,
}

impl fmt::Debug for SpreadsheetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.backing {
            Backing::Xlsx { .. } => "xlsx",
            Backing::Delimited(_) => "delimited",
        };
        f.debug_struct("SpreadsheetSource")
            .field("kind", &kind)
            .field("sheet_names", &self.sheet_names)
            .finish()
    }
}

impl SpreadsheetSource {
    /// Open an XLSX package from its bytes.
    ///
    /// Reads the workbook relationships, the sheet list and the shared-string
    /// table; worksheets themselves are parsed by [`Self::read_sheet`].
    pub fn from_xlsx(data: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;

        // Relationships first to get actual part paths
        let relationships = parse_workbook_relationships(&mut archive);
        let shared_strings =
            parse_shared_strings(&mut archive, relationships.shared_strings.as_deref());
        let sheets = get_sheet_info(&mut archive, &relationships.worksheets)?;

        tracing::debug!(
            sheets = sheets.len(),
            shared_strings = shared_strings.len(),
            "opened xlsx package"
        );

        let sheet_names = sheets.iter().map(|s| s.name.clone()).collect();
        Ok(Self {
            backing: Backing::Xlsx {
                archive,
                sheets,
                shared_strings,
            },
            sheet_names,
        })
    }

    /// Wrap CSV/TSV bytes as a one-sheet source.
    pub fn from_delimited(data: &[u8], delimiter: Delimiter) -> Self {
        let grid = parse_delimited(data, delimiter);
        Self {
            sheet_names: vec![grid.name.clone()],
            backing: Backing::Delimited(grid),
        }
    }

    /// Open a file, picking the format from its extension: `.csv` is
    /// comma-separated, `.tsv`/`.txt` tab-separated, anything else XLSX.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(Self::from_delimited(&data, Delimiter::Comma)),
            Some("tsv" | "txt") => Ok(Self::from_delimited(&data, Delimiter::Tab)),
            _ => Self::from_xlsx(data),
        }
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    /// Parse the sheet with the given name.
    pub fn read_sheet(&mut self, name: &str) -> Result<SheetGrid> {
        let idx = SheetSelection::Named(name.to_string()).resolve(&self.sheet_names)?;
        self.read_sheet_at(idx)
    }

    /// Parse the sheet at a workbook position.
    pub fn read_sheet_at(&mut self, index: usize) -> Result<SheetGrid> {
        match &mut self.backing {
            Backing::Xlsx {
                archive,
                sheets,
                shared_strings,
            } => {
                let info = sheets
                    .get(index)
                    .ok_or_else(|| HeatmapError::SheetNotFound(format!("index {index}")))?;
                parse_sheet(archive, info, shared_strings)
            }
            Backing::Delimited(grid) => {
                if index == 0 {
                    Ok(grid.clone())
                } else {
                    Err(HeatmapError::SheetNotFound(format!("index {index}")))
                }
            }
        }
    }

    /// Resolve a selection and parse that sheet.
    pub fn select(&mut self, selection: &SheetSelection) -> Result<SheetGrid> {
        let idx = selection.resolve(&self.sheet_names)?;
        self.read_sheet_at(idx)
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

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_default_selection_prefers_named_sheet() {
        let sheets = names(&["Summary", DEFAULT_SHEET]);
        assert_eq!(SheetSelection::Default.resolve(&sheets).unwrap(), 1);
    }

    #[test]
    fn test_default_selection_falls_back_to_first() {
        let sheets = names(&["Summary", "Raw"]);
        assert_eq!(SheetSelection::Default.resolve(&sheets).unwrap(), 0);
    }

    #[test]
    fn test_default_selection_on_empty_workbook() {
        let err = SheetSelection::Default.resolve(&[]).unwrap_err();
        assert!(matches!(err, HeatmapError::SheetNotFound(_)));
    }

    #[test]
    fn test_named_and_index_selection() {
        let sheets = names(&["A", "B"]);
        assert_eq!(
            SheetSelection::Named("B".into()).resolve(&sheets).unwrap(),
            1
        );
        let err = SheetSelection::Named("C".into())
            .resolve(&sheets)
            .unwrap_err();
        assert_eq!(err.to_string(), "Worksheet C not found");
        assert!(SheetSelection::Index(2).resolve(&sheets).is_err());
        assert_eq!(SheetSelection::Index(1).resolve(&sheets).unwrap(), 1);
    }

    #[test]
    fn test_delimited_source_has_one_sheet() {
        let mut source = SpreadsheetSource::from_delimited(b"a\tb\n1\t2", Delimiter::Tab);
        assert_eq!(source.sheet_names(), ["TSV".to_string()]);
        assert_eq!(source.read_sheet("TSV").unwrap().cells.len(), 4);
        assert!(source.read_sheet_at(1).is_err());
        // Default selection falls back to the only sheet
        assert!(source.select(&SheetSelection::Default).is_ok());
    }

    #[test]
    fn test_invalid_zip_is_an_error() {
        let err = SpreadsheetSource::from_xlsx(b"not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, HeatmapError::Zip(_)));
    }
}
