//! fcheat - fold-change heatmaps from differential-expression spreadsheets
//!
//! Loads one or two gene tables (XLSX, CSV or TSV), reconciles them on
//! `(gene_id, gene_symbol)`, derives a zero-centered color scale and renders
//! a gene-by-condition heatmap as a 300 DPI PNG:
//! - Sheet selection with a fallback to the first sheet
//! - Left join of the second table onto the first, imputing 0
//! - Configurable colormap, range, column order, labels and row sort
//!
//! # Usage
//!
//! ```rust,ignore
//! use fcheat::{HeatmapRequest, HeatmapSession, InputSource};
//!
//! let request = HeatmapRequest::new(InputSource::Path("leaf.xlsx".into()))
//!     .with_second(InputSource::Path("root.xlsx".into()));
//! let mut session = HeatmapSession::default();
//! let image = session.generate(&request)?;
//! std::fs::write(&image.file_name, &image.png)?;
//! ```

pub mod assemble;
pub mod cell_ref;
pub mod config;
pub mod csv;
pub mod error;
pub mod loader;
pub mod parser;
pub mod pipeline;
pub mod range;
pub mod reconcile;
pub mod render;
pub mod types;
pub mod xml_helpers;

pub use config::HeatmapConfig;
pub use csv::Delimiter;
pub use error::{ErrorKind, HeatmapError, Result};
pub use parser::{SheetSelection, SpreadsheetSource};
pub use pipeline::{run_pipeline, HeatmapRequest, HeatmapSession, InputSource, PipelineOutput};
pub use render::{HeatmapRenderer, PngRenderer, RenderStyle, RenderedHeatmap};

pub use types::*;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
