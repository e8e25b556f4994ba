//! The load, reconcile, scale, assemble and render pipeline.
//!
//! [`run_pipeline`] is one synchronous request. [`HeatmapSession`] wraps it
//! and keeps the most recent successful render.

use std::path::PathBuf;

use crate::assemble::assemble;
use crate::config::HeatmapConfig;
use crate::csv::Delimiter;
use crate::error::Result;
use crate::loader::load_table;
use crate::parser::{SheetSelection, SpreadsheetSource};
use crate::range::color_scale;
use crate::reconcile::reconcile;
use crate::render::{HeatmapRenderer, PngRenderer, RenderedHeatmap};
use crate::types::{ColorScale, HeatmapMatrix, ReconciledTable};

/// Where one input table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A file on disk; the format follows the extension.
    Path(PathBuf),
    /// XLSX bytes.
    Xlsx(Vec<u8>),
    /// CSV/TSV bytes.
    Delimited { data: Vec<u8>, delimiter: Delimiter },
}

impl InputSource {
    pub fn open(&self) -> Result<SpreadsheetSource> {
        match self {
            Self::Path(path) => SpreadsheetSource::open(path),
            Self::Xlsx(data) => SpreadsheetSource::from_xlsx(data.clone()),
            Self::Delimited { data, delimiter } => {
                Ok(SpreadsheetSource::from_delimited(data, *delimiter))
            }
        }
    }
}

impl From<PathBuf> for InputSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// One "generate" action: one or two inputs plus the configuration.
#[derive(Debug, Clone)]
pub struct HeatmapRequest {
    pub first: InputSource,
    pub second: Option<InputSource>,
    pub config: HeatmapConfig,
}

impl HeatmapRequest {
    pub fn new(first: InputSource) -> Self {
        Self {
            first,
            second: None,
            config: HeatmapConfig::default(),
        }
    }

    #[must_use]
    pub fn with_second(mut self, second: InputSource) -> Self {
        self.second = Some(second);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: HeatmapConfig) -> Self {
        self.config = config;
        self
    }
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: ReconciledTable,
    pub scale: ColorScale,
    pub matrix: HeatmapMatrix,
    pub image: RenderedHeatmap,
}

/// Load the inputs and reconcile them.
///
/// The first table is loaded and validated before the second is opened.
pub fn reconcile_request(request: &HeatmapRequest) -> Result<ReconciledTable> {
    let config = &request.config;

    let mut first_source = request.first.open()?;
    let first = load_table(
        &mut first_source,
        &SheetSelection::from(config.first_sheet.clone()),
        &config.roles.first,
    )?;

    let second = match &request.second {
        Some(input) => {
            let mut source = input.open()?;
            Some(load_table(
                &mut source,
                &SheetSelection::from(config.second_sheet.clone()),
                &config.roles.second,
            )?)
        }
        None => None,
    };

    reconcile(&first, second.as_ref())
}

/// Reconcile, derive the scale and assemble the matrix, without rendering.
pub fn prepare(request: &HeatmapRequest) -> Result<(ReconciledTable, ColorScale, HeatmapMatrix)> {
    let table = reconcile_request(request)?;
    let scale = color_scale(
        &table,
        request.config.range_override(),
        request.config.ramp(),
    );
    let matrix = assemble(&table, &request.config.assembly_options());
    Ok((table, scale, matrix))
}

/// Run the whole pipeline for one request.
pub fn run_pipeline<R>(request: &HeatmapRequest, renderer: &R) -> Result<PipelineOutput>
where
    R: HeatmapRenderer + ?Sized,
{
    let _span = tracing::info_span!("pipeline", dual = request.second.is_some()).entered();

    let (table, scale, matrix) = prepare(request)?;
    let image = renderer.render(&matrix, &scale, &request.config.style())?;

    Ok(PipelineOutput {
        table,
        scale,
        matrix,
        image,
    })
}

/// Request handler that owns the most recent successful render.
#[derive(Debug)]
pub struct HeatmapSession<R = PngRenderer> {
    renderer: R,
    last_render: Option<RenderedHeatmap>,
}

impl Default for HeatmapSession<PngRenderer> {
    fn default() -> Self {
        Self::new(PngRenderer::new())
    }
}

impl<R: HeatmapRenderer> HeatmapSession<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            last_render: None,
        }
    }

    /// Run the pipeline. A success replaces the held render; a failure
    /// leaves it untouched.
    pub fn generate(&mut self, request: &HeatmapRequest) -> Result<&RenderedHeatmap> {
        match run_pipeline(request, &self.renderer) {
            Ok(output) => Ok(self.last_render.insert(output.image)),
            Err(err) => {
                tracing::error!(kind = ?err.kind(), error = %err, "heatmap generation failed");
                Err(err)
            }
        }
    }

    /// The most recent successful render, if any.
    pub fn last_render(&self) -> Option<&RenderedHeatmap> {
        self.last_render.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
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
    use crate::error::ErrorKind;
    use crate::render::RenderStyle;
    use std::cell::Cell;

    /// Records what it was asked to draw and returns a fixed image.
    #[derive(Default)]
    struct StubRenderer {
        calls: Cell<usize>,
    }

    impl HeatmapRenderer for StubRenderer {
        fn render(
            &self,
            matrix: &HeatmapMatrix,
            scale: &ColorScale,
            _style: &RenderStyle,
        ) -> Result<RenderedHeatmap> {
            self.calls.set(self.calls.get() + 1);
            crate::render::Ramp::resolve(&scale.ramp)?;
            Ok(RenderedHeatmap {
                png: vec![u8::try_from(matrix.row_count()).unwrap()],
                width_px: 1,
                height_px: 1,
                file_name: "heatmap_all.png".into(),
                mime_type: "image/png".into(),
            })
        }
    }

    fn csv(text: &str) -> InputSource {
        InputSource::Delimited {
            data: text.as_bytes().to_vec(),
            delimiter: Delimiter::Comma,
        }
    }

    #[test]
    fn test_dual_pipeline() {
        let request = HeatmapRequest::new(csv("gene_id,gene_symbol,logFC\nG1,A,-3\nG2,,5\nG3,C,0\n"))
            .with_second(csv("gene_id,gene_symbol,logFC\nG2,,1\nG4,D,9\n"));
        let output = run_pipeline(&request, &StubRenderer::default()).unwrap();
        assert_eq!((output.scale.vmin, output.scale.vmax), (-5.0, 5.0));
        assert_eq!(output.matrix.labels(), vec!["logFC_first", "logFC_second"]);
        assert_eq!(output.matrix.row_index, vec!["G2", "G3 - C", "G1 - A"]);
        assert_eq!(output.matrix.columns[1].values, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_session_keeps_last_render_on_failure() {
        let mut session = HeatmapSession::new(StubRenderer::default());
        let good = HeatmapRequest::new(csv("gene_id,gene_symbol,logFC\nG1,A,1\nG2,B,2\n"));
        assert_eq!(session.generate(&good).unwrap().png, vec![2]);

        let missing = HeatmapRequest::new(csv("gene_id,logFC\nG1,1\n"));
        let err = session.generate(&missing).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::MissingColumn));
        assert_eq!(session.last_render().unwrap().png, vec![2]);

        let mut bad_ramp = good.clone();
        bad_ramp.config.colormap = "not-a-ramp".into();
        let err = session.generate(&bad_ramp).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::RenderFailure));
        assert_eq!(session.last_render().unwrap().png, vec![2]);
        assert_eq!(session.renderer().calls.get(), 2);
    }

    #[test]
    fn test_second_table_missing_column_names_second_role() {
        let mut request = HeatmapRequest::new(csv("gene_id,gene_symbol,logFC\nG1,A,1\n"))
            .with_second(csv("gene_id,gene_symbol\nG1,A\n"));
        request.config.roles.second = "root".into();
        let err = run_pipeline(&request, &StubRenderer::default()).unwrap_err();
        assert!(err.to_string().contains("Root file"));
    }
}
