//! Heatmap rendering.
//!
//! This module provides:
//! - The [`HeatmapRenderer`] boundary the pipeline renders through
//! - [`PngRenderer`], which lays the figure out as SVG and rasterizes it
//! - Color token parsing and continuous color ramps

pub mod colors;
pub mod layout;
pub mod ramp;
pub mod raster;

use std::sync::Arc;

use base64::Engine;
use resvg::usvg::fontdb;

use crate::error::Result;
use crate::types::{ColorScale, HeatmapMatrix};

pub use colors::{parse_color, Rgb};
pub use ramp::Ramp;

/// Label of the colorbar.
pub const COLORBAR_LABEL: &str = "Log\u{2082} Fold Change";
/// Name the rendered image is offered under.
pub const OUTPUT_FILE_NAME: &str = "heatmap_all.png";
pub const OUTPUT_MIME_TYPE: &str = "image/png";
/// Raster resolution of the output.
pub const OUTPUT_DPI: u32 = 300;

/// Text and font sizes of the figure.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub title_size: f64,
    /// Column tick labels and the x axis label.
    pub xtick_size: f64,
    /// Row tick labels and the y axis label.
    pub ytick_size: f64,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            title: "Heatmap (All Data)".to_string(),
            x_label: "Tissues / Conditions".to_string(),
            y_label: String::new(),
            title_size: 14.0,
            xtick_size: 10.0,
            ytick_size: 6.0,
        }
    }
}

/// An encoded heatmap image, ready for display or download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedHeatmap {
    pub png: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
    pub file_name: String,
    pub mime_type: String,
}

impl RenderedHeatmap {
    /// `data:` URI embedding the image, for inline display.
    pub fn to_data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.png);
        format!("data:{};base64,{encoded}", self.mime_type)
    }
}

/// Turns an assembled matrix into an image.
pub trait HeatmapRenderer {
    /// Render `matrix` colored by `scale`. Ramp and encoding problems are
    /// reported as [`crate::HeatmapError::RenderFailure`].
    fn render(
        &self,
        matrix: &HeatmapMatrix,
        scale: &ColorScale,
        style: &RenderStyle,
    ) -> Result<RenderedHeatmap>;
}

/// Renders through an SVG layout rasterized at [`OUTPUT_DPI`], trimmed to
/// its content and encoded as PNG.
#[derive(Debug, Clone)]
pub struct PngRenderer {
    fonts: Arc<fontdb::Database>,
    dpi: u32,
}

impl Default for PngRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PngRenderer {
    /// Renderer using the system fonts.
    pub fn new() -> Self {
        Self::with_fonts(raster::system_fonts())
    }

    /// Renderer using a caller-supplied font database.
    pub fn with_fonts(fonts: Arc<fontdb::Database>) -> Self {
        Self {
            fonts,
            dpi: OUTPUT_DPI,
        }
    }

    /// Override the output resolution.
    #[must_use]
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.max(1);
        self
    }

    /// The figure as an SVG document, in points.
    pub fn render_svg(
        &self,
        matrix: &HeatmapMatrix,
        scale: &ColorScale,
        style: &RenderStyle,
    ) -> Result<String> {
        let ramp = Ramp::resolve(&scale.ramp)?;
        let figure = layout::build_figure(matrix, scale, &ramp, style);
        Ok(figure.document.to_string())
    }
}

impl HeatmapRenderer for PngRenderer {
    fn render(
        &self,
        matrix: &HeatmapMatrix,
        scale: &ColorScale,
        style: &RenderStyle,
    ) -> Result<RenderedHeatmap> {
        let svg = self.render_svg(matrix, scale, style)?;
        let image = raster::rasterize(&svg, Arc::clone(&self.fonts), self.dpi)?;
        let image = raster::trim(&image, raster::trim_pad_px(self.dpi));
        let png = raster::encode_png(&image, self.dpi)?;
        tracing::info!(
            width_px = image.width,
            height_px = image.height,
            bytes = png.len(),
            "rendered heatmap"
        );
        Ok(RenderedHeatmap {
            png,
            width_px: image.width,
            height_px: image.height,
            file_name: OUTPUT_FILE_NAME.to_string(),
            mime_type: OUTPUT_MIME_TYPE.to_string(),
        })
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
    use crate::types::{CanvasSize, ColorRamp, MatrixColumn};

    fn matrix() -> HeatmapMatrix {
        HeatmapMatrix {
            row_index: vec!["G1 - A".into(), "G2".into()],
            columns: vec![
                MatrixColumn {
                    label: "logFC_first".into(),
                    values: vec![2.0, -1.0],
                },
                MatrixColumn {
                    label: "logFC_second".into(),
                    values: vec![0.0, 1.5],
                },
            ],
            canvas: CanvasSize {
                width_in: 6.0,
                height_in: 6.0,
            },
        }
    }

    fn renderer() -> PngRenderer {
        PngRenderer::with_fonts(Arc::new(fontdb::Database::new())).with_dpi(50)
    }

    #[test]
    fn test_render_produces_png() {
        let scale = ColorScale::new(-2.0, 2.0, ColorRamp::named("RdBu_r"));
        let image = renderer()
            .render(&matrix(), &scale, &RenderStyle::default())
            .unwrap();
        assert_eq!(&image.png[1..4], b"PNG");
        assert_eq!(image.file_name, "heatmap_all.png");
        assert_eq!(image.mime_type, "image/png");
        assert!(image.width_px > 0 && image.width_px <= 300);
        assert!(image.to_data_uri().starts_with("data:image/png;base64,iVBOR"));
    }

    #[test]
    fn test_bad_ramp_surfaces_as_render_failure() {
        let scale = ColorScale::new(-2.0, 2.0, ColorRamp::named("nope"));
        let err = renderer()
            .render(&matrix(), &scale, &RenderStyle::default())
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::RenderFailure));
    }

    #[test]
    fn test_svg_output_is_available() {
        let scale = ColorScale::new(-2.0, 2.0, ColorRamp::default());
        let svg = renderer()
            .render_svg(&matrix(), &scale, &RenderStyle::default())
            .unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("logFC_second"));
    }
}
