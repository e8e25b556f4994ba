//! Figure layout - builds the heatmap as an SVG document.
//!
//! Coordinates are in points (1/72 inch). The document grows to the left and
//! right to fit tick labels, so the rasterizer can trim to content the way a
//! tight bounding box would.

use svg::node::element::{Group, Rectangle, Text};
use svg::Document;

use crate::types::{ColorScale, HeatmapMatrix};

use super::ramp::Ramp;
use super::{RenderStyle, COLORBAR_LABEL};

/// Points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

const FONT_FAMILY: &str = "DejaVu Sans, Arial, sans-serif";
const TEXT_COLOR: &str = "#262626";
/// Average glyph advance as a fraction of the font size.
const CHAR_WIDTH_EM: f64 = 0.6;
const TICK_PAD: f64 = 3.5;
const COLORBAR_TICK_SIZE: f64 = 8.0;
const COLORBAR_LABEL_SIZE: f64 = 10.0;
const COLORBAR_STRIPS: usize = 128;

/// Axes box fractions of the figure, matching a default plotting figure.
const AXES_LEFT: f64 = 0.125;
const AXES_RIGHT: f64 = 0.9;
const AXES_BOTTOM: f64 = 0.11;
const AXES_TOP: f64 = 0.88;
/// Share of the axes width given to the colorbar and its gap.
const COLORBAR_SHARE: f64 = 0.2;

/// A laid-out figure.
#[derive(Debug)]
pub struct Figure {
    pub document: Document,
    /// Document size in points.
    pub width: f64,
    pub height: f64,
}

/// Estimated rendered width of `text` at `size` points.
pub fn text_width(text: &str, size: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let chars = text.chars().count() as f64;
    chars * CHAR_WIDTH_EM * size
}

/// Evenly stepped "nice" ticks covering `[lo, hi]`, at most about `max_ticks`.
pub fn nice_ticks(lo: f64, hi: f64, max_ticks: usize) -> Vec<f64> {
    if !lo.is_finite() || !hi.is_finite() {
        return Vec::new();
    }
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let span = hi - lo;
    if span <= f64::EPSILON {
        return vec![lo];
    }
    #[allow(clippy::cast_precision_loss)]
    let raw_step = span / max_ticks.max(1) as f64;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw_step)
        .unwrap_or(10.0 * magnitude);

    let tolerance = step * 1e-9;
    let mut ticks = Vec::new();
    let mut k = (lo / step).ceil();
    loop {
        let tick = k * step;
        if tick > hi + tolerance {
            break;
        }
        // Snap values like -0.0 and 1e-17 to zero
        ticks.push(if tick.abs() < tolerance { 0.0 } else { tick });
        k += 1.0;
    }
    ticks
}

/// Tick label with a typographic minus and no trailing zeros.
pub fn format_tick(value: f64) -> String {
    let mut s = format!("{value:.3}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s.replacen('-', "\u{2212}", 1)
}

fn label(content: &str, x: f64, y: f64, size: f64) -> Text {
    Text::new(content)
        .set("x", x)
        .set("y", y)
        .set("font-family", FONT_FAMILY)
        .set("font-size", size)
        .set("fill", TEXT_COLOR)
}

/// Lay out the heatmap figure.
pub fn build_figure(
    matrix: &HeatmapMatrix,
    scale: &ColorScale,
    ramp: &Ramp,
    style: &RenderStyle,
) -> Figure {
    let fig_w = matrix.canvas.width_in * POINTS_PER_INCH;
    let fig_h = matrix.canvas.height_in * POINTS_PER_INCH;

    let axes_w = fig_w * (AXES_RIGHT - AXES_LEFT);
    let plot_w = axes_w * (1.0 - COLORBAR_SHARE);
    let plot_h = fig_h * (AXES_TOP - AXES_BOTTOM);

    // Left extent needed by y tick labels and the y axis label
    let longest_row_label = matrix
        .row_index
        .iter()
        .map(|l| text_width(l, style.ytick_size))
        .fold(0.0, f64::max);
    let y_label_band = if style.y_label.trim().is_empty() {
        0.0
    } else {
        style.ytick_size * 1.6
    };
    let left_needed = longest_row_label + TICK_PAD * 2.0 + y_label_band;
    let plot_x = (fig_w * AXES_LEFT).max(left_needed + TICK_PAD);
    let plot_y = fig_h * (1.0 - AXES_TOP);

    let title_band = if style.title.trim().is_empty() {
        0.0
    } else {
        style.title_size * 1.6
    };
    let plot_y = plot_y.max(title_band + TICK_PAD);

    let rows = matrix.row_count().max(1);
    let cols = matrix.column_count().max(1);
    #[allow(clippy::cast_precision_loss)]
    let cell_h = plot_h / rows as f64;
    #[allow(clippy::cast_precision_loss)]
    let cell_w = plot_w / cols as f64;

    let mut cells = Group::new().set("shape-rendering", "crispEdges");
    for (c, column) in matrix.columns.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let x = plot_x + c as f64 * cell_w;
        for (r, &value) in column.values.iter().enumerate() {
            // Absent values stay blank
            let Some(t) = scale.position(value) else {
                continue;
            };
            #[allow(clippy::cast_precision_loss)]
            let y = plot_y + r as f64 * cell_h;
            cells = cells.add(
                Rectangle::new()
                    .set("x", x)
                    .set("y", y)
                    .set("width", cell_w)
                    .set("height", cell_h)
                    .set("fill", ramp.color_at(t).to_hex()),
            );
        }
    }

    let mut doc = Document::new().add(cells);

    // One y tick label per row; dense rows overlap
    for (r, name) in matrix.row_index.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let center = plot_y + (r as f64 + 0.5) * cell_h;
        doc = doc.add(
            label(name, plot_x - TICK_PAD, center + style.ytick_size * 0.35, style.ytick_size)
                .set("text-anchor", "end"),
        );
    }

    // X tick labels and axis label
    let x_tick_y = plot_y + plot_h + TICK_PAD + style.xtick_size;
    for (c, column) in matrix.columns.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let center = plot_x + (c as f64 + 0.5) * cell_w;
        doc = doc.add(
            label(&column.label, center, x_tick_y, style.xtick_size).set("text-anchor", "middle"),
        );
    }
    let mut bottom = x_tick_y + TICK_PAD;
    if !style.x_label.trim().is_empty() {
        let y = x_tick_y + style.xtick_size * 1.6;
        doc = doc.add(
            label(&style.x_label, plot_x + plot_w / 2.0, y, style.xtick_size)
                .set("text-anchor", "middle"),
        );
        bottom = y + TICK_PAD;
    }

    if y_label_band > 0.0 {
        let x = plot_x - TICK_PAD * 2.0 - longest_row_label - style.ytick_size * 0.4;
        let y = plot_y + plot_h / 2.0;
        doc = doc.add(
            label(&style.y_label, x, y, style.ytick_size)
                .set("text-anchor", "middle")
                .set("transform", format!("rotate(-90 {x} {y})")),
        );
    }

    if title_band > 0.0 {
        doc = doc.add(
            label(
                &style.title,
                plot_x + plot_w / 2.0,
                plot_y - style.title_size * 0.6,
                style.title_size,
            )
            .set("text-anchor", "middle"),
        );
    }

    // Colorbar: strips from vmax at the top to vmin at the bottom
    let bar_x = plot_x + plot_w + axes_w * COLORBAR_SHARE * 0.25;
    let bar_w = (plot_h / 20.0).clamp(8.0, 16.0);
    let (lo, hi) = if scale.vmin <= scale.vmax {
        (scale.vmin, scale.vmax)
    } else {
        (scale.vmax, scale.vmin)
    };
    #[allow(clippy::cast_precision_loss)]
    let strip_h = plot_h / COLORBAR_STRIPS as f64;
    let mut bar = Group::new().set("shape-rendering", "crispEdges");
    for i in 0..COLORBAR_STRIPS {
        #[allow(clippy::cast_precision_loss)]
        let frac = (i as f64 + 0.5) / COLORBAR_STRIPS as f64;
        let value = hi - frac * (hi - lo);
        let t = scale.position(value).unwrap_or(0.5);
        #[allow(clippy::cast_precision_loss)]
        let y = plot_y + i as f64 * strip_h;
        bar = bar.add(
            Rectangle::new()
                .set("x", bar_x)
                .set("y", y)
                .set("width", bar_w)
                .set("height", strip_h + 0.5)
                .set("fill", ramp.color_at(t).to_hex()),
        );
    }
    doc = doc.add(bar);

    let mut widest_tick: f64 = 0.0;
    for tick in nice_ticks(lo, hi, 6) {
        let y = if hi > lo {
            plot_y + (hi - tick) / (hi - lo) * plot_h
        } else {
            plot_y + plot_h / 2.0
        };
        let text = format_tick(tick);
        widest_tick = widest_tick.max(text_width(&text, COLORBAR_TICK_SIZE));
        doc = doc
            .add(
                Rectangle::new()
                    .set("x", bar_x + bar_w)
                    .set("y", y - 0.4)
                    .set("width", 3.0)
                    .set("height", 0.8)
                    .set("fill", TEXT_COLOR),
            )
            .add(label(
                &text,
                bar_x + bar_w + 3.0 + TICK_PAD,
                y + COLORBAR_TICK_SIZE * 0.35,
                COLORBAR_TICK_SIZE,
            ));
    }
    let cbar_label_x = bar_x + bar_w + 3.0 + TICK_PAD * 2.0 + widest_tick + COLORBAR_LABEL_SIZE;
    let cbar_label_y = plot_y + plot_h / 2.0;
    doc = doc.add(
        label(COLORBAR_LABEL, cbar_label_x, cbar_label_y, COLORBAR_LABEL_SIZE)
            .set("text-anchor", "middle")
            .set(
                "transform",
                format!("rotate(-90 {cbar_label_x} {cbar_label_y})"),
            ),
    );

    let width = fig_w.max(cbar_label_x + COLORBAR_LABEL_SIZE);
    let height = fig_h.max(bottom + style.xtick_size);
    let document = doc
        .set("viewBox", (0.0, 0.0, width, height))
        .set("width", width)
        .set("height", height);

    Figure {
        document,
        width,
        height,
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
    use crate::types::{CanvasSize, ColorRamp, MatrixColumn};

    fn matrix(values: Vec<f64>) -> HeatmapMatrix {
        HeatmapMatrix {
            row_index: (0..values.len()).map(|i| format!("G{i}")).collect(),
            columns: vec![MatrixColumn {
                label: "logFC_first".into(),
                values,
            }],
            canvas: CanvasSize {
                width_in: 6.0,
                height_in: 6.0,
            },
        }
    }

    #[test]
    fn test_nice_ticks() {
        assert_eq!(nice_ticks(-5.0, 5.0, 6), vec![-4.0, -2.0, 0.0, 2.0, 4.0]);
        let unit = nice_ticks(0.0, 1.0, 5);
        assert_eq!(unit.len(), 6);
        assert!((unit[3] - 0.6).abs() < 1e-12);
        assert_eq!(nice_ticks(2.0, 2.0, 6), vec![2.0]);
        assert!(nice_ticks(f64::NAN, 1.0, 6).is_empty());
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(-2.0), "\u{2212}2");
        assert_eq!(format_tick(2.5), "2.5");
        assert_eq!(format_tick(-0.0), "0");
    }

    #[test]
    fn test_figure_has_cell_per_value_and_colorbar_label() {
        let m = matrix(vec![-1.0, 0.0, f64::NAN, 1.0]);
        let scale = ColorScale::new(-1.0, 1.0, ColorRamp::default());
        let ramp = Ramp::resolve(&scale.ramp).unwrap();
        let figure = build_figure(&m, &scale, &ramp, &RenderStyle::default());
        let svg = figure.document.to_string();
        assert!(svg.contains(COLORBAR_LABEL));
        assert!(svg.contains("Heatmap (All Data)"));
        assert!(svg.contains("#0000FF"));
        assert!(svg.contains("#FFFF00"));
        assert!(figure.width >= 432.0);
        assert!(figure.height >= 432.0);
    }

    #[test]
    fn test_every_row_gets_a_label() {
        let mut m = matrix((0..300).map(f64::from).collect());
        m.row_index = (0..300).map(|i| format!("GENE{i:04}")).collect();
        let scale = ColorScale::new(-300.0, 300.0, ColorRamp::default());
        let ramp = Ramp::resolve(&scale.ramp).unwrap();
        let svg = build_figure(&m, &scale, &ramp, &RenderStyle::default())
            .document
            .to_string();
        assert_eq!(svg.matches("GENE").count(), 300);
        for name in &m.row_index {
            assert_eq!(svg.matches(name.as_str()).count(), 1, "{name}");
        }
    }

    #[test]
    fn test_long_labels_widen_the_figure() {
        let mut m = matrix(vec![1.0]);
        m.row_index = vec!["X".repeat(400)];
        let scale = ColorScale::new(-1.0, 1.0, ColorRamp::default());
        let ramp = Ramp::resolve(&scale.ramp).unwrap();
        let figure = build_figure(&m, &scale, &ramp, &RenderStyle::default());
        assert!(figure.width > 400.0 * CHAR_WIDTH_EM * 6.0);
    }
}
