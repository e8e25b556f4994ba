//! End-to-end tests: matrix assembly, sessions and PNG output.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod fixtures;

use std::sync::Arc;

use fcheat::pipeline::prepare;
use fcheat::render::OUTPUT_FILE_NAME;
use fcheat::{
    run_pipeline, ColumnOrder, ErrorKind, HeatmapConfig, HeatmapRequest, HeatmapSession,
    InputSource, PngRenderer, SortOrder,
};
use fixtures::{gene_csv, gene_xlsx, SheetBuilder, XlsxBuilder};
use resvg::usvg::fontdb;

const LEAF: &[(&str, Option<&str>, f64)] = &[
    ("G1", Some("A"), -3.0),
    ("G2", None, 5.0),
    ("G3", Some("C"), 0.0),
    ("G4", Some("D"), 1.0),
];
const ROOT: &[(&str, Option<&str>, f64)] = &[("G3", Some("C"), 2.0), ("G4", Some("D"), -7.0)];

fn dual_request() -> HeatmapRequest {
    let mut config = HeatmapConfig::default();
    config.roles.first = "leaf".into();
    config.roles.second = "root".into();
    HeatmapRequest::new(InputSource::Xlsx(gene_xlsx(LEAF)))
        .with_second(InputSource::Xlsx(gene_xlsx(ROOT)))
        .with_config(config)
}

fn test_renderer() -> PngRenderer {
    PngRenderer::with_fonts(Arc::new(fontdb::Database::new())).with_dpi(40)
}

#[test]
fn test_dual_matrix_sorted_by_first_column() {
    let (_, scale, matrix) = prepare(&dual_request()).unwrap();
    assert_eq!((scale.vmin, scale.vmax), (-5.0, 5.0));
    assert_eq!(matrix.labels(), vec!["logFC_leaf", "logFC_root"]);
    assert_eq!(matrix.row_index, vec!["G2", "G4 - D", "G3 - C", "G1 - A"]);
    assert_eq!(matrix.columns[0].values, vec![5.0, 1.0, 0.0, -3.0]);
    assert_eq!(matrix.columns[1].values, vec![0.0, -7.0, 2.0, 0.0]);
    assert_eq!(matrix.canvas.width_in, 6.0);
    assert_eq!(matrix.canvas.height_in, 6.0);
}

#[test]
fn test_flipped_order_preserves_values_per_gene() {
    let straight = prepare(&dual_request()).unwrap().2;
    let mut request = dual_request();
    request.config.order = ColumnOrder::SecondFirst;
    request.config.sort = SortOrder::Original;
    let flipped = prepare(&request).unwrap().2;

    assert_eq!(flipped.labels(), vec!["logFC_root", "logFC_leaf"]);
    for (row, gene) in flipped.row_index.iter().enumerate() {
        let s = straight.row_index.iter().position(|g| g == gene).unwrap();
        assert_eq!(
            flipped.column("logFC_leaf").unwrap().values[row],
            straight.column("logFC_leaf").unwrap().values[s]
        );
        assert_eq!(
            flipped.column("logFC_root").unwrap().values[row],
            straight.column("logFC_root").unwrap().values[s]
        );
    }
    assert_eq!(flipped.row_index, vec!["G1 - A", "G2", "G3 - C", "G4 - D"]);
}

#[test]
fn test_sort_by_custom_label() {
    let mut request = dual_request();
    request.config.labels = vec!["Leaf".into(), "Root".into()];
    request.config.sort = SortOrder::DescendingBy("Root".into());
    let (_, _, matrix) = prepare(&request).unwrap();
    assert_eq!(matrix.labels(), vec!["Leaf", "Root"]);
    assert_eq!(matrix.row_index, vec!["G3 - C", "G1 - A", "G2", "G4 - D"]);
}

#[test]
fn test_single_mode_has_one_column() {
    let request = HeatmapRequest::new(InputSource::Delimited {
        data: gene_csv(LEAF),
        delimiter: fcheat::Delimiter::Comma,
    });
    let (table, _, matrix) = prepare(&request).unwrap();
    assert!(!table.is_dual());
    assert_eq!(matrix.column_count(), 1);
    assert_eq!(matrix.labels(), vec!["logFC_first"]);
}

#[test]
fn test_canvas_height_grows_with_rows() {
    let genes: Vec<(String, f64)> = (0..50).map(|i| (format!("G{i}"), f64::from(i))).collect();
    let rows: Vec<(&str, Option<&str>, f64)> =
        genes.iter().map(|(id, fc)| (id.as_str(), None, *fc)).collect();
    let request = HeatmapRequest::new(InputSource::Xlsx(gene_xlsx(&rows)));
    let (_, _, matrix) = prepare(&request).unwrap();
    assert!((matrix.canvas.height_in - 7.5).abs() < 1e-9);
}

#[test]
fn test_pipeline_writes_png() {
    let output = run_pipeline(&dual_request(), &test_renderer()).unwrap();
    let image = output.image;
    assert_eq!(&image.png[..8], b"\x89PNG\r\n\x1a\n");
    assert_eq!(image.file_name, OUTPUT_FILE_NAME);
    assert_eq!(image.mime_type, "image/png");
    assert!(image.width_px > 0 && image.height_px > 0);

    let decoder = png::Decoder::new(image.png.as_slice());
    let reader = decoder.read_info().unwrap();
    assert_eq!(reader.info().width, image.width_px);
    assert_eq!(reader.info().color_type, png::ColorType::Rgba);
}

#[test]
fn test_session_keeps_previous_image_on_failure() {
    let mut session = HeatmapSession::new(test_renderer());
    assert!(session.last_render().is_none());
    let first = session.generate(&dual_request()).unwrap().clone();

    let broken = HeatmapRequest::new(InputSource::Xlsx(
        XlsxBuilder::new()
            .sheet(SheetBuilder::new("sigDEG_FC1").header(&["gene_id", "logFC"]))
            .build(),
    ));
    let err = session.generate(&broken).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::MissingColumn));
    assert_eq!(session.last_render(), Some(&first));

    let mut bad_colors = dual_request();
    bad_colors.config.colormap = "Custom".into();
    bad_colors.config.custom_colors = "blue,notacolor".into();
    let err = session.generate(&bad_colors).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::RenderFailure));
    assert!(err.to_string().contains("notacolor"));
    assert_eq!(session.last_render(), Some(&first));
}

#[test]
fn test_unknown_named_ramp_lists_choices() {
    let mut request = dual_request();
    request.config.colormap = "rainbowish".into();
    let err = run_pipeline(&request, &test_renderer()).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::RenderFailure));
    assert!(err.to_string().contains("viridis"));
}
