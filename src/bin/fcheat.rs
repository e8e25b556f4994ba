//! CLI for fcheat - renders fold-change heatmaps from one or two tables
//!
//! Usage:
//!   fcheat render leaf.xlsx --second root.xlsx -o heatmap_all.png
//!   fcheat sheets leaf.xlsx
//!   fcheat preview leaf.xlsx --second root.xlsx > merged.tsv

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use fcheat::parser::DEFAULT_SHEET;
use fcheat::pipeline::reconcile_request;
use fcheat::{
    run_pipeline, ColumnOrder, HeatmapConfig, HeatmapRequest, InputSource, PngRenderer,
    SheetSelection, SortOrder, SpreadsheetSource,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fold-change heatmaps from differential-expression tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the heatmap as PNG
    Render(RenderArgs),
    /// List the sheets of a file and the one picked by default
    Sheets {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    /// Print the reconciled table as TSV
    Preview(InputArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// First (reference) table: XLSX, CSV or TSV
    #[arg(value_hint = ValueHint::FilePath)]
    first: PathBuf,

    /// Optional second table merged onto the first
    #[arg(long, value_hint = ValueHint::FilePath)]
    second: Option<PathBuf>,

    /// JSON configuration; flags override its values
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Sheet of the first file (default: sigDEG_FC1, else the first sheet)
    #[arg(long)]
    first_sheet: Option<String>,

    /// Sheet of the second file
    #[arg(long)]
    second_sheet: Option<String>,

    /// Role name of the first table, used in messages and column names
    #[arg(long)]
    first_role: Option<String>,

    /// Role name of the second table
    #[arg(long)]
    second_role: Option<String>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output PNG path
    #[arg(short, long, default_value = "heatmap_all.png", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Also write the SVG layout
    #[arg(long, value_hint = ValueHint::FilePath)]
    svg: Option<PathBuf>,

    /// Colormap preset (Blue-Black-Yellow, Red-White-Blue, Viridis, Plasma,
    /// Custom) or a named ramp such as magma or RdBu_r
    #[arg(long)]
    colormap: Option<String>,

    /// Comma-separated colors for the Custom colormap
    #[arg(long)]
    colors: Option<String>,

    /// Lower color bound; 0 means automatic
    #[arg(long, allow_hyphen_values = true)]
    vmin: Option<f64>,

    /// Upper color bound; 0 means automatic
    #[arg(long, allow_hyphen_values = true)]
    vmax: Option<f64>,

    /// Column order of the two tables
    #[arg(long, value_enum)]
    order: Option<OrderOpt>,

    /// Row sort: `first`, `none` or a column label
    #[arg(long)]
    sort: Option<String>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    x_label: Option<String>,

    #[arg(long)]
    y_label: Option<String>,

    #[arg(long)]
    title_size: Option<f64>,

    #[arg(long)]
    xtick_size: Option<f64>,

    #[arg(long)]
    ytick_size: Option<f64>,

    /// Column label in display order; repeat once per column
    #[arg(long = "label")]
    labels: Vec<String>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OrderOpt {
    FirstSecond,
    SecondFirst,
}

impl From<OrderOpt> for ColumnOrder {
    fn from(value: OrderOpt) -> Self {
        match value {
            OrderOpt::FirstSecond => ColumnOrder::FirstSecond,
            OrderOpt::SecondFirst => ColumnOrder::SecondFirst,
        }
    }
}

fn parse_sort(token: &str) -> SortOrder {
    match token {
        "first" => SortOrder::DescendingFirst,
        "none" => SortOrder::Original,
        label => SortOrder::DescendingBy(label.to_string()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Render(args) => handle_render(args),
        Command::Sheets { file } => handle_sheets(&file),
        Command::Preview(args) => handle_preview(&args),
    }
}

fn build_request(input: &InputArgs) -> Result<HeatmapRequest> {
    let mut config = match &input.config {
        Some(path) => HeatmapConfig::from_json_file(path)
            .with_context(|| format!("reading configuration {}", path.display()))?,
        None => HeatmapConfig::default(),
    };
    if let Some(sheet) = &input.first_sheet {
        config.first_sheet = Some(sheet.clone());
    }
    if let Some(sheet) = &input.second_sheet {
        config.second_sheet = Some(sheet.clone());
    }
    if let Some(role) = &input.first_role {
        config.roles.first = role.clone();
    }
    if let Some(role) = &input.second_role {
        config.roles.second = role.clone();
    }

    let mut request = HeatmapRequest::new(InputSource::Path(input.first.clone()));
    if let Some(second) = &input.second {
        request = request.with_second(InputSource::Path(second.clone()));
    }
    Ok(request.with_config(config))
}

fn apply_render_flags(config: &mut HeatmapConfig, args: RenderArgs) {
    if let Some(colormap) = args.colormap {
        config.colormap = colormap;
    }
    if let Some(colors) = args.colors {
        config.custom_colors = colors;
    }
    if args.vmin.is_some() {
        config.vmin = args.vmin;
    }
    if args.vmax.is_some() {
        config.vmax = args.vmax;
    }
    if let Some(order) = args.order {
        config.order = order.into();
    }
    if let Some(sort) = args.sort {
        config.sort = parse_sort(&sort);
    }
    if let Some(title) = args.title {
        config.title = title;
    }
    if let Some(label) = args.x_label {
        config.x_label = label;
    }
    if let Some(label) = args.y_label {
        config.y_label = label;
    }
    if let Some(size) = args.title_size {
        config.font_sizes.title = size;
    }
    if let Some(size) = args.xtick_size {
        config.font_sizes.xtick = size;
    }
    if let Some(size) = args.ytick_size {
        config.font_sizes.ytick = size;
    }
    if !args.labels.is_empty() {
        config.labels = args.labels;
    }
}

fn handle_render(args: RenderArgs) -> Result<()> {
    let mut request = build_request(&args.input)?;
    let output_path = args.output.clone();
    let svg_path = args.svg.clone();
    apply_render_flags(&mut request.config, args);

    let renderer = PngRenderer::new();
    let output = run_pipeline(&request, &renderer)?;

    std::fs::write(&output_path, &output.image.png)
        .with_context(|| format!("writing {}", output_path.display()))?;
    tracing::info!(
        path = %output_path.display(),
        width_px = output.image.width_px,
        height_px = output.image.height_px,
        "wrote heatmap"
    );

    if let Some(path) = svg_path {
        let svg = renderer.render_svg(&output.matrix, &output.scale, &request.config.style())?;
        std::fs::write(&path, svg).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote svg");
    }
    Ok(())
}

fn handle_sheets(file: &Path) -> Result<()> {
    let source =
        SpreadsheetSource::open(file).with_context(|| format!("opening {}", file.display()))?;
    let picked = SheetSelection::Default.resolve(source.sheet_names()).ok();

    let mut stdout = io::stdout().lock();
    for (idx, name) in source.sheet_names().iter().enumerate() {
        let marker = if picked == Some(idx) { "*" } else { " " };
        writeln!(stdout, "{marker} {idx}\t{name}")?;
    }
    let has_default = source.sheet_names().iter().any(|n| n == DEFAULT_SHEET);
    if picked.is_some() && !has_default {
        writeln!(stdout, "({DEFAULT_SHEET} not found, using the first sheet)")?;
    }
    Ok(())
}

fn handle_preview(args: &InputArgs) -> Result<()> {
    let request = build_request(args)?;
    let table = reconcile_request(&request)?;
    io::stdout().lock().write_all(table.to_tsv().as_bytes())?;
    Ok(())
}
