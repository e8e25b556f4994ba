use serde::{Deserialize, Serialize};

/// Order of the two fold-change columns in dual-table output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnOrder {
    #[default]
    FirstSecond,
    SecondFirst,
}

impl ColumnOrder {
    pub fn flipped(self) -> Self {
        match self {
            Self::FirstSecond => Self::SecondFirst,
            Self::SecondFirst => Self::FirstSecond,
        }
    }
}

/// Row ordering applied by the matrix assembler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Keep reconciliation order.
    Original,
    /// Descending by the first displayed column.
    #[default]
    DescendingFirst,
    /// Descending by the column carrying this display label.
    DescendingBy(String),
}

/// Output canvas size in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSize {
    pub width_in: f64,
    pub height_in: f64,
}

/// A labelled column of the heatmap, aligned with the row index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixColumn {
    pub label: String,
    pub values: Vec<f64>,
}

/// The gene-by-condition matrix handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapMatrix {
    /// Row labels (gene names), top to bottom.
    pub row_index: Vec<String>,
    pub columns: Vec<MatrixColumn>,
    pub canvas: CanvasSize,
}

impl HeatmapMatrix {
    pub fn row_count(&self) -> usize {
        self.row_index.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, label: &str) -> Option<&MatrixColumn> {
        self.columns.iter().find(|c| c.label == label)
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.columns.get(col)?.values.get(row).copied()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }
}
