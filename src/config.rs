//! User configuration: text, fonts, colormap, range overrides and layout.
//!
//! Every field has a default, so a JSON file only needs the keys it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assemble::AssemblyOptions;
use crate::error::Result;
use crate::range::RangeOverride;
use crate::render::RenderStyle;
use crate::types::{ColorRamp, ColumnOrder, SortOrder};

/// Colormap preset labels.
pub const PRESET_BLUE_BLACK_YELLOW: &str = "Blue-Black-Yellow";
pub const PRESET_RED_WHITE_BLUE: &str = "Red-White-Blue";
pub const PRESET_VIRIDIS: &str = "Viridis";
pub const PRESET_PLASMA: &str = "Plasma";
pub const PRESET_CUSTOM: &str = "Custom";

/// Inclusive font-size bounds in points.
pub const TITLE_SIZE_RANGE: (f64, f64) = (8.0, 32.0);
pub const XTICK_SIZE_RANGE: (f64, f64) = (3.0, 24.0);
pub const YTICK_SIZE_RANGE: (f64, f64) = (3.0, 24.0);

/// Font sizes in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizes {
    pub title: f64,
    pub xtick: f64,
    pub ytick: f64,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            title: 14.0,
            xtick: 10.0,
            ytick: 6.0,
        }
    }
}

fn clamp_size(name: &str, value: f64, (lo, hi): (f64, f64), fallback: f64) -> f64 {
    if !value.is_finite() {
        tracing::warn!(font = name, value, fallback, "font size is not a number");
        return fallback;
    }
    let clamped = value.clamp(lo, hi);
    if (clamped - value).abs() > f64::EPSILON {
        tracing::warn!(font = name, value, clamped, "font size out of range");
    }
    clamped
}

impl FontSizes {
    /// Sizes forced into their allowed ranges.
    pub fn clamped(self) -> Self {
        let defaults = Self::default();
        Self {
            title: clamp_size("title", self.title, TITLE_SIZE_RANGE, defaults.title),
            xtick: clamp_size("xtick", self.xtick, XTICK_SIZE_RANGE, defaults.xtick),
            ytick: clamp_size("ytick", self.ytick, YTICK_SIZE_RANGE, defaults.ytick),
        }
    }
}

/// Role names of the two input tables. They name error messages and the
/// merged columns (`logFC_{role}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleNames {
    pub first: String,
    pub second: String,
}

impl Default for RoleNames {
    fn default() -> Self {
        Self {
            first: "first".to_string(),
            second: "second".to_string(),
        }
    }
}

/// Complete user configuration of one heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub font_sizes: FontSizes,
    /// A preset label (`Blue-Black-Yellow`, `Red-White-Blue`, `Viridis`,
    /// `Plasma`, `Custom`) or any named ramp such as `magma` or `RdBu_r`.
    pub colormap: String,
    /// Comma-separated color tokens used when `colormap` is `Custom`.
    pub custom_colors: String,
    /// Lower bound override. Unset, zero and non-finite all mean auto.
    pub vmin: Option<f64>,
    /// Upper bound override. Unset, zero and non-finite all mean auto.
    pub vmax: Option<f64>,
    pub order: ColumnOrder,
    pub sort: SortOrder,
    /// Custom column labels in display order.
    pub labels: Vec<String>,
    pub roles: RoleNames,
    /// Sheet of the first file; the default selection when unset.
    pub first_sheet: Option<String>,
    /// Sheet of the second file; the default selection when unset.
    pub second_sheet: Option<String>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        let style = RenderStyle::default();
        Self {
            title: style.title,
            x_label: style.x_label,
            y_label: style.y_label,
            font_sizes: FontSizes::default(),
            colormap: PRESET_BLUE_BLACK_YELLOW.to_string(),
            custom_colors: "blue,black,yellow".to_string(),
            vmin: None,
            vmax: None,
            order: ColumnOrder::default(),
            sort: SortOrder::default(),
            labels: Vec::new(),
            roles: RoleNames::default(),
            first_sheet: None,
            second_sheet: None,
        }
    }
}

impl HeatmapConfig {
    /// Parse a JSON document; missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Resolve the colormap setting to a ramp.
    pub fn ramp(&self) -> ColorRamp {
        match self.colormap.trim() {
            PRESET_BLUE_BLACK_YELLOW => ColorRamp::custom(["blue", "black", "yellow"]),
            PRESET_RED_WHITE_BLUE => ColorRamp::custom(["red", "white", "blue"]),
            PRESET_VIRIDIS => ColorRamp::named("viridis"),
            PRESET_PLASMA => ColorRamp::named("plasma"),
            // Empty tokens are kept so they fail color parsing
            PRESET_CUSTOM => ColorRamp::custom(self.custom_colors.split(',').map(str::trim)),
            other => ColorRamp::named(other),
        }
    }

    /// Range overrides with non-finite values dropped.
    pub fn range_override(&self) -> RangeOverride {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        RangeOverride::new(finite(self.vmin), finite(self.vmax))
    }

    /// Figure text and clamped font sizes.
    pub fn style(&self) -> RenderStyle {
        let sizes = self.font_sizes.clamped();
        RenderStyle {
            title: self.title.clone(),
            x_label: self.x_label.clone(),
            y_label: self.y_label.clone(),
            title_size: sizes.title,
            xtick_size: sizes.xtick,
            ytick_size: sizes.ytick,
        }
    }

    pub fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions {
            order: self.order,
            sort: self.sort.clone(),
            labels: self.labels.clone(),
        }
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
    use test_case::test_case;

    #[test]
    fn test_defaults() {
        let config = HeatmapConfig::default();
        assert_eq!(config.title, "Heatmap (All Data)");
        assert_eq!(config.x_label, "Tissues / Conditions");
        assert_eq!(config.ramp(), ColorRamp::custom(["blue", "black", "yellow"]));
        assert_eq!(config.custom_colors, "blue,black,yellow");
        assert_eq!(config.style().ytick_size, 6.0);
        assert_eq!(config.sort, SortOrder::DescendingFirst);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = HeatmapConfig::from_json_str(
            r#"{"title": "Leaf vs Root", "vmin": -3, "order": "second-first",
                "roles": {"first": "leaf", "second": "root"},
                "sort": {"descending-by": "logFC_root"},
                "font_sizes": {"title": 20}}"#,
        )
        .unwrap();
        assert_eq!(config.title, "Leaf vs Root");
        assert_eq!(config.vmin, Some(-3.0));
        assert_eq!(config.order, ColumnOrder::SecondFirst);
        assert_eq!(config.roles.first, "leaf");
        assert_eq!(config.sort, SortOrder::DescendingBy("logFC_root".into()));
        assert_eq!(config.font_sizes.title, 20.0);
        assert_eq!(config.font_sizes.ytick, 6.0);
        assert_eq!(config.x_label, "Tissues / Conditions");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(HeatmapConfig::from_json_str("{").is_err());
    }

    #[test_case("Red-White-Blue", ColorRamp::custom(["red", "white", "blue"]) ; "preset list")]
    #[test_case("Viridis", ColorRamp::named("viridis") ; "preset name")]
    #[test_case("magma_r", ColorRamp::named("magma_r") ; "any named ramp")]
    #[test_case("Custom", ColorRamp::custom(["#000", "gold", ""]) ; "custom list")]
    fn test_ramp(colormap: &str, expected: ColorRamp) {
        let config = HeatmapConfig {
            colormap: colormap.to_string(),
            custom_colors: " #000 , gold,".to_string(),
            ..HeatmapConfig::default()
        };
        assert_eq!(config.ramp(), expected);
    }

    #[test]
    fn test_empty_custom_token_fails_to_resolve() {
        let config = HeatmapConfig {
            colormap: PRESET_CUSTOM.to_string(),
            custom_colors: "blue,,yellow".to_string(),
            ..HeatmapConfig::default()
        };
        assert_eq!(config.ramp(), ColorRamp::custom(["blue", "", "yellow"]));
        let err = crate::render::Ramp::resolve(&config.ramp()).unwrap_err();
        assert_eq!(err.kind(), Some(crate::error::ErrorKind::RenderFailure));
        assert_eq!(err.to_string(), "Invalid RGBA argument: ''");
    }

    #[test]
    fn test_font_sizes_are_clamped() {
        let sizes = FontSizes {
            title: 40.0,
            xtick: 1.0,
            ytick: f64::NAN,
        }
        .clamped();
        assert_eq!(sizes.title, 32.0);
        assert_eq!(sizes.xtick, 3.0);
        assert_eq!(sizes.ytick, 6.0);
    }

    #[test]
    fn test_non_finite_override_is_unset() {
        let config = HeatmapConfig {
            vmin: Some(f64::INFINITY),
            vmax: Some(2.0),
            ..HeatmapConfig::default()
        };
        assert_eq!(config.range_override(), RangeOverride::new(None, Some(2.0)));
    }
}
