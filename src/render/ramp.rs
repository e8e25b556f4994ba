//! Continuous color ramps: predefined palettes and custom stop lists.

use crate::error::{HeatmapError, Result};
use crate::types::ColorRamp;

use super::colors::{parse_color, Rgb};

/// Suffix selecting the reversed version of a named ramp.
pub const REVERSED_SUFFIX: &str = "_r";

/// Evenly spaced stops of each predefined palette, low end first.
const NAMED_RAMPS: &[(&str, &[u32])] = &[
    (
        "viridis",
        &[
            0x440154, 0x482475, 0x414487, 0x355F8D, 0x2A788E, 0x21918C, 0x22A884, 0x44BF70,
            0x7AD151, 0xBDDF26, 0xFDE725,
        ],
    ),
    (
        "plasma",
        &[
            0x0D0887, 0x41049D, 0x6A00A8, 0x8F0DA4, 0xB12A90, 0xCC4778, 0xE16462, 0xF2844B,
            0xFCA636, 0xFCCE25, 0xF0F921,
        ],
    ),
    (
        "inferno",
        &[
            0x000004, 0x1B0C41, 0x4A0C6B, 0x781C6D, 0xA52C60, 0xCF4446, 0xED6925, 0xFB9B06,
            0xF7D13D, 0xFCFFA4,
        ],
    ),
    (
        "magma",
        &[
            0x000004, 0x180F3D, 0x440F76, 0x721F81, 0x9E2F7F, 0xCD4071, 0xF1605D, 0xFD9668,
            0xFECA8D, 0xFCFDBF,
        ],
    ),
    (
        "cividis",
        &[
            0x00224E, 0x123570, 0x3B496C, 0x575D6D, 0x707173, 0x8A8779, 0xA69D75, 0xC4B56C,
            0xE4CF5B, 0xFEE838,
        ],
    ),
    (
        "coolwarm",
        &[
            0x3B4CC0, 0x6788EE, 0x9ABBFF, 0xC9D7F0, 0xEDD1C2, 0xF7A889, 0xE26952, 0xB40426,
        ],
    ),
    ("bwr", &[0x0000FF, 0xFFFFFF, 0xFF0000]),
    ("seismic", &[0x00004D, 0x0000FF, 0xFFFFFF, 0xFF0000, 0x800000]),
    (
        "RdBu",
        &[
            0x67001F, 0xB2182B, 0xD6604D, 0xF4A582, 0xFDDBC7, 0xF7F7F7, 0xD1E5F0, 0x92C5DE,
            0x4393C3, 0x2166AC, 0x053061,
        ],
    ),
    (
        "RdYlBu",
        &[
            0xA50026, 0xD73027, 0xF46D43, 0xFDAE61, 0xFEE090, 0xFFFFBF, 0xE0F3F8, 0xABD9E9,
            0x74ADD1, 0x4575B4, 0x313695,
        ],
    ),
    (
        "RdYlGn",
        &[
            0xA50026, 0xD73027, 0xF46D43, 0xFDAE61, 0xFEE08B, 0xFFFFBF, 0xD9EF8B, 0xA6D96A,
            0x66BD63, 0x1A9850, 0x006837,
        ],
    ),
    (
        "PiYG",
        &[
            0x8E0152, 0xC51B7D, 0xDE77AE, 0xF1B6DA, 0xFDE0EF, 0xF7F7F7, 0xE6F5D0, 0xB8E186,
            0x7FBC41, 0x4D9221, 0x276419,
        ],
    ),
    (
        "PRGn",
        &[
            0x40004B, 0x762A83, 0x9970AB, 0xC2A5CF, 0xE7D4E8, 0xF7F7F7, 0xD9F0D3, 0xA6DBA0,
            0x5AAE61, 0x1B7837, 0x00441B,
        ],
    ),
    (
        "BrBG",
        &[
            0x543005, 0x8C510A, 0xBF812D, 0xDFC27D, 0xF6E8C3, 0xF5F5F5, 0xC7EAE5, 0x80CDC1,
            0x35978F, 0x01665E, 0x003C30,
        ],
    ),
    (
        "Spectral",
        &[
            0x9E0142, 0xD53E4F, 0xF46D43, 0xFDAE61, 0xFEE08B, 0xFFFFBF, 0xE6F598, 0xABDDA4,
            0x66C2A5, 0x3288BD, 0x5E4FA2,
        ],
    ),
    ("gray", &[0x000000, 0xFFFFFF]),
];

/// `hot` is not evenly spaced: black, red, yellow, white.
const HOT_STOPS: &[(f64, u32)] = &[
    (0.0, 0x0B0000),
    (0.365, 0xFF0000),
    (0.746, 0xFFFF00),
    (1.0, 0xFFFFFF),
];

/// Names accepted by [`Ramp::named`], without the reversed variants.
pub fn named_ramp_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = NAMED_RAMPS.iter().map(|(n, _)| *n).collect();
    names.push("hot");
    names
}

/// A piecewise-linear palette over [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Ramp {
    /// (position, color), positions ascending from 0 to 1.
    stops: Vec<(f64, Rgb)>,
}

impl Ramp {
    /// Resolve a [`ColorRamp`] once for a render.
    pub fn resolve(ramp: &ColorRamp) -> Result<Self> {
        match ramp {
            ColorRamp::Named(name) => Self::named(name),
            ColorRamp::Custom(tokens) => {
                let colors = tokens
                    .iter()
                    .map(|t| parse_color(t))
                    .collect::<Result<Vec<_>>>()?;
                Self::from_colors(colors)
            }
        }
    }

    /// Evenly spaced stops. At least two colors are required.
    pub fn from_colors(colors: Vec<Rgb>) -> Result<Self> {
        if colors.len() < 2 {
            return Err(HeatmapError::RenderFailure(format!(
                "A custom colormap needs at least two colors, got {}",
                colors.len()
            )));
        }
        #[allow(clippy::cast_precision_loss)]
        let last = (colors.len() - 1) as f64;
        let stops = colors
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                #[allow(clippy::cast_precision_loss)]
                let pos = i as f64 / last;
                (pos, c)
            })
            .collect();
        Ok(Self { stops })
    }

    /// Look up a predefined palette; `name_r` is the reversed palette.
    pub fn named(name: &str) -> Result<Self> {
        if let Some(base) = name.strip_suffix(REVERSED_SUFFIX) {
            if let Some(ramp) = Self::lookup(base) {
                return Ok(ramp.reversed());
            }
        }
        Self::lookup(name).ok_or_else(|| {
            let supported = named_ramp_names()
                .iter()
                .map(|n| format!("'{n}'"))
                .collect::<Vec<_>>()
                .join(", ");
            HeatmapError::RenderFailure(format!(
                "'{name}' is not a valid value for cmap; supported values are {supported} \
                 (append '{REVERSED_SUFFIX}' to reverse)"
            ))
        })
    }

    fn lookup(name: &str) -> Option<Self> {
        if name == "hot" {
            let stops = HOT_STOPS
                .iter()
                .map(|&(pos, packed)| (pos, Rgb::from_u32(packed)))
                .collect();
            return Some(Self { stops });
        }
        let (_, packed) = NAMED_RAMPS.iter().find(|(n, _)| *n == name)?;
        Self::from_colors(packed.iter().map(|&p| Rgb::from_u32(p)).collect()).ok()
    }

    /// The same palette run from high to low.
    pub fn reversed(self) -> Self {
        let stops = self
            .stops
            .into_iter()
            .rev()
            .map(|(pos, c)| (1.0 - pos, c))
            .collect();
        Self { stops }
    }

    /// Color at position `t` in [0, 1] (clamped).
    pub fn color_at(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
        let mut prev = match self.stops.first() {
            Some(&stop) => stop,
            None => return Rgb::default(),
        };
        for &(pos, color) in &self.stops {
            if t <= pos {
                let span = pos - prev.0;
                if span <= 0.0 {
                    return color;
                }
                return prev.1.lerp(color, (t - prev.0) / span);
            }
            prev = (pos, color);
        }
        prev.1
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

    #[test]
    fn test_custom_ramp_interpolates() {
        let ramp = Ramp::resolve(&ColorRamp::default()).unwrap();
        assert_eq!(ramp.color_at(0.0), Rgb::new(0, 0, 255));
        assert_eq!(ramp.color_at(0.5), Rgb::new(0, 0, 0));
        assert_eq!(ramp.color_at(1.0), Rgb::new(255, 255, 0));
        assert_eq!(ramp.color_at(0.75), Rgb::new(128, 128, 0));
    }

    #[test]
    fn test_named_ramp_and_reverse() {
        let viridis = Ramp::named("viridis").unwrap();
        assert_eq!(viridis.color_at(0.0), Rgb::from_u32(0x440154));
        assert_eq!(viridis.color_at(1.0), Rgb::from_u32(0xFDE725));
        let reversed = Ramp::named("viridis_r").unwrap();
        assert_eq!(reversed.color_at(0.0), Rgb::from_u32(0xFDE725));
        assert_eq!(reversed.color_at(1.0), Rgb::from_u32(0x440154));
    }

    #[test]
    fn test_registered_names() {
        let mut names = named_ramp_names();
        names.sort_unstable();
        let mut expected = vec![
            "viridis", "plasma", "inferno", "magma", "cividis", "coolwarm", "bwr", "seismic",
            "RdBu", "RdYlBu", "PiYG", "PRGn", "BrBG", "RdYlGn", "Spectral", "gray", "hot",
        ];
        expected.sort_unstable();
        assert_eq!(names, expected);
        assert!(Ramp::named("Greys").is_err());
    }

    #[test]
    fn test_hot_has_uneven_stops() {
        let hot = Ramp::named("hot").unwrap();
        assert_eq!(hot.color_at(0.365), Rgb::new(255, 0, 0));
        assert_eq!(hot.color_at(1.0), Rgb::new(255, 255, 255));
    }

    #[test]
    fn test_unknown_name_is_render_failure() {
        let err = Ramp::named("viridiss").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::RenderFailure));
        assert!(err
            .to_string()
            .starts_with("'viridiss' is not a valid value for cmap"));
    }

    #[test]
    fn test_custom_ramp_needs_two_stops() {
        let err = Ramp::resolve(&ColorRamp::custom(["red"])).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::RenderFailure));
        let err = Ramp::resolve(&ColorRamp::custom(["red", "notacolor"])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid RGBA argument: 'notacolor'");
    }
}
