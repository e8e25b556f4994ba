use serde::{Deserialize, Serialize};

/// A color ramp: either a predefined continuous palette or an ordered list
/// of color tokens interpolated piecewise-linearly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorRamp {
    Named(String),
    Custom(Vec<String>),
}

impl ColorRamp {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn custom<I, S>(colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Custom(colors.into_iter().map(Into::into).collect())
    }
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self::custom(["blue", "black", "yellow"])
    }
}

/// Color-scale bounds and ramp for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScale {
    pub vmin: f64,
    pub vmax: f64,
    pub center: f64,
    pub ramp: ColorRamp,
}

impl ColorScale {
    /// Scale centered on zero.
    pub fn new(vmin: f64, vmax: f64, ramp: ColorRamp) -> Self {
        Self {
            vmin,
            vmax,
            center: 0.0,
            ramp,
        }
    }

    /// Position of `value` along the ramp in [0, 1], centered on `center`.
    ///
    /// The value is clipped to `[vmin, vmax]`; the half-width of the ramp is
    /// the larger distance from `center` to either bound, so `center` always
    /// maps to 0.5. Returns `None` for NaN. A degenerate scale maps every
    /// value to 0.5.
    pub fn position(&self, value: f64) -> Option<f64> {
        if value.is_nan() {
            return None;
        }
        let (lo, hi) = if self.vmin <= self.vmax {
            (self.vmin, self.vmax)
        } else {
            (self.vmax, self.vmin)
        };
        let clipped = value.clamp(lo, hi);
        let half_range = (hi - self.center).max(self.center - lo);
        if !half_range.is_finite() || half_range <= 0.0 {
            return Some(0.5);
        }
        Some((0.5 + (clipped - self.center) / (2.0 * half_range)).clamp(0.0, 1.0))
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

    #[test]
    fn test_position_symmetric() {
        let scale = ColorScale::new(-4.0, 4.0, ColorRamp::default());
        assert_eq!(scale.position(0.0), Some(0.5));
        assert_eq!(scale.position(-4.0), Some(0.0));
        assert_eq!(scale.position(4.0), Some(1.0));
        assert_eq!(scale.position(2.0), Some(0.75));
    }

    #[test]
    fn test_position_clips() {
        let scale = ColorScale::new(-1.0, 1.0, ColorRamp::default());
        assert_eq!(scale.position(10.0), Some(1.0));
        assert_eq!(scale.position(-10.0), Some(0.0));
        assert_eq!(scale.position(f64::NAN), None);
    }

    #[test]
    fn test_position_asymmetric_keeps_center_at_midpoint() {
        let scale = ColorScale::new(-1.0, 3.0, ColorRamp::default());
        assert_eq!(scale.position(0.0), Some(0.5));
        assert_eq!(scale.position(3.0), Some(1.0));
        // vmin only reaches part of the lower half
        let low = scale.position(-1.0).unwrap();
        assert!((low - (0.5 - 1.0 / 6.0)).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_scale() {
        let scale = ColorScale::new(0.0, 0.0, ColorRamp::named("viridis"));
        assert_eq!(scale.position(7.0), Some(0.5));
    }
}
