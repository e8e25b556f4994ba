//! Range calculator - symmetric color-scale bounds.

use crate::types::{ColorRamp, ColorScale, ReconciledTable};

/// Bounds requested by the user; `None` means "not supplied".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RangeOverride {
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
}

impl RangeOverride {
    pub fn new(vmin: Option<f64>, vmax: Option<f64>) -> Self {
        Self { vmin, vmax }
    }
}

/// Symmetric auto range `(-m, m)` where `m` is the largest magnitude in the
/// reference column. NaN values are ignored; an empty or all-NaN column
/// yields `(0, 0)`.
pub fn auto_range(reference: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (min, max) = reference
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })
        .unwrap_or((0.0, 0.0));
    let m = min.abs().max(max.abs());
    (-m, m)
}

/// A supplied bound replaces the auto value only when it is finite and
/// nonzero. Exactly `0.0` counts as not supplied.
fn effective(bound: Option<f64>, auto: f64) -> f64 {
    match bound {
        Some(v) if v.is_finite() && v != 0.0 => v,
        _ => auto,
    }
}

/// Derive the color scale for a reconciled table.
///
/// The auto range always comes from the first table's column, even when a
/// second table was merged in.
pub fn color_scale(
    table: &ReconciledTable,
    overrides: RangeOverride,
    ramp: ColorRamp,
) -> ColorScale {
    let (auto_min, auto_max) = auto_range(table.reference_values());
    let vmin = effective(overrides.vmin, auto_min);
    let vmax = effective(overrides.vmax, auto_max);
    if overrides.vmin == Some(0.0) || overrides.vmax == Some(0.0) {
        tracing::debug!("a bound of exactly 0 is treated as unset");
    }
    tracing::info!(vmin, vmax, auto_min, auto_max, "color scale");
    ColorScale::new(vmin, vmax, ramp)
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
    use crate::types::ReconciledRow;
    use test_case::test_case;

    fn table(a: &[f64], b: &[f64]) -> ReconciledTable {
        let rows = a
            .iter()
            .zip(b.iter().map(|v| Some(*v)).chain(std::iter::repeat(None)))
            .enumerate()
            .map(|(i, (a, b))| ReconciledRow::new(format!("G{i}"), None, *a, b))
            .collect();
        ReconciledTable {
            role_a: "first".into(),
            role_b: None,
            column_a: "logFC_first".into(),
            column_b: None,
            rows,
        }
    }

    #[test]
    fn test_auto_range_is_symmetric() {
        assert_eq!(auto_range([-3.0, 5.0, 0.0]), (-5.0, 5.0));
        assert_eq!(auto_range([-7.5, 2.0]), (-7.5, 7.5));
    }

    #[test]
    fn test_auto_range_ignores_nan_and_empty() {
        assert_eq!(auto_range([f64::NAN, -1.0]), (-1.0, 1.0));
        assert_eq!(auto_range(Vec::<f64>::new()), (0.0, 0.0));
        assert_eq!(auto_range([f64::NAN]), (0.0, 0.0));
    }

    #[test]
    fn test_range_uses_first_column_only() {
        let t = table(&[1.0, -2.0], &[10.0, -30.0]);
        let scale = color_scale(&t, RangeOverride::default(), ColorRamp::default());
        assert_eq!((scale.vmin, scale.vmax), (-2.0, 2.0));
        assert_eq!(scale.center, 0.0);
    }

    #[test_case(Some(-2.0), Some(2.0), (-2.0, 2.0) ; "both overridden")]
    #[test_case(Some(0.0), Some(2.0), (-5.0, 2.0) ; "zero vmin falls back to auto")]
    #[test_case(Some(-1.0), Some(0.0), (-1.0, 5.0) ; "zero vmax falls back to auto")]
    #[test_case(None, Some(8.0), (-5.0, 8.0) ; "only vmax")]
    #[test_case(Some(f64::NAN), None, (-5.0, 5.0) ; "non finite ignored")]
    fn test_overrides(vmin: Option<f64>, vmax: Option<f64>, expected: (f64, f64)) {
        let t = table(&[-3.0, 5.0, 0.0], &[]);
        let scale = color_scale(&t, RangeOverride::new(vmin, vmax), ColorRamp::default());
        assert_eq!((scale.vmin, scale.vmax), expected);
    }
}
