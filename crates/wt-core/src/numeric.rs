use crate::WtError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, WtError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(WtError::NonFinite { what, value: v })
    }
}

/// Absolute value with a quadratic bottom of half-width `dx`.
///
/// Equal to `|x|` outside `(-dx, dx)`; inside it is `x²/(2dx) + dx/2`, which
/// keeps the value and first derivative continuous and never reaches zero.
pub fn smooth_abs(x: Real, dx: Real) -> Real {
    if x > -dx && x < dx {
        x * x / (2.0 * dx) + dx / 2.0
    } else {
        x.abs()
    }
}

/// Smoothed `min(y, y_min)`.
///
/// A cubic Hermite segment blends the identity into the constant `y_min` over
/// `[y_min - off, y_min + off]` where `off = pct_offset * y_min`.
pub fn smooth_min(y: Real, y_min: Real, pct_offset: Real) -> Real {
    let off = (pct_offset * y_min).abs();
    if off == 0.0 {
        return y.min(y_min);
    }

    let x1 = y_min - off;
    let x2 = y_min + off;
    if y <= x1 {
        return y;
    }
    if y >= x2 {
        return y_min;
    }

    // Endpoints: (x1, x1) with slope 1, (x2, y_min) with slope 0
    let h = x2 - x1;
    let t = (y - x1) / h;
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    h00 * x1 + h10 * h * 1.0 + h01 * y_min
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn smooth_abs_matches_abs_outside_band() {
        assert_eq!(smooth_abs(0.5, 0.01), 0.5);
        assert_eq!(smooth_abs(-0.5, 0.01), 0.5);
        assert!((smooth_abs(0.0, 0.01) - 0.005).abs() < 1e-15);
    }

    #[test]
    fn smooth_min_blends_at_limit() {
        assert_eq!(smooth_min(0.5, 1.0, 0.01), 0.5);
        assert_eq!(smooth_min(1.5, 1.0, 0.01), 1.0);
        let mid = smooth_min(1.0, 1.0, 0.01);
        assert!((mid - 0.9975).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn smooth_abs_is_positive_and_close(x in -10.0f64..10.0) {
            let y = smooth_abs(x, 0.01);
            prop_assert!(y > 0.0);
            prop_assert!((y - x.abs()).abs() <= 0.005 + 1e-12);
        }

        #[test]
        fn smooth_min_never_exceeds_limit(y in -5.0f64..5.0) {
            let s = smooth_min(y, 1.0, 0.01);
            prop_assert!(s <= 1.0 + 1e-12);
            prop_assert!(s <= y + 1e-12 || y > 0.99);
        }
    }
}
