//! Small numeric helpers shared by the particle and editor code

use super::states::NVec2;

/// Round `x` to `n` significant figures. Zero (and non-finite input) is
/// returned unchanged.
pub fn round_to_sig_fig(x: f64, n: i32) -> f64 {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    let magnitude = x.abs().log10().floor() as i32;
    let decimals = n - 1 - magnitude;
    // subnormals: 10^decimals overflows, scale in two steps
    if decimals > f64::MAX_10_EXP {
        let hi = 10f64.powi(f64::MAX_10_EXP);
        let lo = 10f64.powi(decimals - f64::MAX_10_EXP);
        return (x * hi * lo).round() / hi / lo;
    }

    // scale up, round half away from zero, scale back down
    if decimals >= 0 {
        let factor = 10f64.powi(decimals);
        (x * factor).round() / factor
    } else {
        let factor = 10f64.powi(-decimals);
        (x / factor).round() * factor
    }
}

/// Euclidean distance between two points
pub fn distance(a: &NVec2, b: &NVec2) -> f64 {
    (a - b).norm()
}
