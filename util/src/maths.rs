//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Wrap an angle into the half-open range (-pi, pi].
///
/// Total for every finite input. `-pi` itself maps onto `pi`.
pub fn wrap_to_pi<T>(angle: T) -> T
where
    T: Float
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    let wrapped = rem_euclid(angle + pi_t, tau_t) - pi_t;

    if wrapped <= -pi_t {
        wrapped + tau_t
    }
    else if wrapped > pi_t {
        wrapped - tau_t
    }
    else {
        wrapped
    }
}

/// Get the signed shortest angular distance from `a` to `b`, in the range (-pi, pi].
pub fn get_ang_dist<T>(a: T, b: T) -> T
where
    T: Float
{
    wrap_to_pi(b - a)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// The return value `r` satisfies `0.0 <= r < rhs.abs()` in most cases. Due to floating point
/// round-off it can produce `r == rhs.abs()` when `lhs` is much smaller than `rhs.abs()` in
/// magnitude and negative.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    #[test]
    fn test_wrap_to_pi_range() {
        // Sweep a wide range of inputs including many multiples of tau
        let mut angle = -50.0 * TAU;
        while angle < 50.0 * TAU {
            let w = wrap_to_pi(angle);
            assert!(w > -PI && w <= PI, "wrap({}) = {} out of range", angle, w);
            angle += 0.0137;
        }

        for &a in [1e9, -1e9, 1e-12, -1e-12, PI, -PI, TAU, -TAU, 3.0 * PI, -3.0 * PI].iter() {
            let w = wrap_to_pi(a);
            assert!(w > -PI && w <= PI, "wrap({}) = {} out of range", a, w);
        }
    }

    #[test]
    fn test_wrap_to_pi_values() {
        assert!((wrap_to_pi(0.5f64) - 0.5).abs() < 1e-12);
        assert!((wrap_to_pi(-0.5f64) + 0.5).abs() < 1e-12);
        assert!((wrap_to_pi(PI + 0.5) - (-PI + 0.5)).abs() < 1e-12);
        assert!((wrap_to_pi(-PI - 0.5) - (PI - 0.5)).abs() < 1e-12);
        assert!((wrap_to_pi(PI) - PI).abs() < 1e-12);
        assert!((wrap_to_pi(-PI) - PI).abs() < 1e-12);
        assert!(wrap_to_pi(TAU).abs() < 1e-12);
    }

    #[test]
    fn test_get_ang_dist() {
        assert!((get_ang_dist(1f64, 2f64) - 1.0).abs() < 1e-12);
        assert!((get_ang_dist(2f64, 1f64) + 1.0).abs() < 1e-12);
        assert!(get_ang_dist(0f64, TAU).abs() < 1e-12);
        assert!((get_ang_dist(PI - 0.1, -PI + 0.1) - 0.2).abs() < 1e-12);
    }
}
