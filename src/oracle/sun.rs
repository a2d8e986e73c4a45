//! Apparent position of the Sun.
//!
//! This follows the no. 3 algorithm described in Grena, 'Five new algorithms for the computation
//! of sun position from 2010 to 2110', Solar Energy 86 (2012) pp. 1323-1337.
//!
//! Within 2010-2110 the maximum error is 0.01 degrees. Outside that range the error grows
//! slowly, which still leaves rise and set times within a minute or two for several decades
//! either side.

#![allow(clippy::unreadable_literal)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::suboptimal_flops)]

use crate::math::{degrees_to_radians, normalize_radians_signed, radians_to_degrees, PI};
use crate::time::JulianDate;
use crate::Observer;

/// Altitude of the Sun's centre at rise and set: refraction plus semidiameter.
pub const SUN_HORIZON_ALTITUDE: f64 = -0.8333;

/// Julian date of the algorithm's time origin (2060-01-01 0h UT).
const GRENA_EPOCH_JD: f64 = 2_473_459.5;

/// Geocentric equatorial coordinates of the Sun, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunEquatorial {
    /// Right ascension in [0, 2π)
    pub right_ascension: f64,
    /// Declination
    pub declination: f64,
}

/// Right ascension and declination of the Sun at `jd`.
#[must_use]
pub fn equatorial(jd: &JulianDate) -> SunEquatorial {
    let t_e = time_argument(jd) + 1.1574e-5 * jd.delta_t();
    let omega_at_e = 0.0172019715 * t_e;

    let lambda = -1.388803
        + 1.720279216e-2 * t_e
        + 3.3366e-2 * (omega_at_e - 0.06172).sin()
        + 3.53e-4 * (2.0 * omega_at_e - 0.1163).sin();
    let epsilon = 4.089567e-1 - 6.19e-9 * t_e;

    let s_lambda = lambda.sin();
    let c_lambda = lambda.cos();
    let s_epsilon = epsilon.sin();
    let c_epsilon = (1.0 - s_epsilon * s_epsilon).sqrt();

    let mut alpha = (s_lambda * c_epsilon).atan2(c_lambda);
    if alpha < 0.0 {
        alpha += 2.0 * PI;
    }

    SunEquatorial {
        right_ascension: alpha,
        declination: (s_lambda * s_epsilon).asin(),
    }
}

/// Topocentric altitude of the Sun's centre in degrees, without refraction.
#[must_use]
pub fn altitude(jd: &JulianDate, observer: &Observer) -> f64 {
    let SunEquatorial {
        right_ascension: alpha,
        declination: delta,
    } = equatorial(jd);

    let h = normalize_radians_signed(
        1.7528311 + 6.300388099 * time_argument(jd) + degrees_to_radians(observer.longitude())
            - alpha,
    );

    let s_phi = degrees_to_radians(observer.latitude()).sin();
    let c_phi = (1.0 - s_phi * s_phi).sqrt();
    let s_delta = delta.sin();
    let c_delta = (1.0 - s_delta * s_delta).sqrt();

    let s_e0 = s_phi * s_delta + c_phi * c_delta * h.cos();
    // Parallax lowers the apparent Sun by up to 8.8 arcseconds.
    let e_p = s_e0.asin() - 4.26e-5 * (1.0 - s_e0 * s_e0).sqrt();

    radians_to_degrees(e_p)
}

/// Days (UT) since the algorithm's time origin.
fn time_argument(jd: &JulianDate) -> f64 {
    jd.julian_date() - GRENA_EPOCH_JD
}
