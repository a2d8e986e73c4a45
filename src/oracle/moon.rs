//! Lunar position from Jean Meeus, "Astronomical Algorithms", chapter 47.
//!
//! Only the 20 largest periodic terms of tables 47.A and 47.B are summed, which keeps the
//! ecliptic position within about 0.3 degrees. That is ample for rise and set times, where
//! the Moon moves about half a degree per hour against the sky.

#![allow(clippy::unreadable_literal)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::suboptimal_flops)]

use crate::math::{
    degrees_to_radians, normalize_degrees_0_to_360, polynomial, radians_to_degrees,
};
use crate::time::{JulianDate, J2000_JDN};
use crate::Observer;

/// Equatorial radius of the Earth in km.
const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.14;

/// Mean radius of the Moon in km.
const MOON_RADIUS_KM: f64 = 1737.4;

/// Standard atmospheric refraction at the horizon, in degrees (34').
const HORIZON_REFRACTION: f64 = 34.0 / 60.0;

/// Multiples of (D, M, M', F) with the sine coefficient for longitude (1e-6 degrees)
/// and the cosine coefficient for distance (1e-3 km). Table 47.A.
const TERMS_LR: [(f64, f64, f64, f64, f64, f64); 20] = [
    (0.0, 0.0, 1.0, 0.0, 6288774.0, -20905355.0),
    (2.0, 0.0, -1.0, 0.0, 1274027.0, -3699111.0),
    (2.0, 0.0, 0.0, 0.0, 658314.0, -2955968.0),
    (0.0, 0.0, 2.0, 0.0, 213618.0, -569925.0),
    (0.0, 1.0, 0.0, 0.0, -185116.0, 48888.0),
    (0.0, 0.0, 0.0, 2.0, -114332.0, -3149.0),
    (2.0, 0.0, -2.0, 0.0, 58793.0, 246158.0),
    (2.0, -1.0, -1.0, 0.0, 57066.0, -152138.0),
    (2.0, 0.0, 1.0, 0.0, 53322.0, -170733.0),
    (2.0, -1.0, 0.0, 0.0, 45758.0, -204586.0),
    (0.0, 1.0, -1.0, 0.0, -40923.0, -129620.0),
    (1.0, 0.0, 0.0, 0.0, -34720.0, 108743.0),
    (0.0, 1.0, 1.0, 0.0, -30383.0, 104755.0),
    (2.0, 0.0, 0.0, -2.0, 15327.0, 10321.0),
    (0.0, 0.0, 1.0, 2.0, -12528.0, 0.0),
    (0.0, 0.0, 1.0, -2.0, 10980.0, 79661.0),
    (4.0, 0.0, -1.0, 0.0, 10675.0, -34782.0),
    (0.0, 0.0, 3.0, 0.0, 10034.0, -23210.0),
    (4.0, 0.0, -2.0, 0.0, 8548.0, -21636.0),
    (2.0, 1.0, -1.0, 0.0, -7888.0, 24208.0),
];

/// Multiples of (D, M, M', F) with the sine coefficient for latitude (1e-6 degrees).
/// Table 47.B.
const TERMS_B: [(f64, f64, f64, f64, f64); 20] = [
    (0.0, 0.0, 0.0, 1.0, 5128122.0),
    (0.0, 0.0, 1.0, 1.0, 280602.0),
    (0.0, 0.0, 1.0, -1.0, 277693.0),
    (2.0, 0.0, 0.0, -1.0, 173237.0),
    (2.0, 0.0, -1.0, 1.0, 55413.0),
    (2.0, 0.0, -1.0, -1.0, 46271.0),
    (2.0, 0.0, 0.0, 1.0, 32573.0),
    (0.0, 0.0, 2.0, 1.0, 17198.0),
    (2.0, 0.0, 1.0, -1.0, 9266.0),
    (0.0, 0.0, 2.0, -1.0, 8822.0),
    (2.0, -1.0, 0.0, -1.0, 8216.0),
    (2.0, 0.0, -2.0, -1.0, 4324.0),
    (2.0, 0.0, 1.0, 1.0, 4200.0),
    (2.0, 1.0, 0.0, -1.0, -3359.0),
    (2.0, -1.0, -1.0, 1.0, 2463.0),
    (2.0, -1.0, 0.0, 1.0, 2211.0),
    (2.0, -1.0, -1.0, -1.0, 2065.0),
    (0.0, 1.0, -1.0, -1.0, -1870.0),
    (4.0, 0.0, -1.0, -1.0, 1828.0),
    (0.0, 1.0, 0.0, 1.0, -1794.0),
];

/// Geocentric ecliptic position of the Moon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LunarPosition {
    /// Ecliptic longitude in degrees [0, 360)
    pub longitude: f64,
    /// Ecliptic latitude in degrees
    pub latitude: f64,
    /// Distance between the centres of Earth and Moon in km
    pub distance_km: f64,
}

/// Fundamental arguments in degrees: (L', D, M, M', F).
fn fundamental_arguments(t: f64) -> (f64, f64, f64, f64, f64) {
    let mean_longitude = normalize_degrees_0_to_360(polynomial(
        &[218.3164477, 481267.88123421, -0.0015786, 1.0 / 538841.0, -1.0 / 65194000.0],
        t,
    ));
    let elongation = normalize_degrees_0_to_360(polynomial(
        &[297.8501921, 445267.1114034, -0.0018819, 1.0 / 545868.0, -1.0 / 113065000.0],
        t,
    ));
    let sun_anomaly = normalize_degrees_0_to_360(polynomial(
        &[357.5291092, 35999.0502909, -0.0001536, 1.0 / 24490000.0],
        t,
    ));
    let moon_anomaly = normalize_degrees_0_to_360(polynomial(
        &[134.9633964, 477198.8675055, 0.0087414, 1.0 / 69699.0, -1.0 / 14712000.0],
        t,
    ));
    let latitude_argument = normalize_degrees_0_to_360(polynomial(
        &[93.2720950, 483202.0175233, -0.0036539, -1.0 / 3526000.0, 1.0 / 863310000.0],
        t,
    ));
    (
        mean_longitude,
        elongation,
        sun_anomaly,
        moon_anomaly,
        latitude_argument,
    )
}

/// Ecliptic position for `t` Julian ephemeris centuries since J2000.0.
#[must_use]
pub fn ecliptic(t: f64) -> LunarPosition {
    let (lp, d, m, mp, f) = fundamental_arguments(t);

    // Terms involving M shrink with the decreasing eccentricity of Earth's orbit.
    let e = 1.0 - 0.002516 * t - 0.0000074 * t * t;
    let eccentricity_factor = |m_multiple: f64| match m_multiple.abs() as i32 {
        1 => e,
        2 => e * e,
        _ => 1.0,
    };

    let (mut sum_l, sum_r) = TERMS_LR.iter().fold(
        (0.0, 0.0),
        |(sum_l, sum_r), &(td, tm, tmp, tf, cl, cr)| {
            let arg = degrees_to_radians(td * d + tm * m + tmp * mp + tf * f);
            let factor = eccentricity_factor(tm);
            (
                sum_l + cl * factor * arg.sin(),
                sum_r + cr * factor * arg.cos(),
            )
        },
    );

    let mut sum_b = TERMS_B.iter().fold(0.0, |sum_b, &(td, tm, tmp, tf, cb)| {
        let arg = degrees_to_radians(td * d + tm * m + tmp * mp + tf * f);
        sum_b + cb * eccentricity_factor(tm) * arg.sin()
    });

    // Action of Venus (A1), Jupiter (A2) and the flattening of the Earth (A3).
    let a1 = degrees_to_radians(normalize_degrees_0_to_360(119.75 + 131.849 * t));
    let a2 = degrees_to_radians(normalize_degrees_0_to_360(53.09 + 479264.290 * t));
    let a3 = degrees_to_radians(normalize_degrees_0_to_360(313.45 + 481266.484 * t));
    let (lp_r, mp_r, f_r) = (
        degrees_to_radians(lp),
        degrees_to_radians(mp),
        degrees_to_radians(f),
    );

    sum_l += 3958.0 * a1.sin() + 1962.0 * (lp_r - f_r).sin() + 318.0 * a2.sin();
    sum_b += -2235.0 * lp_r.sin()
        + 382.0 * a3.sin()
        + 175.0 * (a1 - f_r).sin()
        + 175.0 * (a1 + f_r).sin()
        + 127.0 * (lp_r - mp_r).sin()
        - 115.0 * (lp_r + mp_r).sin();

    LunarPosition {
        longitude: normalize_degrees_0_to_360(lp + sum_l / 1_000_000.0),
        latitude: sum_b / 1_000_000.0,
        distance_km: 385000.56 + sum_r / 1000.0,
    }
}

/// Mean obliquity of the ecliptic in degrees (Meeus 22.2).
fn mean_obliquity(t: f64) -> f64 {
    polynomial(
        &[23.439291111, -0.013004167, -1.639e-7, 5.036e-7],
        t,
    )
}

/// Greenwich mean sidereal time in degrees (Meeus 12.4).
fn greenwich_sidereal_time(jd: &JulianDate) -> f64 {
    let t = jd.julian_century();
    normalize_degrees_0_to_360(
        280.46061837 + 360.98564736629 * (jd.julian_date() - J2000_JDN) + 0.000387933 * t * t
            - t * t * t / 38710000.0,
    )
}

/// Topocentric altitude of the Moon's centre in degrees (no refraction) and its distance.
#[must_use]
pub fn altitude(jd: &JulianDate, observer: &Observer) -> (f64, f64) {
    let t = jd.julian_ephemeris_century();
    let position = ecliptic(t);

    let lambda = degrees_to_radians(position.longitude);
    let beta = degrees_to_radians(position.latitude);
    let epsilon = degrees_to_radians(mean_obliquity(t));

    let alpha = (lambda.sin() * epsilon.cos() - beta.tan() * epsilon.sin()).atan2(lambda.cos());
    let delta = (beta.sin() * epsilon.cos() + beta.cos() * epsilon.sin() * lambda.sin()).asin();

    let hour_angle = degrees_to_radians(greenwich_sidereal_time(jd) + observer.longitude())
        - alpha;
    let phi = degrees_to_radians(observer.latitude());
    let geocentric =
        (phi.sin() * delta.sin() + phi.cos() * delta.cos() * hour_angle.cos()).asin();

    let horizontal_parallax = ((EARTH_EQUATORIAL_RADIUS_KM + observer.elevation() / 1000.0)
        / position.distance_km)
        .asin();
    let topocentric = geocentric - horizontal_parallax * geocentric.cos();

    (radians_to_degrees(topocentric), position.distance_km)
}

/// Altitude of the Moon's centre at rise and set for the given distance:
/// refraction plus the apparent semidiameter, below the horizon.
#[must_use]
pub fn horizon_altitude(distance_km: f64) -> f64 {
    let semidiameter = radians_to_degrees((MOON_RADIUS_KM / distance_km).asin());
    -(HORIZON_REFRACTION + semidiameter)
}
