//! HK1980 Grid to WGS84 conversion.
//!
//! The grid is a transverse Mercator projection on the Hong Kong 1980 datum
//! (International 1924 ellipsoid), followed by a fixed 7-parameter Helmert
//! shift to WGS84. All formulas are closed form: the footpoint latitude uses
//! the standard series expansion and the geocentric-to-geodetic step uses
//! Bowring's method, so no iteration is involved.

use crate::error::ConversionError;

// International 1924 (Hayford) ellipsoid, the HK80 reference surface.
const INTL_A: f64 = 6378388.0;
const INTL_F: f64 = 1.0 / 297.0;

// WGS84 ellipsoid.
const WGS84_A: f64 = 6378137.0;
const WGS84_F: f64 = 1.0 / 298.257223563;

// HK1980 Grid projection: origin 22°18'43.68"N 114°10'42.80"E, unit scale,
// false origin 836694.05 mE / 819069.80 mN.
const ORIGIN_LAT_DEG: f64 = 22.0 + 18.0 / 60.0 + 43.68 / 3600.0;
const ORIGIN_LON_DEG: f64 = 114.0 + 10.0 / 60.0 + 42.80 / 3600.0;
const SCALE_FACTOR: f64 = 1.0;
const FALSE_EASTING: f64 = 836_694.05;
const FALSE_NORTHING: f64 = 819_069.80;

// Position-vector Helmert parameters, HK80 -> WGS84. Translations in meters,
// rotations in arc-seconds, scale in ppm. Reproduces the published rule of
// thumb (WGS84 is about 5.5" south and 8.8" east of HK80).
const HELMERT_TX: f64 = -162.619;
const HELMERT_TY: f64 = -276.959;
const HELMERT_TZ: f64 = -161.764;
const HELMERT_RX_SEC: f64 = 0.067753;
const HELMERT_RY_SEC: f64 = -2.243649;
const HELMERT_RZ_SEC: f64 = -1.158827;
const HELMERT_SCALE_PPM: f64 = -1.094246;

/// Plausible WGS84 bounds of the supported region. Grid input that converts
/// outside this box is garbage, not a Hong Kong location.
pub const REGION_LAT_MIN: f64 = 22.13;
pub const REGION_LAT_MAX: f64 = 22.62;
pub const REGION_LON_MIN: f64 = 113.81;
pub const REGION_LON_MAX: f64 = 114.51;

const ARCSEC_TO_RAD: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Convert HK1980 Grid easting/northing (meters) to WGS84 lat/lon (degrees).
///
/// Pure and deterministic; fails only for non-finite input or input that
/// lands outside the supported region.
pub fn to_geographic(x: f64, y: f64) -> Result<GeoPoint, ConversionError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(ConversionError::NonFinite { x, y });
    }

    let (lat_hk80, lon_hk80) = inverse_transverse_mercator(x, y);
    let (gx, gy, gz) = geodetic_to_geocentric(INTL_A, INTL_F, lat_hk80, lon_hk80);
    let (wx, wy, wz) = helmert_to_wgs84(gx, gy, gz);
    let (lat, lon) = geocentric_to_geodetic(WGS84_A, WGS84_F, wx, wy, wz);

    let point = GeoPoint {
        lat: lat.to_degrees(),
        lon: lon.to_degrees(),
    };
    if point.lat < REGION_LAT_MIN
        || point.lat > REGION_LAT_MAX
        || point.lon < REGION_LON_MIN
        || point.lon > REGION_LON_MAX
    {
        return Err(ConversionError::OutsideRegion { x, y });
    }
    Ok(point)
}

fn eccentricity_sq(f: f64) -> f64 {
    2.0 * f - f * f
}

/// Meridian arc length from the equator to latitude `phi` (radians).
fn meridian_arc(a: f64, es: f64, phi: f64) -> f64 {
    a * ((1.0 - es / 4.0 - 3.0 * es * es / 64.0 - 5.0 * es * es * es / 256.0) * phi
        - (3.0 * es / 8.0 + 3.0 * es * es / 32.0 + 45.0 * es * es * es / 1024.0)
            * (2.0 * phi).sin()
        + (15.0 * es * es / 256.0 + 45.0 * es * es * es / 1024.0) * (4.0 * phi).sin()
        - (35.0 * es * es * es / 3072.0) * (6.0 * phi).sin())
}

/// Inverse transverse Mercator on the International 1924 ellipsoid.
/// Returns HK80-datum latitude/longitude in radians.
fn inverse_transverse_mercator(easting: f64, northing: f64) -> (f64, f64) {
    let es = eccentricity_sq(INTL_F);
    let ep2 = es / (1.0 - es);
    let lat0 = ORIGIN_LAT_DEG.to_radians();
    let lon0 = ORIGIN_LON_DEG.to_radians();

    let m0 = meridian_arc(INTL_A, es, lat0);
    let m = m0 + (northing - FALSE_NORTHING) / SCALE_FACTOR;
    let mu = m / (INTL_A * (1.0 - es / 4.0 - 3.0 * es * es / 64.0 - 5.0 * es * es * es / 256.0));

    // Footpoint latitude from the rectifying-latitude series.
    let e1 = (1.0 - (1.0 - es).sqrt()) / (1.0 + (1.0 - es).sqrt());
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin1 = phi1.sin();
    let cos1 = phi1.cos();
    let tan1 = phi1.tan();
    let c1 = ep2 * cos1 * cos1;
    let t1 = tan1 * tan1;
    let n1 = INTL_A / (1.0 - es * sin1 * sin1).sqrt();
    let r1 = INTL_A * (1.0 - es) / (1.0 - es * sin1 * sin1).powf(1.5);
    let d = (easting - FALSE_EASTING) / (n1 * SCALE_FACTOR);

    let lat = phi1
        - (n1 * tan1 / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);
    let lon = lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos1;

    (lat, lon)
}

/// Geodetic (radians, ellipsoid height 0) to geocentric cartesian.
fn geodetic_to_geocentric(a: f64, f: f64, lat: f64, lon: f64) -> (f64, f64, f64) {
    let es = eccentricity_sq(f);
    let n = a / (1.0 - es * lat.sin() * lat.sin()).sqrt();
    let x = n * lat.cos() * lon.cos();
    let y = n * lat.cos() * lon.sin();
    let z = n * (1.0 - es) * lat.sin();
    (x, y, z)
}

/// Seven-parameter position-vector Helmert transformation to WGS84.
fn helmert_to_wgs84(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let s = 1.0 + HELMERT_SCALE_PPM * 1e-6;
    let rx = HELMERT_RX_SEC * ARCSEC_TO_RAD;
    let ry = HELMERT_RY_SEC * ARCSEC_TO_RAD;
    let rz = HELMERT_RZ_SEC * ARCSEC_TO_RAD;
    (
        s * (x - rz * y + ry * z) + HELMERT_TX,
        s * (rz * x + y - rx * z) + HELMERT_TY,
        s * (-ry * x + rx * y + z) + HELMERT_TZ,
    )
}

/// Geocentric cartesian to geodetic latitude/longitude (radians) via
/// Bowring's closed formula. Height is discarded.
fn geocentric_to_geodetic(a: f64, f: f64, x: f64, y: f64, z: f64) -> (f64, f64) {
    let es = eccentricity_sq(f);
    let b = a * (1.0 - f);
    let ep2 = (a * a - b * b) / (b * b);
    let p = x.hypot(y);
    let theta = (z * a).atan2(p * b);
    let lat = (z + ep2 * b * theta.sin().powi(3)).atan2(p - es * a * theta.cos().powi(3));
    let lon = y.atan2(x);
    (lat, lon)
}
