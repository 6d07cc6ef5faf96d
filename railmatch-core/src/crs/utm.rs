//! WGS84 -> UTM (northern hemisphere) transverse Mercator projection.

const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;

/// central meridian of a UTM zone in degrees.
pub fn central_meridian(zone: u8) -> f64 {
    (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0
}

/// projects WGS84 longitude/latitude in degrees into (easting, northing) in meters
/// for the given northern UTM zone.
pub fn wgs84_to_utm_north(lon: f64, lat: f64, zone: u8) -> (f64, f64) {
    let e2 = FLATTENING * (2.0 - FLATTENING);
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let ep2 = e2 / (1.0 - e2);

    let phi = lat.to_radians();
    let lambda = lon.to_radians();
    let lambda0 = central_meridian(zone).to_radians();

    let (sin_phi, cos_phi) = phi.sin_cos();
    let tan_phi = phi.tan();

    let n = SEMI_MAJOR_AXIS / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = tan_phi * tan_phi;
    let c = ep2 * cos_phi * cos_phi;
    let a = (lambda - lambda0) * cos_phi;

    let m = SEMI_MAJOR_AXIS
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin());

    let easting = SCALE_FACTOR
        * n
        * (a + (1.0 - t + c) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0)
        + FALSE_EASTING;
    let northing = SCALE_FACTOR
        * (m + n
            * tan_phi
            * (a * a / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));
    (easting, northing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equator_on_central_meridian() {
        let (e, n) = wgs84_to_utm_north(9.0, 0.0, 32);
        assert!((e - FALSE_EASTING).abs() < 1e-6);
        assert!(n.abs() < 1e-6);
    }

    #[test]
    fn test_easting_symmetric_about_central_meridian() {
        let (e_west, n_west) = wgs84_to_utm_north(8.0, 47.0, 32);
        let (e_east, n_east) = wgs84_to_utm_north(10.0, 47.0, 32);
        assert!(((FALSE_EASTING - e_west) - (e_east - FALSE_EASTING)).abs() < 1e-6);
        assert!((n_west - n_east).abs() < 1e-6);
    }

    #[test]
    fn test_zurich_zone_32() {
        // Zürich HB, roughly (465_600, 5_247_500) in EPSG:32632
        let (e, n) = wgs84_to_utm_north(8.5403, 47.3779, 32);
        assert!((e - 465_600.0).abs() < 1_000.0, "easting {e}");
        assert!((n - 5_247_500.0).abs() < 1_000.0, "northing {n}");
    }
}
