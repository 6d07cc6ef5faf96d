//! approximate WGS84 -> CH1903+/LV95 conversion published by swisstopo.
//! accuracy is on the order of one meter inside Switzerland.

/// converts WGS84 longitude/latitude in degrees into LV95 (easting, northing) in meters.
pub fn wgs84_to_lv95(lon: f64, lat: f64) -> (f64, f64) {
    // auxiliary values are differences to Bern in units of 10000"
    let phi = (lat * 3600.0 - 169028.66) / 10000.0;
    let lambda = (lon * 3600.0 - 26782.5) / 10000.0;

    let easting = 2600072.37 + 211455.93 * lambda
        - 10938.51 * lambda * phi
        - 0.36 * lambda * phi.powi(2)
        - 44.54 * lambda.powi(3);
    let northing = 1200147.07 + 308807.95 * phi + 3745.25 * lambda.powi(2) + 76.63 * phi.powi(2)
        - 194.56 * lambda.powi(2) * phi
        + 119.79 * phi.powi(3);
    (easting, northing)
}
