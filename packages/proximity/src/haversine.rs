//! Great-circle distance on a spherical Earth.

use hdb_resale_proximity_models::Coordinates;

/// Mean Earth radius used for all distance features, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points given in degrees, in
/// kilometres, using [`EARTH_RADIUS_KM`].
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine_with_radius(lat1, lon1, lat2, lon2, EARTH_RADIUS_KM)
}

/// Great-circle distance between two points given in degrees on a sphere
/// of `radius_km`.
///
/// The haversine term is clamped to `[0, 1]` so that rounding near
/// antipodal points cannot push `asin` out of its domain. NaN inputs give
/// a NaN distance.
#[must_use]
pub fn haversine_with_radius(lat1: f64, lon1: f64, lat2: f64, lon2: f64, radius_km: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let half_dphi = (lat2 - lat1).to_radians() / 2.0;
    let half_dlambda = (lon2 - lon1).to_radians() / 2.0;

    // Fused multiply-add would make the result depend on argument order.
    #[allow(clippy::suboptimal_flops)]
    let a = half_dphi.sin().powi(2) + phi1.cos() * phi2.cos() * half_dlambda.sin().powi(2);

    2.0 * radius_km * a.clamp(0.0, 1.0).sqrt().asin()
}

/// [`haversine_km`] between two coordinate pairs.
#[must_use]
pub fn distance_km(from: Coordinates, to: Coordinates) -> f64 {
    haversine_km(from.latitude, from.longitude, to.latitude, to.longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINTS: &[(f64, f64)] = &[
        (1.3, 103.8),
        (1.35, 103.85),
        (0.0, 0.0),
        (-33.8688, 151.2093),
        (51.5074, -0.1278),
        (89.9, 179.9),
        (-90.0, -180.0),
    ];

    #[test]
    fn distance_to_self_is_zero() {
        for &(lat, lon) in POINTS {
            assert!(
                haversine_km(lat, lon, lat, lon).abs() < f64::EPSILON,
                "non-zero self distance at ({lat}, {lon})"
            );
        }
    }

    #[test]
    fn distance_is_symmetric() {
        for &(lat1, lon1) in POINTS {
            for &(lat2, lon2) in POINTS {
                let ab = haversine_km(lat1, lon1, lat2, lon2);
                let ba = haversine_km(lat2, lon2, lat1, lon1);
                assert!((ab - ba).abs() < 1e-9, "asymmetric: {ab} vs {ba}");
            }
        }
    }

    #[test]
    fn nearby_singapore_points() {
        // 0.05 degrees in both directions near the equator.
        let d = haversine_km(1.3, 103.8, 1.35, 103.85);
        assert!(d > 7.8 && d < 7.9, "unexpected distance {d}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.195).abs() < 1e-3, "unexpected distance {d}");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        let d = haversine_km(0.0, 0.0, 0.0, 180.0);
        assert!((d - half).abs() < 1e-6, "unexpected distance {d}");
        let d = haversine_km(45.0, 10.0, -45.0, -170.0);
        assert!(d.is_finite());
        assert!((d - half).abs() < 1e-6, "unexpected distance {d}");
    }

    #[test]
    fn custom_radius_scales_linearly() {
        let unit = haversine_with_radius(1.3, 103.8, 1.35, 103.85, 1.0);
        let earth = haversine_km(1.3, 103.8, 1.35, 103.85);
        assert!((unit * EARTH_RADIUS_KM - earth).abs() < 1e-9);
    }

    #[test]
    fn nan_input_gives_nan() {
        assert!(haversine_km(f64::NAN, 103.8, 1.3, 103.8).is_nan());
    }

    #[test]
    fn coordinate_form_matches_degree_form() {
        let a = Coordinates::new(1.3, 103.8);
        let b = Coordinates::new(1.35, 103.85);
        assert!((distance_km(a, b) - haversine_km(1.3, 103.8, 1.35, 103.85)).abs() < f64::EPSILON);
    }
}
