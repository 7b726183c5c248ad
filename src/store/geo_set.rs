//! Geospatial set backed by an R*-tree.
//!
//! Radius searches run in two passes:
//!
//! 1. **Envelope pruning**: the circle is bounded by a lon/lat box (the
//!    longitude span of a spherical cap around the center) and the R-tree
//!    returns only points inside that box.
//! 2. **Exact filtering**: candidates are kept when their haversine distance
//!    to the center is at most the radius.
//!
//! When the box would cross the antimeridian or a pole the longitude span
//! falls back to the whole globe; the exact filter keeps results correct.

use geo::{Distance, Haversine, HaversineMeasure, Point};
use rstar::{AABB, RTree};
use rustc_hash::FxHashMap;

/// Point stored in the R-tree, tagged with its member name.
#[derive(Debug, Clone, PartialEq)]
struct IndexedPoint {
    lon: f64,
    lat: f64,
    member: String,
}

impl IndexedPoint {
    fn new(member: String, point: Point) -> Self {
        Self {
            lon: point.x(),
            lat: point.y(),
            member,
        }
    }

    fn corner(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat,
            member: String::new(),
        }
    }
}

impl rstar::Point for IndexedPoint {
    type Scalar = f64;
    const DIMENSIONS: usize = 2;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Self::corner(generator(0), generator(1))
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        match index {
            0 => self.lon,
            1 => self.lat,
            _ => unreachable!(),
        }
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        match index {
            0 => &mut self.lon,
            1 => &mut self.lat,
            _ => unreachable!(),
        }
    }
}

#[derive(Default)]
pub struct GeoSet {
    tree: RTree<IndexedPoint>,
    positions: FxHashMap<String, Point>,
}

impl GeoSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or move a member. Returns true if the member is new.
    pub fn insert(&mut self, member: String, point: Point) -> bool {
        let previous = self.positions.insert(member.clone(), point);
        if let Some(old) = previous {
            self.tree.remove(&IndexedPoint::new(member.clone(), old));
        }
        self.tree.insert(IndexedPoint::new(member, point));
        previous.is_none()
    }

    pub fn position(&self, member: &str) -> Option<Point> {
        self.positions.get(member).copied()
    }

    pub fn members(&self) -> impl Iterator<Item = &str> + '_ {
        self.positions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Members within `radius_m` meters of `center`, boundary included.
    pub fn within_radius(&self, center: Point, radius_m: f64) -> Vec<String> {
        if !radius_m.is_finite() || radius_m < 0.0 {
            log::warn!("Rejecting radius search with radius {}", radius_m);
            return Vec::new();
        }

        let envelope = radius_envelope(center, radius_m);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|candidate| {
                let point = Point::new(candidate.lon, candidate.lat);
                Haversine.distance(center, point) <= radius_m
            })
            .map(|candidate| candidate.member.clone())
            .collect()
    }
}

/// Lon/lat box containing every point within `radius_m` of `center`.
fn radius_envelope(center: Point, radius_m: f64) -> AABB<IndexedPoint> {
    let angular = radius_m / HaversineMeasure::GRS80_MEAN_RADIUS.radius();
    let lat_degrees = angular.to_degrees();
    let min_lat = center.y() - lat_degrees;
    let max_lat = center.y() + lat_degrees;

    // Longitude half-width of a spherical cap; undefined once the cap reaches a pole.
    let sin_ratio = angular.sin() / center.y().to_radians().cos();
    let (min_lon, max_lon) = if angular >= std::f64::consts::FRAC_PI_2
        || !sin_ratio.is_finite()
        || sin_ratio >= 1.0
        || min_lat < -90.0
        || max_lat > 90.0
    {
        (f64::MIN, f64::MAX)
    } else {
        let lon_degrees = sin_ratio.asin().to_degrees();
        let min_lon = center.x() - lon_degrees;
        let max_lon = center.x() + lon_degrees;
        if min_lon < -180.0 || max_lon > 180.0 {
            (f64::MIN, f64::MAX)
        } else {
            (min_lon, max_lon)
        }
    };

    AABB::from_corners(
        IndexedPoint::corner(min_lon, min_lat),
        IndexedPoint::corner(max_lon, max_lat),
    )
}
