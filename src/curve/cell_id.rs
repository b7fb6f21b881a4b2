//! Cell ids on the S2 curve.
//!
//! [`CellId`] wraps [`s2::cellid::CellID`] so the rest of the crate deals in
//! `u8` levels and the signed value stored in the `geohash` column. The
//! layout is the standard S2 one:
//!
//! ```text
//! | face (3) | 30 x (i bit, j bit) along the Hilbert curve | sentinel 1 | zeros |
//! ```
//!
//! All leaves below a cell form the contiguous id range
//! `[range_min, range_max]`. Faces 4 and 5 have the top bit set and are
//! negative when stored as `i64`.

use std::fmt;

use s2::{cellid::CellID, latlng::LatLng};
use serde::{Deserialize, Serialize};

use crate::GeoPoint;

/// Deepest level; leaf cells are about 1 cm wide.
pub const MAX_LEVEL: u8 = 30;

/// Number of cube faces; face cells are the level-0 roots.
pub const NUM_FACES: u8 = 6;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u64);

////////////////////////////////////////////////////////////////////////////////
// Own methods
////////////////////////////////////////////////////////////////////////////////

impl CellId {
    /// Leaf cell holding `point`.
    ///
    /// Total over `f64`: latitudes are clamped to the poles and NaN is
    /// treated as zero.
    pub fn from_point(point: &GeoPoint) -> Self {
        let lat = if point.lat.is_nan() {
            0.0
        } else {
            point.lat.clamp(-90.0, 90.0)
        };
        let lon = if point.lon.is_finite() { point.lon } else { 0.0 };
        let ll = LatLng::from_degrees(lat, lon);
        CellId::from(CellID::from(&ll))
    }

    /// Level-0 cell of cube face `face` (0..=5).
    pub fn from_face(face: u8) -> Self {
        CellId::from(CellID::from_face(u64::from(face)))
    }

    pub fn from_i64(v: i64) -> Self {
        CellId(v as u64)
    }

    /// Value stored in the sortable `geohash` column.
    #[inline]
    pub fn as_i64(self) -> i64 {
        self.0 as i64
    }

    #[inline]
    pub fn to_s2(self) -> CellID {
        CellID(self.0)
    }

    pub fn is_valid(self) -> bool {
        self.to_s2().is_valid()
    }

    pub fn face(self) -> u8 {
        self.to_s2().face() as u8
    }

    pub fn level(self) -> u8 {
        self.to_s2().level() as u8
    }

    pub fn is_leaf(self) -> bool {
        self.0 & 1 == 1
    }

    /// Smallest leaf id below this cell.
    pub fn range_min(self) -> CellId {
        CellId::from(self.to_s2().range_min())
    }

    /// Largest leaf id below this cell.
    pub fn range_max(self) -> CellId {
        CellId::from(self.to_s2().range_max())
    }

    pub fn contains(
        self,
        other: CellId,
    ) -> bool {
        self.to_s2().contains(&other.to_s2())
    }

    /// Ancestor at `level`; `self` when `level` is not coarser.
    pub fn parent(
        self,
        level: u8,
    ) -> CellId {
        if level >= self.level() {
            return self;
        }
        CellId::from(self.to_s2().parent(u64::from(level)))
    }

    /// The four children in curve order; empty for leaves.
    pub fn children(self) -> Vec<CellId> {
        if self.is_leaf() {
            return Vec::new();
        }
        self.to_s2()
            .children()
            .iter()
            .map(|c| CellId::from(*c))
            .collect()
    }
}

impl fmt::Debug for CellId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "CellId({}, face {}, level {})",
            self.to_s2().to_token(),
            self.face(),
            self.level()
        )
    }
}

impl fmt::Display for CellId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

impl From<CellID> for CellId {
    fn from(cell: CellID) -> Self {
        CellId(cell.0)
    }
}

impl From<&GeoPoint> for CellId {
    fn from(point: &GeoPoint) -> Self {
        CellId::from_point(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_point_is_deterministic() {
        let p = GeoPoint::new(52.1, 2.0);
        assert_eq!(CellId::from_point(&p), CellId::from_point(&p));
        assert!(CellId::from_point(&p).is_leaf());
        assert_eq!(CellId::from_point(&p).level(), MAX_LEVEL);
    }

    /// Ids must match what other S2 implementations write into existing
    /// tables.
    #[test]
    fn test_leaf_id_matches_stored_rows() {
        let id = CellId::from_point(&GeoPoint::new(52.1, 2.0));
        assert_eq!(id.as_i64(), 5177531549489041509);
        assert_eq!(crate::curve::generate_hash_key(id.as_i64(), 6), 517753);
    }

    #[test]
    fn test_face_sign() {
        // Faces 0..=3 are positive, 4 and 5 negative.
        let gulf_of_guinea = CellId::from_point(&GeoPoint::new(4.0, 3.4));
        let paris = CellId::from_point(&GeoPoint::new(48.8566, 2.3522));
        let americas = CellId::from_point(&GeoPoint::new(40.7, -74.0));
        let south_pole = CellId::from_point(&GeoPoint::new(-89.0, 10.0));
        assert_eq!(gulf_of_guinea.face(), 0);
        assert!(gulf_of_guinea.as_i64() > 0);
        assert_eq!(paris.face(), 2);
        assert!(paris.as_i64() > 0);
        assert_eq!(americas.face(), 4);
        assert!(americas.as_i64() < 0);
        assert_eq!(south_pole.face(), 5);
        assert!(south_pole.as_i64() < 0);
    }

    #[test]
    fn test_poles_and_antimeridian_do_not_panic() {
        let cells = [
            GeoPoint::new(90.0, 0.0),
            GeoPoint::new(-90.0, 0.0),
            GeoPoint::new(0.0, 180.0),
            GeoPoint::new(0.0, -180.0),
            GeoPoint::new(0.0, 179.9),
            GeoPoint::new(0.0, -179.9),
            GeoPoint::new(f64::NAN, f64::NAN),
            GeoPoint::new(120.0, 400.0),
        ]
        .map(|p| CellId::from_point(&p));
        assert_ne!(cells[0], cells[1]);
        for c in cells {
            assert!(c.is_valid() && c.is_leaf(), "{c:?}");
        }
    }

    #[test]
    fn test_face_cells_partition_the_id_space() {
        let faces: Vec<CellId> = (0..NUM_FACES).map(CellId::from_face).collect();
        for (k, face) in faces.iter().enumerate() {
            assert_eq!(face.level(), 0);
            assert_eq!(face.face() as usize, k);
        }
        for w in faces.windows(2) {
            assert_eq!(w[0].range_max().0 + 2, w[1].range_min().0);
        }
        assert_eq!(faces[3].range_max().as_i64(), i64::MAX);
        assert_eq!(faces[4].range_min().as_i64(), i64::MIN + 1);
    }

    #[test]
    fn test_parent_and_children_are_consistent() {
        let leaf = CellId::from_point(&GeoPoint::new(51.51, -0.13));
        for level in 0..MAX_LEVEL {
            let cell = leaf.parent(level);
            assert_eq!(cell.level(), level);
            assert!(cell.contains(leaf));
            let children = cell.children();
            assert_eq!(children.len(), 4);
            assert_eq!(children[0].range_min(), cell.range_min());
            assert_eq!(children[3].range_max(), cell.range_max());
            assert_eq!(children.iter().filter(|c| c.contains(leaf)).count(), 1);
            for w in children.windows(2) {
                assert_eq!(w[0].range_max().0 + 2, w[1].range_min().0);
            }
        }
        assert!(leaf.children().is_empty());
        assert_eq!(leaf.parent(MAX_LEVEL), leaf);
    }

    #[test]
    fn test_leaf_range_is_itself() {
        let leaf = CellId::from_point(&GeoPoint::new(13.361389, 38.115556));
        assert_eq!(leaf.range_min(), leaf);
        assert_eq!(leaf.range_max(), leaf);
        assert!(!leaf.parent(12).contains(CellId::from_point(&GeoPoint::new(-13.0, -38.0))));
    }

    #[test]
    fn test_i64_conversion_keeps_bits() {
        let cell = CellId::from_point(&GeoPoint::new(-33.8688, 151.2093)).parent(10);
        assert_eq!(CellId::from_i64(cell.as_i64()), cell);
        assert_eq!(format!("{cell}"), cell.as_i64().to_string());
    }
}
