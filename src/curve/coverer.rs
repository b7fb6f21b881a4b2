//! Region covering.
//!
//! The query engine only needs *some* conservative covering: a set of cells
//! whose leaves include every leaf inside the region. [`RegionCoverer`] is the
//! seam for plugging in a different search; [`S2Coverer`] is the built-in one
//! and delegates to the `s2` crate's coverer.

use s2::region::RegionCoverer as S2RegionCoverer;
use serde::{Deserialize, Serialize};

use super::cell_id::{CellId, MAX_LEVEL};
use crate::{
    error::{GeoError, GeoResult},
    geo::LatLngRect,
};

/// Padding added to the region before covering, radians.
///
/// Rounding may then only add cells to a covering, never drop one.
const REGION_PADDING_RAD: f64 = 1e-9;

/// Tuning knobs for a covering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverOptions {
    /// Cells coarser than this are always subdivided.
    pub min_level: u8,
    /// Cells are never subdivided past this level.
    pub max_level: u8,
    /// Soft cap on the number of cells; exceeded only to honour `min_level`.
    pub max_cells: usize,
}

impl Default for CoverOptions {
    fn default() -> Self {
        Self {
            min_level: 0,
            max_level: 30,
            max_cells: 8,
        }
    }
}

impl CoverOptions {
    pub fn validate(&self) -> GeoResult<()> {
        if self.max_level > MAX_LEVEL {
            return Err(GeoError::InvalidCoverOptions(format!(
                "max_level {} exceeds {MAX_LEVEL}",
                self.max_level
            )));
        }
        if self.min_level > self.max_level {
            return Err(GeoError::InvalidCoverOptions(format!(
                "min_level {} is greater than max_level {}",
                self.min_level, self.max_level
            )));
        }
        if self.max_cells == 0 {
            return Err(GeoError::InvalidCoverOptions(
                "max_cells must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Produces a conservative covering of a region.
pub trait RegionCoverer: Send + Sync {
    /// Cells whose leaf descendants include every point of `region`.
    fn cover(
        &self,
        region: &LatLngRect,
        options: &CoverOptions,
    ) -> Vec<CellId>;
}

/// S2 region coverer bounded by [`CoverOptions`].
#[derive(Debug, Default, Clone, Copy)]
pub struct S2Coverer;

impl RegionCoverer for S2Coverer {
    fn cover(
        &self,
        region: &LatLngRect,
        options: &CoverOptions,
    ) -> Vec<CellId> {
        if region.is_empty() {
            return Vec::new();
        }
        let max_level = options.max_level.min(MAX_LEVEL);
        let coverer = S2RegionCoverer {
            min_level: options.min_level.min(max_level),
            max_level,
            level_mod: 1,
            max_cells: options.max_cells.max(1),
        };

        let rect = region.to_s2_padded(REGION_PADDING_RAD);
        let mut cells: Vec<CellId> = coverer
            .covering(&rect)
            .0
            .into_iter()
            .map(CellId::from)
            .collect();
        cells.sort_unstable();
        cells.dedup();
        cells
    }
}
