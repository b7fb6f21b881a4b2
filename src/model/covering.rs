use crate::{curve::CellId, model::GeohashRange};

/// The cells chosen to cover one query region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Covering {
    cell_ids: Vec<CellId>,
}

impl Covering {
    pub fn new(cell_ids: Vec<CellId>) -> Self {
        Self { cell_ids }
    }

    /// Leaf ranges of every cell, each split at partition boundaries.
    ///
    /// Ranges come out in cell order, and ascending within a cell.
    pub fn get_geohash_ranges(
        &self,
        hash_key_length: usize,
    ) -> Vec<GeohashRange> {
        self.cell_ids
            .iter()
            .flat_map(|cell| {
                GeohashRange::new(cell.range_min().as_i64(), cell.range_max().as_i64())
                    .try_split(hash_key_length)
            })
            .collect()
    }

    pub fn number_of_cells(&self) -> usize {
        self.cell_ids.len()
    }

    pub fn cell_ids(&self) -> &[CellId] {
        &self.cell_ids
    }
}
