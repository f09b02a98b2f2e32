//! Nearest-neighbor maintenance for a single query row
//!
//! Keeps the k smallest distances seen so far in an ordered buffer with a
//! trailing fence slot. Insertion sort is enough since k is small. Rows that
//! tie with the k-th distance grow the buffer past k, so a cutoff never falls
//! arbitrarily inside a group of equidistant rows.

use crate::distance::MixedDistance;
use crate::error::{KnnCvError, Result};

/// One slot of the neighbor buffer.
///
/// `row` is `None` for sentinel slots that have not been filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub distance: f64,
    pub row: Option<usize>,
}

/// Bounded ordered list of candidate neighbors.
///
/// Invariant: `slots.len() == kn + 1`, where `kn >= k` is the number of
/// candidate slots and the last slot is the fence.
#[derive(Debug, Clone)]
pub struct NeighborBuffer {
    slots: Vec<Neighbor>,
    k: usize,
    kn: usize,
    capacity: usize,
    ceiling: f64,
    fuzz: f64,
}

impl NeighborBuffer {
    /// Create an empty buffer for `k` neighbors.
    ///
    /// `k` must be at least 1 and `k + 2 <= capacity`; `KnnCvConfig::validate`
    /// enforces both.
    pub fn new(k: usize, capacity: usize, ceiling: f64, fuzz: f64) -> Self {
        let mut buffer = Self {
            slots: Vec::with_capacity(k + 2),
            k,
            kn: k,
            capacity,
            ceiling,
            fuzz,
        };
        buffer.reset();
        buffer
    }

    fn fence(&self) -> Neighbor {
        Neighbor {
            distance: self.ceiling,
            row: None,
        }
    }

    /// Clear the buffer for a new query row
    pub fn reset(&mut self) {
        self.kn = self.k;
        let fence = self.fence();
        self.slots.clear();
        self.slots.resize(self.k + 1, fence);
    }

    /// Current k-th smallest distance (the ceiling while fewer than k rows were seen)
    pub fn kth_distance(&self) -> f64 {
        self.slots[self.k - 1].distance
    }

    /// Number of candidate slots, k plus any tie extension
    pub fn n_candidates(&self) -> usize {
        self.kn
    }

    /// Offer a candidate row at the given distance.
    ///
    /// Fails with [`KnnCvError::TooManyTies`] when tie extension would need
    /// more slots than the capacity allows.
    pub fn offer(&mut self, distance: f64, row: usize) -> Result<()> {
        let kth = self.kth_distance();
        if distance > kth * (1.0 + self.fuzz) {
            return Ok(());
        }

        // Strict comparison: an equal distance goes after the rows already held
        let Some(slot) = self.slots.iter().position(|n| distance < n.distance) else {
            return Ok(());
        };

        self.slots.insert(slot, Neighbor { distance, row: Some(row) });
        self.slots.pop();

        let fence = self.fence();
        // While filling, sentinels tie the k-th slot at the ceiling, which
        // reserves spare slots for rows later pushed out of slot k - 1
        if self.slots[self.kn].distance <= self.kth_distance() {
            self.kn += 1;
            if self.kn + 1 >= self.capacity {
                return Err(KnnCvError::TooManyTies {
                    capacity: self.capacity,
                });
            }
            self.slots.push(fence);
        } else {
            self.slots[self.kn] = fence;
        }
        Ok(())
    }

    /// Slots that take part in the vote: the first k plus the extra slots
    /// within the fuzz tolerance of the k-th distance. Anything further out
    /// is discarded.
    pub fn retained(&self) -> &[Neighbor] {
        let limit = self.kth_distance() * (1.0 + self.fuzz);
        let extras = self.slots[self.k..self.kn]
            .iter()
            .take_while(|n| n.distance <= limit)
            .count();
        &self.slots[..self.k + extras]
    }

    /// Rows of the retained slots, in ascending distance order
    pub fn voters(&self) -> impl Iterator<Item = usize> + '_ {
        self.retained().iter().filter_map(|n| n.row)
    }
}

/// Scan every row except `query` in ascending index order, keeping its
/// nearest neighbors in `buffer`.
pub fn collect_neighbors(
    distance: &MixedDistance<'_>,
    query: usize,
    n_rows: usize,
    buffer: &mut NeighborBuffer,
) -> Result<()> {
    buffer.reset();
    for candidate in (0..n_rows).filter(|&j| j != query) {
        buffer.offer(distance.between(query, candidate), candidate)?;
    }
    Ok(())
}
