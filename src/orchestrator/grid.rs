//! Target-rate × payload-size layout of the correlated results.

use crate::model::RequestResult;

/// Results indexed by (rate index, size index), both axes ascending.
#[derive(Debug)]
pub struct ResultGrid<'a> {
    rates: Vec<u64>,
    sizes: Vec<u64>,
    cells: Vec<Option<&'a RequestResult>>,
}

impl<'a> ResultGrid<'a> {
    /// Lay results out by rate and size. When two results share a cell the
    /// later one wins.
    pub fn new(results: &'a [RequestResult]) -> Self {
        let mut rates: Vec<u64> = results.iter().map(|r| r.rate_mbps).collect();
        rates.sort_unstable();
        rates.dedup();
        let mut sizes: Vec<u64> = results.iter().map(|r| r.size_b).collect();
        sizes.sort_unstable();
        sizes.dedup();

        let mut grid = Self {
            cells: vec![None; rates.len() * sizes.len()],
            rates,
            sizes,
        };
        for r in results {
            // Both axes were built from `results`, so the lookups succeed.
            let (Some(ri), Some(si)) = (grid.rate_index(r.rate_mbps), grid.size_index(r.size_b)) else {
                continue;
            };
            let cell = &mut grid.cells[ri * grid.sizes.len() + si];
            if let Some(prev) = cell.replace(r) {
                tracing::warn!(
                    rate_mbps = r.rate_mbps,
                    size_b = r.size_b,
                    replaced = %prev.source.display(),
                    by = %r.source.display(),
                    "duplicate result for rate/size"
                );
            }
        }
        grid
    }

    pub fn rates(&self) -> &[u64] {
        &self.rates
    }

    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    pub fn rate_index(&self, rate_mbps: u64) -> Option<usize> {
        self.rates.binary_search(&rate_mbps).ok()
    }

    pub fn size_index(&self, size_b: u64) -> Option<usize> {
        self.sizes.binary_search(&size_b).ok()
    }

    pub fn get(&self, rate_index: usize, size_index: usize) -> Option<&'a RequestResult> {
        if rate_index >= self.rates.len() || size_index >= self.sizes.len() {
            return None;
        }
        self.cells[rate_index * self.sizes.len() + size_index]
    }

    /// Occupied cells in one row, paired with their size index.
    pub fn row(&self, rate_index: usize) -> impl Iterator<Item = (usize, &'a RequestResult)> + '_ {
        (0..self.sizes.len()).filter_map(move |si| self.get(rate_index, si).map(|r| (si, r)))
    }

    /// Occupied cells in one column, ordered by rate.
    pub fn column(&self, size_index: usize) -> impl Iterator<Item = &'a RequestResult> + '_ {
        (0..self.rates.len()).filter_map(move |ri| self.get(ri, size_index))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}
