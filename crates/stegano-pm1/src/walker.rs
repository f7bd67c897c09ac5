//! Keyed traversal of the usable coefficients.

use std::ops::ControlFlow;

use crate::error::Result;
use crate::image::CoefficientAccessor;
use crate::permutation::Permutation;

/// Visits usable coefficients in permutation order, each at most once until reset.
///
/// Reseeding changes the order for the remaining visits but keeps track of what was
/// already visited, so two phases walked with different seeds never touch the same
/// coefficient.
pub struct Walker<'a, A: ?Sized> {
    accessor: &'a A,
    permutation: Permutation,
    visited: Vec<bool>,
}

impl<'a, A: CoefficientAccessor + ?Sized> Walker<'a, A> {
    pub fn new(accessor: &'a A, seed: u64) -> Self {
        let count = accessor.usable_coefficient_count();
        Walker {
            accessor,
            permutation: Permutation::seeded(count, seed),
            visited: vec![false; count],
        }
    }

    /// Replaces the permutation, keeping the visited set.
    pub fn set_seed(&mut self, seed: u64) {
        self.permutation = Permutation::seeded(self.visited.len(), seed);
    }

    /// Forgets every visit, keeping the current permutation.
    pub fn reset(&mut self) {
        self.visited.iter_mut().for_each(|v| *v = false);
    }

    /// Number of coefficients visited since construction or the last reset.
    pub fn visited_count(&self) -> usize {
        self.visited.iter().filter(|&&v| v).count()
    }

    /// Calls `step` with `(position, value)` for every not yet visited usable
    /// coefficient, in permutation order.
    ///
    /// A coefficient is marked visited before `step` sees it. Returns
    /// `ControlFlow::Break(())` when `step` stopped the walk and
    /// `ControlFlow::Continue(())` when all coefficients were visited.
    pub fn walk<F>(&mut self, mut step: F) -> Result<ControlFlow<()>>
    where
        F: FnMut(usize, i16) -> ControlFlow<()>,
    {
        let accessor = self.accessor;
        let usable = accessor.usable_coefficients();
        for &index in self.permutation.as_slice()? {
            if self.visited[index] {
                continue;
            }
            self.visited[index] = true;

            let position = usable[index];
            if step(position, accessor.coefficient(position)).is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}
