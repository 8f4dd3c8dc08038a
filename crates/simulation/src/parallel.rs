//! Parallel execution helpers.
//!
//! Abstracts parallel vs sequential iteration behind the `parallel` feature
//! so the `cfg` logic lives in one place. Every helper takes a
//! `force_sequential` flag that wins over the feature, which lets the same
//! build be profiled or run fully deterministically at runtime.
//!
//! Agent collection is the only hot loop in the simulation. Both variants
//! preserve input order, so determinism depends only on the agents
//! themselves, never on the execution mode.

use parking_lot::Mutex;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Map over indices, potentially in parallel, preserving input order.
///
/// Used where each element needs index-dependent context (the agent
/// vector, where every agent reads its own symbol's market view).
#[inline]
pub fn map_indices<F, R>(indices: &[usize], f: F, force_sequential: bool) -> Vec<R>
where
    F: Fn(usize) -> R + Sync + Send,
    R: Send,
{
    #[cfg(feature = "parallel")]
    {
        if force_sequential {
            indices.iter().map(|&i| f(i)).collect()
        } else {
            indices.par_iter().map(|&i| f(i)).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        let _ = force_sequential;
        indices.iter().map(|&i| f(i)).collect()
    }
}

/// Map over a slice of Mutex-wrapped items with immutable access.
#[inline]
pub fn map_mutex_slice_ref<T, F, R>(slice: &[Mutex<T>], f: F, force_sequential: bool) -> Vec<R>
where
    T: Send,
    F: Fn(&T) -> R + Sync + Send,
    R: Send,
{
    #[cfg(feature = "parallel")]
    {
        if force_sequential {
            slice.iter().map(|m| f(&*m.lock())).collect()
        } else {
            slice.par_iter().map(|m| f(&*m.lock())).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        let _ = force_sequential;
        slice.iter().map(|m| f(&*m.lock())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_preserves_order() {
        let indices: Vec<usize> = (0..64).rev().collect();
        let squared = map_indices(&indices, |i| i * i, false);
        assert_eq!(squared, indices.iter().map(|i| i * i).collect::<Vec<_>>());

        let items: Vec<Mutex<usize>> = (0..64).map(Mutex::new).collect();
        let read = map_mutex_slice_ref(&items, |n| *n, true);
        assert_eq!(read, (0..64).collect::<Vec<_>>());
    }
}
