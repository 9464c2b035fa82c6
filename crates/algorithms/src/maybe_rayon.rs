/// Parallel iteration when the `parallel` feature is on, plain iteration otherwise.
///
/// With `parallel`, this is rayon's prelude. Without it (WASM or
/// single-threaded builds), `into_par_iter()` is an alias for `into_iter()`
/// so the per-point loop compiles unchanged against `std::iter::Iterator`.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`.
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
