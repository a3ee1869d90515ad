use std::ops::Range;

/// Splits `[0..total)` into at most `nthreads` contiguous slices, one per worker.
///
/// Properties:
/// - Every slice but the last has `ceil(total / nthreads)` elements, the last one is
///   truncated.
/// - Ranges are contiguous, disjoint and cover `[0..total)`.
/// - Workers past the end of the range get no slice, so fewer than `nthreads` ranges
///   may be returned. `total == 0` yields none.
///
/// The returned vector is indexed by the worker that owns each slice.
pub fn partition(total: usize, nthreads: usize) -> Vec<Range<usize>> {
    assert!(nthreads > 0);

    let slice = total.div_ceil(nthreads);
    let slices: Vec<_> = (0..nthreads)
        .map(|t| (t * slice).min(total)..((t + 1) * slice).min(total))
        .filter(|r| !r.is_empty())
        .collect();

    let covered: usize = slices.iter().map(ExactSizeIterator::len).sum();
    debug_assert_eq!(covered, total, "partition must cover every element exactly once");

    slices
}
