//! Weighted partitioning of an ordered table into contiguous chunks.

use polars::prelude::DataFrame;

/// Computes chunk sizes proportional to the given weights.
///
/// Every chunk gets the integer floor of its proportional share; the
/// leftover items are then distributed one at a time, round-robin starting
/// from chunk 0. The sizes always sum to `total` and a zero-size chunk is
/// valid.
pub fn weighted_chunk_sizes(total: usize, weights: &[f64]) -> Vec<usize> {
    if weights.is_empty() {
        return Vec::new();
    }
    let weight_sum: f64 = weights.iter().sum();
    let mut sizes: Vec<usize> = weights
        .iter()
        .map(|w| (total as f64 * (w / weight_sum)).floor() as usize)
        .collect();
    let mut remainder = total - sizes.iter().sum::<usize>();
    let mut idx = 0;
    while remainder > 0 {
        sizes[idx] += 1;
        idx = (idx + 1) % sizes.len();
        remainder -= 1;
    }
    debug_assert_eq!(sizes.iter().sum::<usize>(), total);
    sizes
}

/// Splits a (pre-sorted) table into contiguous, order-preserving chunks
/// whose sizes approximate the given weights.
pub fn weighted_chunks(df: &DataFrame, weights: &[f64]) -> Vec<DataFrame> {
    let sizes = weighted_chunk_sizes(df.height(), weights);
    let mut chunks = Vec::with_capacity(sizes.len());
    let mut offset = 0usize;
    for size in sizes {
        chunks.push(df.slice(offset as i64, size));
        offset += size;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};
    use proptest::prelude::*;

    #[test]
    fn remainder_goes_round_robin_from_first_chunk() {
        assert_eq!(weighted_chunk_sizes(10, &[1.0, 1.0, 1.0]), vec![4, 3, 3]);
        assert_eq!(weighted_chunk_sizes(11, &[1.0, 1.0, 1.0]), vec![4, 4, 3]);
    }

    #[test]
    fn weights_scale_shares() {
        // Floors are [2, 4, 2]; the remainder of 2 tops up chunks 0 and 1.
        assert_eq!(weighted_chunk_sizes(10, &[2.0, 3.0, 2.0]), vec![3, 5, 2]);
        assert_eq!(weighted_chunk_sizes(14, &[2.0, 3.0, 2.0]), vec![4, 6, 4]);
    }

    #[test]
    fn zero_size_chunks_are_valid() {
        // Both floors are 0, so the single remaining item lands in chunk 0
        // regardless of the weights.
        assert_eq!(weighted_chunk_sizes(1, &[1.0, 100.0]), vec![1, 0]);
        assert_eq!(weighted_chunk_sizes(0, &[1.0, 2.0]), vec![0, 0]);
    }

    #[test]
    fn chunks_preserve_order_and_cover_input() {
        let df = DataFrame::new(vec![
            Series::new("n".into(), (0..10).collect::<Vec<i64>>()).into(),
        ])
        .unwrap();
        let chunks = weighted_chunks(&df, &[2.0, 3.0, 2.0]);
        assert_eq!(chunks.len(), 3);
        let heights: Vec<usize> = chunks.iter().map(|c| c.height()).collect();
        assert_eq!(heights, vec![3, 5, 2]);
        // First value of the second chunk continues where the first stopped.
        let first_of_second = chunks[1].column("n").unwrap().get(0).unwrap();
        assert_eq!(first_of_second.to_string(), "3");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn sizes_sum_to_total(
            total in 0usize..500,
            weights in prop::collection::vec(0.01f64..100.0, 1..12),
        ) {
            let sizes = weighted_chunk_sizes(total, &weights);
            prop_assert_eq!(sizes.len(), weights.len());
            prop_assert_eq!(sizes.iter().sum::<usize>(), total);
        }

        #[test]
        fn heavier_weight_never_gets_less(
            total in 1usize..300,
            weights in prop::collection::vec(0.5f64..10.0, 2..8),
        ) {
            let sizes = weighted_chunk_sizes(total, &weights);
            let weight_sum: f64 = weights.iter().sum();
            for (size, weight) in sizes.iter().zip(&weights) {
                let floor = (total as f64 * weight / weight_sum).floor() as usize;
                // Each chunk receives at least its proportional floor and at
                // most one extra item from the remainder distribution.
                prop_assert!(*size >= floor);
                prop_assert!(*size <= floor + 1);
            }
        }
    }
}
