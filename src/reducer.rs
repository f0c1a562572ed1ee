//! Frequency counting and top-K palette reduction.

/// Occurrence count per palette index.
pub type ColorCounts = Vec<u32>;

/// Bin-count `indices` into `palette_size` zeroed slots.
///
/// Indices outside the palette are ignored.
pub fn count_occurrences(indices: &[usize], palette_size: usize) -> ColorCounts {
    let mut counts = vec![0u32; palette_size];
    for &i in indices {
        if let Some(slot) = counts.get_mut(i) {
            *slot += 1;
        }
    }
    counts
}

/// The `k` most used palette indices, returned in ascending index order.
///
/// Only indices with a non-zero count are candidates. They are ranked by count
/// descending, then by index ascending, before truncation to `k`.
pub fn select_top_k(counts: &[u32], k: usize) -> Vec<usize> {
    let mut ranked: Vec<(usize, u32)> = counts
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c > 0)
        .map(|(i, &c)| (i, c))
        .collect();

    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(k);

    let mut keep: Vec<usize> = ranked.into_iter().map(|(i, _)| i).collect();
    keep.sort_unstable();
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn counts_every_index() {
        assert_eq!(count_occurrences(&[0, 2, 2, 1, 2], 4), vec![1, 1, 3, 0]);
    }

    #[test]
    fn zero_counts_are_dropped_even_when_k_allows_more() {
        assert_eq!(select_top_k(&[16, 0, 0], 2), vec![0]);
    }

    #[test]
    fn keeps_most_frequent_in_index_order() {
        let counts = [5, 1, 9, 0, 7];
        assert_eq!(select_top_k(&counts, 2), vec![2, 4]);
        assert_eq!(select_top_k(&counts, 3), vec![0, 2, 4]);
    }

    #[test]
    fn equal_counts_prefer_lower_index() {
        let counts = [0, 4, 4, 4, 2];
        assert_eq!(select_top_k(&counts, 2), vec![1, 2]);
    }

    #[test]
    fn large_k_returns_every_used_index() {
        let counts = [3, 0, 1, 0, 8, 2];
        assert_eq!(select_top_k(&counts, 100), vec![0, 2, 4, 5]);
    }

    #[test]
    fn result_is_bounded_by_k_and_all_used() {
        let counts: Vec<u32> = (0..50).map(|i| (i * 7 % 11) as u32).collect();
        for k in 1..20 {
            let keep = select_top_k(&counts, k);
            assert!(keep.len() <= k);
            assert!(keep.iter().all(|&i| counts[i] > 0));
            assert!(keep.windows(2).all(|w| w[0] < w[1]));
            // Nothing dropped outranks anything kept.
            let min_kept = keep.iter().map(|&i| counts[i]).min().unwrap();
            for (i, &c) in counts.iter().enumerate() {
                if !keep.contains(&i) {
                    assert!(c <= min_kept);
                }
            }
        }
    }
}
