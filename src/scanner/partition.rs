//! Block range partitioning

/// Split `[start, end]` into at most `workers` contiguous ranges, as even as
/// possible with the remainder going to the earlier ranges. Never produces
/// more ranges than blocks.
pub fn partition(start: u64, end: u64, workers: usize) -> Vec<(u64, u64)> {
    if end < start {
        return Vec::new();
    }
    let blocks = end - start + 1;
    let count = (workers.max(1) as u64).min(blocks);
    let base = blocks / count;
    let remainder = blocks % count;

    let mut ranges = Vec::with_capacity(count as usize);
    let mut from = start;
    for i in 0..count {
        let size = base + u64::from(i < remainder);
        let to = from + size - 1;
        ranges.push((from, to));
        from = to + 1;
    }
    ranges
}

/// Window bounds over `[from, end]` in steps of `window_size`
pub fn windows(from: u64, end: u64, window_size: u64) -> impl Iterator<Item = (u64, u64)> {
    let step = window_size.max(1);
    let mut next = Some(from).filter(|f| *f <= end);
    std::iter::from_fn(move || {
        let start = next?;
        let stop = start.saturating_add(step - 1).min(end);
        next = stop.checked_add(1).filter(|n| *n <= end);
        Some((start, stop))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split_with_remainder_first() {
        assert_eq!(partition(0, 9, 3), vec![(0, 3), (4, 6), (7, 9)]);
        assert_eq!(partition(100, 199, 4), vec![(100, 124), (125, 149), (150, 174), (175, 199)]);
    }

    #[test]
    fn test_partition_covers_range_without_gaps() {
        let ranges = partition(105_235_063, 107_000_000, 7);
        assert_eq!(ranges.first().unwrap().0, 105_235_063);
        assert_eq!(ranges.last().unwrap().1, 107_000_000);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].1 + 1, pair[1].0);
        }
    }

    #[test]
    fn test_never_more_workers_than_blocks() {
        assert_eq!(partition(5, 6, 8), vec![(5, 5), (6, 6)]);
        assert_eq!(partition(5, 5, 0), vec![(5, 5)]);
        assert!(partition(6, 5, 2).is_empty());
    }

    #[test]
    fn test_windows() {
        let all: Vec<_> = windows(0, 4_500, 2_000).collect();
        assert_eq!(all, vec![(0, 1_999), (2_000, 3_999), (4_000, 4_500)]);
        assert_eq!(windows(10, 10, 2_000).collect::<Vec<_>>(), vec![(10, 10)]);
        assert_eq!(windows(11, 10, 2_000).count(), 0);
    }
}
