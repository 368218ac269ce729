use std::ops::Range;

/// Splits `total` hidden units among `workers` and returns the shard owned by `worker`.
///
/// Properties:
/// - Ranges are contiguous, disjoint and cover `[0..total)`.
/// - Sizes differ by at most 1, the first `total % workers` shards take the extra unit.
/// - With more workers than units the trailing shards are empty.
pub fn shard_range(total: usize, worker: usize, workers: usize) -> Range<usize> {
    assert!(workers > 0);
    assert!(worker < workers);

    let base = total / workers;
    let rem = total % workers;

    let start = worker * base + worker.min(rem);
    let extra = if worker < rem { 1 } else { 0 };
    let end = start + base + extra;

    start..end
}

/// Every shard of a `workers`-way split, in worker order.
pub fn partition(total: usize, workers: usize) -> Vec<Range<usize>> {
    (0..workers)
        .map(|worker| shard_range(total, worker, workers))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_range_balanced() {
        // total 10, workers 3 => sizes 4,3,3
        assert_eq!(shard_range(10, 0, 3), 0..4);
        assert_eq!(shard_range(10, 1, 3), 4..7);
        assert_eq!(shard_range(10, 2, 3), 7..10);
    }

    #[test]
    fn reference_split_is_even() {
        let shards = partition(256, 8);
        assert!(shards.iter().all(|shard| shard.len() == 32));
        assert_eq!(shards[7], 224..256);
    }

    #[test]
    fn shards_cover_every_unit_exactly_once() {
        for total in [0, 1, 7, 10, 256] {
            for workers in 1..=12 {
                let mut owners = vec![0; total];
                let shards = partition(total, workers);

                for shard in &shards {
                    for unit in shard.clone() {
                        owners[unit] += 1;
                    }
                }

                assert!(owners.iter().all(|&n| n == 1), "{total} units, {workers} workers");
                assert!(shards.windows(2).all(|w| w[0].end == w[1].start));
            }
        }
    }

    #[test]
    fn more_workers_than_units() {
        let shards = partition(2, 4);
        assert_eq!(shards, vec![0..1, 1..2, 2..2, 2..2]);
    }
}
