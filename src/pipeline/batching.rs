/// Order-preserving partition of work into oracle-sized batches

/// Split `items` into consecutive batches of at most `batch_size`
///
/// Concatenating the batches gives back `items`. A zero size is treated as 1.
pub fn partition<T: Clone>(items: &[T], batch_size: usize) -> Vec<Vec<T>> {
    items
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Number of batches `partition` produces: `ceil(len / batch_size)`
pub fn batch_count(len: usize, batch_size: usize) -> usize {
    let size = batch_size.max(1);
    (len + size - 1) / size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_counts() {
        for (len, size, expected) in [
            (0, 100, 0),
            (1, 100, 1),
            (100, 100, 1),
            (101, 100, 2),
            (250, 100, 3),
            (7, 3, 3),
        ] {
            let items: Vec<usize> = (0..len).collect();
            let batches = partition(&items, size);
            assert_eq!(batches.len(), expected, "len={} size={}", len, size);
            assert_eq!(batch_count(len, size), expected);
            assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= size));
        }
    }

    #[test]
    fn test_concatenation_preserves_order() {
        let items: Vec<u32> = (0..257).collect();
        let flattened: Vec<u32> = partition(&items, 100).into_iter().flatten().collect();
        assert_eq!(flattened, items);
    }

    #[test]
    fn test_zero_size_does_not_panic() {
        assert_eq!(partition(&[1, 2], 0), vec![vec![1], vec![2]]);
    }
}
