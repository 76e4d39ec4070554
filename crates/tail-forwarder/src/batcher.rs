// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Order-preserving partition of owning events into fixed-size chunks,
//! bounding the payload size of a single delivery.

/// How many owning events go into one delivery chunk by default
pub const DEFAULT_CHUNK_SIZE: usize = 100;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Split `items` into chunks of at most `chunk_size`, preserving order. The
/// last chunk may be shorter; an empty input yields no chunks.
pub fn split<T>(items: Vec<T>, chunk_size: usize) -> Result<Vec<Vec<T>>, BatchError> {
    if chunk_size == 0 {
        return Err(BatchError::InvalidChunkSize);
    }

    let mut chunks = Vec::with_capacity(items.len().div_ceil(chunk_size));
    let mut items = items.into_iter().peekable();
    while items.peek().is_some() {
        chunks.push(items.by_ref().take(chunk_size).collect());
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_partitions_with_short_tail() {
        let chunks = split((0..250).collect::<Vec<_>>(), 100).unwrap();
        assert_eq!(
            chunks.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![100, 100, 50]
        );
    }

    #[test]
    fn test_split_preserves_order() {
        let chunks = split(vec![1, 2, 3, 4, 5], 2).unwrap();
        assert_eq!(chunks, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn test_split_empty_input_yields_no_chunks() {
        let chunks = split(Vec::<u8>::new(), 100).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_split_exact_multiple() {
        let chunks = split((0..200).collect::<Vec<_>>(), 100).unwrap();
        assert_eq!(chunks.iter().map(Vec::len).collect::<Vec<_>>(), vec![100, 100]);
    }

    #[test]
    fn test_split_rejects_zero_chunk_size() {
        assert_eq!(
            split(vec![1, 2, 3], 0),
            Err(BatchError::InvalidChunkSize)
        );
    }
}
