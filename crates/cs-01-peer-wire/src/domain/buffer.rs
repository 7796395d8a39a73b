//! # Byte Stream Buffer
//!
//! Accumulates the partial reads a TCP socket delivers without re-copying
//! everything received so far on every read. Chunks are kept as delivered;
//! `slice` materializes a contiguous view on demand and `skip` discards
//! consumed frames, compacting the front of the chunk list.

use std::collections::VecDeque;
use std::ops::{Bound, RangeBounds};

use crate::error::WireError;

/// Chunked byte accumulator for reassembling framed messages.
#[derive(Debug, Default)]
pub struct ByteStreamBuffer {
    chunks: VecDeque<Vec<u8>>,
    length: usize,
}

impl ByteStreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total buffered bytes across all chunks.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Appends a chunk as delivered by the transport.
    ///
    /// Returns the new total length. Empty chunks are dropped rather than
    /// stored so that every held chunk contributes at least one byte.
    pub fn push(&mut self, chunk: Vec<u8>) -> usize {
        if !chunk.is_empty() {
            self.length += chunk.len();
            self.chunks.push_back(chunk);
        }
        self.length
    }

    /// Materializes a contiguous copy of the given range.
    ///
    /// Bounds are clamped to the buffered length and an inverted range
    /// yields an empty vector, mirroring how transports tolerate
    /// over-asking while a frame is still arriving.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Vec<u8> {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.length,
        };
        let start = start.min(self.length);
        let end = end.min(self.length);
        if start >= end {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(end - start);
        let mut offset = 0usize;
        for chunk in &self.chunks {
            let chunk_end = offset + chunk.len();
            if chunk_end > start && offset < end {
                let from = start.saturating_sub(offset);
                let to = chunk.len() - chunk_end.saturating_sub(end);
                out.extend_from_slice(&chunk[from..to]);
            }
            offset = chunk_end;
            if offset >= end {
                break;
            }
        }
        out
    }

    /// Discards the first `count` bytes, dropping exhausted chunks and
    /// trimming the one left partially consumed. Skipping at or beyond the
    /// buffered length clears the buffer.
    pub fn skip(&mut self, count: usize) {
        if count >= self.length {
            self.clear();
            return;
        }
        self.length -= count;
        let mut remaining = count;
        while remaining > 0 {
            // `remaining < self.length + count` guarantees a front chunk.
            let front_len = match self.chunks.front() {
                Some(front) => front.len(),
                None => return,
            };
            if remaining >= front_len {
                self.chunks.pop_front();
                remaining -= front_len;
            } else {
                if let Some(front) = self.chunks.front_mut() {
                    front.drain(..remaining);
                }
                remaining = 0;
            }
        }
    }

    /// Drops all buffered bytes.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.length = 0;
    }

    /// Byte at absolute position `index`.
    pub fn get(&self, index: usize) -> Result<u8, WireError> {
        let (chunk, offset) = self.pos(index)?;
        Ok(self.chunks[chunk][offset])
    }

    /// Locates `index` as a (chunk index, intra-chunk offset) pair.
    pub fn pos(&self, index: usize) -> Result<(usize, usize), WireError> {
        if index >= self.length {
            return Err(WireError::IndexOutOfRange {
                index,
                length: self.length,
            });
        }
        let mut offset = index;
        for (chunk_index, chunk) in self.chunks.iter().enumerate() {
            if offset < chunk.len() {
                return Ok((chunk_index, offset));
            }
            offset -= chunk.len();
        }
        // Unreachable: length is the sum of chunk lengths.
        Err(WireError::IndexOutOfRange {
            index,
            length: self.length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_from(chunks: &[&[u8]]) -> ByteStreamBuffer {
        let mut buffer = ByteStreamBuffer::new();
        for chunk in chunks {
            buffer.push(chunk.to_vec());
        }
        buffer
    }

    // ========== Test Group 1: Accumulation ==========

    #[test]
    fn test_push_returns_running_total() {
        let mut buffer = ByteStreamBuffer::new();
        assert_eq!(buffer.push(vec![1, 2, 3]), 3);
        assert_eq!(buffer.push(vec![4]), 4);
        assert_eq!(buffer.push(vec![]), 4, "empty chunk must not change length");
        assert_eq!(buffer.len(), 4);
    }

    // ========== Test Group 2: Slicing ==========

    #[test]
    fn test_slice_spans_chunk_boundaries() {
        let buffer = buffer_from(&[&[1, 2, 3], &[4, 5], &[6, 7, 8]]);
        assert_eq!(buffer.slice(..), vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(buffer.slice(2..6), vec![3, 4, 5, 6]);
        assert_eq!(buffer.slice(4..), vec![5, 6, 7, 8]);
        assert_eq!(buffer.slice(..3), vec![1, 2, 3]);
    }

    #[test]
    fn test_slice_clamps_out_of_range_bounds() {
        let buffer = buffer_from(&[&[1, 2, 3]]);
        assert_eq!(buffer.slice(1..100), vec![2, 3]);
        assert_eq!(buffer.slice(50..60), Vec::<u8>::new());
        assert_eq!(buffer.slice(2..1), Vec::<u8>::new(), "inverted range is empty");
    }

    #[test]
    fn test_slice_does_not_consume() {
        let buffer = buffer_from(&[&[9, 9]]);
        let _ = buffer.slice(..);
        assert_eq!(buffer.len(), 2);
    }

    // ========== Test Group 3: Skipping ==========

    #[test]
    fn test_skip_within_first_chunk_trims_it() {
        let mut buffer = buffer_from(&[&[1, 2, 3], &[4, 5]]);
        buffer.skip(2);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.slice(..), vec![3, 4, 5]);
    }

    #[test]
    fn test_skip_across_chunks_compacts_the_front() {
        let mut buffer = buffer_from(&[&[1, 2], &[3, 4], &[5, 6]]);
        buffer.skip(3);
        assert_eq!(buffer.slice(..), vec![4, 5, 6]);
        // The first chunk is gone and the second was trimmed in place, so
        // position 0 sits at the start of the compacted front chunk.
        assert_eq!(buffer.pos(0).unwrap(), (0, 0));
        assert_eq!(buffer.pos(1).unwrap(), (1, 0));
    }

    #[test]
    fn test_skip_beyond_length_clears() {
        let mut buffer = buffer_from(&[&[1, 2], &[3]]);
        buffer.skip(10);
        assert!(buffer.is_empty());
        assert_eq!(buffer.slice(..), Vec::<u8>::new());
    }

    // ========== Test Group 4: Random Access ==========

    #[test]
    fn test_get_reads_across_chunks() {
        let buffer = buffer_from(&[&[10, 11], &[12], &[13, 14]]);
        for (index, expected) in [10u8, 11, 12, 13, 14].into_iter().enumerate() {
            assert_eq!(buffer.get(index).unwrap(), expected);
        }
    }

    #[test]
    fn test_pos_locates_chunk_and_offset() {
        let buffer = buffer_from(&[&[1, 2], &[3], &[4, 5]]);
        assert_eq!(buffer.pos(0).unwrap(), (0, 0));
        assert_eq!(buffer.pos(1).unwrap(), (0, 1));
        assert_eq!(buffer.pos(2).unwrap(), (1, 0));
        assert_eq!(buffer.pos(4).unwrap(), (2, 1));
    }

    #[test]
    fn test_get_and_pos_reject_out_of_range() {
        let buffer = buffer_from(&[&[1, 2, 3]]);
        assert!(matches!(
            buffer.get(3).unwrap_err(),
            WireError::IndexOutOfRange {
                index: 3,
                length: 3
            }
        ));
        assert!(matches!(
            buffer.pos(100).unwrap_err(),
            WireError::IndexOutOfRange {
                index: 100,
                length: 3
            }
        ));
    }
}
