/// Append-only buffer of encoded segments for the active recording
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<u8>>,
    byte_len: usize,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment; empty segments are ignored
    ///
    /// Returns whether the segment was kept.
    pub fn push(&mut self, chunk: Vec<u8>) -> bool {
        if chunk.is_empty() {
            return false;
        }

        self.byte_len += chunk.len();
        self.chunks.push(chunk);
        true
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.byte_len = 0;
    }

    /// Hand off the contents as one contiguous byte vector and clear
    pub fn take_bytes(&mut self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.byte_len);
        for chunk in self.chunks.drain(..) {
            bytes.extend_from_slice(&chunk);
        }
        self.byte_len = 0;
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_ignores_empty() {
        let mut buffer = ChunkBuffer::new();

        assert!(!buffer.push(Vec::new()));
        assert!(buffer.push(vec![1, 2, 3]));

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.byte_len(), 3);
    }

    #[test]
    fn test_take_bytes_preserves_order_and_clears() {
        let mut buffer = ChunkBuffer::new();
        buffer.push(vec![1, 2]);
        buffer.push(vec![3]);
        buffer.push(vec![4, 5]);

        assert_eq!(buffer.take_bytes(), vec![1, 2, 3, 4, 5]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.byte_len(), 0);
        assert!(buffer.take_bytes().is_empty());
    }
}
