//! Reusable scratch buffers for entity decoding.

/// Scratch buffers reused across field updates.
#[derive(Debug, Default)]
pub struct CodecScratch {
    changed: Vec<usize>,
}

impl CodecScratch {
    /// Creates a new scratch buffer with no pre-allocated capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the changed-index buffer, emptied.
    pub(crate) fn changed_mut(&mut self) -> &mut Vec<usize> {
        self.changed.clear();
        &mut self.changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_buffer_is_cleared_on_reuse() {
        let mut scratch = CodecScratch::new();
        scratch.changed_mut().extend([1, 2, 3]);
        assert!(scratch.changed_mut().is_empty());
    }

    #[test]
    fn capacity_is_kept() {
        let mut scratch = CodecScratch::new();
        scratch.changed_mut().extend(0..64);
        assert!(scratch.changed_mut().capacity() >= 64);
    }
}
