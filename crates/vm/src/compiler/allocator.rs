//! Unique basic-block labels within one function.

use blockflow_common::Label;

/// Mints labels of the form `<prefix>_<n>`, `n` counting from 1 across
/// every prefix, so no two labels from one allocator collide.
#[derive(Debug, Default)]
pub struct BlockAllocator {
    counter: usize,
}

impl BlockAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, prefix: &str) -> Label {
        self.counter += 1;
        Label::new(format!("{prefix}_{}", self.counter))
    }

    /// Number of labels allocated so far.
    pub fn allocated(&self) -> usize {
        self.counter
    }
}
