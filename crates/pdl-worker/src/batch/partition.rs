use std::num::NonZeroUsize;

/// An ordered group of items, transient for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    /// Position of this batch within its partition, from zero.
    pub index: usize,
    pub items: Vec<T>,
}

impl<T> Batch<T> {
    /// Number of items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the batch holds no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Splits `items` into batches of `size`, the last one possibly smaller.
///
/// Order is preserved within and across batches. An empty input yields no
/// batches at all.
pub fn partition<T>(items: Vec<T>, size: NonZeroUsize) -> Vec<Batch<T>> {
    let size = size.get();
    let mut batches = Vec::with_capacity(items.len().div_ceil(size));
    let mut items = items.into_iter().peekable();

    while items.peek().is_some() {
        let chunk: Vec<T> = items.by_ref().take(size).collect();
        batches.push(Batch {
            index: batches.len(),
            items: chunk,
        });
    }

    batches
}
