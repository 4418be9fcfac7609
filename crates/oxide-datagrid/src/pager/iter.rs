//! Restartable iteration over a page of results.

use std::iter::FusedIterator;

/// Iterator over the rows of the current page.
///
/// Holds its own position, so several iterators over the same pager never
/// interfere. [`rewind`](Self::rewind) restarts from the first row.
#[derive(Debug)]
pub struct PagerIter<'a, R> {
    rows: &'a [R],
    index: usize,
}

// Manual Clone implementation to avoid R: Clone bound
impl<R> Clone for PagerIter<'_, R> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows,
            index: self.index,
        }
    }
}

impl<'a, R> PagerIter<'a, R> {
    pub(crate) fn new(rows: &'a [R]) -> Self {
        Self { rows, index: 0 }
    }

    /// Returns the zero-based position of the next row.
    pub fn key(&self) -> usize {
        self.index
    }

    /// Returns the row at the current position without advancing.
    pub fn current(&self) -> Option<&'a R> {
        self.rows.get(self.index)
    }

    /// Returns true while a row is available at the current position.
    pub fn valid(&self) -> bool {
        self.index < self.rows.len()
    }

    /// Restarts from the first row.
    pub fn rewind(&mut self) {
        self.index = 0;
    }
}

impl<'a, R> Iterator for PagerIter<'a, R> {
    type Item = &'a R;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.get(self.index)?;
        self.index += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.rows.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<R> ExactSizeIterator for PagerIter<'_, R> {}

impl<R> FusedIterator for PagerIter<'_, R> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewind_restarts() {
        let rows = [1, 2, 3];
        let mut it = PagerIter::new(&rows);
        assert_eq!(it.len(), 3);
        assert_eq!(it.next(), Some(&1));
        assert_eq!(it.key(), 1);
        assert_eq!(it.current(), Some(&2));
        assert_eq!(it.by_ref().count(), 2);
        assert!(!it.valid());
        assert_eq!(it.next(), None);

        it.rewind();
        assert!(it.valid());
        assert_eq!(it.copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_independent_iterators() {
        let rows = ["a", "b"];
        let mut first = PagerIter::new(&rows);
        first.next();
        let second = PagerIter::new(&rows);
        assert_eq!(first.key(), 1);
        assert_eq!(second.key(), 0);
    }
}
