//! Bounded collection utilities

use std::collections::VecDeque;

/// Push onto a `VecDeque` while holding it at a maximum length
pub(crate) trait BoundedPush<T> {
    /// Push to the back, dropping from the front once `max_len` is reached.
    /// Returns how many elements were dropped.
    fn push_bounded(&mut self, value: T, max_len: usize) -> usize;
}

impl<T> BoundedPush<T> for VecDeque<T> {
    #[inline]
    fn push_bounded(&mut self, value: T, max_len: usize) -> usize {
        let mut dropped = 0;
        while !self.is_empty() && self.len() >= max_len {
            self.pop_front();
            dropped += 1;
        }
        self.push_back(value);
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_bounded_drops_oldest() {
        let mut queue = VecDeque::new();
        let dropped: usize = (0..5).map(|i| queue.push_bounded(i, 3)).sum();
        assert_eq!(dropped, 2);
        assert_eq!(queue, VecDeque::from(vec![2, 3, 4]));
    }
}
