//! Fixed-capacity circular conversation history.

/// Capacity used when the configured one is not positive.
pub const DEFAULT_CAPACITY: usize = 5;

/// Circular buffer of the most recent entries.
///
/// `cursor` is the next slot to overwrite, so reading from it and wrapping
/// once around yields entries oldest first.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    slots: Vec<Option<T>>,
    cursor: usize,
}

impl<T> RollingWindow<T> {
    /// Create an empty window. A capacity of zero falls back to [`DEFAULT_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 { DEFAULT_CAPACITY } else { capacity };
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots, cursor: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Store `item`, overwriting the oldest entry once the window is full.
    pub fn append(&mut self, item: T) {
        self.slots[self.cursor] = Some(item);
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    /// Held entries, oldest first. Each call starts from the current state.
    pub fn snapshot(&self) -> impl Iterator<Item = &T> + '_ {
        let capacity = self.slots.len();
        (0..capacity).filter_map(move |offset| self.slots[(self.cursor + offset) % capacity].as_ref())
    }

    /// Drop every entry and resize to `capacity` (zero means [`DEFAULT_CAPACITY`]).
    pub fn reset(&mut self, capacity: usize) {
        *self = Self::new(capacity);
    }
}

impl<T: Clone> RollingWindow<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.snapshot().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, n: usize) -> RollingWindow<usize> {
        let mut window = RollingWindow::new(capacity);
        for i in 0..n {
            window.append(i);
        }
        window
    }

    #[test]
    fn test_keeps_most_recent_in_order() {
        for capacity in 1..6 {
            for n in 0..12 {
                let window = filled(capacity, n);
                let expected: Vec<usize> = (n.saturating_sub(capacity)..n).collect();
                assert_eq!(window.to_vec(), expected, "capacity {capacity}, {n} appends");
            }
        }
    }

    #[test]
    fn test_overflow_drops_first() {
        let window = filled(3, 4);
        assert_eq!(window.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_capacity_two_keeps_last_two() {
        let mut window = RollingWindow::new(2);
        window.append("A");
        window.append("B");
        window.append("C");
        assert_eq!(window.to_vec(), vec!["B", "C"]);
    }

    #[test]
    fn test_capacity_one_remembers_last() {
        let window = filled(1, 3);
        assert_eq!(window.to_vec(), vec![2]);
    }

    #[test]
    fn test_zero_capacity_uses_default() {
        let window: RollingWindow<u8> = RollingWindow::new(0);
        assert_eq!(window.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_reset_empties_and_resizes() {
        let mut window = filled(3, 5);
        window.reset(4);
        assert!(window.is_empty());
        assert_eq!(window.snapshot().count(), 0);
        assert_eq!(window.capacity(), 4);
        window.append(9);
        assert_eq!(window.to_vec(), vec![9]);
    }

    #[test]
    fn test_snapshot_is_restartable() {
        let window = filled(4, 6);
        let first: Vec<_> = window.snapshot().collect();
        let second: Vec<_> = window.snapshot().collect();
        assert_eq!(first, second);
        assert_eq!(window.len(), 4);
    }
}
