//! Rolling Window Implementation

/// Fixed-capacity ring of the most recent samples.
///
/// Storage grows up to `capacity` and is then overwritten in place, so a push
/// into a full window evicts exactly one sample (the oldest) without shifting.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    /// Sample storage, never longer than `capacity`
    storage: Vec<T>,
    /// Maximum number of samples held
    capacity: usize,
    /// Index of the oldest sample once the window is full
    head: usize,
}

impl<T> RollingWindow<T> {
    /// Create a new window holding at most `capacity` samples.
    ///
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            storage: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    /// Push a sample, returning the evicted oldest sample if the window was full
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.storage.len() < self.capacity {
            self.storage.push(item);
            return None;
        }

        let evicted = std::mem::replace(&mut self.storage[self.head], item);
        self.head = (self.head + 1) % self.capacity;
        Some(evicted)
    }

    /// Number of samples currently held
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.storage.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently pushed sample
    pub fn latest(&self) -> Option<&T> {
        if self.storage.is_empty() {
            None
        } else if self.is_full() {
            let idx = (self.head + self.capacity - 1) % self.capacity;
            self.storage.get(idx)
        } else {
            self.storage.last()
        }
    }

    /// Iterate samples from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (newer, older) = self.storage.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// Drop every sample
    pub fn clear(&mut self) {
        self.storage.clear();
        self.head = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_read() {
        let mut window = RollingWindow::new(10);

        for i in 0..5 {
            assert_eq!(window.push(i * 100), None);
        }

        assert_eq!(window.len(), 5);

        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![0, 100, 200, 300, 400]);
        assert_eq!(window.latest(), Some(&400));
    }

    #[test]
    fn test_evicts_oldest() {
        let mut window = RollingWindow::new(5);

        for i in 0..5 {
            window.push(i);
        }
        assert!(window.is_full());

        assert_eq!(window.push(5), Some(0));
        assert_eq!(window.push(6), Some(1));

        // Length never exceeds capacity
        assert_eq!(window.len(), 5);
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4, 5, 6]);
        assert_eq!(window.latest(), Some(&6));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut window = RollingWindow::new(0);
        assert_eq!(window.capacity(), 1);
        window.push('a');
        assert_eq!(window.push('b'), Some('a'));
        assert_eq!(window.latest(), Some(&'b'));
    }

    #[test]
    fn test_clear() {
        let mut window = RollingWindow::new(3);
        for i in 0..7 {
            window.push(i);
        }
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.latest(), None);
        window.push(42);
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![42]);
    }
}
