//! Boolean window with a running count of set samples

use crate::RollingWindow;

/// Rolling window of boolean samples.
///
/// Keeps the number of `true` samples up to date on every push so that
/// [`FlagWindow::ratio`] is O(1).
#[derive(Debug, Clone)]
pub struct FlagWindow {
    window: RollingWindow<bool>,
    set: usize,
}

impl FlagWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: RollingWindow::new(capacity),
            set: 0,
        }
    }

    /// Record one sample
    pub fn push(&mut self, flag: bool) {
        if flag {
            self.set += 1;
        }
        if let Some(true) = self.window.push(flag) {
            self.set -= 1;
        }
    }

    /// Number of `true` samples in the window
    pub fn count(&self) -> usize {
        self.set
    }

    /// Set samples divided by the window capacity.
    ///
    /// The denominator is the configured capacity, not the current length, so
    /// a partially filled window never reports more than it has observed.
    pub fn ratio(&self) -> f64 {
        self.set as f64 / self.window.capacity() as f64
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }

    pub fn latest(&self) -> Option<bool> {
        self.window.latest().copied()
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.set = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ratio_uses_capacity() {
        let mut flags = FlagWindow::new(4);
        flags.push(true);
        assert_eq!(flags.count(), 1);
        assert_eq!(flags.ratio(), 0.25);

        flags.push(true);
        flags.push(false);
        flags.push(true);
        assert_eq!(flags.ratio(), 0.75);

        // Evicts the first `true`
        flags.push(false);
        assert_eq!(flags.count(), 2);
        assert_eq!(flags.latest(), Some(false));
    }

    #[test]
    fn test_clear_resets_count() {
        let mut flags = FlagWindow::new(3);
        flags.push(true);
        flags.push(true);
        flags.clear();
        assert_eq!(flags.count(), 0);
        assert!(flags.is_empty());
    }

    proptest! {
        #[test]
        fn ratio_is_exact_count_over_capacity(
            samples in proptest::collection::vec(any::<bool>(), 0..400),
            capacity in 1usize..150,
        ) {
            let mut flags = FlagWindow::new(capacity);
            for (i, &sample) in samples.iter().enumerate() {
                flags.push(sample);

                let start = (i + 1).saturating_sub(capacity);
                let expected = samples[start..=i].iter().filter(|&&s| s).count();

                prop_assert!(flags.len() <= capacity);
                prop_assert_eq!(flags.count(), expected);
                prop_assert_eq!(flags.ratio(), expected as f64 / capacity as f64);
                prop_assert!((0.0..=1.0).contains(&flags.ratio()));
            }
        }
    }
}
