//! Ambient light level, smoothed over a window of raw sensor samples.
//!
//! Levels exactly at the threshold are considered neither dark nor bright.
use std::collections::VecDeque;

pub struct SampleWindow {
    /// Raw samples, oldest first
    samples: VecDeque<u16>,
    /// Maximum number of samples kept
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, dropping the oldest ones beyond capacity.
    pub fn push(&mut self, sample: u16) {
        self.samples.push_back(sample);
        self.evict();
    }

    /// Change the capacity. Shrinking drops the oldest samples right away.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.evict();
    }

    fn evict(&mut self) {
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Current contents, oldest first.
    pub fn samples(&self) -> Vec<u16> {
        self.samples.iter().copied().collect()
    }

    /// Integer mean of the current contents, 0 if empty.
    pub fn average(&self) -> u16 {
        if self.samples.is_empty() {
            return 0;
        }
        let sum: u64 = self.samples.iter().map(|&s| u64::from(s)).sum();
        (sum / self.samples.len() as u64) as u16
    }

    /// Classify the current average against a threshold.
    pub fn brightness(&self, threshold: u16) -> Brightness {
        Brightness {
            level: self.average(),
            threshold,
        }
    }
}

pub struct Brightness {
    /// Smoothed light level
    pub level: u16,
    /// Level separating dark from bright
    threshold: u16,
}

impl Brightness {
    pub fn is_dark(&self) -> bool {
        self.level < self.threshold
    }

    pub fn is_bright(&self) -> bool {
        self.level > self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_dark {
        ($brightness:expr) => {{
            let b = $brightness;
            assert!(b.is_dark());
            assert!(!b.is_bright());
        }};
    }

    macro_rules! assert_bright {
        ($brightness:expr) => {{
            let b = $brightness;
            assert!(b.is_bright());
            assert!(!b.is_dark());
        }};
    }

    #[test]
    fn test_empty_average() {
        let window = SampleWindow::new(3);
        assert!(window.is_empty());
        assert_eq!(window.average(), 0);
    }

    #[test]
    fn test_partial_window_divides_by_length() {
        let mut window = SampleWindow::new(10);
        window.push(10);
        window.push(21);
        assert_eq!(window.len(), 2);
        // (10 + 21) / 2, truncated
        assert_eq!(window.average(), 15);
    }

    #[test]
    fn test_eviction() {
        let mut window = SampleWindow::new(3);
        for sample in 1..=10 {
            window.push(sample);
            assert!(window.len() <= 3);
        }
        assert_eq!(window.samples(), vec![8, 9, 10]);
        assert_eq!(window.average(), 9);
    }

    #[test]
    fn test_average_does_not_overflow() {
        let mut window = SampleWindow::new(100);
        for _ in 0..100 {
            window.push(u16::MAX);
        }
        assert_eq!(window.average(), u16::MAX);
    }

    #[test]
    fn test_shrink_capacity() {
        let mut window = SampleWindow::new(5);
        for sample in [1, 2, 3, 4, 5] {
            window.push(sample);
        }
        window.set_capacity(2);
        assert_eq!(window.capacity(), 2);
        assert_eq!(window.samples(), vec![4, 5]);

        window.set_capacity(4);
        window.push(6);
        assert_eq!(window.samples(), vec![4, 5, 6]);
    }

    #[test]
    fn test_brightness() {
        let mut window = SampleWindow::new(3);

        window.push(50);
        assert_dark!(window.brightness(100));

        window.push(250);
        assert_bright!(window.brightness(100));
    }

    #[test]
    fn test_threshold_is_neither() {
        let mut window = SampleWindow::new(2);
        window.push(90);
        window.push(110);

        let b = window.brightness(100);
        assert_eq!(b.level, 100);
        assert!(!b.is_dark());
        assert!(!b.is_bright());
    }
}
