//! Pool occupancy snapshot.

/// Counts published by the pool after every queue mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub waiting: usize,
    pub active: usize,
    pub completed: u64,
    pub failed: u64,
}

impl PoolStats {
    /// Nothing waiting and nothing in flight.
    pub fn is_idle(&self) -> bool {
        self.waiting == 0 && self.active == 0
    }

    /// Jobs that reached a terminal state.
    pub fn finished(&self) -> u64 {
        self.completed + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_and_finished() {
        let mut s = PoolStats::default();
        assert!(s.is_idle());
        s.active = 1;
        assert!(!s.is_idle());
        s.completed = 3;
        s.failed = 2;
        assert_eq!(s.finished(), 5);
    }
}
