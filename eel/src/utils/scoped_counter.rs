use std::cell::Cell;

/// Depth counter whose increments are released when the returned guard drops.
pub struct ScopedCounter {
    depth: Cell<usize>,
    limit: usize,
}

pub struct ScopedCounterGuard<'a> {
    depth: &'a Cell<usize>,
}

impl ScopedCounter {
    pub fn with_limit(limit: usize) -> ScopedCounter {
        ScopedCounter {
            depth: Cell::new(0),
            limit,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Enters one more level, or returns `None` once the limit would be exceeded.
    pub fn enter(&self) -> Option<ScopedCounterGuard<'_>> {
        let depth = self.depth.get();
        if depth >= self.limit {
            return None;
        }

        self.depth.set(depth + 1);
        Some(ScopedCounterGuard { depth: &self.depth })
    }
}

impl ScopedCounterGuard<'_> {
    pub fn depth(&self) -> usize {
        self.depth.get()
    }
}

impl Drop for ScopedCounterGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

#[cfg(test)]
mod test {
    use super::ScopedCounter;

    #[test]
    fn test_scoped_counter() {
        let counter = ScopedCounter::with_limit(2);

        assert_eq!(counter.depth(), 0);

        {
            let first = counter.enter().unwrap();
            assert_eq!(first.depth(), 1);

            let second = counter.enter().unwrap();
            assert_eq!(second.depth(), 2);
            assert!(counter.enter().is_none());
        }

        assert_eq!(counter.depth(), 0);
        assert!(counter.enter().is_some());
    }
}
