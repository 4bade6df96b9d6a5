mod scoped_counter;

pub use scoped_counter::{ScopedCounter, ScopedCounterGuard};
