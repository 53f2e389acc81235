// src/dev_utils.rs

use std::time::Instant;

/// A simple RAII timer for profiling blocks of code.
/// The elapsed time is logged at trace level when the timer is dropped.
#[derive(Debug)]
pub struct BlockTimer {
    name: String,
    start: Instant,
}

impl BlockTimer {
    /// Creates a new timer and starts it immediately.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for BlockTimer {
    fn drop(&mut self) {
        log::trace!(
            "PROFILE [{}]: {} µs",
            self.name,
            self.start.elapsed().as_micros()
        );
    }
}
