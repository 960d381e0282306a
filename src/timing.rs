//! Stage timing.

use std::time::{Duration, Instant};

use tracing::info;

/// Measures one pipeline stage and logs its duration when finished.
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// Start a new timer with the given stage name.
    pub fn start(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    /// Finish the timer and log the elapsed time.
    pub fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        let secs = elapsed.as_secs_f64();
        if secs >= 60.0 {
            info!("[{:.1}m] {}", secs / 60.0, self.name);
        } else {
            info!("[{:.1}s] {}", secs, self.name);
        }
        elapsed
    }
}
