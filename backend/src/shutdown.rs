//! Reclaiming state shared with server workers once the server has stopped.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Waits until `shared` is the last handle to its value and returns the value.
///
/// Worker threads release their clones while they wind down, which can happen
/// after the server future has resolved. Gives back the `Arc` if other handles
/// are still alive after `timeout`.
pub fn reclaim<T>(mut shared: Arc<T>, timeout: Duration) -> Result<T, Arc<T>> {
    let deadline = Instant::now() + timeout;
    loop {
        match Arc::try_unwrap(shared) {
            Ok(value) => return Ok(value),
            Err(still_shared) if Instant::now() >= deadline => return Err(still_shared),
            Err(still_shared) => {
                shared = still_shared;
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
}
