use std::sync::atomic::{AtomicUsize, Ordering};

use log::trace;
use tokio::sync::Semaphore;

use crate::error::{PipelineErr, Result};

/// A named counting credit gating one stage boundary.
///
/// Acquiring consumes credits and waits while there are not enough of them, releasing
/// hands credits back. `acquired <= initial + released` holds at every instant, the
/// counter can't go negative.
#[derive(Debug)]
pub struct Credits {
    name: &'static str,
    initial: usize,
    permits: Semaphore,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl Credits {
    /// Creates a new `Credits` counter.
    ///
    /// # Arguments
    /// * `name` - The boundary this counter gates, used in logs and errors.
    /// * `initial` - Credits available before anyone releases.
    pub fn new(name: &'static str, initial: usize) -> Self {
        Self {
            name,
            initial,
            permits: Semaphore::new(initial),
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        }
    }

    /// Waits until `n` credits are available and consumes them.
    ///
    /// # Returns
    /// `Halted` if the underlying semaphore was closed while waiting.
    pub async fn acquire(&self, n: u32) -> Result<()> {
        self.permits
            .acquire_many(n)
            .await
            .map_err(|_| PipelineErr::Halted(self.name))?
            .forget();

        self.acquired.fetch_add(n as usize, Ordering::AcqRel);
        trace!("{}: acquired {n}", self.name);
        Ok(())
    }

    /// Hands `n` credits back, waking whoever waits on them.
    pub fn release(&self, n: u32) {
        self.released.fetch_add(n as usize, Ordering::AcqRel);
        self.permits.add_permits(n as usize);
        trace!("{}: released {n}", self.name);
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn initial(&self) -> usize {
        self.initial
    }

    /// Credits that could be acquired right now without waiting.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::Acquire)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::Acquire)
    }
}
