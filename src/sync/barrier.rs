use super::Credits;
use crate::error::Result;

/// A reusable barrier built on credits: the waiting side proceeds once every one of
/// `parties` members has signaled.
///
/// Unlike `tokio::sync::Barrier` the signaling members never wait, they just post
/// their credit and move on, only the owner of the barrier blocks.
#[derive(Debug)]
pub struct CreditBarrier {
    credits: Credits,
    parties: u32,
}

impl CreditBarrier {
    /// Creates a new `CreditBarrier`.
    ///
    /// # Arguments
    /// * `name` - The boundary this barrier gates.
    /// * `parties` - The amount of signals one `wait` consumes.
    pub fn new(name: &'static str, parties: u32) -> Self {
        Self {
            credits: Credits::new(name, 0),
            parties,
        }
    }

    /// Posts one member's completion.
    pub fn signal(&self) {
        self.credits.release(1);
    }

    /// Waits until all parties have signaled once.
    pub async fn wait(&self) -> Result<()> {
        self.credits.acquire(self.parties).await
    }

    pub fn parties(&self) -> u32 {
        self.parties
    }

    pub fn credits(&self) -> &Credits {
        &self.credits
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_pending, assert_ready_ok, task};

    use super::*;

    #[test]
    fn test_waits_for_every_party() {
        let barrier = CreditBarrier::new("test", 3);

        let mut wait = task::spawn(barrier.wait());
        assert_pending!(wait.poll());

        barrier.signal();
        barrier.signal();
        assert_pending!(wait.poll());

        barrier.signal();
        assert_ready_ok!(wait.poll());
    }

    #[test]
    fn test_early_signals_carry_over_to_the_next_round() {
        let barrier = CreditBarrier::new("test", 2);

        for _ in 0..4 {
            barrier.signal();
        }

        for _ in 0..2 {
            let mut wait = task::spawn(barrier.wait());
            assert_ready_ok!(wait.poll());
        }

        let mut wait = task::spawn(barrier.wait());
        assert_pending!(wait.poll());
        assert_eq!(barrier.credits().acquired(), 4);
    }
}
