//! Coordinated teardown signal shared by every session task.

use tokio::sync::watch;

/// Owner side: flipping it stops every task holding a [`ShutdownSignal`].
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal { rx: self.tx.subscribe() }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for ShutdownTrigger {
    fn default() -> Self {
        Self::new()
    }
}

/// Task side of the teardown signal.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolves once shutdown is triggered (or the trigger is dropped).
    pub async fn cancelled(&mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_wakes_all_signals() {
        let trigger = ShutdownTrigger::new();
        let mut a = trigger.signal();
        let mut b = a.clone();
        assert!(!a.is_cancelled());

        trigger.trigger();
        a.cancelled().await;
        b.cancelled().await;
        assert!(b.is_cancelled());
        assert!(trigger.is_triggered());
    }

    #[tokio::test]
    async fn test_dropped_trigger_counts_as_shutdown() {
        let trigger = ShutdownTrigger::new();
        let mut signal = trigger.signal();
        drop(trigger);
        signal.cancelled().await;
    }
}
