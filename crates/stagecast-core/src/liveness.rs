//! Detects total loss of live updates.
//!
//! Either channel failing alone is survivable. The push channel being
//! exhausted while the fallback subscription is also down is not, and is
//! reported once per outage as [`SyncError::LiveUpdatesLost`].

use parking_lot::Mutex;
use stagecast_types::SyncError;

use crate::events::EventSink;

#[derive(Debug, Default)]
struct Flags {
    push_exhausted: bool,
    fallback_down: bool,
    alerted: bool,
}

#[derive(Debug)]
pub struct LivenessTracker {
    flags: Mutex<Flags>,
    events: EventSink,
}

impl LivenessTracker {
    pub fn new(events: EventSink) -> Self {
        Self { flags: Mutex::new(Flags::default()), events }
    }

    pub fn push_exhausted(&self) {
        self.update(|flags| flags.push_exhausted = true);
    }

    pub fn fallback_failed(&self) {
        self.update(|flags| flags.fallback_down = true);
    }

    pub fn fallback_recovered(&self) {
        self.update(|flags| {
            flags.fallback_down = false;
            flags.alerted = false;
        });
    }

    pub fn live_updates_lost(&self) -> bool {
        let flags = self.flags.lock();
        flags.push_exhausted && flags.fallback_down
    }

    fn update(&self, apply: impl FnOnce(&mut Flags)) {
        let raise = {
            let mut flags = self.flags.lock();
            apply(&mut flags);
            let lost = flags.push_exhausted && flags.fallback_down;
            let raise = lost && !flags.alerted;
            if raise {
                flags.alerted = true;
            }
            raise
        };

        if raise {
            tracing::error!("[Session] Push exhausted and fallback down: live updates lost");
            self.events.error(SyncError::LiveUpdatesLost);
        }
    }
}
