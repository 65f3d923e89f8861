//! Credential renewal ahead of expiry.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use stagecast_types::{Credential, CredentialError, SessionEvent, SyncError};
use tokio::task::JoinHandle;

use super::{CredentialIssuer, CredentialStore};
use crate::events::EventSink;
use crate::policy;
use crate::shutdown::ShutdownSignal;

/// Attempts per refresh cycle: the scheduled one plus one immediate retry.
const ATTEMPTS_PER_CYCLE: u32 = 2;

/// Renews the session credential before it expires and re-arms itself.
///
/// Only one timer is ever outstanding: the loop sleeps, refreshes, then
/// computes the next deadline from whatever credential is current.
pub struct RefreshScheduler {
    issuer: Arc<dyn CredentialIssuer>,
    store: Arc<CredentialStore>,
    events: EventSink,
}

impl RefreshScheduler {
    pub fn new(
        issuer: Arc<dyn CredentialIssuer>,
        store: Arc<CredentialStore>,
        events: EventSink,
    ) -> Self {
        Self { issuer, store, events }
    }

    /// Delay until `credential` should be renewed.
    pub fn schedule_next(&self, credential: &Credential) -> Duration {
        let delay = policy::refresh_delay(credential.lifetime_at(Utc::now()));
        tracing::debug!(
            expires_at = %credential.expires_at,
            delay_secs = delay.as_secs(),
            "[Refresh] Renewal armed"
        );
        delay
    }

    /// Issue a new credential and install it into the store.
    pub async fn refresh_now(&self) -> Result<Arc<Credential>, CredentialError> {
        let identity = self.store.identity();
        let credential = self.issuer.issue(&identity).await?;
        let installed = self.store.install(credential)?;

        tracing::info!(expires_at = %installed.expires_at, "[Refresh] Credential renewed");
        self.events.emit(SessionEvent::CredentialRenewed { expires_at: installed.expires_at });
        Ok(installed)
    }

    /// One scheduled refresh plus one immediate retry. Returns whether a new
    /// credential was installed.
    async fn refresh_cycle(&self) -> bool {
        for consecutive in 1..=ATTEMPTS_PER_CYCLE {
            match self.refresh_now().await {
                Ok(_) => return true,
                Err(e) => {
                    tracing::warn!(consecutive, "[Refresh] Credential refresh failed: {}", e);
                    self.events.error(SyncError::CredentialRefreshFailed {
                        identity: self.store.identity(),
                        consecutive,
                        message: e.to_string(),
                    });
                },
            }
        }

        tracing::warn!(
            expires_at = %self.store.current().expires_at,
            "[Refresh] Keeping last-known-good credential"
        );
        false
    }

    pub fn spawn(self, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, mut shutdown: ShutdownSignal) {
        tracing::info!("[Refresh] Scheduler started");

        loop {
            let delay = self.schedule_next(&self.store.current());

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = shutdown.cancelled() => break,
            }

            tokio::select! {
                _ = self.refresh_cycle() => {}
                () = shutdown.cancelled() => break,
            }
        }

        tracing::info!("[Refresh] Scheduler stopped");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shutdown::ShutdownTrigger;
    use crate::test_helpers::{assert_near, ScriptedIssuer};
    use tokio::time::Instant;

    fn setup(
        initial_lifetime: chrono::Duration,
        issuer: Arc<ScriptedIssuer>,
    ) -> (RefreshScheduler, Arc<CredentialStore>, EventSink) {
        let store = Arc::new(CredentialStore::new(Credential::with_lifetime(
            "initial",
            "projector-1",
            initial_lifetime,
        )));
        let events = EventSink::new();
        let scheduler = RefreshScheduler::new(issuer, Arc::clone(&store), events.clone());
        (scheduler, store, events)
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_lived_credential_renews_five_minutes_early() {
        let issuer = Arc::new(ScriptedIssuer::new(chrono::Duration::minutes(55)));
        let (scheduler, store, _events) = setup(chrono::Duration::minutes(55), Arc::clone(&issuer));
        let started = Instant::now();
        let trigger = ShutdownTrigger::new();
        let handle = scheduler.spawn(trigger.signal());

        tokio::time::sleep(Duration::from_secs(49 * 60)).await;
        assert_eq!(issuer.call_count(), 0);

        tokio::time::sleep(Duration::from_secs(2 * 60)).await;
        let calls = issuer.calls();
        assert_eq!(calls.len(), 1);
        assert_near(calls[0] - started, Duration::from_secs(50 * 60));
        assert_eq!(store.token(), "token-1");

        trigger.trigger();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_lived_credential_uses_fast_path() {
        let issuer = Arc::new(ScriptedIssuer::new(chrono::Duration::minutes(55)));
        let (scheduler, _store, _events) = setup(chrono::Duration::minutes(9), Arc::clone(&issuer));
        let started = Instant::now();
        let trigger = ShutdownTrigger::new();
        let handle = scheduler.spawn(trigger.signal());

        tokio::time::sleep(Duration::from_secs(8 * 60)).await;
        let calls = issuer.calls();
        assert_eq!(calls.len(), 1);
        assert_near(calls[0] - started, Duration::from_secs(432));

        trigger.trigger();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearms_from_new_credential_expiry() {
        let issuer = Arc::new(ScriptedIssuer::new(chrono::Duration::minutes(55)));
        issuer.push_ok(chrono::Duration::minutes(9));
        let (scheduler, _store, _events) = setup(chrono::Duration::minutes(55), Arc::clone(&issuer));
        let started = Instant::now();
        let trigger = ShutdownTrigger::new();
        let handle = scheduler.spawn(trigger.signal());

        tokio::time::sleep(Duration::from_secs(58 * 60)).await;
        let calls = issuer.calls();
        assert_eq!(calls.len(), 2);
        assert_near(calls[0] - started, Duration::from_secs(50 * 60));
        assert_near(calls[1] - calls[0], Duration::from_secs(432));

        trigger.trigger();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_retries_once_then_keeps_old_credential() {
        let issuer = Arc::new(ScriptedIssuer::new(chrono::Duration::minutes(55)));
        let unreachable = CredentialError::Unreachable { message: "connection refused".to_string() };
        issuer.push_err(unreachable.clone());
        issuer.push_err(unreachable);
        let (scheduler, store, events) = setup(chrono::Duration::minutes(55), Arc::clone(&issuer));
        let mut rx = events.subscribe();
        let trigger = ShutdownTrigger::new();
        let handle = scheduler.spawn(trigger.signal());

        tokio::time::sleep(Duration::from_secs(51 * 60)).await;
        let calls = issuer.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1], "retry must be immediate");
        assert_eq!(store.token(), "initial");

        let mut consecutive = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let SessionEvent::Error(SyncError::CredentialRefreshFailed { consecutive: n, .. }) =
                event
            {
                consecutive.push(n);
            }
        }
        assert_eq!(consecutive, vec![1, 2]);

        trigger.trigger();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_retry_recovers() {
        let issuer = Arc::new(ScriptedIssuer::new(chrono::Duration::minutes(55)));
        issuer.push_err(CredentialError::InvalidResponse { message: "truncated".to_string() });
        let (scheduler, store, events) = setup(chrono::Duration::minutes(55), Arc::clone(&issuer));
        let mut rx = events.subscribe();
        let trigger = ShutdownTrigger::new();
        let handle = scheduler.spawn(trigger.signal());

        tokio::time::sleep(Duration::from_secs(51 * 60)).await;
        assert_eq!(issuer.call_count(), 2);
        assert_eq!(store.token(), "token-2");

        let mut renewed = false;
        while let Ok(event) = rx.try_recv() {
            renewed |= matches!(event, SessionEvent::CredentialRenewed { .. });
        }
        assert!(renewed);

        trigger.trigger();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_timer() {
        let issuer = Arc::new(ScriptedIssuer::new(chrono::Duration::minutes(55)));
        let (scheduler, _store, _events) = setup(chrono::Duration::minutes(55), Arc::clone(&issuer));
        let trigger = ShutdownTrigger::new();
        let handle = scheduler.spawn(trigger.signal());

        tokio::time::sleep(Duration::from_secs(60)).await;
        trigger.trigger();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(60 * 60)).await;
        assert_eq!(issuer.call_count(), 0);
    }
}
