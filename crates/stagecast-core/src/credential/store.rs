//! Single-writer, many-reader holder of the current credential.

use std::sync::Arc;

use chrono::Utc;
use stagecast_types::{Credential, CredentialError};
use tokio::sync::watch;

/// Holds exactly one live [`Credential`].
///
/// Installing swaps the whole `Arc`, so readers always see a complete value.
/// The superseded credential is dropped once the last reader releases it.
#[derive(Debug)]
pub struct CredentialStore {
    current: watch::Sender<Arc<Credential>>,
}

impl CredentialStore {
    pub fn new(initial: Credential) -> Self {
        let (current, _) = watch::channel(Arc::new(initial));
        Self { current }
    }

    /// Snapshot of the current credential.
    pub fn current(&self) -> Arc<Credential> {
        self.current.borrow().clone()
    }

    /// Token to present on the next connect attempt.
    pub fn token(&self) -> String {
        self.current.borrow().token.clone()
    }

    pub fn identity(&self) -> String {
        self.current.borrow().identity.clone()
    }

    /// Supersede the current credential.
    pub fn install(&self, credential: Credential) -> Result<Arc<Credential>, CredentialError> {
        if credential.is_expired_at(Utc::now()) {
            return Err(CredentialError::AlreadyExpired { expires_at: credential.expires_at });
        }
        let credential = Arc::new(credential);
        self.current.send_replace(Arc::clone(&credential));
        Ok(credential)
    }

    /// Observe renewals.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Credential>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_install_supersedes() {
        let store =
            CredentialStore::new(Credential::with_lifetime("old", "projector-1", Duration::hours(1)));
        let before = store.current();

        store
            .install(Credential::with_lifetime("new", "projector-1", Duration::hours(1)))
            .unwrap();

        assert_eq!(store.token(), "new");
        // A reader holding the old snapshot keeps a complete value.
        assert_eq!(before.token, "old");
    }

    #[test]
    fn test_install_rejects_expired() {
        let store =
            CredentialStore::new(Credential::with_lifetime("live", "projector-1", Duration::hours(1)));
        let stale = Credential::with_lifetime("stale", "projector-1", Duration::seconds(-1));

        let err = store.install(stale).unwrap_err();
        assert!(matches!(err, CredentialError::AlreadyExpired { .. }));
        assert_eq!(store.token(), "live");
    }

    #[tokio::test]
    async fn test_subscribers_see_renewal() {
        let store =
            CredentialStore::new(Credential::with_lifetime("a", "projector-1", Duration::hours(1)));
        let mut rx = store.subscribe();

        store.install(Credential::with_lifetime("b", "projector-1", Duration::hours(1))).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().token, "b");
    }

    #[test]
    fn test_concurrent_readers_never_see_partial_values() {
        let store = Arc::new(CredentialStore::new(Credential::with_lifetime(
            "token-0",
            "projector-0",
            Duration::hours(1),
        )));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        let cred = store.current();
                        let n: u32 = cred.token.trim_start_matches("token-").parse().unwrap();
                        assert_eq!(cred.identity, format!("projector-{}", n % 2));
                    }
                })
            })
            .collect();

        for n in 1..=1_000_u32 {
            store
                .install(Credential::with_lifetime(
                    format!("token-{}", n),
                    format!("projector-{}", n % 2),
                    Duration::hours(1),
                ))
                .unwrap();
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
